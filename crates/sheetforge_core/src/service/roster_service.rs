//! Saved-character browsing and export.
//!
//! # Responsibility
//! - List and look up saved characters for review screens.
//! - Render the structured JSON export of one saved character.
//!
//! # Invariants
//! - Read-only: the roster never writes to the store.

use crate::model::character::{CharacterId, PersistedCharacter};
use crate::repo::character_repo::{CharacterGateway, RepoError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("character not found: {0}")]
    NotFound(CharacterId),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("failed to export character {id}: {source}")]
    Export {
        id: CharacterId,
        #[source]
        source: serde_json::Error,
    },
}

/// Read-side facade over a character gateway.
pub struct RosterService<G: CharacterGateway> {
    gateway: G,
}

impl<G: CharacterGateway> RosterService<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// All saved characters in insertion order.
    pub fn list_characters(&self) -> Result<Vec<PersistedCharacter>, RosterError> {
        Ok(self.gateway.list_all()?)
    }

    pub fn get_character(&self, id: CharacterId) -> Result<PersistedCharacter, RosterError> {
        self.gateway.get(id)?.ok_or(RosterError::NotFound(id))
    }

    /// Pretty-printed JSON document of one saved character.
    pub fn export_json(&self, id: CharacterId) -> Result<String, RosterError> {
        let character = self.get_character(id)?;
        serde_json::to_string_pretty(&character).map_err(|source| RosterError::Export { id, source })
    }
}
