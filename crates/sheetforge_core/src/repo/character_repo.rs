//! Character persistence gateway and SQLite implementation.
//!
//! # Responsibility
//! - Append finished character records.
//! - Read saved characters back in insertion order.
//!
//! # Invariants
//! - Write paths call `CharacterRecord::validate()` before SQL mutations.
//! - The store is append-only; no update or delete API exists.
//! - Read paths reject undecodable rows instead of skipping them.

use crate::db::DbError;
use crate::model::character::{
    BasicInfo, CharacterId, CharacterRecord, PersistedCharacter, ValidationError,
};
use log::{error, info};
use rusqlite::{params, Connection, Row};
use std::time::Instant;
use thiserror::Error;

const CHARACTER_SELECT_SQL: &str = "SELECT
    id,
    name,
    age,
    gender,
    residence,
    background,
    profession,
    attributes,
    allocated_points
FROM characters";

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-layer error. Surfaced to the user; the caller may retry.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("failed to encode character field `{field}`: {source}")]
    Encode {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid persisted character data: {0}")]
    InvalidData(String),
}

/// Name used by wizard callers for persistence failures.
pub type StorageError = RepoError;

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence contract used by the wizard and roster service.
pub trait CharacterGateway {
    /// Stores one finished record and returns its store-assigned id.
    fn append(&self, record: &CharacterRecord) -> RepoResult<CharacterId>;
    /// All saved characters ordered by id (insertion order).
    fn list_all(&self) -> RepoResult<Vec<PersistedCharacter>>;
    fn get(&self, id: CharacterId) -> RepoResult<Option<PersistedCharacter>>;
}

/// SQLite-backed character store.
pub struct SqliteCharacterRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCharacterRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CharacterGateway for SqliteCharacterRepository<'_> {
    fn append(&self, record: &CharacterRecord) -> RepoResult<CharacterId> {
        record.validate()?;
        let started_at = Instant::now();

        let attributes = serde_json::to_string(&record.attributes).map_err(|source| {
            RepoError::Encode {
                field: "attributes",
                source,
            }
        })?;
        let allocated_points =
            serde_json::to_string(&record.allocated_points).map_err(|source| {
                RepoError::Encode {
                    field: "allocated_points",
                    source,
                }
            })?;

        let inserted = self.conn.execute(
            "INSERT INTO characters (
                name,
                age,
                gender,
                residence,
                background,
                profession,
                attributes,
                allocated_points
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                record.info.name.as_str(),
                record.info.age.as_str(),
                record.info.gender.as_str(),
                record.info.residence.as_str(),
                record.info.background.as_str(),
                record.profession.as_str(),
                attributes,
                allocated_points,
            ],
        );

        if let Err(err) = inserted {
            error!(
                "event=character_append module=repo status=error duration_ms={} error_code=insert_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }

        let id = self.conn.last_insert_rowid();
        info!(
            "event=character_append module=repo status=ok id={} duration_ms={}",
            id,
            started_at.elapsed().as_millis()
        );
        Ok(id)
    }

    fn list_all(&self) -> RepoResult<Vec<PersistedCharacter>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CHARACTER_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut characters = Vec::new();

        while let Some(row) = rows.next()? {
            characters.push(parse_character_row(row)?);
        }

        Ok(characters)
    }

    fn get(&self, id: CharacterId) -> RepoResult<Option<PersistedCharacter>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CHARACTER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_character_row(row)?));
        }

        Ok(None)
    }
}

fn parse_character_row(row: &Row<'_>) -> RepoResult<PersistedCharacter> {
    let id: CharacterId = row.get("id")?;

    let attributes_text: String = row.get("attributes")?;
    let attributes = serde_json::from_str(&attributes_text).map_err(|err| {
        RepoError::InvalidData(format!("characters.attributes for id {id}: {err}"))
    })?;

    let allocated_text: String = row.get("allocated_points")?;
    let allocated_points = serde_json::from_str(&allocated_text).map_err(|err| {
        RepoError::InvalidData(format!("characters.allocated_points for id {id}: {err}"))
    })?;

    Ok(PersistedCharacter {
        id,
        record: CharacterRecord {
            info: BasicInfo {
                name: row.get("name")?,
                age: row.get("age")?,
                gender: row.get("gender")?,
                residence: row.get("residence")?,
                background: row.get("background")?,
            },
            profession: row.get("profession")?,
            attributes,
            allocated_points,
        },
    })
}
