//! Core domain logic for SheetForge investigator creation.
//! This crate is the single source of truth for creation rules and the
//! wizard's step invariants.

pub mod catalog;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod rules;
pub mod service;

pub use catalog::{Catalog, CatalogError, ProfessionDefinition, RejectedProfession};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::attributes::{Attribute, AttributeSet, DiceRecipe};
pub use model::character::{
    BasicInfo, BasicInfoField, CharacterId, CharacterRecord, PersistedCharacter, ValidationError,
};
pub use model::profession::{CreditRatingRange, Profession};
pub use repo::character_repo::{
    CharacterGateway, RepoError, RepoResult, SqliteCharacterRepository, StorageError,
};
pub use rules::allocation::{
    AllocationEdit, AllocationEngine, AllocationError, AllocationState, OverAllocationError,
    SkillSlot,
};
pub use rules::formula::{compute_budget, FormulaError, FormulaTerm, SkillFormula};
pub use rules::generator::generate_attributes;
pub use service::roster_service::{RosterError, RosterService};
pub use service::wizard::{ReviewContent, WizardError, WizardSession, WizardStep};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
