//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the persistence gateway contract used by the wizard.
//! - Isolate SQLite query details from session orchestration.
//!
//! # Invariants
//! - Repository writes enforce `CharacterRecord::validate()` before
//!   persistence.

pub mod character_repo;
