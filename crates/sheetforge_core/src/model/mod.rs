//! Domain model for investigator creation.
//!
//! # Responsibility
//! - Define attribute, profession and character record shapes.
//! - Keep validation rules next to the data they guard.
//!
//! # Invariants
//! - Rolled attributes and finished records are immutable values.
//! - Only finished records carry a persistent identifier.

pub mod attributes;
pub mod character;
pub mod profession;
