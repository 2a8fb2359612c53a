//! Character creation rules: attribute rolls, skill-point budgets and
//! budget allocation.
//!
//! # Invariants
//! - Rules are pure or own their state; none touch storage.
//! - Randomness is always injected by the caller.

pub mod allocation;
pub mod formula;
pub mod generator;
