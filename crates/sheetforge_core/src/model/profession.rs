//! Profession reference model.
//!
//! # Invariants
//! - Professions are immutable once the catalog is loaded.
//! - `key_skills` keeps catalog order; duplicate labels are allowed and each
//!   entry becomes its own allocation slot.

use crate::rules::formula::SkillFormula;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Credit rating bounds listed for a profession.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CreditRatingRange {
    pub min: u32,
    pub max: u32,
}

impl CreditRatingRange {
    /// Parses `"30-70"` style ranges. Returns `None` on malformed input or
    /// when `min > max`.
    pub fn parse(value: &str) -> Option<Self> {
        let (min, max) = value.split_once('-')?;
        let min = min.trim().parse::<u32>().ok()?;
        let max = max.trim().parse::<u32>().ok()?;
        (min <= max).then_some(Self { min, max })
    }
}

impl Display for CreditRatingRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profession {
    pub name: String,
    /// Compiled once at catalog load.
    pub formula: SkillFormula,
    pub credit_rating: CreditRatingRange,
    /// Literal skill names or free-choice placeholders ("Two personal skills").
    pub key_skills: Vec<String>,
    pub background: String,
}
