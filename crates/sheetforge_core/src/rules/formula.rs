//! Skill-point formula compilation and evaluation.
//!
//! # Responsibility
//! - Compile catalog formula text (`EDU × 2 + APP × 2`) into tagged terms.
//! - Evaluate compiled formulas against a rolled attribute set.
//!
//! # Invariants
//! - Formula text is parsed once, at catalog load, never per evaluation.
//! - A compiled formula has at least one term and no repeated attribute.
//! - Multipliers are within `1..=MAX_MULTIPLIER`.

use crate::model::attributes::{Attribute, AttributeSet};
use crate::model::profession::Profession;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Largest multiplier accepted in one formula term.
pub const MAX_MULTIPLIER: u32 = 100;

static TERM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z]+)\s*(?:×|\*|x|X)\s*(\d+)\s*$").expect("valid formula term regex")
});

/// Formula compile failure. Fatal for the profession that carries it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    #[error("skill point formula is empty")]
    Empty,
    #[error("malformed formula term `{0}` (expected `ATTR × N`)")]
    MalformedTerm(String),
    #[error("unknown attribute abbreviation `{0}`")]
    UnknownAttribute(String),
    #[error("multiplier in term `{term}` must be between 1 and {max}")]
    MultiplierOutOfRange { term: String, max: u32 },
    #[error("attribute {0} appears more than once in formula")]
    DuplicateAttribute(Attribute),
}

/// One `attribute × multiplier` term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormulaTerm {
    pub attribute: Attribute,
    pub multiplier: u32,
}

/// Compiled skill-point formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillFormula {
    source: String,
    terms: Vec<FormulaTerm>,
}

impl SkillFormula {
    /// Compiles formula text into terms.
    ///
    /// # Errors
    /// - `Empty` when the text has no terms.
    /// - `MalformedTerm` / `UnknownAttribute` / `MultiplierOutOfRange` /
    ///   `DuplicateAttribute` for the first offending term.
    pub fn parse(text: &str) -> Result<Self, FormulaError> {
        if text.trim().is_empty() {
            return Err(FormulaError::Empty);
        }

        let mut terms = Vec::new();
        for raw_term in text.split('+') {
            let term = raw_term.trim();
            let captures = TERM_RE
                .captures(term)
                .ok_or_else(|| FormulaError::MalformedTerm(term.to_string()))?;

            let abbreviation = &captures[1];
            let attribute = Attribute::from_abbreviation(abbreviation)
                .ok_or_else(|| FormulaError::UnknownAttribute(abbreviation.to_string()))?;

            let multiplier = captures[2]
                .parse::<u32>()
                .ok()
                .filter(|value| (1..=MAX_MULTIPLIER).contains(value))
                .ok_or_else(|| FormulaError::MultiplierOutOfRange {
                    term: term.to_string(),
                    max: MAX_MULTIPLIER,
                })?;

            terms.push(FormulaTerm {
                attribute,
                multiplier,
            });
        }

        let mut compiled = Self::from_terms(terms)?;
        compiled.source = text.trim().to_string();
        Ok(compiled)
    }

    /// Builds a formula directly from terms, rendering canonical source text.
    pub fn from_terms(terms: Vec<FormulaTerm>) -> Result<Self, FormulaError> {
        if terms.is_empty() {
            return Err(FormulaError::Empty);
        }
        for (position, term) in terms.iter().enumerate() {
            if terms[..position]
                .iter()
                .any(|earlier| earlier.attribute == term.attribute)
            {
                return Err(FormulaError::DuplicateAttribute(term.attribute));
            }
            if !(1..=MAX_MULTIPLIER).contains(&term.multiplier) {
                return Err(FormulaError::MultiplierOutOfRange {
                    term: render_term(term),
                    max: MAX_MULTIPLIER,
                });
            }
        }

        let source = terms.iter().map(render_term).collect::<Vec<_>>().join(" + ");
        Ok(Self { source, terms })
    }

    pub fn terms(&self) -> &[FormulaTerm] {
        &self.terms
    }

    /// Original formula text, as written in the catalog.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Sums `value × multiplier` over all terms.
    pub fn evaluate(&self, attributes: &AttributeSet) -> u32 {
        self.terms.iter().fold(0u32, |total, term| {
            total.saturating_add(attributes.get(term.attribute).saturating_mul(term.multiplier))
        })
    }
}

impl Display for SkillFormula {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Total skill-point budget for `profession` given rolled `attributes`.
pub fn compute_budget(profession: &Profession, attributes: &AttributeSet) -> u32 {
    profession.formula.evaluate(attributes)
}

fn render_term(term: &FormulaTerm) -> String {
    format!("{} × {}", term.attribute.abbreviation(), term.multiplier)
}

#[cfg(test)]
mod tests {
    use super::{FormulaError, FormulaTerm, SkillFormula};
    use crate::model::attributes::{Attribute, AttributeSet};

    fn attributes() -> AttributeSet {
        AttributeSet::from_values([50; 9])
            .with(Attribute::Education, 70)
            .with(Attribute::Appearance, 45)
    }

    #[test]
    fn single_term_formula_evaluates() {
        let formula = SkillFormula::parse("EDU × 4").unwrap();
        assert_eq!(
            formula.terms(),
            &[FormulaTerm {
                attribute: Attribute::Education,
                multiplier: 4
            }]
        );
        assert_eq!(formula.evaluate(&attributes()), 280);
    }

    #[test]
    fn two_term_formula_evaluates() {
        let formula = SkillFormula::parse("EDU × 2 + APP × 2").unwrap();
        assert_eq!(formula.terms().len(), 2);
        assert_eq!(formula.evaluate(&attributes()), 70 * 2 + 45 * 2);
        assert_eq!(formula.source(), "EDU × 2 + APP × 2");
    }

    #[test]
    fn ascii_operators_and_spacing_are_accepted() {
        let formula = SkillFormula::parse("edu*2+DEX x 2").unwrap();
        assert_eq!(formula.terms()[1].attribute, Attribute::Dexterity);
        assert_eq!(formula.evaluate(&attributes()), 70 * 2 + 50 * 2);
    }

    #[test]
    fn malformed_formulas_fail() {
        assert_eq!(SkillFormula::parse("  "), Err(FormulaError::Empty));
        assert_eq!(
            SkillFormula::parse("EDU times 4"),
            Err(FormulaError::MalformedTerm("EDU times 4".to_string()))
        );
        assert_eq!(
            SkillFormula::parse("EDU × 4 +"),
            Err(FormulaError::MalformedTerm(String::new()))
        );
        assert_eq!(
            SkillFormula::parse("ABC × 4"),
            Err(FormulaError::UnknownAttribute("ABC".to_string()))
        );
        assert!(matches!(
            SkillFormula::parse("EDU × 0"),
            Err(FormulaError::MultiplierOutOfRange { .. })
        ));
        assert!(matches!(
            SkillFormula::parse("EDU × 99999999999"),
            Err(FormulaError::MultiplierOutOfRange { .. })
        ));
        assert_eq!(
            SkillFormula::parse("EDU × 2 + EDU × 2"),
            Err(FormulaError::DuplicateAttribute(Attribute::Education))
        );
    }

    #[test]
    fn from_terms_renders_canonical_source() {
        let formula = SkillFormula::from_terms(vec![
            FormulaTerm {
                attribute: Attribute::Education,
                multiplier: 2,
            },
            FormulaTerm {
                attribute: Attribute::Strength,
                multiplier: 2,
            },
        ])
        .unwrap();
        assert_eq!(formula.to_string(), "EDU × 2 + STR × 2");
    }
}
