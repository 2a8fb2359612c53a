//! Profession reference catalog.
//!
//! # Responsibility
//! - Load profession definitions once at startup (built-in or JSON).
//! - Compile every skill-point formula during load.
//!
//! # Invariants
//! - A catalog is immutable after construction and shared via `Arc`.
//! - A profession with a bad formula is withheld from selection and kept in
//!   [`Catalog::rejected`] with its error; it is never given a default
//!   formula. A load where no profession compiles fails.
//! - Profession names are unique, compared case-insensitively.

use crate::model::profession::{CreditRatingRange, Profession};
use crate::rules::formula::{FormulaError, SkillFormula};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("profession catalog is empty")]
    Empty,
    #[error("profession name must not be empty")]
    BlankName,
    #[error("profession `{0}` is listed more than once")]
    DuplicateProfession(String),
    #[error("profession `{0}` has no key skills")]
    NoKeySkills(String),
    #[error("profession `{profession}` has an invalid skill point formula: {source}")]
    Formula {
        profession: String,
        #[source]
        source: FormulaError,
    },
    #[error("profession `{profession}` has an invalid credit rating range `{value}`")]
    InvalidCreditRating { profession: String, value: String },
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Uncompiled catalog entry, as written in catalog files.
///
/// Field aliases accept the spreadsheet-style keys used by older catalogs
/// (`"Skill Points Formula"`, `"Key Skills"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfessionDefinition {
    #[serde(alias = "Profession")]
    pub name: String,
    #[serde(alias = "Skill Points Formula")]
    pub skill_points_formula: String,
    #[serde(alias = "Credit Rating Range")]
    pub credit_rating_range: String,
    #[serde(alias = "Key Skills")]
    pub key_skills: Vec<String>,
    #[serde(alias = "Background")]
    pub background: String,
}

impl ProfessionDefinition {
    fn compile(self) -> CatalogResult<Profession> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(CatalogError::BlankName);
        }
        if self.key_skills.iter().all(|skill| skill.trim().is_empty()) {
            return Err(CatalogError::NoKeySkills(name));
        }

        let formula = SkillFormula::parse(&self.skill_points_formula).map_err(|source| {
            CatalogError::Formula {
                profession: name.clone(),
                source,
            }
        })?;
        let credit_rating = CreditRatingRange::parse(&self.credit_rating_range).ok_or_else(|| {
            CatalogError::InvalidCreditRating {
                profession: name.clone(),
                value: self.credit_rating_range.clone(),
            }
        })?;

        Ok(Profession {
            name,
            formula,
            credit_rating,
            key_skills: self
                .key_skills
                .into_iter()
                .map(|skill| skill.trim().to_string())
                .filter(|skill| !skill.is_empty())
                .collect(),
            background: self.background.trim().to_string(),
        })
    }
}

/// Profession withheld from a catalog because its formula did not compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedProfession {
    pub name: String,
    pub error: FormulaError,
}

/// Immutable, compiled profession catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    professions: Vec<Arc<Profession>>,
    rejected: Vec<RejectedProfession>,
}

impl Catalog {
    /// Compiles definitions in order.
    ///
    /// A formula error only withholds its own profession.
    ///
    /// # Errors
    /// - Any other invalid definition fails the load; see [`CatalogError`].
    /// - `Formula` with the first formula error when no profession compiles.
    pub fn from_definitions(definitions: Vec<ProfessionDefinition>) -> CatalogResult<Self> {
        if definitions.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut professions: Vec<Arc<Profession>> = Vec::with_capacity(definitions.len());
        let mut rejected: Vec<RejectedProfession> = Vec::new();
        for definition in definitions {
            match definition.compile() {
                Ok(profession) => {
                    ensure_unique(&professions, &rejected, &profession.name)?;
                    professions.push(Arc::new(profession));
                }
                Err(CatalogError::Formula { profession, source }) => {
                    ensure_unique(&professions, &rejected, &profession)?;
                    warn!(
                        "event=catalog_load module=catalog status=rejected profession={} error={}",
                        profession, source
                    );
                    rejected.push(RejectedProfession {
                        name: profession,
                        error: source,
                    });
                }
                Err(err) => return Err(err),
            }
        }

        if professions.is_empty() {
            if let Some(first) = rejected.into_iter().next() {
                return Err(CatalogError::Formula {
                    profession: first.name,
                    source: first.error,
                });
            }
            return Err(CatalogError::Empty);
        }

        info!(
            "event=catalog_load module=catalog status=ok professions={} rejected={}",
            professions.len(),
            rejected.len()
        );
        Ok(Self {
            professions,
            rejected,
        })
    }

    /// Parses a JSON array of [`ProfessionDefinition`].
    pub fn from_json_str(json: &str) -> CatalogResult<Self> {
        let definitions: Vec<ProfessionDefinition> = serde_json::from_str(json)?;
        Self::from_definitions(definitions)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Catalog shipped with the crate.
    pub fn builtin() -> CatalogResult<Self> {
        Self::from_definitions(builtin_definitions())
    }

    pub fn professions(&self) -> &[Arc<Profession>] {
        &self.professions
    }

    /// Professions withheld at load, in catalog order.
    pub fn rejected(&self) -> &[RejectedProfession] {
        &self.rejected
    }

    /// Looks up a profession by name, ignoring case and surrounding spaces.
    pub fn find(&self, name: &str) -> Option<Arc<Profession>> {
        let name = name.trim();
        self.professions
            .iter()
            .find(|profession| profession.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.professions
            .iter()
            .map(|profession| profession.name.as_str())
    }
}

fn ensure_unique(
    professions: &[Arc<Profession>],
    rejected: &[RejectedProfession],
    name: &str,
) -> CatalogResult<()> {
    let taken = professions
        .iter()
        .map(|profession| profession.name.as_str())
        .chain(rejected.iter().map(|entry| entry.name.as_str()))
        .any(|existing| existing.eq_ignore_ascii_case(name));
    if taken {
        return Err(CatalogError::DuplicateProfession(name.to_string()));
    }
    Ok(())
}

fn definition(
    name: &str,
    formula: &str,
    credit_rating: &str,
    key_skills: &[&str],
    background: &str,
) -> ProfessionDefinition {
    ProfessionDefinition {
        name: name.to_string(),
        skill_points_formula: formula.to_string(),
        credit_rating_range: credit_rating.to_string(),
        key_skills: key_skills.iter().map(|skill| skill.to_string()).collect(),
        background: background.to_string(),
    }
}

fn builtin_definitions() -> Vec<ProfessionDefinition> {
    vec![
        definition(
            "Accountant",
            "EDU × 4",
            "30-70",
            &[
                "Accounting",
                "Library Use",
                "Law",
                "Listen",
                "Persuade",
                "Spot Hidden",
                "Two personal skills",
            ],
            "Accountants are meticulous and skilled in financial analysis.",
        ),
        definition(
            "Actor",
            "EDU × 2 + APP × 2",
            "9-40",
            &[
                "Art (Acting)",
                "Disguise",
                "Fighting (Brawl)",
                "History",
                "Psychology",
                "Two social skills",
            ],
            "Actors are performers who can navigate social and cultural circles.",
        ),
        definition(
            "Archaeologist",
            "EDU × 4",
            "10-40",
            &[
                "Archaeology",
                "Appraise",
                "History",
                "Language (Other)",
                "Library Use",
                "Spot Hidden",
                "Mechanical Repair",
                "Navigate",
            ],
            "Archaeologists study ancient sites and artifacts, often working with museums and universities.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::{Catalog, CatalogError};
    use crate::model::attributes::Attribute;
    use crate::rules::formula::FormulaError;

    #[test]
    fn builtin_catalog_compiles_all_formulas() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(
            catalog.names().collect::<Vec<_>>(),
            vec!["Accountant", "Actor", "Archaeologist"]
        );

        let actor = catalog.find("actor").unwrap();
        assert_eq!(actor.formula.terms().len(), 2);
        assert_eq!(actor.formula.terms()[1].attribute, Attribute::Appearance);
        assert_eq!(actor.credit_rating.max, 40);
    }

    #[test]
    fn json_catalog_accepts_spreadsheet_keys() {
        let json = r#"[{
            "Profession": "Antiquarian",
            "Skill Points Formula": "EDU × 4",
            "Credit Rating Range": "30-70",
            "Key Skills": ["Appraise", "Art/Craft", "History", "Library Use"],
            "Background": "Collectors of old and curious things."
        }]"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        let antiquarian = catalog.find("Antiquarian").unwrap();
        assert_eq!(antiquarian.key_skills.len(), 4);
    }

    #[test]
    fn bad_formula_withholds_only_its_profession() {
        let json = r#"[
            {
                "name": "Broken",
                "skill_points_formula": "EDU × 4 + SAN × 2",
                "credit_rating_range": "1-2",
                "key_skills": ["Listen"],
                "background": ""
            },
            {
                "name": "Clerk",
                "skill_points_formula": "EDU × 4",
                "credit_rating_range": "9-20",
                "key_skills": ["Accounting"],
                "background": ""
            }
        ]"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["Clerk"]);
        assert!(catalog.find("Broken").is_none());
        assert_eq!(catalog.rejected().len(), 1);
        assert_eq!(catalog.rejected()[0].name, "Broken");
        assert!(matches!(
            catalog.rejected()[0].error,
            FormulaError::UnknownAttribute(_)
        ));
    }

    #[test]
    fn catalog_without_a_valid_formula_fails_the_load() {
        let json = r#"[{
            "name": "Broken",
            "skill_points_formula": "EDU ÷ 4",
            "credit_rating_range": "1-2",
            "key_skills": ["Listen"],
            "background": ""
        }]"#;
        let err = Catalog::from_json_str(json).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Formula {
                ref profession,
                source: FormulaError::MalformedTerm(_),
            } if profession == "Broken"
        ));
    }

    #[test]
    fn duplicate_and_empty_catalogs_are_rejected() {
        assert!(matches!(
            Catalog::from_definitions(Vec::new()),
            Err(CatalogError::Empty)
        ));

        let mut definitions = super::builtin_definitions();
        let mut copy = definitions[0].clone();
        copy.name = "ACCOUNTANT".to_string();
        definitions.push(copy);
        assert!(matches!(
            Catalog::from_definitions(definitions),
            Err(CatalogError::DuplicateProfession(name)) if name == "ACCOUNTANT"
        ));
    }
}
