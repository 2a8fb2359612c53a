//! Character record model.
//!
//! # Responsibility
//! - Define identity fields collected in the first wizard step.
//! - Define the finished, persistable character aggregate.
//!
//! # Invariants
//! - A `CharacterRecord` is only built from a complete draft and is never
//!   mutated afterwards.
//! - `CharacterId` is assigned by the store at append time, never by core.

use crate::model::attributes::{Attribute, AttributeSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Store-assigned, monotonically increasing identifier.
pub type CharacterId = i64;

/// Identity field collected in the basic-info step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicInfoField {
    Name,
    Age,
    Gender,
    Residence,
    Background,
}

impl BasicInfoField {
    pub const ALL: [BasicInfoField; 5] = [
        BasicInfoField::Name,
        BasicInfoField::Age,
        BasicInfoField::Gender,
        BasicInfoField::Residence,
        BasicInfoField::Background,
    ];
}

impl Display for BasicInfoField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Name => "name",
            Self::Age => "age",
            Self::Gender => "gender",
            Self::Residence => "residence",
            Self::Background => "background",
        };
        f.write_str(name)
    }
}

/// Recoverable input error; the caller re-prompts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required fields: {}", join_fields(.0))]
    MissingFields(Vec<BasicInfoField>),
    #[error("unknown profession `{0}`")]
    UnknownProfession(String),
    #[error("no profession selected")]
    NoProfessionSelected,
    #[error("attribute {attribute} value {value} is outside its dice range")]
    AttributeOutOfRange { attribute: Attribute, value: u32 },
    #[error("attributes were already rolled for this character")]
    AttributesAlreadyRolled,
}

fn join_fields(fields: &[BasicInfoField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Free-text identity fields. Age is kept as text, as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicInfo {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub residence: String,
    pub background: String,
}

impl BasicInfo {
    fn field(&self, field: BasicInfoField) -> &str {
        match field {
            BasicInfoField::Name => &self.name,
            BasicInfoField::Age => &self.age,
            BasicInfoField::Gender => &self.gender,
            BasicInfoField::Residence => &self.residence,
            BasicInfoField::Background => &self.background,
        }
    }

    /// Fields that are empty or whitespace-only, in form order.
    pub fn missing_fields(&self) -> Vec<BasicInfoField> {
        BasicInfoField::ALL
            .into_iter()
            .filter(|field| self.field(*field).trim().is_empty())
            .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingFields(missing))
        }
    }
}

/// Finished character, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRecord {
    #[serde(flatten)]
    pub info: BasicInfo,
    /// Profession name as listed in the catalog.
    pub profession: String,
    pub attributes: AttributeSet,
    /// Points per skill slot. Repeated catalog labels are suffixed
    /// (`"Art (2)"`) so no slot collapses into another.
    pub allocated_points: BTreeMap<String, u32>,
}

impl CharacterRecord {
    /// Checks the record-level invariants enforced before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.info.validate()?;
        if self.profession.trim().is_empty() {
            return Err(ValidationError::NoProfessionSelected);
        }
        Ok(())
    }

    /// Sum of all allocated points.
    pub fn allocated_total(&self) -> u64 {
        self.allocated_points.values().map(|points| u64::from(*points)).sum()
    }
}

/// Character read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedCharacter {
    pub id: CharacterId,
    #[serde(flatten)]
    pub record: CharacterRecord,
}

#[cfg(test)]
mod tests {
    use super::{BasicInfo, BasicInfoField, ValidationError};

    #[test]
    fn missing_fields_treats_whitespace_as_empty() {
        let info = BasicInfo {
            name: "Harvey Walters".to_string(),
            age: "  ".to_string(),
            gender: "male".to_string(),
            residence: String::new(),
            background: "Journalist turned occult scholar.".to_string(),
        };
        assert_eq!(
            info.missing_fields(),
            vec![BasicInfoField::Age, BasicInfoField::Residence]
        );
    }

    #[test]
    fn validation_error_lists_fields() {
        let err = BasicInfo::default().validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing required fields: name, age, gender, residence, background"
        );
        assert!(matches!(err, ValidationError::MissingFields(fields) if fields.len() == 5));
    }
}
