//! Investigator attribute model.
//!
//! # Responsibility
//! - Name the nine characteristics rolled at character creation.
//! - Hold one generated value per characteristic.
//!
//! # Invariants
//! - An `AttributeSet` always carries a value for every `Attribute`.
//! - Values are never mutated once a set is attached to a draft.
//! - Persisted form is a JSON object keyed by attribute display name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// One of the nine rolled characteristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Strength,
    Constitution,
    Size,
    Dexterity,
    Appearance,
    Intelligence,
    Power,
    Education,
    Luck,
}

impl Attribute {
    /// All attributes in sheet order.
    pub const ALL: [Attribute; 9] = [
        Attribute::Strength,
        Attribute::Constitution,
        Attribute::Size,
        Attribute::Dexterity,
        Attribute::Appearance,
        Attribute::Intelligence,
        Attribute::Power,
        Attribute::Education,
        Attribute::Luck,
    ];

    /// Short uppercase form used in skill-point formulas.
    pub fn abbreviation(self) -> &'static str {
        match self {
            Self::Strength => "STR",
            Self::Constitution => "CON",
            Self::Size => "SIZ",
            Self::Dexterity => "DEX",
            Self::Appearance => "APP",
            Self::Intelligence => "INT",
            Self::Power => "POW",
            Self::Education => "EDU",
            Self::Luck => "LCK",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Strength => "Strength",
            Self::Constitution => "Constitution",
            Self::Size => "Size",
            Self::Dexterity => "Dexterity",
            Self::Appearance => "Appearance",
            Self::Intelligence => "Intelligence",
            Self::Power => "Power",
            Self::Education => "Education",
            Self::Luck => "Luck",
        }
    }

    /// Resolves a formula abbreviation, case-insensitively.
    ///
    /// `LUCK` is accepted next to `LCK` because catalogs spell it both ways.
    pub fn from_abbreviation(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_uppercase();
        if normalized == "LUCK" {
            return Some(Self::Luck);
        }
        Self::ALL
            .into_iter()
            .find(|attribute| attribute.abbreviation() == normalized)
    }

    /// Resolves either a display name or an abbreviation.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|attribute| attribute.display_name().eq_ignore_ascii_case(trimmed))
            .or_else(|| Self::from_abbreviation(trimmed))
    }

    /// Dice recipe used when generating this attribute.
    pub fn recipe(self) -> DiceRecipe {
        match self {
            Self::Size | Self::Intelligence | Self::Education => {
                DiceRecipe::TWO_D6_X5_PLUS_30
            }
            _ => DiceRecipe::THREE_D6,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.abbreviation())
    }
}

/// `dice`d`sides` × `multiplier` + `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceRecipe {
    pub dice: u32,
    pub sides: u32,
    pub multiplier: u32,
    pub offset: u32,
}

impl DiceRecipe {
    /// 3d6 × 5, range 15..=90.
    pub const THREE_D6: DiceRecipe = DiceRecipe {
        dice: 3,
        sides: 6,
        multiplier: 5,
        offset: 0,
    };

    /// 2d6 × 5 + 30, range 40..=90.
    pub const TWO_D6_X5_PLUS_30: DiceRecipe = DiceRecipe {
        dice: 2,
        sides: 6,
        multiplier: 5,
        offset: 30,
    };

    pub fn min(&self) -> u32 {
        self.dice * self.multiplier + self.offset
    }

    pub fn max(&self) -> u32 {
        self.dice * self.sides * self.multiplier + self.offset
    }

    pub fn contains(&self, value: u32) -> bool {
        (self.min()..=self.max()).contains(&value)
    }
}

/// Error raised when a persisted or imported attribute map is incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeSetError {
    #[error("attribute `{0}` is missing")]
    Missing(&'static str),
    #[error("unknown attribute name `{0}`")]
    UnknownName(String),
    #[error("attribute `{0}` is listed more than once")]
    Duplicate(&'static str),
}

/// Complete set of rolled attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, u32>",
    into = "BTreeMap<String, u32>"
)]
pub struct AttributeSet {
    values: [u32; 9],
}

impl AttributeSet {
    /// Builds a set from values given in `Attribute::ALL` order.
    pub fn from_values(values: [u32; 9]) -> Self {
        Self { values }
    }

    /// Returns a copy with one attribute replaced.
    pub fn with(mut self, attribute: Attribute, value: u32) -> Self {
        self.values[attribute.index()] = value;
        self
    }

    pub fn get(&self, attribute: Attribute) -> u32 {
        self.values[attribute.index()]
    }

    /// Iterates `(attribute, value)` in sheet order.
    pub fn iter(&self) -> impl Iterator<Item = (Attribute, u32)> + '_ {
        Attribute::ALL
            .into_iter()
            .map(move |attribute| (attribute, self.get(attribute)))
    }

    /// Returns the first attribute whose value falls outside its dice range.
    pub fn first_out_of_range(&self) -> Option<(Attribute, u32)> {
        self.iter()
            .find(|(attribute, value)| !attribute.recipe().contains(*value))
    }
}

impl TryFrom<BTreeMap<String, u32>> for AttributeSet {
    type Error = AttributeSetError;

    fn try_from(map: BTreeMap<String, u32>) -> Result<Self, Self::Error> {
        let mut values: [Option<u32>; 9] = [None; 9];
        for (name, value) in map {
            let attribute =
                Attribute::parse(&name).ok_or(AttributeSetError::UnknownName(name))?;
            let slot = &mut values[attribute.index()];
            if slot.is_some() {
                return Err(AttributeSetError::Duplicate(attribute.display_name()));
            }
            *slot = Some(value);
        }

        let mut resolved = [0; 9];
        for attribute in Attribute::ALL {
            resolved[attribute.index()] = values[attribute.index()]
                .ok_or(AttributeSetError::Missing(attribute.display_name()))?;
        }
        Ok(Self::from_values(resolved))
    }
}

impl From<AttributeSet> for BTreeMap<String, u32> {
    fn from(set: AttributeSet) -> Self {
        set.iter()
            .map(|(attribute, value)| (attribute.display_name().to_string(), value))
            .collect()
    }
}
