//! Attribute generation.
//!
//! Six attributes roll 3d6 × 5; Size, Intelligence and Education roll
//! 2d6 × 5 + 30. Callers must cache the result: one roll per character.

use crate::model::attributes::{Attribute, AttributeSet, DiceRecipe};
use rand::Rng;

/// Rolls one value for `recipe`.
pub fn roll<R: Rng + ?Sized>(rng: &mut R, recipe: DiceRecipe) -> u32 {
    let pips: u32 = (0..recipe.dice)
        .map(|_| rng.gen_range(1..=recipe.sides))
        .sum();
    pips * recipe.multiplier + recipe.offset
}

/// Rolls a complete attribute set in sheet order.
pub fn generate_attributes<R: Rng + ?Sized>(rng: &mut R) -> AttributeSet {
    let mut values = [0; 9];
    for (slot, attribute) in values.iter_mut().zip(Attribute::ALL) {
        *slot = roll(rng, attribute.recipe());
    }
    AttributeSet::from_values(values)
}
