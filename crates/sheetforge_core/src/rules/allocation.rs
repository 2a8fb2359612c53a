//! Skill-point allocation engine.
//!
//! # Responsibility
//! - Distribute a fixed skill-point budget across a profession's key-skill
//!   slots.
//! - Give each slot a live upper bound for slider rendering.
//!
//! # Invariants
//! - `remaining = total − Σ slot points` after every committed edit.
//! - `remaining` never goes below zero; rejected edits leave state untouched.
//! - Slots are keyed by catalog position, so repeated labels stay distinct.
//! - Batch edits are applied decreases-first, then increases, each group in
//!   slot order, and commit all-or-nothing.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Edit rejected because it asks for more than the slot's upper bound.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot allocate {requested} points to `{skill}`: at most {max} available")]
pub struct OverAllocationError {
    pub skill: String,
    pub slot: usize,
    pub requested: u32,
    pub max: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error(transparent)]
    OverAllocation(#[from] OverAllocationError),
    #[error("unknown skill slot {0}")]
    UnknownSlot(usize),
    #[error("unknown skill `{0}`")]
    UnknownSkill(String),
    #[error("skill slot {0} edited more than once in one batch")]
    DuplicateEdit(usize),
}

/// One allocation slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillSlot {
    pub index: usize,
    pub label: String,
    pub points: u32,
}

/// Slider value submitted for one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationEdit {
    pub slot: usize,
    pub points: u32,
}

/// Read-only snapshot of an allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationState {
    pub total_budget: u32,
    pub remaining_budget: u32,
    pub slots: Vec<SkillSlot>,
}

impl AllocationState {
    pub fn allocated(&self) -> u32 {
        self.total_budget - self.remaining_budget
    }

    /// Points keyed by skill label.
    ///
    /// A label whose key is already taken gets the first free ` (n)` suffix,
    /// counting from 2: `Art`, `Art (2)`. Every slot keeps its own entry, so
    /// the values always sum to [`Self::allocated`].
    pub fn points_by_skill(&self) -> BTreeMap<String, u32> {
        let mut points = BTreeMap::new();
        for slot in &self.slots {
            let mut key = slot.label.clone();
            let mut occurrence = 1;
            while points.contains_key(&key) {
                occurrence += 1;
                key = format!("{} ({})", slot.label, occurrence);
            }
            points.insert(key, slot.points);
        }
        points
    }
}

/// Stateful budget distributor for one character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationEngine {
    total_budget: u32,
    remaining: u32,
    slots: Vec<SkillSlot>,
}

impl AllocationEngine {
    /// Creates an engine with every slot at zero.
    pub fn new<I, S>(total_budget: u32, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let slots = labels
            .into_iter()
            .enumerate()
            .map(|(index, label)| SkillSlot {
                index,
                label: label.into(),
                points: 0,
            })
            .collect();
        Self {
            total_budget,
            remaining: total_budget,
            slots,
        }
    }

    pub fn total_budget(&self) -> u32 {
        self.total_budget
    }

    pub fn remaining_budget(&self) -> u32 {
        self.remaining
    }

    pub fn slots(&self) -> &[SkillSlot] {
        &self.slots
    }

    /// Index of the first slot labelled `label`.
    pub fn slot_of(&self, label: &str) -> Result<usize, AllocationError> {
        self.slots
            .iter()
            .position(|slot| slot.label == label)
            .ok_or_else(|| AllocationError::UnknownSkill(label.to_string()))
    }

    /// Slider upper bound: the slot's own points plus everything unallocated.
    pub fn slot_max(&self, slot: usize) -> Result<u32, AllocationError> {
        let current = self.slot(slot)?.points;
        Ok(current + self.remaining)
    }

    /// Sets one slot to `new_value`.
    ///
    /// # Errors
    /// - `UnknownSlot` when `slot` is out of range.
    /// - `OverAllocation` when `new_value` exceeds `slot_max(slot)`; the
    ///   engine is left unchanged.
    pub fn set_allocation(
        &mut self,
        slot: usize,
        new_value: u32,
    ) -> Result<AllocationState, AllocationError> {
        self.apply_one(AllocationEdit {
            slot,
            points: new_value,
        })?;
        Ok(self.current_state())
    }

    /// Same as [`Self::set_allocation`], addressing the first slot with
    /// `label`.
    pub fn set_allocation_by_label(
        &mut self,
        label: &str,
        new_value: u32,
    ) -> Result<AllocationState, AllocationError> {
        let slot = self.slot_of(label)?;
        self.set_allocation(slot, new_value)
    }

    /// Applies every slider edit of one refresh cycle.
    ///
    /// Edits that free points run before edits that consume them, so a batch
    /// that lowers one skill and raises another succeeds whenever its net
    /// result fits the budget. Either all edits commit or none do.
    pub fn apply_edits(
        &mut self,
        edits: &[AllocationEdit],
    ) -> Result<AllocationState, AllocationError> {
        let mut ordered = edits.to_vec();
        ordered.sort_by_key(|edit| edit.slot);
        if let Some(pair) = ordered.windows(2).find(|pair| pair[0].slot == pair[1].slot) {
            return Err(AllocationError::DuplicateEdit(pair[0].slot));
        }

        let mut working = self.clone();
        let mut increases = Vec::new();
        for edit in ordered {
            if edit.points <= working.slot(edit.slot)?.points {
                working.apply_one(edit)?;
            } else {
                increases.push(edit);
            }
        }
        for edit in increases {
            working.apply_one(edit)?;
        }

        *self = working;
        Ok(self.current_state())
    }

    pub fn current_state(&self) -> AllocationState {
        AllocationState {
            total_budget: self.total_budget,
            remaining_budget: self.remaining,
            slots: self.slots.clone(),
        }
    }

    fn slot(&self, slot: usize) -> Result<&SkillSlot, AllocationError> {
        self.slots.get(slot).ok_or(AllocationError::UnknownSlot(slot))
    }

    fn apply_one(&mut self, edit: AllocationEdit) -> Result<(), AllocationError> {
        let max = self.slot_max(edit.slot)?;
        let target = &mut self.slots[edit.slot];
        if edit.points > max {
            return Err(OverAllocationError {
                skill: target.label.clone(),
                slot: edit.slot,
                requested: edit.points,
                max,
            }
            .into());
        }

        self.remaining = max - edit.points;
        target.points = edit.points;
        debug_assert_eq!(
            u64::from(self.remaining)
                + self.slots.iter().map(|slot| u64::from(slot.points)).sum::<u64>(),
            u64::from(self.total_budget)
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AllocationEdit, AllocationEngine, AllocationError, OverAllocationError};

    fn accountant_engine() -> AllocationEngine {
        AllocationEngine::new(
            200,
            [
                "Accounting",
                "Library Use",
                "Law",
                "Listen",
                "Persuade",
                "Spot Hidden",
                "Two personal skills",
            ],
        )
    }

    #[test]
    fn lowering_a_skill_returns_points_to_the_pool() {
        let mut engine = accountant_engine();

        let state = engine.set_allocation_by_label("Accounting", 120).unwrap();
        assert_eq!(state.remaining_budget, 80);

        let state = engine.set_allocation_by_label("Accounting", 50).unwrap();
        assert_eq!(state.remaining_budget, 150);
        assert_eq!(state.allocated(), 50);
    }

    #[test]
    fn over_allocation_is_rejected_without_changing_state() {
        let mut engine = accountant_engine();
        engine.set_allocation_by_label("Accounting", 120).unwrap();
        let before = engine.current_state();

        let err = engine.set_allocation_by_label("Listen", 90).unwrap_err();
        assert_eq!(
            err,
            AllocationError::OverAllocation(OverAllocationError {
                skill: "Listen".to_string(),
                slot: 3,
                requested: 90,
                max: 80,
            })
        );
        assert_eq!(engine.current_state(), before);
    }

    #[test]
    fn slot_max_includes_own_points() {
        let mut engine = accountant_engine();
        engine.set_allocation(0, 120).unwrap();
        engine.set_allocation(1, 30).unwrap();
        assert_eq!(engine.slot_max(0).unwrap(), 170);
        assert_eq!(engine.slot_max(1).unwrap(), 80);
        assert_eq!(engine.slot_max(2).unwrap(), 50);
    }

    #[test]
    fn spending_the_whole_budget_is_allowed() {
        let mut engine = accountant_engine();
        let state = engine.set_allocation(6, 200).unwrap();
        assert_eq!(state.remaining_budget, 0);
        assert!(engine.set_allocation(0, 1).is_err());
    }

    #[test]
    fn unknown_slot_and_label_are_reported() {
        let mut engine = accountant_engine();
        assert_eq!(
            engine.set_allocation(7, 10).unwrap_err(),
            AllocationError::UnknownSlot(7)
        );
        assert_eq!(
            engine.set_allocation_by_label("Cthulhu Mythos", 10).unwrap_err(),
            AllocationError::UnknownSkill("Cthulhu Mythos".to_string())
        );
    }

    #[test]
    fn repeated_labels_are_independent_slots() {
        let mut engine = AllocationEngine::new(100, ["Art", "History", "Art"]);
        engine.set_allocation(0, 10).unwrap();
        engine.set_allocation(2, 25).unwrap();

        let state = engine.current_state();
        assert_eq!(state.slots[0].points, 10);
        assert_eq!(state.slots[2].points, 25);

        let by_skill = state.points_by_skill();
        assert_eq!(by_skill["Art"], 10);
        assert_eq!(by_skill["Art (2)"], 25);
        assert_eq!(by_skill["History"], 0);
    }

    #[test]
    fn suffixed_keys_never_overwrite_a_real_label() {
        let mut engine = AllocationEngine::new(100, ["Art", "Art", "Art (2)"]);
        engine.set_allocation(1, 30).unwrap();
        let state = engine.set_allocation(2, 40).unwrap();

        let by_skill = state.points_by_skill();
        assert_eq!(by_skill.len(), 3);
        assert_eq!(by_skill["Art"], 0);
        assert_eq!(by_skill["Art (2)"], 30);
        assert_eq!(by_skill["Art (2) (2)"], 40);
        assert_eq!(by_skill.values().sum::<u32>(), state.allocated());
    }

    #[test]
    fn batch_frees_points_before_consuming_them() {
        let mut engine = accountant_engine();
        engine.set_allocation(5, 150).unwrap();

        // Slot 0 is raised before slot 5 is lowered in slot order; the batch
        // still fits because decreases run first.
        let state = engine
            .apply_edits(&[
                AllocationEdit { slot: 0, points: 120 },
                AllocationEdit { slot: 5, points: 30 },
            ])
            .unwrap();
        assert_eq!(state.slots[0].points, 120);
        assert_eq!(state.slots[5].points, 30);
        assert_eq!(state.remaining_budget, 50);
    }

    #[test]
    fn failing_batch_commits_nothing() {
        let mut engine = accountant_engine();
        engine.set_allocation(0, 100).unwrap();
        let before = engine.current_state();

        let err = engine
            .apply_edits(&[
                AllocationEdit { slot: 0, points: 20 },
                AllocationEdit { slot: 1, points: 150 },
                AllocationEdit { slot: 2, points: 40 },
            ])
            .unwrap_err();
        assert!(matches!(err, AllocationError::OverAllocation(_)));
        assert_eq!(engine.current_state(), before);
    }

    #[test]
    fn duplicate_slot_in_batch_is_rejected() {
        let mut engine = accountant_engine();
        let err = engine
            .apply_edits(&[
                AllocationEdit { slot: 1, points: 10 },
                AllocationEdit { slot: 1, points: 20 },
            ])
            .unwrap_err();
        assert_eq!(err, AllocationError::DuplicateEdit(1));
    }
}
