//! Character creation wizard.
//!
//! # Responsibility
//! - Sequence the four creation steps and guard forward transitions.
//! - Hold the in-progress draft in an explicit per-user session value.
//! - Hand the finished record to the persistence gateway exactly once.
//!
//! # Invariants
//! - Attributes are rolled at most once per session; going back and
//!   confirming again never re-rolls.
//! - A refused action leaves the session exactly as it was.
//! - `Review` is terminal; a new session is needed for another character.
//! - A failed save keeps the draft in `Allocation` so the save can be
//!   retried with the same attributes.

use crate::catalog::Catalog;
use crate::model::attributes::AttributeSet;
use crate::model::character::{BasicInfo, CharacterRecord, PersistedCharacter, ValidationError};
use crate::model::profession::Profession;
use crate::repo::character_repo::{CharacterGateway, StorageError};
use crate::rules::allocation::{AllocationEdit, AllocationEngine, AllocationError, AllocationState};
use crate::rules::formula::compute_budget;
use crate::rules::generator::generate_attributes;
use log::{info, warn};
use rand::Rng;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Wizard step, numbered as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum WizardStep {
    BasicInfo = 1,
    ProfessionSelect = 2,
    Allocation = 3,
    Review = 4,
}

impl WizardStep {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::BasicInfo => "Enter Basic Information",
            Self::ProfessionSelect => "Select Profession",
            Self::Allocation => "Allocate Skill Points",
            Self::Review => "Saved Characters",
        }
    }
}

impl Display for WizardStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.number(), self.title())
    }
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error("failed to save character: {0}")]
    Storage(#[source] StorageError),
    #[error("cannot {action} during step {step}")]
    InvalidTransition {
        step: WizardStep,
        action: &'static str,
    },
}

/// What the review step shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewContent {
    /// The character this session just saved.
    Saved(PersistedCharacter),
    /// Every saved character, for a browse-only session.
    Roster(Vec<PersistedCharacter>),
}

#[derive(Debug, Clone, Default)]
struct CharacterDraft {
    info: BasicInfo,
    profession: Option<Arc<Profession>>,
    attributes: Option<AttributeSet>,
    allocation: Option<SeededAllocation>,
}

/// Allocation engine together with the profession it was seeded for.
#[derive(Debug, Clone)]
struct SeededAllocation {
    profession: Arc<Profession>,
    engine: AllocationEngine,
}

/// Per-user wizard state. Sessions share nothing but the catalog.
#[derive(Debug, Clone)]
pub struct WizardSession {
    id: Uuid,
    catalog: Arc<Catalog>,
    step: WizardStep,
    draft: CharacterDraft,
    review: Option<ReviewContent>,
}

impl WizardSession {
    /// Starts a new session at the basic-info step.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            catalog,
            step: WizardStep::BasicInfo,
            draft: CharacterDraft::default(),
            review: None,
        };
        info!(
            "event=wizard_start module=wizard status=ok session={}",
            session.id
        );
        session
    }

    /// Opens a browse-only session directly at the review step.
    pub fn browse<G>(catalog: Arc<Catalog>, gateway: &G) -> Result<Self, WizardError>
    where
        G: CharacterGateway + ?Sized,
    {
        let roster = gateway.list_all().map_err(WizardError::Storage)?;
        let id = Uuid::new_v4();
        info!(
            "event=wizard_browse module=wizard status=ok session={} characters={}",
            id,
            roster.len()
        );
        Ok(Self {
            id,
            catalog,
            step: WizardStep::Review,
            draft: CharacterDraft::default(),
            review: Some(ReviewContent::Roster(roster)),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn basic_info(&self) -> &BasicInfo {
        &self.draft.info
    }

    pub fn selected_profession(&self) -> Option<&Arc<Profession>> {
        self.draft.profession.as_ref()
    }

    pub fn attributes(&self) -> Option<&AttributeSet> {
        self.draft.attributes.as_ref()
    }

    pub fn allocation(&self) -> Option<AllocationState> {
        self.draft
            .allocation
            .as_ref()
            .map(|seeded| seeded.engine.current_state())
    }

    pub fn review(&self) -> Option<&ReviewContent> {
        self.review.as_ref()
    }

    /// Replaces the basic-info fields. No completeness check happens here.
    pub fn update_basic_info(&mut self, info: BasicInfo) -> Result<(), WizardError> {
        self.require_step(WizardStep::BasicInfo, "edit basic info")?;
        self.draft.info = info;
        Ok(())
    }

    /// Moves to profession selection once every basic field is filled.
    ///
    /// # Errors
    /// - `Validation(MissingFields)` listing every blank field.
    pub fn proceed_to_profession(&mut self) -> Result<(), WizardError> {
        self.require_step(WizardStep::BasicInfo, "proceed to profession selection")?;
        if let Err(err) = self.draft.info.validate() {
            warn!(
                "event=wizard_transition module=wizard status=error session={} from=1 error_code=missing_fields",
                self.id
            );
            return Err(err.into());
        }
        self.transition(WizardStep::ProfessionSelect);
        Ok(())
    }

    /// Chooses a profession by catalog name.
    pub fn select_profession(&mut self, name: &str) -> Result<Arc<Profession>, WizardError> {
        self.require_step(WizardStep::ProfessionSelect, "select a profession")?;
        let profession = self
            .catalog
            .find(name)
            .ok_or_else(|| ValidationError::UnknownProfession(name.trim().to_string()))?;
        self.draft.profession = Some(Arc::clone(&profession));
        Ok(profession)
    }

    /// Supplies attributes rolled outside the app (physical dice).
    ///
    /// Only possible before the first roll; values must lie within each
    /// attribute's dice range.
    pub fn use_rolled_attributes(&mut self, attributes: AttributeSet) -> Result<(), WizardError> {
        if self.step > WizardStep::ProfessionSelect {
            return Err(self.invalid("supply rolled attributes"));
        }
        if self.draft.attributes.is_some() {
            return Err(ValidationError::AttributesAlreadyRolled.into());
        }
        if let Some((attribute, value)) = attributes.first_out_of_range() {
            return Err(ValidationError::AttributeOutOfRange { attribute, value }.into());
        }
        self.draft.attributes = Some(attributes);
        Ok(())
    }

    /// Confirms the selected profession and enters allocation.
    ///
    /// Rolls attributes with `rng` only when none exist yet. The allocation
    /// is kept when the profession is unchanged since the last confirmation
    /// and re-seeded from the new budget otherwise.
    pub fn confirm_profession<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<AllocationState, WizardError> {
        self.require_step(WizardStep::ProfessionSelect, "confirm a profession")?;
        let profession = self
            .draft
            .profession
            .clone()
            .ok_or(ValidationError::NoProfessionSelected)?;

        let attributes = *self
            .draft
            .attributes
            .get_or_insert_with(|| generate_attributes(rng));

        let reuse = self
            .draft
            .allocation
            .as_ref()
            .is_some_and(|seeded| Arc::ptr_eq(&seeded.profession, &profession));
        if !reuse {
            let budget = compute_budget(&profession, &attributes);
            info!(
                "event=allocation_seed module=wizard status=ok session={} budget={} slots={}",
                self.id,
                budget,
                profession.key_skills.len()
            );
            self.draft.allocation = Some(SeededAllocation {
                engine: AllocationEngine::new(budget, profession.key_skills.iter().cloned()),
                profession,
            });
        }

        self.transition(WizardStep::Allocation);
        Ok(self.current_allocation()?.current_state())
    }

    /// Returns from allocation to profession selection. Attributes stay.
    pub fn back_to_profession(&mut self) -> Result<(), WizardError> {
        self.require_step(WizardStep::Allocation, "go back to profession selection")?;
        self.transition(WizardStep::ProfessionSelect);
        Ok(())
    }

    /// Slider upper bound for `slot`.
    pub fn slot_max(&self, slot: usize) -> Result<u32, WizardError> {
        self.require_step(WizardStep::Allocation, "read allocation bounds")?;
        Ok(self.current_allocation()?.slot_max(slot)?)
    }

    pub fn set_allocation(
        &mut self,
        slot: usize,
        points: u32,
    ) -> Result<AllocationState, WizardError> {
        self.require_step(WizardStep::Allocation, "allocate skill points")?;
        Ok(self.current_allocation_mut()?.set_allocation(slot, points)?)
    }

    pub fn set_allocation_by_label(
        &mut self,
        label: &str,
        points: u32,
    ) -> Result<AllocationState, WizardError> {
        self.require_step(WizardStep::Allocation, "allocate skill points")?;
        Ok(self
            .current_allocation_mut()?
            .set_allocation_by_label(label, points)?)
    }

    /// Applies all slider edits of one refresh cycle atomically.
    pub fn apply_edits(
        &mut self,
        edits: &[AllocationEdit],
    ) -> Result<AllocationState, WizardError> {
        self.require_step(WizardStep::Allocation, "allocate skill points")?;
        Ok(self.current_allocation_mut()?.apply_edits(edits)?)
    }

    /// Saves the character and moves to review.
    ///
    /// Unspent points are allowed. On a storage failure the session stays in
    /// `Allocation` with its draft untouched, so calling `finish` again
    /// retries the same record.
    pub fn finish<G>(&mut self, gateway: &G) -> Result<PersistedCharacter, WizardError>
    where
        G: CharacterGateway + ?Sized,
    {
        self.require_step(WizardStep::Allocation, "finish character creation")?;
        let record = self.build_record()?;

        let id = match gateway.append(&record) {
            Ok(id) => id,
            Err(err) => {
                warn!(
                    "event=wizard_finish module=wizard status=error session={} error_code=storage_failed error={}",
                    self.id, err
                );
                return Err(WizardError::Storage(err));
            }
        };

        let saved = PersistedCharacter { id, record };
        info!(
            "event=wizard_finish module=wizard status=ok session={} id={}",
            self.id, id
        );
        self.review = Some(ReviewContent::Saved(saved.clone()));
        self.transition(WizardStep::Review);
        Ok(saved)
    }

    /// Assembles the finished record from the current draft.
    pub fn build_record(&self) -> Result<CharacterRecord, WizardError> {
        let seeded = self
            .draft
            .allocation
            .as_ref()
            .ok_or_else(|| self.invalid("build a record"))?;
        let attributes = self
            .draft
            .attributes
            .ok_or_else(|| self.invalid("build a record"))?;

        let record = CharacterRecord {
            info: self.draft.info.clone(),
            profession: seeded.profession.name.clone(),
            attributes,
            allocated_points: seeded.engine.current_state().points_by_skill(),
        };
        record.validate()?;
        Ok(record)
    }

    fn current_allocation(&self) -> Result<&AllocationEngine, WizardError> {
        match self.draft.allocation.as_ref() {
            Some(seeded) => Ok(&seeded.engine),
            None => Err(self.invalid("allocate skill points")),
        }
    }

    fn current_allocation_mut(&mut self) -> Result<&mut AllocationEngine, WizardError> {
        let step = self.step;
        match self.draft.allocation.as_mut() {
            Some(seeded) => Ok(&mut seeded.engine),
            None => Err(WizardError::InvalidTransition {
                step,
                action: "allocate skill points",
            }),
        }
    }

    fn require_step(&self, expected: WizardStep, action: &'static str) -> Result<(), WizardError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> WizardError {
        WizardError::InvalidTransition {
            step: self.step,
            action,
        }
    }

    fn transition(&mut self, to: WizardStep) {
        info!(
            "event=wizard_transition module=wizard status=ok session={} from={} to={}",
            self.id,
            self.step.number(),
            to.number()
        );
        self.step = to;
    }
}

#[cfg(test)]
mod tests {
    use super::{WizardError, WizardSession, WizardStep};
    use crate::catalog::Catalog;
    use crate::model::character::BasicInfo;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn session() -> WizardSession {
        WizardSession::new(Arc::new(Catalog::builtin().unwrap()))
    }

    #[test]
    fn steps_are_numbered_one_to_four() {
        assert_eq!(WizardStep::BasicInfo.number(), 1);
        assert_eq!(WizardStep::Review.number(), 4);
        assert!(WizardStep::Allocation > WizardStep::ProfessionSelect);
    }

    #[test]
    fn actions_outside_their_step_are_refused() {
        let mut session = session();
        let err = session.select_profession("Accountant").unwrap_err();
        assert!(matches!(
            err,
            WizardError::InvalidTransition {
                step: WizardStep::BasicInfo,
                ..
            }
        ));

        let err = session
            .confirm_profession(&mut StdRng::seed_from_u64(3))
            .unwrap_err();
        assert!(matches!(err, WizardError::InvalidTransition { .. }));
        assert!(session.attributes().is_none());
    }

    #[test]
    fn sessions_have_distinct_ids() {
        let catalog = Arc::new(Catalog::builtin().unwrap());
        let first = WizardSession::new(Arc::clone(&catalog));
        let second = WizardSession::new(catalog);
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn basic_info_edits_are_kept_across_refusals() {
        let mut session = session();
        let info = BasicInfo {
            name: "Kate Winthrop".to_string(),
            ..BasicInfo::default()
        };
        session.update_basic_info(info.clone()).unwrap();
        assert!(session.proceed_to_profession().is_err());
        assert_eq!(session.basic_info(), &info);
        assert_eq!(session.step(), WizardStep::BasicInfo);
    }
}
