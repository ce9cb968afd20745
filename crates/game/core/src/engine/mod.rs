//! Character creation and level-up pipeline.
//!
//! The [`ProgressionEngine`] is the only writer of primary state during a
//! progression. Every confirm step flows through the same three-phase
//! transition pipeline (pre_validate → apply → post_validate) against a copy
//! of the progression bookkeeping, and the copy is committed through an
//! [`ActorUpdateTransaction`] only when all phases pass. Confirmed choices stay
//! pending until [`ProgressionEngine::finalize`] lands them in one batch and
//! runs exactly one recompute.

mod action;
mod errors;
mod finalize;
mod stage;
mod transition;
mod updates;

pub use action::{
    ConfirmAbilities, ConfirmAbilityIncreases, ConfirmBackground, ConfirmClass, ConfirmFeats,
    ConfirmSkills, ConfirmSpecies, ConfirmTalents, ProgressionAction, SkillInput,
};
pub use errors::{
    PrerequisiteError, PrerequisiteFailure, ProgressionError, TransitionPhase,
    TransitionPhaseError, UpdateError, ValidationError, ValidationKind,
};
pub use finalize::MaterializedItem;
pub use stage::{Budgets, budgets, skill_point_budget, stage_selections};
pub use transition::{StepContext, StepTransition};
pub use updates::{ActorUpdates, UpdateOutcome};

use crate::env::RulesEnv;
use crate::state::{
    Actor, ActorId, ActorStore, ActorUpdateTransaction, FieldWrite, PendingSelections,
    ProgressionMode, ProgressionState, ProgressionStatus, Step,
};
use crate::stats::{DerivationWarning, DerivedHook, RecalcStatus, Recalculator};

/// Emitted once per successful finalize. Collaborators subscribe to it; the
/// engine never waits on them.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressionCompleted {
    pub actor: ActorId,
    pub mode: ProgressionMode,
    pub new_level: u32,
}

/// Result of [`ProgressionEngine::finalize`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FinalizeOutcome {
    /// False when the progression was already finalized and nothing ran.
    pub finalized: bool,
    pub completion: Option<ProgressionCompleted>,
    pub materialized: Vec<MaterializedItem>,
    pub warnings: Vec<DerivationWarning>,
    pub recalc: Option<RecalcStatus>,
    /// Only the base pass ran; the caller owes a
    /// [`Recalculator::modifier_pass`].
    pub modifiers_pending: bool,
}

/// Drives one actor through chargen or a level-up.
///
/// Rule tables, the item catalog and configuration come in through
/// [`RulesEnv`]; persistence goes through the injected [`ActorStore`].
pub struct ProgressionEngine<'a> {
    actor: &'a mut Actor,
    env: RulesEnv<'a>,
    store: &'a mut dyn ActorStore,
    hooks: &'a [Box<dyn DerivedHook>],
    defer_modifiers: bool,
}

impl<'a> ProgressionEngine<'a> {
    pub fn new(actor: &'a mut Actor, env: RulesEnv<'a>, store: &'a mut dyn ActorStore) -> Self {
        Self {
            actor,
            env,
            store,
            hooks: &[],
            defer_modifiers: false,
        }
    }

    /// Hooks run after the finalize recompute.
    pub fn with_hooks(mut self, hooks: &'a [Box<dyn DerivedHook>]) -> Self {
        self.hooks = hooks;
        self
    }

    /// Finalize runs only the base pass and leaves the modifier pass to the
    /// caller.
    pub fn with_deferred_modifiers(mut self) -> Self {
        self.defer_modifiers = true;
        self
    }

    pub fn actor(&self) -> &Actor {
        self.actor
    }

    pub fn progression(&self) -> &ProgressionState {
        &self.actor.primary().progression
    }

    /// Budgets for the class pending in the current progression.
    pub fn budgets(&self) -> Option<Budgets> {
        let primary = self.actor.primary();
        let pending = &primary.progression.pending;
        let class = pending
            .class
            .as_ref()
            .and_then(|class| self.env.tables().class(&class.class_id))?;
        let mut upstream = pending.clone();
        upstream.class = None;
        Some(budgets(primary, &upstream, class, &self.env))
    }

    fn commit_progression(&mut self, progression: ProgressionState) -> Result<(), ProgressionError> {
        ActorUpdateTransaction::new()
            .with(FieldWrite::Progression(progression))
            .commit(&mut *self.actor, &mut *self.store)?;
        Ok(())
    }

    /// Opens a fresh progression. Chargen needs a classless actor; a level-up
    /// needs at least one class level.
    pub fn begin(&mut self, mode: ProgressionMode) -> Result<(), ProgressionError> {
        let primary = self.actor.primary();
        if primary.progression.status == ProgressionStatus::InProgress {
            return Err(ValidationError::not_allowed(format!(
                "a {} progression is already in progress",
                primary.progression.mode
            ))
            .into());
        }
        match mode {
            ProgressionMode::Chargen if !primary.class_levels.is_empty() => {
                return Err(ValidationError::not_allowed(
                    "character creation requires an actor without class levels",
                )
                .into());
            }
            ProgressionMode::LevelUp if primary.class_levels.is_empty() => {
                return Err(ValidationError::not_allowed(
                    "level-up requires at least one class level",
                )
                .into());
            }
            _ => {}
        }

        self.commit_progression(ProgressionState::started(mode))?;
        tracing::debug!(actor = %self.actor.id, %mode, "progression started");
        Ok(())
    }

    /// Abandons the open progression and drops every pending selection.
    pub fn cancel(&mut self) -> Result<(), ProgressionError> {
        if self.progression().status != ProgressionStatus::InProgress {
            return Err(ValidationError::not_allowed("no progression in progress").into());
        }
        self.commit_progression(ProgressionState::default())?;
        tracing::debug!(actor = %self.actor.id, "progression cancelled");
        Ok(())
    }

    fn check_step(&self, step: Step) -> Result<ProgressionState, ProgressionError> {
        let progression = self.progression();
        match progression.status {
            ProgressionStatus::Idle => {
                return Err(ValidationError::not_allowed("no progression in progress").into());
            }
            ProgressionStatus::Finalized => {
                return Err(ValidationError::new(
                    ValidationKind::Finalized,
                    "progression already finalized; begin a new one",
                )
                .into());
            }
            ProgressionStatus::InProgress => {}
        }
        if !step.allowed_in(progression.mode) {
            return Err(ValidationError::not_allowed(format!(
                "{step} is not part of {}",
                progression.mode
            ))
            .with_detail("step", step)
            .into());
        }
        if let Some(required) = step.requires(progression.mode) {
            if !progression.is_complete(required) {
                return Err(ValidationError::step_order(step, required).into());
            }
        }
        Ok(progression.clone())
    }

    /// Validates and records one step. On any error the actor is untouched.
    pub fn do_action(&mut self, action: &ProgressionAction) -> Result<Step, ProgressionError> {
        let step = action.step();
        let mut progression = self.check_step(step)?;

        let ctx = StepContext {
            primary: self.actor.primary(),
            env: self.env,
        };
        if let Err(error) = transition::execute_transition(action, &ctx, &mut progression) {
            tracing::debug!(
                actor = %self.actor.id,
                action = action.name(),
                phase = error.phase.as_str(),
                error = %error.error,
                "step rejected"
            );
            return Err(error.error);
        }

        self.commit_progression(progression)?;
        tracing::debug!(actor = %self.actor.id, %step, "step confirmed");
        Ok(step)
    }

    /// Lands every pending selection, materializes items and recomputes.
    ///
    /// Calling it again on a finalized progression is a no-op that reports
    /// `finalized = false`.
    pub fn finalize(&mut self) -> Result<FinalizeOutcome, ProgressionError> {
        let primary = self.actor.primary();
        let progression = &primary.progression;
        match progression.status {
            ProgressionStatus::Finalized => {
                tracing::debug!(actor = %self.actor.id, "finalize on finalized progression ignored");
                return Ok(FinalizeOutcome::default());
            }
            ProgressionStatus::Idle => {
                return Err(ValidationError::not_allowed("no progression in progress").into());
            }
            ProgressionStatus::InProgress => {}
        }
        if let Some(step) = progression.missing_required().first() {
            return Err(ValidationError::new(
                ValidationKind::StepOrder,
                format!("{step} must be confirmed before finalize"),
            )
            .with_detail("step", step)
            .into());
        }

        let mode = progression.mode;
        let pending = &progression.pending;
        transition::check_choice_prerequisites(primary, pending, &self.env)?;

        let mut tx = stage_selections(primary, pending, &self.env);
        let staged = tx.staged(primary);
        let hp = finalize::synced_hit_points(self.actor, &staged, mode, &self.env);
        let mut writes = vec![FieldWrite::HitPoints(hp)];
        let (materialized, warnings) = finalize::materialize(&staged, &self.env, &mut writes);
        for write in writes {
            tx.push(write);
        }
        tx.push(FieldWrite::Progression(ProgressionState {
            status: ProgressionStatus::Finalized,
            pending: PendingSelections::default(),
            ..progression.clone()
        }));
        let new_level = staged.character_level();

        self.actor.begin_mutation();
        let committed = tx.commit(&mut *self.actor, &mut *self.store);
        let owed = self.actor.end_mutation();
        committed?;

        let recalculator = Recalculator::with_hooks(self.env, self.hooks);
        let recalc = match (owed, self.defer_modifiers) {
            (false, _) => RecalcStatus::Deferred,
            (true, false) => recalculator.recompute(self.actor),
            (true, true) => recalculator.base_pass(self.actor),
        };
        let modifiers_pending = self.defer_modifiers && recalc == RecalcStatus::Completed;

        let completion = ProgressionCompleted {
            actor: self.actor.id,
            mode,
            new_level,
        };
        tracing::info!(
            actor = %self.actor.id,
            %mode,
            level = new_level,
            items = materialized.len(),
            "progression finalized"
        );
        Ok(FinalizeOutcome {
            finalized: true,
            completion: Some(completion),
            materialized,
            warnings,
            recalc: Some(recalc),
            modifiers_pending,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GameError;
    use crate::state::{Ability, ClassLevel, ItemType, NullStore, PrimaryState, StoreError};
    use crate::testing::{new_character, sample_config, sample_tables, soldier_level_one};

    struct FailingStore;

    impl ActorStore for FailingStore {
        fn write(&mut self, _actor: ActorId, _primary: &PrimaryState) -> Result<(), StoreError> {
            Err(StoreError::new("disk full"))
        }
    }

    fn human_soldier_scores() -> ProgressionAction {
        ProgressionAction::abilities([
            (Ability::Str, 16),
            (Ability::Dex, 13),
            (Ability::Con, 12),
            (Ability::Int, 10),
            (Ability::Wis, 8),
            (Ability::Cha, 8),
        ])
    }

    /// Chargen up to and including the class step.
    fn human_soldier_through_class(engine: &mut ProgressionEngine<'_>) {
        engine.begin(ProgressionMode::Chargen).expect("begin");
        for action in [
            ProgressionAction::species("Human", None),
            ProgressionAction::background("spacer"),
            human_soldier_scores(),
            ProgressionAction::class("Soldier", None),
        ] {
            engine.do_action(&action).expect("step");
        }
    }

    fn skill(key: &str, ranks: u32) -> SkillInput {
        SkillInput::Ranks {
            key: key.into(),
            ranks,
        }
    }

    fn soldier_at(levels: u32) -> Actor {
        let mut actor = soldier_level_one();
        for level in 2..=levels {
            actor.primary_mut().class_levels.push(ClassLevel {
                class_id: "soldier".into(),
                level,
                skill_points_budget: 5,
            });
        }
        actor
    }

    #[test]
    fn human_soldier_end_to_end() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);
        let mut actor = new_character();
        let mut store = NullStore;
        let mut engine = ProgressionEngine::new(&mut actor, env, &mut store);

        human_soldier_through_class(&mut engine);
        let budgets = engine.budgets().expect("class pending");
        assert_eq!(budgets.skill_points, 20);
        assert_eq!(budgets.feats, 2);
        assert_eq!(budgets.talents, 1);

        engine
            .do_action(&ProgressionAction::skills([
                skill("perception", 5),
                skill("mechanics", 5),
                skill("initiative", 5),
                skill("endurance", 5),
            ]))
            .expect("skills at budget");
        engine
            .do_action(&ProgressionAction::feats(["Power Attack", "Cleave"]))
            .expect("feats");
        engine
            .do_action(&ProgressionAction::talents(["Armored Defense"]))
            .expect("talents");

        let outcome = engine.finalize().expect("finalize");
        assert!(outcome.finalized);
        assert_eq!(
            outcome.completion,
            Some(ProgressionCompleted {
                actor: ActorId(1),
                mode: ProgressionMode::Chargen,
                new_level: 1,
            })
        );
        assert_eq!(outcome.recalc, Some(RecalcStatus::Completed));
        assert_eq!(outcome.materialized.len(), 8);
        assert!(outcome.warnings.is_empty());

        let actor = engine.actor();
        assert_eq!(actor.derived().hp.max, 11);
        assert_eq!(actor.derived().bab, 1);
        assert_eq!(actor.primary().hp.value, 11);
        assert_eq!(actor.primary().skill("perception").map(|s| s.ranks), Some(5));
        assert!(actor.primary().is_trained("pilot"));
        assert!(actor.primary().feats.contains("Cleave"));
        assert!(actor.primary().owns_item(ItemType::Talent, "Armored Defense"));
        assert!(actor.primary().progression.pending == PendingSelections::default());
    }

    #[test]
    fn skill_spend_over_budget_by_one_is_rejected() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);
        let mut actor = new_character();
        let mut store = NullStore;
        let mut engine = ProgressionEngine::new(&mut actor, env, &mut store);
        human_soldier_through_class(&mut engine);

        let before = engine.actor().primary().clone();
        let error = engine
            .do_action(&ProgressionAction::skills([
                skill("perception", 5),
                skill("mechanics", 5),
                skill("initiative", 5),
                skill("endurance", 5),
                SkillInput::from("Climb"),
            ]))
            .unwrap_err();
        assert_eq!(error.validation_kind(), Some(ValidationKind::BudgetExceeded));
        assert_eq!(error.report().detail("spent"), Some("21"));
        assert_eq!(engine.actor().primary(), &before);
    }

    #[test]
    fn skills_outside_class_list_are_refused() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);
        let mut actor = new_character();
        let mut store = NullStore;
        let mut engine = ProgressionEngine::new(&mut actor, env, &mut store);
        human_soldier_through_class(&mut engine);

        let error = engine
            .do_action(&ProgressionAction::skills([SkillInput::from("Stealth")]))
            .unwrap_err();
        assert_eq!(error.validation_kind(), Some(ValidationKind::NotAllowed));
        let error = engine
            .do_action(&ProgressionAction::skills([SkillInput::from("Basket Weaving")]))
            .unwrap_err();
        assert_eq!(error.validation_kind(), Some(ValidationKind::UnknownId));
    }

    #[test]
    fn point_buy_over_budget_is_rejected() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);
        let mut actor = new_character();
        let mut store = NullStore;
        let mut engine = ProgressionEngine::new(&mut actor, env, &mut store);
        engine.begin(ProgressionMode::Chargen).expect("begin");
        engine
            .do_action(&ProgressionAction::species("human", None))
            .expect("species");
        engine
            .do_action(&ProgressionAction::background("spacer"))
            .expect("background");

        let error = engine
            .do_action(&ProgressionAction::abilities([
                (Ability::Str, 18),
                (Ability::Dex, 16),
                (Ability::Con, 8),
                (Ability::Int, 8),
                (Ability::Wis, 8),
                (Ability::Cha, 8),
            ]))
            .unwrap_err();
        assert_eq!(error.validation_kind(), Some(ValidationKind::BudgetExceeded));
        assert!(!engine.progression().is_complete(Step::Abilities));

        let error = engine
            .do_action(&ProgressionAction::abilities([(Ability::Str, 10)]))
            .unwrap_err();
        assert_eq!(error.validation_kind(), Some(ValidationKind::MalformedPayload));
    }

    #[test]
    fn steps_enforce_order_and_mode() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);

        let mut actor = new_character();
        let mut store = NullStore;
        let mut engine = ProgressionEngine::new(&mut actor, env, &mut store);
        let error = engine
            .do_action(&ProgressionAction::species("human", None))
            .unwrap_err();
        assert_eq!(error.validation_kind(), Some(ValidationKind::NotAllowed));

        engine.begin(ProgressionMode::Chargen).expect("begin");
        let error = engine
            .do_action(&ProgressionAction::background("spacer"))
            .unwrap_err();
        assert_eq!(error.validation_kind(), Some(ValidationKind::StepOrder));
        let error = engine.finalize().unwrap_err();
        assert_eq!(error.validation_kind(), Some(ValidationKind::StepOrder));

        let mut veteran = soldier_level_one();
        let mut engine = ProgressionEngine::new(&mut veteran, env, &mut store);
        assert!(engine.begin(ProgressionMode::Chargen).is_err());
        engine.begin(ProgressionMode::LevelUp).expect("level-up");
        let error = engine
            .do_action(&ProgressionAction::species("human", None))
            .unwrap_err();
        assert_eq!(error.validation_kind(), Some(ValidationKind::NotAllowed));
    }

    #[test]
    fn pending_feat_satisfies_later_pick_only_in_order() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);
        let mut actor = new_character();
        let mut store = NullStore;
        let mut engine = ProgressionEngine::new(&mut actor, env, &mut store);
        human_soldier_through_class(&mut engine);

        let error = engine
            .do_action(&ProgressionAction::feats(["Cleave", "Power Attack"]))
            .unwrap_err();
        let ProgressionError::Prerequisite(failure) = &error else {
            panic!("expected prerequisite error, got {error:?}");
        };
        assert_eq!(failure.failures[0].subject, "Cleave");
        assert_eq!(failure.failures[0].missing, vec!["Feat: Power Attack"]);
        assert!(error.severity().is_recoverable());

        engine
            .do_action(&ProgressionAction::feats(["Power Attack", "Cleave"]))
            .expect("ordered picks");
    }

    #[test]
    fn feat_budget_and_duplicates() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);
        let mut actor = new_character();
        let mut store = NullStore;
        let mut engine = ProgressionEngine::new(&mut actor, env, &mut store);
        human_soldier_through_class(&mut engine);

        let error = engine
            .do_action(&ProgressionAction::feats(["Toughness", "Power Attack", "Linguist"]))
            .unwrap_err();
        assert_eq!(error.validation_kind(), Some(ValidationKind::BudgetExceeded));

        let error = engine
            .do_action(&ProgressionAction::feats(["Weapon Proficiency (Rifles)"]))
            .unwrap_err();
        assert_eq!(error.validation_kind(), Some(ValidationKind::MalformedPayload));

        let error = engine
            .do_action(&ProgressionAction::talents(["Block"]))
            .unwrap_err();
        assert_eq!(error.validation_kind(), Some(ValidationKind::NotAllowed));
    }

    #[test]
    fn prestige_class_rejects_low_bab() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);
        let mut actor = soldier_at(4);
        let mut store = NullStore;
        let mut engine = ProgressionEngine::new(&mut actor, env, &mut store);
        engine.begin(ProgressionMode::LevelUp).expect("begin");

        let error = engine
            .do_action(&ProgressionAction::class("Elite Trooper", None))
            .unwrap_err();
        let ProgressionError::Prerequisite(failure) = &error else {
            panic!("expected prerequisite error, got {error:?}");
        };
        assert_eq!(failure.failures[0].subject, "Elite Trooper");
        assert!(
            failure.failures[0]
                .missing
                .contains(&"BAB +7 (current: +4)".to_string())
        );
        assert!(!engine.progression().is_complete(Step::Class));
    }

    #[test]
    fn multiclass_requires_a_listed_feat() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);
        let mut actor = soldier_level_one();
        let mut store = NullStore;
        let mut engine = ProgressionEngine::new(&mut actor, env, &mut store);
        engine.begin(ProgressionMode::LevelUp).expect("begin");

        let error = engine
            .do_action(&ProgressionAction::class("jedi", None))
            .unwrap_err();
        assert_eq!(error.validation_kind(), Some(ValidationKind::MalformedPayload));
        let error = engine
            .do_action(&ProgressionAction::class("jedi", Some("Toughness")))
            .unwrap_err();
        assert_eq!(error.validation_kind(), Some(ValidationKind::NotAllowed));

        engine
            .do_action(&ProgressionAction::class("jedi", Some("Force Sensitivity")))
            .expect("multiclass");
        let outcome = engine.finalize().expect("finalize");
        assert_eq!(outcome.completion.map(|done| done.new_level), Some(2));

        let primary = engine.actor().primary();
        assert!(primary.feats.contains("Force Sensitivity"));
        assert!(!primary.feats.contains("Weapon Proficiency (Lightsabers)"));
        assert_eq!(primary.class_level("jedi"), 1);
    }

    #[test]
    fn level_up_adds_hp_gain_to_current_value() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);
        let mut actor = soldier_level_one();
        actor.primary_mut().hp.value = 9;
        let mut store = NullStore;
        let mut engine = ProgressionEngine::new(&mut actor, env, &mut store);
        engine.begin(ProgressionMode::LevelUp).expect("begin");
        engine
            .do_action(&ProgressionAction::class("soldier", None))
            .expect("class");
        engine
            .do_action(&ProgressionAction::feats(["Toughness"]))
            .expect("bonus feat");
        engine.finalize().expect("finalize");

        // 11 + (5 + 1 + 1) + 5 from Toughness
        let actor = engine.actor();
        assert_eq!(actor.derived().hp.max, 23);
        assert_eq!(actor.primary().hp.max, 23);
        assert_eq!(actor.primary().hp.value, 21);
        assert_eq!(actor.derived().bab, 2);
    }

    #[test]
    fn ability_increases_only_on_milestone_levels() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);

        let mut actor = soldier_level_one();
        let mut store = NullStore;
        let mut engine = ProgressionEngine::new(&mut actor, env, &mut store);
        engine.begin(ProgressionMode::LevelUp).expect("begin");
        engine
            .do_action(&ProgressionAction::class("soldier", None))
            .expect("class");
        let error = engine
            .do_action(&ProgressionAction::ability_increases([Ability::Str, Ability::Dex]))
            .unwrap_err();
        assert_eq!(error.validation_kind(), Some(ValidationKind::NotAllowed));

        let mut actor = soldier_at(3);
        let mut engine = ProgressionEngine::new(&mut actor, env, &mut store);
        engine.begin(ProgressionMode::LevelUp).expect("begin");
        engine
            .do_action(&ProgressionAction::class("soldier", None))
            .expect("class");
        let error = engine
            .do_action(&ProgressionAction::ability_increases([Ability::Str, Ability::Str]))
            .unwrap_err();
        assert_eq!(error.validation_kind(), Some(ValidationKind::MalformedPayload));
        engine
            .do_action(&ProgressionAction::ability_increases([Ability::Str, Ability::Con]))
            .expect("increases");
        engine.finalize().expect("finalize");

        let abilities = &engine.actor().primary().abilities;
        assert_eq!(abilities.get(Ability::Str).advancement, 1);
        assert_eq!(abilities.get(Ability::Str).base, 16);
        assert_eq!(abilities.total(Ability::Con), 13);
    }

    #[test]
    fn reconfirming_class_clears_downstream_choices() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);
        let mut actor = new_character();
        let mut store = NullStore;
        let mut engine = ProgressionEngine::new(&mut actor, env, &mut store);
        human_soldier_through_class(&mut engine);
        engine
            .do_action(&ProgressionAction::feats(["Toughness"]))
            .expect("feats");

        engine
            .do_action(&ProgressionAction::class("scoundrel", None))
            .expect("reconfirm");
        let progression = engine.progression();
        assert!(!progression.is_complete(Step::Feats));
        assert!(progression.pending.feats.is_empty());
        assert_eq!(
            progression.pending.class.as_ref().map(|class| class.class_id.as_str()),
            Some("scoundrel")
        );
        // (4 + 0) x 4
        assert_eq!(engine.budgets().map(|b| b.skill_points), Some(16));
    }

    #[test]
    fn finalize_twice_grants_nothing_new() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);
        let mut actor = new_character();
        let mut store = NullStore;
        let mut engine = ProgressionEngine::new(&mut actor, env, &mut store);
        human_soldier_through_class(&mut engine);
        engine
            .do_action(&ProgressionAction::feats(["Toughness"]))
            .expect("feats");
        assert!(engine.finalize().expect("first").finalized);

        let feats = engine.actor().primary().feats.clone();
        let items = engine.actor().primary().items.len();
        let revision = engine.actor().revision();

        let again = engine.finalize().expect("second");
        assert!(!again.finalized);
        assert!(again.completion.is_none());
        assert_eq!(engine.actor().primary().feats, feats);
        assert_eq!(engine.actor().primary().items.len(), items);
        assert_eq!(engine.actor().revision(), revision);

        let error = engine
            .do_action(&ProgressionAction::feats(["Linguist"]))
            .unwrap_err();
        assert_eq!(error.validation_kind(), Some(ValidationKind::Finalized));
    }

    #[test]
    fn deferred_modifier_pass_is_left_to_the_caller() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);
        let mut actor = new_character();
        let mut store = NullStore;
        {
            let mut engine =
                ProgressionEngine::new(&mut actor, env, &mut store).with_deferred_modifiers();
            human_soldier_through_class(&mut engine);
            engine
                .do_action(&ProgressionAction::feats(["Toughness"]))
                .expect("feats");
            let outcome = engine.finalize().expect("finalize");
            assert_eq!(outcome.recalc, Some(RecalcStatus::Completed));
            assert!(outcome.modifiers_pending);
        }
        assert!(!actor.derived().modifiers_applied);

        Recalculator::new(env)
            .modifier_pass(&mut actor)
            .expect("modifier pass");
        assert!(actor.derived().modifiers_applied);
        assert_eq!(
            Recalculator::new(env).modifier_pass(&mut actor),
            Err(crate::stats::DerivationError::AlreadyApplied)
        );
    }

    #[test]
    fn failed_store_write_leaves_actor_untouched() {
        let tables = sample_tables();
        let config = sample_config();
        let env = RulesEnv::from_static(&tables, &config);
        let mut actor = new_character();
        {
            let mut store = NullStore;
            let mut engine = ProgressionEngine::new(&mut actor, env, &mut store);
            human_soldier_through_class(&mut engine);
        }
        let before = actor.primary().clone();
        let revision = actor.revision();

        let mut store = FailingStore;
        let mut engine = ProgressionEngine::new(&mut actor, env, &mut store);
        let error = engine.finalize().unwrap_err();
        assert!(matches!(error, ProgressionError::Transaction(_)));
        assert_eq!(error.report().kind, "transaction");
        assert_eq!(engine.actor().primary(), &before);
        assert_eq!(engine.actor().revision(), revision);
        assert!(!engine.actor().in_mutation());
    }
}
