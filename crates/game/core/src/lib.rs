//! Deterministic character rules shared by every front end.
//!
//! `saga-core` defines the canonical progression and derivation rules
//! (character state, prerequisite checks, modifier stacking, derived stats)
//! and exposes pure APIs with no I/O. Primary state changes only through
//! [`ActorUpdateTransaction`] commits issued by [`ProgressionEngine`] or
//! [`ActorUpdates`]; the derived block is rebuilt by [`Recalculator`]. Supporting crates depend on
//! the types re-exported here.
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod prereq;
pub mod state;
pub mod stats;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{FirstLevelHp, RulesConfig};
pub use engine::{
    ActorUpdates, Budgets, FinalizeOutcome, MaterializedItem, PrerequisiteError, PrerequisiteFailure,
    ProgressionAction, ProgressionCompleted, ProgressionEngine, ProgressionError, SkillInput,
    TransitionPhase, TransitionPhaseError, UpdateError, UpdateOutcome, ValidationError, ValidationKind,
    stage_selections,
};
pub use env::{
    BackgroundDef, ClassDef, EmptyCatalog, FeatDef, ItemCatalog, RuleTables, RuleTablesData,
    RulesEnv, SkillDef, SpeciesDef, StaticRuleTables, TalentDef,
};
pub use error::{ErrorReport, ErrorSeverity, GameError};
pub use prereq::{PrereqKind, PrereqOutcome};
pub use state::{
    Ability, AbilityScores, ActiveEffect, Actor, ActorId, ActorKind, ActorStore,
    ActorUpdateTransaction, FieldWrite, ItemId, ItemType, NullStore, OwnedItem, PrimaryState,
    ProgressionMode, ProgressionState, ProgressionStatus, Step, StoreError, TransactionFailure,
};
pub use stats::{
    ConditionTrack, DerivationError, DerivationWarning, DerivedBlock, DerivedHook, RecalcStatus,
    Recalculator,
};
