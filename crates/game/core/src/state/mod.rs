//! Authoritative character state.
//!
//! This module owns the primary (hand-authored and progression-written) state
//! of an actor together with the transaction helper that is the only way to
//! change it. The derived block hangs off [`Actor`] but is produced by
//! [`crate::stats`].
mod abilities;
mod actor;
mod common;
mod grants;
mod items;
mod progression;
mod skills;
mod transaction;

pub use abilities::{Ability, AbilityScore, AbilityScores, ability_modifier};
pub use actor::{Actor, ActorKind, ClassLevel, HitPoints, PrimaryState};
pub use common::{ActorId, ItemId, Size, normalize_key};
pub use grants::{Grant, GrantOrigin, Grants};
pub use items::{ActionCost, ActiveEffect, ItemType, OwnedItem, WeaponProfile, WeaponRange};
pub use progression::{
    CompletedSteps, PendingClass, PendingSelections, PendingSkill, PendingSpecies,
    ProgressionMode, ProgressionState, ProgressionStatus, Step,
};
pub use skills::SkillState;
pub use transaction::{
    ActorStore, ActorUpdateTransaction, CommitOutcome, FieldWrite, NullStore, StoreError,
    TransactionFailure,
};
