//! Recompute orchestration and its guards.
//!
//! Two flags live on every actor:
//!
//! - `running`: a recompute is in progress. A nested request (a hook reacting
//!   to the new block by asking for another recompute) is skipped with a
//!   warning instead of observing a half-written block.
//! - `suppress_depth`: a multi-write mutation context is open. Requests made
//!   inside it are deferred and the actor is marked dirty; the caller runs one
//!   recompute after the outermost context closes.

use super::derived::{apply_modifiers, compute_base};
use super::{DerivationWarning, aggregate};
use crate::env::RulesEnv;
use crate::state::Actor;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecalcGuard {
    running: bool,
    suppress_depth: u32,
    dirty: bool,
}

impl RecalcGuard {
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppress_depth > 0
    }

    /// Primary state changed since the derived block was last rebuilt.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn suppress(&mut self) {
        self.suppress_depth += 1;
    }

    pub(crate) fn release(&mut self) -> bool {
        self.suppress_depth = self.suppress_depth.saturating_sub(1);
        self.suppress_depth == 0 && self.dirty
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum RecalcStatus {
    Completed,
    /// A mutation context is open; the actor was marked dirty instead.
    Deferred,
    /// Another recompute is already running on this actor.
    Skipped,
}

/// Failure of the deferred modifier pass. Never fatal: the base pass already
/// left usable values in place.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DerivationError {
    #[error("derived block is from revision {block}, actor is at {actor}")]
    Stale { block: u64, actor: u64 },

    #[error("modifiers already applied to this derived block")]
    AlreadyApplied,

    #[error("recompute already running")]
    Reentrant,
}

/// Reacts to a freshly rebuilt derived block.
pub trait DerivedHook: Send + Sync {
    fn name(&self) -> &'static str;

    /// Called after a full recompute while the recompute guard is still held,
    /// so any nested recompute request is skipped.
    fn after_recompute(&self, actor: &mut Actor, recalculator: &Recalculator<'_>);
}

/// Runs recompute passes against one rules environment.
pub struct Recalculator<'a> {
    env: RulesEnv<'a>,
    hooks: &'a [Box<dyn DerivedHook>],
}

impl<'a> Recalculator<'a> {
    pub fn new(env: RulesEnv<'a>) -> Self {
        Self { env, hooks: &[] }
    }

    pub fn with_hooks(env: RulesEnv<'a>, hooks: &'a [Box<dyn DerivedHook>]) -> Self {
        Self { env, hooks }
    }

    pub fn env(&self) -> &RulesEnv<'a> {
        &self.env
    }

    fn enter(&self, actor: &mut Actor) -> Option<RecalcStatus> {
        let guard = actor.recalc();
        if guard.is_running() {
            tracing::warn!(actor = %actor.id, "nested recompute skipped");
            return Some(RecalcStatus::Skipped);
        }
        if guard.is_suppressed() {
            actor.recalc_mut().mark_dirty();
            tracing::debug!(actor = %actor.id, "recompute deferred by mutation context");
            return Some(RecalcStatus::Deferred);
        }
        actor.recalc_mut().running = true;
        None
    }

    fn run_hooks(&self, actor: &mut Actor) {
        for hook in self.hooks {
            tracing::debug!(actor = %actor.id, hook = hook.name(), "running derived hook");
            hook.after_recompute(actor, self);
        }
    }

    /// Full recompute: base pass, modifier pass, then hooks.
    pub fn recompute(&self, actor: &mut Actor) -> RecalcStatus {
        if let Some(status) = self.enter(actor) {
            return status;
        }

        let mut block = compute_base(actor, &self.env);
        let aggregation = aggregate(actor.primary(), &self.env);
        apply_modifiers(&mut block, &aggregation);
        log_warnings(&block.warnings);
        *actor.derived_mut() = block;
        actor.recalc_mut().dirty = false;

        self.run_hooks(actor);
        actor.recalc_mut().running = false;
        tracing::debug!(actor = %actor.id, revision = actor.revision(), "recompute completed");
        RecalcStatus::Completed
    }

    /// Synchronous half of a split recompute. Leaves `modifiers_applied`
    /// false; follow with [`Recalculator::modifier_pass`].
    pub fn base_pass(&self, actor: &mut Actor) -> RecalcStatus {
        if let Some(status) = self.enter(actor) {
            return status;
        }

        let block = compute_base(actor, &self.env);
        log_warnings(&block.warnings);
        *actor.derived_mut() = block;
        actor.recalc_mut().dirty = false;
        actor.recalc_mut().running = false;
        RecalcStatus::Completed
    }

    /// Deferred half of a split recompute. Returns the number of modifier
    /// records applied.
    pub fn modifier_pass(&self, actor: &mut Actor) -> Result<usize, DerivationError> {
        if actor.recalc().is_running() {
            return Err(DerivationError::Reentrant);
        }
        let block = actor.derived();
        if block.revision != actor.revision() {
            return Err(DerivationError::Stale {
                block: block.revision,
                actor: actor.revision(),
            });
        }
        if block.modifiers_applied {
            return Err(DerivationError::AlreadyApplied);
        }

        actor.recalc_mut().running = true;
        let aggregation = aggregate(actor.primary(), &self.env);
        log_warnings(&aggregation.warnings);
        apply_modifiers(actor.derived_mut(), &aggregation);

        self.run_hooks(actor);
        actor.recalc_mut().running = false;
        Ok(aggregation.applied.len())
    }
}

fn log_warnings(warnings: &[DerivationWarning]) {
    for warning in warnings {
        warning.log();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::testing::{sample_config, sample_tables, soldier_level_one};

    struct Recursing {
        statuses: Arc<Mutex<Vec<RecalcStatus>>>,
    }

    impl DerivedHook for Recursing {
        fn name(&self) -> &'static str {
            "recursing"
        }

        fn after_recompute(&self, actor: &mut Actor, recalculator: &Recalculator<'_>) {
            let status = recalculator.recompute(actor);
            if let Ok(mut statuses) = self.statuses.lock() {
                statuses.push(status);
            }
        }
    }

    #[test]
    fn recompute_fills_block_and_clears_dirty() {
        let tables = sample_tables();
        let config = sample_config();
        let env = crate::env::RulesEnv::from_static(&tables, &config);
        let mut actor = soldier_level_one();
        assert!(actor.recalc().is_dirty());

        let status = Recalculator::new(env).recompute(&mut actor);
        assert_eq!(status, RecalcStatus::Completed);
        assert!(!actor.recalc().is_dirty());
        assert_eq!(actor.derived().hp.max, 11);
    }

    #[test]
    fn suppressed_recompute_is_deferred() {
        let tables = sample_tables();
        let config = sample_config();
        let env = crate::env::RulesEnv::from_static(&tables, &config);
        let recalculator = Recalculator::new(env);
        let mut actor = soldier_level_one();

        actor.begin_mutation();
        actor.begin_mutation();
        assert_eq!(recalculator.recompute(&mut actor), RecalcStatus::Deferred);
        assert!(!actor.end_mutation());
        assert!(actor.end_mutation());
        assert_eq!(recalculator.recompute(&mut actor), RecalcStatus::Completed);
    }

    #[test]
    fn nested_recompute_from_hook_is_skipped() {
        let tables = sample_tables();
        let config = sample_config();
        let env = crate::env::RulesEnv::from_static(&tables, &config);
        let statuses = Arc::new(Mutex::new(Vec::new()));
        let hooks: Vec<Box<dyn DerivedHook>> = vec![Box::new(Recursing {
            statuses: Arc::clone(&statuses),
        })];
        let recalculator = Recalculator::with_hooks(env, &hooks);

        let mut actor = soldier_level_one();
        assert_eq!(recalculator.recompute(&mut actor), RecalcStatus::Completed);
        assert!(!actor.recalc().is_running());
        assert_eq!(*statuses.lock().unwrap(), vec![RecalcStatus::Skipped]);
    }

    #[test]
    fn split_pass_matches_full_recompute() {
        let tables = sample_tables();
        let config = sample_config();
        let env = crate::env::RulesEnv::from_static(&tables, &config);
        let recalculator = Recalculator::new(env);

        let mut split = soldier_level_one();
        assert_eq!(recalculator.base_pass(&mut split), RecalcStatus::Completed);
        assert!(!split.derived().modifiers_applied);
        recalculator.modifier_pass(&mut split).expect("modifier pass");
        assert_eq!(
            recalculator.modifier_pass(&mut split),
            Err(DerivationError::AlreadyApplied)
        );

        let mut full = soldier_level_one();
        recalculator.recompute(&mut full);
        assert_eq!(split.derived(), full.derived());
    }
}
