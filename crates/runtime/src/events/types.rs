//! Event types for different topics.

use saga_core::{
    ActorId, DerivationWarning, ErrorReport, ProgressionCompleted, ProgressionMode, RecalcStatus,
    Step,
};
use serde::{Deserialize, Serialize};

/// Events about a character's progression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProgressionEvent {
    Started {
        actor: ActorId,
        mode: ProgressionMode,
    },

    StepConfirmed {
        actor: ActorId,
        step: Step,
    },

    /// A step or finalize call was refused; primary state is unchanged.
    Rejected {
        actor: ActorId,
        action: String,
        report: ErrorReport,
    },

    Cancelled {
        actor: ActorId,
    },

    /// Emitted once per successful finalize.
    Completed(ProgressionCompleted),
}

/// Events about derived block rebuilds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DerivedEvent {
    Recomputed {
        actor: ActorId,
        revision: u64,
        status: RecalcStatus,
        warnings: Vec<DerivationWarning>,
    },

    /// The deferred modifier pass landed on the current block.
    ModifiersApplied {
        actor: ActorId,
        applied: usize,
    },

    /// The deferred modifier pass was dropped. Base values stay in place.
    ModifierPassFailed {
        actor: ActorId,
        error: String,
    },
}

impl ProgressionEvent {
    pub fn actor(&self) -> ActorId {
        match self {
            ProgressionEvent::Started { actor, .. }
            | ProgressionEvent::StepConfirmed { actor, .. }
            | ProgressionEvent::Rejected { actor, .. }
            | ProgressionEvent::Cancelled { actor } => *actor,
            ProgressionEvent::Completed(completed) => completed.actor,
        }
    }
}
