//! Derived hooks installed by the runtime.
//!
//! Hooks run inside a recompute while the recalculation guard is held. They
//! only observe the new block and forward it; any recompute they would ask
//! for is skipped by the guard.

use saga_core::{Actor, DerivedHook, RecalcStatus, Recalculator};

use crate::events::{DerivedEvent, EventBus};

/// Publishes every rebuilt derived block on [`crate::Topic::Derived`].
pub struct DerivedEventHook {
    event_bus: EventBus,
}

impl DerivedEventHook {
    pub fn new(event_bus: EventBus) -> Self {
        Self { event_bus }
    }
}

impl DerivedHook for DerivedEventHook {
    fn name(&self) -> &'static str {
        "derived_events"
    }

    fn after_recompute(&self, actor: &mut Actor, _recalculator: &Recalculator<'_>) {
        self.event_bus.publish(DerivedEvent::Recomputed {
            actor: actor.id,
            revision: actor.revision(),
            status: RecalcStatus::Completed,
            warnings: actor.derived().warnings.clone(),
        });
    }
}
