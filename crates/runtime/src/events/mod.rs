//! Topic-based event bus for runtime events.
//!
//! Events are published to specific topics, and consumers subscribe only to
//! the topics they need. Publishing never waits on subscribers.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{DerivedEvent, ProgressionEvent};
