//! Worker tasks that back the runtime orchestration.
//!
//! Each character is owned by one worker task, so its state is only ever
//! mutated from a single place.

mod character;

pub use character::{CharacterWorker, Command, UpdateRequest};
