//! In-process event emission for the generation engine.
//!
//! The engine publishes structured job and batch lifecycle events for an
//! external analytics store to persist. Emission is strictly
//! fire-and-forget: a missing or slow subscriber never affects
//! generation outcomes.

pub mod bus;

pub use bus::{EventBus, GenerationEvent};
