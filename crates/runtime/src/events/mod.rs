//! Topic-based event bus for runtime events.
//!
//! The battle worker drains the engine outbox after every command and
//! publishes each notification on the topic matching its category, so
//! consumers can subscribe only to the topics they need.

mod bus;

pub use bus::{Event, EventBus, Topic};
