//! Runtime orchestration for the battle engine.
//!
//! This crate wraps the synchronous `battle-core` engine in a tokio worker,
//! turns its suspensions into real-time timers, and routes its events to
//! topic-based subscribers.
//!
//! Modules:
//! - [`api`]: the public handle, errors, and player provider traits
//! - [`events`]: the topic-based event bus
//! - [`workers`]: the background battle worker
//!
//! Public API:
//! - [`Runtime`]: orchestrator that drives a battle to completion
//! - [`BattleHandle`]: cloneable command/query façade
//! - [`PlayerProvider`]: source of player decisions

pub mod api;
pub mod config;
pub mod events;
mod runtime;
pub mod workers;

pub use api::{
    AiPlayerProvider, BattleHandle, PlayerDecision, PlayerProvider, Result, RuntimeError,
    ScriptedPlayerProvider, TurnRequest,
};
pub use config::RuntimeConfig;
pub use events::{Event, EventBus, Topic};
pub use runtime::{Runtime, RuntimeBuilder};
