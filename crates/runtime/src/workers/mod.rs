//! Worker tasks that back the runtime orchestration.
//!
//! The battle worker owns the engine and executes every command on a single
//! task; timers it arms report back through its own wake channel.

mod battle;

pub use battle::{BattleWorker, Command};
