//! Static battle content and its loaders.
//!
//! Unit, ability and effect definitions are read-only records for the engine.
//! This crate parses them from RON files into `battle-core` types:
//! - Effect definitions
//! - Ability definitions referencing effects by id
//! - Unit definitions keyed by name
//! - The squads taking part in an encounter, per side
//!
//! Content never appears in battle state; the engine only holds `Arc`s to it.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{BattleContent, RosterLoader, SquadSpec};

/// Bundled two-sided skirmish used when no roster file is configured.
pub const SKIRMISH_RON: &str = include_str!("../data/skirmish.ron");
