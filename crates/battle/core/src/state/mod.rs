//! Runtime battle state: squads and the arena that owns them.

mod roster;
mod squad;

pub use roster::Roster;
pub use squad::{
    AttackKind, Controller, DamageReport, DamageType, ModifierSource, RosterEntry, Side, SquadId,
    SquadModel, StatDelta, StatDeltas, StatKind, UnitDefinition, UnitStats,
};
