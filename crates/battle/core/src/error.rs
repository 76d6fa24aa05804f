//! Error types surfaced by the battle engine.
//!
//! Only wiring mistakes and rejected requests are errors. Expected empty paths
//! (no target, empty queue, resolver rejection) are ordinary outcomes and are
//! handled inside the state machines without producing a `BattleError`.

use crate::ability::AbilityId;
use crate::engine::BattlePhase;
use crate::state::SquadId;

pub type Result<T> = std::result::Result<T, BattleError>;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BattleError {
    /// A required collaborator was not supplied when building the battle.
    #[error("invalid argument: required collaborator `{0}` is missing")]
    MissingCollaborator(&'static str),

    #[error("invalid unit definition `{name}`: {reason}")]
    InvalidDefinition { name: String, reason: &'static str },

    #[error("side {side} exceeds the limit of {limit} squads")]
    TooManySquads {
        side: crate::state::Side,
        limit: usize,
    },

    #[error("unknown squad {0}")]
    UnknownSquad(SquadId),

    #[error("unknown ability {0}")]
    UnknownAbility(AbilityId),

    #[error("squad {squad} does not know ability {ability}")]
    AbilityNotLearned { squad: SquadId, ability: AbilityId },

    #[error("ability {ability} is cooling down ({remaining} rounds remaining)")]
    AbilityNotReady { ability: AbilityId, remaining: i32 },

    #[error("no player-controllable squad is taking its turn")]
    NotPlayerTurn,

    #[error("operation requires phase {expected}, battle is in {actual}")]
    WrongPhase {
        expected: BattlePhase,
        actual: BattlePhase,
    },

    #[error("slot is unavailable for squad {0}")]
    SlotUnavailable(SquadId),
}
