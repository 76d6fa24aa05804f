//! Terminal battle result and read-only snapshots for presentation layers.

use crate::action::ActionKind;
use crate::engine::{BattlePhase, PendingInput};
use crate::state::{Side, SquadId, SquadModel};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BattleStatus {
    Defeat,
    Victory,
    Flee,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SquadSummary {
    pub id: SquadId,
    pub name: String,
    pub side: Side,
    pub count: u32,
    pub health: u32,
}

impl From<&SquadModel> for SquadSummary {
    fn from(squad: &SquadModel) -> Self {
        Self {
            id: squad.id(),
            name: squad.name().to_owned(),
            side: squad.side(),
            count: squad.count(),
            health: squad.health(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleResult {
    pub status: BattleStatus,
    pub rounds: u32,
    /// Terminal state of every friendly squad, wiped-out ones included.
    pub friendly: Vec<SquadSummary>,
    pub enemy: Vec<SquadSummary>,
}

impl BattleResult {
    pub fn survivors(&self, side: Side) -> impl Iterator<Item = &SquadSummary> {
        let squads = match side {
            Side::Friendly => &self.friendly,
            Side::Enemy => &self.enemy,
        };
        squads.iter().filter(|squad| squad.count > 0)
    }
}

/// Point-in-time view of a battle.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleSnapshot {
    pub phase: BattlePhase,
    pub round: u32,
    pub queue: Vec<SquadId>,
    pub active: Option<SquadId>,
    pub action: Option<ActionKind>,
    pub pending: Option<PendingInput>,
    pub units: Vec<SquadSummary>,
    pub result: Option<BattleResult>,
}
