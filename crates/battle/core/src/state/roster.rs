//! Arena of every squad taking part in one battle.
//!
//! Squads are never removed: a wiped-out squad stays in the arena with zero
//! health so that [`SquadId`]s remain valid for the whole battle. Code that
//! needs "living" squads filters by [`SquadModel::is_empty`].

use crate::config::BattleConfig;
use crate::error::{BattleError, Result};

use super::squad::{RosterEntry, Side, SquadId, SquadModel};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Roster {
    squads: Vec<SquadModel>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a squad. Registration order is the tie-break for equal
    /// initiative.
    pub fn register(&mut self, entry: &RosterEntry) -> Result<SquadId> {
        let on_side = self.squads.iter().filter(|s| s.side() == entry.side).count();
        if on_side >= BattleConfig::MAX_SQUADS_PER_SIDE {
            return Err(BattleError::TooManySquads {
                side: entry.side,
                limit: BattleConfig::MAX_SQUADS_PER_SIDE,
            });
        }

        let id = SquadId(self.squads.len() as u16);
        self.squads.push(SquadModel::from_entry(id, entry)?);
        Ok(id)
    }

    pub fn get(&self, id: SquadId) -> Option<&SquadModel> {
        self.squads.get(usize::from(id.0))
    }

    pub fn get_mut(&mut self, id: SquadId) -> Option<&mut SquadModel> {
        self.squads.get_mut(usize::from(id.0))
    }

    /// Returns the squad only if it still has living units.
    pub fn living(&self, id: SquadId) -> Option<&SquadModel> {
        self.get(id).filter(|squad| !squad.is_empty())
    }

    pub fn len(&self) -> usize {
        self.squads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.squads.is_empty()
    }

    /// All squads in registration order, including wiped-out ones.
    pub fn iter(&self) -> impl Iterator<Item = &SquadModel> {
        self.squads.iter()
    }

    /// Squads that still have living units, in registration order.
    pub fn battle_units(&self) -> impl Iterator<Item = &SquadModel> {
        self.squads.iter().filter(|squad| !squad.is_empty())
    }

    pub fn side(&self, side: Side) -> impl Iterator<Item = &SquadModel> {
        self.squads.iter().filter(move |squad| squad.side() == side)
    }

    pub fn side_defeated(&self, side: Side) -> bool {
        self.side(side).all(SquadModel::is_empty)
    }
}
