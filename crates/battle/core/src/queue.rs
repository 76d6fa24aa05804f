//! Per-round turn order.

use std::collections::VecDeque;

use crate::state::{Roster, SquadId};

/// Squads waiting to act this round, head first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TurnQueue {
    order: VecDeque<SquadId>,
}

impl TurnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the queue from every non-empty squad, highest initiative
    /// first. The sort is stable, so equal initiative keeps registration
    /// order.
    pub fn rebuild(&mut self, roster: &Roster) {
        let mut living: Vec<_> = roster
            .battle_units()
            .map(|squad| (squad.initiative(), squad.id()))
            .collect();
        living.sort_by(|a, b| b.0.cmp(&a.0));

        self.order = living.into_iter().map(|(_, id)| id).collect();
    }

    pub fn peek(&self) -> Option<SquadId> {
        self.order.front().copied()
    }

    pub fn pop(&mut self) -> Option<SquadId> {
        self.order.pop_front()
    }

    /// Re-inserts `squad` at the tail. Any earlier position is dropped first
    /// so a squad is never queued twice.
    pub fn push_back(&mut self, squad: SquadId) {
        self.remove(squad);
        self.order.push_back(squad);
    }

    pub fn remove(&mut self, squad: SquadId) -> bool {
        let before = self.order.len();
        self.order.retain(|id| *id != squad);
        self.order.len() != before
    }

    /// Drops squads that have been wiped out since the rebuild.
    pub fn retain_living(&mut self, roster: &Roster) {
        self.order.retain(|id| roster.living(*id).is_some());
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn contains(&self, squad: SquadId) -> bool {
        self.order.contains(&squad)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = SquadId> + '_ {
        self.order.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<SquadId> {
        self.order.iter().copied().collect()
    }
}
