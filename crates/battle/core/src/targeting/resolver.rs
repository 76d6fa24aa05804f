//! Target validity predicates.
//!
//! Resolvers are pure: they read squad sides and grid rows and never mutate
//! anything. A wiped-out squad is never a legal target.

use crate::grid::{BattleGrid, Row};
use crate::state::{Roster, SquadId, SquadModel};

/// Read-only view of the state needed to judge a target.
#[derive(Clone, Copy)]
pub struct TargetView<'a> {
    pub roster: &'a Roster,
    pub grid: &'a dyn BattleGrid,
}

impl<'a> TargetView<'a> {
    pub fn new(roster: &'a Roster, grid: &'a dyn BattleGrid) -> Self {
        Self { roster, grid }
    }

    fn pair(&self, actor: SquadId, target: SquadId) -> Option<(&'a SquadModel, &'a SquadModel)> {
        Some((self.roster.get(actor)?, self.roster.living(target)?))
    }

    /// True when `target` sits in the back row behind a living front-row
    /// occupant of the same column. Unplaced targets count as unreachable.
    pub fn is_shielded(&self, target: SquadId) -> bool {
        let Some(slot) = self.grid.slot_for_occupant(target) else {
            return true;
        };
        if self.grid.slot_row(slot) != Some(Row::Back) {
            return false;
        }

        self.grid
            .front_slot_for(slot)
            .and_then(|front| self.grid.slot_occupant(front))
            .is_some_and(|occupant| self.roster.living(occupant).is_some())
    }
}

pub trait TargetResolver: Send + Sync {
    fn resolve_target(&self, view: &TargetView<'_>, actor: SquadId, target: SquadId) -> bool;
}

/// Any living squad on the opposing side.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnemyResolver;

impl TargetResolver for EnemyResolver {
    fn resolve_target(&self, view: &TargetView<'_>, actor: SquadId, target: SquadId) -> bool {
        view.pair(actor, target)
            .is_some_and(|(actor, target)| actor.side() != target.side())
    }
}

/// Any living squad on the actor's side, the actor included.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllyResolver;

impl TargetResolver for AllyResolver {
    fn resolve_target(&self, view: &TargetView<'_>, actor: SquadId, target: SquadId) -> bool {
        view.pair(actor, target)
            .is_some_and(|(actor, target)| actor.side() == target.side())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SelfResolver;

impl TargetResolver for SelfResolver {
    fn resolve_target(&self, view: &TargetView<'_>, actor: SquadId, target: SquadId) -> bool {
        actor == target && view.roster.living(target).is_some()
    }
}

/// Enemy rule plus melee reach: melee attackers cannot hit shielded back-row
/// squads.
#[derive(Clone, Copy, Debug, Default)]
pub struct AttackResolver;

impl TargetResolver for AttackResolver {
    fn resolve_target(&self, view: &TargetView<'_>, actor: SquadId, target: SquadId) -> bool {
        if !EnemyResolver.resolve_target(view, actor, target) {
            return false;
        }

        let melee = view
            .roster
            .get(actor)
            .is_some_and(|squad| squad.attack_kind().is_melee());

        !melee || !view.is_shielded(target)
    }
}

/// Data-driven selector over the resolver family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TargetRule {
    Enemy,
    Ally,
    SelfOnly,
    Attack,
}

impl TargetResolver for TargetRule {
    fn resolve_target(&self, view: &TargetView<'_>, actor: SquadId, target: SquadId) -> bool {
        match self {
            TargetRule::Enemy => EnemyResolver.resolve_target(view, actor, target),
            TargetRule::Ally => AllyResolver.resolve_target(view, actor, target),
            TargetRule::SelfOnly => SelfResolver.resolve_target(view, actor, target),
            TargetRule::Attack => AttackResolver.resolve_target(view, actor, target),
        }
    }
}
