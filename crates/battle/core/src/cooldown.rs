//! Per-squad, per-ability cooldown counters.
//!
//! Triggering sets the counter to `cooldown + 1` so an ability used this
//! round is still unavailable after the tick that closes the round. A base
//! cooldown of zero or less leaves the ability ready.

use std::collections::BTreeMap;

use tracing::trace;

use crate::ability::{AbilityDefinition, AbilityId};
use crate::state::{Roster, SquadId};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CooldownTracker {
    units: BTreeMap<SquadId, BTreeMap<AbilityId, i32>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ability_ready(&mut self, unit: SquadId, ability: AbilityId) -> bool {
        self.remaining_cooldown(unit, ability) <= 0
    }

    /// Remaining rounds for `ability`. Starts tracking `unit` on first query.
    pub fn remaining_cooldown(&mut self, unit: SquadId, ability: AbilityId) -> i32 {
        *self
            .units
            .entry(unit)
            .or_default()
            .entry(ability)
            .or_insert(0)
    }

    /// Read-only lookup that does not start tracking.
    pub fn peek_remaining(&self, unit: SquadId, ability: AbilityId) -> i32 {
        self.units
            .get(&unit)
            .and_then(|abilities| abilities.get(&ability))
            .copied()
            .unwrap_or(0)
    }

    /// Starts the cooldown of `ability` for `unit` and returns the new counter.
    pub fn trigger_cooldown(&mut self, unit: SquadId, ability: &AbilityDefinition) -> i32 {
        let remaining = if ability.cooldown <= 0 {
            0
        } else {
            ability.cooldown.saturating_add(1)
        };
        self.units
            .entry(unit)
            .or_default()
            .insert(ability.id, remaining);
        trace!(target: "battle::cooldown", squad = %unit, ability = %ability.id, remaining, "cooldown triggered");
        remaining
    }

    /// Advances every counter by one round and drops trackers of wiped-out
    /// squads.
    pub fn tick(&mut self, roster: &Roster) {
        self.units.retain(|unit, _| roster.living(*unit).is_some());
        for abilities in self.units.values_mut() {
            for remaining in abilities.values_mut() {
                *remaining = (*remaining - 1).max(0);
            }
        }
    }

    pub fn is_tracking(&self, unit: SquadId) -> bool {
        self.units.contains_key(&unit)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::state::{
        AttackKind, Controller, DamageType, RosterEntry, Side, UnitDefinition, UnitStats,
    };
    use crate::targeting::TargetRule;

    fn roster() -> Roster {
        let mut roster = Roster::new();
        let definition = Arc::new(UnitDefinition {
            name: "Mage".into(),
            stats: UnitStats {
                health: 8,
                initiative: 9,
                attack: 2,
                defense: 1,
                damage: 4,
            },
            attack_kind: AttackKind::Magic,
            damage_type: DamageType::Arcane,
            abilities: vec![AbilityId(1)],
        });
        roster
            .register(&RosterEntry::new(definition, 3, Side::Friendly, Controller::Player))
            .unwrap();
        roster
    }

    fn ability(cooldown: i32) -> AbilityDefinition {
        AbilityDefinition {
            id: AbilityId(1),
            name: "Fireball".into(),
            cooldown,
            target: TargetRule::Enemy,
            effects: Vec::new(),
        }
    }

    #[test]
    fn query_lazily_starts_tracking() {
        let mut tracker = CooldownTracker::new();
        assert!(!tracker.is_tracking(SquadId(0)));
        assert!(tracker.is_ability_ready(SquadId(0), AbilityId(1)));
        assert!(tracker.is_tracking(SquadId(0)));
    }

    #[test]
    fn cooldown_two_blocks_three_round_ticks() {
        let roster = roster();
        let mut tracker = CooldownTracker::new();
        let unit = SquadId(0);

        assert_eq!(tracker.trigger_cooldown(unit, &ability(2)), 3);
        let mut readiness = Vec::new();
        for _ in 0..4 {
            tracker.tick(&roster);
            readiness.push(tracker.is_ability_ready(unit, AbilityId(1)));
        }

        assert_eq!(readiness, [false, false, true, true]);
    }

    #[test]
    fn ready_again_at_fourth_round_tick_when_triggered_mid_round() {
        let roster = roster();
        let mut tracker = CooldownTracker::new();
        let unit = SquadId(0);

        // Round 1: the ability fires during the round, before its closing tick.
        tracker.trigger_cooldown(unit, &ability(2));
        assert!(!tracker.is_ability_ready(unit, AbilityId(1)));

        for round in 1..=3 {
            assert!(!tracker.is_ability_ready(unit, AbilityId(1)), "round {round}");
            if round < 3 {
                tracker.tick(&roster);
            }
        }
        tracker.tick(&roster);
        assert!(tracker.is_ability_ready(unit, AbilityId(1)));
    }

    #[test]
    fn non_positive_cooldown_stays_ready() {
        let mut tracker = CooldownTracker::new();
        assert_eq!(tracker.trigger_cooldown(SquadId(0), &ability(0)), 0);
        assert!(tracker.is_ability_ready(SquadId(0), AbilityId(1)));
    }

    #[test]
    fn tick_never_goes_negative_and_prunes_dead_units() {
        let mut roster = roster();
        let mut tracker = CooldownTracker::new();

        tracker.trigger_cooldown(SquadId(0), &ability(1));
        for _ in 0..5 {
            tracker.tick(&roster);
        }
        assert_eq!(tracker.peek_remaining(SquadId(0), AbilityId(1)), 0);

        roster.get_mut(SquadId(0)).unwrap().apply_damage(1_000);
        tracker.tick(&roster);
        assert!(!tracker.is_tracking(SquadId(0)));
    }
}
