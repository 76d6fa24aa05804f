//! Damage application and the replaceable damage strategy.
//!
//! Formula: `count × damage × clamp(100 + 5 × (attack − defense), 30, 300) / 100`

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::effects::{EffectId, EffectInstanceId};
use crate::event::{BattleEvent, EventLog};
use crate::state::{DamageReport, DamageType, Roster, SquadId, SquadModel, StatKind};

/// A typed amount of damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageQuantum {
    pub damage_type: DamageType,
    pub amount: i32,
}

impl DamageQuantum {
    pub const fn new(damage_type: DamageType, amount: i32) -> Self {
        Self {
            damage_type,
            amount,
        }
    }
}

/// Where a damage quantum came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageOrigin {
    Attack(SquadId),
    Effect {
        effect: EffectId,
        instance: EffectInstanceId,
        source: Option<SquadId>,
    },
}

/// Anything that produces a damage quantum.
pub trait DamageSource {
    fn quantum(&self) -> DamageQuantum;

    fn origin(&self) -> DamageOrigin;
}

/// A squad's basic attack, with the quantum computed by a [`DamageFormula`].
#[derive(Clone, Copy, Debug)]
pub struct AttackDamage {
    pub attacker: SquadId,
    pub quantum: DamageQuantum,
}

impl DamageSource for AttackDamage {
    fn quantum(&self) -> DamageQuantum {
        self.quantum
    }

    fn origin(&self) -> DamageOrigin {
        DamageOrigin::Attack(self.attacker)
    }
}

/// Balancing strategy for basic attacks.
pub trait DamageFormula: Send + Sync {
    fn attack_quantum(&self, attacker: &SquadModel, defender: &SquadModel) -> DamageQuantum;
}

/// Deterministic default formula.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardDamage;

impl StandardDamage {
    const MIN_PERCENT: i64 = 30;
    const MAX_PERCENT: i64 = 300;
    const PERCENT_PER_POINT: i64 = 5;
}

impl DamageFormula for StandardDamage {
    fn attack_quantum(&self, attacker: &SquadModel, defender: &SquadModel) -> DamageQuantum {
        let edge = i64::from(attacker.stat(StatKind::Attack))
            - i64::from(defender.stat(StatKind::Defense));
        let percent =
            (100 + Self::PERCENT_PER_POINT * edge).clamp(Self::MIN_PERCENT, Self::MAX_PERCENT);
        let raw = i64::from(attacker.count())
            * i64::from(attacker.stat(StatKind::Damage))
            * percent
            / 100;

        DamageQuantum::new(
            attacker.definition().damage_type,
            raw.clamp(0, i64::from(i32::MAX)) as i32,
        )
    }
}

/// Identifies an applied damage step awaiting its presentation acknowledgement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageTicket(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Non-positive quantum or missing receiver; nothing happened.
    NoOp,
    Applied {
        ticket: DamageTicket,
        report: DamageReport,
    },
}

/// Applies damage quanta and tracks unacknowledged presentation steps.
#[derive(Debug, Default)]
pub struct DamageResolver {
    next_ticket: u64,
    outstanding: BTreeSet<DamageTicket>,
}

impl DamageResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(
        &mut self,
        roster: &mut Roster,
        events: &mut EventLog,
        source: &dyn DamageSource,
        receiver: SquadId,
    ) -> DamageOutcome {
        let quantum = source.quantum();
        if quantum.amount <= 0 {
            trace!(target: "battle::damage", ?receiver, amount = quantum.amount, "ignoring non-positive damage");
            return DamageOutcome::NoOp;
        }
        let Some(squad) = roster.get_mut(receiver) else {
            return DamageOutcome::NoOp;
        };

        let report = squad.apply_damage(quantum.amount.unsigned_abs());
        self.next_ticket += 1;
        let ticket = DamageTicket(self.next_ticket);
        self.outstanding.insert(ticket);

        debug!(
            target: "battle::damage",
            receiver = %receiver,
            damage_type = %quantum.damage_type,
            dealt = report.dealt,
            killed = report.killed(),
            "damage applied"
        );

        events.push(BattleEvent::DamageApplied {
            ticket,
            origin: source.origin(),
            target: receiver,
            quantum,
            report,
        });

        DamageOutcome::Applied { ticket, report }
    }

    /// Marks the receiver's presentation step as complete.
    pub fn acknowledge(&mut self, ticket: DamageTicket) -> bool {
        self.outstanding.remove(&ticket)
    }

    pub fn is_outstanding(&self, ticket: DamageTicket) -> bool {
        self.outstanding.contains(&ticket)
    }

    /// Drops a ticket whose owning action was disposed before the ack.
    pub fn release(&mut self, ticket: DamageTicket) {
        self.outstanding.remove(&ticket);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::state::{AttackKind, Controller, RosterEntry, Side, UnitDefinition, UnitStats};

    fn roster() -> Roster {
        let mut roster = Roster::new();
        for (attack, defense, side) in [(6, 2, Side::Friendly), (3, 4, Side::Enemy)] {
            let definition = Arc::new(UnitDefinition {
                name: format!("{side}"),
                stats: UnitStats {
                    health: 10,
                    initiative: 5,
                    attack,
                    defense,
                    damage: 3,
                },
                attack_kind: AttackKind::Melee,
                damage_type: DamageType::Physical,
                abilities: Vec::new(),
            });
            roster
                .register(&RosterEntry::new(definition, 10, side, Controller::Ai))
                .unwrap();
        }
        roster
    }

    #[test]
    fn standard_formula_scales_with_count_and_stat_edge() {
        let roster = roster();
        let attacker = roster.get(SquadId(0)).unwrap();
        let defender = roster.get(SquadId(1)).unwrap();

        // 10 units × 3 damage × (100 + 5 × 2)% = 33
        let quantum = StandardDamage.attack_quantum(attacker, defender);
        assert_eq!(quantum.amount, 33);
        assert_eq!(quantum.damage_type, DamageType::Physical);
    }

    #[test]
    fn non_positive_quantum_is_a_no_op() {
        let mut roster = roster();
        let mut events = EventLog::new();
        let mut resolver = DamageResolver::new();
        let source = AttackDamage {
            attacker: SquadId(0),
            quantum: DamageQuantum::new(DamageType::Fire, 0),
        };

        let outcome = resolver.resolve(&mut roster, &mut events, &source, SquadId(1));
        assert_eq!(outcome, DamageOutcome::NoOp);
        assert!(events.is_empty());
        assert_eq!(roster.get(SquadId(1)).unwrap().health(), 100);
    }

    #[test]
    fn applied_damage_issues_ticket_until_acknowledged() {
        let mut roster = roster();
        let mut events = EventLog::new();
        let mut resolver = DamageResolver::new();
        let source = AttackDamage {
            attacker: SquadId(0),
            quantum: DamageQuantum::new(DamageType::Physical, 25),
        };

        let DamageOutcome::Applied { ticket, report } =
            resolver.resolve(&mut roster, &mut events, &source, SquadId(1))
        else {
            panic!("damage should apply");
        };
        assert_eq!(report.count_after, 8);
        assert!(resolver.is_outstanding(ticket));
        assert!(resolver.acknowledge(ticket));
        assert!(!resolver.acknowledge(ticket));
        assert_eq!(events.len(), 1);
    }
}
