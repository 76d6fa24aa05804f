//! Runtime state of a single squad: a stack of identical units that fights
//! as one actor.
//!
//! # Count/health coupling
//!
//! A squad only stores its aggregate health. The visible unit count is always
//! derived as `ceil(health / per_unit_health)`, so partially wounded stacks
//! keep their top unit alive until its share of health is gone.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use arrayvec::ArrayVec;

use crate::ability::AbilityId;
use crate::config::BattleConfig;
use crate::error::{BattleError, Result};

/// Arena index of a squad. Valid for the lifetime of one battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SquadId(pub u16);

impl fmt::Display for SquadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Side {
    Friendly,
    Enemy,
}

impl Side {
    pub const fn opposite(self) -> Self {
        match self {
            Side::Friendly => Side::Enemy,
            Side::Enemy => Side::Friendly,
        }
    }
}

/// Who decides what a squad does on its turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Controller {
    Player,
    Ai,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AttackKind {
    /// Must reach its target; blocked by living front-row squads.
    Melee,
    Ranged,
    Magic,
}

impl AttackKind {
    pub const fn is_melee(self) -> bool {
        matches!(self, AttackKind::Melee)
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DamageType {
    #[default]
    Physical,
    Fire,
    Cold,
    Poison,
    Arcane,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StatKind {
    Initiative,
    Attack,
    Defense,
    Damage,
}

/// Additive change to a single stat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatDelta {
    pub stat: StatKind,
    pub amount: i32,
}

impl StatDelta {
    pub const fn new(stat: StatKind, amount: i32) -> Self {
        Self { stat, amount }
    }
}

pub type StatDeltas = ArrayVec<StatDelta, { BattleConfig::MAX_STAT_DELTAS }>;

/// Per-unit base stats of a unit definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitStats {
    /// Health of one unit in the stack.
    pub health: u32,
    pub initiative: i32,
    pub attack: i32,
    pub defense: i32,
    /// Damage dealt by one unit per attack.
    pub damage: i32,
}

impl UnitStats {
    pub fn base(&self, stat: StatKind) -> i32 {
        match stat {
            StatKind::Initiative => self.initiative,
            StatKind::Attack => self.attack,
            StatKind::Defense => self.defense,
            StatKind::Damage => self.damage,
        }
    }
}

/// Read-only unit definition supplied by the content layer.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitDefinition {
    pub name: String,
    pub stats: UnitStats,
    pub attack_kind: AttackKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub damage_type: DamageType,
    #[cfg_attr(feature = "serde", serde(default))]
    pub abilities: Vec<AbilityId>,
}

/// Persistent roster entry a squad is created from at battle setup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RosterEntry {
    pub definition: Arc<UnitDefinition>,
    pub count: u32,
    pub side: Side,
    pub controller: Controller,
}

impl RosterEntry {
    pub fn new(definition: Arc<UnitDefinition>, count: u32, side: Side, controller: Controller) -> Self {
        Self {
            definition,
            count,
            side,
            controller,
        }
    }
}

/// Identifies the effect instance that contributed a set of stat deltas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierSource(pub u64);

/// Result of applying damage to a squad.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageReport {
    /// Health actually removed (never more than the squad had).
    pub dealt: u32,
    pub count_before: u32,
    pub count_after: u32,
}

impl DamageReport {
    pub const fn killed(&self) -> u32 {
        self.count_before - self.count_after
    }

    pub const fn wiped_out(&self) -> bool {
        self.count_before > 0 && self.count_after == 0
    }
}

/// Mutable runtime state of one squad.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SquadModel {
    id: SquadId,
    definition: Arc<UnitDefinition>,
    side: Side,
    controller: Controller,
    health: u32,
    modifiers: BTreeMap<ModifierSource, StatDeltas>,
}

impl SquadModel {
    pub fn from_entry(id: SquadId, entry: &RosterEntry) -> Result<Self> {
        if entry.definition.stats.health == 0 {
            return Err(BattleError::InvalidDefinition {
                name: entry.definition.name.clone(),
                reason: "per-unit health must be positive",
            });
        }

        Ok(Self {
            id,
            definition: Arc::clone(&entry.definition),
            side: entry.side,
            controller: entry.controller,
            health: entry.definition.stats.health.saturating_mul(entry.count),
            modifiers: BTreeMap::new(),
        })
    }

    pub fn id(&self) -> SquadId {
        self.id
    }

    pub fn definition(&self) -> &UnitDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn controller(&self) -> Controller {
        self.controller
    }

    pub fn is_player_controllable(&self) -> bool {
        self.controller == Controller::Player && !self.is_empty()
    }

    pub fn attack_kind(&self) -> AttackKind {
        self.definition.attack_kind
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn per_unit_health(&self) -> u32 {
        self.definition.stats.health
    }

    /// Number of living units: `ceil(health / per_unit_health)`.
    pub fn count(&self) -> u32 {
        self.health.div_ceil(self.per_unit_health())
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Base stat plus every active modifier contribution.
    pub fn stat(&self, stat: StatKind) -> i32 {
        let bonus: i32 = self
            .modifiers
            .values()
            .flat_map(|deltas| deltas.iter())
            .filter(|delta| delta.stat == stat)
            .map(|delta| delta.amount)
            .sum();
        self.definition.stats.base(stat).saturating_add(bonus)
    }

    pub fn initiative(&self) -> i32 {
        self.stat(StatKind::Initiative)
    }

    pub fn apply_damage(&mut self, amount: u32) -> DamageReport {
        let count_before = self.count();
        let dealt = amount.min(self.health);
        self.health -= dealt;
        DamageReport {
            dealt,
            count_before,
            count_after: self.count(),
        }
    }

    /// Attaches the deltas contributed by `source`, replacing any previous
    /// contribution from the same source.
    pub fn add_modifier(&mut self, source: ModifierSource, deltas: StatDeltas) {
        self.modifiers.insert(source, deltas);
    }

    /// Detaches the contribution of `source`. Returns false if none existed.
    pub fn remove_modifier(&mut self, source: ModifierSource) -> bool {
        self.modifiers.remove(&source).is_some()
    }

    pub fn modifier_sources(&self) -> impl Iterator<Item = ModifierSource> + '_ {
        self.modifiers.keys().copied()
    }

    pub fn knows_ability(&self, ability: AbilityId) -> bool {
        self.definition.abilities.contains(&ability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squad(per_unit: u32, count: u32) -> SquadModel {
        let definition = Arc::new(UnitDefinition {
            name: "Pikeman".into(),
            stats: UnitStats {
                health: per_unit,
                initiative: 8,
                attack: 4,
                defense: 5,
                damage: 2,
            },
            attack_kind: AttackKind::Melee,
            damage_type: DamageType::Physical,
            abilities: Vec::new(),
        });
        let entry = RosterEntry::new(definition, count, Side::Friendly, Controller::Player);
        SquadModel::from_entry(SquadId(0), &entry).unwrap()
    }

    #[test]
    fn count_rounds_up_partial_units() {
        let mut squad = squad(10, 5);
        assert_eq!(squad.count(), 5);

        let report = squad.apply_damage(15);
        assert_eq!(report.dealt, 15);
        assert_eq!(squad.health(), 35);
        assert_eq!(squad.count(), 4);
        assert_eq!(report.killed(), 1);
    }

    #[test]
    fn damage_clamps_at_zero_and_empties_squad() {
        let mut squad = squad(10, 2);
        let report = squad.apply_damage(500);

        assert_eq!(report.dealt, 20);
        assert_eq!(squad.health(), 0);
        assert!(squad.is_empty());
        assert!(report.wiped_out());
        assert!(!squad.is_player_controllable());
    }

    #[test]
    fn modifiers_compose_and_detach_independently() {
        let mut squad = squad(10, 1);
        let haste = ModifierSource(1);
        let slow = ModifierSource(2);

        squad.add_modifier(haste, [StatDelta::new(StatKind::Initiative, 3)].into_iter().collect());
        squad.add_modifier(slow, [StatDelta::new(StatKind::Initiative, -5)].into_iter().collect());
        assert_eq!(squad.initiative(), 6);

        assert!(squad.remove_modifier(slow));
        assert_eq!(squad.initiative(), 11);
        assert!(!squad.remove_modifier(slow));
    }

    #[test]
    fn zero_health_definition_is_rejected() {
        let definition = Arc::new(UnitDefinition {
            name: "Ghost".into(),
            stats: UnitStats {
                health: 0,
                initiative: 1,
                attack: 1,
                defense: 1,
                damage: 1,
            },
            attack_kind: AttackKind::Magic,
            damage_type: DamageType::Arcane,
            abilities: Vec::new(),
        });
        let entry = RosterEntry::new(definition, 3, Side::Enemy, Controller::Ai);

        assert!(matches!(
            SquadModel::from_entry(SquadId(1), &entry),
            Err(BattleError::InvalidDefinition { .. })
        ));
    }
}
