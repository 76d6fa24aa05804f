//! Encounter roster loader.
//!
//! RON format:
//!
//! ```ron
//! (
//!     effects: [
//!         (id: 1, name: "Burn", trigger: OnTick, duration: TurnCount, max_tick: 3,
//!          kind: Damage((damage_type: Fire, amount: 6))),
//!     ],
//!     abilities: [
//!         (id: 1, name: "Firebolt", cooldown: 2, target: Enemy, effects: [1]),
//!     ],
//!     units: {
//!         "pyromancer": (name: "Pyromancer", attack_kind: Magic, damage_type: Fire,
//!                        stats: (health: 8, initiative: 7, attack: 4, defense: 2, damage: 3),
//!                        abilities: [1]),
//!     },
//!     squads: [
//!         (unit: "pyromancer", count: 6, side: Friendly, controller: Player),
//!     ],
//! )
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use battle_core::{
    AbilityBook, AbilityDefinition, BattleBuilder, BattleConfig, Controller, EffectDefinition,
    RosterEntry, Side, UnitDefinition,
};
use serde::Deserialize;

use crate::loaders::{LoadResult, read_file};

/// One squad of an encounter, referencing a unit by name.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SquadSpec {
    pub unit: String,
    pub count: u32,
    pub side: Side,
    #[serde(default = "default_controller")]
    pub controller: Controller,
}

fn default_controller() -> Controller {
    Controller::Ai
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    #[serde(default)]
    effects: Vec<EffectDefinition>,
    #[serde(default)]
    abilities: Vec<AbilityDefinition>,
    units: BTreeMap<String, UnitDefinition>,
    squads: Vec<SquadSpec>,
}

/// Everything an encounter needs from the content layer.
#[derive(Clone, Debug)]
pub struct BattleContent {
    pub abilities: AbilityBook,
    pub entries: Vec<RosterEntry>,
}

impl BattleContent {
    /// Builder pre-loaded with this content's squads and abilities.
    pub fn into_builder(self, config: BattleConfig) -> BattleBuilder {
        BattleBuilder::new(config)
            .abilities(self.abilities)
            .squads(self.entries)
    }

    pub fn side(&self, side: Side) -> impl Iterator<Item = &RosterEntry> {
        self.entries.iter().filter(move |entry| entry.side == side)
    }
}

/// Loader for encounter rosters from RON files.
pub struct RosterLoader;

impl RosterLoader {
    pub fn load(path: &Path) -> LoadResult<BattleContent> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to load roster {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<BattleContent> {
        let raw: RosterFile = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse roster RON: {}", e))?;

        let mut abilities = AbilityBook::new();
        for effect in raw.effects {
            abilities.insert_effect(effect);
        }
        for ability in raw.abilities {
            abilities.insert_ability(ability)?;
        }

        let units: BTreeMap<String, Arc<UnitDefinition>> = raw
            .units
            .into_iter()
            .map(|(key, unit)| (key, Arc::new(unit)))
            .collect();

        let mut entries = Vec::with_capacity(raw.squads.len());
        for squad in raw.squads {
            let definition = units
                .get(&squad.unit)
                .ok_or_else(|| anyhow::anyhow!("Squad references unknown unit '{}'", squad.unit))?;
            if let Some(missing) = definition
                .abilities
                .iter()
                .find(|id| abilities.ability(**id).is_none())
            {
                anyhow::bail!("Unit '{}' references unknown ability {}", squad.unit, missing);
            }
            if squad.count == 0 {
                anyhow::bail!("Squad of '{}' must contain at least one unit", squad.unit);
            }

            entries.push(RosterEntry::new(
                Arc::clone(definition),
                squad.count,
                squad.side,
                squad.controller,
            ));
        }

        Ok(BattleContent { abilities, entries })
    }
}

#[cfg(test)]
mod tests {
    use battle_core::{
        AbilityId, AttackKind, DamageType, DurationMode, EffectEvent, EffectId, EffectKind,
        StackPolicy, TargetRule,
    };

    use super::*;

    const ROSTER: &str = r#"
(
    effects: [
        (id: 1, name: "Burn", trigger: OnTick, duration: TurnCount, max_tick: 3,
         kind: Damage((damage_type: Fire, amount: 6))),
        (id: 2, name: "Guard", trigger: OnTick, duration: UntilEvent(TurnStarted), max_tick: 0,
         kind: StatModifier([(stat: Defense, amount: 4)]), stacking: Refresh),
    ],
    abilities: [
        (id: 1, name: "Firebolt", cooldown: 2, target: Enemy, effects: [1]),
        (id: 2, name: "Brace", target: SelfOnly, effects: [2]),
    ],
    units: {
        "pyromancer": (
            name: "Pyromancer",
            stats: (health: 8, initiative: 7, attack: 4, defense: 2, damage: 3),
            attack_kind: Magic,
            damage_type: Fire,
            abilities: [1],
        ),
        "pikeman": (
            name: "Pikeman",
            stats: (health: 12, initiative: 4, attack: 5, defense: 6, damage: 2),
            attack_kind: Melee,
            abilities: [2],
        ),
    },
    squads: [
        (unit: "pyromancer", count: 6, side: Friendly, controller: Player),
        (unit: "pikeman", count: 12, side: Friendly, controller: Player),
        (unit: "pikeman", count: 15, side: Enemy),
    ],
)
"#;

    #[test]
    fn parses_full_roster() {
        let content = RosterLoader::parse(ROSTER).unwrap();

        assert_eq!(content.entries.len(), 3);
        assert_eq!(content.side(Side::Friendly).count(), 2);

        let enemy = &content.entries[2];
        assert_eq!(enemy.controller, Controller::Ai);
        assert_eq!(enemy.definition.attack_kind, AttackKind::Melee);
        assert_eq!(enemy.definition.damage_type, DamageType::Physical);
        assert!(Arc::ptr_eq(&enemy.definition, &content.entries[1].definition));

        let firebolt = content.abilities.ability(AbilityId(1)).unwrap();
        assert_eq!(firebolt.cooldown, 2);
        assert_eq!(firebolt.target, TargetRule::Enemy);

        let guard = content.abilities.effect(EffectId(2)).unwrap();
        assert_eq!(guard.duration, DurationMode::UntilEvent(EffectEvent::TurnStarted));
        assert_eq!(guard.stacking, StackPolicy::Refresh);
        assert!(matches!(&guard.kind, EffectKind::StatModifier(deltas) if deltas.len() == 1));
    }

    #[test]
    fn unknown_unit_is_an_error() {
        let err = RosterLoader::parse(
            r#"(units: {}, squads: [(unit: "ghost", count: 1, side: Enemy)])"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn ability_with_unknown_effect_is_an_error() {
        let result = RosterLoader::parse(
            r#"(
                abilities: [(id: 1, name: "Void", target: Enemy, effects: [9])],
                units: {},
                squads: [],
            )"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn bundled_skirmish_builds_a_battle() {
        let content = RosterLoader::parse(crate::SKIRMISH_RON).unwrap();
        assert!(content.side(Side::Friendly).count() > 0);
        assert!(content.side(Side::Enemy).count() > 0);

        let battle = content
            .into_builder(BattleConfig::default())
            .with_standard_collaborators()
            .build();
        assert!(battle.is_ok());
    }

    #[test]
    fn loads_roster_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.ron");
        std::fs::write(&path, ROSTER).unwrap();

        let content = RosterLoader::load(&path).unwrap();
        assert_eq!(content.entries.len(), 3);

        let missing = dir.path().join("missing.ron");
        let err = RosterLoader::load(&missing).unwrap_err();
        assert!(err.to_string().contains("missing.ron"));
    }
}
