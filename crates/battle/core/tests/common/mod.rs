#![allow(dead_code)]

use std::sync::Arc;

use battle_core::{
    AttackKind, Battle, BattleConfig, Controller, DamageType, PendingInput, RosterEntry, Side,
    Suspension, UnitDefinition, UnitStats,
};

pub fn unit(name: &str, initiative: i32, attack_kind: AttackKind, damage: i32) -> Arc<UnitDefinition> {
    Arc::new(UnitDefinition {
        name: name.to_owned(),
        stats: UnitStats {
            health: 10,
            initiative,
            attack: 5,
            defense: 5,
            damage,
        },
        attack_kind,
        damage_type: DamageType::Physical,
        abilities: Vec::new(),
    })
}

pub fn player(definition: Arc<UnitDefinition>, count: u32) -> RosterEntry {
    RosterEntry::new(definition, count, Side::Friendly, Controller::Player)
}

pub fn enemy(definition: Arc<UnitDefinition>, count: u32) -> RosterEntry {
    RosterEntry::new(definition, count, Side::Enemy, Controller::Ai)
}

/// Builds a battle with the standard collaborators and moves it into the
/// first round.
pub fn start_rounds(config: BattleConfig, entries: Vec<RosterEntry>) -> Battle {
    let mut battle = Battle::builder(config)
        .squads(entries)
        .with_standard_collaborators()
        .build()
        .expect("battle should build");
    assert!(battle.start());
    assert!(battle.request_rounds());
    battle
}

pub fn pending(battle: &Battle) -> PendingInput {
    battle.pending().expect("an input should be outstanding")
}

/// Resolves the auto-skip timer of the active AI squad.
pub fn elapse_timer(battle: &mut Battle) {
    let pending = pending(battle);
    assert!(matches!(pending.suspension, Suspension::AwaitingTimer(_)));
    assert!(battle.timer_elapsed(pending.serial));
}
