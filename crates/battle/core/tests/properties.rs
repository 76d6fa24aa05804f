//! Property-based checks of the engine invariants.

mod common;

use std::sync::Arc;

use proptest::prelude::*;

use battle_core::{
    AbilityDefinition, AbilityId, AttackKind, Battle, BattleConfig, BattleEvent, Controller,
    CooldownTracker, DamageResolver, DamageType, DurationMode, EffectDefinition, EffectEnv,
    EffectId, EffectKind, EffectManager, EffectTrigger, EventLog, Roster, RosterEntry, Side,
    SquadId, StackPolicy, StatDelta, StatKind, Suspension, TargetRule, TurnQueue, UnitDefinition,
    UnitStats,
};
use common::{enemy, player, unit};

fn definition(health: u32, initiative: i32) -> Arc<UnitDefinition> {
    Arc::new(UnitDefinition {
        name: format!("unit-{initiative}"),
        stats: UnitStats {
            health,
            initiative,
            attack: 1,
            defense: 1,
            damage: 1,
        },
        attack_kind: AttackKind::Melee,
        damage_type: DamageType::Physical,
        abilities: Vec::new(),
    })
}

#[derive(Clone, Debug)]
enum Command {
    Select(Option<u16>),
    Ack,
    Timer { stale: bool },
    Defend,
    Skip,
    Cancel,
    Flee,
}

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![
        4 => proptest::option::of(0u16..4).prop_map(Command::Select),
        3 => Just(Command::Ack),
        3 => any::<bool>().prop_map(|stale| Command::Timer { stale }),
        2 => Just(Command::Defend),
        2 => Just(Command::Skip),
        2 => Just(Command::Cancel),
        1 => Just(Command::Flee),
    ]
}

fn apply(battle: &mut Battle, command: &Command) {
    match command {
        Command::Select(target) => {
            battle.select_target(target.map(SquadId));
        }
        Command::Ack => {
            if let Some(pending) = battle.pending()
                && let Suspension::AwaitingDamageAck(ticket) = pending.suspension
            {
                battle.acknowledge_damage(ticket);
            }
        }
        Command::Timer { stale } => {
            if let Some(pending) = battle.pending() {
                let serial = if *stale { pending.serial.wrapping_sub(1) } else { pending.serial };
                battle.timer_elapsed(serial);
            }
        }
        Command::Defend => {
            battle.request_defend();
        }
        Command::Skip => {
            battle.request_skip();
        }
        Command::Cancel => {
            battle.cancel_action();
        }
        Command::Flee => {
            battle.flee();
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// The rebuilt queue holds exactly the living squads, by non-increasing
    /// initiative.
    #[test]
    fn queue_holds_living_squads_by_initiative(
        squads in proptest::collection::vec((1u32..6, -5i32..20, any::<bool>()), 1..16),
        wounds in proptest::collection::vec(0u32..200, 16),
    ) {
        let mut roster = Roster::new();
        for (index, (count, initiative, friendly)) in squads.iter().enumerate() {
            let side = if *friendly { Side::Friendly } else { Side::Enemy };
            let entry = RosterEntry::new(definition(10, *initiative), *count, side, Controller::Ai);
            if roster.register(&entry).is_ok() {
                let id = SquadId((roster.len() - 1) as u16);
                roster.get_mut(id).unwrap().apply_damage(wounds[index]);
            }
        }

        let mut queue = TurnQueue::new();
        queue.rebuild(&roster);
        let order = queue.to_vec();

        let mut living: Vec<SquadId> = roster.battle_units().map(|squad| squad.id()).collect();
        let mut queued = order.clone();
        living.sort();
        queued.sort();
        prop_assert_eq!(living, queued);

        let initiatives: Vec<i32> = order
            .iter()
            .map(|id| roster.get(*id).unwrap().initiative())
            .collect();
        prop_assert!(initiatives.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    /// `count == ceil(max(0, health_before - d) / h)` after any damage.
    #[test]
    fn count_tracks_remaining_health(
        per_unit in 1u32..50,
        count in 1u32..100,
        damage in 0u32..10_000,
    ) {
        let mut roster = Roster::new();
        let id = roster
            .register(&RosterEntry::new(definition(per_unit, 1), count, Side::Friendly, Controller::Player))
            .unwrap();
        let squad = roster.get_mut(id).unwrap();
        let before = squad.health();

        squad.apply_damage(damage);

        let remaining = before.saturating_sub(damage);
        prop_assert_eq!(squad.count(), remaining.div_ceil(per_unit));
        prop_assert_eq!(squad.is_empty(), remaining == 0);
    }

    /// Triggering a cooldown of `c > 0` keeps the ability unready for the next
    /// `c` round-ticks; it is ready again at tick `c + 1`.
    #[test]
    fn cooldown_expires_after_c_plus_one_ticks(cooldown in 1i32..8) {
        let mut roster = Roster::new();
        let id = roster
            .register(&RosterEntry::new(definition(10, 1), 1, Side::Friendly, Controller::Player))
            .unwrap();
        let ability = AbilityDefinition {
            id: AbilityId(1),
            name: "Strike".into(),
            cooldown,
            target: TargetRule::Enemy,
            effects: Vec::new(),
        };
        let mut tracker = CooldownTracker::new();

        tracker.trigger_cooldown(id, &ability);
        prop_assert!(!tracker.is_ability_ready(id, ability.id));
        for _ in 0..cooldown {
            tracker.tick(&roster);
            prop_assert!(!tracker.is_ability_ready(id, ability.id));
        }
        tracker.tick(&roster);
        prop_assert!(tracker.is_ability_ready(id, ability.id));
    }

    /// An effect with `max_tick = n > 0` survives `n - 1` ticks and is gone
    /// after the `n`th; `max_tick <= 0` never expires.
    #[test]
    fn effect_lives_for_max_tick_ticks(max_tick in -3i32..12) {
        let mut roster = Roster::new();
        let target = roster
            .register(&RosterEntry::new(definition(10, 1), 3, Side::Enemy, Controller::Ai))
            .unwrap();
        let mut damage = DamageResolver::new();
        let mut events = EventLog::new();
        let mut manager = EffectManager::new();
        let effect = Arc::new(EffectDefinition {
            id: EffectId(7),
            name: "Slow".into(),
            trigger: EffectTrigger::OnTick,
            duration: DurationMode::TurnCount,
            max_tick,
            kind: EffectKind::StatModifier([StatDelta::new(StatKind::Initiative, -2)].into_iter().collect()),
            stacking: StackPolicy::Stack,
        });
        let mut env = EffectEnv { roster: &mut roster, damage: &mut damage, events: &mut events };

        manager.add_effect(&mut env, None, &effect, target);
        let ticks = if max_tick > 0 { max_tick } else { 20 };
        for tick in 1..=ticks {
            manager.tick(&mut env);
            let expected = max_tick <= 0 || tick < max_tick;
            prop_assert_eq!(manager.has_effect(target, effect.id), expected);
        }
    }

    /// Whatever the players do, every attached action ends with exactly one
    /// terminal signal and no two actions are ever attached at once.
    #[test]
    fn actions_resolve_exactly_once(commands in proptest::collection::vec(command(), 1..60)) {
        let config = BattleConfig::default().with_max_rounds(4);
        let mut battle = Battle::builder(config)
            .squad(player(unit("a", 6, AttackKind::Melee, 2), 10))
            .squad(player(unit("b", 4, AttackKind::Ranged, 2), 10))
            .squad(enemy(unit("c", 5, AttackKind::Melee, 2), 10))
            .squad(enemy(unit("d", 2, AttackKind::Magic, 2), 10))
            .with_standard_collaborators()
            .build()
            .unwrap();
        battle.start();
        battle.request_rounds();

        let mut events = battle.drain_events();
        for command in &commands {
            apply(&mut battle, command);
            events.extend(battle.drain_events());
        }

        let mut attached = false;
        let mut opened = 0usize;
        let mut closed = 0usize;
        for event in &events {
            match event {
                BattleEvent::ActionAttached { .. } => {
                    prop_assert!(!attached, "second action attached before the first ended");
                    attached = true;
                    opened += 1;
                }
                BattleEvent::ActionResolved { .. } | BattleEvent::ActionCancelled { .. } => {
                    prop_assert!(attached, "terminal signal without an attached action");
                    attached = false;
                    closed += 1;
                }
                _ => {}
            }
        }
        prop_assert_eq!(opened, closed + usize::from(battle.current_action().is_some()));
        prop_assert_eq!(attached, battle.current_action().is_some());
    }
}
