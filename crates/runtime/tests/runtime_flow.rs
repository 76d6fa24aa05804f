//! Runtime integration tests.
//!
//! Every test runs on a paused tokio clock, so auto-skip and damage
//! presentation delays elapse instantly but in order.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use battle_content::{RosterLoader, SKIRMISH_RON};
use battle_core::{
    AbilityId, ActionKind, AiTurnPolicy, AttackKind, Battle, BattleConfig, BattleError,
    BattleEvent, BattleStatus, Controller, DamageTicket, DamageType, Row, RosterEntry, Side,
    SlotId, SquadId, Suspension, UnitDefinition, UnitStats,
};
use battle_runtime::{
    AiPlayerProvider, Event, PlayerDecision, PlayerProvider, Runtime, RuntimeConfig,
    RuntimeError, ScriptedPlayerProvider, Topic, TurnRequest,
};

const A: SquadId = SquadId(0);
const B: SquadId = SquadId(1);

fn unit(name: &str, initiative: i32) -> Arc<UnitDefinition> {
    Arc::new(UnitDefinition {
        name: name.to_owned(),
        stats: UnitStats {
            health: 10,
            initiative,
            attack: 5,
            defense: 5,
            damage: 3,
        },
        attack_kind: AttackKind::Melee,
        damage_type: DamageType::Physical,
        abilities: Vec::new(),
    })
}

/// Player squad `A` (initiative 5) against AI squad `B` (initiative 3).
fn duel(config: BattleConfig, enemy_count: u32) -> Battle {
    Battle::builder(config)
        .squad(RosterEntry::new(unit("a", 5), 10, Side::Friendly, Controller::Player))
        .squad(RosterEntry::new(unit("b", 3), enemy_count, Side::Enemy, Controller::Ai))
        .with_standard_collaborators()
        .build()
        .expect("duel should build")
}

fn runtime(config: RuntimeConfig, battle: Battle) -> Runtime {
    Runtime::builder()
        .config(config)
        .battle(battle)
        .build()
        .expect("runtime should build")
}

#[tokio::test(start_paused = true)]
async fn ai_auto_skip_waits_for_the_configured_delay() {
    let runtime = runtime(RuntimeConfig::default(), duel(BattleConfig::default(), 10));
    let handle = runtime.handle();
    let mut turn_rx = handle.subscribe(Topic::Turn);

    assert!(handle.start().await.unwrap());
    assert!(handle.request_rounds().await.unwrap());

    let started = Instant::now();
    assert!(handle.select_target(None).await.unwrap());

    let mut scheduled = None;
    loop {
        match turn_rx.recv().await.unwrap() {
            Event::TimerScheduled { delay, .. } => scheduled = Some(delay),
            Event::Battle(BattleEvent::ActionResolved { squad, action }) if squad == B => {
                assert_eq!(action, ActionKind::AutoSkip);
                break;
            }
            _ => {}
        }
    }

    assert_eq!(scheduled, Some(BattleConfig::DEFAULT_AUTO_SKIP_DELAY));
    assert!(started.elapsed() >= BattleConfig::DEFAULT_AUTO_SKIP_DELAY);
}

#[tokio::test(start_paused = true)]
async fn stale_timer_after_cancel_is_ignored() {
    let runtime = runtime(RuntimeConfig::default(), duel(BattleConfig::default(), 10));
    let handle = runtime.handle();

    handle.start().await.unwrap();
    handle.request_rounds().await.unwrap();
    handle.select_target(None).await.unwrap();

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.active, Some(B));
    assert!(matches!(
        snapshot.pending.map(|pending| pending.suspension),
        Some(Suspension::AwaitingTimer(_))
    ));

    // The AI squad falls back to a plain skip and round two begins.
    assert!(handle.cancel_action().await.unwrap());
    tokio::time::sleep(Duration::from_secs(1)).await;

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.round, 2);
    assert_eq!(snapshot.active, Some(A));
    assert_eq!(
        snapshot.pending.map(|pending| pending.suspension),
        Some(Suspension::AwaitingTarget)
    );
}

#[tokio::test(start_paused = true)]
async fn worker_acknowledges_damage_after_presentation_delay() {
    let runtime = runtime(RuntimeConfig::default(), duel(BattleConfig::default(), 10));
    let handle = runtime.handle();
    let mut combat_rx = handle.subscribe(Topic::Combat);

    handle.start().await.unwrap();
    handle.request_rounds().await.unwrap();
    let started = Instant::now();
    assert!(handle.select_target(Some(B)).await.unwrap());

    let mut applied = None;
    loop {
        match combat_rx.recv().await.unwrap() {
            Event::Battle(BattleEvent::DamageApplied { ticket, target, .. }) => {
                assert_eq!(target, B);
                applied = Some(ticket);
            }
            Event::DamagePresented { ticket } => {
                assert_eq!(Some(ticket), applied);
                break;
            }
            _ => {}
        }
    }

    assert!(started.elapsed() >= RuntimeConfig::DEFAULT_DAMAGE_PRESENTATION);
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.active, Some(B));
}

#[derive(Default)]
struct PresentingProvider {
    presented: Arc<AtomicUsize>,
}

#[async_trait]
impl PlayerProvider for PresentingProvider {
    async fn decide(&self, request: &TurnRequest) -> battle_runtime::Result<PlayerDecision> {
        Ok(PlayerDecision::Target(request.candidates.first().copied()))
    }

    async fn present_damage(&self, _ticket: DamageTicket) -> battle_runtime::Result<()> {
        self.presented.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn provider_presents_damage_when_worker_does_not() {
    let presented = Arc::new(AtomicUsize::new(0));
    let mut runtime = Runtime::builder()
        .config(RuntimeConfig::default().with_damage_presentation(None))
        .battle(duel(BattleConfig::default(), 1))
        .player_provider(PresentingProvider {
            presented: Arc::clone(&presented),
        })
        .build()
        .unwrap();

    let result = runtime.run().await.unwrap();

    assert_eq!(result.status, BattleStatus::Victory);
    assert_eq!(result.rounds, 1);
    assert_eq!(presented.load(Ordering::SeqCst), 1);
    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn scripted_flee_ends_the_battle() {
    let mut runtime = Runtime::builder()
        .battle(duel(BattleConfig::default(), 10))
        .player_provider(ScriptedPlayerProvider::new([PlayerDecision::Flee]))
        .build()
        .unwrap();

    let result = runtime.run().await.unwrap();

    assert_eq!(result.status, BattleStatus::Flee);
    assert_eq!(result.rounds, 1);
    assert_eq!(result.survivors(Side::Enemy).count(), 1);
}

#[tokio::test(start_paused = true)]
async fn rejected_decision_falls_back_to_suggested_target() {
    let mut runtime = Runtime::builder()
        .battle(duel(BattleConfig::default(), 1))
        .player_provider(ScriptedPlayerProvider::new([PlayerDecision::UseAbility(
            AbilityId(9),
        )]))
        .build()
        .unwrap();

    let result = runtime.run().await.unwrap();

    assert_eq!(result.status, BattleStatus::Victory);
    assert_eq!(result.rounds, 1);
}

#[tokio::test(start_paused = true)]
async fn running_without_provider_fails_on_first_player_turn() {
    let mut runtime = runtime(RuntimeConfig::default(), duel(BattleConfig::default(), 10));

    let error = runtime.run().await.unwrap_err();

    assert!(matches!(error, RuntimeError::ProviderNotSet));
    let snapshot = runtime.handle().snapshot().await.unwrap();
    assert_eq!(snapshot.active, Some(A));
}

#[tokio::test]
async fn building_without_battle_fails() {
    assert!(matches!(
        Runtime::builder().build(),
        Err(RuntimeError::MissingBattle)
    ));
}

#[tokio::test(start_paused = true)]
async fn tactics_moves_go_through_the_handle() {
    let runtime = runtime(RuntimeConfig::default(), duel(BattleConfig::default(), 10));
    let handle = runtime.handle();

    handle.start().await.unwrap();
    handle
        .move_unit(A, SlotId::new(Side::Friendly, Row::Back, 2))
        .await
        .unwrap();

    let error = handle
        .move_unit(A, SlotId::new(Side::Enemy, Row::Front, 0))
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        RuntimeError::Battle(BattleError::SlotUnavailable(A))
    ));
}

#[tokio::test(start_paused = true)]
async fn skirmish_runs_to_completion_with_ai_players() {
    let config = RuntimeConfig::new(
        BattleConfig::default().with_ai_turn_policy(AiTurnPolicy::Attack),
    );
    let battle = RosterLoader::parse(SKIRMISH_RON)
        .unwrap()
        .into_builder(config.battle.clone())
        .with_standard_collaborators()
        .build()
        .unwrap();

    let mut runtime = Runtime::builder()
        .config(config)
        .battle(battle)
        .player_provider(AiPlayerProvider)
        .build()
        .unwrap();
    let mut phase_rx = runtime.subscribe(Topic::Phase);

    let result = runtime.run().await.unwrap();

    assert!(result.rounds >= 1);
    match result.status {
        BattleStatus::Victory => assert_eq!(result.survivors(Side::Enemy).count(), 0),
        BattleStatus::Defeat => assert_eq!(result.survivors(Side::Friendly).count(), 0),
        BattleStatus::Flee => assert_eq!(result.rounds, BattleConfig::DEFAULT_MAX_ROUNDS),
    }

    let mut finished = None;
    while let Ok(event) = phase_rx.try_recv() {
        if let Some(BattleEvent::BattleFinished { status }) = event.as_battle() {
            finished = Some(*status);
        }
    }
    assert_eq!(finished, Some(result.status));
    runtime.shutdown().await.unwrap();
}
