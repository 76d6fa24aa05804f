//! Turns runtime events into a readable battle log.
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use battle_core::BattleEvent;
use battle_runtime::{BattleHandle, Event, Topic};

/// Subscribes to every topic and logs one line per event until the battle
/// finishes.
pub struct EventReporter {
    phase_rx: broadcast::Receiver<Event>,
    turn_rx: broadcast::Receiver<Event>,
    combat_rx: broadcast::Receiver<Event>,
}

impl EventReporter {
    pub fn new(handle: &BattleHandle) -> Self {
        Self {
            phase_rx: handle.subscribe(Topic::Phase),
            turn_rx: handle.subscribe(Topic::Turn),
            combat_rx: handle.subscribe(Topic::Combat),
        }
    }

    /// Returns the number of events reported.
    pub async fn run(mut self) -> usize {
        let mut reported = 0;
        loop {
            let received = tokio::select! {
                received = self.phase_rx.recv() => received,
                received = self.turn_rx.recv() => received,
                received = self.combat_rx.recv() => received,
            };

            match received {
                Ok(event) => {
                    reported += 1;
                    let finished = matches!(
                        event.as_battle(),
                        Some(BattleEvent::BattleFinished { .. })
                    );
                    report(&event);
                    if finished {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(target: "battle::log", skipped, "reporter fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }

        for rx in [&mut self.turn_rx, &mut self.combat_rx] {
            while let Ok(event) = rx.try_recv() {
                reported += 1;
                report(&event);
            }
        }
        reported
    }
}

fn report(event: &Event) {
    match event {
        Event::Battle(event @ (BattleEvent::PhaseChanged { .. } | BattleEvent::BattleFinished { .. })) => {
            info!(target: "battle::log", "{}", describe(event));
        }
        Event::Battle(event) => debug!(target: "battle::log", "{}", describe(event)),
        Event::TimerScheduled { serial, delay } => {
            debug!(target: "battle::log", serial, ?delay, "timer scheduled");
        }
        Event::DamagePresented { ticket } => {
            debug!(target: "battle::log", ?ticket, "damage presented");
        }
    }
}

/// One-line description of an engine event.
pub fn describe(event: &BattleEvent) -> String {
    match event {
        BattleEvent::PhaseChanged { from, to } => format!("phase {from} -> {to}"),
        BattleEvent::RoundStarted { round, queue } => {
            format!("round {round} begins with {} squads", queue.len())
        }
        BattleEvent::QueueChanged { queue } => format!("queue now holds {} squads", queue.len()),
        BattleEvent::TurnStarted { round, squad } => format!("{squad} takes a turn in round {round}"),
        BattleEvent::TurnSkipped { squad } => format!("{squad} skips"),
        BattleEvent::TurnEnded { squad } => format!("{squad} ends its turn"),
        BattleEvent::ActionAttached { squad, action, .. } => format!("{squad} prepares {action}"),
        BattleEvent::TargetRequested { squad, .. } => format!("{squad} awaits a target"),
        BattleEvent::ActionResolved { squad, action } => format!("{squad} resolves {action}"),
        BattleEvent::ActionCancelled { squad, action } => format!("{squad} cancels {action}"),
        BattleEvent::SquadDefended { squad } => format!("{squad} defends"),
        BattleEvent::DamageApplied {
            target, report, ..
        } => format!(
            "{target} takes {} damage, {} units lost",
            report.dealt,
            report.killed()
        ),
        BattleEvent::EffectAttached { target, effect, .. } => format!("{effect} attached to {target}"),
        BattleEvent::EffectTicked {
            target, effect, tick, ..
        } => format!("{effect} ticks on {target} ({tick})"),
        BattleEvent::EffectRemoved {
            target,
            effect,
            reason,
            ..
        } => format!("{effect} removed from {target} ({reason})"),
        BattleEvent::CooldownStarted {
            squad,
            ability,
            remaining,
        } => format!("{ability} of {squad} cools down for {remaining}"),
        BattleEvent::RoundEnded { round } => format!("round {round} ends"),
        BattleEvent::BattleFinished { status } => format!("battle finished: {status}"),
    }
}
