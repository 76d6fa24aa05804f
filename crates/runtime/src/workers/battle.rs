//! Battle worker that owns the authoritative [`Battle`].
//!
//! Receives commands from [`BattleHandle`](crate::BattleHandle), feeds them
//! to the engine, publishes the drained engine events to the EventBus and
//! arms real-time timers for suspended actions.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use battle_core::{
    AbilityId, Battle, BattleSnapshot, DamageTicket, PendingInput, SlotId, SquadId, Suspension,
};

use crate::api::TurnRequest;
use crate::events::{Event, EventBus};

/// Commands that can be sent to the battle worker
pub enum Command {
    Start {
        reply: oneshot::Sender<bool>,
    },
    RequestRounds {
        reply: oneshot::Sender<bool>,
    },
    RequestDefend {
        reply: oneshot::Sender<bool>,
    },
    RequestSkip {
        reply: oneshot::Sender<bool>,
    },
    UseAbility {
        ability: AbilityId,
        reply: oneshot::Sender<battle_core::Result<()>>,
    },
    SelectTarget {
        target: Option<SquadId>,
        reply: oneshot::Sender<bool>,
    },
    AcknowledgeDamage {
        ticket: DamageTicket,
        reply: oneshot::Sender<bool>,
    },
    CancelAction {
        reply: oneshot::Sender<bool>,
    },
    Flee {
        reply: oneshot::Sender<bool>,
    },
    MoveUnit {
        squad: SquadId,
        slot: SlotId,
        reply: oneshot::Sender<battle_core::Result<()>>,
    },
    /// Read-only view of the battle.
    Snapshot {
        reply: oneshot::Sender<BattleSnapshot>,
    },
    /// Decision context for the active player squad, if it is waiting on one.
    TurnRequest {
        reply: oneshot::Sender<Option<TurnRequest>>,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Start { .. } => "start",
            Command::RequestRounds { .. } => "request_rounds",
            Command::RequestDefend { .. } => "request_defend",
            Command::RequestSkip { .. } => "request_skip",
            Command::UseAbility { .. } => "use_ability",
            Command::SelectTarget { .. } => "select_target",
            Command::AcknowledgeDamage { .. } => "acknowledge_damage",
            Command::CancelAction { .. } => "cancel_action",
            Command::Flee { .. } => "flee",
            Command::MoveUnit { .. } => "move_unit",
            Command::Snapshot { .. } => "snapshot",
            Command::TurnRequest { .. } => "turn_request",
        }
    }
}

/// Timer completions fed back into the worker loop.
#[derive(Debug, Clone, Copy)]
enum Wake {
    Timer { serial: u64 },
    DamagePresented { ticket: DamageTicket },
}

/// Background task that processes battle commands.
///
/// The worker is the only owner of the [`Battle`]; every engine call runs on
/// this task, so the engine itself stays synchronous.
pub struct BattleWorker {
    battle: Battle,
    command_rx: mpsc::Receiver<Command>,
    wake_tx: mpsc::UnboundedSender<Wake>,
    wake_rx: mpsc::UnboundedReceiver<Wake>,
    event_bus: EventBus,
    damage_presentation: Option<Duration>,
    /// Suspension the currently armed timer belongs to.
    scheduled: Option<PendingInput>,
}

impl BattleWorker {
    pub fn new(
        battle: Battle,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
        damage_presentation: Option<Duration>,
    ) -> Self {
        let (wake_tx, wake_rx) = mpsc::unbounded_channel();
        debug!(
            target: "runtime::worker",
            phase = %battle.phase(),
            squads = battle.battle_units().count(),
            "battle worker initialized"
        );

        Self {
            battle,
            command_rx,
            wake_tx,
            wake_rx,
            event_bus,
            damage_presentation,
            scheduled: None,
        }
    }

    /// Main worker loop. Ends once every command sender is dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(wake) = self.wake_rx.recv() => {
                    self.handle_wake(wake);
                    self.sync();
                }
            }
        }
        debug!(target: "runtime::worker", "battle worker stopped");
    }

    fn handle_command(&mut self, command: Command) {
        let name = command.name();
        trace!(target: "runtime::worker", command = name, "command received");

        match command {
            Command::Start { reply } => {
                let started = self.battle.start();
                self.respond(name, reply, started);
            }
            Command::RequestRounds { reply } => {
                let fired = self.battle.request_rounds();
                self.respond(name, reply, fired);
            }
            Command::RequestDefend { reply } => {
                let accepted = self.battle.request_defend();
                self.respond(name, reply, accepted);
            }
            Command::RequestSkip { reply } => {
                let accepted = self.battle.request_skip();
                self.respond(name, reply, accepted);
            }
            Command::UseAbility { ability, reply } => {
                let outcome = self.battle.use_ability(ability);
                self.respond(name, reply, outcome);
            }
            Command::SelectTarget { target, reply } => {
                let accepted = self.battle.select_target(target);
                self.respond(name, reply, accepted);
            }
            Command::AcknowledgeDamage { ticket, reply } => {
                let accepted = self.battle.acknowledge_damage(ticket);
                self.respond(name, reply, accepted);
            }
            Command::CancelAction { reply } => {
                let cancelled = self.battle.cancel_action();
                self.respond(name, reply, cancelled);
            }
            Command::Flee { reply } => {
                let fled = self.battle.flee();
                self.respond(name, reply, fled);
            }
            Command::MoveUnit { squad, slot, reply } => {
                let outcome = self.battle.move_unit(squad, slot);
                self.respond(name, reply, outcome);
            }
            Command::Snapshot { reply } => {
                let snapshot = self.battle.snapshot();
                self.respond(name, reply, snapshot);
            }
            Command::TurnRequest { reply } => {
                let request = self.turn_request();
                self.respond(name, reply, request);
            }
        }
    }

    /// Publishes the command's events before the caller sees the reply.
    fn respond<T>(&mut self, name: &'static str, reply: oneshot::Sender<T>, value: T) {
        self.sync();
        if reply.send(value).is_err() {
            debug!(target: "runtime::worker", command = name, "reply channel closed (caller dropped)");
        }
    }

    fn handle_wake(&mut self, wake: Wake) {
        match wake {
            Wake::Timer { serial } => {
                if !self.battle.timer_elapsed(serial) {
                    trace!(target: "runtime::worker", serial, "stale timer ignored");
                }
            }
            Wake::DamagePresented { ticket } => {
                if self.battle.acknowledge_damage(ticket) {
                    self.event_bus.publish(Event::DamagePresented { ticket });
                } else {
                    trace!(target: "runtime::worker", ?ticket, "damage already acknowledged");
                }
            }
        }
    }

    fn turn_request(&mut self) -> Option<TurnRequest> {
        let pending = self.battle.pending()?;
        if pending.suspension != Suspension::AwaitingTarget {
            return None;
        }

        Some(TurnRequest {
            serial: pending.serial,
            actor: pending.actor,
            action: pending.action,
            candidates: self.battle.target_candidates(),
            suggestion: self.battle.suggest_target(),
            abilities: self.battle.available_abilities(),
            snapshot: self.battle.snapshot(),
        })
    }

    /// Publishes drained engine events and arms a timer for a new suspension.
    fn sync(&mut self) {
        for event in self.battle.drain_events() {
            self.event_bus.publish(Event::Battle(event));
        }

        let pending = self.battle.pending();
        if pending == self.scheduled {
            return;
        }
        self.scheduled = pending;

        let Some(pending) = pending else {
            return;
        };
        match pending.suspension {
            Suspension::AwaitingTimer(delay) => {
                self.schedule(
                    delay,
                    Wake::Timer {
                        serial: pending.serial,
                    },
                );
                self.event_bus.publish(Event::TimerScheduled {
                    serial: pending.serial,
                    delay,
                });
            }
            Suspension::AwaitingDamageAck(ticket) => {
                if let Some(delay) = self.damage_presentation {
                    self.schedule(delay, Wake::DamagePresented { ticket });
                }
            }
            Suspension::AwaitingTarget => {}
        }
    }

    fn schedule(&self, delay: Duration, wake: Wake) {
        trace!(target: "runtime::worker", ?wake, ?delay, "timer armed");
        let wake_tx = self.wake_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if wake_tx.send(wake).is_err() {
                trace!(target: "runtime::worker", "worker stopped before timer fired");
            }
        });
    }
}
