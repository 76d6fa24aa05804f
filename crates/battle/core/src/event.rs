//! Notifications recorded for the presentation collaborator.
//!
//! The engine never calls into rendering directly for these; it appends to an
//! [`EventLog`] that the embedding runtime drains after every command.

use crate::ability::AbilityId;
use crate::action::ActionKind;
use crate::combat::{DamageOrigin, DamageQuantum, DamageTicket};
use crate::effects::{EffectId, EffectInstanceId, RemovalReason};
use crate::engine::BattlePhase;
use crate::result::BattleStatus;
use crate::state::{DamageReport, SquadId};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleEvent {
    PhaseChanged {
        from: BattlePhase,
        to: BattlePhase,
    },
    RoundStarted {
        round: u32,
        queue: Vec<SquadId>,
    },
    QueueChanged {
        queue: Vec<SquadId>,
    },
    TurnStarted {
        round: u32,
        squad: SquadId,
    },
    TurnSkipped {
        squad: SquadId,
    },
    TurnEnded {
        squad: SquadId,
    },
    ActionAttached {
        squad: SquadId,
        action: ActionKind,
        serial: u64,
    },
    TargetRequested {
        squad: SquadId,
        serial: u64,
    },
    ActionResolved {
        squad: SquadId,
        action: ActionKind,
    },
    ActionCancelled {
        squad: SquadId,
        action: ActionKind,
    },
    SquadDefended {
        squad: SquadId,
    },
    DamageApplied {
        ticket: DamageTicket,
        origin: DamageOrigin,
        target: SquadId,
        quantum: DamageQuantum,
        report: DamageReport,
    },
    EffectAttached {
        target: SquadId,
        effect: EffectId,
        instance: EffectInstanceId,
    },
    EffectTicked {
        target: SquadId,
        effect: EffectId,
        instance: EffectInstanceId,
        tick: i32,
    },
    EffectRemoved {
        target: SquadId,
        effect: EffectId,
        instance: EffectInstanceId,
        reason: RemovalReason,
    },
    CooldownStarted {
        squad: SquadId,
        ability: AbilityId,
        remaining: i32,
    },
    RoundEnded {
        round: u32,
    },
    BattleFinished {
        status: BattleStatus,
    },
}

impl BattleEvent {
    /// Coarse grouping used by runtimes to route events to topics.
    pub fn category(&self) -> EventCategory {
        match self {
            BattleEvent::PhaseChanged { .. } | BattleEvent::BattleFinished { .. } => {
                EventCategory::Phase
            }
            BattleEvent::DamageApplied { .. }
            | BattleEvent::EffectAttached { .. }
            | BattleEvent::EffectTicked { .. }
            | BattleEvent::EffectRemoved { .. }
            | BattleEvent::CooldownStarted { .. } => EventCategory::Combat,
            _ => EventCategory::Turn,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventCategory {
    Phase,
    Turn,
    Combat,
}

/// Append-only buffer of [`BattleEvent`]s.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<BattleEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn as_slice(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
