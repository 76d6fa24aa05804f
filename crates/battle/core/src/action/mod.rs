//! Actions: one-shot, cancellable units of intent hosted by the round machine.
//!
//! An action never blocks. Calls return an [`ActionPoll`]: either nothing
//! happened, the action is suspended on an external input, or it reached its
//! terminal signal. The [`ActionLatch`] every variant embeds guarantees that
//! exactly one terminal signal is produced per action, whatever sequence of
//! `resolve`, `handle_input` and `dispose` calls follows.

mod ability;
mod attack;
mod simple;

use std::fmt;
use std::time::Duration;

use crate::ability::AbilityId;
use crate::combat::DamageTicket;
use crate::engine::BattleContext;
use crate::state::SquadId;

pub use ability::AbilityAction;
pub use attack::AttackAction;
pub use simple::{AutoSkipAction, DefendAction, SkipTurnAction};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionKind {
    Attack,
    Ability(AbilityId),
    Defend,
    Skip,
    AutoSkip,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Attack => f.write_str("attack"),
            ActionKind::Ability(ability) => write!(f, "ability({ability})"),
            ActionKind::Defend => f.write_str("defend"),
            ActionKind::Skip => f.write_str("skip"),
            ActionKind::AutoSkip => f.write_str("auto_skip"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ActionState {
    #[default]
    Created,
    TargetRequested,
    AwaitingDamage,
    Waiting,
    Resolved,
    Cancelled,
}

impl ActionState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, ActionState::Resolved | ActionState::Cancelled)
    }
}

/// External input an action is suspended on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Suspension {
    /// A human picker waits for the player's selection. No timeout.
    AwaitingTarget,
    /// Damage was applied; the receiver's presentation step must finish.
    AwaitingDamageAck(DamageTicket),
    /// Real-time delay before the action resolves by itself.
    AwaitingTimer(Duration),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionInput {
    TargetSelected(Option<SquadId>),
    DamageAcknowledged(DamageTicket),
    TimerElapsed,
}

/// Terminal signal of an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionSignal {
    Resolved(ActionKind),
    Cancelled(ActionKind),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionPoll {
    /// The call was ignored.
    Idle,
    Pending(Suspension),
    Done(ActionSignal),
}

pub trait BattleAction: Send {
    fn kind(&self) -> ActionKind;

    fn actor(&self) -> SquadId;

    fn state(&self) -> ActionState;

    /// Starts the action. Ignored once the action has left `Created`.
    fn resolve(&mut self, ctx: &mut BattleContext) -> ActionPoll;

    /// Feeds an external input. Inputs the action is not waiting for are
    /// ignored.
    fn handle_input(&mut self, ctx: &mut BattleContext, input: ActionInput) -> ActionPoll;

    /// Tears the action down. Produces `Cancelled` if no terminal signal was
    /// produced yet, `Idle` otherwise. An action whose outcome was already
    /// applied produces `Resolved` instead.
    fn dispose(&mut self, ctx: &mut BattleContext) -> ActionPoll;
}

/// Exactly-once terminal latch shared by all action variants.
#[derive(Clone, Copy, Debug)]
pub struct ActionLatch {
    kind: ActionKind,
    state: ActionState,
}

impl ActionLatch {
    pub const fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            state: ActionState::Created,
        }
    }

    pub const fn kind(&self) -> ActionKind {
        self.kind
    }

    pub const fn state(&self) -> ActionState {
        self.state
    }

    /// Moves to `Created -> next`; false if the action was already started.
    pub fn begin(&mut self, next: ActionState) -> bool {
        if self.state != ActionState::Created {
            return false;
        }
        self.state = next;
        true
    }

    pub fn suspend(&mut self, state: ActionState, suspension: Suspension) -> ActionPoll {
        if self.state.is_terminal() {
            return ActionPoll::Idle;
        }
        self.state = state;
        ActionPoll::Pending(suspension)
    }

    pub fn resolve(&mut self) -> ActionPoll {
        self.finish(ActionState::Resolved, ActionSignal::Resolved(self.kind))
    }

    pub fn cancel(&mut self) -> ActionPoll {
        self.finish(ActionState::Cancelled, ActionSignal::Cancelled(self.kind))
    }

    fn finish(&mut self, state: ActionState, signal: ActionSignal) -> ActionPoll {
        if self.state.is_terminal() {
            return ActionPoll::Idle;
        }
        self.state = state;
        ActionPoll::Done(signal)
    }
}
