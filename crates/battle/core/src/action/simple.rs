//! Actions without a targeting step.

use std::time::Duration;

use crate::engine::BattleContext;
use crate::state::SquadId;

use super::{ActionInput, ActionKind, ActionLatch, ActionPoll, ActionState, BattleAction, Suspension};

macro_rules! immediate_action {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        pub struct $name {
            latch: ActionLatch,
            actor: SquadId,
        }

        impl $name {
            pub fn new(actor: SquadId) -> Self {
                Self {
                    latch: ActionLatch::new($kind),
                    actor,
                }
            }
        }

        impl BattleAction for $name {
            fn kind(&self) -> ActionKind {
                self.latch.kind()
            }

            fn actor(&self) -> SquadId {
                self.actor
            }

            fn state(&self) -> ActionState {
                self.latch.state()
            }

            fn resolve(&mut self, _ctx: &mut BattleContext) -> ActionPoll {
                if self.latch.state() != ActionState::Created {
                    return ActionPoll::Idle;
                }
                self.latch.resolve()
            }

            fn handle_input(&mut self, _ctx: &mut BattleContext, _input: ActionInput) -> ActionPoll {
                ActionPoll::Idle
            }

            fn dispose(&mut self, _ctx: &mut BattleContext) -> ActionPoll {
                self.latch.cancel()
            }
        }
    };
}

immediate_action!(
    /// Defers the actor to the tail of the current round.
    DefendAction,
    ActionKind::Defend
);

immediate_action!(
    /// Ends the actor's turn without acting.
    SkipTurnAction,
    ActionKind::Skip
);

/// Passes the turn of a computer-controlled squad after a real-time delay.
pub struct AutoSkipAction {
    latch: ActionLatch,
    actor: SquadId,
    delay: Duration,
}

impl AutoSkipAction {
    pub fn new(actor: SquadId, delay: Duration) -> Self {
        Self {
            latch: ActionLatch::new(ActionKind::AutoSkip),
            actor,
            delay,
        }
    }
}

impl BattleAction for AutoSkipAction {
    fn kind(&self) -> ActionKind {
        self.latch.kind()
    }

    fn actor(&self) -> SquadId {
        self.actor
    }

    fn state(&self) -> ActionState {
        self.latch.state()
    }

    fn resolve(&mut self, _ctx: &mut BattleContext) -> ActionPoll {
        if !self.latch.begin(ActionState::Waiting) {
            return ActionPoll::Idle;
        }
        ActionPoll::Pending(Suspension::AwaitingTimer(self.delay))
    }

    fn handle_input(&mut self, _ctx: &mut BattleContext, input: ActionInput) -> ActionPoll {
        match (self.latch.state(), input) {
            (ActionState::Waiting, ActionInput::TimerElapsed) => self.latch.resolve(),
            _ => ActionPoll::Idle,
        }
    }

    fn dispose(&mut self, _ctx: &mut BattleContext) -> ActionPoll {
        self.latch.cancel()
    }
}
