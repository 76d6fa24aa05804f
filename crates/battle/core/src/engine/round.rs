//! Round/turn state machine.
//!
//! ```text
//! RoundInit -> TurnSelect -> TurnStart -> TurnActionHost -> TurnEnd -> TurnSelect ...
//!                   |            |             |             |
//!                   |            +-------------+-> TurnSkip -+
//!                   +------------- QueueEmpty ---------------+-> RoundEnd -> RoundInit
//! ```
//!
//! Triggers are queued and processed in order, so an entry hook that fires a
//! trigger never re-enters the machine. A trigger the current state does not
//! permit is dropped.

use std::collections::{BTreeSet, VecDeque};

use tracing::{debug, trace};

use crate::ability::AbilityId;
use crate::action::{
    AbilityAction, ActionInput, ActionKind, ActionPoll, ActionSignal, ActionState, AttackAction,
    AutoSkipAction, BattleAction, DefendAction, SkipTurnAction, Suspension,
};
use crate::combat::DamageTicket;
use crate::config::AiTurnPolicy;
use crate::effects::EffectEvent;
use crate::error::{BattleError, Result};
use crate::event::BattleEvent;
use crate::result::BattleStatus;
use crate::state::SquadId;
use crate::targeting::{AiPicker, HumanPicker};

use super::context::BattleContext;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum RoundState {
    #[default]
    RoundInit,
    TurnSelect,
    TurnStart,
    TurnActionHost,
    TurnSkip,
    TurnEnd,
    RoundEnd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RoundTrigger {
    BeginRound,
    NextTurn,
    QueueEmpty,
    Skip,
    ActionDone,
    EndRound,
}

impl RoundState {
    /// Target state of `trigger`, or `None` if the trigger is not permitted.
    pub const fn transition(self, trigger: RoundTrigger) -> Option<RoundState> {
        use RoundState as S;
        use RoundTrigger as T;

        Some(match (self, trigger) {
            (S::RoundInit, T::BeginRound) => S::TurnSelect,
            (S::TurnSelect, T::NextTurn) => S::TurnStart,
            (S::TurnSelect, T::QueueEmpty) => S::RoundEnd,
            (S::TurnStart, T::NextTurn) => S::TurnActionHost,
            (S::TurnStart, T::Skip) => S::TurnSkip,
            (S::TurnStart, T::QueueEmpty) => S::RoundEnd,
            (S::TurnActionHost, T::Skip) => S::TurnSkip,
            (S::TurnActionHost, T::ActionDone) => S::TurnEnd,
            (S::TurnSkip, T::NextTurn) => S::TurnEnd,
            (S::TurnEnd, T::NextTurn) => S::TurnSelect,
            (S::TurnEnd, T::QueueEmpty) => S::RoundEnd,
            (S::RoundEnd, T::EndRound) => S::RoundInit,
            _ => return None,
        })
    }

    pub const fn permits(self, trigger: RoundTrigger) -> bool {
        self.transition(trigger).is_some()
    }
}

/// An outstanding external input the hosted action is suspended on.
///
/// `serial` identifies the attached action; inputs carrying an older serial
/// are stale and ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendingInput {
    pub serial: u64,
    pub actor: SquadId,
    pub action: ActionKind,
    pub suspension: Suspension,
}

#[derive(Default)]
pub struct RoundMachine {
    state: RoundState,
    triggers: VecDeque<RoundTrigger>,
    firing: bool,
    halted: bool,
    round: u32,
    active: Option<SquadId>,
    action: Option<Box<dyn BattleAction>>,
    pending: Option<Suspension>,
    serial: u64,
    /// Squads that already deferred to the tail this round.
    defended: BTreeSet<SquadId>,
    finished: Option<BattleStatus>,
}

impl RoundMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    /// Current round number, starting at 1.
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn active_unit(&self) -> Option<SquadId> {
        self.active
    }

    pub fn current_action(&self) -> Option<ActionKind> {
        self.action.as_ref().map(|action| action.kind())
    }

    pub fn pending(&self) -> Option<PendingInput> {
        let action = self.action.as_ref()?;
        Some(PendingInput {
            serial: self.serial,
            actor: action.actor(),
            action: action.kind(),
            suspension: self.pending?,
        })
    }

    /// Takes the "rounds finished" notification, if the battle was decided.
    pub fn take_finished(&mut self) -> Option<BattleStatus> {
        self.finished.take()
    }

    /// Resets the machine and starts round one.
    pub fn begin(&mut self, ctx: &mut BattleContext) {
        self.state = RoundState::RoundInit;
        self.triggers.clear();
        self.halted = false;
        self.round = 0;
        self.active = None;
        self.action = None;
        self.pending = None;
        self.finished = None;

        self.firing = true;
        self.enter(ctx, RoundState::RoundInit);
        self.firing = false;
        self.pump(ctx);
    }

    /// Stops the machine: disposes the hosted action and drops queued
    /// triggers. Nothing fires until the next [`begin`](Self::begin).
    pub fn halt(&mut self, ctx: &mut BattleContext) {
        self.halted = true;
        self.triggers.clear();
        self.detach(ctx);
        self.active = None;
    }

    pub fn fire(&mut self, ctx: &mut BattleContext, trigger: RoundTrigger) {
        self.triggers.push_back(trigger);
        self.pump(ctx);
    }

    // ========================================================================
    // Requests from the presentation collaborator
    // ========================================================================

    /// Ends the active player's turn. Ignored unless `Skip` is permitted and
    /// the active unit is player-controllable.
    pub fn request_skip(&mut self, ctx: &mut BattleContext) -> bool {
        let Some(actor) = self.player_turn(ctx) else {
            trace!(target: "battle::round", state = %self.state, "skip request ignored");
            return false;
        };
        self.attach(ctx, Box::new(SkipTurnAction::new(actor)));
        true
    }

    /// Defers the active player's squad to the tail of the round. A squad
    /// that already deferred this round just ends its turn.
    pub fn request_defend(&mut self, ctx: &mut BattleContext) -> bool {
        let Some(actor) = self.player_turn(ctx) else {
            trace!(target: "battle::round", state = %self.state, "defend request ignored");
            return false;
        };
        self.attach(ctx, Box::new(DefendAction::new(actor)));
        true
    }

    /// Replaces the default attack of the active player with `ability`.
    pub fn use_ability(&mut self, ctx: &mut BattleContext, ability: AbilityId) -> Result<()> {
        let actor = self.player_turn(ctx).ok_or(BattleError::NotPlayerTurn)?;
        let definition = ctx
            .abilities
            .ability(ability)
            .cloned()
            .ok_or(BattleError::UnknownAbility(ability))?;

        if !ctx
            .roster
            .get(actor)
            .is_some_and(|squad| squad.knows_ability(ability))
        {
            return Err(BattleError::AbilityNotLearned {
                squad: actor,
                ability,
            });
        }
        let remaining = ctx.cooldowns.remaining_cooldown(actor, ability);
        if remaining > 0 {
            return Err(BattleError::AbilityNotReady { ability, remaining });
        }

        self.attach(
            ctx,
            Box::new(AbilityAction::new(
                actor,
                definition,
                Box::new(HumanPicker::new()),
            )),
        );
        Ok(())
    }

    // ========================================================================
    // External inputs for suspended actions
    // ========================================================================

    pub fn select_target(&mut self, ctx: &mut BattleContext, selection: Option<SquadId>) -> bool {
        if self.pending != Some(Suspension::AwaitingTarget) {
            trace!(target: "battle::round", "no target selection outstanding");
            return false;
        }
        self.input(ctx, ActionInput::TargetSelected(selection))
    }

    pub fn acknowledge_damage(&mut self, ctx: &mut BattleContext, ticket: DamageTicket) -> bool {
        if self.pending != Some(Suspension::AwaitingDamageAck(ticket)) {
            trace!(target: "battle::round", ticket = ticket.0, "unexpected damage acknowledgement");
            return false;
        }
        self.input(ctx, ActionInput::DamageAcknowledged(ticket))
    }

    /// Delivers an elapsed timer for the action attached with `serial`.
    pub fn timer_elapsed(&mut self, ctx: &mut BattleContext, serial: u64) -> bool {
        if serial != self.serial || !matches!(self.pending, Some(Suspension::AwaitingTimer(_))) {
            trace!(target: "battle::round", serial, current = self.serial, "stale timer ignored");
            return false;
        }
        self.input(ctx, ActionInput::TimerElapsed)
    }

    /// Disposes the hosted action and routes its terminal signal. An attack
    /// whose damage already landed resolves and ends the turn.
    pub fn cancel_action(&mut self, ctx: &mut BattleContext) -> bool {
        let Some(mut action) = self.action.take() else {
            return false;
        };
        self.pending = None;
        match action.dispose(ctx) {
            ActionPoll::Done(signal) => {
                self.on_signal(ctx, action.actor(), signal);
                true
            }
            _ => false,
        }
    }

    // ========================================================================
    // Machine internals
    // ========================================================================

    fn pump(&mut self, ctx: &mut BattleContext) {
        if self.firing {
            return;
        }
        self.firing = true;
        while let Some(trigger) = self.triggers.pop_front() {
            if self.halted {
                self.triggers.clear();
                break;
            }
            self.step(ctx, trigger);
        }
        self.firing = false;
    }

    fn step(&mut self, ctx: &mut BattleContext, trigger: RoundTrigger) {
        let Some(next) = self.state.transition(trigger) else {
            trace!(target: "battle::round", state = %self.state, %trigger, "trigger not permitted");
            return;
        };

        self.exit(ctx, self.state);
        trace!(target: "battle::round", from = %self.state, to = %next, %trigger, "transition");
        self.state = next;
        self.enter(ctx, next);
    }

    fn exit(&mut self, ctx: &mut BattleContext, state: RoundState) {
        if state == RoundState::TurnActionHost {
            self.detach(ctx);
        }
    }

    fn enter(&mut self, ctx: &mut BattleContext, state: RoundState) {
        match state {
            RoundState::RoundInit => {
                self.round += 1;
                self.defended.clear();
                ctx.queue.rebuild(&ctx.roster);
                debug!(target: "battle::round", round = self.round, queue = ?ctx.queue.to_vec(), "round started");
                ctx.emit(BattleEvent::RoundStarted {
                    round: self.round,
                    queue: ctx.queue.to_vec(),
                });
                ctx.render_queue();
                self.fire(ctx, RoundTrigger::BeginRound);
            }
            RoundState::TurnSelect => {
                ctx.queue.retain_living(&ctx.roster);
                if ctx.queue.peek().is_none() {
                    self.fire(ctx, RoundTrigger::QueueEmpty);
                } else {
                    self.fire(ctx, RoundTrigger::NextTurn);
                }
            }
            RoundState::TurnStart => {
                let Some(actor) = ctx.queue.pop() else {
                    self.fire(ctx, RoundTrigger::QueueEmpty);
                    return;
                };
                self.active = Some(actor);
                if ctx.roster.living(actor).is_none() {
                    trace!(target: "battle::round", squad = %actor, "popped squad is empty");
                    self.fire(ctx, RoundTrigger::Skip);
                    return;
                }
                debug!(target: "battle::round", round = self.round, squad = %actor, "turn started");
                ctx.emit(BattleEvent::TurnStarted {
                    round: self.round,
                    squad: actor,
                });
                ctx.notify_effects(actor, EffectEvent::TurnStarted);
                ctx.render_queue();
                self.fire(ctx, RoundTrigger::NextTurn);
            }
            RoundState::TurnActionHost => self.attach_default(ctx),
            RoundState::TurnSkip => {
                if let Some(actor) = self.active {
                    debug!(target: "battle::round", squad = %actor, "turn skipped");
                    ctx.emit(BattleEvent::TurnSkipped { squad: actor });
                }
                self.fire(ctx, RoundTrigger::NextTurn);
            }
            RoundState::TurnEnd => {
                if let Some(actor) = self.active.take() {
                    ctx.emit(BattleEvent::TurnEnded { squad: actor });
                }
                ctx.queue.retain_living(&ctx.roster);
                if ctx.outcome().is_some() {
                    ctx.queue.clear();
                }
                ctx.emit(BattleEvent::QueueChanged {
                    queue: ctx.queue.to_vec(),
                });
                ctx.render_queue();

                if ctx.queue.is_empty() {
                    self.fire(ctx, RoundTrigger::QueueEmpty);
                } else {
                    self.fire(ctx, RoundTrigger::NextTurn);
                }
            }
            RoundState::RoundEnd => self.end_round(ctx),
        }
    }

    /// Effects tick first, then cooldowns, then the outcome is checked.
    fn end_round(&mut self, ctx: &mut BattleContext) {
        {
            let (effects, mut env) = ctx.effect_env();
            effects.tick(&mut env);
        }
        ctx.cooldowns.tick(&ctx.roster);
        debug!(target: "battle::round", round = self.round, "round ended");
        ctx.emit(BattleEvent::RoundEnded { round: self.round });

        if let Some(status) = ctx.outcome() {
            self.finished = Some(status);
        } else if ctx.config.max_rounds > 0 && self.round >= ctx.config.max_rounds {
            debug!(target: "battle::round", round = self.round, "round limit reached");
            self.finished = Some(BattleStatus::Flee);
        } else {
            self.fire(ctx, RoundTrigger::EndRound);
        }
    }

    /// Active player squad whose hosted action has not applied anything yet.
    fn player_turn(&self, ctx: &BattleContext) -> Option<SquadId> {
        if self.halted || !self.state.permits(RoundTrigger::Skip) {
            return None;
        }
        if self
            .action
            .as_ref()
            .is_some_and(|action| action.state() == ActionState::AwaitingDamage)
        {
            return None;
        }
        self.active
            .filter(|id| ctx.roster.get(*id).is_some_and(|squad| squad.is_player_controllable()))
    }

    fn attach_default(&mut self, ctx: &mut BattleContext) {
        let Some(actor) = self.active else {
            self.fire(ctx, RoundTrigger::Skip);
            return;
        };
        let player = ctx
            .roster
            .get(actor)
            .is_some_and(|squad| squad.is_player_controllable());

        let action: Box<dyn BattleAction> = if player {
            let abilities = ctx.ability_statuses(actor);
            ctx.present("render_abilities", |presenter| {
                presenter.render_abilities(actor, &abilities)
            });
            Box::new(AttackAction::new(actor, Box::new(HumanPicker::new())))
        } else {
            match ctx.config.ai_turn_policy {
                AiTurnPolicy::AutoSkip => {
                    Box::new(AutoSkipAction::new(actor, ctx.config.auto_skip_delay))
                }
                AiTurnPolicy::Attack => {
                    Box::new(AttackAction::new(actor, Box::new(AiPicker::new())))
                }
            }
        };
        self.attach(ctx, action);
    }

    /// Attaches `action` as the only hosted action and starts it. Any
    /// previous action is detached first.
    fn attach(&mut self, ctx: &mut BattleContext, mut action: Box<dyn BattleAction>) {
        self.detach(ctx);
        self.serial += 1;

        let actor = action.actor();
        debug!(target: "battle::action", squad = %actor, action = %action.kind(), serial = self.serial, "action attached");
        ctx.emit(BattleEvent::ActionAttached {
            squad: actor,
            action: action.kind(),
            serial: self.serial,
        });

        let poll = action.resolve(ctx);
        self.action = Some(action);
        self.handle_poll(ctx, actor, poll);
    }

    /// Unsubscribes and disposes the hosted action. Its terminal signal is
    /// reported but not routed.
    fn detach(&mut self, ctx: &mut BattleContext) {
        self.pending = None;
        let Some(mut action) = self.action.take() else {
            return;
        };
        let squad = action.actor();
        match action.dispose(ctx) {
            ActionPoll::Done(ActionSignal::Cancelled(kind)) => {
                ctx.emit(BattleEvent::ActionCancelled { squad, action: kind });
            }
            ActionPoll::Done(ActionSignal::Resolved(kind)) => {
                ctx.emit(BattleEvent::ActionResolved { squad, action: kind });
            }
            _ => {}
        }
    }

    fn input(&mut self, ctx: &mut BattleContext, input: ActionInput) -> bool {
        let Some(action) = self.action.as_mut() else {
            return false;
        };
        let actor = action.actor();
        let poll = action.handle_input(ctx, input);
        if poll == ActionPoll::Idle {
            return false;
        }
        self.handle_poll(ctx, actor, poll);
        true
    }

    fn handle_poll(&mut self, ctx: &mut BattleContext, actor: SquadId, poll: ActionPoll) {
        match poll {
            ActionPoll::Idle => {}
            ActionPoll::Pending(suspension) => {
                self.pending = Some(suspension);
                if suspension == Suspension::AwaitingTarget {
                    ctx.emit(BattleEvent::TargetRequested {
                        squad: actor,
                        serial: self.serial,
                    });
                }
            }
            ActionPoll::Done(signal) => {
                self.action = None;
                self.pending = None;
                self.on_signal(ctx, actor, signal);
            }
        }
    }

    fn on_signal(&mut self, ctx: &mut BattleContext, actor: SquadId, signal: ActionSignal) {
        match signal {
            ActionSignal::Resolved(kind) => {
                debug!(target: "battle::action", squad = %actor, action = %kind, "action resolved");
                ctx.emit(BattleEvent::ActionResolved {
                    squad: actor,
                    action: kind,
                });
                match kind {
                    ActionKind::Defend => {
                        if self.defended.insert(actor) {
                            ctx.queue.push_back(actor);
                            ctx.emit(BattleEvent::SquadDefended { squad: actor });
                            ctx.emit(BattleEvent::QueueChanged {
                                queue: ctx.queue.to_vec(),
                            });
                            ctx.render_queue();
                        }
                        self.fire(ctx, RoundTrigger::Skip);
                    }
                    ActionKind::Skip | ActionKind::AutoSkip => self.fire(ctx, RoundTrigger::Skip),
                    ActionKind::Attack | ActionKind::Ability(_) => {
                        self.fire(ctx, RoundTrigger::ActionDone)
                    }
                }
            }
            ActionSignal::Cancelled(kind) => {
                debug!(target: "battle::action", squad = %actor, action = %kind, "action cancelled");
                ctx.emit(BattleEvent::ActionCancelled {
                    squad: actor,
                    action: kind,
                });
                let controllable = ctx
                    .roster
                    .get(actor)
                    .is_some_and(|squad| squad.is_player_controllable());
                if controllable && self.state == RoundState::TurnActionHost {
                    self.attach_default(ctx);
                } else {
                    debug!(target: "battle::round", squad = %actor, "cancelled turn falls back to skip");
                    self.fire(ctx, RoundTrigger::Skip);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_matches_turn_cycle() {
        use RoundState as S;
        use RoundTrigger as T;

        assert_eq!(S::RoundInit.transition(T::BeginRound), Some(S::TurnSelect));
        assert_eq!(S::TurnSelect.transition(T::QueueEmpty), Some(S::RoundEnd));
        assert_eq!(S::TurnStart.transition(T::NextTurn), Some(S::TurnActionHost));
        assert_eq!(S::TurnStart.transition(T::Skip), Some(S::TurnSkip));
        assert_eq!(S::TurnActionHost.transition(T::Skip), Some(S::TurnSkip));
        assert_eq!(S::TurnActionHost.transition(T::ActionDone), Some(S::TurnEnd));
        assert_eq!(S::TurnSkip.transition(T::NextTurn), Some(S::TurnEnd));
        assert_eq!(S::TurnEnd.transition(T::NextTurn), Some(S::TurnSelect));
        assert_eq!(S::RoundEnd.transition(T::EndRound), Some(S::RoundInit));
    }

    #[test]
    fn skip_is_only_permitted_while_a_turn_is_live() {
        for state in [
            RoundState::RoundInit,
            RoundState::TurnSelect,
            RoundState::TurnSkip,
            RoundState::TurnEnd,
            RoundState::RoundEnd,
        ] {
            assert!(!state.permits(RoundTrigger::Skip), "{state}");
        }
        assert!(RoundState::TurnStart.permits(RoundTrigger::Skip));
        assert!(RoundState::TurnActionHost.permits(RoundTrigger::Skip));
    }
}
