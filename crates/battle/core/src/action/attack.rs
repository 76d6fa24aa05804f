use tracing::{debug, trace};

use crate::combat::{AttackDamage, DamageOutcome, DamageTicket};
use crate::effects::EffectEvent;
use crate::engine::BattleContext;
use crate::state::SquadId;
use crate::targeting::{PickerPoll, TargetPicker, TargetResolver, TargetRule};

use super::{ActionInput, ActionKind, ActionLatch, ActionPoll, ActionState, BattleAction, Suspension};

/// Basic attack: pick a target, validate melee reach, deal formula damage and
/// wait for the damage presentation.
pub struct AttackAction {
    latch: ActionLatch,
    actor: SquadId,
    picker: Box<dyn TargetPicker>,
    ticket: Option<DamageTicket>,
}

impl AttackAction {
    pub fn new(actor: SquadId, picker: Box<dyn TargetPicker>) -> Self {
        Self {
            latch: ActionLatch::new(ActionKind::Attack),
            actor,
            picker,
            ticket: None,
        }
    }

    fn on_select(&mut self, ctx: &mut BattleContext, selection: Option<SquadId>) -> ActionPoll {
        let Some(target) = selection else {
            debug!(target: "battle::action", actor = %self.actor, "attack has no target");
            return self.latch.resolve();
        };
        if !TargetRule::Attack.resolve_target(&ctx.target_view(), self.actor, target) {
            debug!(target: "battle::action", actor = %self.actor, %target, "attack target rejected");
            return self.latch.resolve();
        }
        let (Some(attacker), Some(defender)) =
            (ctx.roster.living(self.actor), ctx.roster.living(target))
        else {
            trace!(target: "battle::action", actor = %self.actor, "attacker is gone");
            return self.latch.resolve();
        };

        let source = AttackDamage {
            attacker: self.actor,
            quantum: ctx.formula.attack_quantum(attacker, defender),
        };
        let outcome = ctx
            .damage
            .resolve(&mut ctx.roster, &mut ctx.events, &source, target);

        match outcome {
            DamageOutcome::NoOp => self.latch.resolve(),
            DamageOutcome::Applied { ticket, .. } => {
                ctx.notify_effects(target, EffectEvent::DamageTaken);
                if ctx.config.await_damage_ack {
                    self.ticket = Some(ticket);
                    self.latch.suspend(
                        ActionState::AwaitingDamage,
                        Suspension::AwaitingDamageAck(ticket),
                    )
                } else {
                    ctx.damage.acknowledge(ticket);
                    self.latch.resolve()
                }
            }
        }
    }
}

impl BattleAction for AttackAction {
    fn kind(&self) -> ActionKind {
        self.latch.kind()
    }

    fn actor(&self) -> SquadId {
        self.actor
    }

    fn state(&self) -> ActionState {
        self.latch.state()
    }

    fn resolve(&mut self, ctx: &mut BattleContext) -> ActionPoll {
        if !self.latch.begin(ActionState::TargetRequested) {
            return ActionPoll::Idle;
        }

        let poll = {
            let view = ctx.target_view();
            self.picker
                .request_target(&view, self.actor, &TargetRule::Attack)
        };
        match poll {
            PickerPoll::Selected(selection) => self.on_select(ctx, selection),
            PickerPoll::Pending => ActionPoll::Pending(Suspension::AwaitingTarget),
            PickerPoll::Idle => ActionPoll::Idle,
        }
    }

    fn handle_input(&mut self, ctx: &mut BattleContext, input: ActionInput) -> ActionPoll {
        match (self.latch.state(), input) {
            (ActionState::TargetRequested, ActionInput::TargetSelected(selection)) => {
                match self.picker.offer_selection(selection) {
                    PickerPoll::Selected(selection) => self.on_select(ctx, selection),
                    _ => ActionPoll::Idle,
                }
            }
            (ActionState::AwaitingDamage, ActionInput::DamageAcknowledged(ticket))
                if self.ticket == Some(ticket) =>
            {
                ctx.damage.acknowledge(ticket);
                self.ticket = None;
                self.latch.resolve()
            }
            _ => ActionPoll::Idle,
        }
    }

    /// An attack whose damage already landed still consumes the turn: it
    /// resolves instead of cancelling.
    fn dispose(&mut self, ctx: &mut BattleContext) -> ActionPoll {
        self.picker.dispose();
        if let Some(ticket) = self.ticket.take() {
            ctx.damage.release(ticket);
            trace!(target: "battle::action", actor = %self.actor, ticket = ticket.0, "disposed after damage landed");
            return self.latch.resolve();
        }
        self.latch.cancel()
    }
}
