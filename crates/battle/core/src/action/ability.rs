use std::sync::Arc;

use tracing::debug;

use crate::ability::AbilityDefinition;
use crate::engine::BattleContext;
use crate::event::BattleEvent;
use crate::state::SquadId;
use crate::targeting::{PickerPoll, TargetPicker, TargetResolver, TargetRule};

use super::{ActionInput, ActionKind, ActionLatch, ActionPoll, ActionState, BattleAction, Suspension};

/// Casts an ability: pick a target allowed by the ability's rule, attach its
/// effects and start its cooldown.
///
/// Self-targeted abilities skip the picker.
pub struct AbilityAction {
    latch: ActionLatch,
    actor: SquadId,
    ability: Arc<AbilityDefinition>,
    picker: Box<dyn TargetPicker>,
}

impl AbilityAction {
    pub fn new(actor: SquadId, ability: Arc<AbilityDefinition>, picker: Box<dyn TargetPicker>) -> Self {
        Self {
            latch: ActionLatch::new(ActionKind::Ability(ability.id)),
            actor,
            ability,
            picker,
        }
    }

    fn on_select(&mut self, ctx: &mut BattleContext, selection: Option<SquadId>) -> ActionPoll {
        let Some(target) = selection else {
            debug!(target: "battle::action", actor = %self.actor, ability = %self.ability.id, "ability has no target");
            return self.latch.resolve();
        };
        if !self
            .ability
            .target
            .resolve_target(&ctx.target_view(), self.actor, target)
        {
            debug!(target: "battle::action", actor = %self.actor, ability = %self.ability.id, %target, "ability target rejected");
            return self.latch.resolve();
        }
        if ctx.roster.living(self.actor).is_none() {
            return self.latch.resolve();
        }

        for effect in ctx.abilities.effects_of(&self.ability) {
            let (effects, mut env) = ctx.effect_env();
            effects.add_effect(&mut env, Some(self.actor), &effect, target);
        }

        let remaining = ctx.cooldowns.trigger_cooldown(self.actor, &self.ability);
        if remaining > 0 {
            ctx.emit(BattleEvent::CooldownStarted {
                squad: self.actor,
                ability: self.ability.id,
                remaining,
            });
        }

        debug!(target: "battle::action", actor = %self.actor, ability = %self.ability.id, %target, "ability cast");
        self.latch.resolve()
    }
}

impl BattleAction for AbilityAction {
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
        if self.ability.target == TargetRule::SelfOnly {
            return self.on_select(ctx, Some(self.actor));
        }

        let poll = {
            let view = ctx.target_view();
            self.picker
                .request_target(&view, self.actor, &self.ability.target)
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
            _ => ActionPoll::Idle,
        }
    }

    fn dispose(&mut self, _ctx: &mut BattleContext) -> ActionPoll {
        self.picker.dispose();
        self.latch.cancel()
    }
}
