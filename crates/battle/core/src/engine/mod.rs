//! Battle facade and the two state machines behind it.
//!
//! [`Battle`] owns the [`BattleContext`], the [`PhaseMachine`] and the
//! [`RoundMachine`]. Every public operation runs to completion: it feeds the
//! machines, lets queued triggers settle and returns. Suspended work (target
//! selection, damage acknowledgement, auto-skip timers) shows up in
//! [`Battle::pending`] until the embedder delivers the matching input.

mod context;
mod phase;
mod presenter;
mod round;

use tracing::debug;

use crate::ability::{AbilityBook, AbilityId, AbilityStatus};
use crate::action::ActionKind;
use crate::combat::{DamageFormula, DamageTicket, StandardDamage};
use crate::config::BattleConfig;
use crate::error::{BattleError, Result};
use crate::event::BattleEvent;
use crate::grid::{BattleGrid, FormationGrid, SlotId};
use crate::result::{BattleResult, BattleSnapshot, BattleStatus, SquadSummary};
use crate::state::{Roster, RosterEntry, SquadId, SquadModel};
use crate::targeting::{TargetResolver, TargetRule, pick_ai_target};

pub use context::BattleContext;
pub use phase::{BattlePhase, PhaseMachine, PhaseTrigger};
pub use presenter::{BattlePresenter, Surface};
pub use round::{PendingInput, RoundMachine, RoundState, RoundTrigger};

/// Wires a battle from a roster and its collaborators.
pub struct BattleBuilder {
    config: BattleConfig,
    entries: Vec<RosterEntry>,
    abilities: AbilityBook,
    grid: Option<Box<dyn BattleGrid>>,
    formula: Option<Box<dyn DamageFormula>>,
    presenter: Option<Box<dyn BattlePresenter>>,
}

impl BattleBuilder {
    pub fn new(config: BattleConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
            abilities: AbilityBook::new(),
            grid: None,
            formula: None,
            presenter: None,
        }
    }

    pub fn squad(mut self, entry: RosterEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn squads(mut self, entries: impl IntoIterator<Item = RosterEntry>) -> Self {
        self.entries.extend(entries);
        self
    }

    pub fn abilities(mut self, abilities: AbilityBook) -> Self {
        self.abilities = abilities;
        self
    }

    pub fn grid(mut self, grid: impl BattleGrid + 'static) -> Self {
        self.grid = Some(Box::new(grid));
        self
    }

    pub fn formula(mut self, formula: impl DamageFormula + 'static) -> Self {
        self.formula = Some(Box::new(formula));
        self
    }

    pub fn presenter(mut self, presenter: impl BattlePresenter + 'static) -> Self {
        self.presenter = Some(Box::new(presenter));
        self
    }

    /// Uses [`FormationGrid`] and [`StandardDamage`] for any collaborator not
    /// supplied yet.
    pub fn with_standard_collaborators(mut self) -> Self {
        if self.grid.is_none() {
            self.grid = Some(Box::new(FormationGrid::new(self.config.grid_columns)));
        }
        if self.formula.is_none() {
            self.formula = Some(Box::new(StandardDamage));
        }
        self
    }

    pub fn build(self) -> Result<Battle> {
        let grid = self.grid.ok_or(BattleError::MissingCollaborator("grid"))?;
        let formula = self
            .formula
            .ok_or(BattleError::MissingCollaborator("damage formula"))?;

        let mut roster = Roster::new();
        for entry in &self.entries {
            if let Some(missing) = entry
                .definition
                .abilities
                .iter()
                .find(|id| self.abilities.ability(**id).is_none())
            {
                return Err(BattleError::UnknownAbility(*missing));
            }
            roster.register(entry)?;
        }

        debug!(target: "battle::phase", squads = roster.len(), "battle built");
        Ok(Battle {
            ctx: BattleContext::new(
                roster,
                grid,
                formula,
                self.abilities,
                self.config,
                self.presenter,
            ),
            phase: PhaseMachine::new(),
            round: RoundMachine::new(),
        })
    }
}

/// One battle encounter.
pub struct Battle {
    ctx: BattleContext,
    phase: PhaseMachine,
    round: RoundMachine,
}

impl Battle {
    pub fn builder(config: BattleConfig) -> BattleBuilder {
        BattleBuilder::new(config)
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// `Loading -> Tactics`: places units and enables drag-and-drop.
    pub fn start(&mut self) -> bool {
        self.phase
            .fire(&mut self.ctx, &mut self.round, PhaseTrigger::StartBattle)
    }

    /// "Rounds requested": `Tactics -> BattleRounds`.
    pub fn request_rounds(&mut self) -> bool {
        let fired = self
            .phase
            .fire(&mut self.ctx, &mut self.round, PhaseTrigger::StartBattleRound);
        self.settle();
        fired
    }

    pub fn request_defend(&mut self) -> bool {
        if !self.in_rounds() {
            return false;
        }
        let accepted = self.round.request_defend(&mut self.ctx);
        self.settle();
        accepted
    }

    pub fn request_skip(&mut self) -> bool {
        if !self.in_rounds() {
            return false;
        }
        let accepted = self.round.request_skip(&mut self.ctx);
        self.settle();
        accepted
    }

    pub fn use_ability(&mut self, ability: AbilityId) -> Result<()> {
        self.expect_phase(BattlePhase::BattleRounds)?;
        let outcome = self.round.use_ability(&mut self.ctx, ability);
        self.settle();
        outcome
    }

    /// Delivers the player's target pick (`None` means "no target").
    pub fn select_target(&mut self, selection: Option<SquadId>) -> bool {
        if !self.in_rounds() {
            return false;
        }
        let accepted = self.round.select_target(&mut self.ctx, selection);
        self.settle();
        accepted
    }

    pub fn acknowledge_damage(&mut self, ticket: DamageTicket) -> bool {
        if !self.in_rounds() {
            return false;
        }
        let accepted = self.round.acknowledge_damage(&mut self.ctx, ticket);
        self.settle();
        accepted
    }

    pub fn timer_elapsed(&mut self, serial: u64) -> bool {
        if !self.in_rounds() {
            return false;
        }
        let accepted = self.round.timer_elapsed(&mut self.ctx, serial);
        self.settle();
        accepted
    }

    /// Disposes the hosted action. Player squads get a fresh default action,
    /// everyone else skips.
    pub fn cancel_action(&mut self) -> bool {
        if !self.in_rounds() {
            return false;
        }
        let cancelled = self.round.cancel_action(&mut self.ctx);
        self.settle();
        cancelled
    }

    /// Ends the battle with [`BattleStatus::Flee`].
    pub fn flee(&mut self) -> bool {
        self.phase
            .finish(&mut self.ctx, &mut self.round, BattleStatus::Flee)
    }

    /// Drag-and-drop move during tactics.
    pub fn move_unit(&mut self, squad: SquadId, slot: SlotId) -> Result<()> {
        self.expect_phase(BattlePhase::Tactics)?;
        let model = self
            .ctx
            .roster
            .living(squad)
            .ok_or(BattleError::UnknownSquad(squad))?;
        if !self.phase.drag_and_drop_enabled() || model.side() != slot.side {
            return Err(BattleError::SlotUnavailable(squad));
        }
        if !self.ctx.grid.try_move_occupant(squad, slot) {
            return Err(BattleError::SlotUnavailable(squad));
        }
        debug!(target: "battle::phase", %squad, ?slot, "unit moved");
        Ok(())
    }

    /// Attaches or replaces the presentation collaborator.
    pub fn attach_presenter(&mut self, presenter: impl BattlePresenter + 'static) {
        self.ctx.set_presenter(Some(Box::new(presenter)));
    }

    pub fn detach_presenter(&mut self) {
        self.ctx.set_presenter(None);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn phase(&self) -> BattlePhase {
        self.phase.phase()
    }

    pub fn round_state(&self) -> RoundState {
        self.round.state()
    }

    pub fn round_number(&self) -> u32 {
        self.round.round()
    }

    /// Squads that still have living units.
    pub fn battle_units(&self) -> impl Iterator<Item = &SquadModel> {
        self.ctx.roster.battle_units()
    }

    pub fn squad(&self, id: SquadId) -> Option<&SquadModel> {
        self.ctx.roster.get(id)
    }

    pub fn active_unit(&self) -> Option<SquadId> {
        self.round.active_unit()
    }

    pub fn current_action(&self) -> Option<ActionKind> {
        self.round.current_action()
    }

    pub fn pending(&self) -> Option<PendingInput> {
        self.round.pending()
    }

    pub fn queue(&self) -> Vec<SquadId> {
        self.ctx.queue.to_vec()
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_finished()
    }

    pub fn result(&self) -> Option<&BattleResult> {
        self.phase.result()
    }

    pub fn context(&self) -> &BattleContext {
        &self.ctx
    }

    /// Abilities of the active player squad with remaining cooldowns.
    pub fn available_abilities(&mut self) -> Vec<AbilityStatus> {
        match self.round.active_unit() {
            Some(active) => self.ctx.ability_statuses(active),
            None => Vec::new(),
        }
    }

    /// Legal targets for the hosted action, in squad order. Empty when the
    /// hosted action does not pick a target.
    pub fn target_candidates(&self) -> Vec<SquadId> {
        let (Some(actor), Some(rule)) = (self.round.active_unit(), self.hosted_rule()) else {
            return Vec::new();
        };
        let view = self.ctx.target_view();
        self.ctx
            .roster
            .battle_units()
            .map(SquadModel::id)
            .filter(|target| rule.resolve_target(&view, actor, *target))
            .collect()
    }

    /// The target the AI would choose for the hosted action.
    pub fn suggest_target(&self) -> Option<SquadId> {
        let actor = self.round.active_unit()?;
        let rule = self.hosted_rule()?;
        pick_ai_target(&self.ctx.target_view(), actor, &rule)
            .or_else(|| self.target_candidates().first().copied())
    }

    pub fn drain_events(&mut self) -> Vec<BattleEvent> {
        self.ctx.events.drain()
    }

    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            phase: self.phase.phase(),
            round: self.round.round(),
            queue: self.ctx.queue.to_vec(),
            active: self.round.active_unit(),
            action: self.round.current_action(),
            pending: self.round.pending(),
            units: self.ctx.roster.iter().map(SquadSummary::from).collect(),
            result: self.phase.result().cloned(),
        }
    }

    fn hosted_rule(&self) -> Option<TargetRule> {
        match self.round.current_action()? {
            ActionKind::Attack => Some(TargetRule::Attack),
            ActionKind::Ability(id) => self.ctx.abilities.ability(id).map(|ability| ability.target),
            ActionKind::Defend | ActionKind::Skip | ActionKind::AutoSkip => None,
        }
    }

    fn in_rounds(&self) -> bool {
        self.phase.phase() == BattlePhase::BattleRounds
    }

    fn expect_phase(&self, expected: BattlePhase) -> Result<()> {
        let actual = self.phase.phase();
        if actual != expected {
            return Err(BattleError::WrongPhase { expected, actual });
        }
        Ok(())
    }

    /// Reacts to the round machine's "rounds finished" notification.
    fn settle(&mut self) {
        if let Some(status) = self.round.take_finished() {
            self.phase.finish(&mut self.ctx, &mut self.round, status);
        }
    }
}
