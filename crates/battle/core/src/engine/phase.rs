//! Battle phase state machine: `Loading -> Tactics -> BattleRounds -> Results`.

use std::collections::VecDeque;

use tracing::{info, trace, warn};

use crate::event::BattleEvent;
use crate::grid::Placement;
use crate::result::{BattleResult, BattleStatus, SquadSummary};
use crate::state::Side;

use super::context::BattleContext;
use super::presenter::Surface;
use super::round::RoundMachine;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BattlePhase {
    #[default]
    Loading,
    Tactics,
    BattleRounds,
    Results,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PhaseTrigger {
    StartBattle,
    StartBattleRound,
    ShowBattleResults,
}

impl BattlePhase {
    pub const fn transition(self, trigger: PhaseTrigger) -> Option<BattlePhase> {
        use BattlePhase as P;
        use PhaseTrigger as T;

        Some(match (self, trigger) {
            (P::Loading, T::StartBattle) => P::Tactics,
            (P::Tactics, T::StartBattleRound) => P::BattleRounds,
            // Fleeing from the tactics screen skips the rounds entirely.
            (P::Tactics, T::ShowBattleResults) => P::Results,
            (P::BattleRounds, T::ShowBattleResults) => P::Results,
            _ => return None,
        })
    }

    pub const fn permits(self, trigger: PhaseTrigger) -> bool {
        self.transition(trigger).is_some()
    }
}

#[derive(Debug, Default)]
pub struct PhaseMachine {
    phase: BattlePhase,
    triggers: VecDeque<PhaseTrigger>,
    firing: bool,
    drag_and_drop: bool,
    finished: bool,
    status: Option<BattleStatus>,
    result: Option<BattleResult>,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn result(&self) -> Option<&BattleResult> {
        self.result.as_ref()
    }

    /// True while tactics placement accepts drag-and-drop moves.
    pub fn drag_and_drop_enabled(&self) -> bool {
        self.drag_and_drop
    }

    /// Fires `trigger`. Returns false if the current phase does not permit it.
    pub fn fire(
        &mut self,
        ctx: &mut BattleContext,
        round: &mut RoundMachine,
        trigger: PhaseTrigger,
    ) -> bool {
        if !self.phase.permits(trigger) {
            trace!(target: "battle::phase", phase = %self.phase, %trigger, "trigger not permitted");
            return false;
        }

        self.triggers.push_back(trigger);
        if self.firing {
            return true;
        }
        self.firing = true;
        while let Some(trigger) = self.triggers.pop_front() {
            self.step(ctx, round, trigger);
        }
        self.firing = false;
        true
    }

    /// Stores the terminal status and moves to `Results`.
    pub fn finish(
        &mut self,
        ctx: &mut BattleContext,
        round: &mut RoundMachine,
        status: BattleStatus,
    ) -> bool {
        if !self.phase.permits(PhaseTrigger::ShowBattleResults) {
            return false;
        }
        self.status = Some(status);
        self.fire(ctx, round, PhaseTrigger::ShowBattleResults)
    }

    fn step(&mut self, ctx: &mut BattleContext, round: &mut RoundMachine, trigger: PhaseTrigger) {
        let Some(next) = self.phase.transition(trigger) else {
            trace!(target: "battle::phase", phase = %self.phase, %trigger, "trigger not permitted");
            return;
        };

        let from = self.phase;
        self.exit(ctx, round, from);
        self.phase = next;
        info!(target: "battle::phase", %from, to = %next, "phase changed");
        ctx.emit(BattleEvent::PhaseChanged { from, to: next });
        self.enter(ctx, round, next);
    }

    fn enter(&mut self, ctx: &mut BattleContext, round: &mut RoundMachine, phase: BattlePhase) {
        match phase {
            BattlePhase::Loading => {}
            BattlePhase::Tactics => {
                ctx.present("set_hover_inspection", |p| p.set_hover_inspection(true));
                ctx.present("show_surface", |p| p.show_surface(Surface::Tactics));

                let placements: Vec<Placement> = ctx
                    .roster
                    .battle_units()
                    .map(|squad| Placement {
                        squad: squad.id(),
                        side: squad.side(),
                        attack_kind: squad.attack_kind(),
                    })
                    .collect();
                if !ctx.grid.try_place_units(&placements) {
                    warn!(target: "battle::phase", units = placements.len(), "not every unit could be placed on the grid");
                }

                ctx.present("set_drag_and_drop", |p| p.set_drag_and_drop(true));
                self.drag_and_drop = true;
            }
            BattlePhase::BattleRounds => {
                ctx.present("show_surface", |p| p.show_surface(Surface::Rounds));
                round.begin(ctx);
            }
            BattlePhase::Results => {
                ctx.present("set_hover_inspection", |p| p.set_hover_inspection(false));
                self.finished = true;

                let status = self.status.unwrap_or(BattleStatus::Flee);
                let result = BattleResult {
                    status,
                    rounds: round.round(),
                    friendly: ctx.roster.side(Side::Friendly).map(SquadSummary::from).collect(),
                    enemy: ctx.roster.side(Side::Enemy).map(SquadSummary::from).collect(),
                };
                info!(target: "battle::phase", %status, rounds = result.rounds, "battle finished");

                ctx.emit(BattleEvent::BattleFinished { status });
                ctx.present("render_results", |p| p.render_results(&result));
                ctx.present("show_surface", |p| p.show_surface(Surface::Results));
                self.result = Some(result);
            }
        }
    }

    fn exit(&mut self, ctx: &mut BattleContext, round: &mut RoundMachine, phase: BattlePhase) {
        match phase {
            BattlePhase::Tactics => {
                ctx.present("set_slot_colliders", |p| p.set_slot_colliders(false));
                ctx.present("set_drag_and_drop", |p| p.set_drag_and_drop(false));
                self.drag_and_drop = false;
            }
            BattlePhase::BattleRounds => round.halt(ctx),
            BattlePhase::Loading | BattlePhase::Results => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_only_move_forward() {
        assert_eq!(
            BattlePhase::Loading.transition(PhaseTrigger::StartBattle),
            Some(BattlePhase::Tactics)
        );
        assert!(!BattlePhase::Loading.permits(PhaseTrigger::StartBattleRound));
        assert!(!BattlePhase::BattleRounds.permits(PhaseTrigger::StartBattle));
        assert!(!BattlePhase::Results.permits(PhaseTrigger::ShowBattleResults));
    }
}
