//! Per-battle state shared by the phase machine, the round machine and the
//! hosted actions.

use tracing::warn;

use crate::ability::{AbilityBook, AbilityStatus};
use crate::combat::{DamageFormula, DamageResolver};
use crate::config::BattleConfig;
use crate::cooldown::CooldownTracker;
use crate::effects::{EffectEnv, EffectEvent, EffectManager};
use crate::event::{BattleEvent, EventLog};
use crate::grid::BattleGrid;
use crate::queue::TurnQueue;
use crate::result::BattleStatus;
use crate::state::{Roster, Side, SquadId};
use crate::targeting::TargetView;

use super::presenter::BattlePresenter;

pub struct BattleContext {
    pub roster: Roster,
    pub grid: Box<dyn BattleGrid>,
    pub queue: TurnQueue,
    pub effects: EffectManager,
    pub cooldowns: CooldownTracker,
    pub damage: DamageResolver,
    pub formula: Box<dyn DamageFormula>,
    pub abilities: AbilityBook,
    pub events: EventLog,
    pub config: BattleConfig,
    presenter: Option<Box<dyn BattlePresenter>>,
}

impl BattleContext {
    pub(crate) fn new(
        roster: Roster,
        grid: Box<dyn BattleGrid>,
        formula: Box<dyn DamageFormula>,
        abilities: AbilityBook,
        config: BattleConfig,
        presenter: Option<Box<dyn BattlePresenter>>,
    ) -> Self {
        Self {
            roster,
            grid,
            queue: TurnQueue::new(),
            effects: EffectManager::new(),
            cooldowns: CooldownTracker::new(),
            damage: DamageResolver::new(),
            formula,
            abilities,
            events: EventLog::new(),
            config,
            presenter,
        }
    }

    pub fn target_view(&self) -> TargetView<'_> {
        TargetView::new(&self.roster, self.grid.as_ref())
    }

    /// Splits the context into the effect manager and the state its hooks
    /// mutate.
    pub fn effect_env(&mut self) -> (&mut EffectManager, EffectEnv<'_>) {
        (
            &mut self.effects,
            EffectEnv {
                roster: &mut self.roster,
                damage: &mut self.damage,
                events: &mut self.events,
            },
        )
    }

    pub fn notify_effects(&mut self, target: SquadId, event: EffectEvent) {
        let (effects, mut env) = self.effect_env();
        effects.notify(&mut env, target, event);
    }

    pub fn emit(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    /// Terminal outcome implied by the roster, if any. A wiped-out friendly
    /// side is a defeat even when the enemy is wiped out too.
    pub fn outcome(&self) -> Option<BattleStatus> {
        if self.roster.side_defeated(Side::Friendly) {
            Some(BattleStatus::Defeat)
        } else if self.roster.side_defeated(Side::Enemy) {
            Some(BattleStatus::Victory)
        } else {
            None
        }
    }

    pub fn has_presenter(&self) -> bool {
        self.presenter.is_some()
    }

    pub(crate) fn set_presenter(&mut self, presenter: Option<Box<dyn BattlePresenter>>) {
        self.presenter = presenter;
    }

    /// Runs `f` against the presenter, or logs and skips when none is attached.
    pub(crate) fn present(&mut self, call: &'static str, f: impl FnOnce(&mut dyn BattlePresenter)) {
        match self.presenter.as_deref_mut() {
            Some(presenter) => f(presenter),
            None => warn!(target: "battle::ui", call, "no presenter attached, skipping"),
        }
    }

    pub(crate) fn render_queue(&mut self) {
        let queue = self.queue.to_vec();
        self.present("render_queue", |presenter| presenter.render_queue(&queue));
    }

    /// Ability list of `squad` with remaining cooldowns.
    pub fn ability_statuses(&mut self, squad: SquadId) -> Vec<AbilityStatus> {
        let Some(model) = self.roster.get(squad) else {
            return Vec::new();
        };
        let known = model.definition().abilities.clone();

        known
            .into_iter()
            .filter_map(|id| {
                let definition = self.abilities.ability(id)?;
                let name = definition.name.clone();
                let remaining = self.cooldowns.remaining_cooldown(squad, id);
                Some(AbilityStatus {
                    ability: id,
                    name,
                    remaining,
                    ready: remaining <= 0,
                })
            })
            .collect()
    }
}

#[cfg(test)]
impl BattleContext {
    /// Context over `roster` with a placed formation grid and no presenter.
    pub(crate) fn for_roster(roster: Roster, config: BattleConfig) -> Self {
        use crate::combat::StandardDamage;
        use crate::grid::{FormationGrid, Placement};

        let mut grid = FormationGrid::new(config.grid_columns);
        let placements: Vec<Placement> = roster
            .iter()
            .map(|squad| Placement {
                squad: squad.id(),
                side: squad.side(),
                attack_kind: squad.attack_kind(),
            })
            .collect();
        grid.try_place_units(&placements);

        Self::new(
            roster,
            Box::new(grid),
            Box::new(StandardDamage),
            AbilityBook::new(),
            config,
            None,
        )
    }
}
