//! Effect manager: the sole owner of every active effect in a battle.
//!
//! Lifecycle of one attachment:
//!
//! 1. `add_effect` runs the attach hook. Instant effects are applied and
//!    finalized on the spot and never enter the active list.
//! 2. `tick` (once per round) advances every counter, runs the tick hook and
//!    expires finished effects.
//! 3. `remove_effect`, `notify` or an orphan sweep runs the removal hook.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::combat::{DamageOrigin, DamageOutcome, DamageQuantum, DamageResolver, DamageSource};
use crate::event::{BattleEvent, EventLog};
use crate::state::{Roster, SquadId};

use super::definition::{
    EffectDefinition, EffectEvent, EffectId, EffectInstanceId, EffectKind, StackPolicy,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum RemovalReason {
    /// Instant effect torn down right after applying.
    Finalized,
    /// Tick budget exhausted.
    Expired,
    /// Explicit `remove_effect`.
    Removed,
    /// Bound `UntilEvent` fired.
    Released,
    /// Target was wiped out or vanished.
    Orphaned,
}

/// One effect definition bound to one target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectState {
    pub instance: EffectInstanceId,
    pub definition: Arc<EffectDefinition>,
    /// Squad whose action attached the effect, if any.
    pub source: Option<SquadId>,
    pub target: SquadId,
    pub tick_count: i32,
}

impl DamageSource for EffectState {
    fn quantum(&self) -> DamageQuantum {
        match &self.definition.kind {
            EffectKind::Damage(quantum) => *quantum,
            EffectKind::StatModifier(_) => DamageQuantum::new(Default::default(), 0),
        }
    }

    fn origin(&self) -> DamageOrigin {
        DamageOrigin::Effect {
            effect: self.definition.id,
            instance: self.instance,
            source: self.source,
        }
    }
}

/// Mutable battle state the effect hooks operate on.
pub struct EffectEnv<'a> {
    pub roster: &'a mut Roster,
    pub damage: &'a mut DamageResolver,
    pub events: &'a mut EventLog,
}

#[derive(Debug, Default)]
pub struct EffectManager {
    active: BTreeMap<SquadId, Vec<EffectState>>,
    next_instance: u64,
}

impl EffectManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `definition` to `target`.
    ///
    /// Returns the instance now carrying the effect (the existing one under
    /// `Refresh`/`Ignore` stacking), or `None` if the target is not a living
    /// squad.
    pub fn add_effect(
        &mut self,
        env: &mut EffectEnv<'_>,
        source: Option<SquadId>,
        definition: &Arc<EffectDefinition>,
        target: SquadId,
    ) -> Option<EffectInstanceId> {
        if env.roster.living(target).is_none() {
            warn!(target: "battle::effects", effect = %definition.id, squad = %target, "cannot attach effect to missing or empty squad");
            return None;
        }

        if !definition.is_instant()
            && let Some(existing) = self.find_mut(target, definition.id)
        {
            match definition.stacking {
                StackPolicy::Stack => {}
                StackPolicy::Refresh => {
                    existing.tick_count = 0;
                    trace!(target: "battle::effects", effect = %definition.id, squad = %target, "effect refreshed");
                    return Some(existing.instance);
                }
                StackPolicy::Ignore => return Some(existing.instance),
            }
        }

        self.next_instance += 1;
        let state = EffectState {
            instance: EffectInstanceId(self.next_instance),
            definition: Arc::clone(definition),
            source,
            target,
            tick_count: 0,
        };

        env.events.push(BattleEvent::EffectAttached {
            target,
            effect: definition.id,
            instance: state.instance,
        });
        let damaged = on_attach(env, &state);

        let instance = state.instance;
        if definition.is_instant() {
            debug!(target: "battle::effects", effect = %definition.id, squad = %target, "instant effect applied");
            on_remove(env, &state, RemovalReason::Finalized);
        } else {
            debug!(target: "battle::effects", effect = %definition.id, squad = %target, max_tick = definition.max_tick, "effect attached");
            self.active.entry(target).or_default().push(state);
        }

        if damaged {
            self.notify(env, target, EffectEvent::DamageTaken);
        }
        Some(instance)
    }

    /// Removes every instance of `effect` from `target`. Returns how many
    /// instances were removed.
    pub fn remove_effect(
        &mut self,
        env: &mut EffectEnv<'_>,
        effect: EffectId,
        target: SquadId,
    ) -> usize {
        self.remove_where(env, target, RemovalReason::Removed, |state| {
            state.definition.id == effect
        })
    }

    /// Releases `UntilEvent` effects on `target` bound to `event`.
    pub fn notify(&mut self, env: &mut EffectEnv<'_>, target: SquadId, event: EffectEvent) -> usize {
        self.remove_where(env, target, RemovalReason::Released, |state| {
            state.definition.released_by(event)
        })
    }

    /// Advances every active effect by one tick.
    pub fn tick(&mut self, env: &mut EffectEnv<'_>) {
        let targets: Vec<SquadId> = self.active.keys().copied().collect();
        let mut damaged = Vec::new();

        for target in targets {
            if env.roster.living(target).is_none() {
                self.remove_where(env, target, RemovalReason::Orphaned, |_| true);
                continue;
            }

            let Some(states) = self.active.get_mut(&target) else {
                continue;
            };

            let mut expired = Vec::new();
            for state in states.iter_mut() {
                state.tick_count += 1;
                env.events.push(BattleEvent::EffectTicked {
                    target,
                    effect: state.definition.id,
                    instance: state.instance,
                    tick: state.tick_count,
                });
                if on_tick(env, state) {
                    damaged.push(target);
                }
                if state.definition.is_expired(state.tick_count) {
                    expired.push(state.instance);
                }
            }

            if !expired.is_empty() {
                self.remove_where(env, target, RemovalReason::Expired, |state| {
                    expired.contains(&state.instance)
                });
            }
        }

        damaged.dedup();
        for target in damaged {
            self.notify(env, target, EffectEvent::DamageTaken);
        }

        // Effects may have wiped out their own bearer.
        let orphaned: Vec<SquadId> = self
            .active
            .keys()
            .copied()
            .filter(|target| env.roster.living(*target).is_none())
            .collect();
        for target in orphaned {
            self.remove_where(env, target, RemovalReason::Orphaned, |_| true);
        }
    }

    pub fn effects_on(&self, target: SquadId) -> &[EffectState] {
        self.active.get(&target).map_or(&[], Vec::as_slice)
    }

    pub fn has_effect(&self, target: SquadId, effect: EffectId) -> bool {
        self.effects_on(target)
            .iter()
            .any(|state| state.definition.id == effect)
    }

    /// Number of targets with at least one active effect.
    pub fn tracked_targets(&self) -> usize {
        self.active.len()
    }

    fn find_mut(&mut self, target: SquadId, effect: EffectId) -> Option<&mut EffectState> {
        self.active
            .get_mut(&target)?
            .iter_mut()
            .find(|state| state.definition.id == effect)
    }

    fn remove_where(
        &mut self,
        env: &mut EffectEnv<'_>,
        target: SquadId,
        reason: RemovalReason,
        predicate: impl Fn(&EffectState) -> bool,
    ) -> usize {
        let Some(states) = self.active.get_mut(&target) else {
            return 0;
        };

        let (removed, kept): (Vec<_>, Vec<_>) = states.drain(..).partition(|s| predicate(s));
        *states = kept;
        if states.is_empty() {
            self.active.remove(&target);
        }

        for state in &removed {
            debug!(target: "battle::effects", effect = %state.definition.id, squad = %target, %reason, "effect removed");
            on_remove(env, state, reason);
        }
        removed.len()
    }
}

/// Returns true when the hook damaged the target.
fn on_attach(env: &mut EffectEnv<'_>, state: &EffectState) -> bool {
    match &state.definition.kind {
        EffectKind::StatModifier(deltas) => {
            if let Some(squad) = env.roster.get_mut(state.target) {
                squad.add_modifier(state.instance.into(), deltas.clone());
            }
            false
        }
        EffectKind::Damage(_) if state.definition.is_instant() => deal_damage(env, state),
        EffectKind::Damage(_) => false,
    }
}

fn on_tick(env: &mut EffectEnv<'_>, state: &EffectState) -> bool {
    match &state.definition.kind {
        EffectKind::Damage(_) => deal_damage(env, state),
        EffectKind::StatModifier(_) => false,
    }
}

fn on_remove(env: &mut EffectEnv<'_>, state: &EffectState, reason: RemovalReason) {
    if matches!(state.definition.kind, EffectKind::StatModifier(_))
        && let Some(squad) = env.roster.get_mut(state.target)
    {
        squad.remove_modifier(state.instance.into());
    }

    env.events.push(BattleEvent::EffectRemoved {
        target: state.target,
        effect: state.definition.id,
        instance: state.instance,
        reason,
    });
}

/// Effect damage never suspends: the ticket is acknowledged immediately.
fn deal_damage(env: &mut EffectEnv<'_>, state: &EffectState) -> bool {
    match env
        .damage
        .resolve(env.roster, env.events, state, state.target)
    {
        DamageOutcome::Applied { ticket, .. } => {
            env.damage.acknowledge(ticket);
            true
        }
        DamageOutcome::NoOp => false,
    }
}
