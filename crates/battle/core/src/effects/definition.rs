//! Status effect definitions.
//!
//! # Duration
//!
//! Ticking effects expire once `tick_count >= max_tick` when `max_tick > 0`.
//! `max_tick <= 0` never expires by ticks. `UntilEvent` and `Infinite`
//! durations ignore `max_tick`; the former is released by its bound event,
//! the latter only by explicit removal.

use std::fmt;

use crate::combat::DamageQuantum;
use crate::state::{ModifierSource, StatDeltas};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EffectId(pub u32);

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect:{}", self.0)
    }
}

/// One attachment of an effect definition to a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectInstanceId(pub u64);

impl From<EffectInstanceId> for ModifierSource {
    fn from(instance: EffectInstanceId) -> Self {
        ModifierSource(instance.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum EffectTrigger {
    /// Applies once when attached and is finalized immediately.
    OnAttach,
    /// Applies on every round tick while active.
    OnTick,
}

/// Bearer events that release `UntilEvent` effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum EffectEvent {
    TurnStarted,
    DamageTaken,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DurationMode {
    Instant,
    TurnCount,
    RoundCount,
    UntilEvent(EffectEvent),
    Infinite,
}

/// What happens when the same definition is attached to a target twice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum StackPolicy {
    /// Independent instances; stat deltas compose additively.
    #[default]
    Stack,
    /// Keep the existing instance and reset its tick counter.
    Refresh,
    /// Keep the existing instance untouched.
    Ignore,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectKind {
    /// Deals a fixed quantum through the damage resolver.
    Damage(DamageQuantum),
    /// Adds stat deltas keyed by the effect instance while active.
    StatModifier(StatDeltas),
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectDefinition {
    pub id: EffectId,
    pub name: String,
    pub trigger: EffectTrigger,
    pub duration: DurationMode,
    pub max_tick: i32,
    pub kind: EffectKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stacking: StackPolicy,
}

impl EffectDefinition {
    /// Instant effects apply and are torn down without entering the active list.
    pub fn is_instant(&self) -> bool {
        self.trigger == EffectTrigger::OnAttach || self.duration == DurationMode::Instant
    }

    pub fn is_expired(&self, tick_count: i32) -> bool {
        match self.duration {
            DurationMode::UntilEvent(_) | DurationMode::Infinite => false,
            DurationMode::Instant | DurationMode::TurnCount | DurationMode::RoundCount => {
                self.max_tick > 0 && tick_count >= self.max_tick
            }
        }
    }

    pub fn released_by(&self, event: EffectEvent) -> bool {
        self.duration == DurationMode::UntilEvent(event)
    }
}
