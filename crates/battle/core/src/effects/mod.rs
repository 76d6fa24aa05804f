//! Status effect engine.

mod definition;
mod manager;

pub use definition::{
    DurationMode, EffectDefinition, EffectEvent, EffectId, EffectInstanceId, EffectKind,
    EffectTrigger, StackPolicy,
};
pub use manager::{EffectEnv, EffectManager, EffectState, RemovalReason};
