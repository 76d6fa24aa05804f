//! Deterministic tactical battle engine.
//!
//! `battle-core` runs one encounter between two sides of squads: tactics
//! placement, initiative-ordered combat rounds and a terminal result. It is
//! synchronous and does no IO. Everything that waits (player target picks,
//! damage presentation, auto-skip delays) is modelled as a suspended action
//! that the embedder resumes through [`engine::Battle`]; the async runtime
//! crate does exactly that on top of tokio.
pub mod ability;
pub mod action;
pub mod combat;
pub mod config;
pub mod cooldown;
pub mod effects;
pub mod engine;
pub mod error;
pub mod event;
pub mod grid;
pub mod queue;
pub mod result;
pub mod state;
pub mod targeting;

pub use ability::{AbilityBook, AbilityDefinition, AbilityId, AbilityStatus};
pub use action::{
    AbilityAction, ActionInput, ActionKind, ActionLatch, ActionPoll, ActionSignal, ActionState,
    AttackAction, AutoSkipAction, BattleAction, DefendAction, SkipTurnAction, Suspension,
};
pub use combat::{
    AttackDamage, DamageFormula, DamageOrigin, DamageOutcome, DamageQuantum, DamageResolver,
    DamageSource, DamageTicket, StandardDamage,
};
pub use config::{AiTurnPolicy, BattleConfig};
pub use cooldown::CooldownTracker;
pub use effects::{
    DurationMode, EffectDefinition, EffectEnv, EffectEvent, EffectId, EffectInstanceId, EffectKind,
    EffectManager, EffectState, EffectTrigger, RemovalReason, StackPolicy,
};
pub use engine::{
    Battle, BattleBuilder, BattleContext, BattlePhase, BattlePresenter, PendingInput,
    PhaseMachine, PhaseTrigger, RoundMachine, RoundState, RoundTrigger, Surface,
};
pub use error::{BattleError, Result};
pub use event::{BattleEvent, EventCategory, EventLog};
pub use grid::{BattleGrid, FormationGrid, Placement, Row, SlotId};
pub use queue::TurnQueue;
pub use result::{BattleResult, BattleSnapshot, BattleStatus, SquadSummary};
pub use state::{
    AttackKind, Controller, DamageReport, DamageType, ModifierSource, Roster, RosterEntry, Side,
    SquadId, SquadModel, StatDelta, StatDeltas, StatKind, UnitDefinition, UnitStats,
};
pub use targeting::{
    AiPicker, AllyResolver, AttackResolver, EnemyResolver, HumanPicker, PickerKind, PickerPoll,
    SelfResolver, TargetPicker, TargetResolver, TargetRule, TargetView, pick_ai_target,
};
