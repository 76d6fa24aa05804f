//! Targeting: validity predicates ([`TargetResolver`]) and selection sources
//! ([`TargetPicker`]).
//!
//! Both families are dispatched through traits so the round machine never
//! branches on whether a human or the AI is choosing.

mod picker;
mod resolver;

pub use picker::{AiPicker, HumanPicker, PickerKind, PickerPoll, TargetPicker, pick_ai_target};
pub use resolver::{
    AllyResolver, AttackResolver, EnemyResolver, SelfResolver, TargetResolver, TargetRule,
    TargetView,
};
