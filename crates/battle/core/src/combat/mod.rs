//! Damage resolution.

mod damage;

pub use damage::{
    AttackDamage, DamageFormula, DamageOrigin, DamageOutcome, DamageQuantum, DamageResolver,
    DamageSource, DamageTicket, StandardDamage,
};
