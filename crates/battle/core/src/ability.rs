//! Ability definitions and the read-only registry the engine looks them up in.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::effects::{EffectDefinition, EffectId};
use crate::error::{BattleError, Result};
use crate::targeting::TargetRule;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AbilityId(pub u32);

impl fmt::Display for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ability:{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityDefinition {
    pub id: AbilityId,
    pub name: String,
    /// Rounds the ability stays unavailable after use. `<= 0` means none.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cooldown: i32,
    pub target: TargetRule,
    /// Effects attached to the chosen target, in order.
    pub effects: Vec<EffectId>,
}

/// Ability and effect definitions available to one battle.
#[derive(Clone, Debug, Default)]
pub struct AbilityBook {
    abilities: BTreeMap<AbilityId, Arc<AbilityDefinition>>,
    effects: BTreeMap<EffectId, Arc<EffectDefinition>>,
}

impl AbilityBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_effect(mut self, effect: EffectDefinition) -> Self {
        self.insert_effect(effect);
        self
    }

    pub fn with_ability(mut self, ability: AbilityDefinition) -> Result<Self> {
        self.insert_ability(ability)?;
        Ok(self)
    }

    pub fn insert_effect(&mut self, effect: EffectDefinition) {
        self.effects.insert(effect.id, Arc::new(effect));
    }

    /// Registers an ability. Every effect it references must already be known.
    pub fn insert_ability(&mut self, ability: AbilityDefinition) -> Result<()> {
        if ability.effects.iter().any(|id| !self.effects.contains_key(id)) {
            return Err(BattleError::InvalidDefinition {
                name: ability.name,
                reason: "ability references an unknown effect",
            });
        }
        self.abilities.insert(ability.id, Arc::new(ability));
        Ok(())
    }

    pub fn ability(&self, id: AbilityId) -> Option<&Arc<AbilityDefinition>> {
        self.abilities.get(&id)
    }

    pub fn effect(&self, id: EffectId) -> Option<&Arc<EffectDefinition>> {
        self.effects.get(&id)
    }

    /// Resolved effect definitions of `ability`, in declaration order.
    pub fn effects_of(&self, ability: &AbilityDefinition) -> Vec<Arc<EffectDefinition>> {
        ability
            .effects
            .iter()
            .filter_map(|id| self.effects.get(id).cloned())
            .collect()
    }

    pub fn abilities(&self) -> impl Iterator<Item = &Arc<AbilityDefinition>> {
        self.abilities.values()
    }
}

/// One entry of a squad's ability list as shown to the player.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityStatus {
    pub ability: AbilityId,
    pub name: String,
    pub remaining: i32,
    pub ready: bool,
}
