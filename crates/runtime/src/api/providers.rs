//! Asynchronous abstraction for sourcing player intent.
//!
//! The runtime consults a [`PlayerProvider`] whenever the battle waits on a
//! player decision, so battles can run with human input adapters, scripted
//! fixtures, or the AI policy standing in for the player.
use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use battle_core::{AbilityId, AbilityStatus, ActionKind, BattleSnapshot, DamageTicket, SquadId};

use super::errors::Result;

/// Everything a provider needs to decide the active player squad's turn.
#[derive(Clone, Debug)]
pub struct TurnRequest {
    /// Serial of the hosted action the decision is for.
    pub serial: u64,
    pub actor: SquadId,
    pub action: ActionKind,
    /// Legal targets for the hosted action.
    pub candidates: Vec<SquadId>,
    /// The target the AI would pick.
    pub suggestion: Option<SquadId>,
    pub abilities: Vec<AbilityStatus>,
    pub snapshot: BattleSnapshot,
}

impl TurnRequest {
    pub fn ready_abilities(&self) -> impl Iterator<Item = &AbilityStatus> {
        self.abilities.iter().filter(|status| status.ready)
    }
}

/// What the player does with the turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerDecision {
    /// Pick a target for the hosted action. `None` spends the turn.
    Target(Option<SquadId>),
    /// Swap the default attack for an ability.
    UseAbility(AbilityId),
    Defend,
    Skip,
    Flee,
}

#[async_trait]
pub trait PlayerProvider: Send + Sync {
    /// Decide the turn described by `request`.
    async fn decide(&self, request: &TurnRequest) -> Result<PlayerDecision>;

    /// Runs the damage presentation step when the worker is not configured to
    /// acknowledge damage itself. Returning acknowledges `ticket`.
    async fn present_damage(&self, _ticket: DamageTicket) -> Result<()> {
        Ok(())
    }
}

/// Plays the player's squads with the AI target choice.
///
/// On the default attack it casts the first ready ability, if any.
#[derive(Clone, Copy, Debug, Default)]
pub struct AiPlayerProvider;

#[async_trait]
impl PlayerProvider for AiPlayerProvider {
    async fn decide(&self, request: &TurnRequest) -> Result<PlayerDecision> {
        if request.action == ActionKind::Attack
            && let Some(status) = request.ready_abilities().next()
        {
            return Ok(PlayerDecision::UseAbility(status.ability));
        }
        Ok(PlayerDecision::Target(request.suggestion))
    }
}

/// Replays a fixed list of decisions, then falls back to the suggestion.
/// Useful for testing.
#[derive(Debug, Default)]
pub struct ScriptedPlayerProvider {
    script: Mutex<VecDeque<PlayerDecision>>,
}

impl ScriptedPlayerProvider {
    pub fn new(script: impl IntoIterator<Item = PlayerDecision>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
        }
    }

    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }
}

#[async_trait]
impl PlayerProvider for ScriptedPlayerProvider {
    async fn decide(&self, request: &TurnRequest) -> Result<PlayerDecision> {
        let next = self.script.lock().await.pop_front();
        Ok(next.unwrap_or(PlayerDecision::Target(request.suggestion)))
    }
}
