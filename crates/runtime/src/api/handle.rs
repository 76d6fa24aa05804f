//! Cloneable façade for issuing commands to the runtime.
//!
//! [`BattleHandle`] hides channel plumbing and offers async helpers for
//! driving the battle or streaming events from specific topics.
use std::collections::HashMap;

use tokio::sync::{broadcast, mpsc, oneshot};

use battle_core::{AbilityId, BattleSnapshot, DamageTicket, SlotId, SquadId};

use super::errors::{Result, RuntimeError};
use super::providers::TurnRequest;
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Client-facing handle to interact with the runtime.
///
/// Boolean replies mirror the engine: `false` means the request was not
/// permitted in the current state and was ignored.
#[derive(Clone)]
pub struct BattleHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl BattleHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    /// `Loading -> Tactics`.
    pub async fn start(&self) -> Result<bool> {
        self.request(|reply| Command::Start { reply }).await
    }

    /// `Tactics -> BattleRounds`.
    pub async fn request_rounds(&self) -> Result<bool> {
        self.request(|reply| Command::RequestRounds { reply }).await
    }

    pub async fn request_defend(&self) -> Result<bool> {
        self.request(|reply| Command::RequestDefend { reply }).await
    }

    pub async fn request_skip(&self) -> Result<bool> {
        self.request(|reply| Command::RequestSkip { reply }).await
    }

    pub async fn use_ability(&self, ability: AbilityId) -> Result<()> {
        self.request(|reply| Command::UseAbility { ability, reply })
            .await?
            .map_err(RuntimeError::from)
    }

    pub async fn select_target(&self, target: Option<SquadId>) -> Result<bool> {
        self.request(|reply| Command::SelectTarget { target, reply })
            .await
    }

    pub async fn acknowledge_damage(&self, ticket: DamageTicket) -> Result<bool> {
        self.request(|reply| Command::AcknowledgeDamage { ticket, reply })
            .await
    }

    pub async fn cancel_action(&self) -> Result<bool> {
        self.request(|reply| Command::CancelAction { reply }).await
    }

    pub async fn flee(&self) -> Result<bool> {
        self.request(|reply| Command::Flee { reply }).await
    }

    /// Drag-and-drop move during tactics.
    pub async fn move_unit(&self, squad: SquadId, slot: SlotId) -> Result<()> {
        self.request(|reply| Command::MoveUnit { squad, slot, reply })
            .await?
            .map_err(RuntimeError::from)
    }

    /// Query the current battle state (read-only snapshot)
    pub async fn snapshot(&self) -> Result<BattleSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Decision context for the active player squad, or `None` when the
    /// battle is not waiting on a target pick.
    pub async fn turn_request(&self) -> Result<Option<TurnRequest>> {
        self.request(|reply| Command::TurnRequest { reply }).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Phase` - Phase changes and the battle outcome
    /// - `Topic::Turn` - Round, turn and action lifecycle
    /// - `Topic::Combat` - Damage, effects and cooldowns
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use battle_runtime::Topic;
    ///
    /// let mut combat_rx = handle.subscribe(Topic::Combat);
    /// while let Ok(event) = combat_rx.recv().await {
    ///     // Animate damage
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }
}
