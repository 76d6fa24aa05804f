//! High-level runtime orchestrator.
//!
//! The runtime owns the battle worker, wires up command/event channels, and
//! exposes a builder-based API for clients to drive a battle to completion.

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use battle_core::{Battle, BattlePhase, BattleResult, Suspension};

use crate::api::{BattleHandle, PlayerDecision, PlayerProvider, Result, RuntimeError, TurnRequest};
use crate::config::RuntimeConfig;
use crate::events::{Event, EventBus, Topic};
use crate::workers::{BattleWorker, Command};

/// Main runtime that orchestrates one battle.
///
/// Design: Runtime owns the worker and consults the player provider.
/// [`BattleHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: BattleHandle,
    config: RuntimeConfig,

    // Injected by the user; required only once a player decision is due.
    player_provider: Option<Box<dyn PlayerProvider>>,

    // Progress notifications used to wait for timers.
    turn_rx: broadcast::Receiver<Event>,
    phase_rx: broadcast::Receiver<Event>,

    worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> BattleHandle {
        self.handle.clone()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Subscribe to battle events on `topic`
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.handle.subscribe(topic)
    }

    /// Set the player decision provider
    pub fn set_player_provider(&mut self, provider: impl PlayerProvider + 'static) {
        self.player_provider = Some(Box::new(provider));
    }

    /// Advances the battle by one decision or one wait.
    ///
    /// Starts the battle and requests rounds when needed, asks the player
    /// provider whenever a player squad waits on a target, and otherwise
    /// waits for the worker's timers to make progress. Returns the result
    /// once the battle is finished.
    pub async fn step(&mut self) -> Result<Option<BattleResult>> {
        let snapshot = self.handle.snapshot().await?;
        if let Some(result) = snapshot.result {
            return Ok(Some(result));
        }

        match snapshot.phase {
            BattlePhase::Loading => {
                self.handle.start().await?;
                return Ok(None);
            }
            BattlePhase::Tactics => {
                self.handle.request_rounds().await?;
                return Ok(None);
            }
            BattlePhase::BattleRounds | BattlePhase::Results => {}
        }

        match snapshot.pending.map(|pending| pending.suspension) {
            Some(Suspension::AwaitingTarget) => {
                if let Some(request) = self.handle.turn_request().await? {
                    self.decide(&request).await?;
                    return Ok(None);
                }
            }
            Some(Suspension::AwaitingDamageAck(ticket)) if self.config.damage_presentation.is_none() => {
                self.provider()?.present_damage(ticket).await?;
                self.handle.acknowledge_damage(ticket).await?;
                return Ok(None);
            }
            _ => {}
        }

        self.wait_for_progress().await?;
        Ok(None)
    }

    /// Run the battle to completion
    pub async fn run(&mut self) -> Result<BattleResult> {
        loop {
            if let Some(result) = self.step().await? {
                info!(target: "runtime::worker", status = %result.status, rounds = result.rounds, "battle complete");
                return Ok(result);
            }
        }
    }

    /// Shutdown the runtime gracefully
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);
        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)
    }

    fn provider(&self) -> Result<&dyn PlayerProvider> {
        self.player_provider
            .as_deref()
            .ok_or(RuntimeError::ProviderNotSet)
    }

    async fn decide(&self, request: &TurnRequest) -> Result<()> {
        let decision = self.provider()?.decide(request).await?;
        debug!(target: "runtime::worker", squad = %request.actor, ?decision, "player decided");

        let accepted = match decision {
            PlayerDecision::Target(target) => self.handle.select_target(target).await?,
            PlayerDecision::Defend => self.handle.request_defend().await?,
            PlayerDecision::Skip => self.handle.request_skip().await?,
            PlayerDecision::Flee => self.handle.flee().await?,
            PlayerDecision::UseAbility(ability) => match self.handle.use_ability(ability).await {
                Ok(()) => true,
                Err(RuntimeError::Battle(error)) => {
                    warn!(target: "runtime::worker", %ability, %error, "ability rejected");
                    false
                }
                Err(error) => return Err(error),
            },
        };

        if !accepted {
            // Rejected decisions spend the turn on the suggested target.
            warn!(target: "runtime::worker", squad = %request.actor, ?decision, "decision rejected, using suggested target");
            self.handle.select_target(request.suggestion).await?;
        }
        Ok(())
    }

    async fn wait_for_progress(&mut self) -> Result<()> {
        let received = tokio::select! {
            received = self.turn_rx.recv() => received,
            received = self.phase_rx.recv() => received,
        };
        match received {
            Ok(_) | Err(RecvError::Lagged(_)) => Ok(()),
            Err(RecvError::Closed) => Err(RuntimeError::EventStreamClosed),
        }
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    battle: Option<Battle>,
    player_provider: Option<Box<dyn PlayerProvider>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            battle: None,
            player_provider: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the battle the worker will own (required)
    pub fn battle(mut self, battle: Battle) -> Self {
        self.battle = Some(battle);
        self
    }

    /// Set player decision provider (optional)
    pub fn player_provider(mut self, provider: impl PlayerProvider + 'static) -> Self {
        self.player_provider = Some(Box::new(provider));
        self
    }

    /// Build the runtime and spawn the battle worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<Runtime> {
        let battle = self.battle.ok_or(RuntimeError::MissingBattle)?;

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);

        let handle = BattleHandle::new(command_tx, event_bus.clone());
        let turn_rx = event_bus.subscribe(Topic::Turn);
        let phase_rx = event_bus.subscribe(Topic::Phase);

        let worker = BattleWorker::new(
            battle,
            command_rx,
            event_bus,
            self.config.damage_presentation,
        );
        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        Ok(Runtime {
            handle,
            config: self.config,
            player_provider: self.player_provider,
            turn_rx,
            phase_rx,
            worker_handle,
        })
    }
}
