//! Headless battle client.
//!
//! # Architecture
//!
//! ```text
//! Client (composition root)
//!   ├─→ Runtime (battle worker, timers, event bus)
//!   ├─→ LogPresenter (engine render calls as log records)
//!   └─→ EventReporter (runtime events as a battle log)
//! ```
//!
//! Player squads are played by the AI provider; there is no input polling.

mod builder;
pub mod config;
pub mod logging;
pub mod presenter;
pub mod reporter;

pub use builder::ClientBuilder;
pub use config::{ClientConfig, OutputFormat};
pub use presenter::LogPresenter;
pub use reporter::EventReporter;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use battle_content::{BattleContent, RosterLoader, SKIRMISH_RON};
use battle_core::BattleResult;
use battle_runtime::{AiPlayerProvider, Runtime};

/// Top-level client container.
pub struct Client {
    runtime: Runtime,
    report_events: bool,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Runs the battle to completion and shuts the runtime down.
    pub async fn run(self) -> Result<BattleResult> {
        let reporter_task = self
            .report_events
            .then(|| tokio::spawn(EventReporter::new(&self.runtime.handle()).run()));

        let mut runtime = self.runtime;
        let result = runtime.run().await?;
        runtime.shutdown().await?;

        // The bus closes with the worker, which ends the reporter.
        if let Some(task) = reporter_task {
            match task.await {
                Ok(reported) => debug!(reported, "event reporter finished"),
                Err(e) => warn!("Event reporter failed: {}", e),
            }
        }
        Ok(result)
    }
}

/// Loads the configured roster and assembles a runtime around it.
pub fn bootstrap(config: &ClientConfig) -> Result<Runtime> {
    let content = load_content(config)?;
    debug!(squads = content.entries.len(), "roster loaded");

    let battle = content
        .into_builder(config.runtime.battle.clone())
        .presenter(LogPresenter::new())
        .with_standard_collaborators()
        .build()
        .context("Failed to build battle")?;

    Runtime::builder()
        .config(config.runtime.clone())
        .battle(battle)
        .player_provider(AiPlayerProvider)
        .build()
        .context("Failed to build runtime")
}

fn load_content(config: &ClientConfig) -> Result<BattleContent> {
    match &config.roster {
        Some(path) => RosterLoader::load(path),
        None => RosterLoader::parse(SKIRMISH_RON),
    }
}
