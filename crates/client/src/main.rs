//! Battle client binary.
//!
//! Composition root for a headless battle: loads `.env`, installs logging,
//! loads the roster (`BATTLE_ROSTER` or the bundled skirmish), runs the
//! battle to completion and prints the result.
//!
//! ```bash
//! BATTLE_AI_POLICY=attack BATTLE_OUTPUT=json cargo run -p battle-client
//! ```

use anyhow::Result;
use battle_client::{Client, ClientConfig, OutputFormat, bootstrap, logging};
use battle_core::{BattleResult, Side};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = ClientConfig::from_env();
    let _guard = logging::setup_logging(config.log_dir.as_deref())?;

    tracing::info!("Starting battle client");
    tracing::info!("AI turn policy: {}", config.runtime.battle.ai_turn_policy);
    if let Some(roster) = &config.roster {
        tracing::info!("Roster: {}", roster.display());
    }

    let runtime = bootstrap(&config)?;
    let result = Client::builder().runtime(runtime).build()?.run().await?;

    match config.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_summary(&result),
    }

    tracing::info!("Client shutdown complete");
    Ok(())
}

fn print_summary(result: &BattleResult) {
    println!("{} after {} rounds", result.status, result.rounds);
    for side in [Side::Friendly, Side::Enemy] {
        let squads = match side {
            Side::Friendly => &result.friendly,
            Side::Enemy => &result.enemy,
        };
        println!("{side}:");
        for squad in squads {
            println!("  {:<16} {:>4} units {:>5} hp", squad.name, squad.count, squad.health);
        }
    }
}
