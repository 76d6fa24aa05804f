//! Runtime configuration structures and loaders.
use std::env;
use std::time::Duration;

use battle_core::{AiTurnPolicy, BattleConfig};

/// Runtime configuration shared across the orchestrator and the battle worker.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub battle: BattleConfig,
    /// How long the worker waits before acknowledging a damage presentation
    /// step on behalf of the receiver. `None` leaves acknowledgements to the
    /// client.
    pub damage_presentation: Option<Duration>,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
}

impl RuntimeConfig {
    pub const DEFAULT_DAMAGE_PRESENTATION: Duration = Duration::from_millis(250);

    pub fn new(battle: BattleConfig) -> Self {
        Self {
            battle,
            ..Self::default()
        }
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `BATTLE_AUTO_SKIP_DELAY_MS` - AI auto-skip delay (default: 600)
    /// - `BATTLE_AWAIT_DAMAGE_ACK` - Suspend attacks until damage is acknowledged (default: true)
    /// - `BATTLE_AI_POLICY` - `auto_skip` or `attack` (default: auto_skip)
    /// - `BATTLE_MAX_ROUNDS` - Round limit, 0 disables it (default: 200)
    /// - `BATTLE_DAMAGE_PRESENTATION_MS` - Worker-side damage acknowledgement
    ///   delay, `off` disables it (default: 250)
    /// - `BATTLE_EVENT_BUFFER` - Per-topic broadcast capacity (default: 256)
    /// - `BATTLE_COMMAND_BUFFER` - Command queue size (default: 32)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(millis) = read_env::<u64>("BATTLE_AUTO_SKIP_DELAY_MS") {
            config.battle.auto_skip_delay = Duration::from_millis(millis);
        }
        if let Some(await_ack) = read_env_bool("BATTLE_AWAIT_DAMAGE_ACK") {
            config.battle.await_damage_ack = await_ack;
        }
        if let Some(policy) = read_env::<AiTurnPolicy>("BATTLE_AI_POLICY") {
            config.battle.ai_turn_policy = policy;
        }
        if let Some(max_rounds) = read_env::<u32>("BATTLE_MAX_ROUNDS") {
            config.battle.max_rounds = max_rounds;
        }

        match env::var("BATTLE_DAMAGE_PRESENTATION_MS").ok().as_deref() {
            Some("off" | "none") => config.damage_presentation = None,
            Some(value) => {
                if let Ok(millis) = value.parse::<u64>() {
                    config.damage_presentation = Some(Duration::from_millis(millis));
                }
            }
            None => {}
        }

        if let Some(capacity) = read_env::<usize>("BATTLE_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }
        if let Some(capacity) = read_env::<usize>("BATTLE_COMMAND_BUFFER") {
            config.command_buffer_size = capacity.max(1);
        }

        config
    }

    pub fn with_damage_presentation(mut self, delay: Option<Duration>) -> Self {
        self.damage_presentation = delay;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            battle: BattleConfig::default(),
            damage_presentation: Some(Self::DEFAULT_DAMAGE_PRESENTATION),
            event_buffer_size: 256,
            command_buffer_size: 32,
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

fn read_env_bool(key: &str) -> Option<bool> {
    match env::var(key).ok()?.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
