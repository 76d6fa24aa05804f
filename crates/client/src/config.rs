//! Client configuration loaded from the environment.
use std::env;
use std::path::PathBuf;

use battle_runtime::RuntimeConfig;

/// How the final result is written to stdout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Configuration required to bootstrap a headless battle.
#[derive(Clone, Debug, Default)]
pub struct ClientConfig {
    pub runtime: RuntimeConfig,
    /// RON roster file; the bundled skirmish is used when unset.
    pub roster: Option<PathBuf>,
    /// Directory for a log file next to stderr output.
    pub log_dir: Option<PathBuf>,
    pub output: OutputFormat,
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables (besides those read by [`RuntimeConfig::from_env`]):
    /// - `BATTLE_ROSTER` - Path to a RON roster file
    /// - `BATTLE_LOG_DIR` - Directory for `battle.log`
    /// - `BATTLE_OUTPUT` - `text` or `json` (default: text)
    pub fn from_env() -> Self {
        let output = match env::var("BATTLE_OUTPUT")
            .map(|value| value.to_lowercase())
            .as_deref()
        {
            Ok("json") => OutputFormat::Json,
            _ => OutputFormat::Text,
        };

        Self {
            runtime: RuntimeConfig::from_env(),
            roster: env::var_os("BATTLE_ROSTER").map(PathBuf::from),
            log_dir: env::var_os("BATTLE_LOG_DIR").map(PathBuf::from),
            output,
        }
    }
}
