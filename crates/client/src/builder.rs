//! Client builder with dependency injection pattern.

use anyhow::{Context, Result};
use battle_runtime::Runtime;

use crate::Client;

/// Builder for constructing a Client with proper validation.
///
/// The runtime is required; the event reporter is on by default.
pub struct ClientBuilder {
    runtime: Option<Runtime>,
    report_events: bool,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            runtime: None,
            report_events: true,
        }
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the runtime (required).
    pub fn runtime(mut self, runtime: Runtime) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Log every runtime event while the battle runs.
    pub fn report_events(mut self, enabled: bool) -> Self {
        self.report_events = enabled;
        self
    }

    pub fn build(self) -> Result<Client> {
        let runtime = self
            .runtime
            .context("Runtime is required. Use .runtime() to set it.")?;

        Ok(Client {
            runtime,
            report_events: self.report_events,
        })
    }
}
