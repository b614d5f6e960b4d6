//! Application settings.
//!
//! Settings are read from an optional `sen.{toml,yaml,json,...}` file next to the
//! working directory, then from `SEN_*` environment variables:
//!
//! - `SEN_SHUTDOWN_TIMEOUT_MS`: how long a signal-driven shutdown is awaited
//! - `SEN_HANDLE_SIGNALS`: install the graceful shutdown plugin on build

use crate::error::Result;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

const FILE_NAME: &str = "sen";
const ENV_PREFIX: &str = "SEN";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub shutdown_timeout_ms: Option<u64>,
    pub handle_signals: bool,
}

impl Settings {
    /// Load settings from the optional `sen` file and `SEN_*` variables.
    pub fn from_env() -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(FILE_NAME).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let settings: Settings = config.try_deserialize()?;
        tracing::debug!(?settings, "Loaded settings");
        Ok(settings)
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_signal_handling(mut self, enabled: bool) -> Self {
        self.handle_signals = enabled;
        self
    }

    /// Upper bound for waiting on a signal-driven shutdown. `None` waits forever.
    pub fn shutdown_timeout(&self) -> Option<Duration> {
        self.shutdown_timeout_ms.map(Duration::from_millis)
    }
}
