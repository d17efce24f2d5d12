use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::{DEFAULT_MAX_WAIT_MS, DEFAULT_POLL_INTERVAL_MS, ENV_PREFIX};

/// Default timings handed to every wait that does not set its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    pub poll_interval_ms: u64,
    pub max_wait_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_wait_ms: DEFAULT_MAX_WAIT_MS,
        }
    }
}

impl WaitConfig {
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(anyhow::anyhow!("poll_interval_ms must be greater than 0"));
        }

        if self.poll_interval_ms > self.max_wait_ms && self.max_wait_ms > 0 {
            log::warn!(
                "poll_interval_ms ({}) exceeds max_wait_ms ({}); waits will evaluate at most twice",
                self.poll_interval_ms,
                self.max_wait_ms
            );
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    pub fn apply_overrides(&mut self, poll_interval_ms: Option<u64>, max_wait_ms: Option<u64>) {
        if let Some(poll_interval_ms) = poll_interval_ms {
            self.poll_interval_ms = poll_interval_ms;
        }

        if let Some(max_wait_ms) = max_wait_ms {
            self.max_wait_ms = max_wait_ms;
        }
    }
}

/// Load configuration: env vars > config file > defaults
pub fn load_config(config_path: Option<&Path>) -> Result<WaitConfig> {
    load_config_with_prefix(config_path, ENV_PREFIX)
}

/// Same as [`load_config`] with a custom environment prefix, e.g.
/// `MYTESTS` reads `MYTESTS_MAX_WAIT_MS`.
pub fn load_config_with_prefix(config_path: Option<&Path>, env_prefix: &str) -> Result<WaitConfig> {
    let defaults = WaitConfig::default();
    let mut builder = ::config::Config::builder()
        .set_default("poll_interval_ms", defaults.poll_interval_ms)?
        .set_default("max_wait_ms", defaults.max_wait_ms)?;

    if let Some(path) = config_path {
        if path.exists() {
            builder = builder.add_source(::config::File::from(path));
            log::info!("Loaded configuration from file: {}", path.display());
        } else {
            log::info!("Config file not found: {}, using defaults", path.display());
        }
    }

    let config: WaitConfig = builder
        .add_source(::config::Environment::with_prefix(env_prefix).try_parsing(true))
        .build()
        .context("Failed to assemble wait configuration")?
        .try_deserialize()
        .context("Failed to parse wait configuration")?;

    config
        .validate()
        .with_context(|| "Configuration validation failed")?;

    log::debug!("Final config: {config:?}");
    Ok(config)
}

/// Create a sample configuration file
pub fn create_sample_config(path: &Path) -> Result<()> {
    let config = WaitConfig::default();
    let toml_content =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    fs::write(path, toml_content)
        .with_context(|| format!("Failed to write sample config to: {}", path.display()))?;

    Ok(())
}
