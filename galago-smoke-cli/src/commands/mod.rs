//! Command handlers -- one module per subcommand

pub mod config;
pub mod list;
pub mod preflight;
pub mod run;

use std::path::Path;

use tracing::warn;

use galago_smoke_core::config::SmokeConfig;
use galago_smoke_core::error::{ConfigError, SmokeError};

use crate::error::CliError;

/// Load the config file, or fall back to defaults (plus env overrides) when
/// the file does not exist.
pub async fn load_config_or_default(config_path: &Path) -> Result<SmokeConfig, CliError> {
    match SmokeConfig::load(config_path).await {
        Ok(config) => Ok(config),
        Err(SmokeError::Config(ConfigError::FileNotFound { path })) => {
            warn!(path = %path, "config file not found; using defaults");
            let mut config = SmokeConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
        Err(e) => Err(e.into()),
    }
}
