//! Logging initialization for galago-smoke.
//!
//! Configures `tracing-subscriber` from the `[general]` section of
//! `SmokeConfig`. Logs go to stderr so stdout stays reserved for reports.

use std::path::Path;

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use galago_smoke_core::config::{GeneralConfig, SmokeConfig};

/// Resolve the `[general]` section used for logging.
///
/// Runs before the subscriber exists, so a broken config falls back to the
/// defaults here; the command itself reports the config error afterwards.
pub async fn general_config(config_path: &Path, log_level: Option<&str>) -> GeneralConfig {
    let mut general = match SmokeConfig::from_file(config_path).await {
        Ok(mut config) => {
            config.apply_env_overrides();
            config.general
        }
        Err(_) => GeneralConfig::default(),
    };
    if let Some(level) = log_level {
        general.log_level = level.to_owned();
    }
    general
}

/// Initialize the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros are used.
///
/// # Formats
///
/// * `"json"` - Machine-parseable JSON lines
/// * `"pretty"` - Human-readable output
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .try_init()
                .map_err(|e| {
                    anyhow::anyhow!("failed to initialize JSON tracing subscriber: {}", e)
                })?;
        }
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr),
                )
                .try_init()
                .map_err(|e| {
                    anyhow::anyhow!("failed to initialize pretty tracing subscriber: {}", e)
                })?;
        }
        _ => {
            return Err(anyhow::anyhow!(
                "unknown log format '{}', expected 'json' or 'pretty'",
                config.log_format
            ));
        }
    }

    Ok(())
}
