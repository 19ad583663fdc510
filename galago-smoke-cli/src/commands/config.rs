//! `galago-smoke config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use galago_smoke_core::config::SmokeConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer).await,
        ConfigAction::Show { section } => execute_show(config_path, section, writer).await,
    }
}

/// Load and validate the file, reporting any error.
async fn execute_validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let report = validation_report(config_path).await;
    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }
    Ok(())
}

pub async fn validation_report(config_path: &Path) -> ConfigValidationReport {
    let errors = match SmokeConfig::load(config_path).await {
        Ok(_) => Vec::new(),
        Err(e) => vec![e.to_string()],
    };
    ConfigValidationReport {
        source: config_path.display().to_string(),
        valid: errors.is_empty(),
        errors,
    }
}

/// Show the effective configuration (file + env overrides + defaults).
///
/// The file holds no credentials, so nothing needs redacting.
async fn execute_show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let config = super::load_config_or_default(config_path).await?;
    let report = show_report(&config, config_path, section)?;
    writer.render(&report)?;
    Ok(())
}

pub fn show_report(
    config: &SmokeConfig,
    config_path: &Path,
    section: Option<String>,
) -> Result<ConfigReport, CliError> {
    let (rendered, value) = match section.as_deref() {
        None => (toml::to_string_pretty(config), serde_json::to_value(config)?),
        Some("general") => (
            toml::to_string_pretty(&config.general),
            serde_json::to_value(&config.general)?,
        ),
        Some("platform") => (
            toml::to_string_pretty(&config.platform),
            serde_json::to_value(&config.platform)?,
        ),
        Some("chaos") => (
            toml::to_string_pretty(&config.chaos),
            serde_json::to_value(&config.chaos)?,
        ),
        Some("binding") => (
            toml::to_string_pretty(&config.binding),
            serde_json::to_value(&config.binding)?,
        ),
        Some("waits") => (
            toml::to_string_pretty(&config.waits),
            serde_json::to_value(&config.waits)?,
        ),
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown section: {other} (expected: general, platform, chaos, binding, waits)"
            )));
        }
    };

    Ok(ConfigReport {
        source: config_path.display().to_string(),
        section,
        config: value,
        config_toml: rendered.unwrap_or_else(|e| format!("(serialization error: {e})")),
    })
}

/// Configuration display report.
///
/// `config_toml` is only used for text rendering.
#[derive(Serialize)]
pub struct ConfigReport {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub config: serde_json::Value,
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        match &self.section {
            Some(section) => writeln!(
                w,
                "Configuration {} (source: {})",
                format!("[{section}]").bold(),
                self.source
            )?,
            None => writeln!(w, "Configuration (source: {})", self.source.bold())?,
        }
        writeln!(w)?;
        write!(w, "{}", self.config_toml)
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    pub source: String,
    pub valid: bool,
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;
        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }
        Ok(())
    }
}
