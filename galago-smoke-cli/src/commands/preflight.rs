//! `galago-smoke preflight` command handler
//!
//! Checks credentials and CF_HOME without touching the platform.

use std::io::Write;

use serde::Serialize;
use tracing::info;

use galago_smoke_core::error::PreconditionError;
use galago_smoke_core::preflight::Credentials;

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `preflight` command against the process environment.
pub fn execute(writer: &OutputWriter) -> Result<(), CliError> {
    let result = Credentials::from_env();
    let report = PreflightReport::from_result(&result);
    writer.render(&report)?;
    result?;
    info!("preconditions satisfied");
    Ok(())
}

/// Precondition report. Never carries the password.
#[derive(Debug, Serialize)]
pub struct PreflightReport {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PreflightReport {
    pub fn from_result(result: &Result<Credentials, PreconditionError>) -> Self {
        match result {
            Ok(credentials) => Self {
                ready: true,
                api_endpoint: Some(credentials.api_endpoint()),
                username: Some(credentials.username.clone()),
                home: Some(credentials.home.display().to_string()),
                error: None,
            },
            Err(e) => Self {
                ready: false,
                api_endpoint: None,
                username: None,
                home: None,
                error: Some(e.to_string()),
            },
        }
    }
}

impl Render for PreflightReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if self.ready {
            writeln!(w, "Preflight: {}", "READY".green().bold())?;
        } else {
            writeln!(w, "Preflight: {}", "NOT READY".red().bold())?;
        }
        if let Some(api) = &self.api_endpoint {
            writeln!(w, "  API:      {api}")?;
        }
        if let Some(user) = &self.username {
            writeln!(w, "  User:     {user}")?;
        }
        if let Some(home) = &self.home {
            writeln!(w, "  CF_HOME:  {home}")?;
        }
        if let Some(err) = &self.error {
            writeln!(w, "  Error:    {}", err.red())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_with(home: &std::path::Path) -> HashMap<&'static str, String> {
        HashMap::from([
            ("CF_HOME", home.display().to_string()),
            ("CF_USERNAME", "admin".to_owned()),
            ("CF_PASSWORD", "hunter2".to_owned()),
            ("CF_DOMAIN", "bosh-lite.com".to_owned()),
        ])
    }

    #[test]
    fn test_ready_report_hides_password() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let vars = lookup_with(dir.path());
        let result = Credentials::from_lookup(|k| vars.get(k).cloned());
        let report = PreflightReport::from_result(&result);

        assert!(report.ready);
        assert_eq!(report.api_endpoint.as_deref(), Some("https://api.bosh-lite.com"));
        let json = serde_json::to_string(&report).expect("serialize");
        assert!(!json.contains("hunter2"));
    }

    #[test]
    fn test_dirty_home_is_not_ready() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        std::fs::create_dir(dir.path().join(".cf")).expect("create state dir");
        let vars = lookup_with(dir.path());
        let result = Credentials::from_lookup(|k| vars.get(k).cloned());
        let report = PreflightReport::from_result(&result);

        assert!(!report.ready);
        assert!(report.error.as_deref().is_some_and(|e| e.contains(".cf")));
    }
}
