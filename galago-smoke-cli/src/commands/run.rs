//! `galago-smoke run` command handler

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use galago_smoke_core::config::SmokeConfig;
use galago_smoke_core::preflight::Credentials;
use galago_smoke_core::types::{DeployMode, RunId};
use galago_smoke_harness::{
    ScenarioKind, ScenarioStatus, SmokeSuite, SuiteReport, TeardownResult,
};
use galago_smoke_platform::dashboard::DEFAULT_REQUEST_TIMEOUT;
use galago_smoke_platform::{CfCliControl, DashboardProbe, HttpDashboardProbe, ResourceControl};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `run` command.
///
/// Preconditions are checked before anything touches the platform.
pub async fn execute(
    args: RunArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let credentials = Credentials::from_env()?;

    let mut config = super::load_config_or_default(config_path).await?;
    apply_args(&mut config, &args)?;
    let selection = selection(&args);

    let control = CfCliControl::new(config.platform.cli_binary.clone())
        .with_home(credentials.home.clone())
        .with_timeout(Duration::from_secs(config.platform.command_timeout_secs));
    let probe = HttpDashboardProbe::new(config.platform.skip_ssl_validation, DEFAULT_REQUEST_TIMEOUT)?;
    let suite = SmokeSuite::new(control, probe, config)?;

    let recorder = match &args.metrics_file {
        Some(_) => Some(crate::metrics::install_recorder()?),
        None => None,
    };

    let cancel = CancellationToken::new();
    watch_interrupt(cancel.clone());

    let report = run_suite(&suite, &credentials, &selection, &cancel).await;
    writer.render(&report)?;
    if let (Some(handle), Some(path)) = (&recorder, &args.metrics_file) {
        crate::metrics::write_snapshot(handle, path).await?;
    }
    outcome(&report)
}

/// CLI flags override the file and env values.
pub fn apply_args(config: &mut SmokeConfig, args: &RunArgs) -> Result<(), CliError> {
    if let Some(manifest) = &args.manifest {
        config.platform.manifest_path = manifest.clone();
    }
    if args.deferred {
        config.platform.deploy_mode = DeployMode::Deferred;
    }
    config.validate()?;
    Ok(())
}

pub fn selection(args: &RunArgs) -> Vec<ScenarioKind> {
    if args.scenarios.is_empty() {
        ScenarioKind::ALL.to_vec()
    } else {
        args.scenarios.clone()
    }
}

/// Run the suite with a fresh run id.
pub async fn run_suite<C: ResourceControl, D: DashboardProbe>(
    suite: &SmokeSuite<C, D>,
    credentials: &Credentials,
    selection: &[ScenarioKind],
    cancel: &CancellationToken,
) -> SuiteReport {
    let run_id = RunId::generate();
    info!(run_id = %run_id, "galago-smoke run starting");
    suite.run(run_id, credentials, selection, cancel).await
}

/// Map a finished report to the process result.
pub fn outcome(report: &SuiteReport) -> Result<(), CliError> {
    if report.success() {
        return Ok(());
    }
    Err(CliError::RunFailed {
        passed: report.count(ScenarioStatus::Passed),
        failed: report.count(ScenarioStatus::Failed),
        skipped: report.count(ScenarioStatus::Skipped),
    })
}

/// The first Ctrl-C cancels the run; teardown still completes.
fn watch_interrupt(cancel: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => {
                    warn!("interrupt received; skipping remaining scenarios and tearing down");
                    cancel.cancel();
                }
                Err(e) => warn!(error = %e, "failed to install Ctrl-C handler"),
            },
            _ = cancel.cancelled() => {}
        }
    });
}

impl Render for SuiteReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Run {} ({:.1}s)",
            self.run_id.bold(),
            self.elapsed_ms as f64 / 1000.0
        )?;

        writeln!(w)?;
        writeln!(w, "Setup:")?;
        for step in &self.setup.steps {
            let mark = if step.ok { "ok".green() } else { "FAILED".red() };
            write!(w, "  {:<6} {:?}", mark, step.kind)?;
            if let Some(err) = &step.error {
                write!(w, ": {err}")?;
            }
            writeln!(w)?;
        }

        writeln!(w)?;
        writeln!(w, "Scenarios:")?;
        for result in &self.scenarios {
            let status = match result.status {
                ScenarioStatus::Passed => "PASS".green().bold(),
                ScenarioStatus::Failed => "FAIL".red().bold(),
                ScenarioStatus::Skipped => "SKIP".yellow().bold(),
            };
            write!(w, "  {status} {:<28} {:>7} ms", result.name.name(), result.elapsed_ms)?;
            if let Some(err) = &result.error {
                write!(w, "  {err}")?;
            }
            writeln!(w)?;
            for cleanup in &result.cleanup_errors {
                writeln!(w, "       cleanup: {}", cleanup.yellow())?;
            }
        }

        writeln!(w)?;
        writeln!(w, "Teardown:")?;
        for entry in &self.teardown.entries {
            match &entry.result {
                TeardownResult::Deleted => writeln!(w, "  {:<13} {}", "deleted".green(), entry.action)?,
                TeardownResult::DidNotExist => {
                    writeln!(w, "  {:<13} {}", "did not exist", entry.action)?
                }
                TeardownResult::Failed { reason } => writeln!(
                    w,
                    "  {:<13} {}: {}",
                    "failed".red(),
                    entry.action,
                    reason
                )?,
            }
        }

        writeln!(w)?;
        let summary = format!(
            "{} passed, {} failed, {} skipped",
            self.count(ScenarioStatus::Passed),
            self.count(ScenarioStatus::Failed),
            self.count(ScenarioStatus::Skipped)
        );
        if self.success() {
            writeln!(w, "Result: {} ({summary})", "PASSED".green().bold())?;
        } else if self.cancelled {
            writeln!(w, "Result: {} ({summary})", "CANCELLED".yellow().bold())?;
        } else {
            writeln!(w, "Result: {} ({summary})", "FAILED".red().bold())?;
        }
        Ok(())
    }
}
