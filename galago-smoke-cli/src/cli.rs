//! CLI argument parsing using clap derive API
//!
//! Purely declarative; no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use galago_smoke_harness::ScenarioKind;

/// galago-smoke -- smoke tests for the chaos-galago add-on.
///
/// Credentials are read from CF_HOME, CF_USERNAME, CF_PASSWORD and CF_DOMAIN.
#[derive(Parser, Debug)]
#[command(name = "galago-smoke", version, about, long_about = None)]
pub struct Cli {
    /// Path to the galago-smoke.toml configuration file.
    #[arg(short, long, default_value = "galago-smoke.toml", global = true)]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision, run scenarios and tear down.
    Run(RunArgs),

    /// List the scenario catalogue.
    List,

    /// Check environment preconditions without touching the platform.
    Preflight,

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- run ----

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run only these scenarios (repeatable). Default: the whole catalogue.
    #[arg(long = "scenario", value_name = "NAME")]
    pub scenarios: Vec<ScenarioKind>,

    /// Override the workload manifest path.
    #[arg(long)]
    pub manifest: Option<String>,

    /// Push with --no-start and start the workload only when needed.
    #[arg(long)]
    pub deferred: bool,

    /// Write a Prometheus text snapshot of the run's metrics to this file.
    #[arg(long, value_name = "PATH")]
    pub metrics_file: Option<PathBuf>,
}

// ---- config ----

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, platform, chaos, binding, waits).
        #[arg(long)]
        section: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parse_run_defaults() {
        let cli = Cli::try_parse_from(["galago-smoke", "run"]).expect("should parse 'run'");
        assert_eq!(cli.config, PathBuf::from("galago-smoke.toml"));
        match cli.command {
            Commands::Run(args) => {
                assert!(args.scenarios.is_empty());
                assert!(args.manifest.is_none());
                assert!(!args.deferred);
                assert!(args.metrics_file.is_none());
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_with_scenarios() {
        let cli = Cli::try_parse_from([
            "galago-smoke",
            "run",
            "--scenario",
            "addon-configure",
            "--scenario",
            "processor-kills-bound-app",
            "--deferred",
            "--metrics-file",
            "run.prom",
        ])
        .expect("should parse scenarios");
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(
                    args.scenarios,
                    vec![
                        ScenarioKind::AddonConfigure,
                        ScenarioKind::ProcessorKillsBoundApp
                    ]
                );
                assert!(args.deferred);
                assert_eq!(args.metrics_file, Some(PathBuf::from("run.prom")));
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_scenario() {
        let result = Cli::try_parse_from(["galago-smoke", "run", "--scenario", "nope"]);
        assert!(result.is_err(), "unknown scenario should be rejected");
    }

    #[test]
    fn test_cli_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "galago-smoke",
            "list",
            "--output",
            "json",
            "--log-level",
            "debug",
        ])
        .expect("global flags should parse after subcommand");
        assert!(matches!(cli.output, OutputFormat::Json));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_cli_parse_config_show_section() {
        let cli = Cli::try_parse_from([
            "galago-smoke",
            "-c",
            "/etc/galago.toml",
            "config",
            "show",
            "--section",
            "waits",
        ])
        .expect("should parse config show");
        assert_eq!(cli.config, PathBuf::from("/etc/galago.toml"));
        match cli.command {
            Commands::Config(ConfigArgs {
                action: ConfigAction::Show { section },
            }) => assert_eq!(section.as_deref(), Some("waits")),
            _ => panic!("expected Config Show"),
        }
    }
}
