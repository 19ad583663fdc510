//! Integration tests for the `config` and `run` command handlers.
//!
//! `run` is exercised against the in-memory platform; the production ports
//! are only constructed after preconditions pass.

use std::fs;
use std::path::Path;

use serial_test::serial;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use galago_smoke_cli::cli::{OutputFormat, RunArgs};
use galago_smoke_cli::commands;
use galago_smoke_cli::output::{OutputWriter, Render};
use galago_smoke_core::config::SmokeConfigBuilder;
use galago_smoke_core::preflight::Credentials;
use galago_smoke_harness::{ScenarioKind, SmokeSuite};
use galago_smoke_platform::FakeFoundation;

// =============================================================================
// config
// =============================================================================

#[tokio::test]
async fn test_config_validate_valid_toml() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("galago-smoke.toml");
    fs::write(
        &config_path,
        "[general]\nlog_format = \"json\"\n[platform]\ndeploy_mode = \"deferred\"\n",
    )
    .expect("should write config");

    let report = commands::config::validation_report(&config_path).await;
    assert!(report.valid, "errors: {:?}", report.errors);
}

#[tokio::test]
async fn test_config_validate_reports_invalid_value() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("galago-smoke.toml");
    fs::write(&config_path, "[chaos]\nprobability = 1.5\n").expect("should write config");

    let report = commands::config::validation_report(&config_path).await;
    assert!(!report.valid);
    assert!(report.errors[0].contains("chaos"), "errors: {:?}", report.errors);
}

#[tokio::test]
async fn test_config_validate_malformed_toml() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("bad.toml");
    fs::write(&config_path, "[general\nlog_level = \"info\"\n").expect("should write config");

    let report = commands::config::validation_report(&config_path).await;
    assert!(!report.valid, "malformed TOML should be invalid");
}

#[tokio::test]
async fn test_config_validate_missing_file() {
    let report =
        commands::config::validation_report(Path::new("/nonexistent/galago-smoke.toml")).await;
    assert!(!report.valid);
    assert!(report.errors[0].contains("not found"));
}

#[tokio::test]
async fn test_missing_file_falls_back_to_defaults_for_run() {
    let config = commands::load_config_or_default(Path::new("/nonexistent/galago-smoke.toml"))
        .await
        .expect("defaults should be used");
    assert_eq!(config.platform.cli_binary, "cf");
}

#[tokio::test]
async fn test_example_config_validates() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../galago-smoke.toml.example");
    let report = commands::config::validation_report(&path).await;
    assert!(report.valid, "errors: {:?}", report.errors);
}

// =============================================================================
// run
// =============================================================================

#[tokio::test]
#[serial]
async fn test_run_without_credentials_exits_with_precondition_code() {
    // SAFETY: serialised with other env-touching tests.
    unsafe { std::env::remove_var("CF_HOME") };

    let args = RunArgs {
        scenarios: Vec::new(),
        manifest: None,
        deferred: false,
        metrics_file: None,
    };
    let err = commands::run::execute(
        args,
        Path::new("/nonexistent/galago-smoke.toml"),
        &OutputWriter::new(OutputFormat::Json),
    )
    .await
    .expect_err("missing CF_HOME should abort before any resource");

    assert_eq!(err.exit_code(), 2);
    assert!(err.to_string().contains("CF_HOME"));
}

#[tokio::test]
async fn test_run_suite_against_fake_platform() {
    let home = TempDir::new().expect("should create temp dir");
    let credentials = Credentials {
        home: home.path().to_path_buf(),
        username: "admin".to_owned(),
        password: "secret".to_owned(),
        domain: "fake.local".to_owned(),
    };
    let fake = FakeFoundation::new();
    let config = SmokeConfigBuilder::new()
        .waits(5, 10)
        .build()
        .expect("config");
    let suite = SmokeSuite::new(fake.clone(), fake.dashboard(), config).expect("suite");

    let report = commands::run::run_suite(
        &suite,
        &credentials,
        &ScenarioKind::ALL,
        &CancellationToken::new(),
    )
    .await;

    assert!(commands::run::outcome(&report).is_ok(), "report: {report:?}");

    let mut buffer = Vec::new();
    report.render_text(&mut buffer).expect("render");
    let text = String::from_utf8(buffer).expect("utf-8");
    assert!(text.contains("processor-kills-bound-app"));
    assert!(text.contains("10 passed, 0 failed, 0 skipped"));
}

#[tokio::test]
async fn test_failed_run_maps_to_exit_code_one() {
    let home = TempDir::new().expect("should create temp dir");
    let credentials = Credentials {
        home: home.path().to_path_buf(),
        username: "admin".to_owned(),
        password: "secret".to_owned(),
        domain: "fake.local".to_owned(),
    };
    let fake = FakeFoundation::new();
    fake.set_dashboard_down(true);
    let config = SmokeConfigBuilder::new()
        .waits(5, 10)
        .build()
        .expect("config");
    let suite = SmokeSuite::new(fake.clone(), fake.dashboard(), config).expect("suite");

    let report = commands::run::run_suite(
        &suite,
        &credentials,
        &[ScenarioKind::AddonConfigure],
        &CancellationToken::new(),
    )
    .await;

    let err = commands::run::outcome(&report).expect_err("dashboard down should fail");
    assert_eq!(err.exit_code(), 1);
    assert!(err.to_string().contains("1 failed"));
}
