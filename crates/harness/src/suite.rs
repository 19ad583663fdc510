//! 스모크 실행기
//!
//! 준비 → 시나리오(순차) → 정리 순서로 한 번의 실행을 진행합니다.
//!
//! - 각 시나리오는 `tokio::time::timeout`으로 예산이 제한됩니다.
//! - `CancellationToken`이 취소되면 남은 시나리오를 건너뛰지만 정리는 실행합니다.
//! - 정리 실패는 보고서에 기록될 뿐 실행을 중단시키지 않습니다.

use std::time::Instant;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use galago_smoke_core::config::SmokeConfig;
use galago_smoke_core::metrics as m;
use galago_smoke_core::preflight::Credentials;
use galago_smoke_core::types::{ChaosConfig, InjectedFields, RunId};
use galago_smoke_platform::{DashboardProbe, ResourceControl};

use crate::binding::BindingController;
use crate::chaos::ChaosConfigurator;
use crate::context::SuiteContext;
use crate::error::HarnessError;
use crate::lifecycle::{LifecycleManager, SetupReport, SetupStepKind};
use crate::processor::ProcessorTarget;
use crate::scenario::{self, ScenarioKind};
use crate::teardown::{TeardownPlan, TeardownReport};

/// 포트와 설정을 묶은 실행기
pub struct SmokeSuite<C, D> {
    control: C,
    probe: D,
    config: SmokeConfig,
    chaos: ChaosConfig,
    injected: InjectedFields,
    processor: ProcessorTarget,
}

impl<C: ResourceControl, D: DashboardProbe> SmokeSuite<C, D> {
    pub fn new(control: C, probe: D, config: SmokeConfig) -> Result<Self, HarnessError> {
        config.validate()?;
        let chaos = config.chaos_config()?;
        let injected = config.injected_fields();
        let processor = ProcessorTarget::from_config(&config.platform);
        Ok(Self {
            control,
            probe,
            config,
            chaos,
            injected,
            processor,
        })
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    pub fn config(&self) -> &SmokeConfig {
        &self.config
    }

    pub fn chaos(&self) -> &ChaosConfig {
        &self.chaos
    }

    pub fn processor(&self) -> &ProcessorTarget {
        &self.processor
    }

    pub fn lifecycle(&self) -> LifecycleManager<'_, C> {
        LifecycleManager::new(&self.control)
    }

    pub fn binding(&self) -> BindingController<'_, C> {
        BindingController::new(&self.control, self.injected.clone())
    }

    pub fn configurator(&self) -> ChaosConfigurator<'_, D> {
        ChaosConfigurator::new(&self.probe)
    }

    /// 한 번의 실행을 진행하고 보고서를 반환합니다.
    pub async fn run(
        &self,
        run_id: RunId,
        credentials: &Credentials,
        selection: &[ScenarioKind],
        cancel: &CancellationToken,
    ) -> SuiteReport {
        let started = Instant::now();
        let mut ctx = SuiteContext::new(run_id);
        info!(
            run_id = %run_id,
            group = %ctx.group.name,
            scenarios = selection.len(),
            "starting smoke run"
        );

        let lifecycle = self.lifecycle();
        let setup = lifecycle
            .provision(&ctx, credentials, &self.config.platform)
            .await;

        let mut scenarios = Vec::with_capacity(selection.len());
        for &kind in selection {
            if let Some(reason) = skip_reason(&setup, kind, cancel) {
                warn!(scenario = kind.name(), reason = %reason, "scenario skipped");
                scenarios.push(ScenarioResult::skipped(kind, reason));
                continue;
            }
            scenarios.push(self.run_scenario(kind, &mut ctx, cancel).await);
        }

        let teardown = TeardownPlan::from_setup(&ctx, &setup, Some(credentials.state_dir()))
            .execute(&lifecycle)
            .await;

        let report = SuiteReport {
            run_id: run_id.to_string(),
            setup,
            scenarios,
            teardown,
            cancelled: cancel.is_cancelled(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            passed = report.count(ScenarioStatus::Passed),
            failed = report.count(ScenarioStatus::Failed),
            skipped = report.count(ScenarioStatus::Skipped),
            teardown_clean = report.teardown.is_clean(),
            "smoke run finished"
        );
        report
    }

    async fn run_scenario(
        &self,
        kind: ScenarioKind,
        ctx: &mut SuiteContext,
        cancel: &CancellationToken,
    ) -> ScenarioResult {
        let mut sc = ctx.next_scenario(kind.name());
        let ctx = &*ctx;
        let started = Instant::now();
        let budget = self.config.waits.scenario_budget();
        info!(scenario = kind.name(), instance = %sc.instance.name, "scenario started");

        let result = {
            let exercise = scenario::exercise(kind, self, ctx, &mut sc);
            tokio::select! {
                _ = cancel.cancelled() => Err(HarnessError::Cancelled),
                outcome = tokio::time::timeout(budget, exercise) => match outcome {
                    Ok(result) => result,
                    Err(_) => Err(HarnessError::BudgetExceeded {
                        scenario: kind.name().to_owned(),
                        budget,
                    }),
                },
            }
        };

        let cleanup_errors = scenario::clean_up(kind, self, ctx, &sc).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let (status, error) = match result {
            Ok(()) => {
                info!(scenario = kind.name(), elapsed_ms, "scenario passed");
                (ScenarioStatus::Passed, None)
            }
            Err(e) => {
                error!(scenario = kind.name(), elapsed_ms, error = %e, "scenario failed");
                (ScenarioStatus::Failed, Some(e.to_string()))
            }
        };
        metrics::counter!(m::SCENARIOS_TOTAL, m::LABEL_RESULT => status.as_str()).increment(1);

        ScenarioResult {
            name: kind,
            status,
            error,
            cleanup_errors,
            elapsed_ms,
        }
    }
}

fn skip_reason(setup: &SetupReport, kind: ScenarioKind, cancel: &CancellationToken) -> Option<String> {
    if cancel.is_cancelled() {
        return Some("run cancelled".to_owned());
    }
    if !setup.scope_ready() {
        let step = setup
            .first_failure()
            .map(|s| format!("{:?}", s.kind))
            .unwrap_or_default();
        return Some(format!("scope was not established (failed step: {step})"));
    }
    if kind.needs_workload() && !setup.succeeded(SetupStepKind::DeployWorkload) {
        return Some("workload was not deployed".to_owned());
    }
    None
}

/// 시나리오 결과 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    Skipped,
}

impl ScenarioStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// 시나리오 하나의 결과
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: ScenarioKind,
    pub status: ScenarioStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cleanup_errors: Vec<String>,
    pub elapsed_ms: u64,
}

impl ScenarioResult {
    fn skipped(kind: ScenarioKind, reason: String) -> Self {
        metrics::counter!(m::SCENARIOS_TOTAL, m::LABEL_RESULT => ScenarioStatus::Skipped.as_str())
            .increment(1);
        Self {
            name: kind,
            status: ScenarioStatus::Skipped,
            error: Some(reason),
            cleanup_errors: Vec::new(),
            elapsed_ms: 0,
        }
    }
}

/// 실행 보고서
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub run_id: String,
    pub setup: SetupReport,
    pub scenarios: Vec<ScenarioResult>,
    pub teardown: TeardownReport,
    pub cancelled: bool,
    pub elapsed_ms: u64,
}

impl SuiteReport {
    pub fn count(&self, status: ScenarioStatus) -> usize {
        self.scenarios.iter().filter(|s| s.status == status).count()
    }

    /// 취소되지 않았고 모든 시나리오가 통과했는지
    pub fn success(&self) -> bool {
        !self.cancelled
            && !self.scenarios.is_empty()
            && self.count(ScenarioStatus::Passed) == self.scenarios.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_not_success() {
        let report = SuiteReport {
            run_id: "r".to_owned(),
            setup: SetupReport::default(),
            scenarios: Vec::new(),
            teardown: TeardownReport::default(),
            cancelled: false,
            elapsed_ms: 0,
        };
        assert!(!report.success());
    }

    #[test]
    fn cancellation_skips_everything() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let reason = skip_reason(&SetupReport::default(), ScenarioKind::AddonConfigure, &cancel);
        assert_eq!(reason.as_deref(), Some("run cancelled"));
    }

    #[test]
    fn missing_scope_skips_with_reason() {
        let reason = skip_reason(
            &SetupReport::default(),
            ScenarioKind::AddonConfigure,
            &CancellationToken::new(),
        );
        assert!(reason.unwrap().contains("scope was not established"));
    }
}
