//! 프로세서 종료 관측
//!
//! 카오스 프로세서가 워크로드 인스턴스를 실제로 종료하는지 세 단계로
//! 확인합니다. 각 단계는 앞 단계가 성립한 뒤에만 시작됩니다.
//!
//! 1. 인스턴스 상태가 RUNNING
//! 2. 프로세서 스코프에서 `About to kill app instance: <guid> at index: 0` 로그
//! 3. 인스턴스 상태가 DOWN

use regex::Regex;
use serde::Serialize;
use tracing::info;

use galago_smoke_core::config::{PlatformConfig, WaitsConfig};
use galago_smoke_core::types::{SubScope, WorkloadIdentity, WorkloadState};
use galago_smoke_platform::{CfCommand, ResourceControl};

use crate::error::HarnessError;
use crate::lifecycle::LifecycleManager;
use crate::waiter::{WaitPolicy, wait_until};

/// 종료 이벤트를 기록하는 프로세서 배포 위치
#[derive(Debug, Clone)]
pub struct ProcessorTarget {
    pub scope: SubScope,
    pub app: String,
}

impl ProcessorTarget {
    pub fn from_config(platform: &PlatformConfig) -> Self {
        Self {
            scope: SubScope::new(&platform.processor_org, &platform.processor_space),
            app: platform.processor_app.clone(),
        }
    }
}

/// 세 단계에서 일치한 출력
#[derive(Debug, Clone, Serialize)]
pub struct KillObservation {
    pub running: String,
    pub kill_log: String,
    pub down: String,
}

/// 인스턴스 상태 JSON에서 찾을 패턴
pub fn state_pattern(state: WorkloadState) -> Result<Regex, HarnessError> {
    Regex::new(&format!(r#""state":\s*"{}""#, state.as_str())).map_err(|e| {
        HarnessError::assertion("valid state pattern", e.to_string())
    })
}

/// 프로세서 로그에서 찾을 패턴
pub fn kill_pattern(identity: &WorkloadIdentity) -> Result<Regex, HarnessError> {
    Regex::new(&format!(
        "About to kill app instance: {} at index: 0",
        regex::escape(identity.as_str())
    ))
    .map_err(|e| HarnessError::assertion("valid kill log pattern", e.to_string()))
}

/// 명령 출력을 프로브 텍스트로 바꿉니다. 실행 실패도 텍스트로 남겨 대기를 계속합니다.
async fn probe_text<C: ResourceControl>(control: &C, command: &CfCommand) -> String {
    match control.run(command).await {
        Ok(output) => output.text(),
        Err(e) => format!("probe error: {e}"),
    }
}

/// RUNNING → 종료 로그 → DOWN 순서로 기다립니다.
///
/// 로그 조회는 프로세서 스코프에서 수행하고, 끝나면 `home` 스코프를 다시
/// 선택합니다.
pub async fn await_kill<C: ResourceControl>(
    control: &C,
    identity: &WorkloadIdentity,
    home: &SubScope,
    processor: &ProcessorTarget,
    waits: &WaitsConfig,
) -> Result<KillObservation, HarnessError> {
    let instances = &CfCommand::Curl {
        path: format!("v2/apps/{identity}/instances"),
    };

    let running_policy = WaitPolicy::from_pair("workload running", waits.running());
    let running = wait_until(
        move || probe_text(control, instances),
        &state_pattern(WorkloadState::Running)?,
        &running_policy,
    )
    .await?;
    info!(guid = %identity, "workload is running");

    let logs = &CfCommand::RecentLogs {
        app: processor.app.clone(),
    };
    let kill_policy = &WaitPolicy::from_pair("processor kill log", waits.kill_log());
    let pattern = &kill_pattern(identity)?;
    let kill_log = LifecycleManager::new(control)
        .with_scope(&processor.scope, home, || async move {
            let text = wait_until(move || probe_text(control, logs), pattern, kill_policy).await?;
            Ok(text)
        })
        .await?;
    info!(guid = %identity, processor = %processor.app, "processor reported kill");

    let down_policy = WaitPolicy::from_pair("workload down", waits.down());
    let down = wait_until(
        move || probe_text(control, instances),
        &state_pattern(WorkloadState::Down)?,
        &down_policy,
    )
    .await?;
    info!(guid = %identity, "workload is down");

    Ok(KillObservation {
        running,
        kill_log,
        down,
    })
}
