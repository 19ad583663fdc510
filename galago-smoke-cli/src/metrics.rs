//! 실행 메트릭 스냅샷
//!
//! `run --metrics-file`이 주어지면 Prometheus 레코더를 설치하고, 정리까지
//! 끝난 뒤 텍스트 노출 형식으로 파일에 기록합니다. 실행 시간이 짧아 HTTP
//! 리스너는 열지 않습니다.

use std::path::Path;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

use crate::error::CliError;

/// 전역 레코더를 설치합니다. 프로세스당 한 번만 호출합니다.
pub fn install_recorder() -> Result<PrometheusHandle, CliError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| CliError::Command(format!("failed to install metrics recorder: {e}")))?;
    galago_smoke_core::metrics::describe_all();
    Ok(handle)
}

/// 현재까지 기록된 메트릭을 파일에 씁니다.
pub async fn write_snapshot(handle: &PrometheusHandle, path: &Path) -> Result<(), CliError> {
    tokio::fs::write(path, handle.render()).await?;
    info!(path = %path.display(), "metrics snapshot written");
    Ok(())
}
