//! 최종 조건 대기
//!
//! 비동기 외부 부수효과(상태 전이, 백그라운드 프로세서 로그)를 결정적인
//! 성공/실패로 바꿉니다. 프로브는 순차적으로 호출되며 겹치지 않습니다.
//!
//! 대기는 평범한 future이므로 바깥의 `tokio::time::timeout`(시나리오 예산)이나
//! `CancellationToken`이 언제든 중단할 수 있습니다. `tokio::time`을 사용하므로
//! 테스트에서는 일시정지된 가상 시간으로 구동합니다.

use std::future::Future;
use std::time::Duration;

use regex::Regex;
use tokio::time::Instant;
use tracing::{debug, warn};

use galago_smoke_core::metrics as m;

/// 대기 정책
///
/// 백오프는 없습니다. 호출마다 간격이 고정됩니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitPolicy {
    /// 진단 메시지와 메트릭 레이블에 쓰이는 이름
    pub description: String,
    pub timeout: Duration,
    pub interval: Duration,
}

impl WaitPolicy {
    pub fn new(description: impl Into<String>, timeout: Duration, interval: Duration) -> Self {
        Self {
            description: description.into(),
            timeout,
            interval,
        }
    }

    /// 설정의 `(timeout, interval)` 쌍으로 생성합니다.
    pub fn from_pair(description: impl Into<String>, pair: (Duration, Duration)) -> Self {
        Self::new(description, pair.0, pair.1)
    }
}

/// 제한 시간 안에 조건이 성립하지 않음
///
/// 마지막으로 관측한 출력을 함께 보관하여 실패 원인을 바로 볼 수 있게 합니다.
#[derive(Debug, Clone, thiserror::Error)]
#[error(
    "timed out after {timeout:?} waiting for {description} ({attempts} attempts); last output: {last_output}"
)]
pub struct WaitTimeout {
    pub description: String,
    pub timeout: Duration,
    pub attempts: u32,
    pub last_output: String,
}

/// 출력이 `pattern`과 일치할 때까지 `probe`를 반복 호출합니다.
///
/// 첫 호출은 즉시 수행됩니다. 일치하지 않은 프로브 후 경과 시간이 `timeout`
/// 이상이면 실패합니다. N번째 호출에서 일치하면 `(N-1) * interval` 시점에
/// 반환합니다.
pub async fn wait_until<F, Fut>(
    mut probe: F,
    pattern: &Regex,
    policy: &WaitPolicy,
) -> Result<String, WaitTimeout>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = String>,
{
    let start = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        let output = probe().await;
        attempts = attempts.saturating_add(1);
        metrics::counter!(m::WAIT_ATTEMPTS_TOTAL, m::LABEL_WAIT => policy.description.clone())
            .increment(1);

        if pattern.is_match(&output) {
            debug!(
                wait = %policy.description,
                attempts,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "condition met"
            );
            return Ok(output);
        }

        if start.elapsed() >= policy.timeout {
            metrics::counter!(m::WAIT_TIMEOUTS_TOTAL, m::LABEL_WAIT => policy.description.clone())
                .increment(1);
            warn!(
                wait = %policy.description,
                attempts,
                timeout_secs = policy.timeout.as_secs(),
                "condition not met before timeout"
            );
            return Err(WaitTimeout {
                description: policy.description.clone(),
                timeout: policy.timeout,
                attempts,
                last_output: output,
            });
        }

        tokio::time::sleep(policy.interval).await;
    }
}
