//! 하네스 에러 타입
//!
//! [`HarnessError`]는 시나리오 하나를 실패시키는 모든 원인을 표현합니다.
//! 멱등성 신호("already exists" 등)는 에러가 아니라 결과 열거형으로 전달되며,
//! 정리 단계의 실패는 [`TeardownReport`](crate::teardown::TeardownReport)에
//! 수집될 뿐 전파되지 않습니다.

use std::time::Duration;

use galago_smoke_core::error::SmokeError;
use galago_smoke_platform::PlatformError;

use crate::waiter::WaitTimeout;

/// 하네스 에러
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// 명령을 실행하지 못함 (프로세스, HTTP)
    #[error("platform error: {0}")]
    Control(#[from] PlatformError),

    /// 명령이 멱등성 신호 없이 실패 종료함
    #[error("command '{command}' failed: {output}")]
    CommandFailed { command: String, output: String },

    /// 관측 결과가 기대와 다름
    #[error("assertion failed: {what}; observed: {observed}")]
    Assertion { what: String, observed: String },

    /// 최종 조건이 제한 시간 내에 성립하지 않음
    #[error(transparent)]
    Timeout(#[from] WaitTimeout),

    /// 시나리오 전체 시간 예산 초과
    #[error("scenario '{scenario}' exceeded its budget of {budget:?}")]
    BudgetExceeded { scenario: String, budget: Duration },

    /// 외부 취소 (Ctrl-C)
    #[error("run cancelled")]
    Cancelled,

    /// 설정 또는 도메인 값 에러
    #[error(transparent)]
    Config(#[from] SmokeError),
}

impl HarnessError {
    pub(crate) fn assertion(what: impl Into<String>, observed: impl Into<String>) -> Self {
        Self::Assertion {
            what: what.into(),
            observed: observed.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assertion_display_carries_observed_text() {
        let err = HarnessError::assertion("label present", "{\"VCAP_SERVICES\": {}}");
        let msg = err.to_string();
        assert!(msg.contains("label present"));
        assert!(msg.contains("VCAP_SERVICES"));
    }

    #[test]
    fn platform_error_converts() {
        let err: HarnessError = PlatformError::Http {
            url: "https://d".to_owned(),
            reason: "refused".to_owned(),
        }
        .into();
        assert!(matches!(err, HarnessError::Control(_)));
    }

    #[test]
    fn budget_display() {
        let err = HarnessError::BudgetExceeded {
            scenario: "processor-kills-bound-app".to_owned(),
            budget: Duration::from_secs(600),
        };
        assert!(err.to_string().contains("processor-kills-bound-app"));
    }
}
