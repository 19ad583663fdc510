//! 메트릭 상수
//!
//! 모든 메트릭의 이름을 중앙에서 정의합니다. 각 크레이트는 이 상수로
//! `metrics::counter!()` 매크로를 호출합니다. 레코더가 설치되지 않으면
//! 호출은 아무 일도 하지 않습니다. CLI는 `run --metrics-file`에서
//! Prometheus 레코더를 설치합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `galago_smoke_`
//! - 접미어: `_total` (counter)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// cf 명령 이름 레이블 키
pub const LABEL_COMMAND: &str = "command";

/// 대기 지점 레이블 키
pub const LABEL_WAIT: &str = "wait";

/// 결과 레이블 키 (passed, failed, skipped)
pub const LABEL_RESULT: &str = "result";

// ─── 플랫폼 ────────────────────────────────────────────────────────

/// 실행된 cf 명령 수 (counter, label: command)
pub const PLATFORM_COMMANDS_TOTAL: &str = "galago_smoke_platform_commands_total";

/// 비정상 종료한 cf 명령 수 (counter, label: command)
pub const PLATFORM_COMMAND_FAILURES_TOTAL: &str = "galago_smoke_platform_command_failures_total";

// ─── 하네스 ────────────────────────────────────────────────────────

/// 대기 중 수행한 프로브 횟수 (counter, label: wait)
pub const WAIT_ATTEMPTS_TOTAL: &str = "galago_smoke_wait_attempts_total";

/// 타임아웃으로 끝난 대기 수 (counter, label: wait)
pub const WAIT_TIMEOUTS_TOTAL: &str = "galago_smoke_wait_timeouts_total";

/// 실패한 정리 작업 수 (counter)
pub const TEARDOWN_FAILURES_TOTAL: &str = "galago_smoke_teardown_failures_total";

/// 시나리오 결과 수 (counter, label: result)
pub const SCENARIOS_TOTAL: &str = "galago_smoke_scenarios_total";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명을 등록합니다.
///
/// 전역 레코더를 설치한 뒤 한 번 호출합니다.
pub fn describe_all() {
    use metrics::describe_counter;

    describe_counter!(
        PLATFORM_COMMANDS_TOTAL,
        "Total number of cf commands executed"
    );
    describe_counter!(
        PLATFORM_COMMAND_FAILURES_TOTAL,
        "cf commands that exited with a non-zero status"
    );
    describe_counter!(WAIT_ATTEMPTS_TOTAL, "Probes issued while waiting for a condition");
    describe_counter!(WAIT_TIMEOUTS_TOTAL, "Waits that ended without a match");
    describe_counter!(TEARDOWN_FAILURES_TOTAL, "Teardown actions that failed");
    describe_counter!(SCENARIOS_TOTAL, "Scenario results by outcome");
}
