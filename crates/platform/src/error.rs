//! 플랫폼 경계 에러 타입
//!
//! [`PlatformError`]는 cf CLI 실행과 대시보드 HTTP 호출에서 발생하는
//! 전송 계층 에러를 표현합니다. 명령이 비정상 종료한 것 자체는 에러가 아니라
//! [`CommandOutput`](crate::command::CommandOutput)의 데이터입니다.

/// 플랫폼 경계 에러
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// 명령 프로세스 생성 실패 (바이너리 없음, 권한 없음 등)
    #[error("failed to spawn '{binary} {command}': {reason}")]
    Spawn {
        binary: String,
        command: String,
        reason: String,
    },

    /// 명령이 제한 시간 내에 끝나지 않음
    #[error("command '{command}' timed out after {timeout_secs}s")]
    CommandTimedOut { command: String, timeout_secs: u64 },

    /// 대시보드 HTTP 호출 실패
    #[error("http request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    /// 출력에서 기대한 표식을 찾지 못함
    #[error("could not find '{marker}' in output of '{command}'")]
    Scrape { command: String, marker: String },

    /// 출력에서 추출한 값이 유효하지 않음
    #[error("invalid value scraped from '{command}': {reason}")]
    InvalidScrape { command: String, reason: String },
}
