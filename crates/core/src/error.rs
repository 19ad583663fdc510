//! 에러 타입: 도메인별 에러 정의

/// galago-smoke 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum SmokeError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 실행 전제조건 위반 (자격 증명 누락, 안전하지 않은 작업 디렉토리)
    #[error("precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    /// 도메인 값 검증 실패
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 실행 전제조건 에러
///
/// 어떤 리소스도 건드리기 전에 실행 전체를 중단시킵니다. 재시도하지 않습니다.
#[derive(Debug, thiserror::Error)]
pub enum PreconditionError {
    /// 필수 환경변수가 비어 있거나 설정되지 않음
    #[error("environment variable \"{name}\" was not set")]
    MissingEnv { name: String },

    /// CF_HOME에 이전 실행의 상태가 남아 있음
    #[error("{path} already exists; CF_HOME must be a temp directory")]
    DirtyHome { path: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_env_display_names_variable() {
        let err = PreconditionError::MissingEnv {
            name: "CF_DOMAIN".to_owned(),
        };
        assert_eq!(err.to_string(), "environment variable \"CF_DOMAIN\" was not set");
    }

    #[test]
    fn dirty_home_display_contains_path() {
        let err = PreconditionError::DirtyHome {
            path: "/tmp/home/.cf".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/home/.cf"));
        assert!(msg.contains("temp directory"));
    }

    #[test]
    fn precondition_converts_to_smoke_error() {
        let err: SmokeError = PreconditionError::MissingEnv {
            name: "CF_HOME".to_owned(),
        }
        .into();
        assert!(matches!(err, SmokeError::Precondition(_)));
        assert!(err.to_string().starts_with("precondition failed"));
    }

    #[test]
    fn config_invalid_value_display() {
        let err = ConfigError::InvalidValue {
            field: "chaos.probability".to_owned(),
            reason: "must be within 0..=1".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("chaos.probability"));
        assert!(msg.contains("0..=1"));
    }
}
