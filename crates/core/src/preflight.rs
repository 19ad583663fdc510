//! 실행 전제조건: 자격 증명과 작업 디렉토리 검사
//!
//! 어떤 리소스도 만들기 전에 검사하며, 실패하면 실행 전체를 중단합니다.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::PreconditionError;

/// cf CLI 상태 디렉토리 환경변수
pub const ENV_CF_HOME: &str = "CF_HOME";
/// 사용자 이름 환경변수
pub const ENV_CF_USERNAME: &str = "CF_USERNAME";
/// 비밀번호 환경변수
pub const ENV_CF_PASSWORD: &str = "CF_PASSWORD";
/// 대상 도메인 환경변수
pub const ENV_CF_DOMAIN: &str = "CF_DOMAIN";

/// CF_HOME 아래에 cf CLI가 만드는 상태 디렉토리
pub const CF_STATE_DIR: &str = ".cf";

/// 플랫폼 자격 증명
#[derive(Clone)]
pub struct Credentials {
    /// cf CLI 상태가 기록될 임시 디렉토리
    pub home: PathBuf,
    pub username: String,
    pub password: String,
    /// 대상 시스템 도메인 (api.<domain>)
    pub domain: String,
}

impl Credentials {
    /// 프로세스 환경에서 자격 증명을 읽고 CF_HOME을 검사합니다.
    pub fn from_env() -> Result<Self, PreconditionError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 주어진 조회 함수로 자격 증명을 읽습니다.
    ///
    /// 검사 순서는 CF_HOME, 상태 디렉토리, 나머지 자격 증명입니다.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PreconditionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &str| -> Result<String, PreconditionError> {
            match lookup(name) {
                Some(value) if !value.is_empty() => Ok(value),
                _ => Err(PreconditionError::MissingEnv {
                    name: name.to_owned(),
                }),
            }
        };

        let home = PathBuf::from(require(ENV_CF_HOME)?);
        ensure_clean_home(&home)?;

        let password = require(ENV_CF_PASSWORD)?;
        let username = require(ENV_CF_USERNAME)?;
        let domain = require(ENV_CF_DOMAIN)?;

        debug!(home = %home.display(), domain = %domain, "preconditions satisfied");

        Ok(Self {
            home,
            username,
            password,
            domain,
        })
    }

    /// 로그인 대상 API 엔드포인트
    pub fn api_endpoint(&self) -> String {
        format!("https://api.{}", self.domain)
    }

    /// cf CLI 상태 디렉토리 경로
    pub fn state_dir(&self) -> PathBuf {
        self.home.join(CF_STATE_DIR)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("home", &self.home)
            .field("username", &self.username)
            .field("password", &"***")
            .field("domain", &self.domain)
            .finish()
    }
}

/// CF_HOME에 이전 실행 상태가 없는지 확인합니다.
///
/// 기존 설정을 덮어쓸 위험이 있으면 실행을 중단합니다.
pub fn ensure_clean_home(home: &Path) -> Result<(), PreconditionError> {
    let state = home.join(CF_STATE_DIR);
    if state.exists() {
        return Err(PreconditionError::DirtyHome {
            path: state.display().to_string(),
        });
    }
    Ok(())
}
