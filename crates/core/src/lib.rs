//! galago-smoke 공통 크레이트
//!
//! - [`error`]: 에러 분류 (`SmokeError`, `ConfigError`, `PreconditionError`)
//! - [`config`]: `galago-smoke.toml` 설정 (`SmokeConfig`)
//! - [`preflight`]: 자격 증명과 CF_HOME 전제조건 (`Credentials`)
//! - [`types`]: 실행 단위 임시 리소스 (`RunId`, `Workload`, `ChaosConfig` 등)
//! - [`metrics`]: 메트릭 이름 상수

pub mod config;
pub mod error;
pub mod metrics;
pub mod preflight;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, PreconditionError, SmokeError};

// 설정
pub use config::{SmokeConfig, SmokeConfigBuilder};

// 전제조건
pub use preflight::Credentials;

// 도메인 타입
pub use types::{
    AddonInstance, Binding, ChaosConfig, DashboardUrl, DeployMode, InjectedFields, RunId,
    SubScope, TenantGroup, Workload, WorkloadIdentity, WorkloadState,
};
