//! 설정 관리: galago-smoke.toml 파싱 및 런타임 설정
//!
//! [`SmokeConfig`]는 스모크 실행에 필요한 모든 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`GALAGO_SMOKE_PLATFORM_CLI_BINARY=/usr/local/bin/cf` 형식)
//! 3. 설정 파일 (`galago-smoke.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! 자격 증명(CF_USERNAME 등)은 설정 파일이 아니라 [`crate::preflight`]에서
//! 프로세스 환경으로부터 읽습니다.
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), galago_smoke_core::error::SmokeError> {
//! use galago_smoke_core::config::SmokeConfig;
//!
//! let config = SmokeConfig::load("galago-smoke.toml").await?;
//! let config = SmokeConfig::parse("[chaos]\nprobability = 1.0")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, SmokeError};
use crate::types::{ChaosConfig, DeployMode, InjectedFields};

/// galago-smoke 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmokeConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 플랫폼(cf CLI) 설정
    #[serde(default)]
    pub platform: PlatformConfig,
    /// 프로세서 검증에 사용할 카오스 파라미터
    #[serde(default)]
    pub chaos: ChaosSection,
    /// 바인딩 시 기대하는 주입 필드
    #[serde(default)]
    pub binding: BindingSection,
    /// 대기 정책
    #[serde(default)]
    pub waits: WaitsConfig,
}

impl SmokeConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SmokeError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SmokeError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SmokeError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                SmokeError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, SmokeError> {
        toml::from_str(toml_str).map_err(|e| {
            SmokeError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `GALAGO_SMOKE_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "GALAGO_SMOKE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "GALAGO_SMOKE_GENERAL_LOG_FORMAT");

        // Platform
        override_string(
            &mut self.platform.cli_binary,
            "GALAGO_SMOKE_PLATFORM_CLI_BINARY",
        );
        override_bool(
            &mut self.platform.skip_ssl_validation,
            "GALAGO_SMOKE_PLATFORM_SKIP_SSL_VALIDATION",
        );
        override_string(
            &mut self.platform.manifest_path,
            "GALAGO_SMOKE_PLATFORM_MANIFEST_PATH",
        );
        override_string(
            &mut self.platform.service_offering,
            "GALAGO_SMOKE_PLATFORM_SERVICE_OFFERING",
        );
        override_string(
            &mut self.platform.service_plan,
            "GALAGO_SMOKE_PLATFORM_SERVICE_PLAN",
        );
        override_string(
            &mut self.platform.processor_app,
            "GALAGO_SMOKE_PLATFORM_PROCESSOR_APP",
        );
        override_string(
            &mut self.platform.processor_org,
            "GALAGO_SMOKE_PLATFORM_PROCESSOR_ORG",
        );
        override_string(
            &mut self.platform.processor_space,
            "GALAGO_SMOKE_PLATFORM_PROCESSOR_SPACE",
        );
        override_u64(
            &mut self.platform.command_timeout_secs,
            "GALAGO_SMOKE_PLATFORM_COMMAND_TIMEOUT_SECS",
        );

        // Chaos
        override_f64(&mut self.chaos.probability, "GALAGO_SMOKE_CHAOS_PROBABILITY");
        override_u32(&mut self.chaos.frequency, "GALAGO_SMOKE_CHAOS_FREQUENCY");

        // Waits
        override_u64(
            &mut self.waits.running_timeout_secs,
            "GALAGO_SMOKE_WAITS_RUNNING_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.waits.kill_log_timeout_secs,
            "GALAGO_SMOKE_WAITS_KILL_LOG_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.waits.down_timeout_secs,
            "GALAGO_SMOKE_WAITS_DOWN_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.waits.scenario_budget_secs,
            "GALAGO_SMOKE_WAITS_SCENARIO_BUDGET_SECS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), SmokeError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.platform.cli_binary.is_empty() {
            return Err(invalid("platform.cli_binary", "must not be empty"));
        }
        if self.platform.manifest_path.is_empty() {
            return Err(invalid("platform.manifest_path", "must not be empty"));
        }
        if self.platform.service_offering.is_empty() || self.platform.service_plan.is_empty() {
            return Err(invalid(
                "platform.service_offering",
                "offering and plan must not be empty",
            ));
        }
        if self.platform.command_timeout_secs == 0 {
            return Err(invalid("platform.command_timeout_secs", "must be > 0"));
        }

        ChaosConfig::new(self.chaos.probability, self.chaos.frequency)
            .map_err(|e| invalid("chaos", e.to_string()))?;

        if !(0.0..=1.0).contains(&self.binding.probability) {
            return Err(invalid("binding.probability", "must be within 0..=1"));
        }

        for (field, timeout, interval_ms) in [
            (
                "waits.running",
                self.waits.running_timeout_secs,
                self.waits.running_interval_ms,
            ),
            (
                "waits.kill_log",
                self.waits.kill_log_timeout_secs,
                self.waits.kill_log_interval_ms,
            ),
            (
                "waits.down",
                self.waits.down_timeout_secs,
                self.waits.down_interval_ms,
            ),
        ] {
            if timeout == 0 || interval_ms == 0 {
                return Err(invalid(field, "timeout and interval must be > 0"));
            }
            if interval_ms > timeout.saturating_mul(1000) {
                return Err(invalid(field, "interval must not exceed timeout"));
            }
        }

        if self.waits.scenario_budget_secs == 0 {
            return Err(invalid("waits.scenario_budget_secs", "must be > 0"));
        }

        Ok(())
    }

    /// 검증된 카오스 파라미터
    pub fn chaos_config(&self) -> Result<ChaosConfig, SmokeError> {
        ChaosConfig::new(self.chaos.probability, self.chaos.frequency)
    }

    /// 기대 주입 필드
    pub fn injected_fields(&self) -> InjectedFields {
        InjectedFields {
            label: self.binding.label.clone(),
            frequency: self.binding.frequency,
            probability: self.binding.probability,
        }
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> SmokeError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 플랫폼 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// cf CLI 실행 파일
    pub cli_binary: String,
    /// 자체 서명 인증서 허용 (login 및 대시보드 HTTP 호출)
    pub skip_ssl_validation: bool,
    /// 워크로드 배포 매니페스트 경로
    pub manifest_path: String,
    /// 배포 방식 (start, deferred)
    pub deploy_mode: DeployMode,
    /// 마켓플레이스 서비스 이름
    pub service_offering: String,
    /// 서비스 플랜
    pub service_plan: String,
    /// 킬 이벤트를 기록하는 프로세서 앱 이름
    pub processor_app: String,
    /// 프로세서가 배포된 org
    pub processor_org: String,
    /// 프로세서가 배포된 space
    pub processor_space: String,
    /// 단일 cf 명령 타임아웃 (초)
    pub command_timeout_secs: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            cli_binary: "cf".to_owned(),
            skip_ssl_validation: true,
            manifest_path: "fixtures/galago_smoke_test/manifest.yml".to_owned(),
            deploy_mode: DeployMode::Start,
            service_offering: "chaos-galago".to_owned(),
            service_plan: "default".to_owned(),
            processor_app: "chaos-galago-processor".to_owned(),
            processor_org: "chaos-galago".to_owned(),
            processor_space: "chaos-galago".to_owned(),
            command_timeout_secs: 300,
        }
    }
}

/// 카오스 파라미터 섹션
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaosSection {
    pub probability: f64,
    pub frequency: u32,
}

impl Default for ChaosSection {
    fn default() -> Self {
        Self {
            probability: 1.0,
            frequency: 1,
        }
    }
}

/// 기본 플랜의 주입 필드
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingSection {
    pub label: String,
    pub frequency: u32,
    pub probability: f64,
}

impl Default for BindingSection {
    fn default() -> Self {
        let fields = InjectedFields::default();
        Self {
            label: fields.label,
            frequency: fields.frequency,
            probability: fields.probability,
        }
    }
}

/// 대기 정책 설정
///
/// 상태 전이와 백그라운드 스케줄러 주기는 예상 지연이 다르므로
/// 대기 지점마다 (timeout, interval) 쌍을 따로 둡니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitsConfig {
    pub running_timeout_secs: u64,
    pub running_interval_ms: u64,
    pub kill_log_timeout_secs: u64,
    pub kill_log_interval_ms: u64,
    pub down_timeout_secs: u64,
    pub down_interval_ms: u64,
    /// 시나리오 하나에 허용되는 전체 시간 (초)
    pub scenario_budget_secs: u64,
}

impl Default for WaitsConfig {
    fn default() -> Self {
        Self {
            running_timeout_secs: 180,
            running_interval_ms: 1000,
            kill_log_timeout_secs: 180,
            kill_log_interval_ms: 1000,
            down_timeout_secs: 180,
            down_interval_ms: 1000,
            scenario_budget_secs: 600,
        }
    }
}

impl WaitsConfig {
    pub fn running(&self) -> (Duration, Duration) {
        (
            Duration::from_secs(self.running_timeout_secs),
            Duration::from_millis(self.running_interval_ms),
        )
    }

    pub fn kill_log(&self) -> (Duration, Duration) {
        (
            Duration::from_secs(self.kill_log_timeout_secs),
            Duration::from_millis(self.kill_log_interval_ms),
        )
    }

    pub fn down(&self) -> (Duration, Duration) {
        (
            Duration::from_secs(self.down_timeout_secs),
            Duration::from_millis(self.down_interval_ms),
        )
    }

    pub fn scenario_budget(&self) -> Duration {
        Duration::from_secs(self.scenario_budget_secs)
    }
}

/// 설정 빌더
///
/// 테스트에서 짧은 대기 시간과 가짜 플랫폼용 값을 조립할 때 사용합니다.
#[derive(Default)]
pub struct SmokeConfigBuilder {
    config: SmokeConfig,
}

impl SmokeConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cli_binary(mut self, binary: impl Into<String>) -> Self {
        self.config.platform.cli_binary = binary.into();
        self
    }

    pub fn manifest_path(mut self, path: impl Into<String>) -> Self {
        self.config.platform.manifest_path = path.into();
        self
    }

    pub fn deploy_mode(mut self, mode: DeployMode) -> Self {
        self.config.platform.deploy_mode = mode;
        self
    }

    pub fn processor_scope(mut self, org: impl Into<String>, space: impl Into<String>) -> Self {
        self.config.platform.processor_org = org.into();
        self.config.platform.processor_space = space.into();
        self
    }

    pub fn chaos(mut self, probability: f64, frequency: u32) -> Self {
        self.config.chaos = ChaosSection {
            probability,
            frequency,
        };
        self
    }

    /// 세 대기 지점 모두에 같은 (timeout, interval)을 적용합니다.
    pub fn waits(mut self, timeout_secs: u64, interval_ms: u64) -> Self {
        self.config.waits.running_timeout_secs = timeout_secs;
        self.config.waits.running_interval_ms = interval_ms;
        self.config.waits.kill_log_timeout_secs = timeout_secs;
        self.config.waits.kill_log_interval_ms = interval_ms;
        self.config.waits.down_timeout_secs = timeout_secs;
        self.config.waits.down_interval_ms = interval_ms;
        self
    }

    pub fn scenario_budget_secs(mut self, secs: u64) -> Self {
        self.config.waits.scenario_budget_secs = secs;
        self
    }

    /// 설정을 검증하고 `SmokeConfig`를 생성합니다.
    pub fn build(self) -> Result<SmokeConfig, SmokeError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_f64(target: &mut f64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<f64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse f64 from env var, ignoring"
            ),
        }
    }
}
