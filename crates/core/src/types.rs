//! 도메인 타입: 한 번의 스모크 실행에서 사용하는 임시 리소스
//!
//! 모든 리소스 이름은 [`RunId`]에서 파생됩니다. 동시에 여러 실행이
//! 돌아가더라도 이름 충돌이 발생하지 않도록 하는 유일한 장치입니다.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SmokeError;

/// 테넌트 그룹 이름 접두어
pub const TENANT_GROUP_PREFIX: &str = "chaos-galago-smoke";

/// 워크로드/애드온 인스턴스 이름 접두어
pub const RESOURCE_PREFIX: &str = "galago_smoke_test";

/// 실행 단위 고유 식별자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// 무작위 v4 UUID로 새 실행 ID를 생성합니다.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// 고정된 UUID로 실행 ID를 생성합니다 (재현용).
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// 이 실행의 테넌트 그룹
    pub fn tenant_group(&self) -> TenantGroup {
        TenantGroup {
            name: format!("{TENANT_GROUP_PREFIX}-{}", self.0),
        }
    }

    /// 이 실행의 하위 스코프 (그룹과 같은 이름을 사용)
    pub fn sub_scope(&self) -> SubScope {
        let parent = self.tenant_group();
        SubScope {
            name: parent.name.clone(),
            parent,
        }
    }

    /// 이 실행의 워크로드
    pub fn workload(&self) -> Workload {
        Workload::new(format!("{RESOURCE_PREFIX}_{}", self.0))
    }

    /// 이 실행의 기본 애드온 인스턴스 이름
    pub fn addon_instance_name(&self) -> String {
        format!("{RESOURCE_PREFIX}_{}", self.0)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 테넌트 그룹 (Cloud Foundry org)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantGroup {
    pub name: String,
}

/// 테넌트 그룹 내부의 하위 스코프 (Cloud Foundry space)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScope {
    pub name: String,
    pub parent: TenantGroup,
}

impl SubScope {
    /// 임의의 org/space 쌍으로 스코프를 만듭니다.
    ///
    /// 공유 운영 스코프(예: 프로세서가 배포된 space)를 가리킬 때 사용합니다.
    pub fn new(group: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            name: scope.into(),
            parent: TenantGroup { name: group.into() },
        }
    }
}

impl fmt::Display for SubScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.parent.name, self.name)
    }
}

/// 워크로드 상태
///
/// 로컬 값은 진단용 마지막 관측값일 뿐이며, 판정에는 항상 컨트롤 플레인을
/// 다시 조회한 결과를 사용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkloadState {
    #[default]
    Unknown,
    Starting,
    Running,
    Down,
}

impl WorkloadState {
    /// 플랫폼이 보고한 상태 문자열을 해석합니다.
    ///
    /// 알 수 없는 상태(CRASHED 등)는 `Unknown`으로 취급합니다.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "STARTING" => Self::Starting,
            "RUNNING" => Self::Running,
            "DOWN" => Self::Down,
            _ => Self::Unknown,
        }
    }

    /// 플랫폼 표기 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Starting => "STARTING",
            Self::Running => "RUNNING",
            Self::Down => "DOWN",
        }
    }
}

impl fmt::Display for WorkloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 컨트롤 플레인이 부여한 워크로드 식별자 (app GUID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkloadIdentity(String);

impl WorkloadIdentity {
    /// 식별자 문자열을 검증하여 생성합니다.
    pub fn new(raw: impl Into<String>) -> Result<Self, SmokeError> {
        let raw = raw.into().trim().to_owned();
        if raw.is_empty() || raw.chars().any(char::is_whitespace) {
            return Err(SmokeError::InvalidValue(format!(
                "workload identity must be a single non-empty token, got {raw:?}"
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkloadIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 테스트 대상 워크로드 (Cloud Foundry app)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workload {
    pub name: String,
    /// 지연 해석되는 식별자
    pub identity: Option<WorkloadIdentity>,
    /// 마지막으로 관측한 상태 (진단용 캐시)
    pub last_state: WorkloadState,
}

impl Workload {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity: None,
            last_state: WorkloadState::Unknown,
        }
    }
}

/// 대시보드 URL
///
/// 프로비저닝 응답에서 발견된 값만 이 타입으로 만들어지므로, 구성 호출 전에
/// URL이 해석되어 있어야 한다는 불변식을 타입으로 보장합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardUrl(String);

impl DashboardUrl {
    pub fn new(raw: impl Into<String>) -> Result<Self, SmokeError> {
        let raw = raw.into().trim().to_owned();
        if !(raw.starts_with("http://") || raw.starts_with("https://")) {
            return Err(SmokeError::InvalidValue(format!(
                "dashboard url must be http(s), got {raw:?}"
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DashboardUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 카오스 애드온 서비스 인스턴스
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddonInstance {
    pub name: String,
    /// 한 번 발견되면 실행 동안 재사용
    pub dashboard_url: Option<DashboardUrl>,
}

impl AddonInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dashboard_url: None,
        }
    }
}

/// 바인딩 시 워크로드 환경에 주입되는 필드
///
/// 애드온 기본 플랜의 값이며 테스트는 이 값을 문자 그대로 확인합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectedFields {
    pub label: String,
    pub frequency: u32,
    pub probability: f64,
}

impl Default for InjectedFields {
    fn default() -> Self {
        Self {
            label: "chaos-galago".to_owned(),
            frequency: 5,
            probability: 0.2,
        }
    }
}

impl InjectedFields {
    /// `cf env` 출력에서 찾아야 하는 부분 문자열 목록
    pub fn env_markers(&self) -> Vec<String> {
        vec![
            format!("label\": \"{}\"", self.label),
            format!("frequency\": {}", self.frequency),
            format!("probability\": {}", self.probability),
        ]
    }
}

/// `text`에 `marker`가 값 경계에서 끝나는 형태로 나타나는지 확인합니다.
///
/// 표식 바로 뒤에 숫자나 `.`가 오면 다른 값입니다.
/// `Frequency: 1`은 `Frequency: 15`와, `Probability: 0.2`는
/// `Probability: 0.25`와 일치하지 않습니다.
pub fn contains_marker(text: &str, marker: &str) -> bool {
    text.match_indices(marker).any(|(start, _)| {
        !text[start + marker.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
    })
}

/// 워크로드와 애드온 인스턴스 사이의 바인딩
///
/// 바인딩 존재 여부는 독립 플래그가 아니라 `injected_fields`가 워크로드
/// 환경에 나타나는지로 관측합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Binding {
    pub workload: String,
    pub instance: String,
    pub injected_fields: InjectedFields,
}

/// 카오스 실패 파라미터
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChaosConfig {
    probability: f64,
    frequency: u32,
}

impl ChaosConfig {
    /// 확률은 0..=1, 빈도는 1 이상이어야 합니다.
    pub fn new(probability: f64, frequency: u32) -> Result<Self, SmokeError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(SmokeError::InvalidValue(format!(
                "probability must be within 0..=1, got {probability}"
            )));
        }
        if frequency == 0 {
            return Err(SmokeError::InvalidValue(
                "frequency must be a positive integer".to_owned(),
            ));
        }
        Ok(Self {
            probability,
            frequency,
        })
    }

    /// 실패를 결정론적으로 만드는 설정 (probability=1, frequency=1)
    pub fn always() -> Self {
        Self {
            probability: 1.0,
            frequency: 1,
        }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// 대시보드 폼 필드
    pub fn form_fields(&self) -> Vec<(String, String)> {
        vec![
            ("probability".to_owned(), self.probability.to_string()),
            ("frequency".to_owned(), self.frequency.to_string()),
        ]
    }

    /// 설정 성공 시 대시보드가 되돌려주는 문구
    pub fn expected_echo(&self) -> [String; 2] {
        [
            format!("Probability: {}", self.probability),
            format!("Frequency: {}", self.frequency),
        ]
    }
}

/// 워크로드 배포 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployMode {
    /// 배포 후 즉시 시작
    #[default]
    Start,
    /// 배포만 하고 시작은 바인딩 이후로 미룸
    Deferred,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_requires_value_boundary() {
        assert!(contains_marker("<p>Frequency: 5</p>", "Frequency: 5"));
        assert!(contains_marker("Probability: 0.2\n", "Probability: 0.2"));
        assert!(contains_marker("Frequency: 50 Frequency: 5", "Frequency: 5"));
        assert!(!contains_marker("Frequency: 50", "Frequency: 5"));
        assert!(!contains_marker("Probability: 0.25", "Probability: 0.2"));
        assert!(!contains_marker("Probability: 1.5", "Probability: 1"));
        assert!(!contains_marker("\"frequency\": 50,", "frequency\": 5"));
    }

    #[test]
    fn run_id_serializes_as_uuid_string() {
        let run = RunId::generate();
        let json = serde_json::to_string(&run).unwrap();
        assert_eq!(json, format!("\"{run}\""));
        let back: RunId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, run);
    }

    #[test]
    fn run_names_share_the_run_id() {
        let run = RunId::generate();
        let id = run.to_string();
        assert!(run.tenant_group().name.ends_with(&id));
        assert!(run.workload().name.ends_with(&id));
        assert!(run.addon_instance_name().ends_with(&id));
        assert_eq!(run.sub_scope().name, run.tenant_group().name);
        assert_eq!(run.sub_scope().parent, run.tenant_group());
    }

    #[test]
    fn distinct_runs_never_collide() {
        let a = RunId::generate();
        let b = RunId::generate();
        assert_ne!(a.tenant_group(), b.tenant_group());
        assert_ne!(a.workload().name, b.workload().name);
    }

    #[test]
    fn workload_state_parse() {
        assert_eq!(WorkloadState::parse("RUNNING"), WorkloadState::Running);
        assert_eq!(WorkloadState::parse(" down "), WorkloadState::Down);
        assert_eq!(WorkloadState::parse("STARTING"), WorkloadState::Starting);
        assert_eq!(WorkloadState::parse("CRASHED"), WorkloadState::Unknown);
    }

    #[test]
    fn workload_identity_rejects_blank() {
        assert!(WorkloadIdentity::new("  ").is_err());
        assert!(WorkloadIdentity::new("abc def").is_err());
        let id = WorkloadIdentity::new("6f1c-42\n").unwrap();
        assert_eq!(id.as_str(), "6f1c-42");
    }

    #[test]
    fn dashboard_url_requires_http_scheme() {
        assert!(DashboardUrl::new("ftp://x").is_err());
        let url = DashboardUrl::new(" https://galago.example.com/dashboard/1 ").unwrap();
        assert_eq!(url.as_str(), "https://galago.example.com/dashboard/1");
    }

    #[test]
    fn injected_field_markers_match_default_plan() {
        let markers = InjectedFields::default().env_markers();
        assert_eq!(
            markers,
            vec![
                "label\": \"chaos-galago\"".to_owned(),
                "frequency\": 5".to_owned(),
                "probability\": 0.2".to_owned(),
            ]
        );
    }

    #[test]
    fn chaos_config_bounds() {
        assert!(ChaosConfig::new(1.5, 1).is_err());
        assert!(ChaosConfig::new(-0.1, 1).is_err());
        assert!(ChaosConfig::new(f64::NAN, 1).is_err());
        assert!(ChaosConfig::new(0.5, 0).is_err());
        assert!(ChaosConfig::new(0.0, 1).is_ok());
    }

    #[test]
    fn chaos_config_plain_text_formatting() {
        let always = ChaosConfig::always();
        assert_eq!(
            always.expected_echo(),
            ["Probability: 1".to_owned(), "Frequency: 1".to_owned()]
        );
        assert_eq!(
            always.form_fields(),
            vec![
                ("probability".to_owned(), "1".to_owned()),
                ("frequency".to_owned(), "1".to_owned()),
            ]
        );

        let partial = ChaosConfig::new(0.2, 5).unwrap();
        assert_eq!(partial.expected_echo()[0], "Probability: 0.2");
    }

    #[test]
    fn deploy_mode_serde_is_lowercase() {
        let json = serde_json::to_string(&DeployMode::Deferred).unwrap();
        assert_eq!(json, "\"deferred\"");
    }
}
