//! 리소스 조회 경계
//!
//! cf CLI의 사람이 읽는 출력에서 값을 추출하는 로직은 모두 여기에 둡니다.
//! 하네스는 타입이 있는 값([`WorkloadIdentity`], [`DashboardUrl`])만 받습니다.

use std::future::Future;

use galago_smoke_core::types::{DashboardUrl, WorkloadIdentity};

use crate::command::CfCommand;
use crate::control::ResourceControl;
use crate::error::PlatformError;

/// `cf service` 출력에서 대시보드 URL 앞에 오는 표식
pub const DASHBOARD_MARKER: &str = "Dashboard: ";

/// 리소스 조회 포트
pub trait ResourceDescriber: Send + Sync + 'static {
    /// 워크로드 식별자(app GUID)를 조회합니다.
    fn workload_identity(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<WorkloadIdentity, PlatformError>> + Send;

    /// 애드온 인스턴스의 대시보드 URL을 조회합니다.
    fn addon_dashboard_url(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<DashboardUrl, PlatformError>> + Send;
}

/// 모든 [`ResourceControl`]은 cf 출력을 해석하여 조회 포트를 제공합니다.
impl<C: ResourceControl> ResourceDescriber for C {
    /// `cf app <name> --guid`
    async fn workload_identity(&self, name: &str) -> Result<WorkloadIdentity, PlatformError> {
        let command = CfCommand::AppGuid {
            app: name.to_owned(),
        };
        let output = self.run(&command).await?;
        if !output.success {
            return Err(PlatformError::InvalidScrape {
                command: command.name().to_owned(),
                reason: format!("lookup of '{name}' failed: {}", output.text().trim()),
            });
        }
        WorkloadIdentity::new(output.stdout.trim()).map_err(|e| PlatformError::InvalidScrape {
            command: command.name().to_owned(),
            reason: e.to_string(),
        })
    }

    /// `cf service <name>` 출력의 `Dashboard:` 줄
    async fn addon_dashboard_url(&self, name: &str) -> Result<DashboardUrl, PlatformError> {
        let command = CfCommand::Service {
            instance: name.to_owned(),
        };
        let output = self.run(&command).await?;
        let raw = extract_dashboard_url(&output.stdout).ok_or_else(|| PlatformError::Scrape {
            command: command.name().to_owned(),
            marker: DASHBOARD_MARKER.to_owned(),
        })?;
        DashboardUrl::new(raw).map_err(|e| PlatformError::InvalidScrape {
            command: command.name().to_owned(),
            reason: e.to_string(),
        })
    }
}

/// 표식 뒤부터 줄 끝까지를 잘라 공백을 제거합니다.
///
/// 표식이 없거나 값이 비어 있으면 `None`입니다.
pub fn extract_dashboard_url(text: &str) -> Option<&str> {
    let start = text.find(DASHBOARD_MARKER)? + DASHBOARD_MARKER.len();
    let rest = &text[start..];
    let line = rest.split('\n').next().unwrap_or(rest).trim();
    if line.is_empty() { None } else { Some(line) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandOutput;
    use crate::control::MockControl;

    const SERVICE_OUTPUT: &str = "Showing info of service galago_smoke_test_1 in org o / space s as admin...\n\n\
Service instance: galago_smoke_test_1\n\
Service: chaos-galago\n\
Plan: default\n\
Dashboard: https://chaos-galago-broker.example.com/dashboard/8c2f\r\n\
Last Operation\n";

    #[test]
    fn extract_takes_rest_of_line_trimmed() {
        assert_eq!(
            extract_dashboard_url(SERVICE_OUTPUT),
            Some("https://chaos-galago-broker.example.com/dashboard/8c2f")
        );
    }

    #[test]
    fn extract_without_marker_is_none() {
        assert_eq!(extract_dashboard_url("Service: chaos-galago\n"), None);
        assert_eq!(extract_dashboard_url("Dashboard: \n"), None);
    }

    #[test]
    fn extract_at_end_of_text() {
        assert_eq!(
            extract_dashboard_url("Dashboard: http://d/1"),
            Some("http://d/1")
        );
    }

    #[tokio::test]
    async fn dashboard_url_from_service_output() {
        let control = MockControl::new().respond("service", CommandOutput::ok(SERVICE_OUTPUT));
        let url = control
            .addon_dashboard_url("galago_smoke_test_1")
            .await
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://chaos-galago-broker.example.com/dashboard/8c2f"
        );
        assert_eq!(
            control.recorded()[0],
            ("service".to_owned(), vec!["galago_smoke_test_1".to_owned()])
        );
    }

    #[tokio::test]
    async fn missing_dashboard_line_is_scrape_error() {
        let control = MockControl::new().respond("service", CommandOutput::ok("Service: x\n"));
        let err = control
            .addon_dashboard_url("x")
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::Scrape { .. }));
    }

    #[tokio::test]
    async fn workload_identity_is_trimmed_guid() {
        let control =
            MockControl::new().respond("app", CommandOutput::ok("5b0e9a54-6f8d-4a9e\n"));
        let id = control
            .workload_identity("galago_smoke_test_1")
            .await
            .unwrap();
        assert_eq!(id.as_str(), "5b0e9a54-6f8d-4a9e");
    }

    #[tokio::test]
    async fn failed_guid_lookup_is_invalid_scrape() {
        let control = MockControl::new().respond(
            "app",
            CommandOutput::failed("App galago_smoke_test_1 not found"),
        );
        let err = control
            .workload_identity("galago_smoke_test_1")
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::InvalidScrape { .. }));
    }
}
