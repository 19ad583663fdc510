//! 대시보드 프로브 포트
//!
//! 애드온 인스턴스 대시보드에 폼을 제출하고 응답 본문을 그대로 돌려줍니다.
//! 본문 해석(설정 값 에코 확인)은 하네스의 구성기가 담당합니다.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::error::PlatformError;

/// 기본 HTTP 요청 제한 시간
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 대시보드 HTTP 포트
pub trait DashboardProbe: Send + Sync + 'static {
    /// `application/x-www-form-urlencoded` 폼을 POST하고 응답 본문을 반환합니다.
    ///
    /// HTTP 상태 코드와 무관하게 본문을 반환합니다. 전송 자체가 실패한 경우만
    /// `PlatformError::Http`입니다.
    fn post_form(
        &self,
        url: &str,
        fields: &[(String, String)],
    ) -> impl Future<Output = Result<String, PlatformError>> + Send;
}

/// reqwest 기반 운영 구현
#[derive(Debug, Clone)]
pub struct HttpDashboardProbe {
    client: Client,
}

impl HttpDashboardProbe {
    /// HTTP 클라이언트를 생성합니다.
    ///
    /// 플랫폼이 자체 서명 인증서를 쓰는 경우 `skip_ssl_validation`을 켭니다.
    pub fn new(skip_ssl_validation: bool, timeout: Duration) -> Result<Self, PlatformError> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(skip_ssl_validation)
            .build()
            .map_err(|e| PlatformError::Http {
                url: String::new(),
                reason: format!("failed to create http client: {e}"),
            })?;
        Ok(Self { client })
    }
}

impl DashboardProbe for HttpDashboardProbe {
    async fn post_form(
        &self,
        url: &str,
        fields: &[(String, String)],
    ) -> Result<String, PlatformError> {
        debug!(url, fields = ?fields, "posting dashboard form");

        let response = self
            .client
            .post(url)
            .form(fields)
            .send()
            .await
            .map_err(|e| PlatformError::Http {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| PlatformError::Http {
            url: url.to_owned(),
            reason: format!("failed to read body: {e}"),
        })?;
        debug!(url, %status, bytes = body.len(), "dashboard responded");
        Ok(body)
    }
}
