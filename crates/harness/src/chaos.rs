//! 카오스 파라미터 구성
//!
//! 대시보드에 폼을 제출하고, 응답 본문이 설정 값을 그대로 되돌려주는지로
//! 성공을 판정합니다. HTTP가 성공해도 에코가 없으면 실패입니다.

use tracing::info;

use galago_smoke_core::types::{ChaosConfig, DashboardUrl, contains_marker};
use galago_smoke_platform::DashboardProbe;

use crate::error::HarnessError;

pub struct ChaosConfigurator<'a, D> {
    probe: &'a D,
}

impl<'a, D: DashboardProbe> ChaosConfigurator<'a, D> {
    pub fn new(probe: &'a D) -> Self {
        Self { probe }
    }

    /// `url`은 조회로만 얻을 수 있으므로 호출 전에 반드시 해석되어 있습니다.
    pub async fn configure(
        &self,
        url: &DashboardUrl,
        config: &ChaosConfig,
    ) -> Result<String, HarnessError> {
        info!(
            url = %url,
            probability = config.probability(),
            frequency = config.frequency(),
            "configuring chaos parameters"
        );
        let body = self
            .probe
            .post_form(url.as_str(), &config.form_fields())
            .await?;

        let missing: Vec<String> = config
            .expected_echo()
            .into_iter()
            .filter(|line| !contains_marker(&body, line))
            .collect();
        if !missing.is_empty() {
            return Err(HarnessError::assertion(
                format!("dashboard response is missing {missing:?}"),
                body,
            ));
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galago_smoke_platform::PlatformError;

    struct StaticProbe(&'static str);

    impl DashboardProbe for StaticProbe {
        async fn post_form(
            &self,
            _url: &str,
            _fields: &[(String, String)],
        ) -> Result<String, PlatformError> {
            Ok(self.0.to_owned())
        }
    }

    fn url() -> DashboardUrl {
        DashboardUrl::new("https://broker.example.com/dashboard/1").unwrap()
    }

    #[tokio::test]
    async fn echo_of_both_values_succeeds() {
        let probe = StaticProbe("<p>Probability: 1</p><p>Frequency: 1</p>");
        let body = ChaosConfigurator::new(&probe)
            .configure(&url(), &ChaosConfig::always())
            .await
            .unwrap();
        assert!(body.contains("Frequency: 1"));
    }

    #[tokio::test]
    async fn partial_echo_is_assertion_failure() {
        let probe = StaticProbe("<p>Probability: 1</p>");
        let err = ChaosConfigurator::new(&probe)
            .configure(&url(), &ChaosConfig::always())
            .await
            .unwrap_err();
        match err {
            HarnessError::Assertion { what, observed } => {
                assert!(what.contains("Frequency: 1"));
                assert_eq!(observed, "<p>Probability: 1</p>");
            }
            other => panic!("expected assertion failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fractional_probability_uses_plain_formatting() {
        let probe = StaticProbe("Probability: 0.2 Frequency: 5");
        let config = ChaosConfig::new(0.2, 5).unwrap();
        ChaosConfigurator::new(&probe)
            .configure(&url(), &config)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn echo_of_a_longer_value_is_rejected() {
        let probe = StaticProbe("Probability: 0.25\nFrequency: 50");
        let config = ChaosConfig::new(0.2, 5).unwrap();
        let err = ChaosConfigurator::new(&probe)
            .configure(&url(), &config)
            .await
            .unwrap_err();
        match err {
            HarnessError::Assertion { what, .. } => {
                assert!(what.contains("Probability: 0.2"));
                assert!(what.contains("Frequency: 5"));
            }
            other => panic!("expected assertion failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn frequency_one_does_not_match_fifteen() {
        let probe = StaticProbe("Probability: 1 Frequency: 15");
        assert!(
            ChaosConfigurator::new(&probe)
                .configure(&url(), &ChaosConfig::always())
                .await
                .is_err()
        );
    }
}
