//! 실행 컨텍스트
//!
//! 전역 상태 대신 명시적으로 전달되는 두 단계의 컨텍스트입니다.
//!
//! - [`SuiteContext`]: 실행 단위 값 (run id, org, space, 워크로드)
//! - [`ScenarioContext`]: 시나리오 단위 애드온 인스턴스와 캐시된 조회 결과

use galago_smoke_core::types::{
    AddonInstance, DashboardUrl, RunId, SubScope, TenantGroup, Workload, WorkloadIdentity,
};
use galago_smoke_platform::ResourceDescriber;
use tracing::debug;

use crate::error::HarnessError;

/// 실행 단위 컨텍스트
#[derive(Debug, Clone)]
pub struct SuiteContext {
    pub run_id: RunId,
    pub group: TenantGroup,
    pub scope: SubScope,
    pub workload: Workload,
    instance_base: String,
    scenario_seq: u32,
}

impl SuiteContext {
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            group: run_id.tenant_group(),
            scope: run_id.sub_scope(),
            workload: run_id.workload(),
            instance_base: run_id.addon_instance_name(),
            scenario_seq: 0,
        }
    }

    /// 다음 시나리오의 컨텍스트를 만듭니다.
    ///
    /// 인스턴스 이름은 `<base>_<n>`이므로 이전 시나리오의 정리가 실패해도
    /// 충돌하지 않습니다.
    pub fn next_scenario(&mut self, scenario: &str) -> ScenarioContext {
        self.scenario_seq += 1;
        ScenarioContext {
            scenario: scenario.to_owned(),
            instance: AddonInstance::new(format!("{}_{}", self.instance_base, self.scenario_seq)),
            identity: None,
        }
    }
}

/// 시나리오 단위 컨텍스트
#[derive(Debug, Clone)]
pub struct ScenarioContext {
    pub scenario: String,
    pub instance: AddonInstance,
    identity: Option<WorkloadIdentity>,
}

impl ScenarioContext {
    /// 대시보드 URL (시나리오당 최대 한 번 조회)
    pub async fn dashboard_url<C: ResourceDescriber>(
        &mut self,
        control: &C,
    ) -> Result<DashboardUrl, HarnessError> {
        if let Some(url) = &self.instance.dashboard_url {
            return Ok(url.clone());
        }
        let url = control.addon_dashboard_url(&self.instance.name).await?;
        debug!(instance = %self.instance.name, url = %url, "dashboard url discovered");
        self.instance.dashboard_url = Some(url.clone());
        Ok(url)
    }

    /// 워크로드 식별자 (시나리오당 최대 한 번 조회)
    pub async fn workload_identity<C: ResourceDescriber>(
        &mut self,
        control: &C,
        workload: &Workload,
    ) -> Result<WorkloadIdentity, HarnessError> {
        if let Some(id) = &self.identity {
            return Ok(id.clone());
        }
        let id = control.workload_identity(&workload.name).await?;
        debug!(workload = %workload.name, guid = %id, "workload identity resolved");
        self.identity = Some(id.clone());
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galago_smoke_platform::{CfCommand, FakeFoundation, ResourceControl};

    #[test]
    fn scenario_instances_are_numbered() {
        let mut ctx = SuiteContext::new(RunId::generate());
        let a = ctx.next_scenario("addon-create-existing");
        let b = ctx.next_scenario("addon-configure");
        assert!(a.instance.name.ends_with("_1"));
        assert!(b.instance.name.ends_with("_2"));
        assert!(a.instance.name.starts_with(&ctx.run_id.addon_instance_name()));
    }

    #[tokio::test]
    async fn dashboard_url_is_discovered_once() {
        let fake = FakeFoundation::new();
        let mut suite = SuiteContext::new(RunId::generate());
        let mut scenario = suite.next_scenario("addon-configure");

        for cmd in [
            CfCommand::Login {
                api: "https://api.fake.local".to_owned(),
                username: "u".to_owned(),
                password: "p".to_owned(),
                skip_ssl_validation: true,
            },
            CfCommand::CreateOrg {
                org: suite.group.name.clone(),
            },
            CfCommand::Target {
                org: Some(suite.group.name.clone()),
                space: None,
            },
            CfCommand::CreateSpace {
                space: suite.scope.name.clone(),
            },
            CfCommand::Target {
                org: Some(suite.group.name.clone()),
                space: Some(suite.scope.name.clone()),
            },
            CfCommand::CreateService {
                offering: "chaos-galago".to_owned(),
                plan: "default".to_owned(),
                instance: scenario.instance.name.clone(),
            },
        ] {
            fake.run(&cmd).await.unwrap();
        }

        let first = scenario.dashboard_url(&fake).await.unwrap();
        let second = scenario.dashboard_url(&fake).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(fake.call_count("service", &scenario.instance.name), 1);
    }
}
