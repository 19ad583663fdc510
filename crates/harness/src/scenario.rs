//! 시나리오 목록
//!
//! 각 시나리오는 준비(before), 본문(body), 정리(after)로 구성됩니다.
//! 준비와 본문은 시나리오 예산 안에서 실행되고, 정리는 결과와 무관하게
//! 최선 노력으로 항상 실행됩니다.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{info, warn};

use galago_smoke_core::types::DeployMode;
use galago_smoke_platform::{DashboardProbe, ResourceControl};

use crate::context::{ScenarioContext, SuiteContext};
use crate::error::HarnessError;
use crate::outcome::{BindOutcome, CreateOutcome, DeleteOutcome, UnbindOutcome};
use crate::processor::await_kill;
use crate::suite::SmokeSuite;

/// 시나리오 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioKind {
    AddonCreateExisting,
    AddonConfigure,
    AddonDeleteExisting,
    AddonCreateAbsent,
    AddonDeleteAbsent,
    BindAlreadyBound,
    UnbindBound,
    ProcessorKillsBoundApp,
    BindUnbound,
    UnbindUnbound,
}

impl ScenarioKind {
    /// 기본 실행 순서
    pub const ALL: [ScenarioKind; 10] = [
        Self::AddonCreateExisting,
        Self::AddonConfigure,
        Self::AddonDeleteExisting,
        Self::AddonCreateAbsent,
        Self::AddonDeleteAbsent,
        Self::BindAlreadyBound,
        Self::UnbindBound,
        Self::ProcessorKillsBoundApp,
        Self::BindUnbound,
        Self::UnbindUnbound,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::AddonCreateExisting => "addon-create-existing",
            Self::AddonConfigure => "addon-configure",
            Self::AddonDeleteExisting => "addon-delete-existing",
            Self::AddonCreateAbsent => "addon-create-absent",
            Self::AddonDeleteAbsent => "addon-delete-absent",
            Self::BindAlreadyBound => "bind-already-bound",
            Self::UnbindBound => "unbind-bound",
            Self::ProcessorKillsBoundApp => "processor-kills-bound-app",
            Self::BindUnbound => "bind-unbound",
            Self::UnbindUnbound => "unbind-unbound",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::AddonCreateExisting => "creating an existing instance reports it already exists",
            Self::AddonConfigure => "dashboard echoes the configured probability and frequency",
            Self::AddonDeleteExisting => "deleting an existing instance removes it from the listing",
            Self::AddonCreateAbsent => "creating a new instance lists it",
            Self::AddonDeleteAbsent => "deleting an absent instance reports it does not exist",
            Self::BindAlreadyBound => "binding twice reports already bound and keeps the fields",
            Self::UnbindBound => "unbinding removes the injected fields",
            Self::ProcessorKillsBoundApp => {
                "processor kills a running app bound with probability 1"
            }
            Self::BindUnbound => "binding an unbound app injects the fields",
            Self::UnbindUnbound => "unbinding an unbound app reports the binding did not exist",
        }
    }

    /// 실행 단위 워크로드가 필요한지
    pub fn needs_workload(&self) -> bool {
        matches!(
            self,
            Self::BindAlreadyBound
                | Self::UnbindBound
                | Self::ProcessorKillsBoundApp
                | Self::BindUnbound
                | Self::UnbindUnbound
        )
    }

    fn binds(&self) -> bool {
        self.needs_workload()
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScenarioKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown scenario '{s}'"))
    }
}

fn expect_outcome<T: fmt::Debug + PartialEq>(
    what: &str,
    actual: T,
    expected: T,
) -> Result<(), HarnessError> {
    if actual == expected {
        Ok(())
    } else {
        Err(HarnessError::assertion(
            format!("{what} should be {expected:?}"),
            format!("{actual:?}"),
        ))
    }
}

fn expect_listed(instance: &str, listed: bool, expected: bool) -> Result<(), HarnessError> {
    if listed == expected {
        Ok(())
    } else {
        let what = if expected {
            format!("{instance} should be listed")
        } else {
            format!("{instance} should not be listed")
        };
        Err(HarnessError::assertion(what, format!("listed={listed}")))
    }
}

/// 준비와 본문을 실행합니다.
pub async fn exercise<C, D>(
    kind: ScenarioKind,
    suite: &SmokeSuite<C, D>,
    ctx: &SuiteContext,
    sc: &mut ScenarioContext,
) -> Result<(), HarnessError>
where
    C: ResourceControl,
    D: DashboardProbe,
{
    let lifecycle = suite.lifecycle();
    let binding = suite.binding();
    let platform = &suite.config().platform;
    let instance = sc.instance.name.clone();
    let app = ctx.workload.name.as_str();

    let create = || {
        lifecycle.create_addon_instance(
            &platform.service_offering,
            &platform.service_plan,
            &instance,
        )
    };

    match kind {
        ScenarioKind::AddonCreateExisting => {
            create().await?;
            expect_outcome("second create", create().await?, CreateOutcome::AlreadyExists)?;
            expect_listed(&instance, lifecycle.addon_instance_listed(&instance).await?, true)
        }
        ScenarioKind::AddonConfigure => {
            create().await?;
            let url = sc.dashboard_url(suite.control()).await?;
            suite.configurator().configure(&url, suite.chaos()).await?;
            Ok(())
        }
        ScenarioKind::AddonDeleteExisting => {
            create().await?;
            expect_outcome(
                "delete",
                lifecycle.delete_addon_instance(&instance).await?,
                DeleteOutcome::Deleted,
            )?;
            expect_listed(&instance, lifecycle.addon_instance_listed(&instance).await?, false)
        }
        ScenarioKind::AddonCreateAbsent => {
            expect_outcome("create", create().await?, CreateOutcome::Created)?;
            expect_listed(&instance, lifecycle.addon_instance_listed(&instance).await?, true)
        }
        ScenarioKind::AddonDeleteAbsent => {
            expect_outcome(
                "delete",
                lifecycle.delete_addon_instance(&instance).await?,
                DeleteOutcome::DidNotExist,
            )?;
            expect_listed(&instance, lifecycle.addon_instance_listed(&instance).await?, false)
        }
        ScenarioKind::BindAlreadyBound => {
            create().await?;
            binding.bind(app, &instance).await?;
            expect_outcome(
                "second bind",
                binding.bind(app, &instance).await?,
                BindOutcome::AlreadyBound,
            )
        }
        ScenarioKind::UnbindBound => {
            create().await?;
            binding.bind(app, &instance).await?;
            expect_outcome(
                "unbind",
                binding.unbind(app, &instance).await?,
                UnbindOutcome::Unbound,
            )
        }
        ScenarioKind::ProcessorKillsBoundApp => {
            create().await?;
            binding.bind(app, &instance).await?;
            let identity = sc.workload_identity(suite.control(), &ctx.workload).await?;
            let url = sc.dashboard_url(suite.control()).await?;
            suite.configurator().configure(&url, suite.chaos()).await?;

            if platform.deploy_mode == DeployMode::Deferred {
                lifecycle.start_workload(&ctx.workload).await?;
            }
            let observed = await_kill(
                suite.control(),
                &identity,
                &ctx.scope,
                suite.processor(),
                &suite.config().waits,
            )
            .await?;
            info!(kill_log = %observed.kill_log.trim(), "kill observed");
            Ok(())
        }
        ScenarioKind::BindUnbound => {
            create().await?;
            binding.unbind(app, &instance).await?;
            expect_outcome(
                "bind",
                binding.bind(app, &instance).await?,
                BindOutcome::Bound,
            )
        }
        ScenarioKind::UnbindUnbound => {
            create().await?;
            binding.unbind(app, &instance).await?;
            expect_outcome(
                "unbind",
                binding.unbind(app, &instance).await?,
                UnbindOutcome::DidNotExist,
            )
        }
    }
}

/// 정리 단계를 최선 노력으로 실행하고 실패 목록을 반환합니다.
pub async fn clean_up<C, D>(
    kind: ScenarioKind,
    suite: &SmokeSuite<C, D>,
    ctx: &SuiteContext,
    sc: &ScenarioContext,
) -> Vec<String>
where
    C: ResourceControl,
    D: DashboardProbe,
{
    let lifecycle = suite.lifecycle();
    let instance = sc.instance.name.as_str();
    let mut errors = Vec::new();

    // 예산 초과나 취소로 다른 스코프에서 중단되었을 수 있습니다.
    if let Err(e) = lifecycle.select_scope(&ctx.scope).await {
        errors.push(format!("select scope: {e}"));
    }
    if kind.binds()
        && let Err(e) = suite.binding().unbind(&ctx.workload.name, instance).await
    {
        errors.push(format!("unbind {instance}: {e}"));
    }
    if let Err(e) = lifecycle.delete_addon_instance(instance).await {
        errors.push(format!("delete {instance}: {e}"));
    }

    for error in &errors {
        warn!(scenario = kind.name(), error = %error, "scenario cleanup step failed");
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for kind in ScenarioKind::ALL {
            assert_eq!(kind.name().parse::<ScenarioKind>().unwrap(), kind);
        }
        assert!("nope".parse::<ScenarioKind>().is_err());
    }

    #[test]
    fn addon_scenarios_do_not_need_the_workload() {
        assert!(!ScenarioKind::AddonConfigure.needs_workload());
        assert!(ScenarioKind::ProcessorKillsBoundApp.needs_workload());
    }

    #[test]
    fn serializes_as_kebab_case_name() {
        let json = serde_json::to_string(&ScenarioKind::ProcessorKillsBoundApp).unwrap();
        assert_eq!(json, "\"processor-kills-bound-app\"");
    }

    #[test]
    fn outcome_mismatch_reports_observed_value() {
        let err = expect_outcome("delete", DeleteOutcome::Deleted, DeleteOutcome::DidNotExist)
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("DidNotExist"));
        assert!(msg.contains("observed: Deleted"));
    }
}
