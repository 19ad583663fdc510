//! 리소스 수명 주기 관리
//!
//! 실행 단위 임시 리소스(org, space, app, 서비스 인스턴스)를 의존 순서대로
//! 만들고 지웁니다. 모든 호출은 [`ResourceControl`]을 거칩니다.
//!
//! 생성 순서: group → scope/select → deploy → (bind) → start
//! 삭제 순서: workload → scope → group ([`teardown`](crate::teardown))

use std::future::Future;

use serde::Serialize;
use tracing::{error, info, warn};

use galago_smoke_core::config::PlatformConfig;
use galago_smoke_core::preflight::Credentials;
use galago_smoke_core::types::{DeployMode, SubScope, TenantGroup, Workload};
use galago_smoke_platform::{CfCommand, CommandOutput, ResourceControl};

use crate::context::SuiteContext;
use crate::error::HarnessError;
use crate::outcome::{CreateOutcome, DeleteOutcome};

/// 명령을 실행하고 실패 종료를 에러로 바꿉니다.
///
/// 실패 종료는 그 명령이 허용하는 멱등성 신호
/// ([`CfCommand::tolerated_signals`])가 있을 때만 받아들입니다.
pub(crate) async fn run_checked<C: ResourceControl>(
    control: &C,
    command: &CfCommand,
) -> Result<CommandOutput, HarnessError> {
    let output = control.run(command).await?;
    if output.success || output.tolerated_signal(command).is_some() {
        Ok(output)
    } else {
        Err(HarnessError::CommandFailed {
            command: command.to_string(),
            output: output.text().trim().to_owned(),
        })
    }
}

/// 리소스 수명 주기 관리자
pub struct LifecycleManager<'a, C> {
    control: &'a C,
}

impl<'a, C: ResourceControl> LifecycleManager<'a, C> {
    pub fn new(control: &'a C) -> Self {
        Self { control }
    }

    /// `cf login -a https://api.<domain>`
    pub async fn login(
        &self,
        credentials: &Credentials,
        skip_ssl_validation: bool,
    ) -> Result<(), HarnessError> {
        info!(api = %credentials.api_endpoint(), user = %credentials.username, "logging in");
        run_checked(
            self.control,
            &CfCommand::Login {
                api: credentials.api_endpoint(),
                username: credentials.username.clone(),
                password: credentials.password.clone(),
                skip_ssl_validation,
            },
        )
        .await?;
        Ok(())
    }

    pub async fn create_tenant_group(
        &self,
        group: &TenantGroup,
    ) -> Result<CreateOutcome, HarnessError> {
        info!(group = %group.name, "creating tenant group");
        let output = run_checked(
            self.control,
            &CfCommand::CreateOrg {
                org: group.name.clone(),
            },
        )
        .await?;
        Ok(CreateOutcome::from(&output))
    }

    /// 부모 그룹을 target한 뒤 하위 스코프를 만듭니다.
    pub async fn create_sub_scope(&self, scope: &SubScope) -> Result<CreateOutcome, HarnessError> {
        info!(scope = %scope, "creating sub scope");
        run_checked(
            self.control,
            &CfCommand::Target {
                org: Some(scope.parent.name.clone()),
                space: None,
            },
        )
        .await?;
        let output = run_checked(
            self.control,
            &CfCommand::CreateSpace {
                space: scope.name.clone(),
            },
        )
        .await?;
        Ok(CreateOutcome::from(&output))
    }

    /// 활성 스코프를 선택합니다.
    ///
    /// 활성 스코프를 바꾸는 작업 뒤에는 다시 호출해야 합니다.
    pub async fn select_scope(&self, scope: &SubScope) -> Result<(), HarnessError> {
        run_checked(
            self.control,
            &CfCommand::Target {
                org: Some(scope.parent.name.clone()),
                space: Some(scope.name.clone()),
            },
        )
        .await?;
        Ok(())
    }

    /// `other` 스코프에서 `f`를 실행하고 결과와 무관하게 `home`을 다시 선택합니다.
    pub async fn with_scope<T, F, Fut>(
        &self,
        other: &SubScope,
        home: &SubScope,
        f: F,
    ) -> Result<T, HarnessError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, HarnessError>>,
    {
        let result = match self.select_scope(other).await {
            Ok(()) => f().await,
            Err(e) => Err(e),
        };
        let restored = self.select_scope(home).await;
        match (result, restored) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(restore_err)) => {
                warn!(scope = %home, error = %restore_err, "failed to restore scope");
                Err(e)
            }
        }
    }

    /// `cf push <name> -f <manifest> [--no-start]`
    ///
    /// 매니페스트의 앱 이름 대신 실행 고유 이름을 사용합니다.
    pub async fn deploy_workload(
        &self,
        workload: &Workload,
        manifest: &str,
        mode: DeployMode,
    ) -> Result<(), HarnessError> {
        info!(workload = %workload.name, manifest, ?mode, "deploying workload");
        run_checked(
            self.control,
            &CfCommand::Push {
                app: workload.name.clone(),
                manifest: manifest.to_owned(),
                no_start: mode == DeployMode::Deferred,
            },
        )
        .await?;
        Ok(())
    }

    pub async fn start_workload(&self, workload: &Workload) -> Result<(), HarnessError> {
        info!(workload = %workload.name, "starting workload");
        run_checked(
            self.control,
            &CfCommand::Start {
                app: workload.name.clone(),
            },
        )
        .await?;
        Ok(())
    }

    pub async fn create_addon_instance(
        &self,
        offering: &str,
        plan: &str,
        name: &str,
    ) -> Result<CreateOutcome, HarnessError> {
        info!(offering, plan, instance = name, "creating addon instance");
        let output = run_checked(
            self.control,
            &CfCommand::CreateService {
                offering: offering.to_owned(),
                plan: plan.to_owned(),
                instance: name.to_owned(),
            },
        )
        .await?;
        Ok(CreateOutcome::from(&output))
    }

    pub async fn delete_addon_instance(&self, name: &str) -> Result<DeleteOutcome, HarnessError> {
        info!(instance = name, "deleting addon instance");
        let output = run_checked(
            self.control,
            &CfCommand::DeleteService {
                instance: name.to_owned(),
            },
        )
        .await?;
        Ok(DeleteOutcome::from(&output))
    }

    /// `cf services` 목록에 인스턴스가 있는지 확인합니다.
    ///
    /// `<base>_1`이 `<base>_10`에 포함되지 않도록 첫 열을 정확히 비교합니다.
    pub async fn addon_instance_listed(&self, name: &str) -> Result<bool, HarnessError> {
        let output = run_checked(self.control, &CfCommand::Services).await?;
        Ok(output
            .stdout
            .lines()
            .any(|line| line.split_whitespace().next() == Some(name)))
    }

    pub async fn delete_workload(&self, workload: &Workload) -> Result<DeleteOutcome, HarnessError> {
        info!(workload = %workload.name, "deleting workload");
        let output = run_checked(
            self.control,
            &CfCommand::Delete {
                app: workload.name.clone(),
            },
        )
        .await?;
        Ok(DeleteOutcome::from(&output))
    }

    /// 부모 그룹이 이미 없으면 스코프도 없는 것으로 봅니다.
    pub async fn delete_sub_scope(&self, scope: &SubScope) -> Result<DeleteOutcome, HarnessError> {
        info!(scope = %scope, "deleting sub scope");
        let target = self
            .control
            .run(&CfCommand::Target {
                org: Some(scope.parent.name.clone()),
                space: None,
            })
            .await?;
        if !target.success {
            if target.text().contains("not found") {
                return Ok(DeleteOutcome::DidNotExist);
            }
            return Err(HarnessError::CommandFailed {
                command: "target".to_owned(),
                output: target.text().trim().to_owned(),
            });
        }
        let output = run_checked(
            self.control,
            &CfCommand::DeleteSpace {
                space: scope.name.clone(),
            },
        )
        .await?;
        Ok(DeleteOutcome::from(&output))
    }

    pub async fn delete_tenant_group(
        &self,
        group: &TenantGroup,
    ) -> Result<DeleteOutcome, HarnessError> {
        info!(group = %group.name, "deleting tenant group");
        let output = run_checked(
            self.control,
            &CfCommand::DeleteOrg {
                org: group.name.clone(),
            },
        )
        .await?;
        Ok(DeleteOutcome::from(&output))
    }

    /// 실행 단위 리소스를 준비합니다.
    ///
    /// 단계가 실패해도 로그를 남기고 계속 진행하며, 모든 단계를
    /// [`SetupReport`]에 기록합니다. 스코프를 준비하지 못했을 때 시나리오를
    /// 건너뛸지는 호출자가 [`SetupReport::scope_ready`]로 판단합니다.
    pub async fn provision(
        &self,
        ctx: &SuiteContext,
        credentials: &Credentials,
        platform: &PlatformConfig,
    ) -> SetupReport {
        let mut report = SetupReport::default();

        let result = self.login(credentials, platform.skip_ssl_validation).await;
        report.record(SetupStepKind::Login, result);

        let result = self.create_tenant_group(&ctx.group).await.map(|_| ());
        report.record(SetupStepKind::CreateTenantGroup, result);

        let result = self.create_sub_scope(&ctx.scope).await.map(|_| ());
        report.record(SetupStepKind::CreateSubScope, result);

        let result = self.select_scope(&ctx.scope).await;
        report.record(SetupStepKind::SelectScope, result);

        if report.scope_ready() {
            let result = self
                .deploy_workload(&ctx.workload, &platform.manifest_path, platform.deploy_mode)
                .await;
            report.record(SetupStepKind::DeployWorkload, result);
        } else {
            error!(scope = %ctx.scope, "scope not established; workload will not be deployed");
        }

        report
    }
}

/// 준비 단계 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupStepKind {
    Login,
    CreateTenantGroup,
    CreateSubScope,
    SelectScope,
    DeployWorkload,
}

/// 준비 단계 하나의 결과
#[derive(Debug, Clone, Serialize)]
pub struct SetupStep {
    pub kind: SetupStepKind,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 준비 단계 기록
#[derive(Debug, Clone, Default, Serialize)]
pub struct SetupReport {
    pub steps: Vec<SetupStep>,
}

impl SetupReport {
    fn record(&mut self, kind: SetupStepKind, result: Result<(), HarnessError>) {
        let error = match result {
            Ok(()) => None,
            Err(e) => {
                error!(step = ?kind, error = %e, "setup step failed; continuing");
                Some(e.to_string())
            }
        };
        self.steps.push(SetupStep {
            kind,
            ok: error.is_none(),
            error,
        });
    }

    fn step(&self, kind: SetupStepKind) -> Option<&SetupStep> {
        self.steps.iter().find(|s| s.kind == kind)
    }

    /// 단계가 시도되었는지 (성공 여부 무관)
    pub fn attempted(&self, kind: SetupStepKind) -> bool {
        self.step(kind).is_some()
    }

    pub fn succeeded(&self, kind: SetupStepKind) -> bool {
        self.step(kind).is_some_and(|s| s.ok)
    }

    /// 로그인, 그룹, 스코프, 선택이 모두 성공했는지
    pub fn scope_ready(&self) -> bool {
        [
            SetupStepKind::Login,
            SetupStepKind::CreateTenantGroup,
            SetupStepKind::CreateSubScope,
            SetupStepKind::SelectScope,
        ]
        .into_iter()
        .all(|kind| self.succeeded(kind))
    }

    /// 시나리오를 실행할 수 있는지
    pub fn ready(&self) -> bool {
        self.scope_ready() && self.succeeded(SetupStepKind::DeployWorkload)
    }

    /// 첫 번째 실패 단계
    pub fn first_failure(&self) -> Option<&SetupStep> {
        self.steps.iter().find(|s| !s.ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galago_smoke_core::types::RunId;
    use galago_smoke_platform::{FailureMode, FakeFoundation};
    use std::path::PathBuf;

    fn credentials() -> Credentials {
        Credentials {
            home: PathBuf::from("/tmp/galago-home"),
            username: "admin".to_owned(),
            password: "secret".to_owned(),
            domain: "fake.local".to_owned(),
        }
    }

    async fn provisioned(fake: &FakeFoundation) -> (SuiteContext, SetupReport) {
        let ctx = SuiteContext::new(RunId::generate());
        let report = LifecycleManager::new(fake)
            .provision(&ctx, &credentials(), &PlatformConfig::default())
            .await;
        (ctx, report)
    }

    #[tokio::test]
    async fn provision_creates_group_scope_and_workload() {
        let fake = FakeFoundation::new();
        let (ctx, report) = provisioned(&fake).await;

        assert!(report.ready());
        assert!(fake.has_org(&ctx.group.name));
        assert!(fake.has_space(&ctx.group.name, &ctx.scope.name));
        assert!(fake.has_app(&ctx.workload.name));
        assert_eq!(
            fake.target(),
            (Some(ctx.group.name.clone()), Some(ctx.scope.name.clone()))
        );
    }

    #[tokio::test]
    async fn deferred_deploy_does_not_start() {
        let fake = FakeFoundation::new();
        let ctx = SuiteContext::new(RunId::generate());
        let platform = PlatformConfig {
            deploy_mode: DeployMode::Deferred,
            ..PlatformConfig::default()
        };
        let lifecycle = LifecycleManager::new(&fake);
        lifecycle.provision(&ctx, &credentials(), &platform).await;
        assert!(!fake.app_started(&ctx.workload.name));

        lifecycle.start_workload(&ctx.workload).await.unwrap();
        assert!(fake.app_started(&ctx.workload.name));
    }

    #[tokio::test]
    async fn create_is_idempotent() {
        let fake = FakeFoundation::new();
        let (ctx, _) = provisioned(&fake).await;
        let lifecycle = LifecycleManager::new(&fake);

        assert_eq!(
            lifecycle.create_tenant_group(&ctx.group).await.unwrap(),
            CreateOutcome::AlreadyExists
        );
        assert_eq!(
            lifecycle.create_sub_scope(&ctx.scope).await.unwrap(),
            CreateOutcome::AlreadyExists
        );
    }

    #[tokio::test]
    async fn delete_absent_resources_reports_did_not_exist() {
        let fake = FakeFoundation::new();
        let (ctx, _) = provisioned(&fake).await;
        let lifecycle = LifecycleManager::new(&fake);

        assert_eq!(
            lifecycle.delete_addon_instance("nope").await.unwrap(),
            DeleteOutcome::DidNotExist
        );
        assert_eq!(
            lifecycle.delete_workload(&ctx.workload).await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert_eq!(
            lifecycle.delete_workload(&ctx.workload).await.unwrap(),
            DeleteOutcome::DidNotExist
        );
        assert_eq!(
            lifecycle.delete_tenant_group(&ctx.group).await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert_eq!(
            lifecycle.delete_sub_scope(&ctx.scope).await.unwrap(),
            DeleteOutcome::DidNotExist
        );
        assert_eq!(
            lifecycle.delete_tenant_group(&ctx.group).await.unwrap(),
            DeleteOutcome::DidNotExist
        );
    }

    #[tokio::test]
    async fn addon_instance_listing_matches_whole_name() {
        let fake = FakeFoundation::new();
        let (ctx, _) = provisioned(&fake).await;
        let lifecycle = LifecycleManager::new(&fake);
        let name = format!("{}_10", ctx.run_id.addon_instance_name());

        assert_eq!(
            lifecycle
                .create_addon_instance("chaos-galago", "default", &name)
                .await
                .unwrap(),
            CreateOutcome::Created
        );
        assert!(lifecycle.addon_instance_listed(&name).await.unwrap());
        let prefix = format!("{}_1", ctx.run_id.addon_instance_name());
        assert!(!lifecycle.addon_instance_listed(&prefix).await.unwrap());
    }

    #[tokio::test]
    async fn rejected_command_without_signal_is_error() {
        let fake = FakeFoundation::new();
        let (ctx, _) = provisioned(&fake).await;
        fake.fail_command("create-service", FailureMode::Rejected);

        let err = LifecycleManager::new(&fake)
            .create_addon_instance("chaos-galago", "default", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::CommandFailed { .. }));
        assert!(fake.has_org(&ctx.group.name));
    }

    #[tokio::test]
    async fn push_failure_mentioning_missing_path_is_not_tolerated() {
        let fake = FakeFoundation::new();
        fake.fail_command(
            "push",
            FailureMode::FailedWith(
                "FAILED\nIncorrect Usage: The specified path 'nope.yml' does not exist.",
            ),
        );
        let (ctx, report) = provisioned(&fake).await;

        assert!(report.scope_ready());
        assert!(!report.succeeded(SetupStepKind::DeployWorkload));
        let err = LifecycleManager::new(&fake)
            .deploy_workload(&ctx.workload, "nope.yml", DeployMode::Start)
            .await
            .unwrap_err();
        match err {
            HarnessError::CommandFailed { command, output } => {
                assert!(command.starts_with("cf push"));
                assert!(output.contains("nope.yml"));
            }
            other => panic!("expected command failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_offering_is_not_reported_as_created() {
        let fake = FakeFoundation::new();
        provisioned(&fake).await;
        fake.fail_command(
            "create-service",
            FailureMode::FailedWith("FAILED\nService offering 'chaos-galagoo' does not exist."),
        );

        let err = LifecycleManager::new(&fake)
            .create_addon_instance("chaos-galagoo", "default", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn failed_login_is_recorded_and_setup_continues() {
        let fake = FakeFoundation::new();
        fake.fail_command("login", FailureMode::Transport);
        let (_, report) = provisioned(&fake).await;

        assert!(!report.scope_ready());
        assert_eq!(
            report.first_failure().map(|s| s.kind),
            Some(SetupStepKind::Login)
        );
        assert!(report.attempted(SetupStepKind::CreateTenantGroup));
        assert!(!report.attempted(SetupStepKind::DeployWorkload));
    }

    #[tokio::test]
    async fn with_scope_restores_even_on_failure() {
        let fake = FakeFoundation::new();
        let (ctx, _) = provisioned(&fake).await;
        let lifecycle = LifecycleManager::new(&fake);
        let processor = SubScope::new("chaos-galago", "chaos-galago");
        let observed = &fake;

        let result: Result<(), HarnessError> = lifecycle
            .with_scope(&processor, &ctx.scope, || async move {
                assert_eq!(
                    observed.target(),
                    (
                        Some("chaos-galago".to_owned()),
                        Some("chaos-galago".to_owned())
                    )
                );
                Err(HarnessError::assertion("inside", "boom"))
            })
            .await;

        assert!(matches!(result, Err(HarnessError::Assertion { .. })));
        assert_eq!(
            fake.target(),
            (Some(ctx.group.name.clone()), Some(ctx.scope.name.clone()))
        );
    }
}
