//! 최선 노력 정리
//!
//! [`TeardownPlan`]은 생성 역순으로 나열된 독립 [`TeardownAction`]의 목록입니다.
//! 각 작업은 정확히 한 번 실행되며, 실패는 [`TeardownReport`]에 모일 뿐 다음
//! 작업을 막지 않습니다.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use galago_smoke_core::metrics as m;
use galago_smoke_core::types::{SubScope, TenantGroup, Workload};
use galago_smoke_platform::ResourceControl;

use crate::context::SuiteContext;
use crate::lifecycle::{LifecycleManager, SetupReport, SetupStepKind};
use crate::outcome::DeleteOutcome;

/// 정리 작업 하나
#[derive(Debug, Clone)]
pub enum TeardownAction {
    /// 스코프를 선택하고 워크로드를 삭제
    DeleteWorkload { scope: SubScope, workload: Workload },
    DeleteSubScope(SubScope),
    DeleteTenantGroup(TenantGroup),
    /// 로컬 cf 상태 디렉토리(`$CF_HOME/.cf`) 삭제
    RemoveLocalState(PathBuf),
}

impl TeardownAction {
    pub fn label(&self) -> String {
        match self {
            Self::DeleteWorkload { workload, .. } => format!("delete workload {}", workload.name),
            Self::DeleteSubScope(scope) => format!("delete sub scope {scope}"),
            Self::DeleteTenantGroup(group) => format!("delete tenant group {}", group.name),
            Self::RemoveLocalState(path) => format!("remove {}", path.display()),
        }
    }

    async fn execute<C: ResourceControl>(
        &self,
        lifecycle: &LifecycleManager<'_, C>,
    ) -> Result<DeleteOutcome, String> {
        match self {
            Self::DeleteWorkload { scope, workload } => {
                if let Err(e) = lifecycle.select_scope(scope).await {
                    warn!(scope = %scope, error = %e, "could not select scope before deleting workload");
                }
                lifecycle
                    .delete_workload(workload)
                    .await
                    .map_err(|e| e.to_string())
            }
            Self::DeleteSubScope(scope) => lifecycle
                .delete_sub_scope(scope)
                .await
                .map_err(|e| e.to_string()),
            Self::DeleteTenantGroup(group) => lifecycle
                .delete_tenant_group(group)
                .await
                .map_err(|e| e.to_string()),
            Self::RemoveLocalState(path) => match tokio::fs::remove_dir_all(path).await {
                Ok(()) => Ok(DeleteOutcome::Deleted),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Ok(DeleteOutcome::DidNotExist)
                }
                Err(e) => Err(e.to_string()),
            },
        }
    }
}

/// 정리 계획
#[derive(Debug, Clone, Default)]
pub struct TeardownPlan {
    actions: Vec<TeardownAction>,
}

impl TeardownPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: TeardownAction) {
        self.actions.push(action);
    }

    pub fn actions(&self) -> &[TeardownAction] {
        &self.actions
    }

    /// 준비 기록으로부터 계획을 만듭니다.
    ///
    /// 시도된 단계는 실패했더라도 리소스가 만들어졌을 수 있으므로 정리 대상입니다.
    pub fn from_setup(ctx: &SuiteContext, setup: &SetupReport, state_dir: Option<PathBuf>) -> Self {
        let mut plan = Self::new();
        if setup.attempted(SetupStepKind::DeployWorkload) {
            plan.push(TeardownAction::DeleteWorkload {
                scope: ctx.scope.clone(),
                workload: ctx.workload.clone(),
            });
        }
        if setup.attempted(SetupStepKind::CreateSubScope) {
            plan.push(TeardownAction::DeleteSubScope(ctx.scope.clone()));
        }
        if setup.attempted(SetupStepKind::CreateTenantGroup) {
            plan.push(TeardownAction::DeleteTenantGroup(ctx.group.clone()));
        }
        if let Some(dir) = state_dir {
            plan.push(TeardownAction::RemoveLocalState(dir));
        }
        plan
    }

    /// 모든 작업을 순서대로 한 번씩 실행합니다.
    pub async fn execute<C: ResourceControl>(
        self,
        lifecycle: &LifecycleManager<'_, C>,
    ) -> TeardownReport {
        let mut report = TeardownReport::default();
        for action in self.actions {
            let label = action.label();
            let result = match action.execute(lifecycle).await {
                Ok(DeleteOutcome::Deleted) => {
                    info!(action = %label, "teardown step completed");
                    TeardownResult::Deleted
                }
                Ok(DeleteOutcome::DidNotExist) => {
                    info!(action = %label, "teardown step found nothing to delete");
                    TeardownResult::DidNotExist
                }
                Err(reason) => {
                    metrics::counter!(m::TEARDOWN_FAILURES_TOTAL).increment(1);
                    warn!(action = %label, error = %reason, "teardown step failed; continuing");
                    TeardownResult::Failed { reason }
                }
            };
            report.entries.push(TeardownEntry {
                action: label,
                result,
            });
        }
        report
    }
}

/// 정리 작업 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TeardownResult {
    Deleted,
    DidNotExist,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct TeardownEntry {
    pub action: String,
    #[serde(flatten)]
    pub result: TeardownResult,
}

/// 정리 결과 모음
#[derive(Debug, Clone, Default, Serialize)]
pub struct TeardownReport {
    pub entries: Vec<TeardownEntry>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TeardownEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.result, TeardownResult::Failed { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galago_smoke_core::config::PlatformConfig;
    use galago_smoke_core::preflight::Credentials;
    use galago_smoke_core::types::RunId;
    use galago_smoke_platform::{FailureMode, FakeFoundation};

    fn credentials(home: PathBuf) -> Credentials {
        Credentials {
            home,
            username: "admin".to_owned(),
            password: "secret".to_owned(),
            domain: "fake.local".to_owned(),
        }
    }

    async fn setup_and_teardown(fake: &FakeFoundation) -> (SuiteContext, TeardownReport) {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join(".cf");
        std::fs::create_dir(&state).unwrap();

        let ctx = SuiteContext::new(RunId::generate());
        let lifecycle = LifecycleManager::new(fake);
        let setup = lifecycle
            .provision(
                &ctx,
                &credentials(dir.path().to_path_buf()),
                &PlatformConfig::default(),
            )
            .await;
        let report = TeardownPlan::from_setup(&ctx, &setup, Some(state.clone()))
            .execute(&lifecycle)
            .await;
        assert!(!state.exists());
        (ctx, report)
    }

    #[tokio::test]
    async fn full_setup_is_torn_down_in_reverse_order() {
        let fake = FakeFoundation::new();
        let (ctx, report) = setup_and_teardown(&fake).await;

        assert!(report.is_clean());
        let actions: Vec<&str> = report.entries.iter().map(|e| e.action.as_str()).collect();
        assert!(actions[0].starts_with("delete workload"));
        assert!(actions[1].starts_with("delete sub scope"));
        assert!(actions[2].starts_with("delete tenant group"));
        assert!(actions[3].starts_with("remove"));

        assert!(!fake.has_org(&ctx.group.name));
        assert_eq!(fake.call_count("delete", &ctx.workload.name), 1);
        assert_eq!(fake.call_count("delete-space", &ctx.scope.name), 1);
        assert_eq!(fake.call_count("delete-org", &ctx.group.name), 1);
    }

    #[tokio::test]
    async fn each_possibly_created_resource_is_deleted_once_whichever_step_failed() {
        for failing in ["create-org", "create-space", "push"] {
            let fake = FakeFoundation::new();
            fake.fail_command(failing, FailureMode::Transport);
            let (ctx, report) = setup_and_teardown(&fake).await;

            assert!(
                fake.call_count("delete-org", &ctx.group.name) == 1,
                "group deleted once when {failing} failed"
            );
            let scope_deletes = fake.call_count("delete-space", &ctx.scope.name);
            let workload_deletes = fake.call_count("delete", &ctx.workload.name);
            match failing {
                "create-org" | "create-space" => {
                    assert!(scope_deletes <= 1);
                    assert_eq!(workload_deletes, 0, "deploy never attempted");
                }
                _ => {
                    assert_eq!(scope_deletes, 1);
                    assert_eq!(workload_deletes, 1);
                }
            }
            assert!(!fake.has_org(&ctx.group.name));
            assert!(report.is_clean(), "teardown clean when {failing} failed");
        }
    }

    #[tokio::test]
    async fn failing_step_does_not_stop_later_steps() {
        let fake = FakeFoundation::new();
        let ctx = SuiteContext::new(RunId::generate());
        let lifecycle = LifecycleManager::new(&fake);
        let setup = lifecycle
            .provision(
                &ctx,
                &credentials(PathBuf::from("/tmp/unused")),
                &PlatformConfig::default(),
            )
            .await;

        fake.fail_command("delete", FailureMode::Transport);
        fake.fail_command("delete-space", FailureMode::Rejected);
        let report = TeardownPlan::from_setup(&ctx, &setup, None)
            .execute(&lifecycle)
            .await;

        assert_eq!(report.failures().count(), 2);
        assert_eq!(report.entries.len(), 3);
        assert_eq!(report.entries[2].result, TeardownResult::Deleted);
        assert!(!fake.has_org(&ctx.group.name));
    }

    #[tokio::test]
    async fn missing_local_state_is_not_a_failure() {
        let fake = FakeFoundation::new();
        let lifecycle = LifecycleManager::new(&fake);
        let mut plan = TeardownPlan::new();
        plan.push(TeardownAction::RemoveLocalState(PathBuf::from(
            "/nonexistent/galago/.cf",
        )));
        let report = plan.execute(&lifecycle).await;
        assert_eq!(report.entries[0].result, TeardownResult::DidNotExist);
    }

    #[test]
    fn report_serializes_status_tag() {
        let report = TeardownReport {
            entries: vec![TeardownEntry {
                action: "delete tenant group g".to_owned(),
                result: TeardownResult::Failed {
                    reason: "boom".to_owned(),
                },
            }],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["entries"][0]["status"], "failed");
        assert_eq!(json["entries"][0]["reason"], "boom");
    }
}
