//! 워크로드와 애드온 인스턴스 사이의 바인딩
//!
//! 바인딩 존재 여부는 플래그로 추적하지 않고 `cf env` 출력에 주입 필드가
//! 나타나는지로 관측합니다.

use tracing::{debug, info};

use galago_smoke_core::types::{InjectedFields, contains_marker};
use galago_smoke_platform::{CfCommand, ResourceControl};

use crate::error::HarnessError;
use crate::lifecycle::run_checked;
use crate::outcome::{BindOutcome, UnbindOutcome};

pub struct BindingController<'a, C> {
    control: &'a C,
    expected: InjectedFields,
}

impl<'a, C: ResourceControl> BindingController<'a, C> {
    pub fn new(control: &'a C, expected: InjectedFields) -> Self {
        Self { control, expected }
    }

    /// 바인딩 후 주입 필드가 환경에 나타나는지 확인합니다.
    pub async fn bind(&self, workload: &str, instance: &str) -> Result<BindOutcome, HarnessError> {
        info!(workload, instance, "binding addon instance");
        let output = run_checked(
            self.control,
            &CfCommand::BindService {
                app: workload.to_owned(),
                instance: instance.to_owned(),
            },
        )
        .await?;
        let outcome = BindOutcome::from(&output);
        debug!(workload, instance, ?outcome, "bind returned");
        self.verify_bound(workload).await?;
        Ok(outcome)
    }

    /// 해제 후 주입 필드가 모두 사라졌는지 확인합니다.
    pub async fn unbind(
        &self,
        workload: &str,
        instance: &str,
    ) -> Result<UnbindOutcome, HarnessError> {
        info!(workload, instance, "unbinding addon instance");
        let output = run_checked(
            self.control,
            &CfCommand::UnbindService {
                app: workload.to_owned(),
                instance: instance.to_owned(),
            },
        )
        .await?;
        let outcome = UnbindOutcome::from(&output);
        debug!(workload, instance, ?outcome, "unbind returned");
        self.verify_unbound(workload).await?;
        Ok(outcome)
    }

    async fn environment(&self, workload: &str) -> Result<String, HarnessError> {
        let output = run_checked(
            self.control,
            &CfCommand::Env {
                app: workload.to_owned(),
            },
        )
        .await?;
        Ok(output.text())
    }

    /// 세 주입 필드가 모두 있어야 합니다.
    pub async fn verify_bound(&self, workload: &str) -> Result<(), HarnessError> {
        let env = self.environment(workload).await?;
        let missing: Vec<String> = self
            .expected
            .env_markers()
            .into_iter()
            .filter(|marker| !contains_marker(&env, marker))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(HarnessError::assertion(
                format!("environment of {workload} is missing {missing:?}"),
                env,
            ))
        }
    }

    /// 주입 필드가 하나도 없어야 합니다.
    pub async fn verify_unbound(&self, workload: &str) -> Result<(), HarnessError> {
        let env = self.environment(workload).await?;
        let present: Vec<String> = self
            .expected
            .env_markers()
            .into_iter()
            .filter(|marker| contains_marker(&env, marker))
            .collect();
        if present.is_empty() {
            Ok(())
        } else {
            Err(HarnessError::assertion(
                format!("environment of {workload} still contains {present:?}"),
                env,
            ))
        }
    }
}
