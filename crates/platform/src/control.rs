//! 리소스 제어 포트
//!
//! [`ResourceControl`] 트레이트는 컨트롤 플레인 명령 실행을 추상화합니다.
//! 운영 코드는 [`CfCliControl`]로 `cf` 바이너리를 실행하고, 테스트는
//! `MockControl` 또는 `fake` 기능의 인메모리 구현을 사용합니다.
//!
//! ```text
//! ┌───────────────────┐
//! │ lifecycle/binding │
//! └─────────┬─────────┘
//!           ▼
//!   ┌───────────────┐
//!   │ResourceControl│ (trait)
//!   └───────────────┘
//!        │       │
//!        ▼       ▼
//!  ┌──────────┐ ┌──────┐
//!  │CfCliCtrl │ │ Fake │
//!  └────┬─────┘ └──────┘
//!       ▼
//!    cf CLI
//! ```

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use galago_smoke_core::metrics as m;

use crate::command::{CfCommand, CommandOutput, redact_args};
use crate::error::PlatformError;

/// 기본 명령 제한 시간
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// 컨트롤 플레인 명령 실행 포트
///
/// 비정상 종료는 에러가 아니라 `CommandOutput::success == false`로
/// 전달됩니다. "already exists" 같은 멱등성 신호가 실패 종료 코드와 함께
/// 오기 때문입니다. 프로세스를 실행하지 못한 경우만 에러입니다.
pub trait ResourceControl: Send + Sync + 'static {
    /// 명령을 실행하고 원시 출력을 반환합니다.
    ///
    /// # Errors
    ///
    /// - `PlatformError::Spawn`: 바이너리를 실행할 수 없음
    /// - `PlatformError::CommandTimedOut`: 제한 시간 초과
    fn execute(
        &self,
        command: &str,
        args: &[String],
    ) -> impl Future<Output = Result<CommandOutput, PlatformError>> + Send;

    /// 타입이 있는 명령을 실행합니다.
    fn run(
        &self,
        command: &CfCommand,
    ) -> impl Future<Output = Result<CommandOutput, PlatformError>> + Send {
        let name = command.name();
        let args = command.args();
        async move { self.execute(name, &args).await }
    }
}

/// `cf` 바이너리를 실행하는 운영 구현
///
/// 모든 호출은 같은 `CF_HOME`을 사용하므로 로그인 세션과 target이 명령 사이에
/// 유지됩니다.
#[derive(Debug, Clone)]
pub struct CfCliControl {
    binary: String,
    home: Option<PathBuf>,
    timeout: Duration,
}

impl CfCliControl {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            home: None,
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// 자식 프로세스에 전달할 `CF_HOME`을 지정합니다.
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }
}

impl ResourceControl for CfCliControl {
    async fn execute(
        &self,
        command: &str,
        args: &[String],
    ) -> Result<CommandOutput, PlatformError> {
        debug!(
            binary = %self.binary,
            command,
            args = ?redact_args(command, args),
            "executing platform command"
        );
        metrics::counter!(m::PLATFORM_COMMANDS_TOTAL, m::LABEL_COMMAND => command.to_owned())
            .increment(1);

        let mut cmd = Command::new(&self.binary);
        cmd.arg(command)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(home) = &self.home {
            cmd.env("CF_HOME", home);
        }

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(PlatformError::Spawn {
                    binary: self.binary.clone(),
                    command: command.to_owned(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                return Err(PlatformError::CommandTimedOut {
                    command: command.to_owned(),
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
        };

        if !result.success {
            metrics::counter!(
                m::PLATFORM_COMMAND_FAILURES_TOTAL,
                m::LABEL_COMMAND => command.to_owned()
            )
            .increment(1);
            warn!(
                command,
                exit_code = ?output.status.code(),
                "platform command exited with failure"
            );
        }

        Ok(result)
    }
}

/// 테스트용 Mock 제어 포트
///
/// 명령 이름별로 미리 지정한 출력을 반환하고 호출 기록을 남깁니다.
#[cfg(test)]
#[derive(Default)]
pub struct MockControl {
    responses: std::collections::HashMap<String, CommandOutput>,
    pub calls: std::sync::Mutex<Vec<(String, Vec<String>)>>,
    fail_spawn: bool,
}

#[cfg(test)]
impl MockControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// 명령 이름에 대한 응답을 지정합니다.
    pub fn respond(mut self, command: &str, output: CommandOutput) -> Self {
        self.responses.insert(command.to_owned(), output);
        self
    }

    /// 모든 호출이 실행 실패하도록 설정합니다.
    pub fn with_failing_spawn(mut self) -> Self {
        self.fail_spawn = true;
        self
    }

    pub fn recorded(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
impl ResourceControl for MockControl {
    async fn execute(
        &self,
        command: &str,
        args: &[String],
    ) -> Result<CommandOutput, PlatformError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((command.to_owned(), args.to_vec()));
        }
        if self.fail_spawn {
            return Err(PlatformError::Spawn {
                binary: "mock".to_owned(),
                command: command.to_owned(),
                reason: "mock failure".to_owned(),
            });
        }
        Ok(self
            .responses
            .get(command)
            .cloned()
            .unwrap_or_else(|| CommandOutput::ok("OK")))
    }
}
