//! cf 명령 어휘와 출력 표식
//!
//! [`CfCommand`]는 하네스가 사용하는 cf 명령을 타입으로 표현하고,
//! [`ResourceControl::execute`](crate::control::ResourceControl::execute)가
//! 받는 `(command, args)` 쌍으로 변환합니다.
//!
//! cf CLI는 구조화된 응답을 주지 않으므로 멱등성 신호는 출력의 고정 문구로
//! 판별합니다. 이 판별은 이 모듈에만 둡니다.

use std::fmt;

/// 성공 표식 (단독 줄)
pub const MARKER_OK: &str = "OK";
/// 이미 존재하는 리소스를 다시 만들 때
pub const MARKER_ALREADY_EXISTS: &str = "already exists";
/// 없는 리소스를 삭제할 때
pub const MARKER_DOES_NOT_EXIST: &str = "does not exist";
/// 없는 바인딩을 해제할 때
pub const MARKER_DID_NOT_EXIST: &str = "did not exist";
/// 이미 바인딩된 인스턴스를 다시 바인딩할 때
pub const MARKER_ALREADY_BOUND: &str = "already bound";

/// 하네스가 실행하는 cf 명령
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CfCommand {
    Login {
        api: String,
        username: String,
        password: String,
        skip_ssl_validation: bool,
    },
    CreateOrg {
        org: String,
    },
    DeleteOrg {
        org: String,
    },
    CreateSpace {
        space: String,
    },
    DeleteSpace {
        space: String,
    },
    Target {
        org: Option<String>,
        space: Option<String>,
    },
    Push {
        app: String,
        manifest: String,
        no_start: bool,
    },
    Start {
        app: String,
    },
    Delete {
        app: String,
    },
    AppGuid {
        app: String,
    },
    CreateService {
        offering: String,
        plan: String,
        instance: String,
    },
    DeleteService {
        instance: String,
    },
    Service {
        instance: String,
    },
    Services,
    BindService {
        app: String,
        instance: String,
    },
    UnbindService {
        app: String,
        instance: String,
    },
    Env {
        app: String,
    },
    Curl {
        path: String,
    },
    RecentLogs {
        app: String,
    },
}

impl CfCommand {
    /// cf 하위 명령 이름
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "login",
            Self::CreateOrg { .. } => "create-org",
            Self::DeleteOrg { .. } => "delete-org",
            Self::CreateSpace { .. } => "create-space",
            Self::DeleteSpace { .. } => "delete-space",
            Self::Target { .. } => "target",
            Self::Push { .. } => "push",
            Self::Start { .. } => "start",
            Self::Delete { .. } => "delete",
            Self::AppGuid { .. } => "app",
            Self::CreateService { .. } => "create-service",
            Self::DeleteService { .. } => "delete-service",
            Self::Service { .. } => "service",
            Self::Services => "services",
            Self::BindService { .. } => "bind-service",
            Self::UnbindService { .. } => "unbind-service",
            Self::Env { .. } => "env",
            Self::Curl { .. } => "curl",
            Self::RecentLogs { .. } => "logs",
        }
    }

    /// 하위 명령 뒤에 붙는 인자
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::Login {
                api,
                username,
                password,
                skip_ssl_validation,
            } => {
                let mut args = vec![
                    "-a".to_owned(),
                    api.clone(),
                    "-u".to_owned(),
                    username.clone(),
                    "-p".to_owned(),
                    password.clone(),
                ];
                if *skip_ssl_validation {
                    args.push("--skip-ssl-validation".to_owned());
                }
                args
            }
            Self::CreateOrg { org } => vec![org.clone()],
            Self::DeleteOrg { org } => vec!["-f".to_owned(), org.clone()],
            Self::CreateSpace { space } => vec![space.clone()],
            Self::DeleteSpace { space } => vec!["-f".to_owned(), space.clone()],
            Self::Target { org, space } => {
                let mut args = Vec::new();
                if let Some(org) = org {
                    args.push("-o".to_owned());
                    args.push(org.clone());
                }
                if let Some(space) = space {
                    args.push("-s".to_owned());
                    args.push(space.clone());
                }
                args
            }
            Self::Push {
                app,
                manifest,
                no_start,
            } => {
                let mut args = vec![app.clone(), "-f".to_owned(), manifest.clone()];
                if *no_start {
                    args.push("--no-start".to_owned());
                }
                args
            }
            Self::Start { app } => vec![app.clone()],
            Self::Delete { app } => vec!["-f".to_owned(), app.clone()],
            Self::AppGuid { app } => vec![app.clone(), "--guid".to_owned()],
            Self::CreateService {
                offering,
                plan,
                instance,
            } => vec![offering.clone(), plan.clone(), instance.clone()],
            Self::DeleteService { instance } => vec!["-f".to_owned(), instance.clone()],
            Self::Service { instance } => vec![instance.clone()],
            Self::Services => Vec::new(),
            Self::BindService { app, instance } | Self::UnbindService { app, instance } => {
                vec![app.clone(), instance.clone()]
            }
            Self::Env { app } => vec![app.clone()],
            Self::Curl { path } => vec![path.clone()],
            Self::RecentLogs { app } => vec![app.clone(), "--recent".to_owned()],
        }
    }

    /// 실패 종료여도 예상된 결과로 받아들이는 신호
    ///
    /// 다른 명령의 출력에 같은 문구가 있어도 신호로 보지 않습니다.
    /// (`push`의 "path does not exist"는 실패입니다.)
    pub fn tolerated_signals(&self) -> &'static [Signal] {
        match self {
            Self::CreateOrg { .. } | Self::CreateSpace { .. } | Self::CreateService { .. } => {
                &[Signal::AlreadyExists]
            }
            Self::DeleteOrg { .. }
            | Self::DeleteSpace { .. }
            | Self::Delete { .. }
            | Self::DeleteService { .. } => &[Signal::DoesNotExist, Signal::DidNotExist],
            Self::BindService { .. } => &[Signal::AlreadyBound],
            Self::UnbindService { .. } => &[Signal::DidNotExist],
            _ => &[],
        }
    }
}

impl fmt::Display for CfCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args = redact_args(self.name(), &self.args());
        write!(f, "cf {} {}", self.name(), args.join(" "))
    }
}

/// 로그에 남기기 위해 비밀번호 인자를 가립니다.
pub fn redact_args(command: &str, args: &[String]) -> Vec<String> {
    if command != "login" {
        return args.to_vec();
    }
    let mut redacted = Vec::with_capacity(args.len());
    let mut mask_next = false;
    for arg in args {
        if mask_next {
            redacted.push("***".to_owned());
            mask_next = false;
        } else {
            mask_next = arg == "-p";
            redacted.push(arg.clone());
        }
    }
    redacted
}

/// 명령 실행 결과 (원시 텍스트 + 성공 여부)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// 종료 코드 0 여부
    pub success: bool,
}

impl CommandOutput {
    /// 성공한 출력
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            success: true,
        }
    }

    /// 실패한 출력
    pub fn failed(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            success: false,
        }
    }

    /// stdout과 stderr를 합친 전체 텍스트
    pub fn text(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }

    /// 전체 텍스트에 표식이 포함되는지 확인합니다.
    pub fn contains(&self, marker: &str) -> bool {
        self.stdout.contains(marker) || self.stderr.contains(marker)
    }

    /// 단독 줄 `OK`가 있는지 확인합니다.
    pub fn reports_ok(&self) -> bool {
        self.stdout.lines().any(|line| line.trim() == MARKER_OK)
    }

    /// 출력에 신호 문구가 있는지 확인합니다.
    pub fn has_signal(&self, signal: Signal) -> bool {
        self.contains(signal.marker())
    }

    /// 명령이 허용하는 신호 중 출력에 나타난 첫 번째 신호
    pub fn tolerated_signal(&self, command: &CfCommand) -> Option<Signal> {
        command
            .tolerated_signals()
            .iter()
            .copied()
            .find(|signal| self.has_signal(*signal))
    }

    /// 출력에 담긴 멱등성 신호
    pub fn signal(&self) -> Option<Signal> {
        if self.contains(MARKER_ALREADY_EXISTS) {
            Some(Signal::AlreadyExists)
        } else if self.contains(MARKER_ALREADY_BOUND) {
            Some(Signal::AlreadyBound)
        } else if self.contains(MARKER_DOES_NOT_EXIST) {
            Some(Signal::DoesNotExist)
        } else if self.contains(MARKER_DID_NOT_EXIST) {
            Some(Signal::DidNotExist)
        } else {
            None
        }
    }
}

/// 에러가 아닌 예상된 결과를 나타내는 멱등성 신호
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    AlreadyExists,
    AlreadyBound,
    DoesNotExist,
    DidNotExist,
}

impl Signal {
    /// 신호를 나타내는 출력 문구
    pub fn marker(&self) -> &'static str {
        match self {
            Self::AlreadyExists => MARKER_ALREADY_EXISTS,
            Self::AlreadyBound => MARKER_ALREADY_BOUND,
            Self::DoesNotExist => MARKER_DOES_NOT_EXIST,
            Self::DidNotExist => MARKER_DID_NOT_EXIST,
        }
    }
}
