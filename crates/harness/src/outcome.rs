//! 멱등 연산의 결과
//!
//! 플랫폼이 "이미 있음"이나 "원래 없음"을 알려주는 경우도 성공입니다.
//! 시나리오는 어느 쪽이었는지 단언할 수 있도록 구분된 값을 받습니다.
//! 변환은 해당 명령이 허용하는 신호만 봅니다. 다른 신호가 섞인 실패는
//! 이미 `run_checked`에서 걸러집니다.

use galago_smoke_platform::{CommandOutput, Signal};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    DidNotExist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindOutcome {
    Bound,
    AlreadyBound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnbindOutcome {
    Unbound,
    DidNotExist,
}

impl From<&CommandOutput> for CreateOutcome {
    fn from(output: &CommandOutput) -> Self {
        if output.has_signal(Signal::AlreadyExists) {
            Self::AlreadyExists
        } else {
            Self::Created
        }
    }
}

impl From<&CommandOutput> for DeleteOutcome {
    fn from(output: &CommandOutput) -> Self {
        if output.has_signal(Signal::DoesNotExist) || output.has_signal(Signal::DidNotExist) {
            Self::DidNotExist
        } else {
            Self::Deleted
        }
    }
}

impl From<&CommandOutput> for BindOutcome {
    fn from(output: &CommandOutput) -> Self {
        if output.has_signal(Signal::AlreadyBound) {
            Self::AlreadyBound
        } else {
            Self::Bound
        }
    }
}

impl From<&CommandOutput> for UnbindOutcome {
    fn from(output: &CommandOutput) -> Self {
        if output.has_signal(Signal::DidNotExist) {
            Self::DidNotExist
        } else {
            Self::Unbound
        }
    }
}
