//! galago-smoke 플랫폼 경계
//!
//! 하네스가 외부 세계와 만나는 좁은 포트들을 정의합니다.
//!
//! - [`control`]: 명령 실행 포트 ([`ResourceControl`]) 와 `cf` 구현
//! - [`dashboard`]: 대시보드 폼 제출 포트 ([`DashboardProbe`])
//! - [`describe`]: cf 출력에서 식별자와 URL 추출 ([`ResourceDescriber`])
//! - [`command`]: cf 명령 어휘와 멱등성 신호
//! - `fake`: 인메모리 Cloud Foundry (`fake` 기능)

pub mod command;
pub mod control;
pub mod dashboard;
pub mod describe;
pub mod error;
#[cfg(any(test, feature = "fake"))]
pub mod fake;

pub use command::{CfCommand, CommandOutput, Signal};
pub use control::{CfCliControl, ResourceControl};
pub use dashboard::{DashboardProbe, HttpDashboardProbe};
pub use describe::ResourceDescriber;
pub use error::PlatformError;
#[cfg(any(test, feature = "fake"))]
pub use fake::{FailureMode, FakeDashboard, FakeFoundation};
