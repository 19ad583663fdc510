//! galago-smoke 오케스트레이션
//!
//! # 모듈 구조
//!
//! - [`lifecycle`]: 임시 리소스 생성과 삭제 (`LifecycleManager`)
//! - [`binding`]: 바인딩과 주입 필드 검증 (`BindingController`)
//! - [`chaos`]: 대시보드를 통한 카오스 파라미터 구성 (`ChaosConfigurator`)
//! - [`waiter`]: 최종 조건 대기 (`wait_until`)
//! - [`processor`]: RUNNING → 종료 로그 → DOWN 관측
//! - [`context`]: 실행/시나리오 컨텍스트
//! - [`scenario`]: 시나리오 목록
//! - [`teardown`]: 최선 노력 정리 (`TeardownPlan`)
//! - [`suite`]: 실행기 (`SmokeSuite`)
//!
//! # 흐름
//!
//! ```text
//! provision ──> scenario 1..n ──> teardown
//!   │              │ (budget, cancel)   │
//!   └ SetupReport  └ ScenarioResult     └ TeardownReport
//! ```

pub mod binding;
pub mod chaos;
pub mod context;
pub mod error;
pub mod lifecycle;
pub mod outcome;
pub mod processor;
pub mod scenario;
pub mod suite;
pub mod teardown;
pub mod waiter;

// --- 주요 타입 re-export ---

pub use suite::{ScenarioResult, ScenarioStatus, SmokeSuite, SuiteReport};
pub use scenario::ScenarioKind;

pub use binding::BindingController;
pub use chaos::ChaosConfigurator;
pub use context::{ScenarioContext, SuiteContext};
pub use lifecycle::{LifecycleManager, SetupReport, SetupStep, SetupStepKind};
pub use processor::{KillObservation, ProcessorTarget, await_kill};
pub use teardown::{TeardownAction, TeardownPlan, TeardownReport, TeardownResult};
pub use waiter::{WaitPolicy, WaitTimeout, wait_until};

pub use error::HarnessError;
pub use outcome::{BindOutcome, CreateOutcome, DeleteOutcome, UnbindOutcome};
