//! 인메모리 Cloud Foundry
//!
//! [`FakeFoundation`]은 하네스가 쓰는 cf 명령을 같은 텍스트 규약으로 흉내냅니다
//! (`OK`, `already exists`, `does not exist`, `already bound`, `did not exist`,
//! `cf env` JSON, `Dashboard:` 줄, 인스턴스 상태 JSON, 프로세서 종료 로그).
//! [`FakeDashboard`]는 같은 상태를 공유하며 대시보드 폼을 처리합니다.
//!
//! 프로세서는 자신의 로그가 조회될 때 동작합니다. 확률 1로 구성된 애드온에
//! 바인딩되어 실행 중인 앱을 종료하고 로그 줄을 남깁니다. 따라서
//! RUNNING → 종료 로그 → DOWN 순서가 결정적으로 재현됩니다.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::json;
use uuid::Uuid;

use galago_smoke_core::types::InjectedFields;

use crate::command::{CommandOutput, redact_args};
use crate::control::ResourceControl;
use crate::dashboard::DashboardProbe;
use crate::error::PlatformError;

/// 대시보드 URL 접두어
pub const FAKE_DASHBOARD_BASE: &str = "https://chaos-galago-broker.fake.local/dashboard/";

/// 주입할 실패 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// 프로세스 실행 실패 (`PlatformError::Spawn`)
    Transport,
    /// 신호 없는 비정상 종료 (`FAILED`)
    Rejected,
    /// 지정한 출력으로 비정상 종료
    FailedWith(&'static str),
}

/// 기록된 명령 호출 (비밀번호는 가려짐)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeCall {
    pub command: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone)]
struct FakeApp {
    guid: String,
    scope: (String, String),
    started: bool,
    starting_polls: u32,
    killed: bool,
}

#[derive(Debug, Clone)]
struct FakeService {
    guid: String,
    scope: (String, String),
    offering: String,
    plan: String,
    chaos: Option<(f64, u32)>,
}

impl FakeService {
    fn dashboard_url(&self) -> String {
        format!("{FAKE_DASHBOARD_BASE}{}", self.guid)
    }
}

#[derive(Debug)]
struct FoundationState {
    logged_in: bool,
    /// org → spaces
    orgs: BTreeMap<String, BTreeSet<String>>,
    target_org: Option<String>,
    target_space: Option<String>,
    apps: BTreeMap<String, FakeApp>,
    services: BTreeMap<String, FakeService>,
    /// (app, service)
    bindings: BTreeSet<(String, String)>,
    offering: String,
    injected: InjectedFields,
    processor_app: String,
    processor_log: Vec<String>,
    processor_reads: u32,
    kill_after_reads: u32,
    starting_polls: u32,
    failures: HashMap<String, FailureMode>,
    dashboard_echo: Option<String>,
    dashboard_down: bool,
    calls: Vec<FakeCall>,
}

/// 공유 가능한 인메모리 컨트롤 플레인
///
/// `Clone`은 같은 상태를 공유합니다.
#[derive(Debug, Clone)]
pub struct FakeFoundation {
    state: Arc<Mutex<FoundationState>>,
}

impl Default for FakeFoundation {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeFoundation {
    /// 기본 프로세서 배포(`chaos-galago/chaos-galago`의 `chaos-galago-processor`)가
    /// 있는 플랫폼을 만듭니다.
    pub fn new() -> Self {
        Self::with_processor("chaos-galago", "chaos-galago", "chaos-galago-processor")
    }

    pub fn with_processor(org: &str, space: &str, app: &str) -> Self {
        let mut orgs = BTreeMap::new();
        orgs.insert(org.to_owned(), BTreeSet::from([space.to_owned()]));
        let mut apps = BTreeMap::new();
        apps.insert(
            app.to_owned(),
            FakeApp {
                guid: Uuid::new_v4().to_string(),
                scope: (org.to_owned(), space.to_owned()),
                started: true,
                starting_polls: 0,
                killed: false,
            },
        );
        Self {
            state: Arc::new(Mutex::new(FoundationState {
                logged_in: false,
                orgs,
                target_org: None,
                target_space: None,
                apps,
                services: BTreeMap::new(),
                bindings: BTreeSet::new(),
                offering: "chaos-galago".to_owned(),
                injected: InjectedFields::default(),
                processor_app: app.to_owned(),
                processor_log: Vec::new(),
                processor_reads: 0,
                kill_after_reads: 1,
                starting_polls: 0,
                failures: HashMap::new(),
                dashboard_echo: None,
                dashboard_down: false,
                calls: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FoundationState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 같은 상태를 공유하는 대시보드
    pub fn dashboard(&self) -> FakeDashboard {
        FakeDashboard {
            state: Arc::clone(&self.state),
        }
    }

    // --- 조정 손잡이 ---

    /// 이 명령을 지정한 방식으로 실패시킵니다.
    pub fn fail_command(&self, command: &str, mode: FailureMode) {
        self.lock().failures.insert(command.to_owned(), mode);
    }

    pub fn clear_failure(&self, command: &str) {
        self.lock().failures.remove(command);
    }

    /// 시작 후 STARTING으로 보고할 상태 조회 횟수
    pub fn set_starting_polls(&self, polls: u32) {
        self.lock().starting_polls = polls;
    }

    /// 프로세서가 동작하기까지 필요한 로그 조회 횟수 (0이면 동작하지 않음)
    pub fn set_kill_after_reads(&self, reads: u32) {
        self.lock().kill_after_reads = reads;
    }

    /// 바인딩 시 주입되는 필드
    pub fn set_injected_fields(&self, fields: InjectedFields) {
        self.lock().injected = fields;
    }

    /// 대시보드가 항상 이 본문을 돌려주도록 합니다.
    pub fn set_dashboard_echo(&self, body: impl Into<String>) {
        self.lock().dashboard_echo = Some(body.into());
    }

    /// 대시보드 전송 실패
    pub fn set_dashboard_down(&self, down: bool) {
        self.lock().dashboard_down = down;
    }

    // --- 관측 ---

    pub fn calls(&self) -> Vec<FakeCall> {
        self.lock().calls.clone()
    }

    /// `command` 호출 중 인자에 `arg`가 포함된 횟수
    pub fn call_count(&self, command: &str, arg: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.command == command && c.args.iter().any(|a| a == arg))
            .count()
    }

    pub fn has_org(&self, org: &str) -> bool {
        self.lock().orgs.contains_key(org)
    }

    pub fn has_space(&self, org: &str, space: &str) -> bool {
        self.lock()
            .orgs
            .get(org)
            .is_some_and(|spaces| spaces.contains(space))
    }

    pub fn has_app(&self, app: &str) -> bool {
        self.lock().apps.contains_key(app)
    }

    pub fn app_guid(&self, app: &str) -> Option<String> {
        self.lock().apps.get(app).map(|a| a.guid.clone())
    }

    pub fn app_started(&self, app: &str) -> bool {
        self.lock().apps.get(app).is_some_and(|a| a.started)
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.lock().services.contains_key(name)
    }

    pub fn is_bound(&self, app: &str, service: &str) -> bool {
        self.lock()
            .bindings
            .contains(&(app.to_owned(), service.to_owned()))
    }

    pub fn chaos_of(&self, service: &str) -> Option<(f64, u32)> {
        self.lock().services.get(service).and_then(|s| s.chaos)
    }

    pub fn target(&self) -> (Option<String>, Option<String>) {
        let state = self.lock();
        (state.target_org.clone(), state.target_space.clone())
    }

    pub fn processor_log(&self) -> Vec<String> {
        self.lock().processor_log.clone()
    }
}

impl ResourceControl for FakeFoundation {
    async fn execute(
        &self,
        command: &str,
        args: &[String],
    ) -> Result<CommandOutput, PlatformError> {
        let mut state = self.lock();
        state.calls.push(FakeCall {
            command: command.to_owned(),
            args: redact_args(command, args),
        });

        match state.failures.get(command) {
            Some(FailureMode::Transport) => {
                return Err(PlatformError::Spawn {
                    binary: "cf".to_owned(),
                    command: command.to_owned(),
                    reason: "injected transport failure".to_owned(),
                });
            }
            Some(FailureMode::Rejected) => {
                return Ok(CommandOutput::failed(
                    "FAILED\nServer error, status code: 500, error code: 10001",
                ));
            }
            Some(FailureMode::FailedWith(text)) => {
                return Ok(CommandOutput::failed(*text));
            }
            None => {}
        }

        Ok(state.dispatch(command, args))
    }
}

/// 값이 붙는 플래그를 건너뛰고 위치 인자만 모읍니다.
fn positionals<'a>(args: &'a [String], value_flags: &[&str]) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if value_flags.contains(&arg.as_str()) {
            iter.next();
        } else if !arg.starts_with('-') {
            out.push(arg.as_str());
        }
    }
    out
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn failed(message: impl AsRef<str>) -> CommandOutput {
    CommandOutput::failed(format!("FAILED\n{}\n", message.as_ref()))
}

fn ok(message: impl AsRef<str>) -> CommandOutput {
    CommandOutput::ok(format!("{}\nOK\n", message.as_ref()))
}

impl FoundationState {
    fn dispatch(&mut self, command: &str, args: &[String]) -> CommandOutput {
        if command == "login" {
            return self.login(args);
        }
        if !self.logged_in {
            return failed("Not logged in. Use 'cf login' to log in.");
        }
        let pos = positionals(args, &[]);
        let first = pos.first().copied().unwrap_or_default();
        match command {
            "create-org" => self.create_org(first),
            "delete-org" => self.delete_org(first),
            "target" => self.target(flag_value(args, "-o"), flag_value(args, "-s")),
            "create-space" => self.create_space(first),
            "delete-space" => self.delete_space(first),
            "push" => {
                let pos = positionals(args, &["-f"]);
                let no_start = args.iter().any(|a| a == "--no-start");
                self.push(pos.first().copied().unwrap_or_default(), no_start)
            }
            "start" => self.start(first),
            "delete" => self.delete_app(first),
            "app" => self.app_guid(first),
            "create-service" => match pos.as_slice() {
                [offering, plan, name] => self.create_service(offering, plan, name),
                _ => failed("Incorrect Usage. Requires service, plan and instance name"),
            },
            "delete-service" => self.delete_service(first),
            "service" => self.service(first),
            "services" => self.services(),
            "bind-service" => match pos.as_slice() {
                [app, service] => self.bind(app, service),
                _ => failed("Incorrect Usage. Requires app and service instance"),
            },
            "unbind-service" => match pos.as_slice() {
                [app, service] => self.unbind(app, service),
                _ => failed("Incorrect Usage. Requires app and service instance"),
            },
            "env" => self.env(first),
            "curl" => self.curl(first),
            "logs" => self.logs(first),
            other => failed(format!("'{other}' is not a registered command.")),
        }
    }

    fn targeted_space(&self) -> Option<(String, String)> {
        Some((self.target_org.clone()?, self.target_space.clone()?))
    }

    fn login(&mut self, args: &[String]) -> CommandOutput {
        let api = flag_value(args, "-a").unwrap_or_default();
        self.logged_in = true;
        self.target_org = None;
        self.target_space = None;
        ok(format!("API endpoint: {api}\nAuthenticating..."))
    }

    fn create_org(&mut self, org: &str) -> CommandOutput {
        if self.orgs.contains_key(org) {
            return ok(format!("Creating org {org} as admin...\nOrg {org} already exists."));
        }
        self.orgs.insert(org.to_owned(), BTreeSet::new());
        ok(format!("Creating org {org} as admin..."))
    }

    fn delete_org(&mut self, org: &str) -> CommandOutput {
        if self.orgs.remove(org).is_none() {
            return ok(format!("Deleting org {org} as admin...\nOrg {org} does not exist."));
        }
        self.apps.retain(|_, app| app.scope.0 != org);
        self.services.retain(|_, svc| svc.scope.0 != org);
        self.prune_bindings();
        if self.target_org.as_deref() == Some(org) {
            self.target_org = None;
            self.target_space = None;
        }
        ok(format!("Deleting org {org} as admin..."))
    }

    fn target(&mut self, org: Option<&str>, space: Option<&str>) -> CommandOutput {
        if let Some(org) = org {
            if !self.orgs.contains_key(org) {
                return failed(format!("Organization '{org}' not found."));
            }
            self.target_org = Some(org.to_owned());
            self.target_space = None;
        }
        if let Some(space) = space {
            let Some(current) = self.target_org.clone() else {
                return failed("No org targeted, use 'cf target -o ORG' to target an org.");
            };
            let exists = self
                .orgs
                .get(&current)
                .is_some_and(|spaces| spaces.contains(space));
            if !exists {
                return failed(format!("Space '{space}' not found."));
            }
            self.target_space = Some(space.to_owned());
        }
        CommandOutput::ok(format!(
            "org:   {}\nspace: {}\n",
            self.target_org.as_deref().unwrap_or("No org targeted"),
            self.target_space.as_deref().unwrap_or("No space targeted")
        ))
    }

    fn create_space(&mut self, space: &str) -> CommandOutput {
        let Some(org) = self.target_org.clone() else {
            return failed("No org targeted, use 'cf target -o ORG' to target an org.");
        };
        let spaces = self.orgs.entry(org.clone()).or_default();
        if !spaces.insert(space.to_owned()) {
            return ok(format!(
                "Creating space {space} in org {org} as admin...\nSpace {space} already exists"
            ));
        }
        ok(format!("Creating space {space} in org {org} as admin..."))
    }

    fn delete_space(&mut self, space: &str) -> CommandOutput {
        let Some(org) = self.target_org.clone() else {
            return failed("No org targeted, use 'cf target -o ORG' to target an org.");
        };
        let removed = self
            .orgs
            .get_mut(&org)
            .is_some_and(|spaces| spaces.remove(space));
        if !removed {
            return ok(format!("Deleting space {space} in org {org} as admin...\nSpace {space} does not exist."));
        }
        let scope = (org.clone(), space.to_owned());
        self.apps.retain(|_, app| app.scope != scope);
        self.services.retain(|_, svc| svc.scope != scope);
        self.prune_bindings();
        if self.target_space.as_deref() == Some(space) {
            self.target_space = None;
        }
        ok(format!("Deleting space {space} in org {org} as admin..."))
    }

    fn push(&mut self, app: &str, no_start: bool) -> CommandOutput {
        let Some(scope) = self.targeted_space() else {
            return failed("No space targeted, use 'cf target -s SPACE' to target a space.");
        };
        let starting_polls = self.starting_polls;
        let entry = self.apps.entry(app.to_owned()).or_insert_with(|| FakeApp {
            guid: Uuid::new_v4().to_string(),
            scope,
            started: false,
            starting_polls: 0,
            killed: false,
        });
        if !no_start {
            entry.started = true;
            entry.killed = false;
            entry.starting_polls = starting_polls;
        }
        let state = if no_start { "stopped" } else { "running" };
        ok(format!("Pushing app {app} as admin...\nApp {app} is {state}"))
    }

    fn start(&mut self, app: &str) -> CommandOutput {
        let starting_polls = self.starting_polls;
        let Some(entry) = self.apps.get_mut(app) else {
            return failed(format!("App '{app}' not found."));
        };
        if entry.started && !entry.killed {
            return ok(format!("App {app} is already started"));
        }
        entry.started = true;
        entry.killed = false;
        entry.starting_polls = starting_polls;
        ok(format!("Starting app {app} as admin..."))
    }

    fn delete_app(&mut self, app: &str) -> CommandOutput {
        if self.apps.remove(app).is_none() {
            return ok(format!("Deleting app {app} as admin...\nApp {app} does not exist."));
        }
        self.prune_bindings();
        ok(format!("Deleting app {app} as admin..."))
    }

    fn app_guid(&self, app: &str) -> CommandOutput {
        match self.apps.get(app) {
            Some(entry) => CommandOutput::ok(format!("{}\n", entry.guid)),
            None => failed(format!("App '{app}' not found.")),
        }
    }

    fn create_service(&mut self, offering: &str, plan: &str, name: &str) -> CommandOutput {
        let Some(scope) = self.targeted_space() else {
            return failed("No space targeted, use 'cf target -s SPACE' to target a space.");
        };
        if offering != self.offering {
            return failed(format!("Service offering '{offering}' not found"));
        }
        if self.services.contains_key(name) {
            return ok(format!(
                "Creating service instance {name} as admin...\nService {name} already exists"
            ));
        }
        self.services.insert(
            name.to_owned(),
            FakeService {
                guid: Uuid::new_v4().to_string(),
                scope,
                offering: offering.to_owned(),
                plan: plan.to_owned(),
                chaos: None,
            },
        );
        ok(format!("Creating service instance {name} as admin..."))
    }

    fn delete_service(&mut self, name: &str) -> CommandOutput {
        if !self.services.contains_key(name) {
            return ok(format!(
                "Deleting service {name} as admin...\nService {name} does not exist."
            ));
        }
        if self.bindings.iter().any(|(_, svc)| svc == name) {
            return failed(
                "Cannot delete service instance, service keys and bindings must first be deleted",
            );
        }
        self.services.remove(name);
        ok(format!("Deleting service {name} as admin..."))
    }

    fn service(&self, name: &str) -> CommandOutput {
        let Some(svc) = self.services.get(name) else {
            return failed(format!("Service instance {name} not found"));
        };
        CommandOutput::ok(format!(
            "Showing info of service {name} in org {} / space {} as admin...\n\n\
             Service instance: {name}\nService: {}\nPlan: {}\nDashboard: {}\n\n\
             Last Operation\nStatus: create succeeded\n",
            svc.scope.0,
            svc.scope.1,
            svc.offering,
            svc.plan,
            svc.dashboard_url()
        ))
    }

    fn services(&self) -> CommandOutput {
        let mut text = String::from("Getting services as admin...\nOK\n\nname   service   plan   bound apps\n");
        for (name, svc) in &self.services {
            let bound: Vec<&str> = self
                .bindings
                .iter()
                .filter(|(_, s)| s == name)
                .map(|(a, _)| a.as_str())
                .collect();
            text.push_str(&format!(
                "{name}   {}   {}   {}\n",
                svc.offering,
                svc.plan,
                bound.join(", ")
            ));
        }
        CommandOutput::ok(text)
    }

    fn bind(&mut self, app: &str, service: &str) -> CommandOutput {
        if !self.apps.contains_key(app) {
            return failed(format!("App {app} not found"));
        }
        if !self.services.contains_key(service) {
            return failed(format!("Service instance {service} not found"));
        }
        let key = (app.to_owned(), service.to_owned());
        if self.bindings.contains(&key) {
            return ok(format!(
                "Binding service {service} to app {app} as admin...\nApp {app} is already bound to {service}."
            ));
        }
        self.bindings.insert(key);
        ok(format!(
            "Binding service {service} to app {app} as admin...\nTIP: Use 'cf restage {app}' to ensure your env variable changes take effect"
        ))
    }

    fn unbind(&mut self, app: &str, service: &str) -> CommandOutput {
        if !self.bindings.remove(&(app.to_owned(), service.to_owned())) {
            return ok(format!(
                "Unbinding app {app} from service {service} as admin...\nBinding between {service} and {app} did not exist"
            ));
        }
        ok(format!("Unbinding app {app} from service {service} as admin..."))
    }

    fn env(&self, app: &str) -> CommandOutput {
        if !self.apps.contains_key(app) {
            return failed(format!("App {app} not found"));
        }
        let bound: Vec<serde_json::Value> = self
            .bindings
            .iter()
            .filter(|(a, _)| a == app)
            .filter_map(|(_, s)| self.services.get(s).map(|svc| (s, svc)))
            .map(|(name, svc)| {
                json!({
                    "name": name,
                    "label": self.injected.label,
                    "plan": svc.plan,
                    "credentials": {
                        "frequency": self.injected.frequency,
                        "probability": self.injected.probability,
                    },
                })
            })
            .collect();
        let vcap = if bound.is_empty() {
            json!({ "VCAP_SERVICES": {} })
        } else {
            json!({ "VCAP_SERVICES": { self.offering.clone(): bound } })
        };
        let pretty = serde_json::to_string_pretty(&vcap).unwrap_or_default();
        ok(format!(
            "Getting env variables for app {app} in org {} / space {} as admin...\n\nSystem-Provided:\n{pretty}\n",
            self.target_org.as_deref().unwrap_or_default(),
            self.target_space.as_deref().unwrap_or_default()
        ))
    }

    fn curl(&mut self, path: &str) -> CommandOutput {
        let guid = path
            .trim_start_matches('/')
            .strip_prefix("v2/apps/")
            .and_then(|rest| rest.strip_suffix("/instances"));
        let Some(guid) = guid else {
            return CommandOutput::ok(
                serde_json::to_string_pretty(&json!({
                    "code": 10000,
                    "description": "Unknown request",
                    "error_code": "CF-NotFound",
                }))
                .unwrap_or_default(),
            );
        };
        let Some(app) = self.apps.values_mut().find(|a| a.guid == guid) else {
            return CommandOutput::ok(
                serde_json::to_string_pretty(&json!({
                    "code": 100004,
                    "description": format!("The app could not be found: {guid}"),
                    "error_code": "CF-AppNotFound",
                }))
                .unwrap_or_default(),
            );
        };
        let state = if !app.started {
            return CommandOutput::ok(
                serde_json::to_string_pretty(&json!({
                    "code": 220001,
                    "description": "Instances error: App has not been started",
                    "error_code": "CF-InstancesError",
                }))
                .unwrap_or_default(),
            );
        } else if app.killed {
            "DOWN"
        } else if app.starting_polls > 0 {
            app.starting_polls -= 1;
            "STARTING"
        } else {
            "RUNNING"
        };
        CommandOutput::ok(
            serde_json::to_string_pretty(&json!({ "0": { "state": state, "since": 1_700_000_000.0 } }))
                .unwrap_or_default(),
        )
    }

    fn logs(&mut self, app: &str) -> CommandOutput {
        let in_scope = match (self.apps.get(app), self.targeted_space()) {
            (Some(entry), Some(scope)) => entry.scope == scope,
            _ => false,
        };
        if !in_scope {
            return failed(format!("App {app} not found"));
        }
        if app == self.processor_app {
            self.run_processor();
        }
        let mut text = format!("Retrieving logs for app {app} as admin...\n\n");
        if app == self.processor_app {
            for line in &self.processor_log {
                text.push_str(line);
                text.push('\n');
            }
        }
        CommandOutput::ok(text)
    }

    /// 확률 1로 구성된 애드온에 바인딩된 실행 중 앱을 종료합니다.
    fn run_processor(&mut self) {
        self.processor_reads += 1;
        if self.kill_after_reads == 0 || self.processor_reads < self.kill_after_reads {
            return;
        }
        let armed: BTreeSet<String> = self
            .bindings
            .iter()
            .filter(|(_, svc)| {
                self.services
                    .get(svc)
                    .and_then(|s| s.chaos)
                    .is_some_and(|(p, _)| p >= 1.0)
            })
            .map(|(app, _)| app.clone())
            .collect();
        for name in armed {
            if let Some(app) = self.apps.get_mut(&name)
                && app.started
                && !app.killed
            {
                app.killed = true;
                self.processor_log.push(format!(
                    "2026-01-01T00:00:00.00+0000 [APP/PROC/WEB/0] OUT About to kill app instance: {} at index: 0",
                    app.guid
                ));
            }
        }
    }

    fn prune_bindings(&mut self) {
        let apps = &self.apps;
        let services = &self.services;
        self.bindings
            .retain(|(app, svc)| apps.contains_key(app) && services.contains_key(svc));
    }
}

/// [`FakeFoundation`]과 상태를 공유하는 대시보드
#[derive(Debug, Clone)]
pub struct FakeDashboard {
    state: Arc<Mutex<FoundationState>>,
}

impl DashboardProbe for FakeDashboard {
    async fn post_form(
        &self,
        url: &str,
        fields: &[(String, String)],
    ) -> Result<String, PlatformError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.dashboard_down {
            return Err(PlatformError::Http {
                url: url.to_owned(),
                reason: "connection refused".to_owned(),
            });
        }
        if let Some(body) = &state.dashboard_echo {
            return Ok(body.clone());
        }
        let Some(svc) = state
            .services
            .values_mut()
            .find(|s| s.dashboard_url() == url)
        else {
            return Ok("404 page not found".to_owned());
        };

        let field = |name: &str| {
            fields
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };
        let probability = field("probability").and_then(|v| v.parse::<f64>().ok());
        let frequency = field("frequency").and_then(|v| v.parse::<u32>().ok());
        match (probability, frequency) {
            (Some(p), Some(f)) if (0.0..=1.0).contains(&p) && f > 0 => {
                svc.chaos = Some((p, f));
                Ok(format!(
                    "<html><body><h1>Service instance configured</h1>\n<p>Probability: {p}</p>\n<p>Frequency: {f}</p>\n</body></html>"
                ))
            }
            _ => Ok("<html><body>Invalid configuration</body></html>".to_owned()),
        }
    }
}
