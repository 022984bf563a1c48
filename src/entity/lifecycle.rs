//! Lifecycle of one (name, version) pair in the shared install location

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::entity::builtin::is_builtin;
use crate::entity::context::InstallContext;
use crate::entity::error::EntityError;
use crate::entity::observer::TransitionObserver;
use crate::entity::state::{EntityState, Status};
use crate::entity::task::Task;
use crate::entity::PackageIdentity;
use crate::process::ProcessOutput;

/// Output captured from the most recent process step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutputLog {
    pub stdout: String,
    pub stderr: String,
}

impl OutputLog {
    fn stdout_only(output: &ProcessOutput) -> Self {
        Self {
            stdout: output.stdout.clone(),
            stderr: String::new(),
        }
    }

    fn stderr_only(stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// State machine wrapping install/test/uninstall of one package version.
///
/// `install()` and `test()` report failure through `Err`; the composite
/// [`install_and_test`](Entity::install_and_test) never fails and instead
/// records the outcome in the status fields.
#[derive(Clone)]
pub struct Entity {
    identity: PackageIdentity,
    pub task: Task,
    /// Installed alongside the pinned version
    pub dependencies: Vec<PackageIdentity>,
    /// When set, `install_and_test` does nothing
    pub skip: bool,
    builtin: bool,
    state: EntityState,
    install_status: Option<Status>,
    test_status: Option<Status>,
    uninstall_status: Option<Status>,
    log: OutputLog,
    context: Arc<InstallContext>,
    observers: Vec<Arc<dyn TransitionObserver>>,
}

impl Entity {
    /// Create an entity in the `initial` state; a missing task defaults to one that always passes
    pub fn new(identity: PackageIdentity, task: Option<Task>, context: Arc<InstallContext>) -> Self {
        let builtin = is_builtin(&identity.name);
        Self {
            identity,
            task: task.unwrap_or_else(Task::noop),
            dependencies: Vec::new(),
            skip: false,
            builtin,
            state: EntityState::Initial,
            install_status: None,
            test_status: None,
            uninstall_status: None,
            log: OutputLog::default(),
            context,
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn TransitionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn add_observer(&mut self, observer: Arc<dyn TransitionObserver>) {
        self.observers.push(observer);
    }

    pub fn identity(&self) -> &PackageIdentity {
        &self.identity
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn version(&self) -> &str {
        &self.identity.version
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    pub fn state(&self) -> EntityState {
        self.state
    }

    pub fn install_status(&self) -> Option<Status> {
        self.install_status
    }

    pub fn test_status(&self) -> Option<Status> {
        self.test_status
    }

    pub fn uninstall_status(&self) -> Option<Status> {
        self.uninstall_status
    }

    pub fn log(&self) -> &OutputLog {
        &self.log
    }

    fn transition(&mut self, to: EntityState) {
        let from = self.state;
        self.state = to;
        debug!("{}: {} -> {}", self.identity, from, to);
        for observer in &self.observers {
            observer.on_transition(from, to, self);
        }
    }

    fn fail_install(&mut self, log: OutputLog) {
        self.install_status = Some(Status::Fail);
        self.log = log;
        self.transition(EntityState::InstallFailed);
    }

    /// Install the pinned version (and dependencies) into the shared location
    pub async fn install(&mut self) -> Result<(), EntityError> {
        if self.builtin {
            self.install_status = Some(Status::Pass);
            self.transition(EntityState::Installed);
            return Ok(());
        }

        let invocation = self
            .context
            .package_manager
            .install(&self.identity, &self.dependencies, &self.context.working_dir)
            .with_output(self.context.output.clone());
        info!("Installing {}", self.identity);

        let output = match self.context.runner.run(&invocation).await {
            Ok(output) => output,
            Err(source) => {
                self.fail_install(OutputLog::stderr_only(source.to_string()));
                return Err(EntityError::Spawn {
                    command: invocation.command_line(),
                    source,
                });
            }
        };

        if output.success() {
            self.install_status = Some(Status::Pass);
            self.log = OutputLog::stdout_only(&output);
            self.transition(EntityState::Installed);
            Ok(())
        } else {
            warn!(
                "Install of {} exited with {}",
                self.identity, output.exit_code
            );
            self.fail_install(OutputLog::stderr_only(output.stderr));
            Err(EntityError::InstallFailed {
                identity: self.identity.clone(),
                exit_code: output.exit_code,
            })
        }
    }

    /// Remove the package from the shared location, whatever the current state
    pub async fn uninstall(&mut self) {
        if self.builtin {
            self.uninstall_status = Some(Status::Pass);
            self.transition(EntityState::Uninstalled);
            return;
        }

        let invocation = self
            .context
            .package_manager
            .uninstall(&self.identity.name, &self.context.working_dir)
            .with_output(self.context.output.clone());
        info!("Uninstalling {}", self.identity.name);

        match self.context.runner.run(&invocation).await {
            Ok(output) if output.success() => {
                self.uninstall_status = Some(Status::Pass);
                self.log = OutputLog::stdout_only(&output);
            }
            Ok(output) => {
                warn!(
                    "Uninstall of {} exited with {}",
                    self.identity.name, output.exit_code
                );
                self.uninstall_status = Some(Status::Fail);
                self.log = OutputLog::stderr_only(output.stderr);
            }
            Err(e) => {
                warn!("Failed to spawn `{}`: {}", invocation.command_line(), e);
                self.uninstall_status = Some(Status::Fail);
                self.log = OutputLog::stderr_only(e.to_string());
            }
        }
        self.transition(EntityState::Uninstalled);
    }

    /// Run the task against the currently installed version.
    ///
    /// Neither `state` nor `test_status` is touched here.
    pub async fn test(&mut self) -> Result<(), EntityError> {
        debug!("Testing {} with `{}`", self.identity, self.task);

        let outcome = self
            .task
            .execute(&self.context)
            .await
            .map_err(|source| EntityError::Spawn {
                command: self.task.to_string(),
                source,
            })?;

        if let Some(output) = &outcome.output {
            self.log = OutputLog {
                stdout: output.stdout.clone(),
                stderr: output.stderr.clone(),
            };
        }

        if outcome.status == 0 {
            Ok(())
        } else {
            Err(EntityError::TestFailed {
                identity: self.identity.clone(),
                status: outcome.status,
            })
        }
    }

    /// Install then test, recording both outcomes. Never fails.
    pub async fn install_and_test(mut self) -> Self {
        if self.skip {
            self.install_status = None;
            self.test_status = None;
            debug!("Skipping {}", self.identity);
            return self;
        }

        if let Err(e) = self.install().await {
            info!("{}", e);
            self.test_status = Some(Status::Fail);
            return self;
        }

        let status = match self.test().await {
            Ok(()) => Status::Pass,
            Err(e) => {
                info!("{}", e);
                Status::Fail
            }
        };
        self.test_status = Some(status);
        self.transition(EntityState::Tested);
        self
    }

    /// Serializable snapshot
    pub fn record(&self) -> EntityRecord {
        EntityRecord {
            name: self.identity.name.clone(),
            version: self.identity.version.clone(),
            state: self.state,
            install_status: self.install_status,
            test_status: self.test_status,
            uninstall_status: self.uninstall_status,
            skip: self.skip,
            builtin: self.builtin,
            dependencies: self.dependencies.iter().map(ToString::to_string).collect(),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.identity.fmt(f)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("identity", &self.identity)
            .field("task", &self.task)
            .field("dependencies", &self.dependencies)
            .field("skip", &self.skip)
            .field("builtin", &self.builtin)
            .field("state", &self.state)
            .field("install_status", &self.install_status)
            .field("test_status", &self.test_status)
            .field("uninstall_status", &self.uninstall_status)
            .field("log", &self.log)
            .finish_non_exhaustive()
    }
}

/// Plain-data view of an entity after a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub name: String,
    pub version: String,
    pub state: EntityState,
    pub install_status: Option<Status>,
    pub test_status: Option<Status>,
    pub uninstall_status: Option<Status>,
    pub skip: bool,
    pub builtin: bool,
    pub dependencies: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ShellTask;
    use crate::entity::observer::{ChannelObserver, TransitionEvent};
    use crate::process::runner::MockProcessRunner;
    use crate::process::{CommandRunner, OutputMode, PackageManager};
    use std::path::PathBuf;
    use tokio::sync::mpsc;

    fn ok(stdout: &str) -> ProcessOutput {
        ProcessOutput {
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    fn failed(stderr: &str) -> ProcessOutput {
        ProcessOutput {
            exit_code: 1,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    fn entity(name: &str, version: &str, task: Option<Task>, runner: MockProcessRunner) -> Entity {
        let context = InstallContext::new(
            Arc::new(runner),
            PackageManager::default(),
            PathBuf::from("/work"),
        );
        Entity::new(PackageIdentity::new(name, version), task, Arc::new(context))
    }

    fn is_install(args: &[String]) -> bool {
        args.first().map(String::as_str) == Some("install")
    }

    #[test]
    fn new_entity_starts_in_initial_state() {
        let e = entity("ap", "0.2.0", None, MockProcessRunner::new());

        assert_eq!(e.state(), EntityState::Initial);
        assert_eq!(e.install_status(), None);
        assert_eq!(e.test_status(), None);
        assert!(!e.is_builtin());
    }

    #[tokio::test]
    async fn install_success_captures_stdout() {
        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .withf(|inv| is_install(&inv.args) && inv.args.contains(&"ap@0.2.0".to_string()))
            .times(1)
            .returning(|_| Ok(ok("+ ap@0.2.0\n")));
        let mut e = entity("ap", "0.2.0", None, runner);

        e.install().await.unwrap();

        assert_eq!(e.state(), EntityState::Installed);
        assert_eq!(e.install_status(), Some(Status::Pass));
        assert!(e.log().stdout.contains("ap@0.2.0"));
        assert!(e.log().stderr.is_empty());
    }

    #[tokio::test]
    async fn install_failure_captures_stderr_and_errors() {
        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .times(1)
            .returning(|_| Ok(failed("404 Not Found - xyzzy\n")));
        let mut e = entity("xyzzy", "9.9.9", None, runner);

        let result = e.install().await;

        assert!(matches!(result, Err(EntityError::InstallFailed { exit_code: 1, .. })));
        assert_eq!(e.state(), EntityState::InstallFailed);
        assert_eq!(e.install_status(), Some(Status::Fail));
        assert!(!e.log().stderr.is_empty());
        assert!(e.log().stdout.is_empty());
    }

    #[tokio::test]
    async fn install_spawn_error_is_an_install_failure() {
        let mut runner = MockProcessRunner::new();
        runner.expect_run().times(1).returning(|_| {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "npm not found"))
        });
        let mut e = entity("ap", "0.2.0", None, runner);

        let result = e.install().await;

        assert!(matches!(result, Err(EntityError::Spawn { .. })));
        assert_eq!(e.state(), EntityState::InstallFailed);
        assert_eq!(e.log().stderr, "npm not found");
    }

    #[tokio::test]
    async fn builtin_install_spawns_nothing() {
        let mut runner = MockProcessRunner::new();
        runner.expect_run().never();
        let mut e = entity("crypto", "20.1.0", None, runner);

        e.install().await.unwrap();

        assert!(e.is_builtin());
        assert_eq!(e.state(), EntityState::Installed);
        assert_eq!(e.install_status(), Some(Status::Pass));
    }

    #[tokio::test]
    async fn uninstall_from_initial_ends_uninstalled() {
        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .withf(|inv| inv.args == vec!["uninstall", "--no-save", "ap"])
            .times(1)
            .returning(|_| Ok(ok("removed 1 package\n")));
        let mut e = entity("ap", "0.2.0", None, runner);

        e.uninstall().await;

        assert_eq!(e.state(), EntityState::Uninstalled);
        assert_eq!(e.uninstall_status(), Some(Status::Pass));
        assert!(e.log().stderr.is_empty());
    }

    #[tokio::test]
    async fn uninstall_failure_still_ends_uninstalled() {
        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .times(1)
            .returning(|_| Ok(failed("EACCES\n")));
        let mut e = entity("ap", "0.2.0", None, runner);

        e.uninstall().await;

        assert_eq!(e.state(), EntityState::Uninstalled);
        assert_eq!(e.uninstall_status(), Some(Status::Fail));
    }

    #[tokio::test]
    async fn test_success_leaves_state_and_status_alone() {
        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .withf(|inv| inv.program == "sh")
            .times(1)
            .returning(|_| Ok(ok("done\n")));
        let task = Task::Shell(ShellTask::script("echo done"));
        let mut e = entity("ap", "0.2.0", Some(task), runner);

        e.test().await.unwrap();

        assert_eq!(e.state(), EntityState::Initial);
        assert_eq!(e.test_status(), None);
        assert_eq!(e.log().stdout, "done\n");
    }

    #[tokio::test]
    async fn test_failure_errors_without_recording() {
        let mut runner = MockProcessRunner::new();
        runner.expect_run().times(1).returning(|_| Ok(failed("")));
        let mut e = entity(
            "ap",
            "0.2.0",
            Some(Task::Shell(ShellTask::new("false", vec![]))),
            runner,
        );

        let result = e.test().await;

        assert!(matches!(result, Err(EntityError::TestFailed { status: 1, .. })));
        assert_eq!(e.state(), EntityState::Initial);
        assert_eq!(e.test_status(), None);
    }

    #[tokio::test]
    async fn callable_task_status_decides_outcome() {
        let mut e = entity("ap", "0.2.0", Some(Task::callable(|| 0)), MockProcessRunner::new());
        assert!(e.test().await.is_ok());

        e.task = Task::callable(|| 1);
        assert!(matches!(e.test().await, Err(EntityError::TestFailed { .. })));
    }

    #[tokio::test]
    async fn install_and_test_records_pass() {
        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .withf(|inv| is_install(&inv.args))
            .times(1)
            .returning(|_| Ok(ok("+ ap@0.2.0\n")));
        runner
            .expect_run()
            .withf(|inv| inv.program == "true")
            .times(1)
            .returning(|_| Ok(ok("")));
        let e = entity("ap", "0.2.0", None, runner);

        let e = e.install_and_test().await;

        assert_eq!(e.state(), EntityState::Tested);
        assert_eq!(e.install_status(), Some(Status::Pass));
        assert_eq!(e.test_status(), Some(Status::Pass));
    }

    #[tokio::test]
    async fn install_and_test_records_test_failure() {
        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .withf(|inv| is_install(&inv.args))
            .times(1)
            .returning(|_| Ok(ok("")));
        runner
            .expect_run()
            .withf(|inv| inv.program == "false")
            .times(1)
            .returning(|_| Ok(failed("")));
        let e = entity(
            "ap",
            "0.2.0",
            Some(Task::Shell(ShellTask::new("false", vec![]))),
            runner,
        );

        let e = e.install_and_test().await;

        assert_eq!(e.state(), EntityState::Tested);
        assert_eq!(e.install_status(), Some(Status::Pass));
        assert_eq!(e.test_status(), Some(Status::Fail));
    }

    #[tokio::test]
    async fn install_and_test_never_tests_after_failed_install() {
        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .withf(|inv| is_install(&inv.args))
            .times(1)
            .returning(|_| Ok(failed("E404\n")));
        let test_ran = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = test_ran.clone();
        let task = Task::callable(move || {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
            0
        });
        let e = entity("xyzzy", "9.9.9", Some(task), runner);

        let e = e.install_and_test().await;

        assert!(!test_ran.load(std::sync::atomic::Ordering::SeqCst));
        assert_eq!(e.state(), EntityState::InstallFailed);
        assert_eq!(e.install_status(), Some(Status::Fail));
        assert_eq!(e.test_status(), Some(Status::Fail));
        assert!(!e.log().stderr.is_empty());
        assert!(e.log().stdout.is_empty());
    }

    #[tokio::test]
    async fn install_and_test_on_skipped_entity_runs_nothing() {
        let mut runner = MockProcessRunner::new();
        runner.expect_run().never();
        let mut e = entity("ap", "0.1.0", None, runner);
        e.skip = true;

        let e = e.install_and_test().await;

        assert_eq!(e.state(), EntityState::Initial);
        assert_eq!(e.install_status(), None);
        assert_eq!(e.test_status(), None);
    }

    #[tokio::test]
    async fn observers_see_every_transition() {
        let mut runner = MockProcessRunner::new();
        runner.expect_run().returning(|_| Ok(ok("")));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let e = entity("ap", "0.2.0", None, runner)
            .with_observer(Arc::new(ChannelObserver::new(tx)));

        let mut e = e.install_and_test().await;
        e.uninstall().await;
        drop(e);

        let mut events: Vec<TransitionEvent> = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        let path: Vec<(EntityState, EntityState)> =
            events.iter().map(|e| (e.from, e.to)).collect();
        assert_eq!(
            path,
            vec![
                (EntityState::Initial, EntityState::Installed),
                (EntityState::Installed, EntityState::Tested),
                (EntityState::Tested, EntityState::Uninstalled),
            ]
        );
        assert_eq!(events[0].install_status, Some(Status::Pass));
        assert_eq!(events[1].test_status, Some(Status::Pass));
    }

    #[test]
    fn record_serializes_statuses() {
        let mut e = entity("ap", "0.2.0", None, MockProcessRunner::new());
        e.dependencies.push(PackageIdentity::new("bson", "1.0.0"));

        let json = serde_json::to_value(e.record()).unwrap();

        assert_eq!(json["name"], "ap");
        assert_eq!(json["state"], "initial");
        assert_eq!(json["testStatus"], serde_json::Value::Null);
        assert_eq!(json["dependencies"][0], "bson@1.0.0");
    }

    fn redirected(program: &str, dir: &tempfile::TempDir) -> (Entity, PathBuf) {
        let log = dir.path().join("install.log");
        let context = InstallContext::new(
            Arc::new(CommandRunner),
            PackageManager::new(program),
            dir.path().to_path_buf(),
        )
        .with_output(OutputMode::File(log.clone()));
        let e = Entity::new(PackageIdentity::new("ap", "0.2.0"), None, Arc::new(context));
        (e, log)
    }

    #[tokio::test]
    async fn redirected_install_leaves_log_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let (mut e, log) = redirected("echo", &dir);

        e.install().await.unwrap();

        assert_eq!(e.state(), EntityState::Installed);
        assert_eq!(e.log(), &OutputLog::default());
        assert_eq!(
            std::fs::read_to_string(log).unwrap(),
            "install --no-save ap@0.2.0\n"
        );
    }

    #[tokio::test]
    async fn redirected_install_failure_still_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let (mut e, _log) = redirected("false", &dir);

        let result = e.install().await;

        assert!(matches!(result, Err(EntityError::InstallFailed { .. })));
        assert_eq!(e.state(), EntityState::InstallFailed);
        assert_eq!(e.install_status(), Some(Status::Fail));
        assert_eq!(e.log(), &OutputLog::default());
    }
}
