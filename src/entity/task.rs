//! Test tasks: a shell command or an in-process function

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::entity::context::InstallContext;
use crate::process::{Invocation, ProcessOutput};

/// Program run for tasks that only need to succeed
pub const NOOP_COMMAND: &str = "true";

/// A command with explicit arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellTask {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ShellTask {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    /// A command line interpreted by `sh -c`
    pub fn script(line: &str) -> Self {
        Self::new("sh", vec!["-c".to_string(), line.to_string()])
    }
}

/// An in-process check returning a process-style status code (0 = pass)
#[derive(Clone)]
pub struct CallableTask(Arc<dyn Fn() -> i32 + Send + Sync>);

impl CallableTask {
    pub fn new(f: impl Fn() -> i32 + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self) -> i32 {
        (self.0)()
    }
}

impl fmt::Debug for CallableTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CallableTask(..)")
    }
}

/// What to run to test an installed version
#[derive(Debug, Clone)]
pub enum Task {
    Shell(ShellTask),
    Callable(CallableTask),
}

/// Result of executing a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub status: i32,
    /// Captured streams for shell tasks; `None` for callables
    pub output: Option<ProcessOutput>,
}

impl Task {
    /// Task that always passes
    pub fn noop() -> Self {
        Task::Shell(ShellTask::new(NOOP_COMMAND, Vec::new()))
    }

    pub fn callable(f: impl Fn() -> i32 + Send + Sync + 'static) -> Self {
        Task::Callable(CallableTask::new(f))
    }

    /// Run the task against whatever is currently installed in `context`
    pub async fn execute(&self, context: &InstallContext) -> std::io::Result<TaskOutcome> {
        match self {
            Task::Shell(shell) => {
                let invocation = Invocation::new(
                    shell.command.clone(),
                    shell.args.clone(),
                    context.working_dir.clone(),
                )
                .with_output(context.output.clone());
                let output = context.runner.run(&invocation).await?;
                Ok(TaskOutcome {
                    status: output.exit_code,
                    output: Some(output),
                })
            }
            Task::Callable(callable) => Ok(TaskOutcome {
                status: callable.call(),
                output: None,
            }),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Shell(shell) if shell.args.is_empty() => f.write_str(&shell.command),
            Task::Shell(shell) => write!(f, "{} {}", shell.command, shell.args.join(" ")),
            Task::Callable(_) => f.write_str("<callable>"),
        }
    }
}

/// Serialized form of a task in a versions file: a command line or `{command, args}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskSpec {
    Line(String),
    Command(ShellTask),
}

impl From<TaskSpec> for Task {
    fn from(spec: TaskSpec) -> Self {
        match spec {
            TaskSpec::Line(line) => Task::Shell(ShellTask::script(&line)),
            TaskSpec::Command(shell) => Task::Shell(shell),
        }
    }
}
