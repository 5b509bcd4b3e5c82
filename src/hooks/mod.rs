//! External command hooks.
//!
//! A presentation can run a command at three lifecycle points:
//!
//! - `initialize`, once after the presentation has been loaded
//! - `update`, after every page change
//! - `finalize`, once when the presentation ends
//!
//! Commands are configured as a binary plus argument templates:
//!
//! ```toml
//! [commands.update]
//! binary = "pandoc"
//! arguments = ["${presentation.path}", "-o", "slides.pdf"]
//! ```
//!
//! Processes are launched through a [`ProcessRunner`], so tests can record
//! invocations instead of spawning anything.

mod template;

pub use template::{Bindings, Variable, interpolate};

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{self, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Commands;
use crate::error::HookError;

/// The lifecycle points at which a hook may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookName {
    Initialize,
    Update,
    Finalize,
}

impl HookName {
    pub const ALL: [HookName; 3] = [HookName::Initialize, HookName::Update, HookName::Finalize];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookName::Initialize => "initialize",
            HookName::Update => "update",
            HookName::Finalize => "finalize",
        }
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A description of a command to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HookCommand {
    /// The name or path of the binary.
    pub binary: String,

    /// Argument templates passed to the binary.
    #[serde(default)]
    pub arguments: Vec<String>,
}

/// Whether a failing hook stops the presentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookFailurePolicy {
    /// Log the failure and carry on.
    #[default]
    Warn,
    /// Treat a non-zero exit or a launch failure as fatal.
    Abort,
}

/// What happens to a hook's stdout and stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Share the presentation's stdout and stderr.
    Inherit,
    /// Send output to the null device.
    #[default]
    Discard,
}

/// The exit status of a hook process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    code: Option<i32>,
}

impl ExitStatus {
    /// The status of a successful run, also returned when no hook is configured.
    pub const SUCCESS: ExitStatus = ExitStatus { code: Some(0) };

    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    /// A process terminated without an exit code (killed by a signal).
    pub fn terminated() -> Self {
        Self { code: None }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn code(&self) -> Option<i32> {
        self.code
    }
}

impl From<process::ExitStatus> for ExitStatus {
    fn from(status: process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {}", code),
            None => f.write_str("terminated by signal"),
        }
    }
}

/// A fully resolved hook invocation. Created per dispatch and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookInvocation {
    pub hook: HookName,
    pub binary: String,
    pub arguments: Vec<String>,
    pub working_dir: PathBuf,
    pub output: OutputMode,
}

/// Launches hook processes.
pub trait ProcessRunner {
    /// Runs the invocation to completion and returns its exit status.
    fn run(&self, invocation: &HookInvocation) -> io::Result<ExitStatus>;
}

/// Runs hooks as real child processes, blocking until they exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &HookInvocation) -> io::Result<ExitStatus> {
        let stdio = || match invocation.output {
            OutputMode::Inherit => Stdio::inherit(),
            OutputMode::Discard => Stdio::null(),
        };
        process::Command::new(&invocation.binary)
            .args(&invocation.arguments)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(stdio())
            .stderr(stdio())
            .status()
            .map(ExitStatus::from)
    }
}

/// Looks up hook commands and runs them with substituted arguments.
pub struct Dispatcher<R> {
    commands: Commands,
    working_dir: PathBuf,
    output: OutputMode,
    runner: R,
}

impl<R: ProcessRunner> Dispatcher<R> {
    /// Creates a dispatcher.
    ///
    /// # Arguments
    ///
    /// * `commands` - The configured hook commands
    /// * `working_dir` - The directory hooks run in (the presentation's directory)
    /// * `output` - What to do with hook stdout/stderr
    /// * `runner` - The process launcher
    pub fn new(commands: Commands, working_dir: PathBuf, output: OutputMode, runner: R) -> Self {
        Self {
            commands,
            working_dir,
            output,
            runner,
        }
    }

    /// Returns true if a command is configured for `hook`.
    pub fn is_configured(&self, hook: HookName) -> bool {
        self.commands.get(hook).is_some()
    }

    /// Resolves the invocation for `hook` without running it.
    ///
    /// Returns `Ok(None)` when no command is configured.
    pub fn resolve(
        &self,
        hook: HookName,
        bindings: &Bindings,
    ) -> Result<Option<HookInvocation>, HookError> {
        let Some(command) = self.commands.get(hook) else {
            return Ok(None);
        };
        let arguments = command
            .arguments
            .iter()
            .map(|template| interpolate(template, bindings))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|token| HookError::UnboundVariable { hook, token })?;
        Ok(Some(HookInvocation {
            hook,
            binary: command.binary.clone(),
            arguments,
            working_dir: self.working_dir.clone(),
            output: self.output,
        }))
    }

    /// Runs the command configured for `hook`.
    ///
    /// An unconfigured hook is a no-op that reports success. Substitution
    /// errors abort the dispatch before any process is launched. A non-zero
    /// exit status is returned, not treated as an error.
    pub fn dispatch(&self, hook: HookName, bindings: &Bindings) -> Result<ExitStatus, HookError> {
        let Some(invocation) = self.resolve(hook, bindings)? else {
            debug!(%hook, "no command configured");
            return Ok(ExitStatus::SUCCESS);
        };

        info!(%hook, binary = %invocation.binary, arguments = ?invocation.arguments, "running hook");
        let status = self
            .runner
            .run(&invocation)
            .map_err(|source| HookError::Launch {
                hook,
                binary: invocation.binary.clone(),
                source,
            })?;
        debug!(%hook, %status, "hook finished");
        Ok(status)
    }
}
