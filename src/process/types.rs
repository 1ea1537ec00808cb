/*!
 * Process Types
 * Spawn configuration, wait outcomes and process errors
 */

use crate::core::errors::{Categorized, ErrorCategory};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Process operation result
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Process errors. Spawn failures are always one of `NotFound`,
/// `AccessDenied` or `SpawnFailed`, never a raw native code.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ProcessError {
    #[error("Executable not found: {0}")]
    #[diagnostic(
        code(process::not_found),
        help("Check the command name and the PATH of the calling process.")
    )]
    NotFound(String),

    #[error("Access denied: {0}")]
    #[diagnostic(code(process::access_denied))]
    AccessDenied(String),

    #[error("Spawn failed: {0}")]
    #[diagnostic(code(process::spawn_failed))]
    SpawnFailed(String),

    #[error("{0} is not supported on this platform")]
    #[diagnostic(
        code(process::not_supported),
        help("Restructure the call site around spawn() with explicit redirection.")
    )]
    NotSupported(&'static str),

    #[error("Wait failed: {0}")]
    #[diagnostic(code(process::wait_failed))]
    WaitFailed(String),

    #[error("Process record is closed")]
    #[diagnostic(code(process::closed))]
    Closed,
}

impl ProcessError {
    /// Categorize a failed process creation
    pub fn from_spawn(command: &str, err: &io::Error) -> Self {
        let detail = format!("{command}: {err}");
        match err.kind() {
            io::ErrorKind::NotFound => ProcessError::NotFound(detail),
            io::ErrorKind::PermissionDenied => ProcessError::AccessDenied(detail),
            _ => ProcessError::SpawnFailed(detail),
        }
    }
}

impl Categorized for ProcessError {
    fn category(&self) -> ErrorCategory {
        match self {
            ProcessError::NotFound(_) => ErrorCategory::NotFound,
            ProcessError::AccessDenied(_) => ErrorCategory::PermissionDenied,
            ProcessError::NotSupported(_) => ErrorCategory::NotSupported,
            ProcessError::SpawnFailed(_) | ProcessError::WaitFailed(_) | ProcessError::Closed => {
                ErrorCategory::Generic
            }
        }
    }
}

/// Which standard streams are replaced by pipes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub stdin: bool,
    pub stdout: bool,
    pub stderr: bool,
}

impl Redirect {
    pub const NONE: Redirect = Redirect {
        stdin: false,
        stdout: false,
        stderr: false,
    };

    pub const ALL: Redirect = Redirect {
        stdin: true,
        stdout: true,
        stderr: true,
    };
}

/// Configuration for spawning a child
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SpawnConfig {
    pub command: String,
    /// Arguments after the program name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    /// `None` inherits the parent environment; `Some` replaces it entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<(String, String)>>,
    #[serde(default)]
    pub redirect: Redirect,
}

impl SpawnConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: vec![],
            working_dir: None,
            env: None,
            redirect: Redirect::NONE,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_env(mut self, env: Vec<(String, String)>) -> Self {
        self.env = Some(env);
        self
    }

    pub fn with_redirect(mut self, redirect: Redirect) -> Self {
        self.redirect = redirect;
        self
    }
}

/// Outcome of a bounded wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitStatus {
    Exited(i32),
    /// The bound elapsed; the record is unchanged and may be waited on again
    StillRunning,
}

impl WaitStatus {
    pub fn code(self) -> Option<i32> {
        match self {
            WaitStatus::Exited(code) => Some(code),
            WaitStatus::StillRunning => None,
        }
    }
}
