/*!
 * Signal Types
 * Logical signal definitions, handler dispositions and result types
 */

use crate::core::errors::{Categorized, ErrorCategory};
use crate::core::limits::SIGNAL_SLOTS;
use crate::core::types::Pid;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Signal operation result
pub type SignalResult<T> = Result<T, SignalError>;

/// Signal errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum SignalError {
    #[error("Signal subsystem is not initialized")]
    #[diagnostic(
        code(signals::not_initialized),
        help("Call signals::initialize() before arming alarms or waiting for interrupts.")
    )]
    NotInitialized,

    #[error("Signal subsystem is already initialized")]
    #[diagnostic(
        code(signals::already_initialized),
        help("Call signals::teardown() before initializing again.")
    )]
    AlreadyInitialized,

    #[error("Failed to create kernel event: {0}")]
    #[diagnostic(
        code(signals::event_creation),
        help("The OS may be out of handles, or another process owns the channel name.")
    )]
    EventCreation(String),

    #[error("Process {0} not found")]
    #[diagnostic(code(signals::process_not_found))]
    ProcessNotFound(Pid),

    #[error("Permission denied for process {0}")]
    #[diagnostic(code(signals::permission_denied))]
    PermissionDenied(Pid),

    #[error("Interrupt channel for process {0} not found")]
    #[diagnostic(
        code(signals::channel_not_found),
        help("The target process is not running or never initialized its signal subsystem.")
    )]
    ChannelNotFound(Pid),

    #[error("Signal {0} is not supported here: {1}")]
    #[diagnostic(code(signals::not_supported))]
    NotSupported(Signal, &'static str),

    #[error("Invalid signal number: {0}")]
    #[diagnostic(code(signals::invalid_signal))]
    InvalidSignal(i32),

    #[error("Operation failed: {0}")]
    #[diagnostic(code(signals::operation_failed))]
    OperationFailed(String),
}

impl Categorized for SignalError {
    fn category(&self) -> ErrorCategory {
        match self {
            SignalError::ProcessNotFound(_) | SignalError::ChannelNotFound(_) => {
                ErrorCategory::NotFound
            }
            SignalError::PermissionDenied(_) => ErrorCategory::PermissionDenied,
            SignalError::EventCreation(_) => ErrorCategory::ResourceExhausted,
            SignalError::NotSupported(..) => ErrorCategory::NotSupported,
            SignalError::NotInitialized
            | SignalError::AlreadyInitialized
            | SignalError::InvalidSignal(_)
            | SignalError::OperationFailed(_) => ErrorCategory::Generic,
        }
    }
}

/// Logical signals, independent of any platform's numeric encoding.
///
/// `SIGINT`, `SIGALRM` and `SIGUSR1` are emulated by this crate; the rest pass
/// through to the native signal facility where one exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// Hangup detected on controlling terminal
    SIGHUP,
    /// Interrupt from keyboard (Ctrl+C)
    SIGINT,
    /// Quit from keyboard
    SIGQUIT,
    /// Illegal instruction
    SIGILL,
    /// Abort signal
    SIGABRT,
    /// Bus error
    SIGBUS,
    /// Floating-point exception
    SIGFPE,
    /// Kill signal (cannot be caught or ignored)
    SIGKILL,
    /// User-defined signal 1
    SIGUSR1,
    /// Invalid memory reference
    SIGSEGV,
    /// User-defined signal 2
    SIGUSR2,
    /// Broken pipe
    SIGPIPE,
    /// Timer signal
    SIGALRM,
    /// Termination signal
    SIGTERM,
}

impl Signal {
    /// Every logical signal, in registry slot order
    pub const ALL: [Signal; SIGNAL_SLOTS] = [
        Signal::SIGHUP,
        Signal::SIGINT,
        Signal::SIGQUIT,
        Signal::SIGILL,
        Signal::SIGABRT,
        Signal::SIGBUS,
        Signal::SIGFPE,
        Signal::SIGKILL,
        Signal::SIGUSR1,
        Signal::SIGSEGV,
        Signal::SIGUSR2,
        Signal::SIGPIPE,
        Signal::SIGALRM,
        Signal::SIGTERM,
    ];

    /// Registry slot of this signal
    pub fn slot(self) -> usize {
        self as usize
    }

    /// Conventional POSIX number (BSD numbering for the user signals, as the
    /// emulated host expects)
    pub fn number(self) -> i32 {
        match self {
            Signal::SIGHUP => 1,
            Signal::SIGINT => 2,
            Signal::SIGQUIT => 3,
            Signal::SIGILL => 4,
            Signal::SIGABRT => 6,
            Signal::SIGBUS => 7,
            Signal::SIGFPE => 8,
            Signal::SIGKILL => 9,
            Signal::SIGSEGV => 11,
            Signal::SIGPIPE => 13,
            Signal::SIGALRM => 14,
            Signal::SIGTERM => 15,
            Signal::SIGUSR1 => 30,
            Signal::SIGUSR2 => 31,
        }
    }

    /// Convert from the conventional number
    pub fn from_number(n: i32) -> SignalResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.number() == n)
            .ok_or(SignalError::InvalidSignal(n))
    }

    /// Signals whose delivery this crate emulates instead of the OS
    pub fn is_emulated(self) -> bool {
        matches!(self, Signal::SIGINT | Signal::SIGALRM | Signal::SIGUSR1)
    }

    /// Check if signal can be caught or ignored
    pub fn can_catch(self) -> bool {
        !matches!(self, Signal::SIGKILL)
    }

    /// Get human-readable description
    pub fn description(self) -> &'static str {
        match self {
            Signal::SIGHUP => "Hangup",
            Signal::SIGINT => "Interrupt",
            Signal::SIGQUIT => "Quit",
            Signal::SIGILL => "Illegal instruction",
            Signal::SIGABRT => "Aborted",
            Signal::SIGBUS => "Bus error",
            Signal::SIGFPE => "Floating point exception",
            Signal::SIGKILL => "Killed",
            Signal::SIGUSR1 => "User defined signal 1",
            Signal::SIGSEGV => "Segmentation fault",
            Signal::SIGUSR2 => "User defined signal 2",
            Signal::SIGPIPE => "Broken pipe",
            Signal::SIGALRM => "Alarm clock",
            Signal::SIGTERM => "Terminated",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.number())
    }
}

/// Handler callback. Runs on whichever thread delivers the signal, concurrently
/// with the rest of the program.
pub type HandlerFn = Arc<dyn Fn(Signal) + Send + Sync>;

/// Signal disposition stored in a registry slot
#[derive(Clone, Default)]
pub enum SignalHandler {
    /// Default action for the signal
    #[default]
    Default,
    /// Ignore the signal
    Ignore,
    /// Call custom handler
    Handler(HandlerFn),
}

impl SignalHandler {
    /// Wrap a closure as an installed handler
    pub fn handler<F>(f: F) -> Self
    where
        F: Fn(Signal) + Send + Sync + 'static,
    {
        SignalHandler::Handler(Arc::new(f))
    }

    pub fn is_default(&self) -> bool {
        matches!(self, SignalHandler::Default)
    }

    pub fn is_ignore(&self) -> bool {
        matches!(self, SignalHandler::Ignore)
    }

    pub fn is_installed(&self) -> bool {
        matches!(self, SignalHandler::Handler(_))
    }

    /// Invoke the callback if one is installed; returns whether it ran
    pub fn invoke(&self, signal: Signal) -> bool {
        match self {
            SignalHandler::Handler(f) => {
                f(signal);
                true
            }
            SignalHandler::Default | SignalHandler::Ignore => false,
        }
    }

    /// Same disposition; callbacks compare by identity
    pub fn same_as(&self, other: &SignalHandler) -> bool {
        match (self, other) {
            (SignalHandler::Default, SignalHandler::Default)
            | (SignalHandler::Ignore, SignalHandler::Ignore) => true,
            (SignalHandler::Handler(a), SignalHandler::Handler(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for SignalHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalHandler::Default => f.write_str("Default"),
            SignalHandler::Ignore => f.write_str("Ignore"),
            SignalHandler::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

/// Outcome of blocking on an indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptWait {
    /// The indicator was set and has been consumed
    Interrupted,
    /// The bound elapsed first
    TimedOut,
}
