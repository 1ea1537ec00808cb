/*!
 * Process Module
 * Child process lifecycle: spawn with redirection, bounded wait, close,
 * and fork/exec emulation
 */

pub mod cmdline;
mod emulation;
mod executor;
pub mod pipe;
mod record;
pub mod types;

// Re-export public API
pub use cmdline::{build_command_line, serialize_args};
pub use emulation::{exec, fork, run_to_completion, setsid};
pub use executor::spawn;
pub use pipe::{create_inheritable_pipe, ChildEnd, InheritablePipe};
pub use record::{ProcessRecord, CLOSED_PID};
pub use types::{ProcessError, ProcessResult, Redirect, SpawnConfig, WaitStatus};
