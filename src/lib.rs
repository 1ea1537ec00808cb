/*!
 * POSIX Compatibility Library
 *
 * UNIX process-control and signal semantics for hosts written against POSIX:
 * - Signal emulation (handlers, alarms, console control, external interrupts, kill)
 * - Process lifecycle emulation (spawn with pipe redirection, wait, close, fork/exec)
 * - Peripheral shims (paths, console, identity, temporary files)
 */

pub mod core;
pub mod monitoring;
pub mod process;
pub mod shims;
pub mod signals;
mod sys;

// Re-exports
pub use crate::core::{Categorized, CompatConfig, ErrorCategory, Pid};
pub use monitoring::init_tracing;
pub use process::{
    exec, fork, setsid, spawn, ProcessError, ProcessRecord, ProcessResult, Redirect, SpawnConfig,
    WaitStatus,
};
pub use signals::{
    alarm, arm_alarm, block_until_alarm, block_until_interrupt, initialize, kill,
    register_handler, send_interrupt, sigprocmask, teardown, InterruptWait, MaskHow, Signal,
    SignalError, SignalHandler, SignalResult, SignalSet,
};
