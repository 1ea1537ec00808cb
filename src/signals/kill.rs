/*!
 * Kill Emulation
 *
 * Self-targeted interrupts call the registered handler directly. The other
 * emulated signals have no native delivery and are refused. Foreign
 * processes can only be probed or terminated: every signal sent to another
 * process terminates it.
 */

use super::registry::REGISTRY;
use super::types::{Signal, SignalError, SignalResult};
use crate::core::types::{current_pid, Pid};
use crate::sys;
use std::io;
use tracing::{debug, info};

/// Send `signal` to `pid`. `None` probes for existence; pid 0 is the caller.
pub fn kill(pid: Pid, signal: Option<Signal>) -> SignalResult<()> {
    if pid == 0 || pid == current_pid() {
        return kill_self(signal);
    }

    let Some(signal) = signal else {
        return sys::probe_process(pid).map_err(|_| SignalError::ProcessNotFound(pid));
    };

    sys::terminate_process(pid, signal).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SignalError::ProcessNotFound(pid),
        io::ErrorKind::PermissionDenied => SignalError::PermissionDenied(pid),
        _ => SignalError::OperationFailed(format!("terminate {pid}: {e}")),
    })?;

    info!(pid, %signal, "terminated process");
    Ok(())
}

fn kill_self(signal: Option<Signal>) -> SignalResult<()> {
    match signal {
        None => Ok(()),
        // Direct call on this thread; the interrupt indicator is untouched
        Some(Signal::SIGINT) => {
            let invoked = REGISTRY.invoke(Signal::SIGINT);
            debug!(invoked, "self interrupt");
            Ok(())
        }
        // Never installed natively, so a raise would run the OS default action
        Some(signal) if signal.is_emulated() => Err(SignalError::NotSupported(
            signal,
            "emulated signal has no native delivery",
        )),
        Some(signal) => sys::raise(signal).map_err(|e| match e.kind() {
            io::ErrorKind::Unsupported => {
                SignalError::NotSupported(signal, "no native delivery on this platform")
            }
            _ => SignalError::OperationFailed(format!("raise {signal}: {e}")),
        }),
    }
}
