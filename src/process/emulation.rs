/*!
 * Fork and Exec Emulation
 *
 * No copy-on-write duplication exists, so fork always fails. Exec is
 * approximated by spawning the target, waiting for it and exiting with its
 * code: observers see the same exit code but a different process id.
 */

use super::executor::spawn;
use super::types::{ProcessError, ProcessResult, SpawnConfig, WaitStatus};
use crate::core::types::{current_pid, Pid};
use crate::signals;
use log::{error, info};
use std::io::{self, Write};

/// Always fails with `NotSupported`. Call sites must use `spawn` instead.
pub fn fork() -> ProcessResult<Pid> {
    error!("fork() is not supported: no process duplication primitive, use spawn()");
    Err(ProcessError::NotSupported("fork"))
}

/// Sessions do not exist here; returns the current process id
pub fn setsid() -> Pid {
    current_pid()
}

/// Spawn `command` without redirection, wait for it and return its exit code
pub fn run_to_completion(command: &str, args: &[String]) -> ProcessResult<i32> {
    let config = SpawnConfig::new(command).with_args(args.to_vec());
    let mut record = spawn(&config)?;

    let status = record.wait(None);
    record.close();

    match status? {
        WaitStatus::Exited(code) => Ok(code),
        WaitStatus::StillRunning => Err(ProcessError::WaitFailed(format!(
            "{command}: unbounded wait returned early"
        ))),
    }
}

/// Replace the process image as far as an observer can tell. Never returns
/// on success: the signal subsystem is torn down and the calling process exits
/// with the child's code. The returned value is the spawn or wait failure.
pub fn exec(command: &str, args: &[String]) -> ProcessError {
    match run_to_completion(command, args) {
        Ok(code) => {
            info!("exec '{}' finished with code {}; exiting", command, code);
            // exit() runs no destructors; release the interrupt channel first
            signals::teardown();
            let _ = io::stdout().flush();
            let _ = io::stderr().flush();
            std::process::exit(code)
        }
        Err(e) => e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::{Categorized, ErrorCategory};

    #[test]
    fn test_fork_not_supported() {
        let err = fork().unwrap_err();
        assert_eq!(err, ProcessError::NotSupported("fork"));
        assert_eq!(err.category(), ErrorCategory::NotSupported);
    }

    #[test]
    fn test_setsid_is_current_pid() {
        assert_eq!(setsid(), std::process::id());
    }

    #[test]
    fn test_exec_missing_program_returns() {
        let err = exec("posix-compat-no-such-program", &[]);
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }
}
