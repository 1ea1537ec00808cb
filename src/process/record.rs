/*!
 * Process Record
 *
 * Handle bundle for one spawned child: its pid, the platform child handle
 * and the parent ends of any redirected streams. Closing resets every field
 * to its sentinel, so a closed record can never pass for a live one.
 */

use super::types::{ProcessError, ProcessResult, WaitStatus};
use crate::core::types::Pid;
use crate::sys;
use log::{debug, error};
use std::fs::File;
use std::process::Child;
use std::time::Duration;

/// Pid sentinel of a closed record
pub const CLOSED_PID: Pid = 0;

#[derive(Debug)]
pub struct ProcessRecord {
    pid: Pid,
    child: Option<Child>,
    stdin: Option<File>,
    stdout: Option<File>,
    stderr: Option<File>,
}

impl ProcessRecord {
    pub(crate) fn new(
        child: Child,
        stdin: Option<File>,
        stdout: Option<File>,
        stderr: Option<File>,
    ) -> Self {
        Self {
            pid: child.id(),
            child: Some(child),
            stdin,
            stdout,
            stderr,
        }
    }

    /// Native pid, or `CLOSED_PID` once closed
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn is_closed(&self) -> bool {
        self.child.is_none()
    }

    /// Writer connected to the child's stdin, if redirected
    pub fn stdin(&mut self) -> Option<&mut File> {
        self.stdin.as_mut()
    }

    /// Reader connected to the child's stdout, if redirected
    pub fn stdout(&mut self) -> Option<&mut File> {
        self.stdout.as_mut()
    }

    /// Reader connected to the child's stderr, if redirected
    pub fn stderr(&mut self) -> Option<&mut File> {
        self.stderr.as_mut()
    }

    /// Take the stdin writer; dropping it delivers end-of-stream to the child
    pub fn take_stdin(&mut self) -> Option<File> {
        self.stdin.take()
    }

    pub fn take_stdout(&mut self) -> Option<File> {
        self.stdout.take()
    }

    pub fn take_stderr(&mut self) -> Option<File> {
        self.stderr.take()
    }

    /// Number of parent-side stream descriptors still held
    pub fn open_streams(&self) -> usize {
        [
            self.stdin.is_some(),
            self.stdout.is_some(),
            self.stderr.is_some(),
        ]
        .into_iter()
        .filter(|open| *open)
        .count()
    }

    /// Wait up to `timeout` for the child to exit. `None` waits forever.
    /// Timing out changes nothing; the record may be waited on again.
    pub fn wait(&mut self, timeout: Option<Duration>) -> ProcessResult<WaitStatus> {
        let pid = self.pid;
        let child = self.child.as_mut().ok_or(ProcessError::Closed)?;

        match sys::wait_child(child, timeout) {
            Ok(Some(status)) => {
                let code = sys::exit_code(status);
                debug!("Process {} exited with code {}", pid, code);
                Ok(WaitStatus::Exited(code))
            }
            Ok(None) => Ok(WaitStatus::StillRunning),
            Err(e) => {
                error!("Failed to wait for process {}: {}", pid, e);
                Err(ProcessError::WaitFailed(format!("{pid}: {e}")))
            }
        }
    }

    /// Release every stream and the child handle. Idempotent. Does not
    /// terminate a running child.
    pub fn close(&mut self) {
        self.stdin = None;
        self.stdout = None;
        self.stderr = None;

        if let Some(mut child) = self.child.take() {
            // Reap an already finished child; a running one is left alone
            if let Err(e) = child.try_wait() {
                debug!("Could not reap process {}: {}", self.pid, e);
            }
            debug!("Closed process record {}", self.pid);
        }
        self.pid = CLOSED_PID;
    }
}

impl Drop for ProcessRecord {
    fn drop(&mut self) {
        self.close();
    }
}
