/*!
 * Process Executor
 * Spawns children with optional pipe redirection of the standard streams
 */

use super::cmdline::build_command_line;
use super::pipe::{ChildEnd, InheritablePipe};
use super::record::ProcessRecord;
use super::types::{ProcessError, ProcessResult, SpawnConfig};
use crate::monitoring::span_operation;
use crate::sys;
use log::{debug, error, info};
use std::fs::File;
use std::io;
use std::process::{Command, Stdio};

fn redirected(
    enabled: bool,
    child_end: ChildEnd,
    command: &str,
) -> ProcessResult<Option<InheritablePipe>> {
    if !enabled {
        return Ok(None);
    }
    InheritablePipe::new(child_end)
        .map(Some)
        .map_err(|e| pipe_error(command, e))
}

fn pipe_error(command: &str, err: io::Error) -> ProcessError {
    error!("Failed to create pipe for '{}': {}", command, err);
    ProcessError::SpawnFailed(format!("{command}: pipe: {err}"))
}

/// Spawn a child.
///
/// Streams flagged in `config.redirect` are connected to pipes whose parent
/// ends land in the returned record; the rest inherit the parent's streams.
/// On failure every pipe created so far is closed and the error is one of
/// `NotFound`, `AccessDenied` or `SpawnFailed`.
pub fn spawn(config: &SpawnConfig) -> ProcessResult<ProcessRecord> {
    let span = span_operation("spawn");
    let _entered = span.enter();
    let result = spawn_child(config);
    span.record_result(result.is_ok());
    result
}

fn spawn_child(config: &SpawnConfig) -> ProcessResult<ProcessRecord> {
    let stdin = redirected(config.redirect.stdin, ChildEnd::Read, &config.command)?;
    let stdout = redirected(config.redirect.stdout, ChildEnd::Write, &config.command)?;
    let stderr = redirected(config.redirect.stderr, ChildEnd::Write, &config.command)?;

    let mut command = Command::new(&config.command);
    sys::configure_command(&mut command, &config.args);

    if let Some(ref dir) = config.working_dir {
        command.current_dir(dir);
    }
    if let Some(ref env) = config.env {
        command.env_clear();
        command.envs(env.iter().map(|(k, v)| (k, v)));
    }

    let stdin = stdin.map(|pipe| {
        command.stdin(Stdio::from(pipe.child));
        File::from(pipe.parent)
    });
    let stdout = stdout.map(|pipe| {
        command.stdout(Stdio::from(pipe.child));
        File::from(pipe.parent)
    });
    let stderr = stderr.map(|pipe| {
        command.stderr(Stdio::from(pipe.child));
        File::from(pipe.parent)
    });

    debug!(
        "Spawning: {}",
        build_command_line(&config.command, &config.args)
    );

    let child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            let err = ProcessError::from_spawn(&config.command, &e);
            error!("Failed to spawn '{}': {}", config.command, e);
            return Err(err);
        }
    };

    // The child ends live in `command`; the parent must not hold them or
    // end-of-stream is never observed
    drop(command);

    info!(
        "Spawned process '{}' (PID: {}, redirect: {:?})",
        config.command,
        child.id(),
        config.redirect
    );

    Ok(ProcessRecord::new(child, stdin, stdout, stderr))
}
