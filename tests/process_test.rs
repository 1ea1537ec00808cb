/*!
 * Process Lifecycle Tests
 * Spawn, redirection, bounded waits, close and exec emulation
 */

#![cfg(unix)]

use posix_compat::process::*;
use posix_compat::signals::{kill, Signal};
use posix_compat::{Categorized, ErrorCategory};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::io::{Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::thread;
use std::time::{Duration, Instant};

fn sh(script: &str) -> SpawnConfig {
    SpawnConfig::new("sh").with_args(vec!["-c".to_string(), script.to_string()])
}

#[cfg(target_os = "linux")]
fn open_fd_count() -> usize {
    std::fs::read_dir("/proc/self/fd").unwrap().count()
}

#[test]
#[serial]
fn test_round_trip_through_all_streams() {
    let mut record = spawn(&SpawnConfig::new("cat").with_redirect(Redirect::ALL)).unwrap();
    assert!(record.pid() > 0);
    assert_eq!(record.open_streams(), 3);

    let payload: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
    let mut stdin = record.take_stdin().unwrap();
    let input = payload.clone();
    let writer = thread::spawn(move || {
        stdin.write_all(&input).unwrap();
        // Dropping the writer delivers end-of-stream
    });

    let mut echoed = Vec::new();
    record.stdout().unwrap().read_to_end(&mut echoed).unwrap();
    writer.join().unwrap();

    let mut errors = Vec::new();
    record.stderr().unwrap().read_to_end(&mut errors).unwrap();

    assert_eq!(echoed.len(), payload.len());
    assert!(echoed == payload);
    assert!(errors.is_empty());
    assert_eq!(record.wait(None).unwrap(), WaitStatus::Exited(0));
}

#[test]
#[serial]
fn test_stderr_is_separate() {
    let mut record = spawn(
        &sh("printf out; printf err >&2").with_redirect(Redirect {
            stdin: false,
            stdout: true,
            stderr: true,
        }),
    )
    .unwrap();
    assert!(record.stdin().is_none());

    let mut out = String::new();
    let mut err = String::new();
    record.stdout().unwrap().read_to_string(&mut out).unwrap();
    record.stderr().unwrap().read_to_string(&mut err).unwrap();

    assert_eq!(out, "out");
    assert_eq!(err, "err");
    assert_eq!(record.wait(None).unwrap(), WaitStatus::Exited(0));
}

#[test]
#[serial]
fn test_missing_executable_is_not_found() {
    #[cfg(target_os = "linux")]
    let before = open_fd_count();

    let err = spawn(
        &SpawnConfig::new("/nonexistent/posix-compat-missing").with_redirect(Redirect::ALL),
    )
    .unwrap_err();

    assert!(matches!(err, ProcessError::NotFound(_)), "{err:?}");
    assert_eq!(err.category(), ErrorCategory::NotFound);

    #[cfg(target_os = "linux")]
    assert_eq!(open_fd_count(), before);
}

#[test]
#[serial]
fn test_non_executable_is_access_denied() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("script.sh");
    std::fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o644)).unwrap();

    let err = spawn(&SpawnConfig::new(script.to_string_lossy())).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::PermissionDenied);
}

#[test]
#[serial]
fn test_bounded_wait_then_unbounded() {
    let mut record = spawn(&sh("sleep 1; exit 3")).unwrap();

    let started = Instant::now();
    assert_eq!(
        record.wait(Some(Duration::from_millis(100))).unwrap(),
        WaitStatus::StillRunning
    );
    assert!(started.elapsed() < Duration::from_millis(900));

    assert_eq!(record.wait(None).unwrap(), WaitStatus::Exited(3));
    // Waiting again reports the same status
    assert_eq!(
        record.wait(Some(Duration::ZERO)).unwrap(),
        WaitStatus::Exited(3)
    );
}

#[test]
#[serial]
fn test_close_is_idempotent() {
    let mut record = spawn(&SpawnConfig::new("true").with_redirect(Redirect::ALL)).unwrap();
    assert_eq!(record.wait(None).unwrap(), WaitStatus::Exited(0));

    record.close();
    record.close();

    assert!(record.is_closed());
    assert_eq!(record.pid(), CLOSED_PID);
    assert_eq!(record.open_streams(), 0);
    assert!(record.stdout().is_none());
    assert_eq!(record.wait(None).unwrap_err(), ProcessError::Closed);
}

#[test]
#[serial]
fn test_unredirected_streams_are_inherited() {
    let mut record = spawn(&SpawnConfig::new("true")).unwrap();
    assert_eq!(record.open_streams(), 0);
    assert_eq!(record.wait(None).unwrap(), WaitStatus::Exited(0));
}

#[test]
#[serial]
fn test_environment_and_working_dir() {
    let dir = tempfile::tempdir().unwrap();
    let expected_dir = std::fs::canonicalize(dir.path()).unwrap();
    let path = std::env::var("PATH").unwrap_or_else(|_| "/usr/bin:/bin".to_string());

    let config = sh(r#"printf '%s|%s|%s' "$COMPAT_TEST_VAR" "${HOME:-unset}" "$(pwd -P)""#)
        .with_env(vec![
            ("COMPAT_TEST_VAR".to_string(), "yes".to_string()),
            ("PATH".to_string(), path),
        ])
        .with_working_dir(dir.path())
        .with_redirect(Redirect {
            stdin: false,
            stdout: true,
            stderr: false,
        });

    let mut record = spawn(&config).unwrap();
    let mut out = String::new();
    record.stdout().unwrap().read_to_string(&mut out).unwrap();
    assert_eq!(record.wait(None).unwrap(), WaitStatus::Exited(0));

    assert_eq!(out, format!("yes|unset|{}", expected_dir.display()));
}

#[test]
#[serial]
fn test_arguments_reach_child_verbatim() {
    let args = vec![
        "-c".to_string(),
        r#"printf '%s\n' "$@""#.to_string(),
        "sh".to_string(),
        "two words".to_string(),
        String::new(),
        r#"quote " and \ slash"#.to_string(),
    ];
    let mut record = spawn(
        &SpawnConfig::new("sh")
            .with_args(args)
            .with_redirect(Redirect {
                stdin: false,
                stdout: true,
                stderr: false,
            }),
    )
    .unwrap();

    let mut out = String::new();
    record.stdout().unwrap().read_to_string(&mut out).unwrap();
    assert_eq!(record.wait(None).unwrap(), WaitStatus::Exited(0));
    assert_eq!(out, "two words\n\nquote \" and \\ slash\n");
}

#[test]
#[serial]
fn test_kill_terminates_foreign_child() {
    let mut record = spawn(&SpawnConfig::new("sleep").with_args(vec!["5".to_string()])).unwrap();
    let pid = record.pid();

    kill(pid, None).unwrap();
    // Any signal terminates a foreign process
    kill(pid, Some(Signal::SIGUSR1)).unwrap();

    assert_eq!(
        record.wait(Some(Duration::from_secs(2))).unwrap(),
        WaitStatus::Exited(128 + 9)
    );
}

#[test]
#[serial]
fn test_run_to_completion_reports_exit_code() {
    assert_eq!(
        run_to_completion("sh", &["-c".to_string(), "exit 7".to_string()]).unwrap(),
        7
    );
    assert_eq!(
        run_to_completion("posix-compat-no-such-program", &[])
            .unwrap_err()
            .category(),
        ErrorCategory::NotFound
    );
}

#[test]
fn test_fork_always_fails() {
    assert_eq!(fork().unwrap_err(), ProcessError::NotSupported("fork"));
}
