/*!
 * compat-exec
 *
 * Runs a program the way `exec` is emulated: the child is spawned, waited on,
 * and this process exits with the child's exit code. The signal subsystem is
 * live for the duration, so the process answers `signal-interrupt`.
 *
 * Exits 127 when the program cannot be started and 2 on bad arguments.
 */

use miette::Report;
use posix_compat::core::limits::EXEC_FAILURE_EXIT_CODE;
use posix_compat::signals;
use posix_compat::{exec, init_tracing};
use std::process::ExitCode;
use tracing::{error, warn};

fn main() -> ExitCode {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let Some(program) = args.next() else {
        eprintln!("usage: compat-exec <PROGRAM> [ARGS...]");
        return ExitCode::from(2);
    };
    let rest: Vec<String> = args.collect();

    if let Err(e) = signals::initialize() {
        warn!(error = %e, "signal subsystem unavailable");
    }

    let err = exec(&program, &rest);
    signals::teardown();
    error!(program = %program, error = %err, "exec failed");
    eprintln!("{:?}", Report::new(err).wrap_err(format!("compat-exec: {program}")));
    ExitCode::from(EXEC_FAILURE_EXIT_CODE as u8)
}
