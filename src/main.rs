/*!
 * signal-interrupt
 *
 * Requests an interrupt in another process through its named interrupt
 * channel.
 *
 * Exit codes: 0 delivered, 1 bad arguments, 2 channel not found, 3 other failure.
 */

use anyhow::{Context, Result};
use miette::Report;
use posix_compat::{init_tracing, send_interrupt, Pid, SignalError};
use std::process::ExitCode;
use tracing::{debug, error};

const USAGE: &str = "usage: signal-interrupt <PID>";

fn parse_pid(args: &[String]) -> Result<Pid> {
    match args {
        [pid] => pid
            .parse::<Pid>()
            .with_context(|| format!("invalid pid '{pid}'")),
        _ => anyhow::bail!("expected exactly one argument"),
    }
}

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let pid = match parse_pid(&args) {
        Ok(pid) => pid,
        Err(e) => {
            eprintln!("{e:#}\n{USAGE}");
            return ExitCode::from(1);
        }
    };

    match send_interrupt(pid) {
        Ok(()) => {
            debug!(pid, "interrupt delivered");
            ExitCode::SUCCESS
        }
        Err(e @ SignalError::ChannelNotFound(_)) => {
            eprintln!("{:?}", Report::new(e));
            ExitCode::from(2)
        }
        Err(e) => {
            error!(pid, error = %e, "interrupt request failed");
            eprintln!("{:?}", Report::new(e));
            ExitCode::from(3)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pid() {
        assert_eq!(parse_pid(&["42".to_string()]).unwrap(), 42);
        assert!(parse_pid(&[]).is_err());
        assert!(parse_pid(&["x".to_string()]).is_err());
        assert!(parse_pid(&["1".to_string(), "2".to_string()]).is_err());
    }
}
