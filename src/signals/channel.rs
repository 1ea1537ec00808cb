/*!
 * External Interrupt Channel
 * Naming and the client side of the cross-process interrupt protocol
 */

use super::types::{SignalError, SignalResult};
use crate::core::config::CompatConfig;
use crate::core::types::Pid;
use crate::sys::NamedEvent;
use std::io;
use tracing::debug;

/// Channel name for a process: the prefix followed by the decimal pid
pub fn channel_name(prefix: &str, pid: Pid) -> String {
    format!("{prefix}{pid}")
}

/// Request an interrupt in another process through its named channel.
///
/// The prefix comes from `COMPAT_CHANNEL_PREFIX` when set.
pub fn send_interrupt(pid: Pid) -> SignalResult<()> {
    send_interrupt_with_prefix(&CompatConfig::from_env().channel_prefix, pid)
}

pub fn send_interrupt_with_prefix(prefix: &str, pid: Pid) -> SignalResult<()> {
    let name = channel_name(prefix, pid);
    let channel = NamedEvent::open(&name).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SignalError::ChannelNotFound(pid),
        io::ErrorKind::PermissionDenied => SignalError::PermissionDenied(pid),
        _ => SignalError::OperationFailed(format!("open {name}: {e}")),
    })?;

    channel
        .set()
        .map_err(|e| SignalError::OperationFailed(format!("signal {name}: {e}")))?;

    debug!(pid, channel = %name, "interrupt requested");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_name() {
        assert_eq!(
            channel_name("PosixCompatInterrupt_", 4242),
            "PosixCompatInterrupt_4242"
        );
    }

    #[test]
    fn test_missing_channel() {
        let err = send_interrupt_with_prefix("posix-compat-missing-", u32::MAX).unwrap_err();
        assert_eq!(err, SignalError::ChannelNotFound(u32::MAX));
    }
}
