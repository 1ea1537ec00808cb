/*!
 * Core Types
 * Common types used across the emulation layer
 */

use std::time::Duration;

/// Native process identifier
pub type Pid = u32;

/// Convert an optional bound to whole milliseconds for native waits.
/// `None` maps to `u32::MAX`, which native APIs treat as "infinite".
pub fn timeout_millis(timeout: Option<Duration>) -> u32 {
    match timeout {
        None => u32::MAX,
        Some(d) => u32::try_from(d.as_millis())
            .unwrap_or(u32::MAX - 1)
            .min(u32::MAX - 1),
    }
}

/// Identifier of the current process
pub fn current_pid() -> Pid {
    std::process::id()
}
