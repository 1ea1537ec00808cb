/*!
 * System Limits and Constants
 *
 * Centralized location for timing bounds, names and magic numbers used by the
 * emulation layer. Values mirror the native behavior they stand in for.
 */

use std::time::Duration;

// =============================================================================
// EXTERNAL INTERRUPT CHANNEL
// =============================================================================

/// Prefix of the named kernel object used for cross-process interrupt requests.
/// The full name is this prefix followed by the decimal process id.
pub const INTERRUPT_CHANNEL_PREFIX: &str = "PosixCompatInterrupt_";

/// How often the watcher thread re-checks its shutdown flag while idle
pub const WATCHER_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Upper bound on joining the watcher thread at teardown.
/// Past this the thread is abandoned rather than blocking shutdown.
pub const WATCHER_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

// =============================================================================
// PROCESS WAIT
// =============================================================================

/// First sleep between exit polls when the platform has no timed wait
pub const WAIT_POLL_INITIAL: Duration = Duration::from_millis(1);

/// Cap on the sleep between exit polls
pub const WAIT_POLL_MAX: Duration = Duration::from_millis(50);

/// Exit code reported for children terminated by a signal is this base plus the
/// signal number, as shells report it
pub const SIGNALED_EXIT_BASE: i32 = 128;

/// Exit code of the exec helper when the program cannot be started
pub const EXEC_FAILURE_EXIT_CODE: i32 = 127;

// =============================================================================
// SIGNAL TABLE
// =============================================================================

/// Number of slots in the handler registry (one per logical signal)
pub const SIGNAL_SLOTS: usize = 14;

// =============================================================================
// SHIMS
// =============================================================================

/// Required suffix of a mkstemp template
pub const TEMPLATE_SUFFIX: &str = "XXXXXX";

/// Console code page selected by console initialization (UTF-8)
pub const UTF8_CODE_PAGE: u32 = 65001;
