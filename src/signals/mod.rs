/*!
 * Signals Module
 * UNIX-style signal emulation: handlers, alarms, interrupts and kill
 *
 * Handlers are not run on the stack of an interrupted thread. A registered
 * handler is eventually invoked on some thread (console callback, timer or
 * watcher) concurrently with the host, and the process-wide interrupt
 * indicator becomes observable to waiters. Deliveries made before anyone
 * observes the indicator collapse into one observation.
 */

mod alarm;
mod channel;
pub(crate) mod console;
mod kill;
mod manager;
mod mask;
pub(crate) mod registry;
pub mod types;
mod watcher;

// Re-export public API
pub use alarm::AlarmTimer;
pub use channel::{channel_name, send_interrupt, send_interrupt_with_prefix};
pub use console::{dispatch, ControlEvent, ControlReply};
pub use kill::kill;
pub use manager::{
    alarm, arm_alarm, block_until_alarm, block_until_interrupt, initialize,
    initialize_with_config, is_initialized, teardown,
};
pub use mask::{sigprocmask, MaskHow, SignalSet};
pub use registry::{handler_for, register_handler, HandlerRegistry};
pub use types::{HandlerFn, InterruptWait, Signal, SignalError, SignalHandler, SignalResult};
pub use watcher::{StopOutcome, Watcher};
