/*!
 * Synchronization Primitives
 *
 * Kernel-event style primitives built on parking_lot:
 * - `Event`: binary event with auto-reset or manual-reset semantics
 *
 * # Use Cases
 *
 * - **Interrupt indicator**: set by callbacks, consumed by one waiter
 * - **Alarm completion**: observed by callers waiting on a timer
 */

mod event;

pub use event::{Event, ResetMode};
