/*!
 * Binary Event
 *
 * Condvar-backed equivalent of a native kernel event object.
 * Setting an already-set event is a no-op, so deliveries that arrive before
 * anyone observes the event collapse into a single observation.
 */

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// How a signaled event returns to the unsignaled state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    /// The first waiter to observe the event clears it
    Auto,
    /// The event stays set until `reset` is called
    Manual,
}

/// Binary event
pub struct Event {
    signaled: Mutex<bool>,
    condvar: Condvar,
    mode: ResetMode,
}

impl Event {
    pub fn new(mode: ResetMode) -> Self {
        Self {
            signaled: Mutex::new(false),
            condvar: Condvar::new(),
            mode,
        }
    }

    /// Auto-reset event, the shape of the interrupt indicator
    pub fn auto_reset() -> Self {
        Self::new(ResetMode::Auto)
    }

    /// Signal the event, waking one waiter (auto) or all waiters (manual)
    pub fn set(&self) {
        let mut signaled = self.signaled.lock();
        *signaled = true;
        if self.mode == ResetMode::Auto {
            self.condvar.notify_one();
        } else {
            self.condvar.notify_all();
        }
    }

    /// Clear the event without waiting
    pub fn reset(&self) {
        *self.signaled.lock() = false;
    }

    /// Check the state without consuming it
    pub fn is_set(&self) -> bool {
        *self.signaled.lock()
    }

    /// Wait until the event is signaled or the bound elapses.
    ///
    /// Returns `true` when the event was observed. `None` waits forever.
    pub fn wait(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut signaled = self.signaled.lock();

        while !*signaled {
            match (timeout, deadline) {
                (None, _) | (Some(_), None) => self.condvar.wait(&mut signaled),
                (Some(_), Some(deadline)) => {
                    if self.condvar.wait_until(&mut signaled, deadline).timed_out() {
                        break;
                    }
                }
            }
        }

        let observed = *signaled;
        if observed && self.mode == ResetMode::Auto {
            *signaled = false;
        }
        observed
    }

    /// Consume the event if it is set, without blocking
    pub fn try_wait(&self) -> bool {
        self.wait(Some(Duration::ZERO))
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::auto_reset()
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("mode", &self.mode)
            .field("signaled", &self.is_set())
            .finish()
    }
}
