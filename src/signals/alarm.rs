/*!
 * Alarm Timer
 *
 * Single-shot timer with cancel-and-replace semantics. Each arm runs on its
 * own thread parked on a condvar until the deadline. Cancellation waits for
 * an in-flight callback, and a timer only fires while its generation is the
 * latest.
 */

use parking_lot::{Condvar, Mutex};
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Pending,
    Cancelled,
    Fired,
}

struct ArmState {
    state: Mutex<TimerState>,
    condvar: Condvar,
    /// Generation this arm was issued for
    generation: u64,
}

struct ActiveTimer {
    arm: Arc<ArmState>,
    thread: JoinHandle<()>,
}

impl ActiveTimer {
    /// Cancel the timer and wait for a callback already running, unless the
    /// caller is that callback
    fn cancel(self) {
        {
            let mut state = self.arm.state.lock();
            if *state == TimerState::Pending {
                *state = TimerState::Cancelled;
                self.arm.condvar.notify_one();
            }
        }

        if thread::current().id() == self.thread.thread().id() {
            return;
        }
        if self.thread.join().is_err() {
            warn!("alarm callback panicked");
        }
    }
}

/// Park until the deadline, then fire if this arm is still the latest one.
/// Returns whether `on_fire` ran.
fn run_timer<F: FnOnce()>(
    arm: &ArmState,
    current: &AtomicU64,
    deadline: Option<Instant>,
    on_fire: F,
) -> bool {
    {
        let mut state = arm.state.lock();
        while *state == TimerState::Pending {
            match deadline {
                Some(deadline) => {
                    if arm.condvar.wait_until(&mut state, deadline).timed_out() {
                        break;
                    }
                }
                None => arm.condvar.wait(&mut state),
            }
        }
        // A newer arm or a cancel may not have reached this timer yet
        if *state != TimerState::Pending || current.load(Ordering::SeqCst) != arm.generation {
            return false;
        }
        *state = TimerState::Fired;
    }
    debug!("alarm fired");
    on_fire();
    true
}

/// At most one outstanding single-shot timer.
///
/// Every arm and cancel bumps a generation counter, and a timer only fires
/// while its generation is current, so concurrent arms never let a displaced
/// timer fire.
pub struct AlarmTimer {
    active: Mutex<Option<ActiveTimer>>,
    generation: Arc<AtomicU64>,
}

impl AlarmTimer {
    pub fn new() -> Self {
        Self {
            active: Mutex::new(None),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Cancel any outstanding timer, then schedule `on_fire` after `duration`.
    /// A zero duration only cancels.
    pub fn arm<F>(&self, duration: Duration, on_fire: F) -> io::Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.cancel_before(generation);
        if duration.is_zero() {
            return Ok(());
        }

        let arm = Arc::new(ArmState {
            state: Mutex::new(TimerState::Pending),
            condvar: Condvar::new(),
            generation,
        });
        let timer_arm = Arc::clone(&arm);
        let current = Arc::clone(&self.generation);
        let deadline = Instant::now().checked_add(duration);

        let thread = thread::Builder::new()
            .name("alarm-timer".to_string())
            .spawn(move || {
                run_timer(&timer_arm, &current, deadline, on_fire);
            })?;

        let timer = ActiveTimer { arm, thread };
        let mut active = self.active.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            // Superseded while spawning
            drop(active);
            timer.cancel();
            return Ok(());
        }
        let displaced = active.replace(timer);
        drop(active);
        if let Some(displaced) = displaced {
            displaced.cancel();
        }
        Ok(())
    }

    /// Cancel the outstanding timer, if any
    pub fn cancel(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.cancel_before(generation);
    }

    /// Cancel the stored timer if it was issued before `generation`
    fn cancel_before(&self, generation: u64) {
        let stale = {
            let mut active = self.active.lock();
            if active
                .as_ref()
                .is_some_and(|timer| timer.arm.generation < generation)
            {
                active.take()
            } else {
                None
            }
        };
        if let Some(stale) = stale {
            stale.cancel();
        }
    }

    /// Whether a timer is armed and has neither fired nor been cancelled
    pub fn is_pending(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|active| *active.arm.state.lock() == TimerState::Pending)
    }
}

impl Default for AlarmTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AlarmTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let make = move || -> Box<dyn FnOnce() + Send> {
            let c = c.clone();
            Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
        };
        (count, make)
    }

    #[test]
    fn test_fires_once() {
        let timer = AlarmTimer::new();
        let (count, make) = counter();

        timer.arm(Duration::from_millis(20), make()).unwrap();
        assert!(timer.is_pending());
        thread::sleep(Duration::from_millis(150));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!timer.is_pending());
    }

    #[test]
    fn test_zero_cancels() {
        let timer = AlarmTimer::new();
        let (count, make) = counter();

        timer.arm(Duration::from_millis(50), make()).unwrap();
        timer.arm(Duration::ZERO, make()).unwrap();
        thread::sleep(Duration::from_millis(150));

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!timer.is_pending());
    }

    #[test]
    fn test_rearm_replaces() {
        let timer = AlarmTimer::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let f = first.clone();
        timer
            .arm(Duration::from_millis(200), move || {
                f.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        let s = second.clone();
        timer
            .arm(Duration::from_millis(20), move || {
                s.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        thread::sleep(Duration::from_millis(400));
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_waits_for_running_callback() {
        let timer = AlarmTimer::new();
        let done = Arc::new(AtomicUsize::new(0));
        let d = done.clone();

        timer
            .arm(Duration::from_millis(1), move || {
                thread::sleep(Duration::from_millis(100));
                d.store(1, Ordering::SeqCst);
            })
            .unwrap();
        thread::sleep(Duration::from_millis(30));
        timer.cancel();

        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stale_generation_does_not_fire() {
        let arm = ArmState {
            state: Mutex::new(TimerState::Pending),
            condvar: Condvar::new(),
            generation: 1,
        };
        let current = AtomicU64::new(2);
        let fired = AtomicUsize::new(0);

        let ran = run_timer(&arm, &current, Some(Instant::now()), || {
            fired.fetch_add(1, Ordering::SeqCst);
        });
        assert!(!ran);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(*arm.state.lock(), TimerState::Pending);

        current.store(1, Ordering::SeqCst);
        assert!(run_timer(&arm, &current, Some(Instant::now()), || {
            fired.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_arms_fire_once() {
        for _ in 0..10 {
            let timer = Arc::new(AlarmTimer::new());
            let count = Arc::new(AtomicUsize::new(0));
            let barrier = Arc::new(std::sync::Barrier::new(4));

            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let timer = Arc::clone(&timer);
                    let count = count.clone();
                    let barrier = barrier.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        timer
                            .arm(Duration::from_millis(100), move || {
                                count.fetch_add(1, Ordering::SeqCst);
                            })
                            .unwrap();
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            thread::sleep(Duration::from_millis(300));
            assert_eq!(count.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn test_rearm_from_callback() {
        let timer = Arc::new(AlarmTimer::new());
        let count = Arc::new(AtomicUsize::new(0));

        let t = Arc::clone(&timer);
        let c = count.clone();
        timer
            .arm(Duration::from_millis(10), move || {
                c.fetch_add(1, Ordering::SeqCst);
                let c = c.clone();
                t.arm(Duration::from_millis(10), move || {
                    c.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
            })
            .unwrap();

        thread::sleep(Duration::from_millis(200));
        assert_eq!(count.load(Ordering::SeqCst), 2);
        timer.cancel();
    }
}
