/*!
 * External Interrupt Watcher
 *
 * Background thread that owns the named interrupt channel for the lifetime of
 * the signal subsystem. Shutdown is cooperative: a flag plus one final wake,
 * then a bounded join. A watcher that does not exit in time is abandoned.
 */

use crate::sys::NamedEvent;
use flume::RecvTimeoutError;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How a stop request concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Joined,
    /// The thread missed the join deadline and was left running
    Abandoned,
    /// Stop was requested from the watcher thread itself
    Detached,
}

pub struct Watcher {
    channel: Arc<NamedEvent>,
    shutdown: Arc<AtomicBool>,
    exited: flume::Receiver<()>,
    thread: JoinHandle<()>,
}

impl Watcher {
    /// Start watching `channel`, calling `on_interrupt` for every observed request
    pub fn start<F>(channel: NamedEvent, poll_interval: Duration, on_interrupt: F) -> io::Result<Self>
    where
        F: Fn() + Send + 'static,
    {
        let channel = Arc::new(channel);
        let shutdown = Arc::new(AtomicBool::new(false));
        let (exit_tx, exited) = flume::bounded(1);

        let thread = {
            let channel = Arc::clone(&channel);
            let shutdown = Arc::clone(&shutdown);
            thread::Builder::new()
                .name("interrupt-watcher".to_string())
                .spawn(move || {
                    run(&channel, &shutdown, poll_interval, on_interrupt);
                    let _ = exit_tx.send(());
                })?
        };

        debug!(poll_ms = poll_interval.as_millis() as u64, "interrupt watcher started");
        Ok(Self {
            channel,
            shutdown,
            exited,
            thread,
        })
    }

    /// Request shutdown and wait up to `join_timeout` for the thread to exit
    pub fn stop(self, join_timeout: Duration) -> StopOutcome {
        self.shutdown.store(true, Ordering::Release);
        if let Err(e) = self.channel.set() {
            warn!(error = %e, "failed to wake interrupt watcher");
        }

        if thread::current().id() == self.thread.thread().id() {
            debug!("interrupt watcher stopped from its own thread; detaching");
            return StopOutcome::Detached;
        }

        match self.exited.recv_timeout(join_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if self.thread.join().is_err() {
                    warn!("interrupt watcher panicked");
                }
                info!("interrupt watcher stopped");
                StopOutcome::Joined
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    timeout_ms = join_timeout.as_millis() as u64,
                    "interrupt watcher did not exit in time; abandoning thread"
                );
                StopOutcome::Abandoned
            }
        }
    }
}

fn run<F: Fn()>(channel: &NamedEvent, shutdown: &AtomicBool, poll_interval: Duration, on_interrupt: F) {
    while !shutdown.load(Ordering::Acquire) {
        match channel.wait(poll_interval) {
            Ok(true) => {
                // The final wake from stop() is not a delivery
                if shutdown.load(Ordering::Acquire) {
                    break;
                }
                debug!("external interrupt received");
                on_interrupt();
            }
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "interrupt channel wait failed");
                thread::sleep(poll_interval);
            }
        }
    }
}
