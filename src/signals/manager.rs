/*!
 * Signal Subsystem Manager
 *
 * Owns the process-wide emulation state: the interrupt indicator, the alarm
 * indicator and timer, the console bridge and the interrupt watcher.
 * Callback threads reach the state through an atomic pointer; lifecycle
 * operations are serialized by a mutex.
 */

use super::alarm::AlarmTimer;
use super::channel::channel_name;
use super::registry::REGISTRY;
use super::types::{InterruptWait, Signal, SignalError, SignalResult};
use super::watcher::{StopOutcome, Watcher};
use crate::core::config::CompatConfig;
use crate::core::sync::Event;
use crate::core::types::current_pid;
use crate::monitoring::span_operation;
use crate::sys::{self, NamedEvent};
use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// State shared with callback threads
pub(crate) struct Shared {
    pub(crate) interrupt: Event,
    pub(crate) alarm_done: Event,
    pub(crate) alarm: AlarmTimer,
}

impl Shared {
    fn new() -> Self {
        Self {
            interrupt: Event::auto_reset(),
            alarm_done: Event::auto_reset(),
            alarm: AlarmTimer::new(),
        }
    }
}

struct SignalSubsystem {
    shared: Arc<Shared>,
    watcher: Watcher,
    config: CompatConfig,
    channel: String,
}

static SHARED: ArcSwapOption<Shared> = ArcSwapOption::const_empty();
static SUBSYSTEM: Mutex<Option<SignalSubsystem>> = parking_lot::const_mutex(None);

pub(crate) fn shared() -> Option<Arc<Shared>> {
    SHARED.load_full()
}

fn require_shared() -> SignalResult<Arc<Shared>> {
    shared().ok_or(SignalError::NotInitialized)
}

/// Initialize with configuration from the environment
pub fn initialize() -> SignalResult<()> {
    initialize_with_config(CompatConfig::from_env())
}

/// Create the indicators and the interrupt channel, start the watcher and
/// install the console bridge. Nothing is left behind on failure.
pub fn initialize_with_config(config: CompatConfig) -> SignalResult<()> {
    let mut subsystem = SUBSYSTEM.lock();
    if subsystem.is_some() {
        return Err(SignalError::AlreadyInitialized);
    }

    let shared = Arc::new(Shared::new());
    let channel = channel_name(&config.channel_prefix, current_pid());
    let event = NamedEvent::create(&channel)
        .map_err(|e| SignalError::EventCreation(format!("{channel}: {e}")))?;

    let delivery = Arc::clone(&shared);
    let watcher = Watcher::start(event, config.watcher_poll_interval, move || {
        REGISTRY.invoke(Signal::SIGINT);
        delivery.interrupt.set();
    })
    .map_err(|e| SignalError::OperationFailed(format!("start interrupt watcher: {e}")))?;

    SHARED.store(Some(Arc::clone(&shared)));
    if let Err(e) = sys::install_console_hook() {
        warn!(error = %e, "console control bridge unavailable");
    }

    info!(channel = %channel, "signal subsystem initialized");
    *subsystem = Some(SignalSubsystem {
        shared,
        watcher,
        config,
        channel,
    });
    Ok(())
}

/// Stop the watcher, cancel the alarm and release the indicators. Safe to
/// call when not initialized.
pub fn teardown() {
    let mut guard = SUBSYSTEM.lock();
    let Some(subsystem) = guard.take() else {
        return;
    };
    let span = span_operation("signal_teardown");
    let _entered = span.enter();

    sys::remove_console_hook();
    SHARED.store(None);
    subsystem.shared.alarm.cancel();
    let outcome = subsystem
        .watcher
        .stop(subsystem.config.watcher_join_timeout);

    span.record_result(outcome == StopOutcome::Joined);
    info!(channel = %subsystem.channel, ?outcome, "signal subsystem torn down");
}

/// Whether the subsystem is currently initialized
pub fn is_initialized() -> bool {
    SUBSYSTEM.lock().is_some()
}

/// Schedule `SIGALRM` after `duration`, cancelling any pending alarm. Zero
/// only cancels. Returns the previous remaining time, always zero.
///
/// On fire the alarm handler runs on the timer thread, then the interrupt
/// and alarm indicators are set.
pub fn arm_alarm(duration: Duration) -> SignalResult<Duration> {
    let shared = require_shared()?;
    let target = Arc::downgrade(&shared);

    shared
        .alarm
        .arm(duration, move || {
            let Some(shared) = target.upgrade() else {
                return;
            };
            REGISTRY.invoke(Signal::SIGALRM);
            shared.interrupt.set();
            shared.alarm_done.set();
        })
        .map_err(|e| SignalError::OperationFailed(format!("arm alarm: {e}")))?;

    Ok(Duration::ZERO)
}

/// Seconds-based `alarm`. Failures are logged and reported as zero.
pub fn alarm(seconds: u32) -> u32 {
    match arm_alarm(Duration::from_secs(u64::from(seconds))) {
        Ok(previous) => previous.as_secs() as u32,
        Err(e) => {
            warn!(seconds, error = %e, "alarm not armed");
            0
        }
    }
}

fn block_on(event: &Event, timeout: Option<Duration>) -> InterruptWait {
    if event.wait(timeout) {
        InterruptWait::Interrupted
    } else {
        InterruptWait::TimedOut
    }
}

/// Wait for and consume the interrupt indicator. `None` waits forever.
pub fn block_until_interrupt(timeout: Option<Duration>) -> SignalResult<InterruptWait> {
    Ok(block_on(&require_shared()?.interrupt, timeout))
}

/// Wait for and consume the alarm indicator. `None` waits forever.
pub fn block_until_alarm(timeout: Option<Duration>) -> SignalResult<InterruptWait> {
    Ok(block_on(&require_shared()?.alarm_done, timeout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_operations_require_initialization() {
        teardown();
        assert!(!is_initialized());
        assert_eq!(
            block_until_interrupt(Some(Duration::ZERO)).unwrap_err(),
            SignalError::NotInitialized
        );
        assert_eq!(
            arm_alarm(Duration::from_secs(1)).unwrap_err(),
            SignalError::NotInitialized
        );
        assert_eq!(alarm(1), 0);
    }

    #[test]
    #[serial]
    fn test_double_initialize() {
        let config = CompatConfig::default()
            .with_channel_prefix("posix-compat-manager-double-")
            .with_poll_interval(Duration::from_millis(20));
        initialize_with_config(config.clone()).unwrap();
        assert_eq!(
            initialize_with_config(config).unwrap_err(),
            SignalError::AlreadyInitialized
        );
        teardown();
        teardown();
        assert!(!is_initialized());
    }
}
