/*!
 * Handler Registry
 *
 * Fixed table of dispositions indexed by logical signal. Slots are atomic
 * pointer swaps so callback threads (and the native trampoline) never observe
 * a torn value. A callback already in flight at registration time may still
 * run the previous handler.
 */

use super::types::{Signal, SignalError, SignalHandler, SignalResult};
use crate::core::limits::SIGNAL_SLOTS;
use crate::sys::{self, NativeDisposition};
use arc_swap::ArcSwapOption;
use std::io;
use std::sync::Arc;
use tracing::debug;

/// Disposition table. An empty slot is the default disposition.
pub struct HandlerRegistry {
    slots: [ArcSwapOption<SignalHandler>; SIGNAL_SLOTS],
}

impl HandlerRegistry {
    pub const fn new() -> Self {
        Self {
            slots: [const { ArcSwapOption::const_empty() }; SIGNAL_SLOTS],
        }
    }

    /// Current disposition for a signal
    pub fn get(&self, signal: Signal) -> SignalHandler {
        self.slots[signal.slot()]
            .load_full()
            .map(|handler| (*handler).clone())
            .unwrap_or_default()
    }

    /// Store a disposition, returning the previous one
    pub fn swap(&self, signal: Signal, handler: SignalHandler) -> SignalHandler {
        let next = if handler.is_default() {
            None
        } else {
            Some(Arc::new(handler))
        };
        self.slots[signal.slot()]
            .swap(next)
            .map(|previous| (*previous).clone())
            .unwrap_or_default()
    }

    /// Run the installed callback, if any. Returns whether one ran.
    pub fn invoke(&self, signal: Signal) -> bool {
        match &*self.slots[signal.slot()].load() {
            Some(handler) => handler.invoke(signal),
            None => false,
        }
    }

    /// Return every slot to the default disposition
    pub fn clear(&self) {
        for slot in &self.slots {
            slot.store(None);
        }
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide table read by every delivery path
pub(crate) static REGISTRY: HandlerRegistry = HandlerRegistry::new();

fn native_disposition(handler: &SignalHandler) -> NativeDisposition {
    match handler {
        SignalHandler::Default => NativeDisposition::Default,
        SignalHandler::Ignore => NativeDisposition::Ignore,
        SignalHandler::Handler(_) => NativeDisposition::Trampoline,
    }
}

/// Install a disposition and return the previous one.
///
/// Emulated signals (`SIGINT`, `SIGALRM`, `SIGUSR1`) only update the table.
/// Every other signal is also installed with the native facility, which
/// routes delivery back through the same table. `SIGHUP` is left to the
/// console bridge and refused. Registration never invokes the handler.
///
/// Handlers run on whichever thread delivers the signal, concurrently with
/// the rest of the program.
pub fn register_handler(signal: Signal, handler: SignalHandler) -> SignalResult<SignalHandler> {
    if !signal.can_catch() {
        return Err(SignalError::NotSupported(
            signal,
            "cannot be caught or ignored",
        ));
    }

    let disposition = native_disposition(&handler);
    let previous = REGISTRY.swap(signal, handler);

    if !signal.is_emulated() {
        if let Err(e) = sys::install_native(signal, disposition) {
            REGISTRY.swap(signal, previous);
            return Err(match e.kind() {
                io::ErrorKind::Unsupported => {
                    SignalError::NotSupported(signal, "no native counterpart on this platform")
                }
                _ => SignalError::OperationFailed(format!("install {signal}: {e}")),
            });
        }
    }

    debug!(%signal, ?disposition, "handler registered");
    Ok(previous)
}

/// Current disposition for a signal
pub fn handler_for(signal: Signal) -> SignalHandler {
    REGISTRY.get(signal)
}

/// Entry point for the native trampoline. Only lock-free table loads happen
/// before the callback runs.
pub(crate) fn dispatch_native(signal: Signal) {
    REGISTRY.invoke(signal);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_swap_returns_previous() {
        let registry = HandlerRegistry::new();
        let first = SignalHandler::handler(|_| {});

        let previous = registry.swap(Signal::SIGALRM, first.clone());
        assert!(previous.is_default());

        let previous = registry.swap(Signal::SIGALRM, SignalHandler::Ignore);
        assert!(previous.same_as(&first));

        let previous = registry.swap(Signal::SIGALRM, SignalHandler::Default);
        assert!(previous.is_ignore());
        assert!(registry.get(Signal::SIGALRM).is_default());
    }

    #[test]
    fn test_slots_are_independent() {
        let registry = HandlerRegistry::new();
        registry.swap(Signal::SIGINT, SignalHandler::Ignore);
        assert!(registry.get(Signal::SIGINT).is_ignore());
        assert!(registry.get(Signal::SIGUSR1).is_default());
    }

    #[test]
    fn test_invoke_only_runs_callbacks() {
        let registry = HandlerRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();

        assert!(!registry.invoke(Signal::SIGUSR1));
        registry.swap(Signal::SIGUSR1, SignalHandler::Ignore);
        assert!(!registry.invoke(Signal::SIGUSR1));

        registry.swap(
            Signal::SIGUSR1,
            SignalHandler::handler(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert!(registry.invoke(Signal::SIGUSR1));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        registry.clear();
        assert!(!registry.invoke(Signal::SIGUSR1));
    }

    #[test]
    fn test_kill_cannot_be_registered() {
        let err = register_handler(Signal::SIGKILL, SignalHandler::Ignore).unwrap_err();
        assert!(matches!(err, SignalError::NotSupported(Signal::SIGKILL, _)));
        assert!(handler_for(Signal::SIGKILL).is_default());
    }
}
