/*!
 * Console Control Bridge
 *
 * Maps console control events (Ctrl+C, Ctrl+Break, window close, logoff,
 * shutdown) onto the interrupt disposition and the interrupt indicator.
 */

use super::manager;
use super::registry::{HandlerRegistry, REGISTRY};
use super::types::{Signal, SignalHandler};
use crate::core::sync::Event;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Console control event delivered by the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlEvent {
    Interrupt,
    Break,
    Close,
    Logoff,
    Shutdown,
}

impl ControlEvent {
    /// The session is ending and the OS will terminate the process regardless
    pub fn is_session_end(self) -> bool {
        matches!(
            self,
            ControlEvent::Close | ControlEvent::Logoff | ControlEvent::Shutdown
        )
    }
}

/// Answer returned to the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlReply {
    /// Suppress the default action
    Handled,
    /// Let the OS run the default action (termination)
    NotHandled,
}

/// Decide the reply for one event.
///
/// Interrupt and break consult the `SIGINT` disposition: a callback runs
/// synchronously on the calling thread and the event is handled; ignore is
/// handled too; default is left to the OS. Session-end events always set the
/// indicator so a waiter can see termination coming, then defer to the OS.
pub fn dispatch(event: ControlEvent, registry: &HandlerRegistry, indicator: &Event) -> ControlReply {
    if event.is_session_end() {
        indicator.set();
        return ControlReply::NotHandled;
    }

    match registry.get(Signal::SIGINT) {
        SignalHandler::Handler(callback) => {
            callback(Signal::SIGINT);
            indicator.set();
            ControlReply::Handled
        }
        SignalHandler::Ignore => {
            indicator.set();
            ControlReply::Handled
        }
        SignalHandler::Default => ControlReply::NotHandled,
    }
}

/// Entry point for the platform console hook
pub(crate) fn on_control_event(event: ControlEvent) -> ControlReply {
    let Some(shared) = manager::shared() else {
        return ControlReply::NotHandled;
    };
    let reply = dispatch(event, &REGISTRY, &shared.interrupt);
    debug!(?event, ?reply, "console control event");
    reply
}
