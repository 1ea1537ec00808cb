/*!
 * External Interrupt Channel Tests
 * Cross-process interrupt requests through the named channel and watcher
 */

use posix_compat::signals::*;
use posix_compat::CompatConfig;
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn prefix(tag: &str) -> String {
    format!("posix-compat-channel-{tag}-")
}

fn start(tag: &str) {
    let config = CompatConfig::default()
        .with_channel_prefix(prefix(tag))
        .with_poll_interval(Duration::from_millis(20));
    initialize_with_config(config).unwrap();
}

fn install_counter() -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    register_handler(
        Signal::SIGINT,
        SignalHandler::handler(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }),
    )
    .unwrap();
    count
}

#[test]
#[serial]
fn test_external_interrupt_invokes_handler() {
    let count = install_counter();
    start("deliver");

    send_interrupt_with_prefix(&prefix("deliver"), std::process::id()).unwrap();
    assert_eq!(
        block_until_interrupt(Some(Duration::from_secs(2))).unwrap(),
        InterruptWait::Interrupted
    );
    // The handler runs before the indicator is set
    assert_eq!(count.load(Ordering::SeqCst), 1);

    teardown();
    register_handler(Signal::SIGINT, SignalHandler::Default).unwrap();
}

#[test]
#[serial]
fn test_two_interrupts_collapse() {
    start("collapse");
    let pid = std::process::id();

    send_interrupt_with_prefix(&prefix("collapse"), pid).unwrap();
    send_interrupt_with_prefix(&prefix("collapse"), pid).unwrap();
    thread::sleep(Duration::from_millis(300));

    assert_eq!(
        block_until_interrupt(Some(Duration::from_secs(1))).unwrap(),
        InterruptWait::Interrupted
    );
    assert_eq!(
        block_until_interrupt(Some(Duration::from_millis(200))).unwrap(),
        InterruptWait::TimedOut
    );

    teardown();
}

#[test]
#[serial]
fn test_concurrent_senders_collapse() {
    start("concurrent");
    let pid = std::process::id();

    let senders: Vec<_> = (0..2)
        .map(|_| thread::spawn(move || send_interrupt_with_prefix(&prefix("concurrent"), pid)))
        .collect();
    for sender in senders {
        sender.join().unwrap().unwrap();
    }
    thread::sleep(Duration::from_millis(300));

    assert_eq!(
        block_until_interrupt(Some(Duration::from_secs(1))).unwrap(),
        InterruptWait::Interrupted
    );
    assert_eq!(
        block_until_interrupt(Some(Duration::from_millis(200))).unwrap(),
        InterruptWait::TimedOut
    );

    teardown();
}

#[test]
#[serial]
fn test_teardown_wake_is_not_an_interrupt() {
    let count = install_counter();
    start("teardown");
    teardown();

    assert_eq!(count.load(Ordering::SeqCst), 0);
    register_handler(Signal::SIGINT, SignalHandler::Default).unwrap();
}

#[test]
#[serial]
fn test_channel_gone_after_teardown() {
    start("gone");
    teardown();

    assert_eq!(
        send_interrupt_with_prefix(&prefix("gone"), std::process::id()).unwrap_err(),
        SignalError::ChannelNotFound(std::process::id())
    );
}

#[test]
#[serial]
fn test_reinitialize_after_teardown() {
    for _ in 0..3 {
        start("cycle");
        send_interrupt_with_prefix(&prefix("cycle"), std::process::id()).unwrap();
        assert_eq!(
            block_until_interrupt(Some(Duration::from_secs(2))).unwrap(),
            InterruptWait::Interrupted
        );
        teardown();
    }
}

#[test]
fn test_unknown_process_has_no_channel() {
    assert_eq!(
        send_interrupt_with_prefix(&prefix("unknown"), 4_000_000_000).unwrap_err(),
        SignalError::ChannelNotFound(4_000_000_000)
    );
}
