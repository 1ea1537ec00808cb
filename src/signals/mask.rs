/*!
 * Signal Mask
 *
 * Process-wide mask kept only so callers that save and restore a mask around
 * critical sections keep working. It never affects delivery.
 */

use super::types::Signal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Set of logical signals
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalSet(u64);

impl SignalSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn full() -> Self {
        Signal::ALL.into_iter().collect()
    }

    pub fn add(&mut self, signal: Signal) {
        self.0 |= 1u64 << signal.slot();
    }

    pub fn remove(&mut self, signal: Signal) {
        self.0 &= !(1u64 << signal.slot());
    }

    pub fn contains(&self, signal: Signal) -> bool {
        self.0 & (1u64 << signal.slot()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Signal> + '_ {
        Signal::ALL.into_iter().filter(|s| self.contains(*s))
    }
}

impl FromIterator<Signal> for SignalSet {
    fn from_iter<I: IntoIterator<Item = Signal>>(iter: I) -> Self {
        let mut set = Self::empty();
        for signal in iter {
            set.add(signal);
        }
        set
    }
}

impl fmt::Debug for SignalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// How `sigprocmask` combines the given set with the current mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskHow {
    Block,
    Unblock,
    SetMask,
}

static MASK: AtomicU64 = AtomicU64::new(0);

/// Update the process mask and return the previous one. With `None` the mask
/// is only read.
pub fn sigprocmask(how: MaskHow, set: Option<SignalSet>) -> SignalSet {
    let Some(SignalSet(bits)) = set else {
        return SignalSet(MASK.load(Ordering::SeqCst));
    };

    let previous = match how {
        MaskHow::Block => MASK.fetch_or(bits, Ordering::SeqCst),
        MaskHow::Unblock => MASK.fetch_and(!bits, Ordering::SeqCst),
        MaskHow::SetMask => MASK.swap(bits, Ordering::SeqCst),
    };
    SignalSet(previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    #[test]
    fn test_set_operations() {
        let mut set = SignalSet::empty();
        set.add(Signal::SIGINT);
        set.add(Signal::SIGTERM);
        assert!(set.contains(Signal::SIGINT));
        assert!(!set.contains(Signal::SIGALRM));

        set.remove(Signal::SIGINT);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Signal::SIGTERM]);
        assert_eq!(SignalSet::full().iter().count(), Signal::ALL.len());
    }

    #[test]
    #[serial]
    fn test_mask_echoes_stored_value() {
        let saved = sigprocmask(MaskHow::SetMask, Some(SignalSet::empty()));

        let block: SignalSet = [Signal::SIGINT, Signal::SIGALRM].into_iter().collect();
        assert_eq!(sigprocmask(MaskHow::Block, Some(block)), SignalSet::empty());
        assert_eq!(sigprocmask(MaskHow::Block, None), block);

        let unblock: SignalSet = [Signal::SIGINT].into_iter().collect();
        assert_eq!(sigprocmask(MaskHow::Unblock, Some(unblock)), block);
        assert_eq!(
            sigprocmask(MaskHow::SetMask, None),
            [Signal::SIGALRM].into_iter().collect()
        );

        sigprocmask(MaskHow::SetMask, Some(saved));
    }
}
