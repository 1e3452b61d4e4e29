//! Cooperative cancellation primitives (spec.md §5).
//!
//! The core imposes no internal deadlines; timeouts are the oracle's
//! concern. What the core does guarantee is that any in-flight oracle
//! call can be told to stop, and that cancellation never commits partial
//! state to the predicate store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cancellation signal a host can flip to abort an in-flight oracle call.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A one-shot flag the host observes to learn that the guard has
/// terminated the intercepted workflow (spec.md §6's "external
/// termination flag object with a single `set()` operation").
#[derive(Debug, Clone, Default)]
pub struct OneShotFlag {
    set: Arc<AtomicBool>,
}

impl OneShotFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.set.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.set.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_token_starts_uncancelled() {
        assert!(!CancellationToken::new().is_cancelled());
    }

    #[test]
    fn cancellation_token_is_shared_across_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn one_shot_flag_is_irrevocable() {
        let flag = OneShotFlag::new();
        assert!(!flag.is_set());
        flag.set();
        assert!(flag.is_set());
        // setting again is a no-op, not an error
        flag.set();
        assert!(flag.is_set());
    }
}
