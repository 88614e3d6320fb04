//! Cooperative cancellation.
//!
//! A [`CancelToken`] is a cloneable flag: hand a clone to whatever might
//! want to stop the call (a signal handler, another thread, a timeout)
//! and pass the original into the driver. The drivers poll it at loop
//! boundaries only, so a trip is observed between probes/cells, never
//! mid-kernel. Nothing process-wide is installed or mutated; the token
//! dies with its owners.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A flag that asks an in-flight counting call to stop.
///
/// On trip the call discards all partial state and reports the
/// interrupted outcome; it never returns a partial success.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    /// request cancellation (callable from any thread, any number of times)
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let remote = token.clone();
        assert!(!token.is_cancelled());
        remote.cancel();
        assert!(token.is_cancelled());
    }
}
