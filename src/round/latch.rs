use std::sync::atomic::{AtomicU64, Ordering};

/// One-shot guard shared by every trigger that can close a voting or
/// tie-breaker window.
///
/// Each `arm` opens a new window and returns its epoch. A trigger claims with
/// the epoch it observed, so a trigger left over from an earlier window can
/// never close a later one. Exactly one caller wins `try_claim` per window.
#[derive(Debug, Default)]
pub struct ResolutionLatch {
    /// epoch << 1 | claimed
    state: AtomicU64,
}

impl ResolutionLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the next window and returns its epoch
    pub fn arm(&self) -> u64 {
        let previous = self
            .state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |state| {
                Some(((state >> 1) + 1) << 1)
            })
            .unwrap_or_else(|state| state);
        (previous >> 1) + 1
    }

    /// Epoch of the current window
    pub fn epoch(&self) -> u64 {
        self.state.load(Ordering::SeqCst) >> 1
    }

    /// True for the single caller that closes window `epoch`
    pub fn try_claim(&self, epoch: u64) -> bool {
        let open = epoch << 1;
        self.state
            .compare_exchange(open, open | 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Reopens window `epoch` after its claimant failed to close it
    pub fn release(&self, epoch: u64) {
        let open = epoch << 1;
        let _ = self
            .state
            .compare_exchange(open | 1, open, Ordering::SeqCst, Ordering::SeqCst);
    }

    pub fn is_claimed(&self) -> bool {
        self.state.load(Ordering::SeqCst) & 1 == 1
    }
}
