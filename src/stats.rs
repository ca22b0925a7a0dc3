use std::sync::{PoisonError, RwLock};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    pub total: u64,
    pub succeeded: u64,
}

/// Attempt and success counters. Both only ever grow.
#[derive(Debug, Default)]
pub struct StatsCounter {
    inner: RwLock<TransferStats>,
}

impl StatsCounter {
    pub fn record_attempt(&self) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .total += 1;
    }

    pub fn record_success(&self) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .succeeded += 1;
    }

    pub fn snapshot(&self) -> TransferStats {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}
