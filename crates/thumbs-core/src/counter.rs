//! Per-stage byte counters.
//!
//! Each stage owns one `TallyCounter`; workers update it only through the
//! lock-guarded `record_*` methods. Bytes accumulate as a running sum: the
//! resize tally counts every variant written, not only the last one.

use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Snapshot of one stage's totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageTally {
    /// Files successfully produced by the stage.
    pub files: u64,
    /// Sum of the sizes of those files.
    pub bytes: u64,
    /// Items the stage gave up on (logged and skipped).
    pub failures: u64,
}

#[derive(Debug, Default)]
pub struct TallyCounter {
    inner: Mutex<StageTally>,
}

impl TallyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StageTally> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add one produced file of `bytes` size.
    pub fn record_file(&self, bytes: u64) {
        let mut tally = self.lock();
        tally.files += 1;
        tally.bytes += bytes;
    }

    pub fn record_failure(&self) {
        self.lock().failures += 1;
    }

    pub fn snapshot(&self) -> StageTally {
        *self.lock()
    }
}
