//! Per-queue-pair stats counters.
//!
//! One instance lives inside each `QueuePair`; `qat_sym_stats_get`/`_reset`
//! in the original driver only ever aggregate a `qp->stats` struct the queue
//! pair already owns, so this crate keeps the counters colocated rather than
//! global.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lightweight burst counters for a single queue pair.
pub struct QpStats {
    pub enqueued: AtomicU64,
    pub dequeued: AtomicU64,
    pub enqueue_err: AtomicU64,
    pub dequeue_err: AtomicU64,
}

impl QpStats {
    pub const fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            dequeued: AtomicU64::new(0),
            enqueue_err: AtomicU64::new(0),
            dequeue_err: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_enqueued(&self, n: u64) {
        self.enqueued.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dequeued(&self, n: u64) {
        self.dequeued.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_enqueue_err(&self, n: u64) {
        self.enqueue_err.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dequeue_err(&self, n: u64) {
        self.dequeue_err.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> QpStatsSnapshot {
        QpStatsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dequeued: self.dequeued.load(Ordering::Relaxed),
            enqueue_err: self.enqueue_err.load(Ordering::Relaxed),
            dequeue_err: self.dequeue_err.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.enqueued.store(0, Ordering::Relaxed);
        self.dequeued.store(0, Ordering::Relaxed);
        self.enqueue_err.store(0, Ordering::Relaxed);
        self.dequeue_err.store(0, Ordering::Relaxed);
    }
}

impl Default for QpStats {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QpStatsSnapshot {
    pub enqueued: u64,
    pub dequeued: u64,
    pub enqueue_err: u64,
    pub dequeue_err: u64,
}

impl std::fmt::Display for QpStatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "enqueued={} dequeued={} enqueue_err={} dequeue_err={}",
            self.enqueued, self.dequeued, self.enqueue_err, self.dequeue_err
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_accumulate_and_reset() {
        let s = QpStats::new();
        s.record_enqueued(4);
        s.record_dequeue_err(1);
        let snap = s.snapshot();
        assert_eq!(snap.enqueued, 4);
        assert_eq!(snap.dequeue_err, 1);
        s.reset();
        assert_eq!(s.snapshot().enqueued, 0);
    }
}
