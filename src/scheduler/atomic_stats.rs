/*!
 * Lock-Free Scheduler Counters
 * Atomic event counters updated from the run loop without the state lock
 */

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerCounters {
    pub admitted: u64,
    pub dispatches: u64,
    pub context_switches: u64,
    pub preemptions: u64,
    pub quantum_expirations: u64,
}

/// Atomic scheduler statistics
///
/// # Performance
/// - Cache-line aligned to prevent false sharing
/// - All operations use relaxed ordering; each counter is exact on its own
#[repr(C, align(64))]
#[derive(Debug, Default)]
pub struct AtomicSchedulerStats {
    admitted: AtomicU64,
    dispatches: AtomicU64,
    context_switches: AtomicU64,
    preemptions: AtomicU64,
    quantum_expirations: AtomicU64,
}

impl AtomicSchedulerStats {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hot path - called on every admission
    #[inline(always)]
    pub fn inc_admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Hot path - called on every dispatch
    #[inline(always)]
    pub fn inc_dispatches(&self) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_context_switches(&self) {
        self.context_switches.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_preemptions(&self) {
        self.preemptions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_quantum_expirations(&self) {
        self.quantum_expirations.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of current counters
    #[inline]
    pub fn snapshot(&self) -> SchedulerCounters {
        SchedulerCounters {
            admitted: self.admitted.load(Ordering::Relaxed),
            dispatches: self.dispatches.load(Ordering::Relaxed),
            context_switches: self.context_switches.load(Ordering::Relaxed),
            preemptions: self.preemptions.load(Ordering::Relaxed),
            quantum_expirations: self.quantum_expirations.load(Ordering::Relaxed),
        }
    }
}
