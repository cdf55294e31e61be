/*!
 * Schedulable Unit
 * A simulated process: burst, priority, state machine and timing metrics
 */

use super::types::UnitState;
use crate::core::types::{EngineId, Priority, UnitId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::time::Duration;

/// Per-unit timing metrics (engine clock timestamps)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitMetrics {
    /// First transition into Running
    pub start_time: Option<Duration>,
    pub completion_time: Option<Duration>,
    pub waiting_time: Option<Duration>,
    pub turnaround_time: Option<Duration>,
    pub response_time: Option<Duration>,
}

/// Schedulable unit
///
/// Owned by the engine that admitted it. Callers only ever see clones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub burst: Duration,
    pub priority: Priority,
    pub arrival: Duration,
    remaining: Duration,
    state: UnitState,
    metrics: UnitMetrics,
    origin: EngineId,
}

impl Unit {
    pub(crate) fn new(
        origin: EngineId,
        id: UnitId,
        name: String,
        burst: Duration,
        priority: Priority,
        arrival: Duration,
    ) -> Self {
        Self {
            id,
            name,
            burst,
            priority,
            arrival,
            remaining: burst,
            state: UnitState::New,
            metrics: UnitMetrics::default(),
            origin,
        }
    }

    #[inline]
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    #[inline]
    pub fn state(&self) -> UnitState {
        self.state
    }

    #[inline]
    pub fn metrics(&self) -> &UnitMetrics {
        &self.metrics
    }

    /// Engine that created this unit
    #[inline]
    pub fn origin(&self) -> EngineId {
        self.origin
    }

    #[inline(always)]
    pub fn is_complete(&self) -> bool {
        matches!(self.state, UnitState::Completed)
    }

    /// Ready-queue ordering key: priority, then arrival, then id
    #[inline]
    pub fn urgency_key(&self) -> (Priority, Duration, UnitId) {
        (self.priority, self.arrival, self.id)
    }

    /// Compare by urgency; `Less` runs first
    pub fn cmp_urgency(&self, other: &Self) -> Ordering {
        self.urgency_key().cmp(&other.urgency_key())
    }

    /// Percentage of the burst already executed
    pub fn progress(&self) -> f64 {
        if self.burst.is_zero() {
            return 100.0;
        }
        let done = self.burst.saturating_sub(self.remaining);
        done.as_secs_f64() / self.burst.as_secs_f64() * 100.0
    }

    pub(crate) fn mark_ready(&mut self) {
        debug_assert!(!self.is_complete());
        self.state = UnitState::Ready;
    }

    /// Enter Running; the first call anchors the response time
    ///
    /// Returns `true` on the unit's first run.
    pub fn begin_run(&mut self, now: Duration) -> bool {
        assert!(!self.is_complete(), "completed unit {} dispatched", self.id);
        self.state = UnitState::Running;
        if self.metrics.start_time.is_none() {
            self.metrics.start_time = Some(now);
            true
        } else {
            false
        }
    }

    /// Consume up to `slice` of remaining work; returns the amount consumed
    pub fn advance(&mut self, slice: Duration) -> Duration {
        let executed = slice.min(self.remaining);
        self.remaining -= executed;
        executed
    }

    /// Terminal transition; freezes turnaround, waiting and response
    ///
    /// Returns `false` (and changes nothing) when already completed.
    pub fn complete(&mut self, now: Duration) -> bool {
        if self.is_complete() {
            return false;
        }
        assert!(
            self.remaining.is_zero(),
            "unit {} completed with {:?} remaining",
            self.id,
            self.remaining
        );

        self.state = UnitState::Completed;
        let turnaround = now.saturating_sub(self.arrival);
        self.metrics.completion_time = Some(now);
        self.metrics.turnaround_time = Some(turnaround);
        self.metrics.waiting_time = Some(turnaround.saturating_sub(self.burst));
        self.metrics.response_time = self
            .metrics
            .start_time
            .map(|start| start.saturating_sub(self.arrival));
        true
    }

    /// Return to Ready before completion
    pub fn preempt(&mut self) {
        if self.state == UnitState::Running {
            self.state = UnitState::Ready;
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PID: {} | {} | Priority: {} | Burst: {:.2}s | Remaining: {:.2}s | State: {}",
            self.id,
            self.name,
            self.priority,
            self.burst.as_secs_f64(),
            self.remaining.as_secs_f64(),
            self.state
        )
    }
}
