/*!
 * Scheduler Entry Types
 * Ready-structure entries and their explicit ordering
 */

use crate::core::types::{Priority, UnitId};
use crate::process::Unit;
use std::time::Duration;

/// Ready-structure entry
///
/// Carries the unit's original arrival so a preempted unit re-enters the
/// priority heap at its true FCFS position, not its re-admission time.
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    pub id: UnitId,
    pub priority: Priority,
    pub arrival: Duration,
}

impl Entry {
    #[inline]
    pub fn of(unit: &Unit) -> Self {
        Self {
            id: unit.id,
            priority: unit.priority,
            arrival: unit.arrival,
        }
    }

    #[inline]
    fn key(&self) -> (Priority, Duration, UnitId) {
        (self.priority, self.arrival, self.id)
    }

    /// Strictly more urgent than `other` (lower priority number)
    #[inline]
    pub fn more_urgent_than(&self, other: &Entry) -> bool {
        self.priority < other.priority
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entry {}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // BinaryHeap is a max-heap: the smallest (priority, arrival, id) key
        // must compare greatest so it is popped first
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
