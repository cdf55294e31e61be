/*!
 * Scheduling Policies
 * Round-robin FIFO queue and priority min-heap
 */

use super::entry::Entry;
use super::traits::ReadyQueue;
use crate::core::types::UnitId;
use crate::process::SchedulingPolicy;
use std::collections::{BinaryHeap, VecDeque};

/// Strict FIFO: pop from the front, unfinished units re-append at the back
#[derive(Debug, Default)]
pub struct RoundRobinQueue {
    queue: VecDeque<Entry>,
}

impl ReadyQueue for RoundRobinQueue {
    fn push(&mut self, entry: Entry) {
        self.queue.push_back(entry);
    }

    fn pop(&mut self) -> Option<Entry> {
        self.queue.pop_front()
    }

    fn peek(&self) -> Option<&Entry> {
        self.queue.front()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn ids(&self) -> Vec<UnitId> {
        self.queue.iter().map(|e| e.id).collect()
    }

    /// Round-robin ignores priority entirely
    fn outranks(&self, _waiting: &Entry, _running: &Entry) -> bool {
        false
    }
}

/// Min-heap keyed by (priority, arrival, id)
#[derive(Debug, Default)]
pub struct PriorityQueue {
    heap: BinaryHeap<Entry>,
}

impl ReadyQueue for PriorityQueue {
    fn push(&mut self, entry: Entry) {
        self.heap.push(entry);
    }

    fn pop(&mut self) -> Option<Entry> {
        self.heap.pop()
    }

    fn peek(&self) -> Option<&Entry> {
        self.heap.peek()
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn ids(&self) -> Vec<UnitId> {
        // into_sorted_vec is ascending by Ord, i.e. least urgent first
        let mut sorted = self.heap.clone().into_sorted_vec();
        sorted.reverse();
        sorted.into_iter().map(|e| e.id).collect()
    }

    fn outranks(&self, waiting: &Entry, running: &Entry) -> bool {
        waiting.more_urgent_than(running)
    }
}

/// Build the ready structure for a policy
pub fn ready_queue_for(policy: SchedulingPolicy) -> Box<dyn ReadyQueue> {
    match policy {
        SchedulingPolicy::RoundRobin => Box::new(RoundRobinQueue::default()),
        SchedulingPolicy::Priority => Box::new(PriorityQueue::default()),
    }
}
