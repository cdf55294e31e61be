/*!
 * Event System
 * Strongly-typed engine events, the observer hook and bounded event history
 */

use crate::core::clock::Clock;
use crate::core::limits::EVENT_HISTORY_CAPACITY;
use crate::core::types::{FrameId, OwnerId, PageKey, Priority, UnitId};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Event category for organization and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Category {
    Scheduler,
    Memory,
}

/// Every observable state change of either engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    // Scheduler lifecycle
    SchedulerStarted {
        algorithm: String,
    },
    SchedulerFinished {
        algorithm: String,
        completed: usize,
        stopped: bool,
    },
    QuantumChanged {
        quantum: Duration,
    },
    Paused,
    Resumed,
    StopRequested,
    ControlIgnored {
        action: String,
    },

    // Unit events
    UnitAdmitted {
        id: UnitId,
        name: String,
        priority: Priority,
        burst: Duration,
    },
    AdmissionIgnored {
        id: UnitId,
        name: String,
    },
    UnitRunning {
        id: UnitId,
        name: String,
        priority: Priority,
        remaining: Duration,
    },
    PreemptionTriggered {
        by: UnitId,
        by_name: String,
        by_priority: Priority,
        running: UnitId,
        running_name: String,
        running_priority: Priority,
    },
    UnitPreempted {
        id: UnitId,
        name: String,
        remaining: Duration,
    },
    UnitSuspended {
        id: UnitId,
        name: String,
        remaining: Duration,
    },
    UnitCompleted {
        id: UnitId,
        name: String,
    },

    // Memory events
    PageHit {
        key: PageKey,
        frame: FrameId,
    },
    PageFault {
        key: PageKey,
    },
    PageReplaced {
        victim: PageKey,
        frame: FrameId,
    },
    PageLoaded {
        key: PageKey,
        frame: FrameId,
    },
    PageReleased {
        key: PageKey,
        frame: FrameId,
    },
    OwnerReleased {
        owner: OwnerId,
        frames: usize,
    },
    AlgorithmChanged {
        algorithm: String,
    },
    MemoryReset,
}

impl Event {
    pub fn category(&self) -> Category {
        match self {
            Event::PageHit { .. }
            | Event::PageFault { .. }
            | Event::PageReplaced { .. }
            | Event::PageLoaded { .. }
            | Event::PageReleased { .. }
            | Event::OwnerReleased { .. }
            | Event::AlgorithmChanged { .. }
            | Event::MemoryReset => Category::Memory,
            _ => Category::Scheduler,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::SchedulerStarted { algorithm } => write!(f, "Starting {} scheduler", algorithm),
            Event::SchedulerFinished {
                algorithm,
                completed,
                stopped,
            } => {
                let how = if *stopped { "stopped" } else { "finished" };
                write!(f, "{} scheduler {} ({} completed)", algorithm, how, completed)
            }
            Event::QuantumChanged { quantum } => {
                write!(f, "Time quantum set to {:.3}s", quantum.as_secs_f64())
            }
            Event::Paused => write!(f, "Scheduler paused"),
            Event::Resumed => write!(f, "Scheduler resumed"),
            Event::StopRequested => write!(f, "Stop requested"),
            Event::ControlIgnored { action } => {
                write!(f, "Ignored {}: scheduler is not running", action)
            }
            Event::UnitAdmitted {
                id,
                name,
                priority,
                burst,
            } => write!(
                f,
                "Process added: {} (PID: {}, Priority: {}, Burst: {:.2}s)",
                name,
                id,
                priority,
                burst.as_secs_f64()
            ),
            Event::AdmissionIgnored { id, name } => {
                write!(f, "Admission ignored: {} (PID: {}) already completed", name, id)
            }
            Event::UnitRunning {
                id,
                name,
                priority,
                remaining,
            } => write!(
                f,
                "Running: {} (PID: {}, Priority: {}, Remaining: {:.2}s)",
                name,
                id,
                priority,
                remaining.as_secs_f64()
            ),
            Event::PreemptionTriggered {
                by_name,
                by_priority,
                running_name,
                running_priority,
                ..
            } => write!(
                f,
                "Preemption triggered: {} (Pri: {}) > {} (Pri: {})",
                by_name, by_priority, running_name, running_priority
            ),
            Event::UnitPreempted {
                id,
                name,
                remaining,
            } => write!(
                f,
                "Preempted: {} (PID: {}, Remaining: {:.2}s)",
                name,
                id,
                remaining.as_secs_f64()
            ),
            Event::UnitSuspended {
                id,
                name,
                remaining,
            } => write!(
                f,
                "Suspended: {} (PID: {}, Remaining: {:.2}s)",
                name,
                id,
                remaining.as_secs_f64()
            ),
            Event::UnitCompleted { id, name } => write!(f, "Completed: {} (PID: {})", name, id),
            Event::PageHit { key, frame } => write!(
                f,
                "Page Hit: Page {} of Process {} in Frame {}",
                key.page, key.owner, frame
            ),
            Event::PageFault { key } => write!(
                f,
                "Page Fault: Page {} of Process {} not in memory",
                key.page, key.owner
            ),
            Event::PageReplaced { victim, frame } => write!(
                f,
                "Memory Full: Replacing Page {} of Process {} in Frame {}",
                victim.page, victim.owner, frame
            ),
            Event::PageLoaded { key, frame } => write!(
                f,
                "Allocated: Page {} of Process {} to Frame {}",
                key.page, key.owner, frame
            ),
            Event::PageReleased { key, frame } => write!(
                f,
                "Released: Page {} of Process {} from Frame {}",
                key.page, key.owner, frame
            ),
            Event::OwnerReleased { owner, frames } => write!(
                f,
                "Deallocated all pages for Process {} ({} frames)",
                owner, frames
            ),
            Event::AlgorithmChanged { algorithm } => {
                write!(f, "Page replacement algorithm changed to {}", algorithm)
            }
            Event::MemoryReset => write!(f, "Memory manager reset"),
        }
    }
}

/// Event with the engine-clock time it was emitted at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub at: Duration,
    pub event: Event,
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.3}] {}", self.at.as_secs_f64(), self.event)
    }
}

/// Observer hook invoked synchronously for every event
pub type Observer = Arc<dyn Fn(&Event) + Send + Sync>;

/// Default observer: forward every event to `tracing`
pub fn tracing_observer() -> Observer {
    Arc::new(|event: &Event| {
        tracing::info!(category = ?event.category(), "{}", event);
    })
}

/// Observer that drops everything (useful for comparison runs)
pub fn silent_observer() -> Observer {
    Arc::new(|_: &Event| {})
}

/// Per-engine event fan-out: bounded history plus the observer hook
///
/// History and observer have their own locks so the hook is never invoked
/// while an engine's state lock is held.
pub struct EventSink {
    clock: Arc<dyn Clock>,
    observer: RwLock<Observer>,
    history: Mutex<VecDeque<EventRecord>>,
    capacity: usize,
}

impl EventSink {
    pub fn new(clock: Arc<dyn Clock>, observer: Observer) -> Self {
        Self::with_capacity(clock, observer, EVENT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(clock: Arc<dyn Clock>, observer: Observer, capacity: usize) -> Self {
        Self {
            clock,
            observer: RwLock::new(observer),
            history: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity: capacity.max(1),
        }
    }

    /// Record and publish an event
    pub fn emit(&self, event: Event) {
        let record = EventRecord {
            at: self.clock.now(),
            event,
        };

        {
            let mut history = self.history.lock();
            if history.len() == self.capacity {
                history.pop_front();
            }
            history.push_back(record.clone());
        }

        let observer = Arc::clone(&self.observer.read());
        observer(&record.event);
    }

    /// Publish a batch collected while a state lock was held
    pub fn emit_all(&self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.emit(event);
        }
    }

    pub fn set_observer(&self, observer: Observer) {
        *self.observer.write() = observer;
    }

    /// Snapshot of the recent history, oldest first
    pub fn history(&self) -> Vec<EventRecord> {
        self.history.lock().iter().cloned().collect()
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("capacity", &self.capacity)
            .field("recorded", &self.history.lock().len())
            .finish()
    }
}
