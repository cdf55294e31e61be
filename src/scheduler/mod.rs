/*!
 * CPU Scheduler
 * Simulated process scheduling with round-robin and priority policies
 *
 * One mutex guards all mutable engine state (ready structure, unit table,
 * current unit). Pause/resume/stop travel over a command channel that the
 * run loop waits on between ticks.
 */

mod atomic_stats;
mod entry;
mod operations;
mod policy;
mod run_loop;
mod stats;
mod task;
pub mod traits;
pub mod types;

pub use atomic_stats::SchedulerCounters;
pub use entry::Entry;
pub use policy::{ready_queue_for, PriorityQueue, RoundRobinQueue};
pub use stats::{SchedulerMetrics, UnitReport};
pub use task::{RunHandle, RunOutcome};
pub use traits::ReadyQueue;
pub use types::{EnginePhase, EngineStatus, RunMode};

use crate::core::clock::{Clock, WallClock};
use crate::core::errors::SchedulerResult;
use crate::core::id::AtomicGenerator;
use crate::core::types::{EngineId, UnitId};
use crate::monitoring::{tracing_observer, EventSink, Observer};
use crate::process::{SchedulerConfig, Unit};
use atomic_stats::AtomicSchedulerStats;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use task::EngineCommand;
use tracing::info;

/// Mutable engine state, guarded by the engine lock
#[derive(Debug)]
pub(crate) struct State {
    pub config: SchedulerConfig,
    pub ready: Box<dyn ReadyQueue>,
    /// Every unit ever admitted, keyed (and therefore ordered) by id
    pub units: BTreeMap<UnitId, Unit>,
    /// Completion order
    pub completed: Vec<UnitId>,
    pub current: Option<UnitId>,
    /// Raised by admission of a unit more urgent than the running one
    pub preempt_pending: bool,
    pub phase: EnginePhase,
    pub paused: bool,
    pub stop_requested: bool,
    pub last_dispatched: Option<UnitId>,
    pub run_started: Option<Duration>,
    pub run_finished: Option<Duration>,
}

impl State {
    fn new(config: SchedulerConfig) -> Self {
        Self {
            ready: ready_queue_for(config.policy),
            config,
            units: BTreeMap::new(),
            completed: Vec::new(),
            current: None,
            preempt_pending: false,
            phase: EnginePhase::Idle,
            paused: false,
            stop_requested: false,
            last_dispatched: None,
            run_started: None,
            run_finished: None,
        }
    }

    /// Pop the next runnable unit, discarding stale entries
    pub fn select_next(&mut self) -> Option<UnitId> {
        while let Some(entry) = self.ready.pop() {
            match self.units.get(&entry.id) {
                Some(unit) if !unit.is_complete() => return Some(entry.id),
                _ => continue,
            }
        }
        None
    }

    /// Whether the running unit must yield at this tick boundary
    pub fn should_preempt(&self, running: UnitId) -> bool {
        if self.preempt_pending {
            return true;
        }
        let Some(unit) = self.units.get(&running) else {
            return false;
        };
        let running = Entry::of(unit);
        self.ready
            .peek()
            .map_or(false, |head| self.ready.outranks(head, &running))
    }

    pub fn unit(&self, id: UnitId) -> &Unit {
        self.units
            .get(&id)
            .unwrap_or_else(|| panic!("unit {} has no owning engine entry", id))
    }

    pub fn unit_mut(&mut self, id: UnitId) -> &mut Unit {
        self.units
            .get_mut(&id)
            .unwrap_or_else(|| panic!("unit {} has no owning engine entry", id))
    }
}

/// State shared between engine handles and the background worker
pub(crate) struct Shared {
    pub engine_id: EngineId,
    pub ids: AtomicGenerator,
    pub clock: Arc<dyn Clock>,
    pub state: Mutex<State>,
    pub command_tx: flume::Sender<EngineCommand>,
    pub command_rx: flume::Receiver<EngineCommand>,
    pub stats: AtomicSchedulerStats,
    pub events: EventSink,
}

/// CPU scheduling engine
///
/// Cloning yields another handle to the same engine.
pub struct CpuScheduler {
    shared: Arc<Shared>,
}

impl CpuScheduler {
    /// Create an engine on the wall clock with the tracing observer
    pub fn new(config: SchedulerConfig) -> SchedulerResult<Self> {
        Self::with_clock(config, Arc::new(WallClock::new()))
    }

    /// Create an engine on a custom clock
    pub fn with_clock(config: SchedulerConfig, clock: Arc<dyn Clock>) -> SchedulerResult<Self> {
        config.validate()?;

        let engine_id = EngineId::generate();
        let (command_tx, command_rx) = flume::unbounded();
        info!(
            engine = %engine_id,
            "Scheduler initialized: {}",
            config.algorithm_label()
        );

        Ok(Self {
            shared: Arc::new(Shared {
                engine_id,
                ids: AtomicGenerator::default(),
                events: EventSink::new(Arc::clone(&clock), tracing_observer()),
                clock,
                state: Mutex::new(State::new(config)),
                command_tx,
                command_rx,
                stats: AtomicSchedulerStats::new(),
            }),
        })
    }

    /// Replace the observer (builder form)
    #[must_use]
    pub fn with_observer(self, observer: Observer) -> Self {
        self.set_observer(observer);
        self
    }

    /// Replace the observer on a live engine
    pub fn set_observer(&self, observer: Observer) {
        self.shared.events.set_observer(observer);
    }

    pub fn engine_id(&self) -> EngineId {
        self.shared.engine_id
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.shared.clock)
    }
}

impl Clone for CpuScheduler {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl std::fmt::Debug for CpuScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuScheduler")
            .field("engine", &self.shared.engine_id)
            .field("state", &*self.shared.state.lock())
            .finish()
    }
}
