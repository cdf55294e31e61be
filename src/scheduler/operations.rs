/*!
 * Scheduler Core Operations
 * Unit creation, admission, runtime tuning and queries
 */

use super::entry::Entry;
use super::types::{EnginePhase, EngineStatus};
use super::CpuScheduler;
use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::id::IdGenerator;
use crate::core::types::{Priority, UnitId};
use crate::monitoring::{Event, EventRecord};
use crate::process::{validate_quantum, SchedulerConfig, SchedulingPolicy, Unit};
use std::time::Duration;
use tracing::{debug, info, warn};

impl CpuScheduler {
    /// Create a unit owned by this engine (state New, not yet admitted)
    pub fn create(
        &self,
        name: impl Into<String>,
        burst: Duration,
        priority: Priority,
    ) -> SchedulerResult<Unit> {
        let name = name.into();
        if burst.is_zero() {
            return Err(SchedulerError::InvalidBurst { name });
        }

        let id: UnitId = self.shared.ids.next();
        let arrival = self.shared.clock.now();
        Ok(Unit::new(
            self.shared.engine_id,
            id,
            name,
            burst,
            priority,
            arrival,
        ))
    }

    /// Insert a unit into the policy's ready structure
    ///
    /// Returns `Ok(false)` for an already completed unit (guarded no-op).
    pub fn admit(&self, mut unit: Unit) -> SchedulerResult<bool> {
        if unit.origin() != self.shared.engine_id {
            warn!(unit = unit.id, "Rejected unit created by another engine");
            return Err(SchedulerError::ForeignUnit(unit.id));
        }

        let mut events = Vec::with_capacity(2);
        let queued = {
            let mut state = self.shared.state.lock();
            let completed = unit.is_complete()
                || state.units.get(&unit.id).map_or(false, Unit::is_complete);

            if completed {
                events.push(Event::AdmissionIgnored {
                    id: unit.id,
                    name: unit.name.clone(),
                });
                false
            } else if state.units.contains_key(&unit.id) {
                return Err(SchedulerError::AlreadyAdmitted(unit.id));
            } else {
                unit.mark_ready();
                events.push(Event::UnitAdmitted {
                    id: unit.id,
                    name: unit.name.clone(),
                    priority: unit.priority,
                    burst: unit.burst,
                });

                // A more urgent arrival raises the preemption flag right away,
                // so the running unit yields at the next tick boundary
                let preempts = state.config.policy == SchedulingPolicy::Priority
                    && state.config.preemptive;
                if let Some(running) = state.current.filter(|_| preempts) {
                    let running = state.unit(running);
                    if Entry::of(&unit).more_urgent_than(&Entry::of(running)) {
                        events.push(Event::PreemptionTriggered {
                            by: unit.id,
                            by_name: unit.name.clone(),
                            by_priority: unit.priority,
                            running: running.id,
                            running_name: running.name.clone(),
                            running_priority: running.priority,
                        });
                        state.preempt_pending = true;
                    }
                }

                state.ready.push(Entry::of(&unit));
                state.units.insert(unit.id, unit);
                self.shared.stats.inc_admitted();
                true
            }
        };

        self.shared.events.emit_all(events);
        Ok(queued)
    }

    /// Create and admit in one step
    pub fn submit(
        &self,
        name: impl Into<String>,
        burst: Duration,
        priority: Priority,
    ) -> SchedulerResult<UnitId> {
        let unit = self.create(name, burst, priority)?;
        let id = unit.id;
        self.admit(unit)?;
        Ok(id)
    }

    /// Change the round-robin quantum; applies from the next dispatch
    pub fn set_quantum(&self, quantum: Duration) -> SchedulerResult<()> {
        let quantum = validate_quantum(quantum)?;
        self.shared.state.lock().config.time_quantum = quantum;
        info!("Time quantum updated to {:?}", quantum);
        self.shared.events.emit(Event::QuantumChanged { quantum });
        Ok(())
    }

    pub fn config(&self) -> SchedulerConfig {
        self.shared.state.lock().config
    }

    pub fn policy(&self) -> SchedulingPolicy {
        self.shared.state.lock().config.policy
    }

    /// The unit the policy would select next, without removing it
    pub fn peek_next(&self) -> Option<UnitId> {
        let state = self.shared.state.lock();
        state
            .ready
            .ids()
            .into_iter()
            .find(|id| state.units.get(id).map_or(false, |u| !u.is_complete()))
    }

    pub fn current(&self) -> Option<UnitId> {
        self.shared.state.lock().current
    }

    pub fn ready_len(&self) -> usize {
        self.shared.state.lock().ready.len()
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.lock().phase == EnginePhase::Running
    }

    /// Snapshot of one unit
    pub fn unit(&self, id: UnitId) -> SchedulerResult<Unit> {
        self.shared
            .state
            .lock()
            .units
            .get(&id)
            .cloned()
            .ok_or(SchedulerError::UnitNotFound(id))
    }

    /// Snapshot of every admitted unit, in admission order
    pub fn units(&self) -> Vec<Unit> {
        self.shared.state.lock().units.values().cloned().collect()
    }

    /// Snapshot of completed units, in completion order
    pub fn completed(&self) -> Vec<Unit> {
        let state = self.shared.state.lock();
        state
            .completed
            .iter()
            .filter_map(|id| state.units.get(id).cloned())
            .collect()
    }

    pub fn status(&self) -> EngineStatus {
        let state = self.shared.state.lock();
        EngineStatus {
            engine: self.shared.engine_id,
            policy: state.config.policy,
            algorithm: state.config.algorithm_label(),
            phase: state.phase,
            paused: state.paused,
            stop_requested: state.stop_requested,
            current: state.current,
            ready: state.ready.ids(),
            total_units: state.units.len(),
            completed_units: state.completed.len(),
            time_quantum: state.config.time_quantum,
        }
    }

    /// Recent events, oldest first
    pub fn events(&self) -> Vec<EventRecord> {
        let history = self.shared.events.history();
        debug!(count = history.len(), "Event history requested");
        history
    }
}
