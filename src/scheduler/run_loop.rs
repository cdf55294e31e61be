/*!
 * Scheduler Run Loop
 *
 * Policy-independent loop: apply commands, select, dispatch, execute a slice
 * in ticks, then complete or return the unit to the ready set. The loop only
 * looks at commands and preemption conditions between ticks; a tick in
 * progress is never interrupted.
 */

use super::entry::Entry;
use super::stats::SchedulerMetrics;
use super::task::{EngineCommand, RunHandle, RunOutcome};
use super::types::{EnginePhase, RunMode};
use super::{CpuScheduler, Shared};
use crate::core::clock::Wake;
use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::types::UnitId;
use crate::monitoring::Event;
use crate::process::{SchedulingPolicy, UnitState};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, info_span};

/// How long one dispatch may run
#[derive(Debug, Clone, Copy)]
enum SliceBudget {
    /// Round-robin: one slice of at most `quantum`, then back of the queue
    Quantum(Duration),
    /// Priority: ticks until completion, checking for preemption if enabled
    Ticks { interval: Duration, preemptive: bool },
}

/// Loop-local view of the commands received so far
#[derive(Debug, Default)]
struct Control {
    pending: Vec<EngineCommand>,
    paused: bool,
    stop: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Restores the engine if the loop unwinds
///
/// Disarmed once the loop has finished normally: from then on the phase may
/// already belong to the next run.
struct RunGuard<'a> {
    shared: &'a Shared,
    armed: bool,
}

impl RunGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let mut state = self.shared.state.lock();
        // The dispatched unit goes back to the ready set with the work it
        // has left so a later run can finish it
        let interrupted = state.current.take().and_then(|id| {
            let unit = state.units.get_mut(&id)?;
            (unit.state() == UnitState::Running).then(|| {
                unit.preempt();
                Entry::of(unit)
            })
        });
        if let Some(entry) = interrupted {
            state.ready.push(entry);
        }
        state.phase = EnginePhase::Idle;
        state.paused = false;
        state.stop_requested = false;
        state.preempt_pending = false;
        state.run_finished = Some(self.shared.clock.now());
    }
}

impl CpuScheduler {
    /// Drive the scheduling loop until the ready set is exhausted or stopped
    ///
    /// An empty ready set is a benign no-op that returns the current metrics.
    /// A second concurrent `run` is rejected with `AlreadyRunning`.
    pub fn run(&self, mode: RunMode) -> SchedulerResult<RunOutcome> {
        let algorithm = {
            let mut state = self.shared.state.lock();
            if state.phase == EnginePhase::Running {
                return Err(SchedulerError::AlreadyRunning);
            }
            if state.ready.is_empty() {
                drop(state);
                info!("Run requested with an empty ready set; nothing to schedule");
                return Ok(RunOutcome::Completed(self.metrics()));
            }

            // Commands left over from a previous run must not leak into this one
            for stale in self.shared.command_rx.try_iter() {
                debug!(?stale, "Discarding stale scheduler command");
            }

            state.phase = EnginePhase::Running;
            state.paused = false;
            state.stop_requested = false;
            state.last_dispatched = None;
            state.run_started = Some(self.shared.clock.now());
            state.run_finished = None;
            state.config.algorithm_label()
        };

        info!("Starting {} scheduler", algorithm);
        self.shared.events.emit(Event::SchedulerStarted { algorithm });

        match mode {
            RunMode::Blocking => Ok(RunOutcome::Completed(self.drive())),
            RunMode::Background => {
                let engine = self.clone();
                let (done_tx, done_rx) = watch::channel(false);
                let spawned = std::thread::Builder::new()
                    .name(format!("scheduler-{}", self.shared.engine_id))
                    .spawn(move || {
                        let metrics = engine.drive();
                        let _ = done_tx.send(true);
                        metrics
                    });

                match spawned {
                    Ok(thread) => Ok(RunOutcome::Spawned(RunHandle::new(thread, done_rx))),
                    Err(e) => {
                        self.shared.state.lock().phase = EnginePhase::Idle;
                        Err(SchedulerError::SpawnFailed(e.to_string()))
                    }
                }
            }
        }
    }

    /// The loop body; the phase is already `Running`
    fn drive(&self) -> SchedulerMetrics {
        let span = info_span!("scheduler_run", engine = %self.shared.engine_id);
        let _entered = span.enter();
        let mut guard = RunGuard {
            shared: &self.shared,
            armed: true,
        };

        let mut control = Control::default();
        let stopped = loop {
            if self.apply_commands(&mut control) == Flow::Stop {
                break true;
            }

            let (id, budget, event) = {
                let mut state = self.shared.state.lock();
                let Some(id) = state.select_next() else {
                    // Decided under the same lock admission takes, so a unit
                    // admitted from now on waits for the next run
                    self.finish_locked(&mut state);
                    break false;
                };

                let now = self.shared.clock.now();
                if let Some(previous) = state.last_dispatched {
                    if previous != id {
                        self.shared.stats.inc_context_switches();
                    }
                }
                state.last_dispatched = Some(id);
                state.current = Some(id);
                state.preempt_pending = false;
                self.shared.stats.inc_dispatches();

                let budget = match state.config.policy {
                    SchedulingPolicy::RoundRobin => SliceBudget::Quantum(state.config.time_quantum),
                    SchedulingPolicy::Priority => SliceBudget::Ticks {
                        interval: state.config.check_interval,
                        preemptive: state.config.preemptive,
                    },
                };

                let unit = state.unit_mut(id);
                unit.begin_run(now);
                let event = Event::UnitRunning {
                    id,
                    name: unit.name.clone(),
                    priority: unit.priority,
                    remaining: unit.remaining(),
                };
                (id, budget, event)
            };

            debug!(unit = id, ?budget, "Dispatched");
            self.shared.events.emit(event);

            if self.execute(id, budget, &mut control) == Flow::Stop {
                break true;
            }
        };

        if stopped {
            let mut state = self.shared.state.lock();
            self.finish_locked(&mut state);
        }
        guard.disarm();

        let metrics = self.metrics();
        info!(
            completed = metrics.completed_units,
            stopped, "{} scheduler finished", metrics.algorithm
        );
        self.shared.events.emit(Event::SchedulerFinished {
            algorithm: metrics.algorithm.clone(),
            completed: metrics.completed_units,
            stopped,
        });
        metrics
    }

    fn finish_locked(&self, state: &mut super::State) {
        state.phase = EnginePhase::Idle;
        state.current = None;
        state.paused = false;
        state.stop_requested = false;
        state.preempt_pending = false;
        state.run_finished = Some(self.shared.clock.now());
    }

    /// Run one dispatch of `id` tick by tick
    fn execute(&self, id: UnitId, budget: SliceBudget, control: &mut Control) -> Flow {
        let mut used = Duration::ZERO;

        loop {
            if self.apply_commands(control) == Flow::Stop {
                self.return_to_ready(id, Event::unit_suspended);
                return Flow::Stop;
            }

            let tick = {
                let mut state = self.shared.state.lock();
                let remaining = state.unit(id).remaining();
                match budget {
                    SliceBudget::Quantum(quantum) => {
                        if used >= quantum {
                            drop(state);
                            self.shared.stats.inc_quantum_expirations();
                            self.return_to_ready(id, Event::unit_preempted);
                            return Flow::Continue;
                        }
                        (quantum - used).min(remaining)
                    }
                    SliceBudget::Ticks {
                        interval,
                        preemptive,
                    } => {
                        if preemptive && state.should_preempt(id) {
                            state.preempt_pending = false;
                            drop(state);
                            self.shared.stats.inc_preemptions();
                            self.return_to_ready(id, Event::unit_preempted);
                            return Flow::Continue;
                        }
                        interval.min(remaining)
                    }
                }
            };

            self.wait(tick, control);
            used += tick;

            let completed = {
                let mut state = self.shared.state.lock();
                let now = self.shared.clock.now();
                let unit = state.unit_mut(id);
                unit.advance(tick);
                if unit.remaining().is_zero() {
                    unit.complete(now);
                    let event = Event::UnitCompleted {
                        id,
                        name: unit.name.clone(),
                    };
                    state.completed.push(id);
                    state.current = None;
                    Some(event)
                } else {
                    None
                }
            };

            if let Some(event) = completed {
                self.shared.events.emit(event);
                return Flow::Continue;
            }
        }
    }

    /// Running → Ready, re-inserted with its original arrival
    fn return_to_ready(&self, id: UnitId, make_event: fn(UnitId, String, Duration) -> Event) {
        let event = {
            let mut state = self.shared.state.lock();
            let unit = state.unit_mut(id);
            unit.preempt();
            let entry = Entry::of(unit);
            let event = make_event(id, unit.name.clone(), unit.remaining());
            state.ready.push(entry);
            state.current = None;
            event
        };
        self.shared.events.emit(event);
    }

    /// Let `span` of simulated time pass, collecting commands for the next boundary
    fn wait(&self, span: Duration, control: &mut Control) {
        let rx = &self.shared.command_rx;
        match self.shared.clock.start_wait(span) {
            Wake::Now => control.pending.extend(rx.try_iter()),
            Wake::At(deadline) => loop {
                match rx.recv_deadline(deadline) {
                    Ok(command) => control.pending.push(command),
                    Err(flume::RecvTimeoutError::Timeout) => break,
                    Err(flume::RecvTimeoutError::Disconnected) => {
                        std::thread::sleep(
                            deadline.saturating_duration_since(std::time::Instant::now()),
                        );
                        break;
                    }
                }
            },
        }
    }

    /// Apply buffered and newly arrived commands; blocks while paused
    fn apply_commands(&self, control: &mut Control) -> Flow {
        let rx = &self.shared.command_rx;
        let mut commands: Vec<EngineCommand> = control.pending.drain(..).collect();
        commands.extend(rx.try_iter());

        for command in commands {
            Self::apply(control, command);
        }

        while control.paused && !control.stop {
            match rx.recv() {
                Ok(command) => Self::apply(control, command),
                Err(_) => break,
            }
        }

        if control.stop {
            Flow::Stop
        } else {
            Flow::Continue
        }
    }

    fn apply(control: &mut Control, command: EngineCommand) {
        match command {
            EngineCommand::Pause => control.paused = true,
            EngineCommand::Resume => control.paused = false,
            EngineCommand::Stop => control.stop = true,
        }
    }
}

impl Event {
    fn unit_preempted(id: UnitId, name: String, remaining: Duration) -> Event {
        Event::UnitPreempted {
            id,
            name,
            remaining,
        }
    }

    fn unit_suspended(id: UnitId, name: String, remaining: Duration) -> Event {
        Event::UnitSuspended {
            id,
            name,
            remaining,
        }
    }
}
