/*!
 * Scheduler Task Control
 *
 * Command channel between engine handles and the run loop, plus the handle
 * returned by a background run.
 */

use super::stats::SchedulerMetrics;
use super::types::EnginePhase;
use super::CpuScheduler;
use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::monitoring::Event;
use std::any::Any;
use std::thread::JoinHandle;
use tokio::sync::watch;
use tracing::{info, warn};

/// Control messages for the run loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EngineCommand {
    /// Stop consuming work until resumed
    Pause,
    /// Resume after a pause
    Resume,
    /// Exit the loop at the next tick boundary
    Stop,
}

impl CpuScheduler {
    /// Pause the run loop at the next tick boundary
    pub fn pause(&self) -> SchedulerResult<()> {
        self.send_control(EngineCommand::Pause, "pause")?;
        self.shared.events.emit(Event::Paused);
        Ok(())
    }

    /// Resume a paused run loop
    pub fn resume(&self) -> SchedulerResult<()> {
        self.send_control(EngineCommand::Resume, "resume")?;
        self.shared.events.emit(Event::Resumed);
        Ok(())
    }

    /// Request loop exit at the next tick boundary
    ///
    /// Idempotent: returns `false` when there is no active run to stop or a
    /// stop is already pending.
    pub fn stop(&self) -> bool {
        match self.send_control(EngineCommand::Stop, "stop") {
            Ok(()) => {
                self.shared.events.emit(Event::StopRequested);
                true
            }
            Err(_) => false,
        }
    }

    /// Validate against the phase and enqueue a command under the engine lock
    ///
    /// Sending while the lock is held orders the command after the channel
    /// drain `run` performs when it starts.
    fn send_control(&self, command: EngineCommand, action: &str) -> SchedulerResult<()> {
        let rejected = {
            let mut state = self.shared.state.lock();
            if state.phase != EnginePhase::Running
                || (command == EngineCommand::Stop && state.stop_requested)
            {
                true
            } else {
                match command {
                    EngineCommand::Pause => state.paused = true,
                    EngineCommand::Resume => state.paused = false,
                    EngineCommand::Stop => state.stop_requested = true,
                }
                // The receiver lives in the same Arc, so the channel cannot be closed
                let _ = self.shared.command_tx.send(command);
                false
            }
        };

        if rejected {
            warn!("Ignored {} request: scheduler is not running", action);
            self.shared.events.emit(Event::ControlIgnored {
                action: action.to_string(),
            });
            return Err(SchedulerError::NotRunning(action.to_string()));
        }

        info!("Scheduler {} requested", action);
        Ok(())
    }
}

/// Result of `run`
#[derive(Debug)]
pub enum RunOutcome {
    /// The loop ran in the caller's thread (or had nothing to do)
    Completed(SchedulerMetrics),
    /// The loop is running on a worker thread
    Spawned(RunHandle),
}

impl RunOutcome {
    /// Final metrics, joining the worker if there is one
    pub fn wait(self) -> SchedulerResult<SchedulerMetrics> {
        match self {
            RunOutcome::Completed(metrics) => Ok(metrics),
            RunOutcome::Spawned(handle) => handle.join(),
        }
    }

    /// Final metrics without blocking an async runtime
    pub async fn wait_async(self) -> SchedulerResult<SchedulerMetrics> {
        match self {
            RunOutcome::Completed(metrics) => Ok(metrics),
            RunOutcome::Spawned(mut handle) => {
                handle.finished().await;
                handle.join()
            }
        }
    }
}

/// Handle to a background run loop
///
/// Dropping the handle detaches the worker; the loop keeps going until the
/// ready set is exhausted or `stop()` is called on the engine.
#[derive(Debug)]
pub struct RunHandle {
    thread: JoinHandle<SchedulerMetrics>,
    done: watch::Receiver<bool>,
}

impl RunHandle {
    pub(crate) fn new(thread: JoinHandle<SchedulerMetrics>, done: watch::Receiver<bool>) -> Self {
        Self { thread, done }
    }

    pub fn is_finished(&self) -> bool {
        *self.done.borrow() || self.thread.is_finished()
    }

    /// Block until the loop exits
    pub fn join(self) -> SchedulerResult<SchedulerMetrics> {
        self.thread
            .join()
            .map_err(|payload| SchedulerError::WorkerPanicked(panic_message(payload)))
    }

    /// Wait for the loop to exit without blocking an async runtime
    pub async fn finished(&mut self) {
        // An error means the worker dropped the sender while unwinding
        let _ = self.done.wait_for(|done| *done).await;
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
