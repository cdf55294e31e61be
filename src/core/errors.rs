/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use crate::core::types::UnitId;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export MemoryError from memory module
pub use crate::memory::MemoryError;

/// Scheduler operation result
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-related errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SchedulerError {
    #[error("Invalid scheduler configuration: {0}")]
    #[diagnostic(
        code(scheduler::invalid_config),
        help("Time quantum and check interval must be greater than zero.")
    )]
    InvalidConfig(String),

    #[error("Invalid burst for '{name}': burst must be greater than zero")]
    #[diagnostic(
        code(scheduler::invalid_burst),
        help("A unit needs some work to do before it can be scheduled.")
    )]
    InvalidBurst { name: String },

    #[error("Unit {0} was created by a different engine")]
    #[diagnostic(
        code(scheduler::foreign_unit),
        help("Create units through the engine that will run them.")
    )]
    ForeignUnit(UnitId),

    #[error("Unit {0} is already admitted")]
    #[diagnostic(
        code(scheduler::already_admitted),
        help("A unit can only be admitted once; it is re-queued automatically after preemption.")
    )]
    AlreadyAdmitted(UnitId),

    #[error("Unit {0} not found in scheduler")]
    #[diagnostic(
        code(scheduler::unit_not_found),
        help("The unit may never have been admitted to this engine.")
    )]
    UnitNotFound(UnitId),

    #[error("Scheduler is already running")]
    #[diagnostic(
        code(scheduler::already_running),
        help("Wait for the current run to finish, or stop it first.")
    )]
    AlreadyRunning,

    #[error("Scheduler is not running: cannot {0}")]
    #[diagnostic(
        code(scheduler::not_running),
        help("Pause and resume only apply to an engine with an active run loop.")
    )]
    NotRunning(String),

    #[error("Failed to spawn scheduler worker: {0}")]
    #[diagnostic(
        code(scheduler::spawn_failed),
        help("The operating system refused to start a worker thread.")
    )]
    SpawnFailed(String),

    #[error("Scheduler worker panicked: {0}")]
    #[diagnostic(
        code(scheduler::worker_panicked),
        help("A background run loop terminated abnormally. Check observer callbacks.")
    )]
    WorkerPanicked(String),
}

/// Unified error type with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum SimError {
    #[error("Memory error: {0}")]
    #[diagnostic(transparent)]
    Memory(#[from] MemoryError),

    #[error("Scheduler error: {0}")]
    #[diagnostic(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Common result type for callers driving both engines
pub type SimResult<T> = Result<T, SimError>;
