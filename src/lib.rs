/*!
 * Resource Simulator Library
 * CPU scheduling and paged memory engines exposed as a library
 */

pub mod core;
pub mod memory;
pub mod monitoring;
pub mod process;
pub mod scheduler;

// Re-exports
pub use crate::core::{
    Clock, EngineId, MemoryError, PageKey, SchedulerError, SchedulerResult, SimError, SimResult,
    VirtualClock, WallClock,
};
pub use memory::{
    AccessOutcome, AlgorithmComparison, MemoryConfig, MemoryManager, MemoryMap, MemoryResult,
    MemoryStats, PageAccess, ReplacementAlgorithm, ReplayReport,
};
pub use monitoring::{init_tracing, silent_observer, tracing_observer, Event, EventRecord, Observer};
pub use process::{SchedulerConfig, SchedulingPolicy, Unit, UnitState};
pub use scheduler::{CpuScheduler, RunHandle, RunMode, RunOutcome, SchedulerMetrics};
