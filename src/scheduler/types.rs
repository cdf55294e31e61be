/*!
 * Scheduler Types
 * Run modes and status snapshots
 */

use crate::core::types::{EngineId, UnitId};
use crate::process::SchedulingPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How `run` drives the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Run in the caller's thread until the ready set is exhausted or stopped
    Blocking,
    /// Run on a dedicated worker thread and return a handle
    Background,
}

/// Whether a run loop is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePhase {
    Idle,
    Running,
}

/// Point-in-time view of a CPU engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub engine: EngineId,
    pub policy: SchedulingPolicy,
    pub algorithm: String,
    pub phase: EnginePhase,
    pub paused: bool,
    pub stop_requested: bool,
    pub current: Option<UnitId>,
    /// Ready ids in selection order
    pub ready: Vec<UnitId>,
    pub total_units: usize,
    pub completed_units: usize,
    pub time_quantum: Duration,
}

impl EngineStatus {
    #[inline]
    pub fn is_running(&self) -> bool {
        self.phase == EnginePhase::Running
    }
}
