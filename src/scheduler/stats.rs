/*!
 * Scheduler Statistics
 * Engine-wide metrics recomputed from the unit set on every snapshot
 */

use super::atomic_stats::SchedulerCounters;
use super::CpuScheduler;
use crate::core::types::{Priority, UnitId};
use crate::process::Unit;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Timing row for one completed unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitReport {
    pub id: UnitId,
    pub name: String,
    pub priority: Priority,
    pub burst: Duration,
    pub waiting: Duration,
    pub turnaround: Duration,
    pub response: Duration,
    pub completion: Duration,
}

impl UnitReport {
    fn from_unit(unit: &Unit) -> Option<Self> {
        let m = unit.metrics();
        Some(Self {
            id: unit.id,
            name: unit.name.clone(),
            priority: unit.priority,
            burst: unit.burst,
            waiting: m.waiting_time?,
            turnaround: m.turnaround_time?,
            response: m.response_time?,
            completion: m.completion_time?,
        })
    }
}

/// Engine-wide metrics snapshot
///
/// Averages cover completed units only; units still in flight count toward
/// `total_units` but not toward any average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerMetrics {
    pub algorithm: String,
    pub total_units: usize,
    pub completed_units: usize,
    pub dispatches: u64,
    pub context_switches: u64,
    pub preemptions: u64,
    pub quantum_expirations: u64,
    /// Wall span of the last run (simulated clock)
    pub total_execution_time: Duration,
    pub avg_waiting_time: Duration,
    pub avg_turnaround_time: Duration,
    pub avg_response_time: Duration,
    pub completion_order: Vec<UnitId>,
    /// Completed units in completion order
    pub units: Vec<UnitReport>,
}

impl SchedulerMetrics {
    fn average(rows: &[UnitReport], field: impl Fn(&UnitReport) -> Duration) -> Duration {
        if rows.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = rows.iter().map(field).sum();
        total / rows.len() as u32
    }

    /// Whether every admitted unit has completed
    pub fn all_completed(&self) -> bool {
        self.completed_units == self.total_units
    }
}

impl fmt::Display for SchedulerMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} Scheduling Statistics ===", self.algorithm)?;
        writeln!(
            f,
            "Processes: {}/{} completed",
            self.completed_units, self.total_units
        )?;
        writeln!(
            f,
            "Total Execution Time: {:.2}s",
            self.total_execution_time.as_secs_f64()
        )?;
        writeln!(
            f,
            "Average Waiting Time: {:.2}s",
            self.avg_waiting_time.as_secs_f64()
        )?;
        writeln!(
            f,
            "Average Turnaround Time: {:.2}s",
            self.avg_turnaround_time.as_secs_f64()
        )?;
        writeln!(
            f,
            "Average Response Time: {:.2}s",
            self.avg_response_time.as_secs_f64()
        )?;
        writeln!(
            f,
            "Dispatches: {} | Context Switches: {} | Preemptions: {} | Quantum Expirations: {}",
            self.dispatches, self.context_switches, self.preemptions, self.quantum_expirations
        )?;

        if !self.units.is_empty() {
            writeln!(
                f,
                "{:<6}{:<14}{:>9}{:>9}{:>11}{:>13}{:>11}",
                "PID", "Name", "Priority", "Burst", "Waiting", "Turnaround", "Response"
            )?;
            for row in &self.units {
                writeln!(
                    f,
                    "{:<6}{:<14}{:>9}{:>9.2}{:>11.2}{:>13.2}{:>11.2}",
                    row.id,
                    row.name,
                    row.priority,
                    row.burst.as_secs_f64(),
                    row.waiting.as_secs_f64(),
                    row.turnaround.as_secs_f64(),
                    row.response.as_secs_f64()
                )?;
            }
        }
        Ok(())
    }
}

impl CpuScheduler {
    /// Metrics snapshot, recomputed from the unit set
    pub fn metrics(&self) -> SchedulerMetrics {
        let counters = self.shared.stats.snapshot();
        let state = self.shared.state.lock();

        let units: Vec<UnitReport> = state
            .completed
            .iter()
            .filter_map(|id| state.units.get(id))
            .filter_map(UnitReport::from_unit)
            .collect();

        let total_execution_time = match (state.run_started, state.run_finished) {
            (Some(start), Some(end)) => end.saturating_sub(start),
            (Some(start), None) => self.shared.clock.now().saturating_sub(start),
            _ => Duration::ZERO,
        };

        SchedulerMetrics {
            algorithm: state.config.algorithm_label(),
            total_units: state.units.len(),
            completed_units: units.len(),
            dispatches: counters.dispatches,
            context_switches: counters.context_switches,
            preemptions: counters.preemptions,
            quantum_expirations: counters.quantum_expirations,
            total_execution_time,
            avg_waiting_time: SchedulerMetrics::average(&units, |r| r.waiting),
            avg_turnaround_time: SchedulerMetrics::average(&units, |r| r.turnaround),
            avg_response_time: SchedulerMetrics::average(&units, |r| r.response),
            completion_order: units.iter().map(|r| r.id).collect(),
            units,
        }
    }

    /// Raw lock-free counters
    pub fn counters(&self) -> SchedulerCounters {
        self.shared.stats.snapshot()
    }
}
