/*!
 * Process Types
 * Scheduling policy selection and scheduler configuration
 */

use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::limits::{DEFAULT_CHECK_INTERVAL, DEFAULT_TIME_QUANTUM};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Unit state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    /// Created but not yet admitted
    New,
    /// Waiting in a ready structure
    Ready,
    /// Currently executing a slice
    Running,
    /// All work done (terminal)
    Completed,
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitState::New => "New",
            UnitState::Ready => "Ready",
            UnitState::Running => "Running",
            UnitState::Completed => "Completed",
        };
        f.write_str(s)
    }
}

/// Scheduling policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingPolicy {
    /// Round-robin with fixed time quantum, priority ignored
    RoundRobin,
    /// Priority-based, optionally preemptive
    Priority,
}

impl SchedulingPolicy {
    /// Convert to string representation
    #[inline(always)]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RoundRobin => "round_robin",
            Self::Priority => "priority",
        }
    }
}

impl FromStr for SchedulingPolicy {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "round_robin" | "roundrobin" | "rr" => Ok(Self::RoundRobin),
            "priority" | "prio" => Ok(Self::Priority),
            _ => Err(SchedulerError::InvalidConfig(format!(
                "invalid policy '{}'. Valid: round_robin, priority",
                s
            ))),
        }
    }
}

/// CPU engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub policy: SchedulingPolicy,
    /// Round-robin slice length
    pub time_quantum: Duration,
    /// Priority policy: preempt running units for more urgent ones
    pub preemptive: bool,
    /// Priority policy: tick length between preemption checks
    pub check_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            policy: SchedulingPolicy::RoundRobin,
            time_quantum: DEFAULT_TIME_QUANTUM,
            preemptive: true,
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }
}

impl SchedulerConfig {
    #[must_use]
    pub fn round_robin(time_quantum: Duration) -> Self {
        Self {
            policy: SchedulingPolicy::RoundRobin,
            time_quantum,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn priority(preemptive: bool) -> Self {
        Self {
            policy: SchedulingPolicy::Priority,
            preemptive,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_check_interval(mut self, check_interval: Duration) -> Self {
        self.check_interval = check_interval;
        self
    }

    /// Reject non-positive durations
    pub fn validate(&self) -> SchedulerResult<()> {
        validate_quantum(self.time_quantum)?;
        if self.check_interval.is_zero() {
            return Err(SchedulerError::InvalidConfig(
                "check interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Human-readable algorithm label used in events and reports
    pub fn algorithm_label(&self) -> String {
        match self.policy {
            SchedulingPolicy::RoundRobin => format!(
                "Round-Robin (quantum={}s)",
                self.time_quantum.as_secs_f64()
            ),
            SchedulingPolicy::Priority => {
                let mode = if self.preemptive {
                    "Preemptive"
                } else {
                    "Non-preemptive"
                };
                format!("Priority-Based ({})", mode)
            }
        }
    }
}

/// Validate a round-robin time quantum
#[inline]
pub fn validate_quantum(quantum: Duration) -> SchedulerResult<Duration> {
    if quantum.is_zero() {
        return Err(SchedulerError::InvalidConfig(
            "time quantum must be greater than zero".to_string(),
        ));
    }
    Ok(quantum)
}
