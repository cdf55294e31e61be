/*!
 * Process Module
 * Schedulable units and scheduler configuration
 */

pub mod types;
pub mod unit;

pub use types::{validate_quantum, SchedulerConfig, SchedulingPolicy, UnitState};
pub use unit::{Unit, UnitMetrics};
