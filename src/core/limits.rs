/*!
 * Simulation Limits and Defaults
 *
 * Centralized location for defaults and bounds shared by both engines.
 */

use std::time::Duration;

// =============================================================================
// CPU SCHEDULER
// =============================================================================

/// Default round-robin time quantum (1 simulated second)
pub const DEFAULT_TIME_QUANTUM: Duration = Duration::from_secs(1);

/// Default preemption check interval for the priority policy (100ms)
/// Bounds worst-case preemption latency to one interval
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Default priority for units created without an explicit one
pub const DEFAULT_PRIORITY: u8 = 0;

// =============================================================================
// MEMORY
// =============================================================================

/// Default page size in bytes
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Default number of physical frames
pub const DEFAULT_FRAME_COUNT: usize = 4;

// =============================================================================
// OBSERVABILITY
// =============================================================================

/// Number of recent events each engine keeps for `events()` queries
pub const EVENT_HISTORY_CAPACITY: usize = 1024;
