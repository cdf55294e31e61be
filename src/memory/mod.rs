/*!
 * Memory Module
 * Paged memory with FIFO and LRU page replacement
 */

pub mod manager;
pub mod metrics;
pub mod types;

pub use manager::{AlgorithmComparison, MemoryManager, ReplayReport, ReplayStep};
pub use metrics::MemoryStats;
pub use types::*;
