/*!
 * ID Generation
 * Per-engine monotonic counters (no module-level state)
 */

use std::sync::atomic::{AtomicU64, Ordering};

/// Generic ID generator interface
pub trait IdGenerator<T> {
    /// Generate next ID
    fn next(&self) -> T;

    /// Get the value the next call will hand out (for debugging)
    fn peek(&self) -> T;
}

/// Monotonic atomic counter owned by a single engine
///
/// # Performance
/// - Lock-free, so ids can be handed out without taking the engine lock
#[derive(Debug)]
pub struct AtomicGenerator {
    counter: AtomicU64,
}

impl AtomicGenerator {
    /// Create new generator starting at given value
    #[inline]
    pub fn new(start: u64) -> Self {
        Self {
            counter: AtomicU64::new(start),
        }
    }
}

impl Default for AtomicGenerator {
    /// Ids start at 1, as PIDs do
    fn default() -> Self {
        Self::new(1)
    }
}

impl IdGenerator<u32> for AtomicGenerator {
    #[inline]
    fn next(&self) -> u32 {
        self.counter.fetch_add(1, Ordering::SeqCst) as u32
    }

    #[inline]
    fn peek(&self) -> u32 {
        self.counter.load(Ordering::Relaxed) as u32
    }
}

impl IdGenerator<u64> for AtomicGenerator {
    #[inline]
    fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }

    #[inline]
    fn peek(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}
