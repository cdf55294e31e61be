/*!
 * Simulation Clocks
 * Time source for both engines: real (optionally scaled) or virtual
 */

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// When a wait that was just started is over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// Wall-clock instant at which the simulated span has passed
    At(Instant),
    /// The span already passed (virtual time advanced instantly)
    Now,
}

/// Time source for a simulation engine
///
/// `now()` is simulated time since the clock's origin. Engines never sleep
/// directly; they ask the clock to start a wait and then block on their
/// command channel until the returned deadline.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Simulated time elapsed since the clock origin
    fn now(&self) -> Duration;

    /// Let `span` of simulated time pass
    fn start_wait(&self, span: Duration) -> Wake;
}

/// Real clock; simulated seconds map to `scale` wall seconds
#[derive(Debug, Clone)]
pub struct WallClock {
    origin: Instant,
    scale: f64,
}

impl WallClock {
    /// Unscaled wall clock
    pub fn new() -> Self {
        Self::scaled(1.0)
    }

    /// Wall clock where one simulated second lasts `scale` wall seconds
    ///
    /// Non-finite or non-positive scales fall back to 1.0.
    pub fn scaled(scale: f64) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        Self {
            origin: Instant::now(),
            scale,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    fn now(&self) -> Duration {
        self.origin.elapsed().div_f64(self.scale)
    }

    fn start_wait(&self, span: Duration) -> Wake {
        Wake::At(Instant::now() + span.mul_f64(self.scale))
    }
}

/// Deterministic clock that advances only when waited on
///
/// Used by regression fixtures: every timestamp is exact, so metrics such as
/// `waiting == turnaround - burst` can be asserted with `assert_eq!`.
#[derive(Debug, Default)]
pub struct VirtualClock {
    nanos: AtomicU64,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward without an engine waiting
    pub fn advance(&self, span: Duration) {
        self.nanos
            .fetch_add(span.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }

    fn start_wait(&self, span: Duration) -> Wake {
        self.advance(span);
        Wake::Now
    }
}
