/*!
 * Core Module
 * Fundamental types, clocks and error handling
 */

pub mod clock;
pub mod errors;
pub mod id;
pub mod limits;
pub mod types;

// Re-export for convenience
pub use clock::{Clock, VirtualClock, Wake, WallClock};
pub use errors::*;
pub use id::{AtomicGenerator, IdGenerator};
pub use types::*;
