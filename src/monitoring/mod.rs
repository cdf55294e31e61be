/*!
 * Monitoring Module
 * Engine events, observer hooks and tracing setup
 */

pub mod events;
pub mod tracer;

pub use events::{
    silent_observer, tracing_observer, Category, Event, EventRecord, EventSink, Observer,
};
pub use tracer::init_tracing;
