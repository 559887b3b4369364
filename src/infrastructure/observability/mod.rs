//! Observability for Finsynth
//!
//! Metrics live in a local prometheus registry and are rendered on demand;
//! nothing is served or pushed.

pub mod metrics;

pub use metrics::Metrics;
