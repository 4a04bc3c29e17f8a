//! Observability subsystem.
//!
//! Logging only: the routing core is a library inside someone else's
//! process, so it emits structured `tracing` events and leaves exporters
//! and endpoints to the host.

pub mod logging;

pub use logging::init;
