//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! routes.toml
//!     → loader.rs (read; parse through the key-value cache)
//!     → validation.rs (semantic checks, all errors collected)
//!     → RouteCollection (typed, insertion-ordered)
//! ```
//!
//! # Design Decisions
//! - The table is immutable once loaded; changes require a re-boot
//! - Declaration order is structural (`[[routes]]` array), never a
//!   property of map iteration
//! - Validation separates syntactic (serde) from semantic checks and is
//!   fatal: a partially valid table is never served

pub mod environment;
pub mod loader;
pub mod schema;
pub mod validation;

pub use environment::Environment;
pub use loader::ConfigError;
pub use schema::{RawRoute, RouteFile, RouterSettings};
pub use validation::ValidationError;
