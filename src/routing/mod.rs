//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (method, host, scheme, path)
//!     → router.rs (service entry points)
//!     → matcher.rs (ordered scan of the compiled table)
//!     → MatchResult | NotFound | MethodNotAllowed
//!
//! Route compilation (at boot):
//!     RouteCollection
//!     → compiler.rs (patterns → anchored regexes)
//!     → CompiledMatcher artifact (persisted, digest-stamped)
//!     → matcher.rs / generator.rs (both built from the same artifact)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at boot, immutable at runtime
//! - Deterministic: same table and request always produce the same result
//! - First match wins, in declaration order
//! - Matcher and generator share one artifact so they cannot diverge

pub mod compiler;
pub mod context;
pub mod generator;
pub mod matcher;
pub mod method;
pub mod route;
pub mod router;

pub use compiler::{CompiledMatcher, CompiledRoute};
pub use context::RequestContext;
pub use generator::{GenerationError, UrlGenerator};
pub use matcher::{MatchError, MatchResult, UrlMatcher};
pub use method::Method;
pub use route::{Route, RouteCollection, RouteTarget};
pub use router::{BootError, Router, ROUTES_FILE};
