//! Declarative HTTP routing core.
//!
//! A routing library for shared-nothing web stacks: a TOML route table is
//! compiled into a deterministic matcher, persisted as a cache artifact,
//! and queried per request. Matching, URL generation and controller
//! dispatch live here; sockets, response bodies and template rendering
//! belong to the embedding host.
//!
//! # Architecture Overview
//!
//! ```text
//!   routes.toml ──▶ config (load, validate) ──▶ RouteCollection
//!                                                    │ compile
//!                                                    ▼
//!            cache dir ◀── persist ──── CompiledMatcher artifact
//!                │ (production reuse,                │
//!                │  digest-checked)                  ▼
//!                └────────────────────▶ Router ── match ──▶ MatchResult
//!                                        │                     │
//!                                        ├── generate ◀────────┘
//!                                        ▼
//!                                    dispatch ──▶ Outcome (host renders)
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//!
//! use ruta::cache::MemoryStore;
//! use ruta::config::RouterSettings;
//! use ruta::dispatch::{ControllerRegistry, Dispatcher};
//! use ruta::routing::{Method, RequestContext, Router};
//!
//! let settings = RouterSettings::default();
//! ruta::observability::init(settings.environment);
//!
//! let cache = MemoryStore::new(&settings.cache);
//! let router = Router::boot(settings, &cache).expect("route table must load");
//!
//! let registry = ControllerRegistry::new();
//! // registry.register("Home", || Box::new(HomeController));
//! let dispatcher = Dispatcher::new(registry);
//!
//! let ctx = RequestContext::new(Method::Get, "https", "www.example.com", "/user/42");
//! match router.match_request(&ctx) {
//!     Ok(result) => {
//!         let _outcome = dispatcher.dispatch(&result, &ctx);
//!         // hand the outcome to the view/response layer
//!     }
//!     Err(_err) => {
//!         // translate NotFound / MethodNotAllowed into 404 / 405
//!     }
//! }
//!
//! let params = BTreeMap::new();
//! let _home = router.generate_url("home", &params, false, &ctx);
//! ```

// Core subsystems
pub mod config;
pub mod routing;

// Request handling
pub mod dispatch;

// Cross-cutting concerns
pub mod cache;
pub mod observability;

pub use cache::{CacheStore, MemoryStore};
pub use config::{ConfigError, Environment, RouterSettings, ValidationError};
pub use dispatch::{
    ActionContext, Controller, ControllerRegistry, DispatchError, Dispatcher, Outcome,
    RequestFormat,
};
pub use routing::{
    BootError, GenerationError, MatchError, MatchResult, Method, RequestContext, Router,
};
