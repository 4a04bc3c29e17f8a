//! Configuration schema definitions.
//!
//! This module defines the framework settings and the declarative route
//! table. All types derive Serde traits for deserialization from config
//! files.
//!
//! The route table is an **array of tables** (`[[routes]]`): declaration
//! order is part of the matching contract (first match wins), so it is kept
//! structural rather than depending on how a parser orders map keys.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::environment::Environment;
use crate::routing::method::Method;

/// Root settings for the routing core.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterSettings {
    /// Deployment environment; gates the compiled-artifact reuse policy.
    pub environment: Environment,

    /// Filesystem layout (route file location, cache directory).
    pub paths: PathsConfig,

    /// Generic key-value cache settings.
    pub cache: CacheSettings,

    /// Named hosts for absolute URL building (e.g. `www`, `static`).
    pub hosts: BTreeMap<String, String>,
}

/// Filesystem layout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the declarative route file.
    pub config_dir: PathBuf,

    /// Directory the compiled matcher artifact is persisted to.
    pub cache_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("config"),
            cache_dir: PathBuf::from("cache"),
        }
    }
}

/// Key-value cache settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Disabled caches warn and behave as a permanent miss.
    pub active: bool,

    /// Default entry lifetime in seconds; `0` means no expiration.
    pub default_expire: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            active: true,
            default_expire: 3600,
        }
    }
}

/// The declarative route table, as parsed from disk.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouteFile {
    pub routes: Vec<RawRoute>,
}

/// One route entry, before validation.
///
/// `name` is optional: legacy tables carried anonymous entries, which get a
/// deterministic name synthesized from path, target and methods so URL
/// generation still works for them.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RawRoute {
    /// Route name; used verbatim when present.
    pub name: Option<String>,

    /// Path pattern with `{placeholder}` segments.
    pub path: String,

    /// Default values. The reserved keys `controller`, `template` and
    /// `redirect` select the dispatch target; everything else is a plain
    /// parameter merged into the match result.
    pub defaults: BTreeMap<String, Value>,

    /// Per-placeholder regex constraints.
    pub requirements: BTreeMap<String, String>,

    /// Free-form options; retained but not interpreted by the matcher.
    pub options: BTreeMap<String, Value>,

    /// Host to match, empty for any. Literal, case-insensitive.
    pub host: String,

    /// URL schemes to match, empty for any.
    pub schemes: Vec<String>,

    /// HTTP methods; a route with no methods is a configuration error.
    pub methods: Vec<Method>,
}
