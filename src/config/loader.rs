//! Route table loading from disk.
//!
//! Parsing is fronted by the generic key-value cache: the parsed table is
//! stored under a key derived from the file path, with no expiration, and
//! revalidated against the file content's digest. This is an optimization
//! orthogonal to the compiled-matcher artifact.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::cache::CacheStore;
use crate::config::schema::RouteFile;
use crate::config::validation::{self, ValidationError};
use crate::routing::route::RouteCollection;

/// Fatal configuration problems. The process must not serve any route if
/// the table cannot be fully loaded and validated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing route file {path}")]
    MissingRouteFile { path: PathBuf },

    #[error("failed to read route file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse route file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: Box<toml::de::Error>,
    },

    #[error("route table validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Hex-encoded SHA-256.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Cached parse result, revalidated by content digest.
#[derive(Debug, Serialize, Deserialize)]
struct CachedTable {
    digest: String,
    file: RouteFile,
}

/// The validated table plus the digest of the content it came from.
pub struct LoadedRoutes {
    pub collection: RouteCollection,
    pub digest: String,
}

/// Read, parse (through the cache) and validate the route table.
pub fn load_routes(path: &Path, cache: &dyn CacheStore) -> Result<LoadedRoutes, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(ConfigError::MissingRouteFile {
                path: path.to_path_buf(),
            })
        }
        Err(err) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: err,
            })
        }
    };
    let digest = sha256_hex(content.as_bytes());
    let file = parse_cached(path, &content, &digest, cache)?;

    validation::validate(&file).map_err(ConfigError::Validation)?;
    let collection = RouteCollection::from_file(&file).map_err(ConfigError::Validation)?;

    tracing::debug!(
        routes = collection.len(),
        path = %path.display(),
        "route table loaded"
    );
    Ok(LoadedRoutes { collection, digest })
}

fn parse_cached(
    path: &Path,
    content: &str,
    digest: &str,
    cache: &dyn CacheStore,
) -> Result<RouteFile, ConfigError> {
    let key = format!("routes:{}", sha256_hex(path.to_string_lossy().as_bytes()));

    if let Some(value) = cache.get(&key) {
        if let Ok(cached) = serde_json::from_value::<CachedTable>(value) {
            if cached.digest == digest {
                tracing::debug!(path = %path.display(), "parsed route table served from cache");
                return Ok(cached.file);
            }
        }
    }

    let file: RouteFile = toml::from_str(content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        source: Box::new(err),
    })?;

    let cached = CachedTable {
        digest: digest.to_string(),
        file: file.clone(),
    };
    if let Ok(value) = serde_json::to_value(&cached) {
        cache.set(&key, value, Some(0));
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::config::schema::CacheSettings;

    const TABLE: &str = r#"
        [[routes]]
        name = "home"
        path = "/"
        methods = ["GET"]
        defaults = { controller = "Home::indexAction" }
    "#;

    fn store() -> MemoryStore {
        MemoryStore::new(&CacheSettings::default())
    }

    #[test]
    fn test_load_validates_and_builds_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.toml");
        std::fs::write(&path, TABLE).unwrap();

        let loaded = load_routes(&path, &store()).unwrap();
        assert_eq!(loaded.collection.len(), 1);
        assert!(loaded.collection.get("home").is_some());
        assert_eq!(loaded.digest, sha256_hex(TABLE.as_bytes()));
    }

    #[test]
    fn test_missing_file_is_a_distinct_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            load_routes(&path, &store()),
            Err(ConfigError::MissingRouteFile { .. })
        ));
    }

    #[test]
    fn test_invalid_table_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.toml");
        std::fs::write(
            &path,
            r#"
            [[routes]]
            path = "/broken"
            methods = []
            defaults = { controller = "Home::indexAction" }
        "#,
        )
        .unwrap();
        assert!(matches!(
            load_routes(&path, &store()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_cache_is_populated_and_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.toml");
        std::fs::write(&path, TABLE).unwrap();

        let cache = store();
        load_routes(&path, &cache).unwrap();
        assert_eq!(cache.len(), 1);

        // Second load parses nothing new; same collection comes back.
        let loaded = load_routes(&path, &cache).unwrap();
        assert!(loaded.collection.get("home").is_some());
    }

    #[test]
    fn test_changed_content_invalidates_cached_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.toml");
        std::fs::write(&path, TABLE).unwrap();

        let cache = store();
        load_routes(&path, &cache).unwrap();

        let updated = TABLE.replace("Home::indexAction", "Home::welcomeAction");
        std::fs::write(&path, updated).unwrap();

        let loaded = load_routes(&path, &cache).unwrap();
        let route = loaded.collection.get("home").unwrap();
        assert!(
            matches!(&route.target, crate::routing::route::RouteTarget::Controller { action, .. } if action == "welcomeAction")
        );
    }
}
