//! The router service object.
//!
//! One `Router` is built at process startup and passed to collaborators —
//! there is no ambient global. Boot applies the environment-gated cache
//! policy:
//!
//! - production reuses a persisted compiled artifact when its embedded
//!   source digest still matches the route file (a digest mismatch means
//!   the file changed under the artifact, and forces a recompile);
//! - every other environment recompiles from the declarative table on
//!   each boot, so edits are always visible.
//!
//! Recompiles always persist the fresh artifact; a persist failure is a
//! fatal boot error. Two processes racing to persist is benign: compilation
//! is deterministic, so both write identical bytes.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::cache::CacheStore;
use crate::config::loader::{self, ConfigError};
use crate::config::schema::RouterSettings;
use crate::routing::compiler::{self, ArtifactError, CompileError, CompiledMatcher};
use crate::routing::context::RequestContext;
use crate::routing::generator::{self, GenerationError, UrlGenerator};
use crate::routing::matcher::{MatchError, MatchResult, UrlMatcher};

/// Name of the declarative route table inside the config directory.
pub const ROUTES_FILE: &str = "routes.toml";

/// Fatal boot problems; the process must not serve requests past one.
#[derive(Debug, Error)]
pub enum BootError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

pub struct Router {
    settings: RouterSettings,
    matcher: UrlMatcher,
    generator: UrlGenerator,
}

impl Router {
    /// Build the router per the environment's cache policy.
    pub fn boot(settings: RouterSettings, cache: &dyn CacheStore) -> Result<Self, BootError> {
        let artifact = obtain_artifact(&settings, cache)?;
        let matcher = UrlMatcher::new(&artifact)?;
        let generator = UrlGenerator::new(&artifact)?;
        tracing::info!(
            environment = %settings.environment,
            routes = artifact.routes.len(),
            "router booted"
        );
        Ok(Self {
            settings,
            matcher,
            generator,
        })
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    /// Match the request's path against the compiled table.
    pub fn match_request(&self, ctx: &RequestContext) -> Result<MatchResult, MatchError> {
        self.matcher.match_path(ctx.path(), ctx)
    }

    /// Strict URL generation; failures are always surfaced.
    pub fn generate(
        &self,
        name: &str,
        parameters: &BTreeMap<String, Value>,
        absolute: bool,
        ctx: &RequestContext,
    ) -> Result<String, GenerationError> {
        self.generator.generate(name, parameters, absolute, ctx)
    }

    /// Environment-gated generation for template code: loud in
    /// development (the error propagates), degraded in production (an
    /// empty link plus an error log — one bad link must not take the
    /// whole response down).
    pub fn generate_url(
        &self,
        name: &str,
        parameters: &BTreeMap<String, Value>,
        absolute: bool,
        ctx: &RequestContext,
    ) -> Result<String, GenerationError> {
        match self.generator.generate(name, parameters, absolute, ctx) {
            Ok(url) => Ok(url),
            Err(err) if self.settings.environment.is_production_like() => {
                tracing::error!(route = name, error = %err, "URL generation failed, emitting empty link");
                Ok(String::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Absolute URL against one of the configured named hosts.
    pub fn external_url(
        &self,
        host: &str,
        path: &str,
        query: &[(&str, &str)],
        scheme: &str,
    ) -> Result<String, GenerationError> {
        generator::external_url(&self.settings.hosts, host, path, query, scheme)
    }

    fn route_file_path(settings: &RouterSettings) -> PathBuf {
        settings.paths.config_dir.join(ROUTES_FILE)
    }

    fn artifact_path(settings: &RouterSettings) -> PathBuf {
        settings.paths.cache_dir.join(format!("{ROUTES_FILE}.json"))
    }
}

fn obtain_artifact(
    settings: &RouterSettings,
    cache: &dyn CacheStore,
) -> Result<CompiledMatcher, BootError> {
    let route_file = Router::route_file_path(settings);
    let artifact_file = Router::artifact_path(settings);

    if settings.environment.is_production_like() {
        if let Some(artifact) = CompiledMatcher::load(&artifact_file)? {
            if artifact.version != compiler::ARTIFACT_VERSION {
                tracing::info!(
                    found = artifact.version,
                    expected = compiler::ARTIFACT_VERSION,
                    "artifact version changed, recompiling"
                );
            } else {
                match std::fs::read(&route_file) {
                    Ok(content) if loader::sha256_hex(&content) == artifact.source_digest => {
                        tracing::debug!(path = %artifact_file.display(), "reusing compiled matcher");
                        return Ok(artifact);
                    }
                    Ok(_) => {
                        tracing::info!(
                            path = %route_file.display(),
                            "route file changed since the artifact was written, recompiling"
                        );
                    }
                    Err(err) => {
                        // The deployed artifact can outlive its source
                        // file; serve it rather than refusing to boot.
                        tracing::warn!(
                            path = %route_file.display(),
                            error = %err,
                            "route file unreadable, trusting existing artifact"
                        );
                        return Ok(artifact);
                    }
                }
            }
        }
    }

    let loaded = loader::load_routes(&route_file, cache)?;
    let artifact = compiler::compile(&loaded.collection, &loaded.digest)?;
    artifact.persist(&artifact_file)?;
    tracing::info!(
        routes = artifact.routes.len(),
        path = %artifact_file.display(),
        "compiled matcher persisted"
    );
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::config::environment::Environment;
    use crate::config::schema::CacheSettings;
    use crate::routing::method::Method;

    const TABLE: &str = r#"
        [[routes]]
        name = "home"
        path = "/"
        methods = ["GET"]
        defaults = { controller = "Home::indexAction" }

        [[routes]]
        name = "user"
        path = "/user/{id}"
        methods = ["GET"]
        defaults = { controller = "User::showAction" }
        requirements = { id = "\\d+" }
    "#;

    fn write_table(dir: &std::path::Path, content: &str) -> RouterSettings {
        let config_dir = dir.join("config");
        let cache_dir = dir.join("cache");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(config_dir.join(ROUTES_FILE), content).unwrap();
        RouterSettings {
            paths: crate::config::schema::PathsConfig {
                config_dir,
                cache_dir,
            },
            ..RouterSettings::default()
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::new(&CacheSettings::default())
    }

    fn get(path: &str) -> RequestContext {
        RequestContext::new(Method::Get, "http", "www.example.com", path)
    }

    #[test]
    fn test_boot_compiles_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let settings = write_table(dir.path(), TABLE);
        let artifact_file = Router::artifact_path(&settings);

        let router = Router::boot(settings, &store()).unwrap();
        assert!(artifact_file.exists());
        assert!(router.match_request(&get("/")).is_ok());
    }

    #[test]
    fn test_boot_without_route_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let settings = write_table(dir.path(), TABLE);
        std::fs::remove_file(Router::route_file_path(&settings)).unwrap();

        assert!(matches!(
            Router::boot(settings, &store()),
            Err(BootError::Config(ConfigError::MissingRouteFile { .. }))
        ));
    }

    #[test]
    fn test_development_always_recompiles() {
        let dir = tempfile::tempdir().unwrap();
        let settings = write_table(dir.path(), TABLE);

        Router::boot(settings.clone(), &store()).unwrap();

        // Route file edited; a development boot must see the change.
        let updated = TABLE.replace("/user/{id}", "/member/{id}");
        std::fs::write(Router::route_file_path(&settings), updated).unwrap();

        let router = Router::boot(settings, &store()).unwrap();
        assert!(router.match_request(&get("/member/7")).is_ok());
        assert!(router.match_request(&get("/user/7")).is_err());
    }

    #[test]
    fn test_production_reuses_artifact_when_digest_matches() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = write_table(dir.path(), TABLE);
        settings.environment = Environment::Production;

        Router::boot(settings.clone(), &store()).unwrap();
        let artifact_file = Router::artifact_path(&settings);
        let first = std::fs::read(&artifact_file).unwrap();

        let router = Router::boot(settings, &store()).unwrap();
        let second = std::fs::read(&artifact_file).unwrap();
        assert_eq!(first, second);
        assert!(router.match_request(&get("/user/7")).is_ok());
    }

    #[test]
    fn test_production_recompiles_when_route_file_changes() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = write_table(dir.path(), TABLE);
        settings.environment = Environment::Production;

        Router::boot(settings.clone(), &store()).unwrap();

        let updated = TABLE.replace("/user/{id}", "/member/{id}");
        std::fs::write(Router::route_file_path(&settings), updated).unwrap();

        let router = Router::boot(settings, &store()).unwrap();
        assert!(router.match_request(&get("/member/7")).is_ok());
    }

    #[test]
    fn test_production_tolerates_missing_source_with_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = write_table(dir.path(), TABLE);
        settings.environment = Environment::Production;

        Router::boot(settings.clone(), &store()).unwrap();
        std::fs::remove_file(Router::route_file_path(&settings)).unwrap();

        let router = Router::boot(settings, &store()).unwrap();
        assert!(router.match_request(&get("/")).is_ok());
    }

    #[test]
    fn test_generate_url_degrades_only_in_production() {
        let dir = tempfile::tempdir().unwrap();
        let settings = write_table(dir.path(), TABLE);

        let dev = Router::boot(settings.clone(), &store()).unwrap();
        let params = BTreeMap::new();
        assert!(dev
            .generate_url("missing", &params, false, &get("/"))
            .is_err());

        let mut pro_settings = settings;
        pro_settings.environment = Environment::Production;
        let pro = Router::boot(pro_settings, &store()).unwrap();
        assert_eq!(
            pro.generate_url("missing", &params, false, &get("/")).unwrap(),
            ""
        );
    }

    #[test]
    fn test_external_url_reads_configured_hosts() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = write_table(dir.path(), TABLE);
        settings
            .hosts
            .insert("www".to_string(), "www.example.com".to_string());

        let router = Router::boot(settings, &store()).unwrap();
        assert_eq!(
            router.external_url("www", "/about", &[], "https").unwrap(),
            "https://www.example.com/about"
        );
    }
}
