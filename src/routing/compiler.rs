//! Route compilation and the persisted matcher artifact.
//!
//! Compilation turns the ordered [`RouteCollection`] into a
//! [`CompiledMatcher`]: one anchored regex per route plus everything the
//! matcher, generator and dispatcher need at request time. The artifact is
//! a build product, never hand-edited, and its serialized form is
//! **deterministic** — the same collection in the same order produces a
//! byte-identical file, which is what makes concurrent recompiles by
//! uncoordinated processes a benign race.
//!
//! The artifact embeds a digest of the route-file content it was compiled
//! from, so a production boot can detect a stale artifact instead of
//! silently serving old routes.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::routing::method::Method;
use crate::routing::route::{Route, RouteCollection, RouteTarget};

/// Bumped whenever the artifact layout changes; a version mismatch forces
/// a recompile.
pub const ARTIFACT_VERSION: u32 = 1;

/// Placeholder constraint applied when a route declares none.
const DEFAULT_REQUIREMENT: &str = "[^/]+";

/// A route's compiled, serializable form.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompiledRoute {
    pub name: String,
    /// Original path pattern; the generator substitutes into this.
    pub path: String,
    /// Anchored regex source the matcher tests paths against.
    pub path_regex: String,
    /// Placeholder names in pattern order.
    pub placeholders: Vec<String>,
    pub methods: Vec<Method>,
    pub host: String,
    pub schemes: Vec<String>,
    pub defaults: BTreeMap<String, Value>,
    pub requirements: BTreeMap<String, String>,
    pub target: RouteTarget,
}

/// The compiled route table. Route order is match precedence and is
/// preserved exactly through serialization.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompiledMatcher {
    pub version: u32,
    /// SHA-256 (hex) of the route-file content this was compiled from.
    pub source_digest: String,
    pub routes: Vec<CompiledRoute>,
}

/// Fatal defects found while compiling patterns.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("route {route}: unterminated placeholder in pattern {pattern}")]
    UnterminatedPlaceholder { route: String, pattern: String },

    #[error("route {route}: invalid placeholder name in pattern {pattern}")]
    BadPlaceholder { route: String, pattern: String },

    #[error("route {route}: compiled pattern is not a valid regex: {message}")]
    Pattern { route: String, message: String },
}

/// Fatal I/O or corruption problems with the persisted artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read compiled matcher at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write compiled matcher at {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode compiled matcher: {source}")]
    Encode { source: serde_json::Error },

    #[error("compiled matcher at {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },
}

/// One piece of a parsed path pattern.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment {
    Literal(String),
    Placeholder(String),
}

/// Split a `{placeholder}` pattern into literal and placeholder segments.
pub(crate) fn parse_pattern(route: &str, pattern: &str) -> Result<Vec<Segment>, CompileError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.chars();

    while let Some(ch) = chars.next() {
        if ch != '{' {
            literal.push(ch);
            continue;
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        let mut name = String::new();
        loop {
            match chars.next() {
                Some('}') => break,
                Some(c) => name.push(c),
                None => {
                    return Err(CompileError::UnterminatedPlaceholder {
                        route: route.to_string(),
                        pattern: pattern.to_string(),
                    })
                }
            }
        }
        if !is_valid_placeholder(&name) {
            return Err(CompileError::BadPlaceholder {
                route: route.to_string(),
                pattern: pattern.to_string(),
            });
        }
        segments.push(Segment::Placeholder(name));
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// Placeholder names double as regex capture-group names, so they are
/// restricted to identifier characters.
fn is_valid_placeholder(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn build_regex(route: &Route) -> Result<(String, Vec<String>), CompileError> {
    let segments = parse_pattern(&route.name, &route.path)?;
    let mut source = String::from("^");
    let mut placeholders = Vec::new();

    for segment in segments {
        match segment {
            Segment::Literal(text) => source.push_str(&regex::escape(&text)),
            Segment::Placeholder(name) => {
                let requirement = route
                    .requirements
                    .get(&name)
                    .map(String::as_str)
                    .unwrap_or(DEFAULT_REQUIREMENT);
                source.push_str(&format!("(?P<{name}>{requirement})"));
                placeholders.push(name);
            }
        }
    }
    source.push('$');

    if let Err(err) = Regex::new(&source) {
        return Err(CompileError::Pattern {
            route: route.name.clone(),
            message: err.to_string(),
        });
    }
    Ok((source, placeholders))
}

/// Compile a collection against the digest of the source it came from.
///
/// Deterministic: ordering comes from the collection, map keys are sorted
/// (`BTreeMap`), and serialization is compact JSON with a fixed field
/// order.
pub fn compile(
    collection: &RouteCollection,
    source_digest: &str,
) -> Result<CompiledMatcher, CompileError> {
    let mut routes = Vec::with_capacity(collection.len());
    for route in collection.iter() {
        let (path_regex, placeholders) = build_regex(route)?;
        routes.push(CompiledRoute {
            name: route.name.clone(),
            path: route.path.clone(),
            path_regex,
            placeholders,
            methods: route.methods.clone(),
            host: route.host.clone(),
            schemes: route.schemes.clone(),
            defaults: route.defaults.clone(),
            requirements: route.requirements.clone(),
            target: route.target.clone(),
        });
    }
    Ok(CompiledMatcher {
        version: ARTIFACT_VERSION,
        source_digest: source_digest.to_string(),
        routes,
    })
}

impl CompiledMatcher {
    /// Serialized artifact bytes. Exposed so tests can assert the
    /// byte-identical property without touching disk.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        serde_json::to_vec(self).map_err(|source| ArtifactError::Encode { source })
    }

    /// Persist to the cache directory. An unwritable artifact is fatal:
    /// the router cannot promise a consistent table it failed to save.
    pub fn persist(&self, path: &Path) -> Result<(), ArtifactError> {
        let write_err = |source| ArtifactError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, self.to_bytes()?).map_err(write_err)
    }

    /// Load a previously persisted artifact. `Ok(None)` means no artifact
    /// exists (a normal state — compile instead); read failures and
    /// corrupt content are fatal.
    pub fn load(path: &Path) -> Result<Option<Self>, ArtifactError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(ArtifactError::Read {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        };
        let matcher: Self =
            serde_json::from_slice(&bytes).map_err(|err| ArtifactError::Corrupt {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        Ok(Some(matcher))
    }
}
