//! Deployment environment and the cache-reuse gate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The environment the router is booted in.
///
/// Only [`Environment::Production`] reuses a persisted compiled matcher;
/// every other environment recompiles from the declarative table on each
/// boot so edits to the route file are always visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Whether this environment trades route-file consistency for the
    /// low-latency compiled-artifact path.
    pub fn is_production_like(self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown environment: {0}")]
pub struct ParseEnvironmentError(String);

impl FromStr for Environment {
    type Err = ParseEnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" | "dev" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "pro" => Ok(Self::Production),
            other => Err(ParseEnvironmentError(other.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_production_reuses_artifacts() {
        assert!(Environment::Production.is_production_like());
        assert!(!Environment::Staging.is_production_like());
        assert!(!Environment::Development.is_production_like());
    }

    #[test]
    fn test_legacy_aliases_parse() {
        assert_eq!("pro".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
    }
}
