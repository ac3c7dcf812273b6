//! Error types for freshen-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building a freshness configuration.
///
/// Every variant is fatal at construction time: no engine exists until the
/// options normalize cleanly.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No options were supplied at all.
    #[error("missing freshness options")]
    Missing,

    /// Neither a destination nor a mapper was configured.
    #[error("requires a destination path or a mapper")]
    MissingDestination,

    /// A field is present but carries an unusable value.
    #[error("invalid `{field}` option: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    /// An extra-dependency glob failed to compile.
    #[error("invalid extra pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Extra-dependency patterns were given but matched nothing.
    #[error("extra patterns matched no files: {}", .patterns.join(", "))]
    NoExtraMatches { patterns: Vec<String> },

    /// YAML parse error on load, with file path and serde_yaml location.
    #[error("failed to parse options at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// I/O failure while reading an options file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure reported by a [`DestinationMapper`](crate::mapper::DestinationMapper).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct MapError {
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl MapError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidField {
        field,
        reason: reason.into(),
    }
}
