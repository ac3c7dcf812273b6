//! Error types for freshen-filter.

use std::path::PathBuf;

use thiserror::Error;

use freshen_core::{ConfigError, MapError};

/// All errors that can arise while building or running a freshness filter.
///
/// `Config`, `ExtraStat`, `ExtraStatUnknown` and a failed shared-destination
/// `UnexpectedStat` happen at construction. The rest abort a running
/// sequence.
#[derive(Debug, Error)]
pub enum FreshenError {
    /// Options failed validation.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A matched extra dependency could not be stat'ed.
    #[error("failed to stat extra dependency {path}: {source}")]
    ExtraStat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Extra-dependency expansion failed without naming a path.
    #[error("failed to stat extra dependency: {source}")]
    ExtraStatUnknown {
        #[source]
        source: std::io::Error,
    },

    /// A source file arrived without timestamps.
    #[error("no stats for source file {path}")]
    MissingStats { path: PathBuf },

    /// A per-file source path was absolute, so it cannot name a destination
    /// under the destination directory.
    #[error("source path {path} must be relative to the root")]
    AbsoluteSource { path: PathBuf },

    /// A destination stat failed for a reason other than not-found.
    #[error("unexpected error while checking destination {path}: {source}")]
    UnexpectedStat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configured mapper could not name a destination.
    #[error("mapper failed for {path}: {source}")]
    Mapper {
        path: PathBuf,
        #[source]
        source: MapError,
    },

    /// The downstream consumer rejected an emitted file.
    #[error("downstream consumer failed on {path}: {source}")]
    Downstream {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The sequence already failed; no further files are processed.
    #[error("filter run aborted by an earlier error")]
    Aborted,
}

/// Convenience constructor for [`FreshenError::UnexpectedStat`].
pub(crate) fn stat_err(path: impl Into<PathBuf>, source: std::io::Error) -> FreshenError {
    FreshenError::UnexpectedStat {
        path: path.into(),
        source,
    }
}
