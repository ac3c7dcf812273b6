//! Error types for freshen-mapper.

use std::path::PathBuf;

use thiserror::Error;

use freshen_core::MapError;

/// All errors that can arise from destination templates.
#[derive(Debug, Error)]
pub enum MapperError {
    /// Tera template engine error (compile or render).
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Filesystem error while loading a template file.
    #[error("template io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    /// The template rendered to nothing for this source.
    #[error("template produced an empty destination for {source_path}")]
    Empty { source_path: PathBuf },
}

impl From<MapperError> for MapError {
    fn from(err: MapperError) -> Self {
        MapError::with_source("destination template failed", err)
    }
}
