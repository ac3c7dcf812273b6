//! Custom destination naming.

use std::path::{Path, PathBuf};

use crate::error::MapError;

/// Maps a source path (relative to the working root) to its destination.
///
/// The result may be relative, in which case it is joined under the
/// configured destination, or absolute, in which case it is used as-is.
pub trait DestinationMapper: Send + Sync {
    fn map(&self, relative: &Path) -> Result<PathBuf, MapError>;

    /// Short label for logs and `Debug` output.
    fn describe(&self) -> String {
        "custom mapper".to_string()
    }
}

impl<F> DestinationMapper for F
where
    F: Fn(&Path) -> PathBuf + Send + Sync,
{
    fn map(&self, relative: &Path) -> Result<PathBuf, MapError> {
        Ok(self(relative))
    }
}
