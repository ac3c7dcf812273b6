//! Template context: the path pieces a destination template can use.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MapperError;

/// Rendering payload built from one source path.
///
/// Separators are normalised to `/` so templates behave the same on every
/// platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathContext {
    /// Full relative path, e.g. `styles/site.scss`.
    pub path: String,
    /// Parent directory, empty at the root, e.g. `styles`.
    pub dir: String,
    /// File name with extension, e.g. `site.scss`.
    pub name: String,
    /// File name without the last extension, e.g. `site`.
    pub stem: String,
    /// Last extension including its dot, empty when absent, e.g. `.scss`.
    pub ext: String,
}

impl PathContext {
    pub fn from_path(relative: &Path) -> Self {
        let lossy = |p: &Path| p.to_string_lossy().replace('\\', "/");
        Self {
            path: lossy(relative),
            dir: relative.parent().map(lossy).unwrap_or_default(),
            name: relative
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            stem: relative
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            ext: relative
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default(),
        }
    }

    pub fn to_tera_context(&self) -> Result<tera::Context, MapperError> {
        tera::Context::from_serialize(self).map_err(MapperError::from)
    }
}
