//! Tera-backed destination mapper.
//!
//! # Template variables
//!
//! | Variable | Example for `styles/site.scss` |
//! |----------|--------------------------------|
//! | `path`   | `styles/site.scss`             |
//! | `dir`    | `styles`                       |
//! | `name`   | `site.scss`                    |
//! | `stem`   | `site`                         |
//! | `ext`    | `.scss`                        |
//!
//! `{{ dir }}/{{ stem }}.css` maps `styles/site.scss` to `styles/site.css`.
//! A leading `/` in the rendered output makes the destination absolute.

use std::path::{Path, PathBuf};

use tera::Tera;

use freshen_core::{DestinationMapper, MapError};

use crate::context::PathContext;
use crate::error::MapperError;

const TEMPLATE_NAME: &str = "destination";

/// Compiles a destination template once and renders it per source file.
pub struct TemplateMapper {
    tera: Tera,
    source: String,
}

impl TemplateMapper {
    /// Compile `template`. Syntax errors surface here, not per file.
    pub fn new(template: &str) -> Result<Self, MapperError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, template)?;
        Ok(TemplateMapper {
            tera,
            source: template.to_string(),
        })
    }

    /// Compile the template stored in `path`, trimming the trailing newline.
    pub fn from_file(path: &Path) -> Result<Self, MapperError> {
        let contents = std::fs::read_to_string(path).map_err(|source| MapperError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(contents.trim_end_matches(['\r', '\n']))
    }

    pub fn template(&self) -> &str {
        &self.source
    }

    /// Render the destination for one relative source path.
    pub fn render(&self, relative: &Path) -> Result<PathBuf, MapperError> {
        let ctx = PathContext::from_path(relative);
        let rendered = self.tera.render(TEMPLATE_NAME, &ctx.to_tera_context()?)?;
        let trimmed = rendered.trim();
        if trimmed.is_empty() {
            return Err(MapperError::Empty {
                source_path: relative.to_path_buf(),
            });
        }
        // `{{ dir }}/x` at the root renders as `/x`; keep it relative unless
        // the template itself is absolute.
        let cleaned = if ctx.dir.is_empty() && !self.source.trim_start().starts_with('/') {
            trimmed.trim_start_matches('/')
        } else {
            trimmed
        };
        Ok(PathBuf::from(cleaned))
    }
}

impl DestinationMapper for TemplateMapper {
    fn map(&self, relative: &Path) -> Result<PathBuf, MapError> {
        self.render(relative).map_err(MapError::from)
    }

    fn describe(&self) -> String {
        format!("template `{}`", self.source)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
