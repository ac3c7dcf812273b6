//! Option normalization.
//!
//! Options arrive either as a bare destination string or as a record. Both
//! shapes deserialize from YAML (`serde(untagged)`) and normalize into one
//! validated, immutable [`Config`].
//!
//! ```yaml
//! # bare form
//! dist
//! ```
//!
//! ```yaml
//! # record form
//! dest: dist
//! ext: .css
//! extra: ["config/**/*.yaml", "Cargo.lock"]
//! ctime: false
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{invalid, ConfigError};
use crate::mapper::DestinationMapper;
use crate::types::TimestampField;

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// Options as supplied by a caller or an options file.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionsInput {
    /// Shorthand for `{ dest: <path> }`.
    Destination(String),
    Record(OptionsRecord),
}

impl fmt::Debug for OptionsInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionsInput::Destination(dest) => f.debug_tuple("Destination").field(dest).finish(),
            OptionsInput::Record(record) => f.debug_tuple("Record").field(record).finish(),
        }
    }
}

impl From<&str> for OptionsInput {
    fn from(dest: &str) -> Self {
        OptionsInput::Destination(dest.to_owned())
    }
}

impl From<OptionsRecord> for OptionsInput {
    fn from(record: OptionsRecord) -> Self {
        OptionsInput::Record(record)
    }
}

/// One pattern or a list of patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraPatterns {
    One(String),
    Many(Vec<String>),
}

impl ExtraPatterns {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            ExtraPatterns::One(pattern) => vec![pattern],
            ExtraPatterns::Many(patterns) => patterns,
        }
    }
}

/// The record form of the options.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionsRecord {
    /// Destination directory or file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,

    /// Replacement extension for derived destination names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,

    /// Destination naming template. [`normalize`] rejects it unless a
    /// [`DestinationMapper`] compiled from it is attached as `mapper`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<String>,

    /// Extra-dependency globs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<ExtraPatterns>,

    /// Compare change times instead of modification times.
    #[serde(default)]
    pub ctime: bool,

    /// Working root that relative paths resolve against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    #[serde(skip)]
    pub mapper: Option<Arc<dyn DestinationMapper>>,
}

impl fmt::Debug for OptionsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsRecord")
            .field("dest", &self.dest)
            .field("ext", &self.ext)
            .field("map", &self.map)
            .field("extra", &self.extra)
            .field("ctime", &self.ctime)
            .field("root", &self.root)
            .field("mapper", &self.mapper.as_ref().map(|m| m.describe()))
            .finish()
    }
}

impl OptionsRecord {
    pub fn with_dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    pub fn with_ext(mut self, ext: impl Into<String>) -> Self {
        self.ext = Some(ext.into());
        self
    }

    pub fn with_mapper(mut self, mapper: impl DestinationMapper + 'static) -> Self {
        self.mapper = Some(Arc::new(mapper));
        self
    }

    pub fn with_extra(mut self, extra: ExtraPatterns) -> Self {
        self.extra = Some(extra);
        self
    }

    pub fn with_ctime(mut self, ctime: bool) -> Self {
        self.ctime = ctime;
        self
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Validated config
// ---------------------------------------------------------------------------

/// Validated freshness configuration. Immutable once built.
#[derive(Clone)]
pub struct Config {
    root: PathBuf,
    destination: Option<PathBuf>,
    extension: Option<String>,
    mapper: Option<Arc<dyn DestinationMapper>>,
    extra: Option<Vec<String>>,
    timestamp: TimestampField,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("root", &self.root)
            .field("destination", &self.destination)
            .field("extension", &self.extension)
            .field("mapper", &self.mapper.as_ref().map(|m| m.describe()))
            .field("extra", &self.extra)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

impl Config {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    /// Destination resolved against the working root.
    pub fn destination_path(&self) -> Option<PathBuf> {
        self.destination.as_ref().map(|dest| self.root.join(dest))
    }

    /// Replacement extension without its leading dot.
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    pub fn mapper(&self) -> Option<&dyn DestinationMapper> {
        self.mapper.as_deref()
    }

    pub fn extra(&self) -> Option<&[String]> {
        self.extra.as_deref()
    }

    pub fn timestamp(&self) -> TimestampField {
        self.timestamp
    }
}

/// Validate raw options into a [`Config`].
pub fn normalize(input: Option<OptionsInput>) -> Result<Config, ConfigError> {
    let record = match input.ok_or(ConfigError::Missing)? {
        OptionsInput::Destination(dest) => OptionsRecord::default().with_dest(dest),
        OptionsInput::Record(record) => record,
    };

    if record.map.is_some() && record.mapper.is_none() {
        return Err(invalid(
            "map",
            "template was not compiled into a mapper; attach one with `with_mapper`",
        ));
    }
    if record.dest.is_none() && record.mapper.is_none() {
        return Err(ConfigError::MissingDestination);
    }

    let destination = match record.dest {
        Some(dest) if dest.trim().is_empty() => {
            return Err(invalid("dest", "must not be empty"));
        }
        Some(dest) => Some(PathBuf::from(dest)),
        None => None,
    };

    let extension = match record.ext {
        Some(ext) => {
            let trimmed = ext.strip_prefix('.').unwrap_or(&ext);
            if trimmed.is_empty() {
                return Err(invalid("ext", "must name an extension"));
            }
            Some(trimmed.to_string())
        }
        None => None,
    };

    let extra = match record.extra {
        Some(extra) => {
            let patterns = extra.into_vec();
            if patterns.is_empty() {
                return Err(invalid("extra", "must list at least one pattern"));
            }
            if patterns.iter().any(|p| p.trim().is_empty()) {
                return Err(invalid("extra", "patterns must not be empty"));
            }
            Some(patterns)
        }
        None => None,
    };

    let timestamp = if record.ctime {
        TimestampField::Changed
    } else {
        TimestampField::Modified
    };

    Ok(Config {
        root: record.root.unwrap_or_else(|| PathBuf::from(".")),
        destination,
        extension,
        mapper: record.mapper,
        extra,
        timestamp,
    })
}

/// Load raw options from a YAML file.
///
/// Returns `ConfigError::Parse` (with path + line context) on malformed or
/// mistyped YAML.
pub fn load_options(path: &Path) -> Result<OptionsInput, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
