//! Domain types for freshness checks.
//!
//! All path fields use `PathBuf`. Timestamps are `SystemTime` so comparisons
//! keep the platform's full precision.

use std::fmt;
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Which filesystem timestamp drives every comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimestampField {
    #[default]
    Modified,
    Changed,
}

impl fmt::Display for TimestampField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampField::Modified => write!(f, "mtime"),
            TimestampField::Changed => write!(f, "ctime"),
        }
    }
}

/// The two timestamps a freshness decision may look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTimes {
    pub modified: SystemTime,
    /// Inode change time on Unix; the modification time elsewhere.
    pub changed: SystemTime,
}

impl FileTimes {
    pub fn new(modified: SystemTime, changed: SystemTime) -> Self {
        Self { modified, changed }
    }

    /// Both timestamps set to the same instant.
    pub fn uniform(at: SystemTime) -> Self {
        Self::new(at, at)
    }

    pub fn from_metadata(meta: &Metadata) -> io::Result<Self> {
        let modified = meta.modified()?;
        Ok(Self {
            modified,
            changed: changed_time(meta).unwrap_or(modified),
        })
    }

    pub fn get(&self, field: TimestampField) -> SystemTime {
        match field {
            TimestampField::Modified => self.modified,
            TimestampField::Changed => self.changed,
        }
    }
}

#[cfg(unix)]
fn changed_time(meta: &Metadata) -> Option<SystemTime> {
    use std::os::unix::fs::MetadataExt;
    use std::time::{Duration, UNIX_EPOCH};

    let secs = meta.ctime();
    let nanos = u32::try_from(meta.ctime_nsec()).ok()?;
    if secs >= 0 {
        UNIX_EPOCH.checked_add(Duration::new(secs.unsigned_abs(), nanos))
    } else {
        UNIX_EPOCH
            .checked_sub(Duration::from_secs(secs.unsigned_abs()))?
            .checked_add(Duration::from_nanos(u64::from(nanos)))
    }
}

#[cfg(not(unix))]
fn changed_time(_meta: &Metadata) -> Option<SystemTime> {
    None
}

// ---------------------------------------------------------------------------
// Source files
// ---------------------------------------------------------------------------

/// One candidate file flowing through the filter.
///
/// `relative` is relative to the pipeline's working root. A file without
/// `times` is rejected by the engine rather than guessed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub relative: PathBuf,
    pub times: Option<FileTimes>,
}

impl SourceFile {
    pub fn new(relative: impl Into<PathBuf>, times: FileTimes) -> Self {
        Self {
            relative: relative.into(),
            times: Some(times),
        }
    }

    /// A handle whose metadata was never collected.
    pub fn without_times(relative: impl Into<PathBuf>) -> Self {
        Self {
            relative: relative.into(),
            times: None,
        }
    }

    /// Read the timestamps of `root/relative` from disk.
    pub fn stat(root: &Path, relative: impl Into<PathBuf>) -> io::Result<Self> {
        let relative = relative.into();
        let meta = std::fs::metadata(root.join(&relative))?;
        Ok(Self {
            times: Some(FileTimes::from_metadata(&meta)?),
            relative,
        })
    }

    pub fn path(&self) -> &Path {
        &self.relative
    }
}

// ---------------------------------------------------------------------------
// Probes and watermarks
// ---------------------------------------------------------------------------

/// Result of looking up one destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationProbe {
    Found(FileTimes),
    Absent,
}

impl DestinationProbe {
    pub fn time(&self, field: TimestampField) -> Option<SystemTime> {
        match self {
            DestinationProbe::Found(times) => Some(times.get(field)),
            DestinationProbe::Absent => None,
        }
    }
}

/// The newest extra dependency, found once per engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraWatermark {
    pub path: PathBuf,
    pub at: SystemTime,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
