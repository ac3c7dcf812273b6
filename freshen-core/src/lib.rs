//! Freshen core library: domain types, option normalization, errors.
//!
//! Public API surface:
//! - [`types`]: timestamps, source files, destination probes
//! - [`options`]: raw options, [`Config`], [`normalize`]
//! - [`mapper`]: the [`DestinationMapper`] seam
//! - [`error`]: [`ConfigError`], [`MapError`]

pub mod error;
pub mod mapper;
pub mod options;
pub mod types;

pub use error::{ConfigError, MapError};
pub use mapper::DestinationMapper;
pub use options::{load_options, normalize, Config, ExtraPatterns, OptionsInput, OptionsRecord};
pub use types::{DestinationProbe, ExtraWatermark, FileTimes, SourceFile, TimestampField};
