//! # freshen-filter
//!
//! Staleness-decision engine: passes on only the source files whose
//! destination is missing or older than the source (or older than the newest
//! extra dependency).
//!
//! Build a [`Freshness`] once, then drive sequences through
//! [`pipeline::run`], [`pipeline::filter_stale`] or a manual
//! [`FilterRun`].

pub mod destination;
pub mod engine;
pub mod error;
pub mod extra;
pub mod pipeline;

pub use destination::DestinationMode;
pub use engine::{is_stale, FilterRun, Freshness, RunSummary, StaleReason, Verdict};
pub use error::FreshenError;
pub use pipeline::{collect_stale, filter_stale};
