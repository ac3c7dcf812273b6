//! Staleness decision and buffering engine.
//!
//! A source is stale when:
//! 1. its destination is absent, or
//! 2. the source is newer than the destination, or
//! 3. the extra watermark is newer than an existing destination.
//!
//! In shared-destination mode a run starts `Buffering`: fresh sources are
//! held back until the first stale one, which releases the buffer (in
//! arrival order) and latches the run into `PassAll`. Whatever is still
//! buffered at the end was fresh and is dropped.

use std::path::PathBuf;
use std::time::SystemTime;

use freshen_core::{
    normalize, Config, DestinationProbe, ExtraWatermark, OptionsInput, SourceFile,
    TimestampField,
};

use crate::destination::{resolve, select_mode, DestinationMode, Resolved};
use crate::extra::resolve_watermark;
use crate::FreshenError;

// ---------------------------------------------------------------------------
// Freshness predicate
// ---------------------------------------------------------------------------

/// Why a source was judged stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    DestinationMissing,
    SourceNewer,
    ExtraNewer { extra: PathBuf },
}

/// Decide staleness for one source. `None` means up to date.
pub fn stale_reason(
    probe: &DestinationProbe,
    watermark: Option<&ExtraWatermark>,
    source_time: SystemTime,
    field: TimestampField,
) -> Option<StaleReason> {
    let Some(dest_time) = probe.time(field) else {
        return Some(StaleReason::DestinationMissing);
    };
    if source_time > dest_time {
        return Some(StaleReason::SourceNewer);
    }
    match watermark {
        Some(extra) if extra.at > dest_time => Some(StaleReason::ExtraNewer {
            extra: extra.path.clone(),
        }),
        _ => None,
    }
}

pub fn is_stale(
    probe: &DestinationProbe,
    watermark: Option<&ExtraWatermark>,
    source_time: SystemTime,
    field: TimestampField,
) -> bool {
    stale_reason(probe, watermark, source_time, field).is_some()
}

/// Per-file decision, as reported by [`Freshness::explain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub destination_time: Option<SystemTime>,
    pub reason: Option<StaleReason>,
}

impl Verdict {
    pub fn is_stale(&self) -> bool {
        self.reason.is_some()
    }
}

// ---------------------------------------------------------------------------
// Freshness
// ---------------------------------------------------------------------------

/// A constructed freshness filter.
///
/// Construction validates options, computes the extra watermark and picks
/// the destination mode. All three are read-only afterwards, so one engine
/// may start any number of independent runs.
#[derive(Debug)]
pub struct Freshness {
    config: Config,
    mode: DestinationMode,
    watermark: Option<ExtraWatermark>,
}

impl Freshness {
    /// Normalize raw options and build the engine.
    pub fn new(input: Option<OptionsInput>) -> Result<Self, FreshenError> {
        Self::from_config(normalize(input)?)
    }

    pub fn from_config(config: Config) -> Result<Self, FreshenError> {
        let watermark = resolve_watermark(config.root(), config.extra(), config.timestamp())?;
        let mode = select_mode(&config)?;
        match &mode {
            DestinationMode::Shared { path, probe } => tracing::info!(
                "shared destination {} ({})",
                path.display(),
                if matches!(probe, DestinationProbe::Absent) {
                    "absent"
                } else {
                    "present"
                }
            ),
            DestinationMode::PerFile { dir } => tracing::info!(
                "per-file destinations under {}",
                dir.as_deref().unwrap_or(config.root()).display()
            ),
        }
        Ok(Freshness {
            config,
            mode,
            watermark,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mode(&self) -> &DestinationMode {
        &self.mode
    }

    pub fn watermark(&self) -> Option<&ExtraWatermark> {
        self.watermark.as_ref()
    }

    /// Begin a new file sequence.
    pub fn start(&self) -> FilterRun<'_> {
        let state = if self.mode.is_shared() {
            RunState::Buffering(Vec::new())
        } else {
            RunState::PerFile
        };
        FilterRun {
            engine: self,
            state,
            seen: 0,
            emitted: 0,
        }
    }

    /// Decide one file on its own, without any buffering.
    pub fn explain(&self, file: &SourceFile) -> Result<Verdict, FreshenError> {
        let source_time = self.source_time(file)?;
        let Resolved { path, probe } = resolve(&self.config, &self.mode, file)?;
        let field = self.config.timestamp();
        Ok(Verdict {
            source: file.relative.clone(),
            destination: path,
            destination_time: probe.time(field),
            reason: stale_reason(&probe, self.watermark.as_ref(), source_time, field),
        })
    }

    fn source_time(&self, file: &SourceFile) -> Result<SystemTime, FreshenError> {
        file.times
            .map(|times| times.get(self.config.timestamp()))
            .ok_or_else(|| FreshenError::MissingStats {
                path: file.relative.clone(),
            })
    }

    fn check(&self, file: &SourceFile) -> Result<bool, FreshenError> {
        let verdict = self.explain(file)?;
        match &verdict.reason {
            Some(reason) => tracing::debug!(
                "stale: {} -> {} ({reason:?})",
                file.path().display(),
                verdict.destination.display()
            ),
            None => tracing::debug!(
                "fresh: {} -> {}",
                file.path().display(),
                verdict.destination.display()
            ),
        }
        Ok(verdict.is_stale())
    }
}

// ---------------------------------------------------------------------------
// FilterRun
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum RunState {
    /// Each file is judged alone; nothing is ever held back.
    PerFile,
    /// Shared destination, no stale file seen yet.
    Buffering(Vec<SourceFile>),
    /// Shared destination after the first stale file.
    PassAll,
    /// An earlier push failed.
    Failed,
}

/// Counts reported when a run finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub seen: usize,
    pub emitted: usize,
    /// Buffered files dropped at the end because they were fresh.
    pub discarded: usize,
}

/// One file sequence through a [`Freshness`] engine.
///
/// Dropping a run without calling [`finish`](FilterRun::finish) releases any
/// buffered files without emitting them.
#[derive(Debug)]
pub struct FilterRun<'a> {
    engine: &'a Freshness,
    state: RunState,
    seen: usize,
    emitted: usize,
}

impl FilterRun<'_> {
    /// Feed one source file; returns the files to emit now, in order.
    ///
    /// Any error aborts the run: the buffer is dropped and later pushes
    /// return [`FreshenError::Aborted`].
    pub fn push(&mut self, file: SourceFile) -> Result<Vec<SourceFile>, FreshenError> {
        if matches!(self.state, RunState::Failed) {
            return Err(FreshenError::Aborted);
        }
        self.seen += 1;
        match self.step(file) {
            Ok(out) => {
                self.emitted += out.len();
                Ok(out)
            }
            Err(err) => {
                self.state = RunState::Failed;
                Err(err)
            }
        }
    }

    fn step(&mut self, file: SourceFile) -> Result<Vec<SourceFile>, FreshenError> {
        if file.times.is_none() {
            return Err(FreshenError::MissingStats {
                path: file.relative,
            });
        }
        match &mut self.state {
            RunState::PassAll => Ok(vec![file]),
            RunState::PerFile => {
                if self.engine.check(&file)? {
                    Ok(vec![file])
                } else {
                    Ok(Vec::new())
                }
            }
            RunState::Buffering(pending) => {
                if !self.engine.check(&file)? {
                    pending.push(file);
                    return Ok(Vec::new());
                }
                let mut out = std::mem::take(pending);
                tracing::debug!(
                    "{} is stale; releasing {} buffered file(s)",
                    file.path().display(),
                    out.len()
                );
                out.push(file);
                self.state = RunState::PassAll;
                Ok(out)
            }
            RunState::Failed => Err(FreshenError::Aborted),
        }
    }

    /// Files currently held back.
    pub fn pending(&self) -> &[SourceFile] {
        match &self.state {
            RunState::Buffering(pending) => pending,
            _ => &[],
        }
    }

    /// True once the run releases every file it sees.
    pub fn passing_all(&self) -> bool {
        matches!(self.state, RunState::PassAll)
    }

    /// End the sequence, dropping buffered (fresh) files.
    pub fn finish(self) -> RunSummary {
        let discarded = self.pending().len();
        if discarded > 0 {
            tracing::debug!("discarding {discarded} up-to-date buffered file(s)");
        }
        let summary = RunSummary {
            seen: self.seen,
            emitted: self.emitted,
            discarded,
        };
        tracing::info!(
            "freshness run: {} seen, {} emitted, {} up to date",
            summary.seen,
            summary.emitted,
            summary.seen - summary.emitted
        );
        summary
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
