//! Pipeline entrypoints shared by the CLI and library callers.
//!
//! Each entrypoint drives one fresh [`FilterRun`]. The first fatal error ends
//! the run and is reported exactly once; nothing is emitted after it.

use std::collections::VecDeque;
use std::error::Error;

use freshen_core::SourceFile;

use crate::engine::{FilterRun, Freshness, RunSummary};
use crate::FreshenError;

/// Push every source through `engine`, handing emitted files to `sink`.
///
/// A sink failure is wrapped as [`FreshenError::Downstream`] and stops the
/// run.
pub fn run<I, F, E>(engine: &Freshness, sources: I, mut sink: F) -> Result<RunSummary, FreshenError>
where
    I: IntoIterator<Item = SourceFile>,
    F: FnMut(SourceFile) -> Result<(), E>,
    E: Into<Box<dyn Error + Send + Sync>>,
{
    let mut run = engine.start();
    for file in sources {
        for out in run.push(file)? {
            let path = out.relative.clone();
            sink(out).map_err(|e| FreshenError::Downstream {
                path,
                source: e.into(),
            })?;
        }
    }
    Ok(run.finish())
}

/// Collect the emitted files of one run.
pub fn collect_stale<I>(engine: &Freshness, sources: I) -> Result<Vec<SourceFile>, FreshenError>
where
    I: IntoIterator<Item = SourceFile>,
{
    let mut out = Vec::new();
    run(engine, sources, |file| {
        out.push(file);
        Ok::<_, FreshenError>(())
    })?;
    Ok(out)
}

/// Lazily filter `sources`, yielding emitted files as they are released.
pub fn filter_stale<I>(engine: &Freshness, sources: I) -> StaleFiles<'_, I::IntoIter>
where
    I: IntoIterator<Item = SourceFile>,
{
    StaleFiles {
        run: Some(engine.start()),
        sources: sources.into_iter(),
        ready: VecDeque::new(),
    }
}

/// Iterator returned by [`filter_stale`]. Fused after the first error.
#[derive(Debug)]
pub struct StaleFiles<'a, I> {
    run: Option<FilterRun<'a>>,
    sources: I,
    ready: VecDeque<SourceFile>,
}

impl<I> Iterator for StaleFiles<'_, I>
where
    I: Iterator<Item = SourceFile>,
{
    type Item = Result<SourceFile, FreshenError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(file) = self.ready.pop_front() {
                return Some(Ok(file));
            }
            if self.run.is_none() {
                return None;
            }
            let Some(file) = self.sources.next() else {
                if let Some(run) = self.run.take() {
                    run.finish();
                }
                return None;
            };
            let run = self.run.as_mut()?;
            match run.push(file) {
                Ok(out) => self.ready.extend(out),
                Err(err) => {
                    self.run = None;
                    return Some(Err(err));
                }
            }
        }
    }
}
