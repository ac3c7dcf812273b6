//! `freshen filter`: print the sources that need rebuilding.

use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use freshen_filter::pipeline;

use super::options::{read_sources, OptionArgs};

/// Arguments for `freshen filter`.
#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Source files (relative to the root). Read from stdin when omitted.
    pub sources: Vec<PathBuf>,

    #[command(flatten)]
    pub options: OptionArgs,

    /// Separate output paths with NUL instead of newline.
    #[arg(long)]
    pub null: bool,
}

impl FilterArgs {
    pub fn run(self) -> Result<()> {
        let engine = self.options.engine()?;
        let sources = read_sources(&self.sources, engine.config().root())?;
        let separator = if self.null { b'\0' } else { b'\n' };

        let stdout = std::io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        let summary = pipeline::run(&engine, sources, |file| {
            out.write_all(file.relative.to_string_lossy().as_bytes())?;
            out.write_all(&[separator])
        })
        .context("freshness filter failed")?;
        out.flush().context("failed to write output")?;

        tracing::info!(
            "{} of {} source(s) need rebuilding",
            summary.emitted,
            summary.seen
        );
        Ok(())
    }
}
