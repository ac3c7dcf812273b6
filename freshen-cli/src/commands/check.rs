//! `freshen check`: per-file freshness verdicts.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use freshen_core::TimestampField;
use freshen_filter::{DestinationMode, Freshness, StaleReason, Verdict};

use super::options::{read_sources, OptionArgs};

/// Arguments for `freshen check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Source files (relative to the root). Read from stdin when omitted.
    pub sources: Vec<PathBuf>,

    #[command(flatten)]
    pub options: OptionArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let engine = self.options.engine()?;
        let sources = read_sources(&self.sources, engine.config().root())?;

        let mut verdicts = Vec::with_capacity(sources.len());
        for file in &sources {
            let verdict = engine
                .explain(file)
                .with_context(|| format!("check failed for {}", file.relative.display()))?;
            verdicts.push(verdict);
        }

        let report = CheckReport::new(&engine, verdicts);
        if self.json {
            print_json(report)?;
            return Ok(());
        }
        print_table(report);
        Ok(())
    }
}

#[derive(Debug)]
struct CheckReport {
    shared: bool,
    watermark: Option<PathBuf>,
    field: TimestampField,
    verdicts: Vec<Verdict>,
}

impl CheckReport {
    fn new(engine: &Freshness, verdicts: Vec<Verdict>) -> Self {
        Self {
            shared: matches!(engine.mode(), DestinationMode::Shared { .. }),
            watermark: engine.watermark().map(|w| w.path.clone()),
            field: engine.config().timestamp(),
            verdicts,
        }
    }

    fn stale_count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.is_stale()).count()
    }

    /// Files `freshen filter` would print. A shared destination is
    /// all-or-nothing.
    fn emitted_count(&self) -> usize {
        match (self.shared, self.stale_count()) {
            (true, 0) => 0,
            (true, _) => self.verdicts.len(),
            (false, stale) => stale,
        }
    }
}

#[derive(Serialize)]
struct CheckReportJson {
    summary: CheckSummaryJson,
    files: Vec<VerdictJson>,
}

#[derive(Serialize)]
struct CheckSummaryJson {
    sources: usize,
    stale: usize,
    emitted: usize,
    shared_destination: bool,
    extra_watermark: Option<String>,
    /// `mtime` or `ctime`: which timestamp `destination_time` carries.
    timestamp: String,
}

#[derive(Serialize)]
struct VerdictJson {
    source: String,
    destination: String,
    status: String,
    reason: Option<String>,
    destination_time: Option<String>,
}

#[derive(Tabled)]
struct VerdictTableRow {
    #[tabled(rename = "source")]
    source: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "reason")]
    reason: String,
    #[tabled(rename = "destination")]
    destination: String,
    #[tabled(rename = "dest age")]
    age: String,
}

fn print_json(report: CheckReport) -> Result<()> {
    let payload = CheckReportJson {
        summary: CheckSummaryJson {
            sources: report.verdicts.len(),
            stale: report.stale_count(),
            emitted: report.emitted_count(),
            shared_destination: report.shared,
            extra_watermark: report.watermark.as_ref().map(|p| p.display().to_string()),
            timestamp: report.field.to_string(),
        },
        files: report
            .verdicts
            .into_iter()
            .map(|v| VerdictJson {
                status: status_key(&v).to_string(),
                reason: v.reason.as_ref().map(reason_detail),
                source: v.source.display().to_string(),
                destination: v.destination.display().to_string(),
                destination_time: v
                    .destination_time
                    .map(|t| DateTime::<Utc>::from(t).to_rfc3339()),
            })
            .collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize check JSON")?
    );
    Ok(())
}

fn print_table(report: CheckReport) {
    println!(
        "freshen v{} | {} sources | {} stale | {} would be emitted",
        env!("CARGO_PKG_VERSION"),
        report.verdicts.len(),
        report.stale_count(),
        report.emitted_count(),
    );

    if report.verdicts.is_empty() {
        println!("No sources given.");
        return;
    }
    if let Some(extra) = &report.watermark {
        println!("Newest extra dependency: {}", extra.display());
    }
    if report.shared && report.stale_count() > 0 {
        println!(
            "{}",
            "Shared destination: one stale source releases every source.".yellow()
        );
    }

    let emitted = report.emitted_count();
    let rows: Vec<VerdictTableRow> = report
        .verdicts
        .iter()
        .map(|v| VerdictTableRow {
            source: v.source.display().to_string(),
            status: status_label(v, report.shared && emitted > 0),
            reason: v
                .reason
                .as_ref()
                .map(reason_detail)
                .unwrap_or_else(|| "up to date".to_string()),
            destination: v.destination.display().to_string(),
            age: v
                .destination_time
                .map(format_system_time_age)
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn status_key(verdict: &Verdict) -> &'static str {
    if verdict.is_stale() {
        "stale"
    } else {
        "fresh"
    }
}

fn status_label(verdict: &Verdict, released: bool) -> String {
    match (verdict.is_stale(), released) {
        (true, _) => "STALE".yellow().bold().to_string(),
        (false, true) => "FRESH*".cyan().to_string(),
        (false, false) => "FRESH".green().to_string(),
    }
}

fn reason_detail(reason: &StaleReason) -> String {
    match reason {
        StaleReason::DestinationMissing => "destination missing".to_string(),
        StaleReason::SourceNewer => "source newer".to_string(),
        StaleReason::ExtraNewer { extra } => format!("{} newer", extra.display()),
    }
}

/// Format age from a filesystem timestamp.
fn format_system_time_age(timestamp: SystemTime) -> String {
    let age = SystemTime::now()
        .duration_since(timestamp)
        .unwrap_or_default();
    format_duration(age)
}

fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs();
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}
