//! Freshen: pass on only the source files that are newer than their build
//! artifacts.
//!
//! # Usage
//!
//! ```text
//! freshen filter [SOURCES...] --dest <path> [--ext .css] [--map '{{ stem }}.css']
//!                [--extra <glob>]... [--ctime] [--root <dir>] [--config <file>] [--null]
//! freshen check  [SOURCES...] (same options) [--json]
//! ```
//!
//! Sources are read one per line from stdin when none are given.

mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use commands::{check::CheckArgs, filter::FilterArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "freshen",
    version,
    about = "Filter source files down to those newer than their destinations",
    long_about = None,
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the sources that need rebuilding.
    Filter(FilterArgs),

    /// Show the per-file freshness verdict and its reason.
    Check(CheckArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Commands::Filter(args) => args.run(),
        Commands::Check(args) => args.run(),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_target(false)
        .try_init();
}
