//! paes-verify
//!
//! Scans a source tree for legacy randomness usage and prints a pass/fail
//! report.
//!
//! **Usage:**
//! ```bash
//! paes-verify [ROOT] [--include app] [--exclude vendor] [--ext ts] [--pattern "Math.random()"]
//! ```
//!
//! Exit status: 0 clean, 1 violations found, 2 scan failure.

mod scanner;

use clap::Parser;
use scanner::Scanner;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Legacy randomness verifier
#[derive(Parser, Debug)]
#[clap(name = "paes-verify")]
#[clap(about = "Verify that no legacy randomness calls remain in a source tree")]
struct Args {
    /// Root directory to scan
    #[clap(default_value = ".")]
    root: PathBuf,

    /// Only scan these directories under the root (repeatable)
    #[clap(long = "include", value_name = "DIR")]
    include: Vec<PathBuf>,

    /// Additional directory or file names to skip (repeatable)
    #[clap(long = "exclude", value_name = "NAME")]
    exclude: Vec<String>,

    /// File extensions to scan, replacing ts/tsx/js/jsx (repeatable)
    #[clap(long = "ext", value_name = "EXT")]
    ext: Vec<String>,

    /// Disallowed patterns, replacing Math.random() (repeatable)
    #[clap(long = "pattern", value_name = "PATTERN")]
    pattern: Vec<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("Verification failed: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(args: &Args) -> anyhow::Result<bool> {
    let scanner = Scanner::new()
        .with_include_dirs(args.include.clone())
        .with_excludes(args.exclude.clone())
        .with_extensions(args.ext.clone())
        .with_patterns(args.pattern.clone());

    info!(root = %args.root.display(), "Scanning source tree");
    let report = scanner.scan(&args.root)?;
    print!("{}", report.render(scanner.patterns()));

    Ok(report.passed())
}
