mod analyzer;
mod parser;
mod report;

use analyzer::AnalyzerConfig;
use clap::Parser;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_TOP_N: usize = 10;

/// Ranks failed-access IPs and most requested URLs in a Squid access log
#[derive(Parser, Debug)]
#[command(
    name = "squid_log_analyzer",
    author,
    version,
    about = "Counts failed access attempts per client IP and hits per URL in a Squid access log"
)]
struct Args {
    /// Path to the access log to analyze
    #[arg(value_name = "LOG_FILE")]
    file: PathBuf,

    /// Number of IPs and URLs to show in each ranking
    #[arg(value_name = "TOP_N", default_value_t = DEFAULT_TOP_N)]
    top_n: usize,

    /// Suppress warnings for malformed log lines.
    /// RUST_LOG can raise verbosity but never hides these warnings.
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // usage errors exit 1; --help and --version are not errors
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    init_tracing(args.quiet);

    let analysis = match analyzer::analyze_file(&args.file, &AnalyzerConfig::default()) {
        Ok(analysis) => analysis,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    info!(
        lines = analysis.lines_read,
        skipped = analysis.skipped_lines.len(),
        "parsed access log"
    );
    if analysis.url_hits.is_empty() {
        warn!("no usable records found in '{}'", args.file.display());
    }

    report::print_report(&analysis, args.top_n, &args.file);

    let output = Path::new(report::DEFAULT_OUTPUT_FILE);
    match report::export_csv(&analysis, output) {
        Ok(()) => println!("✓ Results saved to '{}'", output.display()),
        Err(e) => println!("error: failed to save CSV '{}': {}", output.display(), e),
    }
}

fn init_tracing(quiet: bool) {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(quiet, directives.as_deref()))
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

/// `--quiet` wins; otherwise RUST_LOG applies as long as it keeps `warn` enabled.
fn log_filter(quiet: bool, directives: Option<&str>) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }
    match directives.and_then(|d| EnvFilter::try_new(d).ok()) {
        Some(filter)
            if filter
                .max_level_hint()
                .map_or(true, |max| max >= LevelFilter::WARN) =>
        {
            filter
        }
        _ => EnvFilter::new("warn"),
    }
}
