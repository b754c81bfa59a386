use crate::analyzer::{Analysis, FrequencyCounter};
use colored::Colorize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::error;

/// Where the CSV snapshot goes when nobody says otherwise
pub const DEFAULT_OUTPUT_FILE: &str = "resultado.csv";

const FAILURE_HEADER: [&str; 2] = ["IP", "Tentativas Falhas"];
const URL_HEADER: [&str; 2] = ["URL", "Acessos"];

const SEPARATOR: &str =
    "════════════════════════════════════════════════════════════════════";
const THIN_SEP: &str =
    "────────────────────────────────────────────────────────────────────";

const IP_WIDTH: usize = 17;
const URL_WIDTH: usize = 48;

/// Print the analysis report to stdout
pub fn print_report(analysis: &Analysis, top_n: usize, source_file: &Path) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = render_report(&mut out, analysis, top_n, source_file) {
        error!("failed to print report: {e}");
    }
}

/// Write the human-readable report: overview, then the top `top_n` failing IPs
/// and the top `top_n` URLs.
pub fn render_report<W: Write>(
    out: &mut W,
    analysis: &Analysis,
    top_n: usize,
    source_file: &Path,
) -> io::Result<()> {
    writeln!(out, "\n{}", SEPARATOR.cyan().bold())?;
    writeln!(out, "{}", "  📋  SQUID ACCESS LOG ANALYSIS".white().bold())?;
    writeln!(out, "{}", SEPARATOR.cyan().bold())?;
    writeln!(out, "  Source : {}", source_file.display().to_string().yellow())?;
    writeln!(out)?;

    // ── Overview ──────────────────────────────────────────────────────────────
    section_header(out, "OVERVIEW")?;
    let skipped = analysis.skipped_lines.len();
    writeln!(out, "  {:<28} {:>8}", "Lines read:", analysis.lines_read)?;
    writeln!(
        out,
        "  {:<28} {:>8}",
        "Records counted:",
        analysis.records_counted().to_string().green().bold()
    )?;
    writeln!(
        out,
        "  {:<28} {:>8}",
        "Malformed / skipped lines:",
        if skipped > 0 {
            skipped.to_string().yellow().bold()
        } else {
            "0".normal()
        }
    )?;
    writeln!(
        out,
        "  {:<28} {:>8}",
        "Failed attempts:",
        analysis.failed_attempts.total().to_string().red()
    )?;
    writeln!(
        out,
        "  {:<28} {:>8}",
        "Distinct URLs:",
        analysis.url_hits.len()
    )?;
    writeln!(out)?;

    // ── Failed attempts ───────────────────────────────────────────────────────
    section_header(out, &format!("TOP {top_n} IPs BY FAILED ATTEMPTS"))?;
    ranked_table(
        out,
        &analysis.failed_attempts,
        top_n,
        ("IP Address", "Failures"),
        IP_WIDTH,
        |ip| ip.red().bold().to_string(),
    )?;
    writeln!(out)?;

    // ── Accessed URLs ─────────────────────────────────────────────────────────
    section_header(out, &format!("TOP {top_n} MOST ACCESSED URLs"))?;
    ranked_table(
        out,
        &analysis.url_hits,
        top_n,
        ("URL", "Accesses"),
        URL_WIDTH,
        |url| truncate(url, URL_WIDTH).cyan().to_string(),
    )?;

    writeln!(out, "\n{}\n", SEPARATOR.cyan())
}

fn ranked_table<W, F>(
    out: &mut W,
    counter: &FrequencyCounter,
    top_n: usize,
    columns: (&str, &str),
    key_width: usize,
    paint: F,
) -> io::Result<()>
where
    W: Write,
    F: Fn(&str) -> String,
{
    let top = counter.most_common(Some(top_n));
    if top.is_empty() {
        return writeln!(out, "  (no data)");
    }

    writeln!(
        out,
        "  {:<3}  {:<width$}  {:>8}",
        "#",
        columns.0,
        columns.1,
        width = key_width
    )?;
    // "#" column, key column and count column plus the gaps between them
    writeln!(out, "  {}", "─".repeat(3 + 2 + key_width + 2 + 8))?;
    for (i, item) in top.iter().enumerate() {
        // pad before painting, escape codes would throw the width off
        let key = format!("{:<width$}", item.value, width = key_width);
        writeln!(
            out,
            "  {:<3}  {}  {:>8}",
            (i + 1).to_string().dimmed(),
            paint(&key),
            item.count
        )?;
    }
    Ok(())
}

/// Write both counters as CSV: failing IPs, a blank row, then URLs.
/// Every entry is written, most frequent first.
pub fn write_csv<W: Write>(analysis: &Analysis, mut out: W) -> Result<(), csv::Error> {
    write_section(&mut out, FAILURE_HEADER, &analysis.failed_attempts)?;
    out.write_all(b"\n")?;
    write_section(&mut out, URL_HEADER, &analysis.url_hits)?;
    out.flush()?;
    Ok(())
}

/// Save the CSV snapshot to `path`, replacing any existing file.
pub fn export_csv(analysis: &Analysis, path: &Path) -> Result<(), csv::Error> {
    let file = File::create(path)?;
    write_csv(analysis, BufWriter::new(file))
}

fn write_section<W: Write>(
    out: W,
    header: [&str; 2],
    counter: &FrequencyCounter,
) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);
    wtr.write_record(header)?;
    for item in counter.most_common(None) {
        wtr.serialize(item)?;
    }
    wtr.flush()?;
    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn section_header<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    writeln!(out, "  {} {}", "▶".cyan(), title.white().bold())?;
    writeln!(out, "  {}", THIN_SEP)
}

/// Shorten to `width` characters, marking the cut with an ellipsis
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut short: String = s.chars().take(width - 1).collect();
    short.push('…');
    short
}
