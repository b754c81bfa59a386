use crate::parser::{self, AccessRecord};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Status codes counted as a failed access attempt
pub const DEFAULT_FAILURE_CODES: [&str; 4] = ["401", "403", "407", "503"];

/// A key together with how many times it was seen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedItem {
    pub value: String,
    pub count: usize,
}

/// Occurrence counter that remembers the order in which keys first appeared.
///
/// Ranking is a stable sort on count, so equal counts come out in first-seen
/// order and the output is the same on every run.
#[derive(Debug, Clone, Default)]
pub struct FrequencyCounter {
    index: HashMap<String, usize>,
    items: Vec<RankedItem>,
}

impl FrequencyCounter {
    pub fn increment(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&slot) => self.items[slot].count += 1,
            None => {
                self.index.insert(key.to_string(), self.items.len());
                self.items.push(RankedItem {
                    value: key.to_string(),
                    count: 1,
                });
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> usize {
        self.index.get(key).map_or(0, |&slot| self.items[slot].count)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> usize {
        self.items.iter().map(|item| item.count).sum()
    }

    /// Items by descending count, ties in first-seen order.
    ///
    /// `Some(n)` keeps at most `n` items; `None` returns all of them.
    pub fn most_common(&self, limit: Option<usize>) -> Vec<&RankedItem> {
        let mut ranked: Vec<&RankedItem> = self.items.iter().collect();
        // `sort_by` is stable: `items` is already in first-seen order
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        if let Some(n) = limit {
            ranked.truncate(n);
        }
        ranked
    }
}

/// Settings for a single aggregation pass
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    failure_codes: HashSet<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self::with_failure_codes(DEFAULT_FAILURE_CODES)
    }
}

impl AnalyzerConfig {
    pub fn with_failure_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            failure_codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_failure(&self, status_code: &str) -> bool {
        self.failure_codes.contains(status_code)
    }
}

/// Result of one pass over an access log
#[derive(Debug, Default)]
pub struct Analysis {
    /// client IP → requests answered with a failure code
    pub failed_attempts: FrequencyCounter,
    /// URL → requests, whatever the status
    pub url_hits: FrequencyCounter,
    pub lines_read: usize,
    /// 1-based numbers of lines that were skipped
    pub skipped_lines: Vec<usize>,
}

impl Analysis {
    pub fn record(&mut self, config: &AnalyzerConfig, entry: &AccessRecord<'_>) {
        if config.is_failure(entry.status_code) {
            self.failed_attempts.increment(entry.ip);
        }
        self.url_hits.increment(entry.url);
    }

    /// Lines that made it into the counters
    pub fn records_counted(&self) -> usize {
        self.lines_read - self.skipped_lines.len()
    }
}

/// Fatal errors while reading the log; any of these ends the run
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("log file '{}' was not found", path.display())]
    NotFound { path: PathBuf },

    #[error("could not open log file '{}': {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to read line {line}: {source}")]
    Read { line: usize, source: io::Error },
}

/// Open `path` and aggregate every line in it.
pub fn analyze_file(path: &Path, config: &AnalyzerConfig) -> Result<Analysis, AnalyzeError> {
    let file = File::open(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => AnalyzeError::NotFound {
            path: path.to_path_buf(),
        },
        _ => AnalyzeError::Open {
            path: path.to_path_buf(),
            source,
        },
    })?;

    analyze_reader(BufReader::new(file), config)
}

/// Aggregate an access log from any buffered reader.
///
/// Malformed lines are logged and skipped. Only a failing read aborts the pass.
pub fn analyze_reader<R: BufRead>(
    reader: R,
    config: &AnalyzerConfig,
) -> Result<Analysis, AnalyzeError> {
    let mut analysis = Analysis::default();

    for (idx, line_result) in reader.lines().enumerate() {
        let line_num = idx + 1;
        let line = line_result.map_err(|source| AnalyzeError::Read {
            line: line_num,
            source,
        })?;
        analysis.lines_read += 1;

        match parser::parse_log_line(&line) {
            Ok(entry) => analysis.record(config, &entry),
            Err(e) => {
                warn!(line = line_num, "skipping malformed line: {e}");
                analysis.skipped_lines.push(line_num);
            }
        }
    }

    debug!(
        lines = analysis.lines_read,
        skipped = analysis.skipped_lines.len(),
        failing_ips = analysis.failed_attempts.len(),
        urls = analysis.url_hits.len(),
        "finished aggregating access log"
    );

    Ok(analysis)
}
