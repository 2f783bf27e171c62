// Irradose - core/delimited.rs
//
// Delimited-text loading with header-row detection and delimiter fallback.
// Core layer: works on already-decoded text, never touches the filesystem.
//
// Stages are tried in order until one produces a table that the sentinel
// resolver accepts:
//   1. auto-detected delimiter (sampled from the header row onwards)
//   2. comma
//   3. tab
// Every stage uses the same detected header row. Blank lines are skipped,
// and so are rows whose field count disagrees with the header.

use crate::core::model::Table;
use crate::core::resolver::SentinelResolver;
use crate::util::constants;
use crate::util::error::{describe_delimiter, LoadError};
use std::fmt;
use std::path::Path;

/// Options for delimited-text loading.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvOptions {
    /// Line prefixes (case-insensitive, after trimming) marking the header row.
    pub header_markers: Vec<String>,
    /// Number of non-blank lines sampled for delimiter detection.
    pub sniff_lines: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            header_markers: constants::DEFAULT_HEADER_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            sniff_lines: constants::DEFAULT_SNIFF_LINES,
        }
    }
}

/// One attempt at turning text into a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvStage {
    AutoDetect,
    Fixed(u8),
}

impl CsvStage {
    /// Stages in the order they are tried.
    pub fn ordered() -> Vec<CsvStage> {
        std::iter::once(CsvStage::AutoDetect)
            .chain(constants::FALLBACK_DELIMITERS.iter().map(|d| CsvStage::Fixed(*d)))
            .collect()
    }
}

impl fmt::Display for CsvStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AutoDetect => f.write_str("auto-detect"),
            Self::Fixed(d) => write!(f, "fixed {}", describe_delimiter(*d)),
        }
    }
}

/// A table accepted by one of the stages.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCsv {
    pub table: Table,
    pub stage: CsvStage,
    pub delimiter: u8,
    /// Physical line index of the header row.
    pub header_row: usize,
    /// Rows dropped because their field count disagreed with the header.
    pub skipped_rows: usize,
}

/// Output of parsing the body with one delimiter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCsv {
    pub table: Table,
    pub skipped_rows: usize,
}

/// Load `text` into a table accepted by `resolver`.
pub fn load_delimited(
    text: &str,
    path: &Path,
    options: &CsvOptions,
    resolver: &SentinelResolver,
) -> Result<LoadedCsv, LoadError> {
    load_with_acceptance(text, path, options, resolver.sentinel(), |t| {
        resolver.accepts(t)
    })
}

/// Stage loop with a caller-supplied acceptance test.
pub(crate) fn load_with_acceptance<F>(
    text: &str,
    path: &Path,
    options: &CsvOptions,
    sentinel: &str,
    accept: F,
) -> Result<LoadedCsv, LoadError>
where
    F: Fn(&Table) -> bool,
{
    let header_row = detect_header_row(text, &options.header_markers);
    let body = &text[line_offset(text, header_row)..];
    tracing::debug!(path = %path.display(), header_row, "Header row selected");

    let mut attempts: Vec<String> = Vec::new();
    let mut tried: Vec<u8> = Vec::new();

    for stage in CsvStage::ordered() {
        let delimiter = match stage {
            CsvStage::AutoDetect => {
                match sniff_delimiter(body, options.sniff_lines) {
                    Some(d) => d,
                    None => {
                        let err = LoadError::DelimiterUndetected {
                            path: path.to_path_buf(),
                        };
                        tracing::debug!(path = %path.display(), %stage, error = %err, "Stage failed");
                        attempts.push(format!("{stage}: {err}"));
                        continue;
                    }
                }
            }
            CsvStage::Fixed(d) => d,
        };

        if tried.contains(&delimiter) {
            tracing::debug!(%stage, "Delimiter already tried; skipping stage");
            continue;
        }
        tried.push(delimiter);

        match parse_with_delimiter(body, delimiter, path) {
            Ok(parsed) if accept(&parsed.table) => {
                tracing::info!(
                    path = %path.display(),
                    %stage,
                    delimiter = %describe_delimiter(delimiter),
                    header_row,
                    columns = parsed.table.width(),
                    rows = parsed.table.len(),
                    skipped = parsed.skipped_rows,
                    "CSV table accepted"
                );
                return Ok(LoadedCsv {
                    table: parsed.table,
                    stage,
                    delimiter,
                    header_row,
                    skipped_rows: parsed.skipped_rows,
                });
            }
            Ok(parsed) => {
                tracing::debug!(
                    path = %path.display(),
                    %stage,
                    columns = parsed.table.width(),
                    "Stage produced no sentinel column"
                );
                attempts.push(format!(
                    "{stage}: {} columns, {} rows, no '{sentinel}' column",
                    parsed.table.width(),
                    parsed.table.len()
                ));
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), %stage, error = %e, "Stage failed");
                attempts.push(format!("{stage}: {e}"));
            }
        }
    }

    Err(LoadError::Unresolved {
        path: path.to_path_buf(),
        sentinel: sentinel.to_string(),
        attempts,
    })
}

/// Index of the first line that starts with a header marker, or 0.
pub fn detect_header_row(text: &str, markers: &[String]) -> usize {
    let markers: Vec<String> = markers
        .iter()
        .filter(|m| !m.is_empty())
        .map(|m| m.to_lowercase())
        .collect();

    text.lines()
        .position(|line| {
            let line = line.trim().trim_start_matches('\u{feff}').to_lowercase();
            markers.iter().any(|m| line.starts_with(m.as_str()))
        })
        .unwrap_or(0)
}

/// Byte offset where physical line `line` begins (text length if past end).
fn line_offset(text: &str, line: usize) -> usize {
    text.split_inclusive('\n').take(line).map(str::len).sum()
}

/// Guess the field delimiter from the first `sample_lines` non-blank lines.
///
/// The first sampled line is treated as the header. A candidate must occur in
/// it, and wins by matching the header's count on the largest share of lines;
/// ties go to the earlier candidate.
pub fn sniff_delimiter(body: &str, sample_lines: usize) -> Option<u8> {
    let sample: Vec<&str> = body
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(sample_lines.max(1))
        .collect();
    if sample.is_empty() {
        return None;
    }

    let mut best: Option<(u8, f64)> = None;
    for &candidate in constants::SNIFF_CANDIDATES {
        let counts: Vec<usize> = sample
            .iter()
            .map(|l| count_unquoted(l, candidate))
            .collect();
        let header_count = counts[0];
        if header_count == 0 {
            continue;
        }
        let agreeing = counts.iter().filter(|&&c| c == header_count).count();
        let share = agreeing as f64 / counts.len() as f64;
        tracing::trace!(
            delimiter = %describe_delimiter(candidate),
            header_count,
            share,
            "Delimiter candidate scored"
        );
        if best.map_or(true, |(_, s)| share > s) {
            best = Some((candidate, share));
        }
    }

    best.filter(|(_, share)| *share >= constants::SNIFF_MIN_AGREEMENT)
        .map(|(d, _)| d)
}

/// Count `delimiter` occurrences outside double-quoted sections.
fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for &b in line.as_bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
        } else if b == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Parse `body` (header line first) with a fixed delimiter.
pub fn parse_with_delimiter(
    body: &str,
    delimiter: u8,
    path: &Path,
) -> Result<ParsedCsv, LoadError> {
    let csv_err = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        delimiter,
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    let mut skipped_rows = 0;
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        if record.len() <= 1 && record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        if record.len() != headers.len() {
            skipped_rows += 1;
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    if skipped_rows > 0 {
        tracing::debug!(
            path = %path.display(),
            delimiter = %describe_delimiter(delimiter),
            skipped_rows,
            "Skipped rows with mismatched field count"
        );
    }

    Ok(ParsedCsv {
        table: Table::new(Some(headers), rows),
        skipped_rows,
    })
}
