// Irradose - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no
// platform dependencies.
//
// These types are the shared vocabulary across all layers.

use serde::Serialize;

// =============================================================================
// Table (normalised output of loading)
// =============================================================================

/// A rectangular-ish grid of raw cells loaded from a CSV export or the first
/// worksheet of a workbook.
///
/// Header labels are kept apart from the data rows. Row 0 is always the first
/// data row. A table is never mutated after loading; numeric views are
/// derived from it with [`Table::numeric_column`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column labels, when the source has a header row.
    pub headers: Option<Vec<String>>,

    /// Data rows. An empty string is an empty cell.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Option<Vec<String>>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns: header width when present, otherwise the widest row.
    pub fn width(&self) -> usize {
        match &self.headers {
            Some(h) => h.len(),
            None => self.rows.iter().map(Vec::len).max().unwrap_or(0),
        }
    }

    /// Raw text of a cell, if the row and column exist.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// Coerce one column to floating point.
    ///
    /// Empty, missing, or non-numeric cells become NaN. The table itself is
    /// left untouched.
    pub fn numeric_column(&self, col: usize) -> NumericSeries {
        let values = self
            .rows
            .iter()
            .map(|row| row.get(col).map_or(f64::NAN, |cell| parse_cell(cell)))
            .collect();
        NumericSeries::new(values)
    }
}

/// Parse a cell as `f64`, mapping anything unparseable to NaN.
pub fn parse_cell(cell: &str) -> f64 {
    cell.trim().parse::<f64>().unwrap_or(f64::NAN)
}

// =============================================================================
// Sentinel match
// =============================================================================

/// Position of the sentinel text inside a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentinelMatch {
    /// Data row containing the sentinel cell. `None` when the sentinel was
    /// found in a header label.
    pub row_index: Option<usize>,

    /// Column containing the sentinel.
    pub col_index: usize,
}

impl SentinelMatch {
    /// First data row to integrate from.
    ///
    /// A header match starts at the first data row; a cell match starts on
    /// the row after the anchor cell.
    pub fn start_row(&self) -> usize {
        self.row_index.map_or(0, |r| r + 1)
    }
}

// =============================================================================
// Numeric series
// =============================================================================

/// A numeric view of one table column. NaN marks cells that were empty or
/// not numbers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericSeries {
    values: Vec<f64>,
}

impl NumericSeries {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl From<Vec<f64>> for NumericSeries {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

// =============================================================================
// Integration result and outcome
// =============================================================================

/// Output of the decay integration engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntegrationResult {
    /// Decay-corrected total, rounded to one decimal place.
    pub total: f64,

    /// Number of rows counted during the measurement phase (seconds).
    pub elapsed_count: u64,
}

/// The result handed back to every caller (CLI, worker session, tests).
///
/// A non-empty `error` is the only authoritative failure signal; on failure
/// `total` and `elapsed_count` are zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub total: f64,
    pub elapsed_count: u64,
    pub error: Option<String>,
}

impl Outcome {
    /// Successful outcome carrying an integration result.
    pub fn ok(result: IntegrationResult) -> Self {
        Self {
            total: result.total,
            elapsed_count: result.elapsed_count,
            error: None,
        }
    }

    /// Failed outcome. An empty message is replaced so the failure is never
    /// mistaken for success.
    pub fn failed(message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = "calculation failed".to_string();
        }
        Self {
            total: 0.0,
            elapsed_count: 0,
            error: Some(message),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Elapsed count split into whole minutes and remaining seconds.
    pub fn minutes_seconds(&self) -> (u64, u64) {
        (self.elapsed_count / 60, self.elapsed_count % 60)
    }
}
