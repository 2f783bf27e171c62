// Irradose - core/resolver.rs
//
// Locates the sentinel column in a loaded table and derives the numeric
// series the integration engine walks.

use crate::core::model::{NumericSeries, SentinelMatch, Table};
use crate::util::constants;
use crate::util::error::ResolveError;
use std::fmt;
use std::str::FromStr;

/// How the sentinel is searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// First header label containing the sentinel; integrate from row 0.
    /// Tables without header labels are searched cell by cell instead.
    #[default]
    Header,
    /// First data cell (row-major) containing the sentinel; integrate from
    /// the row after it.
    CellScan,
}

impl Strategy {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::CellScan => "cell-scan",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "header" => Ok(Self::Header),
            "cell-scan" | "cell_scan" | "cellscan" => Ok(Self::CellScan),
            other => Err(format!(
                "unknown strategy \"{other}\" (expected \"header\" or \"cell-scan\")"
            )),
        }
    }
}

/// A resolved column: where to start and what to integrate.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumn {
    pub anchor: SentinelMatch,
    pub start_row: usize,
    pub series: NumericSeries,
}

/// Sentinel search configured with the marker text and strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelResolver {
    sentinel: String,
    strategy: Strategy,
}

impl SentinelResolver {
    pub fn new(sentinel: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            sentinel: sentinel.into(),
            strategy,
        }
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// First sentinel position under this resolver's strategy.
    pub fn locate(&self, table: &Table) -> Option<SentinelMatch> {
        match (self.strategy, &table.headers) {
            (Strategy::Header, Some(headers)) => self.scan_headers(headers),
            (Strategy::Header, None) | (Strategy::CellScan, _) => self.scan_cells(table),
        }
    }

    /// Acceptance test used while trying CSV load stages.
    pub fn accepts(&self, table: &Table) -> bool {
        self.locate(table).is_some()
    }

    /// Locate the sentinel and coerce its column to numbers.
    pub fn resolve(&self, table: &Table) -> Result<ResolvedColumn, ResolveError> {
        let anchor = self
            .locate(table)
            .ok_or_else(|| ResolveError::SentinelNotFound {
                sentinel: self.sentinel.clone(),
            })?;

        let series = table.numeric_column(anchor.col_index);
        let start_row = anchor.start_row();

        tracing::debug!(
            strategy = %self.strategy,
            row = ?anchor.row_index,
            col = anchor.col_index,
            start_row,
            rows = series.len(),
            "Sentinel column resolved"
        );

        Ok(ResolvedColumn {
            anchor,
            start_row,
            series,
        })
    }

    fn scan_headers(&self, headers: &[String]) -> Option<SentinelMatch> {
        headers
            .iter()
            .position(|h| h.contains(&self.sentinel))
            .map(|col_index| SentinelMatch {
                row_index: None,
                col_index,
            })
    }

    fn scan_cells(&self, table: &Table) -> Option<SentinelMatch> {
        table.rows.iter().enumerate().find_map(|(row_index, row)| {
            row.iter()
                .position(|cell| cell.contains(&self.sentinel))
                .map(|col_index| SentinelMatch {
                    row_index: Some(row_index),
                    col_index,
                })
        })
    }
}

impl Default for SentinelResolver {
    fn default() -> Self {
        Self::new(constants::DEFAULT_SENTINEL, Strategy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn headed_table() -> Table {
        Table::new(
            Some(s(&["datetime", "AI01C00 temp", "AI01C01 dose", "AI01C01 copy"])),
            vec![
                s(&["t0", "20", "0.1", "9"]),
                s(&["t1", "21", "0.7", "9"]),
                s(&["t2", "22", "x", "9"]),
            ],
        )
    }

    fn logger_grid() -> Table {
        // Channel labels sit in a data row below a preamble, as in raw exports.
        Table::new(
            Some(s(&["Logger", "", ""])),
            vec![
                s(&["model", "GL240", ""]),
                s(&["ch", "AI01C00", "AI01C01"]),
                s(&["10:00", "1", "0.6"]),
                s(&["10:01", "AI01C01", "0.7"]),
            ],
        )
    }

    #[test]
    fn test_header_strategy_picks_first_matching_header() {
        let resolver = SentinelResolver::default();
        let col = resolver.resolve(&headed_table()).unwrap();
        assert_eq!(col.anchor.col_index, 2);
        assert_eq!(col.anchor.row_index, None);
        assert_eq!(col.start_row, 0);
        assert_eq!(col.series.get(0), Some(0.1));
        assert_eq!(col.series.get(1), Some(0.7));
        assert!(col.series.get(2).unwrap().is_nan());
    }

    #[test]
    fn test_cell_scan_is_row_major_and_starts_after_anchor() {
        let resolver = SentinelResolver::new("AI01C01", Strategy::CellScan);
        let col = resolver.resolve(&logger_grid()).unwrap();
        assert_eq!(col.anchor.row_index, Some(1));
        assert_eq!(col.anchor.col_index, 2);
        assert_eq!(col.start_row, 2);
        // The sentinel cell itself is NaN.
        assert!(col.series.get(1).unwrap().is_nan());
        assert_eq!(col.series.get(2), Some(0.6));
    }

    #[test]
    fn test_cell_scan_ignores_headers() {
        let resolver = SentinelResolver::new("AI01C01", Strategy::CellScan);
        assert!(resolver.locate(&headed_table()).is_none());
    }

    #[test]
    fn test_header_strategy_on_headerless_table_scans_cells() {
        let mut grid = logger_grid();
        grid.headers = None;
        let m = SentinelResolver::default().locate(&grid).unwrap();
        assert_eq!(m.row_index, Some(1));
        assert_eq!(m.col_index, 2);
    }

    #[test]
    fn test_match_is_case_sensitive_substring() {
        let table = Table::new(Some(s(&["ai01c01", "x[AI01C01]y"])), vec![]);
        let m = SentinelResolver::default().locate(&table).unwrap();
        assert_eq!(m.col_index, 1);
    }

    #[test]
    fn test_not_found_reports_sentinel() {
        let table = Table::new(Some(s(&["a", "b"])), vec![s(&["1", "2"])]);
        let err = SentinelResolver::default().resolve(&table).unwrap_err();
        assert!(err.to_string().contains("AI01C01"));
        assert!(!SentinelResolver::default().accepts(&table));
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("header".parse::<Strategy>().unwrap(), Strategy::Header);
        assert_eq!("Cell-Scan".parse::<Strategy>().unwrap(), Strategy::CellScan);
        assert!("diagonal".parse::<Strategy>().is_err());
        assert_eq!(Strategy::CellScan.to_string(), "cell-scan");
    }
}
