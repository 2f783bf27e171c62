// Irradose - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "Irradose";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "Irradose";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Sentinel column
// =============================================================================

/// Marker text identifying the dose-rate sensor column in logger exports.
pub const DEFAULT_SENTINEL: &str = "AI01C01";

// =============================================================================
// Decay integration
// =============================================================================

/// Scaling constant applied to each sample's contribution during measurement.
pub const DEFAULT_SCALE: f64 = 100.0;

/// A sample at or above this value ends the warm-up phase.
pub const DEFAULT_WARMUP_THRESHOLD: f64 = 0.5;

/// A sample at or below this value ends the measurement phase.
pub const DEFAULT_STOP_THRESHOLD: f64 = 0.3;

/// Time-step width (seconds) per row once measurement has started.
pub const MEASURE_STEP_SECS: f64 = 1.0;

// =============================================================================
// Isotopes
// =============================================================================

/// Built-in decay constants (1/second), keyed by isotope name.
pub const BUILTIN_ISOTOPES: &[(&str, f64)] = &[("11C", 0.000566), ("18F", 0.000105)];

/// Isotope selected when the caller does not name one.
pub const DEFAULT_ISOTOPE: &str = "11C";

// =============================================================================
// CSV loading
// =============================================================================

/// Encoding label used for delimited text exports.
pub const DEFAULT_CSV_ENCODING: &str = "cp932";

/// Line prefixes that mark the header row of a logger export.
pub const DEFAULT_HEADER_MARKERS: &[&str] = &["datetime,"];

/// Delimiters considered by auto-detection, in tie-break order.
pub const SNIFF_CANDIDATES: &[u8] = b",\t;|";

/// Fixed delimiters tried after auto-detection, in order.
pub const FALLBACK_DELIMITERS: &[u8] = b",\t";

/// Number of non-blank lines sampled for delimiter auto-detection.
pub const DEFAULT_SNIFF_LINES: usize = 20;

/// Upper bound for the configurable sniff sample size.
pub const MAX_SNIFF_LINES: usize = 1_000;

/// Minimum share of sampled lines that must agree with the header's field
/// count for a delimiter candidate to be accepted.
pub const SNIFF_MIN_AGREEMENT: f64 = 0.5;

/// File extensions loaded through the spreadsheet reader.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Diagnostic log file name (created in the platform data directory).
pub const LOG_FILE_NAME: &str = "irradiation.log";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
