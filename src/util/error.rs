// Irradose - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Every fatal failure of the pipeline maps to exactly one variant so the
// reason string reported to the caller is never generic.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all Irradose operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum DoseError {
    /// The input file could not be turned into a table.
    Load(LoadError),

    /// The sentinel column could not be located in the loaded table.
    Resolve(ResolveError),

    /// Isotope lookup or decay-constant validation failed.
    Isotope(IsotopeError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// Background calculation session failed.
    Session(SessionError),

    /// Writing the result report failed.
    Report(ReportError),
}

impl fmt::Display for DoseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(e) => write!(f, "Load error: {e}"),
            Self::Resolve(e) => write!(f, "Column error: {e}"),
            Self::Isotope(e) => write!(f, "Isotope error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Session(e) => write!(f, "Session error: {e}"),
            Self::Report(e) => write!(f, "Report error: {e}"),
        }
    }
}

impl std::error::Error for DoseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load(e) => Some(e),
            Self::Resolve(e) => Some(e),
            Self::Isotope(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Session(e) => Some(e),
            Self::Report(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Load errors
// ---------------------------------------------------------------------------

/// Errors raised while reading an input file into a table.
#[derive(Debug)]
pub enum LoadError {
    /// The input path does not exist.
    NotFound { path: PathBuf },

    /// I/O error reading the input file.
    Io { path: PathBuf, source: io::Error },

    /// The file extension is not a supported tabular format.
    UnsupportedFormat { path: PathBuf, extension: String },

    /// The configured text encoding label is not recognised.
    UnsupportedEncoding { label: String },

    /// The spreadsheet could not be opened or read.
    Workbook {
        path: PathBuf,
        source: calamine::Error,
    },

    /// The spreadsheet contains no worksheets.
    EmptyWorkbook { path: PathBuf },

    /// Delimiter auto-detection could not settle on a separator.
    DelimiterUndetected { path: PathBuf },

    /// The CSV reader rejected the content for a given delimiter.
    Csv {
        path: PathBuf,
        delimiter: u8,
        source: csv::Error,
    },

    /// No header/delimiter combination produced a table containing the
    /// sentinel. `attempts` describes what each stage produced.
    Unresolved {
        path: PathBuf,
        sentinel: String,
        attempts: Vec<String>,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => {
                write!(f, "File '{}' does not exist", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "I/O error reading '{}': {source}", path.display())
            }
            Self::UnsupportedFormat { path, extension } => write!(
                f,
                "'{}': unsupported file type '.{extension}' (expected .csv or a spreadsheet)",
                path.display()
            ),
            Self::UnsupportedEncoding { label } => {
                write!(f, "Unsupported text encoding '{label}'")
            }
            Self::Workbook { path, source } => {
                write!(f, "Cannot read spreadsheet '{}': {source}", path.display())
            }
            Self::EmptyWorkbook { path } => {
                write!(f, "Spreadsheet '{}' contains no worksheets", path.display())
            }
            Self::DelimiterUndetected { path } => write!(
                f,
                "'{}': could not detect a consistent field delimiter",
                path.display()
            ),
            Self::Csv {
                path,
                delimiter,
                source,
            } => write!(
                f,
                "'{}': CSV error with delimiter {}: {source}",
                path.display(),
                describe_delimiter(*delimiter)
            ),
            Self::Unresolved {
                path,
                sentinel,
                attempts,
            } => write!(
                f,
                "'{}': delimiter/column resolution failed, no column containing \
                 '{sentinel}' found ({})",
                path.display(),
                attempts.join("; ")
            ),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Workbook { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<LoadError> for DoseError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

/// Human-readable name for a delimiter byte, used in messages and logs.
pub fn describe_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => "comma".to_string(),
        b'\t' => "tab".to_string(),
        b';' => "semicolon".to_string(),
        b'|' => "pipe".to_string(),
        other => format!("'{}'", other as char),
    }
}

// ---------------------------------------------------------------------------
// Resolve errors
// ---------------------------------------------------------------------------

/// Errors related to locating the sentinel column.
#[derive(Debug)]
pub enum ResolveError {
    /// The sentinel text appears nowhere in the searched scope.
    SentinelNotFound { sentinel: String },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SentinelNotFound { sentinel } => {
                write!(f, "'{sentinel}' not found in the loaded table")
            }
        }
    }
}

impl std::error::Error for ResolveError {}

impl From<ResolveError> for DoseError {
    fn from(e: ResolveError) -> Self {
        Self::Resolve(e)
    }
}

// ---------------------------------------------------------------------------
// Isotope errors
// ---------------------------------------------------------------------------

/// Errors related to isotope selection.
#[derive(Debug)]
pub enum IsotopeError {
    /// The requested isotope is not in the table.
    Unknown { name: String, known: Vec<String> },

    /// A decay constant is not a positive finite number.
    InvalidConstant { name: String, value: f64 },
}

impl fmt::Display for IsotopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown { name, known } => write!(
                f,
                "Unknown isotope '{name}'. Known isotopes: {}",
                known.join(", ")
            ),
            Self::InvalidConstant { name, value } => write!(
                f,
                "Isotope '{name}': decay constant {value} must be a positive finite number"
            ),
        }
    }
}

impl std::error::Error for IsotopeError {}

impl From<IsotopeError> for DoseError {
    fn from(e: IsotopeError) -> Self {
        Self::Isotope(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// An explicitly requested config file does not exist.
    NotFound { path: PathBuf },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::NotFound { path } => {
                write!(f, "Config file '{}' does not exist", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::NotFound { .. } => None,
        }
    }
}

impl From<ConfigError> for DoseError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

/// Errors related to the background calculation session.
#[derive(Debug)]
pub enum SessionError {
    /// A calculation is already running in this session.
    Busy,

    /// The worker thread could not be spawned.
    Spawn { source: io::Error },

    /// The worker exited without delivering a result.
    WorkerLost,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "A calculation is already running"),
            Self::Spawn { source } => write!(f, "Failed to start calculation worker: {source}"),
            Self::WorkerLost => write!(f, "Calculation worker exited without a result"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn { source } => Some(source),
            _ => None,
        }
    }
}

impl From<SessionError> for DoseError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

// ---------------------------------------------------------------------------
// Report errors
// ---------------------------------------------------------------------------

/// Errors related to writing a result report.
#[derive(Debug)]
pub enum ReportError {
    /// I/O error writing the report.
    Io { source: io::Error },

    /// CSV serialisation error.
    Csv { source: csv::Error },

    /// JSON serialisation error.
    Json { source: serde_json::Error },
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { source } => write!(f, "Report I/O error: {source}"),
            Self::Csv { source } => write!(f, "CSV report error: {source}"),
            Self::Json { source } => write!(f, "JSON report error: {source}"),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source } => Some(source),
            Self::Csv { source } => Some(source),
            Self::Json { source } => Some(source),
        }
    }
}

impl From<ReportError> for DoseError {
    fn from(e: ReportError) -> Self {
        Self::Report(e)
    }
}

/// Convenience type alias for Irradose results.
pub type Result<T> = std::result::Result<T, DoseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_not_found_names_the_sentinel() {
        let err = DoseError::from(ResolveError::SentinelNotFound {
            sentinel: "AI01C01".to_string(),
        });
        assert!(err.to_string().contains("AI01C01"));
    }

    #[test]
    fn test_unresolved_is_distinct_from_sentinel_not_found() {
        let unresolved = LoadError::Unresolved {
            path: PathBuf::from("log.csv"),
            sentinel: "AI01C01".to_string(),
            attempts: vec!["auto-detect: no sentinel column".to_string()],
        };
        let msg = unresolved.to_string();
        assert!(msg.contains("delimiter/column resolution failed"));
        assert!(msg.contains("AI01C01"));
        assert!(msg.contains("auto-detect"));
    }

    #[test]
    fn test_io_error_keeps_source_chain() {
        use std::error::Error;
        let err = DoseError::from(LoadError::Io {
            path: PathBuf::from("x.csv"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        });
        let load = err.source().expect("load error source");
        assert!(load.source().is_some());
    }

    #[test]
    fn test_front_end_errors_convert_into_dose_error() {
        let config = DoseError::from(ConfigError::NotFound {
            path: PathBuf::from("absent.toml"),
        });
        assert!(matches!(config, DoseError::Config(_)));
        assert!(config.to_string().starts_with("Configuration error:"));

        let session = DoseError::from(SessionError::Busy);
        assert!(matches!(session, DoseError::Session(SessionError::Busy)));
        assert_eq!(
            session.to_string(),
            "Session error: A calculation is already running"
        );

        let report = DoseError::from(ReportError::Io {
            source: io::Error::new(io::ErrorKind::BrokenPipe, "closed"),
        });
        assert!(matches!(report, DoseError::Report(_)));
        assert!(report.to_string().contains("closed"));
    }

    #[test]
    fn test_describe_delimiter() {
        assert_eq!(describe_delimiter(b','), "comma");
        assert_eq!(describe_delimiter(b'\t'), "tab");
        assert_eq!(describe_delimiter(b':'), "':'");
    }
}
