// Irradose - platform/config.rs
//
// Platform-specific configuration, data directory resolution, and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::core::isotope::{self, IsotopeTable};
use crate::core::resolver::Strategy;
use crate::platform::fs::resolve_encoding;
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use encoding_rs::Encoding;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Resolved platform paths for Irradose data and configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/irradose/ or %APPDATA%\Irradose\config\)
    pub config_dir: PathBuf,

    /// Data directory for the diagnostic log.
    pub data_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();

            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                data_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            let fallback = PathBuf::from(".");
            Self {
                config_dir: fallback.clone(),
                data_dir: fallback,
            }
        }
    }

    /// Default diagnostic log location.
    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join(constants::LOG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[integration]` section.
    pub integration: IntegrationSection,
    /// `[isotopes]` section: name = decay constant (1/s).
    pub isotopes: BTreeMap<String, f64>,
    /// `[csv]` section.
    pub csv: CsvSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[integration]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct IntegrationSection {
    /// Marker text identifying the target column.
    pub sentinel: Option<String>,
    /// Contribution scale constant.
    pub scale: Option<f64>,
    /// Samples at or above this start measurement.
    pub warmup_threshold: Option<f64>,
    /// Samples at or below this stop measurement.
    pub stop_threshold: Option<f64>,
    /// "header" or "cell-scan".
    pub strategy: Option<String>,
}

/// `[csv]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct CsvSection {
    /// Text encoding label.
    pub encoding: Option<String>,
    /// Header-row marker prefixes.
    pub header_markers: Option<Vec<String>>,
    /// Lines sampled for delimiter auto-detection.
    pub sniff_lines: Option<usize>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
    /// Diagnostic log file path.
    pub file: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Integration --
    pub sentinel: String,
    pub strategy: Strategy,
    pub scale: f64,
    pub warmup_threshold: f64,
    pub stop_threshold: f64,

    // -- Isotopes --
    pub isotopes: IsotopeTable,

    // -- CSV --
    pub encoding: &'static Encoding,
    pub header_markers: Vec<String>,
    pub sniff_lines: usize,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
    /// Log file path.
    pub log_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sentinel: constants::DEFAULT_SENTINEL.to_string(),
            strategy: Strategy::default(),
            scale: constants::DEFAULT_SCALE,
            warmup_threshold: constants::DEFAULT_WARMUP_THRESHOLD,
            stop_threshold: constants::DEFAULT_STOP_THRESHOLD,
            isotopes: IsotopeTable::builtin(),
            encoding: encoding_rs::SHIFT_JIS,
            header_markers: constants::DEFAULT_HEADER_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            sniff_lines: constants::DEFAULT_SNIFF_LINES,
            log_level: None,
            log_file: None,
        }
    }
}

/// Load and validate `config.toml` from the given config directory.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings (first-run).
/// If the file is unreadable or unparseable, returns defaults with a warning.
pub fn load_config(config_dir: &Path) -> (AppConfig, Vec<String>) {
    let config_path = config_dir.join(constants::CONFIG_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), Vec::new());
    }

    match load_config_file(&config_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            let msg = format!("{e}. Using defaults.");
            tracing::warn!("{}", msg);
            (AppConfig::default(), vec![msg])
        }
    }
}

/// Load and validate an explicitly named config file.
///
/// Unlike [`load_config`], a missing or unparseable file is an error.
pub fn load_config_file(path: &Path) -> Result<(AppConfig, Vec<String>), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(path = %path.display(), "Loaded config.toml");
    Ok(validate(raw))
}

/// Validate each field, accumulating warnings for rejected values.
pub fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let mut config = AppConfig::default();

    // -- Integration: sentinel --
    if let Some(sentinel) = raw.integration.sentinel {
        if sentinel.trim().is_empty() {
            warnings.push(format!(
                "[integration] sentinel must not be empty. Using default ({}).",
                constants::DEFAULT_SENTINEL
            ));
        } else {
            config.sentinel = sentinel;
        }
    }

    // -- Integration: strategy --
    if let Some(ref strategy) = raw.integration.strategy {
        match strategy.parse::<Strategy>() {
            Ok(s) => config.strategy = s,
            Err(e) => warnings.push(format!(
                "[integration] {e}. Using default ({}).",
                Strategy::default()
            )),
        }
    }

    // -- Integration: scale --
    if let Some(scale) = raw.integration.scale {
        if scale.is_finite() && scale > 0.0 {
            config.scale = scale;
        } else {
            warnings.push(format!(
                "[integration] scale = {scale} must be a positive number. Using default ({}).",
                constants::DEFAULT_SCALE
            ));
        }
    }

    // -- Integration: thresholds --
    let warmup = raw
        .integration
        .warmup_threshold
        .unwrap_or(constants::DEFAULT_WARMUP_THRESHOLD);
    let stop = raw
        .integration
        .stop_threshold
        .unwrap_or(constants::DEFAULT_STOP_THRESHOLD);
    if raw.integration.warmup_threshold.is_some() || raw.integration.stop_threshold.is_some() {
        let valid = warmup.is_finite() && stop.is_finite() && stop >= 0.0 && stop < warmup;
        if valid {
            config.warmup_threshold = warmup;
            config.stop_threshold = stop;
        } else {
            warnings.push(format!(
                "[integration] thresholds warmup = {warmup}, stop = {stop} are invalid \
                 (need 0 <= stop < warmup). Using defaults ({}, {}).",
                constants::DEFAULT_WARMUP_THRESHOLD,
                constants::DEFAULT_STOP_THRESHOLD,
            ));
        }
    }

    // -- Isotopes --
    let mut overrides = Vec::new();
    for (name, lambda) in raw.isotopes {
        match isotope::validate_constant(&name, lambda) {
            Ok(()) => overrides.push((name, lambda)),
            Err(e) => warnings.push(format!("[isotopes] {e}. Entry ignored.")),
        }
    }
    match IsotopeTable::with_overrides(overrides) {
        Ok(table) => config.isotopes = table,
        Err(e) => warnings.push(format!("[isotopes] {e}. Using built-in isotopes.")),
    }

    // -- CSV: encoding --
    if let Some(ref label) = raw.csv.encoding {
        match resolve_encoding(label) {
            Ok(enc) => config.encoding = enc,
            Err(e) => warnings.push(format!(
                "[csv] {e}. Using default ({}).",
                constants::DEFAULT_CSV_ENCODING
            )),
        }
    }

    // -- CSV: header_markers --
    if let Some(markers) = raw.csv.header_markers {
        let kept: Vec<String> = markers.into_iter().filter(|m| !m.is_empty()).collect();
        if kept.is_empty() {
            warnings.push(
                "[csv] header_markers has no non-empty entries. Using defaults.".to_string(),
            );
        } else {
            config.header_markers = kept;
        }
    }

    // -- CSV: sniff_lines --
    if let Some(lines) = raw.csv.sniff_lines {
        if (1..=constants::MAX_SNIFF_LINES).contains(&lines) {
            config.sniff_lines = lines;
        } else {
            warnings.push(format!(
                "[csv] sniff_lines = {lines} is out of range (1-{}). Using default ({}).",
                constants::MAX_SNIFF_LINES,
                constants::DEFAULT_SNIFF_LINES,
            ));
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.clone());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    // -- Logging: file --
    if let Some(ref file) = raw.logging.file {
        if !file.is_empty() {
            config.log_file = Some(file.clone());
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    (config, warnings)
}
