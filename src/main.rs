// Irradose - main.rs
//
// Command-line entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading (platform default or --config)
// 3. Logging initialisation (stderr + diagnostic log file)
// 4. Running one calculation on the background session and printing the report

use irradose::app::pipeline::Pipeline;
use irradose::app::worker::{CalcJob, CalcSession};
use irradose::core::report::{self, Report, ReportFormat};
use irradose::core::resolver::Strategy;
use irradose::platform::config::{self, AppConfig, PlatformPaths};
use irradose::util::error::Result;
use irradose::util::{constants, logging};

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

/// Report format selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => ReportFormat::Text,
            OutputFormat::Json => ReportFormat::Json,
            OutputFormat::Csv => ReportFormat::Csv,
        }
    }
}

/// Irradose - decay-corrected irradiation dose calculator.
///
/// Reads a logger export (CSV or spreadsheet), finds the AI01C01 beam-current
/// column, and integrates it with the decay constant of the chosen isotope.
#[derive(Parser, Debug)]
#[command(name = "irradose", version, about)]
struct Cli {
    /// Logger export to process (.csv, .xlsx, .xls, .xlsm, .xlsb, .ods).
    #[arg(required_unless_present = "list_isotopes")]
    path: Option<PathBuf>,

    /// Isotope whose decay constant is applied.
    #[arg(short = 'i', long = "isotope", default_value = constants::DEFAULT_ISOTOPE)]
    isotope: String,

    /// Sentinel search strategy: header or cell-scan (overrides config).
    #[arg(short = 's', long = "strategy")]
    strategy: Option<Strategy>,

    /// Config file to use instead of the platform default.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Report format.
    #[arg(short = 'o', long = "output", value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Diagnostic log file (overrides config and the platform default).
    #[arg(long = "log-file", conflicts_with = "no_log_file")]
    log_file: Option<PathBuf>,

    /// Do not write a diagnostic log file.
    #[arg(long = "no-log-file")]
    no_log_file: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Print the effective isotope table and exit.
    #[arg(long = "list-isotopes")]
    list_isotopes: bool,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, detail = ?e, "Irradose failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Everything after argument parsing. Config, session and report failures
/// come back as `DoseError`; a failed calculation is a normal outcome.
fn run(cli: Cli) -> Result<ExitCode> {
    let platform_paths = PlatformPaths::resolve();

    // Config before logging: it carries the log level and file.
    let (mut app_config, config_warnings) = match cli.config.as_deref() {
        Some(path) => config::load_config_file(path)?,
        None => config::load_config(&platform_paths.config_dir),
    };

    // Log file: --log-file > config > platform default, unless disabled.
    let log_file = if cli.no_log_file {
        None
    } else {
        Some(
            cli.log_file
                .clone()
                .or_else(|| app_config.log_file.as_ref().map(PathBuf::from))
                .unwrap_or_else(|| platform_paths.log_file()),
        )
    };
    logging::init(
        cli.debug,
        app_config.log_level.as_deref(),
        log_file.as_deref(),
    );

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        "Irradose starting"
    );
    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Config warning");
    }

    if let Some(strategy) = cli.strategy {
        app_config.strategy = strategy;
    }

    if cli.list_isotopes {
        print_isotopes(&app_config);
        return Ok(ExitCode::SUCCESS);
    }

    let Some(path) = cli.path else {
        eprintln!("Error: no input file given");
        return Ok(ExitCode::FAILURE);
    };

    let lambda = app_config.isotopes.lambda(&cli.isotope).ok();
    let session = CalcSession::new(Pipeline::from_config(&app_config));
    let outcome = session
        .start(CalcJob::new(&path, &cli.isotope))?
        .wait()?;

    let succeeded = outcome.is_ok();
    let report = Report::new(
        path.display().to_string(),
        cli.isotope.clone(),
        lambda,
        outcome,
    );
    let format = ReportFormat::from(cli.output);

    // A failed text report is just the error line, which belongs on stderr.
    if !succeeded && format == ReportFormat::Text {
        report::write_report(&report, format, std::io::stderr().lock())?;
    } else {
        report::write_report(&report, format, std::io::stdout().lock())?;
    }

    if succeeded {
        return Ok(ExitCode::SUCCESS);
    }
    if format != ReportFormat::Text {
        if let Some(err) = &report.outcome.error {
            eprintln!("Error: {err}");
        }
    }
    Ok(ExitCode::FAILURE)
}

/// Print `name<TAB>lambda` for each configured isotope.
fn print_isotopes(config: &AppConfig) {
    for (name, lambda) in config.isotopes.iter() {
        println!("{name}\t{lambda}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use irradose::util::error::{ConfigError, DoseError};
    use std::ffi::OsStr;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_options() {
        let cli = Cli::try_parse_from([
            "irradose",
            "run.csv",
            "-i",
            "18F",
            "--strategy",
            "cell-scan",
            "-o",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.path, Some(PathBuf::from("run.csv")));
        assert_eq!(cli.isotope, "18F");
        assert_eq!(cli.strategy, Some(Strategy::CellScan));
        assert_eq!(cli.output, OutputFormat::Json);
    }

    #[test]
    fn test_missing_config_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let cli = Cli::try_parse_from([
            OsStr::new("irradose"),
            OsStr::new("run.csv"),
            OsStr::new("--config"),
            missing.as_os_str(),
        ])
        .unwrap();

        let err = run(cli).expect_err("missing config must fail");
        assert!(matches!(err, DoseError::Config(ConfigError::NotFound { .. })));
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn test_cli_defaults_and_list_mode() {
        let cli = Cli::try_parse_from(["irradose", "--list-isotopes"]).unwrap();
        assert!(cli.path.is_none());
        assert_eq!(cli.isotope, "11C");
        assert_eq!(cli.output, OutputFormat::Text);

        assert!(Cli::try_parse_from(["irradose"]).is_err());
        assert!(Cli::try_parse_from(["irradose", "a.csv", "--strategy", "diagonal"]).is_err());
    }
}
