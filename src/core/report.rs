// Irradose - core/report.rs
//
// Text, JSON and CSV rendering of a calculation outcome.
// Core layer: writes to any Write trait object.

use crate::core::model::Outcome;
use crate::util::error::ReportError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

/// Output format for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// An outcome together with what it was computed from.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub source: String,
    pub isotope: String,
    /// Decay constant used, when the isotope was known.
    pub lambda: Option<f64>,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub computed_at: DateTime<Utc>,
}

impl Report {
    pub fn new(source: String, isotope: String, lambda: Option<f64>, outcome: Outcome) -> Self {
        Self {
            source,
            isotope,
            lambda,
            outcome,
            computed_at: Utc::now(),
        }
    }
}

/// Write `report` to `writer` in the requested format.
pub fn write_report<W: Write>(
    report: &Report,
    format: ReportFormat,
    writer: W,
) -> Result<(), ReportError> {
    match format {
        ReportFormat::Text => write_text(report, writer),
        ReportFormat::Json => write_json(report, writer),
        ReportFormat::Csv => write_csv(report, writer),
    }
}

/// Human-readable summary. Failed outcomes print only the error.
pub fn write_text<W: Write>(report: &Report, mut writer: W) -> Result<(), ReportError> {
    let io_err = |source| ReportError::Io { source };
    match &report.outcome.error {
        Some(err) => writeln!(writer, "Error: {err}").map_err(io_err)?,
        None => {
            let (minutes, seconds) = report.outcome.minutes_seconds();
            writeln!(writer, "File: {}", report.source).map_err(io_err)?;
            writeln!(writer, "Isotope: {}", report.isotope).map_err(io_err)?;
            writeln!(writer, "Irradiation time: {minutes} min {seconds} s").map_err(io_err)?;
            writeln!(writer, "Total: {:.1} mCi", report.outcome.total).map_err(io_err)?;
        }
    }
    writer.flush().map_err(io_err)
}

/// Pretty-printed JSON object.
pub fn write_json<W: Write>(report: &Report, mut writer: W) -> Result<(), ReportError> {
    serde_json::to_writer_pretty(&mut writer, report)
        .map_err(|source| ReportError::Json { source })?;
    writeln!(writer).map_err(|source| ReportError::Io { source })
}

/// Header plus a single record.
pub fn write_csv<W: Write>(report: &Report, writer: W) -> Result<(), ReportError> {
    let csv_err = |source| ReportError::Csv { source };
    let mut csv_writer = csv::Writer::from_writer(writer);
    let (minutes, seconds) = report.outcome.minutes_seconds();

    csv_writer
        .write_record([
            "source",
            "isotope",
            "lambda",
            "total",
            "elapsed_count",
            "minutes",
            "seconds",
            "error",
            "computed_at",
        ])
        .map_err(csv_err)?;
    let record: Vec<String> = vec![
        report.source.clone(),
        report.isotope.clone(),
        report.lambda.map(|l| l.to_string()).unwrap_or_default(),
        format!("{:.1}", report.outcome.total),
        report.outcome.elapsed_count.to_string(),
        minutes.to_string(),
        seconds.to_string(),
        report.outcome.error.clone().unwrap_or_default(),
        report.computed_at.to_rfc3339(),
    ];
    csv_writer.write_record(&record).map_err(csv_err)?;

    csv_writer
        .flush()
        .map_err(|source| ReportError::Io { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::IntegrationResult;

    fn ok_report() -> Report {
        Report::new(
            "run.csv".to_string(),
            "18F".to_string(),
            Some(0.000105),
            Outcome::ok(IntegrationResult {
                total: 42.5,
                elapsed_count: 125,
            }),
        )
    }

    #[test]
    fn test_text_report() {
        let mut buf = Vec::new();
        write_report(&ok_report(), ReportFormat::Text, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert!(output.contains("Irradiation time: 2 min 5 s"));
        assert!(output.contains("Total: 42.5 mCi"));
    }

    #[test]
    fn test_text_report_failure() {
        let report = Report::new(
            "run.csv".to_string(),
            "18F".to_string(),
            None,
            Outcome::failed("'AI01C01' not found"),
        );
        let mut buf = Vec::new();
        write_text(&report, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Error: 'AI01C01' not found\n");
    }

    #[test]
    fn test_json_report_flattens_outcome() {
        let mut buf = Vec::new();
        write_json(&ok_report(), &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["total"], 42.5);
        assert_eq!(value["elapsed_count"], 125);
        assert_eq!(value["isotope"], "18F");
        assert!(value["error"].is_null());
    }

    #[test]
    fn test_csv_report() {
        let mut buf = Vec::new();
        write_csv(&ok_report(), &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let mut lines = output.lines();
        assert!(lines.next().unwrap().starts_with("source,isotope,lambda,total"));
        assert!(lines.next().unwrap().starts_with("run.csv,18F,0.000105,42.5,125,2,5,,"));
    }
}
