// Irradose - app/pipeline.rs
//
// One calculation end to end: load -> resolve -> integrate -> outcome.
//
// `compute` propagates typed errors. `run` is the boundary every caller uses;
// it logs failures with full context and folds them into an `Outcome`, so
// no error escapes as anything other than the outcome's error string.

use crate::app::loader::{self, LoadOptions};
use crate::core::delimited::CsvOptions;
use crate::core::integrate::{self, DecayParams};
use crate::core::isotope::{self, IsotopeTable};
use crate::core::model::{IntegrationResult, Outcome};
use crate::core::resolver::SentinelResolver;
use crate::platform::config::AppConfig;
use crate::util::error::Result;
use std::path::Path;

/// Everything needed to turn a file and an isotope into an outcome.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pub load: LoadOptions,
    pub resolver: SentinelResolver,
    pub params: DecayParams,
    pub isotopes: IsotopeTable,
}

impl Pipeline {
    /// Build a pipeline from validated configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            load: LoadOptions {
                encoding: config.encoding,
                csv: CsvOptions {
                    header_markers: config.header_markers.clone(),
                    sniff_lines: config.sniff_lines,
                },
            },
            resolver: SentinelResolver::new(config.sentinel.clone(), config.strategy),
            params: DecayParams {
                scale: config.scale,
                warmup_threshold: config.warmup_threshold,
                stop_threshold: config.stop_threshold,
            },
            isotopes: config.isotopes.clone(),
        }
    }

    /// Integrate `path` with an explicit decay constant.
    pub fn compute(&self, path: &Path, lambda: f64) -> Result<IntegrationResult> {
        isotope::validate_constant("custom", lambda)?;
        let table = loader::load_table(path, &self.load, &self.resolver)?;
        let column = self.resolver.resolve(&table)?;
        Ok(integrate::integrate(
            &column.series,
            column.start_row,
            lambda,
            &self.params,
        ))
    }

    /// Integrate `path` using the decay constant of a named isotope.
    pub fn compute_for_isotope(&self, path: &Path, isotope: &str) -> Result<IntegrationResult> {
        let lambda = self.isotopes.lambda(isotope)?;
        self.compute(path, lambda)
    }

    /// Run one invocation and fold any failure into the outcome.
    pub fn run(&self, path: &Path, isotope: &str) -> Outcome {
        tracing::info!(
            path = %path.display(),
            isotope,
            sentinel = self.resolver.sentinel(),
            strategy = %self.resolver.strategy(),
            "Calculation started"
        );

        match self.compute_for_isotope(path, isotope) {
            Ok(result) => {
                tracing::info!(
                    path = %path.display(),
                    isotope,
                    total = result.total,
                    elapsed_count = result.elapsed_count,
                    "Calculation finished"
                );
                Outcome::ok(result)
            }
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    isotope,
                    error = %e,
                    detail = ?e,
                    "Calculation failed"
                );
                Outcome::failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resolver::Strategy;
    use crate::util::error::DoseError;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_run_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "run.csv",
            "datetime,AI01C01\n1,0.1\n2,0.1\n3,0.7\n4,0.9\n5,0.4\n6,0.2\n",
        );
        let outcome = Pipeline::default().run(&path, "18F");
        assert!(outcome.is_ok(), "{outcome:?}");
        assert_eq!(outcome.elapsed_count, 3);
        assert_eq!(outcome.total, 0.0);
    }

    #[test]
    fn test_run_unknown_isotope() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "run.csv", "datetime,AI01C01\n1,0.9\n");
        let outcome = Pipeline::default().run(&path, "99Tc");
        assert_eq!(outcome.elapsed_count, 0);
        assert!(outcome.error.unwrap().contains("99Tc"));
    }

    #[test]
    fn test_compute_rejects_bad_lambda() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "run.csv", "datetime,AI01C01\n1,0.9\n");
        assert!(matches!(
            Pipeline::default().compute(&path, -1.0),
            Err(DoseError::Isotope(_))
        ));
    }

    #[test]
    fn test_failures_are_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::default();

        let missing = pipeline.run(&dir.path().join("absent.csv"), "11C");
        let unresolved = pipeline.run(&write(&dir, "a.csv", "datetime,AI01C00\n1,2\n"), "11C");
        let unsupported = pipeline.run(&write(&dir, "a.txt", "x"), "11C");

        let messages: Vec<String> = [missing, unresolved, unsupported]
            .into_iter()
            .map(|o| o.error.expect("failure expected"))
            .collect();
        assert!(messages[0].contains("does not exist"));
        assert!(messages[1].contains("delimiter/column resolution failed"));
        assert!(messages[1].contains("AI01C01"));
        assert!(messages[2].contains("unsupported file type"));
    }

    #[test]
    fn test_from_config_applies_settings() {
        let config = AppConfig {
            sentinel: "AI02C01".to_string(),
            strategy: Strategy::CellScan,
            scale: 10.0,
            ..AppConfig::default()
        };
        let pipeline = Pipeline::from_config(&config);
        assert_eq!(pipeline.resolver.sentinel(), "AI02C01");
        assert_eq!(pipeline.resolver.strategy(), Strategy::CellScan);
        assert_eq!(pipeline.params.scale, 10.0);
        assert_eq!(pipeline.load.encoding, encoding_rs::SHIFT_JIS);
    }
}
