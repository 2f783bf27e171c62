// Irradose - app/loader.rs
//
// Input dispatch: picks the delimited-text or spreadsheet path from the file
// extension and returns a table the resolver can work with.

use crate::core::delimited::{self, CsvOptions};
use crate::core::model::Table;
use crate::core::resolver::SentinelResolver;
use crate::platform::{fs, workbook};
use crate::util::constants;
use crate::util::error::LoadError;
use encoding_rs::Encoding;
use std::path::Path;

/// How an input file is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Delimited,
    Spreadsheet,
}

/// Options for reading input files.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Encoding of delimited text files.
    pub encoding: &'static Encoding,
    pub csv: CsvOptions,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            encoding: encoding_rs::SHIFT_JIS,
            csv: CsvOptions::default(),
        }
    }
}

/// Classify `path` by extension (case-insensitive).
pub fn detect_format(path: &Path) -> Result<SourceFormat, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if ext == "csv" {
        Ok(SourceFormat::Delimited)
    } else if constants::SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
        Ok(SourceFormat::Spreadsheet)
    } else {
        Err(LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: ext,
        })
    }
}

/// Load `path` into a table.
///
/// Delimited text goes through the staged header/delimiter fallback, using
/// `resolver` as the acceptance test. Spreadsheets are loaded as-is.
pub fn load_table(
    path: &Path,
    options: &LoadOptions,
    resolver: &SentinelResolver,
) -> Result<Table, LoadError> {
    match detect_format(path)? {
        SourceFormat::Delimited => {
            let text = fs::read_decoded(path, options.encoding)?;
            let loaded = delimited::load_delimited(&text, path, &options.csv, resolver)?;
            Ok(loaded.table)
        }
        SourceFormat::Spreadsheet => workbook::read_first_sheet(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_detect_format() {
        assert_eq!(
            detect_format(&PathBuf::from("a/RUN.CSV")).unwrap(),
            SourceFormat::Delimited
        );
        for name in ["b.xlsx", "b.XLS", "b.ods"] {
            assert_eq!(
                detect_format(&PathBuf::from(name)).unwrap(),
                SourceFormat::Spreadsheet
            );
        }
        assert!(matches!(
            detect_format(&PathBuf::from("c.txt")),
            Err(LoadError::UnsupportedFormat { ref extension, .. }) if extension == "txt"
        ));
        assert!(detect_format(&PathBuf::from("noext")).is_err());
    }

    #[test]
    fn test_load_table_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.csv");
        std::fs::write(&path, "datetime,AI01C01\n10:00,0.6\n").unwrap();

        let table = load_table(&path, &LoadOptions::default(), &SentinelResolver::default())
            .unwrap();
        assert_eq!(table.len(), 1);
    }
}
