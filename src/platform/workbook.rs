// Irradose - platform/workbook.rs
//
// Spreadsheet input. Only the first worksheet is read; its first row is
// taken as the header labels.

use crate::core::model::Table;
use crate::platform::fs::ensure_exists;
use crate::util::error::LoadError;
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

/// Load the first worksheet of a workbook (.xlsx, .xlsm, .xls, .xlsb, .ods).
pub fn read_first_sheet(path: &Path) -> Result<Table, LoadError> {
    ensure_exists(path)?;
    let workbook_err = |source: calamine::Error| LoadError::Workbook {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = open_workbook_auto(path).map_err(workbook_err)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::EmptyWorkbook {
            path: path.to_path_buf(),
        })?
        .map_err(workbook_err)?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<String>>());
    let headers = rows.next();
    let rows: Vec<Vec<String>> = rows.collect();

    tracing::info!(
        path = %path.display(),
        columns = headers.as_ref().map_or(0, Vec::len),
        rows = rows.len(),
        "Worksheet loaded"
    );

    Ok(Table::new(headers, rows))
}

/// Text form of a spreadsheet cell. Error cells read as empty.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::Float(0.75)), "0.75");
        assert_eq!(cell_text(&Data::Int(3)), "3");
        assert_eq!(cell_text(&Data::String("AI01C01".into())), "AI01C01");
        assert_eq!(cell_text(&Data::Bool(true)), "true");
    }

    #[test]
    fn test_first_sheet_header_and_rows() {
        let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("logger_export.xlsx");
        let table = read_first_sheet(&path).unwrap();

        assert_eq!(
            table.headers.as_deref(),
            Some(&["datetime".to_string(), "AI01C01".to_string(), "AI01C02".to_string()][..])
        );
        assert_eq!(table.len(), 6);
        assert_eq!(table.cell(0, 0), Some("2024/05/10 09:00:00"));
        assert_eq!(table.cell(2, 1), Some("0.7"));
        // The second sheet ("Notes") is never read.
        assert!(table.rows.iter().flatten().all(|c| c != "memo"));
    }

    #[test]
    fn test_corrupt_workbook_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"this is not a zip archive").unwrap();
        assert!(matches!(
            read_first_sheet(&path),
            Err(LoadError::Workbook { .. })
        ));
    }

    #[test]
    fn test_missing_workbook() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_first_sheet(&dir.path().join("absent.xlsx")),
            Err(LoadError::NotFound { .. })
        ));
    }
}
