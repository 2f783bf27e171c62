// Irradose - platform/fs.rs
//
// Filesystem access for input files: existence checks and decoding of
// legacy-encoded text exports.

use crate::util::error::LoadError;
use encoding_rs::Encoding;
use std::path::Path;

/// Resolve an encoding label.
///
/// Accepts every WHATWG label known to `encoding_rs` plus `cp932`, the name
/// Windows tools use for Windows-31J.
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding, LoadError> {
    let trimmed = label.trim();
    let lookup = if trimmed.eq_ignore_ascii_case("cp932") {
        "windows-31j"
    } else {
        trimmed
    };
    Encoding::for_label(lookup.as_bytes()).ok_or_else(|| LoadError::UnsupportedEncoding {
        label: label.to_string(),
    })
}

/// Fail early with `NotFound` rather than a generic I/O error.
pub fn ensure_exists(path: &Path) -> Result<(), LoadError> {
    if path.exists() {
        Ok(())
    } else {
        Err(LoadError::NotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Read a text file and decode it with `encoding`.
///
/// Undecodable byte sequences are replaced with U+FFFD; they are reported in
/// the log but do not fail the load. A leading BOM overrides `encoding`.
pub fn read_decoded(path: &Path, encoding: &'static Encoding) -> Result<String, LoadError> {
    ensure_exists(path)?;
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let (text, used, had_errors) = encoding.decode(&bytes);
    if had_errors {
        tracing::warn!(
            path = %path.display(),
            encoding = used.name(),
            "Input contains bytes that are not valid in the declared encoding; replaced"
        );
    }
    tracing::debug!(
        path = %path.display(),
        encoding = used.name(),
        bytes = bytes.len(),
        "Input decoded"
    );
    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_cp932_alias() {
        let enc = resolve_encoding("CP932").unwrap();
        assert_eq!(enc, encoding_rs::SHIFT_JIS);
        assert_eq!(resolve_encoding("utf-8").unwrap(), encoding_rs::UTF_8);
    }

    #[test]
    fn test_resolve_unknown_label() {
        assert!(matches!(
            resolve_encoding("klingon"),
            Err(LoadError::UnsupportedEncoding { .. })
        ));
    }

    #[test]
    fn test_read_decoded_shift_jis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sjis.csv");
        let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode("日時,AI01C01 線量\n");
        std::fs::write(&path, &bytes).unwrap();

        let text = read_decoded(&path, encoding_rs::SHIFT_JIS).unwrap();
        assert_eq!(text, "日時,AI01C01 線量\n");
    }

    #[test]
    fn test_read_decoded_replaces_invalid_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, b"a,b\n\x81\n1,2\n").unwrap();

        let text = read_decoded(&path, encoding_rs::SHIFT_JIS).unwrap();
        assert!(text.starts_with("a,b\n"));
        assert!(text.ends_with("1,2\n"));
        assert!(text.contains('\u{fffd}'));
    }

    #[test]
    fn test_read_decoded_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_decoded(&dir.path().join("nope.csv"), encoding_rs::SHIFT_JIS);
        assert!(matches!(result, Err(LoadError::NotFound { .. })));
    }
}
