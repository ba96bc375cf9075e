//! Manifest CSV reading
//!
//! A manifest maps audio files (column `fname`, relative to the dataset
//! directory, `/`-separated) to labels (column `label`). Other columns are
//! ignored. Rows that cannot be used are returned as [`ManifestRow::Invalid`]
//! so the caller can count and log them.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::dataset::SkipReason;
use crate::error::{TrainError, TrainResult};

const REQUIRED_COLUMNS: [&str; 2] = ["fname", "label"];

/// One labeled audio sample listed in a manifest
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    /// 1-based line number in the CSV file
    pub line: u64,
    /// `fname` exactly as written in the manifest
    pub fname: String,
    /// `fname` resolved against the dataset directory
    pub path: PathBuf,
    pub label: String,
}

/// Parsed manifest row
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestRow {
    Entry(ManifestEntry),
    Invalid(SkipReason),
}

#[derive(Debug, Deserialize)]
struct RawRow {
    fname: Option<String>,
    label: Option<String>,
}

/// Resolve a manifest `fname` against the dataset directory
///
/// Manifests always use `/`; each component is joined separately so the
/// result uses the platform separator.
pub fn resolve_fname(dataset_dir: &Path, fname: &str) -> PathBuf {
    let relative: PathBuf = fname.split('/').filter(|c| !c.is_empty()).collect();
    dataset_dir.join(relative)
}

/// Read every row of a manifest
///
/// # Errors
/// * `TrainError::Manifest` if the file cannot be opened or read, or its
///   header lacks `fname` or `label`
pub fn read_manifest(path: &Path, dataset_dir: &Path) -> TrainResult<Vec<ManifestRow>> {
    let manifest_error = |message: String| TrainError::Manifest {
        path: path.to_path_buf(),
        message,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| manifest_error(e.to_string()))?;

    let headers = reader
        .headers()
        .map_err(|e| manifest_error(e.to_string()))?
        .clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(manifest_error(format!("missing required column '{}'", column)));
        }
    }

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        // Header occupies line 1; the record position is more precise when
        // available (quoted fields may span lines).
        let fallback_line = index as u64 + 2;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                if let csv::ErrorKind::Io(_) = e.kind() {
                    return Err(manifest_error(e.to_string()));
                }
                let line = e.position().map_or(fallback_line, |p| p.line());
                rows.push(ManifestRow::Invalid(SkipReason::MalformedRow {
                    line,
                    message: e.to_string(),
                }));
                continue;
            }
        };
        let line = record.position().map_or(fallback_line, |p| p.line());

        let raw: RawRow = match record.deserialize(Some(&headers)) {
            Ok(raw) => raw,
            Err(e) => {
                rows.push(ManifestRow::Invalid(SkipReason::MalformedRow {
                    line,
                    message: e.to_string(),
                }));
                continue;
            }
        };

        let fname = raw.fname.unwrap_or_default();
        if fname.is_empty() {
            rows.push(ManifestRow::Invalid(SkipReason::MalformedRow {
                line,
                message: "empty fname".to_string(),
            }));
            continue;
        }

        match raw.label.filter(|l| !l.is_empty()) {
            Some(label) => rows.push(ManifestRow::Entry(ManifestEntry {
                line,
                path: resolve_fname(dataset_dir, &fname),
                fname,
                label,
            })),
            None => rows.push(ManifestRow::Invalid(SkipReason::MissingLabel { line, fname })),
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_manifest(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("set_a.csv");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_reads_entries_and_ignores_extra_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(
            dir.path(),
            "dataset,fname,label,sublabel\na,set_a/normal__01.wav,normal,\na,set_a/murmur__02.wav,murmur,x\n",
        );

        let rows = read_manifest(&path, Path::new("/data")).unwrap();

        assert_eq!(rows.len(), 2);
        match &rows[0] {
            ManifestRow::Entry(entry) => {
                assert_eq!(entry.line, 2);
                assert_eq!(entry.label, "normal");
                assert_eq!(entry.path, Path::new("/data").join("set_a").join("normal__01.wav"));
            }
            other => panic!("expected entry, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_label_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(dir.path(), "fname,label\nset_a/unlabelled.wav,\n");

        let rows = read_manifest(&path, dir.path()).unwrap();

        assert_eq!(
            rows,
            vec![ManifestRow::Invalid(SkipReason::MissingLabel {
                line: 2,
                fname: "set_a/unlabelled.wav".to_string(),
            })]
        );
    }

    #[test]
    fn test_ragged_row_is_malformed_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(
            dir.path(),
            "fname,label\na.wav,normal,extra\nb.wav,murmur\n",
        );

        let rows = read_manifest(&path, dir.path()).unwrap();

        assert_eq!(rows.len(), 2);
        assert!(matches!(
            rows[0],
            ManifestRow::Invalid(SkipReason::MalformedRow { .. })
        ));
        assert!(matches!(rows[1], ManifestRow::Entry(_)));
    }

    #[test]
    fn test_missing_label_column_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(dir.path(), "fname,category\na.wav,normal\n");

        let err = read_manifest(&path, dir.path()).unwrap_err();

        assert!(err.to_string().contains("missing required column 'label'"));
    }

    #[test]
    fn test_missing_manifest_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_manifest(&dir.path().join("nope.csv"), dir.path());
        assert!(matches!(result, Err(TrainError::Manifest { .. })));
    }

    #[test]
    fn test_resolve_fname_normalises_separators() {
        let resolved = resolve_fname(Path::new("base"), "set_b/Btraining_normal.wav");
        assert_eq!(resolved, Path::new("base").join("set_b").join("Btraining_normal.wav"));
    }
}
