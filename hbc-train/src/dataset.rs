//! Labeled feature dataset assembled from manifests
//!
//! Every manifest row produces an explicit [`SampleOutcome`]. Skipped rows
//! are logged and counted in the [`LoadReport`]; they never abort the run.

use std::fmt;
use std::path::{Path, PathBuf};

use hbc_common::{FeatureExtractor, FeatureVector};
use tracing::{debug, info, warn};

use crate::error::TrainResult;
use crate::manifest::{read_manifest, ManifestEntry, ManifestRow};

/// Source of feature vectors for audio files
///
/// Implemented by [`FeatureExtractor`]; the pipeline only depends on this
/// trait so it can be driven by other extractors.
pub trait FeatureSource {
    fn features_for(&self, path: &Path) -> hbc_common::Result<FeatureVector>;
}

impl FeatureSource for FeatureExtractor {
    fn features_for(&self, path: &Path) -> hbc_common::Result<FeatureVector> {
        self.extract_file(path)
    }
}

/// Why a manifest row did not contribute a training sample
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Resolved audio path does not exist
    MissingFile { path: PathBuf },
    /// Decoding or feature computation failed
    ExtractionFailed { path: PathBuf, error: String },
    /// Feature vector length differs from the model input size
    WrongDimension {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },
    /// Row has no label
    MissingLabel { line: u64, fname: String },
    /// Row could not be parsed
    MalformedRow { line: u64, message: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingFile { path } => {
                write!(f, "file not found: {}", path.display())
            }
            SkipReason::ExtractionFailed { path, error } => {
                write!(f, "{}: {}", path.display(), error)
            }
            SkipReason::WrongDimension {
                path,
                expected,
                actual,
            } => write!(
                f,
                "{}: expected {} features, got {}",
                path.display(),
                expected,
                actual
            ),
            SkipReason::MissingLabel { line, fname } => {
                write!(f, "line {}: no label for {}", line, fname)
            }
            SkipReason::MalformedRow { line, message } => {
                write!(f, "line {}: {}", line, message)
            }
        }
    }
}

/// Feature vector with its ground-truth label
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSample {
    pub features: FeatureVector,
    pub label: String,
}

/// Result of processing one manifest row
#[derive(Debug, Clone, PartialEq)]
pub enum SampleOutcome {
    Accepted(LabeledSample),
    Skipped(SkipReason),
}

/// Turn one manifest entry into a sample or a skip reason
pub fn evaluate_entry(
    source: &dyn FeatureSource,
    entry: &ManifestEntry,
    expected_dim: usize,
) -> SampleOutcome {
    if !entry.path.exists() {
        return SampleOutcome::Skipped(SkipReason::MissingFile {
            path: entry.path.clone(),
        });
    }

    let features = match source.features_for(&entry.path) {
        Ok(features) => features,
        Err(e) => {
            return SampleOutcome::Skipped(SkipReason::ExtractionFailed {
                path: entry.path.clone(),
                error: e.to_string(),
            })
        }
    };

    if features.len() != expected_dim {
        return SampleOutcome::Skipped(SkipReason::WrongDimension {
            path: entry.path.clone(),
            expected: expected_dim,
            actual: features.len(),
        });
    }

    SampleOutcome::Accepted(LabeledSample {
        features,
        label: entry.label.clone(),
    })
}

/// Samples and skips collected from one manifest
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub manifest: PathBuf,
    /// Data rows read (accepted + skipped)
    pub rows: usize,
    pub samples: Vec<LabeledSample>,
    pub skipped: Vec<SkipReason>,
}

impl LoadReport {
    pub fn accepted(&self) -> usize {
        self.samples.len()
    }
}

/// Load every row of a manifest, extracting features for the usable ones
///
/// # Errors
/// Only manifest-level failures (see [`read_manifest`]); per-row problems
/// end up in [`LoadReport::skipped`].
pub fn load_manifest(
    source: &dyn FeatureSource,
    manifest: &Path,
    dataset_dir: &Path,
    expected_dim: usize,
) -> TrainResult<LoadReport> {
    let rows = read_manifest(manifest, dataset_dir)?;
    let mut report = LoadReport {
        manifest: manifest.to_path_buf(),
        rows: rows.len(),
        samples: Vec::new(),
        skipped: Vec::new(),
    };

    for row in rows {
        let outcome = match row {
            ManifestRow::Entry(entry) => {
                debug!(path = %entry.path.display(), label = %entry.label, "Extracting features");
                evaluate_entry(source, &entry, expected_dim)
            }
            ManifestRow::Invalid(reason) => SampleOutcome::Skipped(reason),
        };

        match outcome {
            SampleOutcome::Accepted(sample) => report.samples.push(sample),
            SampleOutcome::Skipped(reason) => {
                warn!("Skipping {}", reason);
                report.skipped.push(reason);
            }
        }
    }

    info!(
        manifest = %manifest.display(),
        "X shape: ({}, {}), y len: {}, skipped: {}",
        report.accepted(),
        expected_dim,
        report.accepted(),
        report.skipped.len()
    );

    Ok(report)
}

/// Feature matrix and label vector
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub features: Vec<FeatureVector>,
    pub labels: Vec<String>,
}

impl Dataset {
    /// Concatenate the accepted samples of several manifests, in order
    pub fn concat(reports: &[LoadReport]) -> Self {
        let mut dataset = Dataset::default();
        for sample in reports.iter().flat_map(|r| &r.samples) {
            dataset.push(sample.clone());
        }
        dataset
    }

    pub fn push(&mut self, sample: LabeledSample) {
        self.features.push(sample.features);
        self.labels.push(sample.label);
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Row views for model fitting and prediction
    pub fn rows(&self) -> Vec<&[f64]> {
        self.features.iter().map(|f| f.as_slice()).collect()
    }

    /// New dataset made of the given row indices
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i].clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hbc_common::Error;

    /// Returns a vector whose length is encoded in the file name
    struct FakeSource;

    impl FeatureSource for FakeSource {
        fn features_for(&self, path: &Path) -> hbc_common::Result<FeatureVector> {
            let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            if name.starts_with("broken") {
                return Err(Error::Decode("bad header".to_string()));
            }
            let dim = name.parse::<usize>().unwrap_or(3);
            Ok(FeatureVector::new(vec![1.0; dim]))
        }
    }

    fn entry(dir: &Path, name: &str) -> ManifestEntry {
        let path = dir.join(name);
        ManifestEntry {
            line: 2,
            fname: name.to_string(),
            path,
            label: "normal".to_string(),
        }
    }

    #[test]
    fn test_each_skip_reason_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["3.wav", "5.wav", "broken.wav"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let accepted = evaluate_entry(&FakeSource, &entry(dir.path(), "3.wav"), 3);
        assert!(matches!(accepted, SampleOutcome::Accepted(_)));

        let wrong = evaluate_entry(&FakeSource, &entry(dir.path(), "5.wav"), 3);
        assert!(matches!(
            wrong,
            SampleOutcome::Skipped(SkipReason::WrongDimension {
                expected: 3,
                actual: 5,
                ..
            })
        ));

        let broken = evaluate_entry(&FakeSource, &entry(dir.path(), "broken.wav"), 3);
        assert!(matches!(
            broken,
            SampleOutcome::Skipped(SkipReason::ExtractionFailed { .. })
        ));

        let missing = evaluate_entry(&FakeSource, &entry(dir.path(), "absent.wav"), 3);
        assert!(matches!(
            missing,
            SampleOutcome::Skipped(SkipReason::MissingFile { .. })
        ));
    }

    #[test]
    fn test_load_manifest_counts_rows() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["3.wav", "4.wav"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let manifest = dir.path().join("set.csv");
        std::fs::write(
            &manifest,
            "fname,label\n3.wav,normal\n4.wav,murmur\nmissing.wav,noisy\n3.wav,\n",
        )
        .unwrap();

        let report = load_manifest(&FakeSource, &manifest, dir.path(), 3).unwrap();

        assert_eq!(report.rows, 4);
        assert_eq!(report.accepted(), 1);
        assert_eq!(report.skipped.len(), 3);
    }

    #[test]
    fn test_concat_preserves_order() {
        let sample = |label: &str, v: f64| LabeledSample {
            features: FeatureVector::new(vec![v]),
            label: label.to_string(),
        };
        let report = |samples: Vec<LabeledSample>| LoadReport {
            manifest: PathBuf::from("m.csv"),
            rows: samples.len(),
            samples,
            skipped: Vec::new(),
        };

        let dataset = Dataset::concat(&[
            report(vec![sample("normal", 1.0)]),
            report(vec![]),
            report(vec![sample("murmur", 2.0), sample("noisy", 3.0)]),
        ]);

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.labels, vec!["normal", "murmur", "noisy"]);
        assert_eq!(dataset.rows()[2], &[3.0]);
        assert_eq!(dataset.select(&[2, 0]).labels, vec!["noisy", "normal"]);
    }
}
