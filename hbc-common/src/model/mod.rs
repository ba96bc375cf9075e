//! Heartbeat classifier model and its on-disk artifact
//!
//! The training pipeline fits a [`Classifier`] and saves it as a single JSON
//! file; the inference service loads that file once at startup and shares
//! the classifier read-only between requests. The forest itself is
//! smartcore's `RandomForestClassifier`; this module maps string labels to
//! the library's class indices and back.

use std::collections::BTreeSet;
use std::fmt;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use tracing::info;

use crate::{Error, Result};

type Forest = RandomForestClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>>;

/// Forest hyperparameters passed through to the library
///
/// Everything else keeps the library defaults: Gini impurity, fully grown
/// trees, bootstrap samples, `floor(sqrt(d))` features per split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestParams {
    pub n_trees: u16,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            seed: 42,
        }
    }
}

/// Outcome of classifying one feature vector
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Most probable class label
    pub label: String,
    /// Probability of `label` (the maximum class probability)
    pub confidence: f64,
    /// Full distribution, ordered like [`Classifier::classes`]
    pub probabilities: Vec<f64>,
}

/// Trained classifier plus the metadata stored with it
#[derive(Serialize, Deserialize)]
pub struct Classifier {
    feature_dim: usize,
    /// Sorted; position `i` is library class `i`
    classes: Vec<String>,
    trained_at: DateTime<Utc>,
    forest: Forest,
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("feature_dim", &self.feature_dim)
            .field("classes", &self.classes)
            .field("trained_at", &self.trained_at)
            .finish_non_exhaustive()
    }
}

/// Row-major feature matrix for the library
fn feature_matrix(rows: &[&[f64]], width: usize) -> Result<DenseMatrix<f64>> {
    let values: Vec<f64> = rows.iter().flat_map(|row| row.iter().copied()).collect();
    DenseMatrix::new(rows.len(), width, values, false)
        .map_err(|e| Error::InvalidInput(format!("Feature matrix: {}", e)))
}

fn check_rows(rows: &[&[f64]], width: usize) -> Result<()> {
    for (i, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(Error::InvalidInput(format!(
                "Expected {} features, got {} (row {})",
                width,
                row.len(),
                i
            )));
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidInput(format!("Row {} has non-finite values", i)));
        }
    }
    Ok(())
}

impl Classifier {
    /// Fit a random forest on feature rows and their labels
    ///
    /// # Errors
    /// * `InvalidInput` if there are no rows, lengths disagree, rows have
    ///   different widths, or a value is not finite
    /// * `Model` if the library rejects the data
    pub fn train(rows: &[&[f64]], labels: &[String], params: &ForestParams) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::InvalidInput("No training rows".to_string()));
        }
        if rows.len() != labels.len() {
            return Err(Error::InvalidInput(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        let feature_dim = rows[0].len();
        if feature_dim == 0 {
            return Err(Error::InvalidInput("Rows have no features".to_string()));
        }
        check_rows(rows, feature_dim)?;

        let classes: Vec<String> = labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let targets: Vec<u32> = labels
            .iter()
            .map(|l| classes.binary_search(l).unwrap_or_default() as u32)
            .collect();

        let x = feature_matrix(rows, feature_dim)?;
        let parameters = RandomForestClassifierParameters::default()
            .with_n_trees(params.n_trees)
            .with_seed(params.seed);
        let forest = Forest::fit(&x, &targets, parameters)
            .map_err(|e| Error::Model(format!("Random forest fit failed: {}", e)))?;

        Ok(Self {
            feature_dim,
            classes,
            trained_at: Utc::now(),
            forest,
        })
    }

    /// Classify one feature vector
    ///
    /// Ties between equally probable classes go to the first class in
    /// sorted order.
    pub fn predict(&self, features: &[f64]) -> Result<Prediction> {
        self.predict_batch(&[features])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Model("Model returned no prediction".to_string()))
    }

    /// Classify each row of a batch
    pub fn predict_batch(&self, rows: &[&[f64]]) -> Result<Vec<Prediction>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        check_rows(rows, self.feature_dim)?;

        let x = feature_matrix(rows, self.feature_dim)?;
        let proba = self
            .forest
            .predict_proba(&x)
            .map_err(|e| Error::Model(format!("Prediction failed: {}", e)))?;

        let (n_rows, n_classes) = proba.shape();
        if n_rows != rows.len() || n_classes != self.classes.len() {
            return Err(Error::Model(format!(
                "Model returned {}x{} probabilities for {} rows and {} classes",
                n_rows,
                n_classes,
                rows.len(),
                self.classes.len()
            )));
        }

        Ok((0..n_rows)
            .map(|i| {
                let probabilities: Vec<f64> = (0..n_classes).map(|j| *proba.get((i, j))).collect();
                let (best, confidence) = probabilities
                    .iter()
                    .copied()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |acc, (j, p)| if p > acc.1 { (j, p) } else { acc });
                Prediction {
                    label: self.classes[best].clone(),
                    confidence,
                    probabilities,
                }
            })
            .collect())
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn feature_dim(&self) -> usize {
        self.feature_dim
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Write the model artifact, replacing any existing file
    ///
    /// The JSON is written to a temporary file in the target directory and
    /// renamed over `path`, so readers never observe a partial model.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let json = serde_json::to_vec(self)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;

        info!(
            path = %path.display(),
            bytes = json.len(),
            classes = ?self.classes,
            "Model saved"
        );
        Ok(())
    }

    /// Read and validate a model artifact
    ///
    /// A zero vector is classified once so a forest that disagrees with the
    /// stored class list or dimension fails here rather than per request.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            Error::Model(format!("Failed to read model file {}: {}", path.display(), e))
        })?;
        let classifier: Classifier = serde_json::from_slice(&bytes)?;

        if classifier.classes.is_empty() || classifier.feature_dim == 0 {
            return Err(Error::Model("Model has no classes or features".to_string()));
        }
        classifier.predict(&vec![0.0; classifier.feature_dim])?;

        info!(
            path = %path.display(),
            classes = ?classifier.classes,
            trained_at = %classifier.trained_at,
            "Model loaded"
        );
        Ok(classifier)
    }
}
