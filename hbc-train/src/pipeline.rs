//! End-to-end training run
//!
//! manifests → features → split → fit → evaluate → save

use std::path::PathBuf;

use hbc_common::config::TomlConfig;
use hbc_common::model::ForestParams;
use hbc_common::{Classifier, FeatureExtractor, FEATURE_DIM};
use tracing::info;

use crate::dataset::{load_manifest, Dataset, FeatureSource, LoadReport, SkipReason};
use crate::error::{TrainError, TrainResult};
use crate::report::ClassificationReport;
use crate::split::{train_test_split, DEFAULT_SEED, DEFAULT_TEST_FRACTION};

/// Everything a training run needs
#[derive(Debug, Clone)]
pub struct TrainingPlan {
    pub dataset_dir: PathBuf,
    /// Manifest CSV paths (already resolved)
    pub manifests: Vec<PathBuf>,
    pub model_path: PathBuf,
    /// Samples whose feature vector has another length are skipped
    pub feature_dim: usize,
    pub test_fraction: f64,
    pub split_seed: u64,
    pub forest: ForestParams,
}

impl TrainingPlan {
    /// Plan with fixed hyperparameters and the paths from `config`
    pub fn from_config(config: &TomlConfig) -> Self {
        Self {
            dataset_dir: config.training.dataset_dir.clone(),
            manifests: config.training.manifest_paths(),
            model_path: config.model_path.clone(),
            feature_dim: FEATURE_DIM,
            test_fraction: DEFAULT_TEST_FRACTION,
            split_seed: DEFAULT_SEED,
            forest: ForestParams::default(),
        }
    }
}

/// Per-manifest counts
#[derive(Debug, Clone)]
pub struct ManifestSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub accepted: usize,
    pub skipped: usize,
}

impl From<&LoadReport> for ManifestSummary {
    fn from(report: &LoadReport) -> Self {
        Self {
            path: report.manifest.clone(),
            rows: report.rows,
            accepted: report.accepted(),
            skipped: report.skipped.len(),
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub manifests: Vec<ManifestSummary>,
    pub skipped: Vec<SkipReason>,
    pub samples_used: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub classes: Vec<String>,
    pub report: ClassificationReport,
    pub model_path: PathBuf,
}

/// Run the pipeline with the default MFCC extractor
pub fn run(plan: &TrainingPlan) -> TrainResult<TrainingOutcome> {
    run_with(plan, &FeatureExtractor::new())
}

/// Run the pipeline with a custom feature source
///
/// # Errors
/// * `Manifest` if any manifest cannot be read
/// * `NoValidData` if no row produced a sample; nothing is written
/// * `InsufficientData` if the split leaves no training samples
/// * `Common` if fitting or saving the model fails
pub fn run_with(plan: &TrainingPlan, source: &dyn FeatureSource) -> TrainResult<TrainingOutcome> {
    info!(
        dataset_dir = %plan.dataset_dir.display(),
        manifests = plan.manifests.len(),
        "Loading training data"
    );

    let reports = plan
        .manifests
        .iter()
        .map(|manifest| load_manifest(source, manifest, &plan.dataset_dir, plan.feature_dim))
        .collect::<TrainResult<Vec<_>>>()?;

    let data = Dataset::concat(&reports);
    let skipped: Vec<SkipReason> = reports.iter().flat_map(|r| r.skipped.clone()).collect();
    info!(
        "Combined X shape: ({}, {}), y len: {}, skipped: {}",
        data.len(),
        plan.feature_dim,
        data.len(),
        skipped.len()
    );

    if data.is_empty() {
        return Err(TrainError::NoValidData);
    }

    let split = train_test_split(&data, plan.test_fraction, plan.split_seed)?;
    info!(
        train = split.train.len(),
        test = split.test.len(),
        "Split dataset"
    );

    let classifier = Classifier::train(&split.train.rows(), &split.train.labels, &plan.forest)?;
    info!(classes = ?classifier.classes(), trees = plan.forest.n_trees, "Model fitted");

    let predicted: Vec<String> = classifier
        .predict_batch(&split.test.rows())?
        .into_iter()
        .map(|p| p.label)
        .collect();
    let report = ClassificationReport::compute(&split.test.labels, &predicted);
    info!("Held-out accuracy: {:.3}", report.accuracy);

    classifier.save(&plan.model_path)?;

    Ok(TrainingOutcome {
        manifests: reports.iter().map(ManifestSummary::from).collect(),
        skipped,
        samples_used: data.len(),
        train_size: split.train.len(),
        test_size: split.test.len(),
        classes: classifier.classes().to_vec(),
        report,
        model_path: plan.model_path.clone(),
    })
}
