//! Reproducible train/test split

use hbc_common::Error;
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::model_selection;

use crate::dataset::Dataset;
use crate::error::{TrainError, TrainResult};

/// Held-out fraction used by the pipeline
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Seed shared by the split and the forest
pub const DEFAULT_SEED: u64 = 42;

/// Train and test partitions
#[derive(Debug, Clone)]
pub struct Split {
    pub train: Dataset,
    pub test: Dataset,
}

/// Shuffle with `seed` and hold out `ceil(test_fraction * n)` samples
///
/// Row positions are split by the library so that feature vectors and
/// string labels stay paired.
///
/// # Errors
/// * `InsufficientData` if the fraction is outside (0, 1) or the training
///   partition would be empty
pub fn train_test_split(data: &Dataset, test_fraction: f64, seed: u64) -> TrainResult<Split> {
    let n = data.len();
    let insufficient = || TrainError::InsufficientData {
        samples: n,
        test_fraction,
    };

    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(insufficient());
    }

    let n_test = (test_fraction * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(insufficient());
    }

    let positions = DenseMatrix::new(n, 1, (0..n).map(|i| i as f64).collect(), false)
        .map_err(|e| Error::InvalidInput(format!("Split positions: {}", e)))?;
    let targets = vec![0u32; n];
    // The library floors `n * test_size`; aim half a sample above n_test
    let test_size = (n_test as f32 + 0.5) / n as f32;
    let (train_pos, test_pos, _, _) =
        model_selection::train_test_split(&positions, &targets, test_size, true, Some(seed));

    Ok(Split {
        train: data.select(&row_indices(&train_pos)),
        test: data.select(&row_indices(&test_pos)),
    })
}

fn row_indices(positions: &DenseMatrix<f64>) -> Vec<usize> {
    let (rows, _) = positions.shape();
    (0..rows).map(|i| *positions.get((i, 0)) as usize).collect()
}
