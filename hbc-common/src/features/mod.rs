//! MFCC feature extraction
//!
//! Converts an audio recording into a fixed-length vector: 20 mel-frequency
//! cepstral coefficients, each averaged over all time frames. The same
//! extractor is used by the training pipeline and the inference service, so
//! the parameters below are fixed rather than configurable.
//!
//! Pipeline (per recording, at its native sample rate):
//! 1. Centered STFT, periodic Hann window, power spectrum
//! 2. 128-band Slaney mel filterbank from 0 Hz to Nyquist
//! 3. Power to dB, clipped 80 dB below the loudest cell
//! 4. Orthonormal DCT-II, first `n_mfcc` coefficients
//! 5. Mean of each coefficient across frames

pub mod mel;
pub mod stft;

use std::f64::consts::PI;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::audio::decode_audio_file;
use crate::{Error, Result};

/// Length of the feature vector the classifier is trained on
pub const FEATURE_DIM: usize = 20;

/// Fixed spectral analysis parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractorParams {
    /// Number of cepstral coefficients kept
    pub n_mfcc: usize,
    /// FFT size (also the window length)
    pub n_fft: usize,
    /// Hop between frames in samples
    pub hop_length: usize,
    /// Number of mel bands
    pub n_mels: usize,
    /// Dynamic range kept below the spectrogram maximum
    pub top_db: f64,
    /// Floor applied before taking the logarithm
    pub amin: f64,
}

impl Default for ExtractorParams {
    fn default() -> Self {
        Self {
            n_mfcc: FEATURE_DIM,
            n_fft: 2048,
            hop_length: 512,
            n_mels: 128,
            top_db: 80.0,
            amin: 1e-10,
        }
    }
}

/// Averaged MFCC vector for one recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }

    /// Single-row (1 x len) view for batch-style prediction
    pub fn as_batch(&self) -> [&[f64]; 1] {
        [self.as_slice()]
    }
}

/// Mel filter restricted to its non-zero bins
struct SparseFilter {
    start: usize,
    weights: Vec<f64>,
}

/// MFCC feature extractor
///
/// Holds the window and DCT basis; the mel filterbank depends on the
/// recording's sample rate and is built per call.
pub struct FeatureExtractor {
    params: ExtractorParams,
    window: Vec<f64>,
    dct_basis: Vec<Vec<f64>>,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor {
    /// Extractor with the standard parameters (20 coefficients)
    pub fn new() -> Self {
        Self::with_params(ExtractorParams::default())
    }

    pub fn with_params(params: ExtractorParams) -> Self {
        let window = mel::hann_window(params.n_fft);
        let dct_basis = dct_ortho_basis(params.n_mfcc, params.n_mels);
        Self {
            params,
            window,
            dct_basis,
        }
    }

    pub fn params(&self) -> &ExtractorParams {
        &self.params
    }

    /// Decode an audio file and compute its averaged MFCC vector
    pub fn extract_file(&self, path: &Path) -> Result<FeatureVector> {
        let audio = decode_audio_file(path)?;
        self.extract_samples(&audio.samples, audio.sample_rate)
    }

    /// Averaged MFCC vector of mono samples at `sample_rate`
    pub fn extract_samples(&self, samples: &[f32], sample_rate: u32) -> Result<FeatureVector> {
        let mfcc = self.mfcc(samples, sample_rate)?;
        let n_frames = mfcc.len() as f64;

        let mut mean = vec![0.0f64; self.params.n_mfcc];
        for frame in &mfcc {
            for (acc, &c) in mean.iter_mut().zip(frame) {
                *acc += c;
            }
        }
        for value in &mut mean {
            *value /= n_frames;
        }

        if mean.iter().any(|v| !v.is_finite()) {
            return Err(Error::Feature("Non-finite MFCC value".to_string()));
        }

        Ok(FeatureVector::new(mean))
    }

    /// Per-frame MFCCs, `[frames][n_mfcc]`
    pub fn mfcc(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<Vec<f64>>> {
        if samples.is_empty() {
            return Err(Error::Feature("Audio contains no samples".to_string()));
        }
        if sample_rate == 0 {
            return Err(Error::Feature("Sample rate is zero".to_string()));
        }

        let p = &self.params;
        let power = stft::power_spectrogram(samples, p.n_fft, p.hop_length, &self.window)?;

        let filters = sparse_filters(mel::mel_filter_bank(
            p.n_mels,
            p.n_fft,
            sample_rate,
            0.0,
            sample_rate as f64 / 2.0,
        ));

        let mut log_mel: Vec<Vec<f64>> = power
            .iter()
            .map(|frame| {
                filters
                    .iter()
                    .map(|f| {
                        let energy: f64 = f
                            .weights
                            .iter()
                            .zip(&frame[f.start..])
                            .map(|(w, s)| w * s)
                            .sum();
                        10.0 * energy.max(p.amin).log10()
                    })
                    .collect()
            })
            .collect();

        let peak = log_mel
            .iter()
            .flatten()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let floor = peak - p.top_db;
        for value in log_mel.iter_mut().flatten() {
            *value = value.max(floor);
        }

        Ok(log_mel
            .iter()
            .map(|bands| {
                self.dct_basis
                    .iter()
                    .map(|row| row.iter().zip(bands).map(|(b, x)| b * x).sum())
                    .collect()
            })
            .collect())
    }
}

fn sparse_filters(bank: Vec<Vec<f64>>) -> Vec<SparseFilter> {
    bank.into_iter()
        .map(|filter| {
            let start = filter.iter().position(|&w| w > 0.0).unwrap_or(0);
            let end = filter
                .iter()
                .rposition(|&w| w > 0.0)
                .map_or(start, |i| i + 1);
            SparseFilter {
                start,
                weights: filter[start..end].to_vec(),
            }
        })
        .collect()
}

/// Orthonormal DCT-II basis, `[n_out][n_in]`
fn dct_ortho_basis(n_out: usize, n_in: usize) -> Vec<Vec<f64>> {
    let n = n_in as f64;
    (0..n_out)
        .map(|k| {
            let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            (0..n_in)
                .map(|i| scale * (PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n)).cos())
                .collect()
        })
        .collect()
}
