//! Audio Test Fixture Generator
//!
//! Generates WAV recordings with known content for the integration tests
//! of every hbc crate.

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Signal written to the test file
#[derive(Debug, Clone, Copy)]
pub enum Waveform {
    /// Pure sine tone
    Tone { freq: f32 },
    /// Uniform white noise (seeded, reproducible)
    Noise { seed: u64 },
}

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub amplitude: f32,
    pub waveform: Waveform,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 1.0,
            sample_rate: 4000,
            channels: 1,
            amplitude: 0.3,
            waveform: Waveform::Tone { freq: 60.0 },
        }
    }
}

/// Generate a 16-bit PCM WAV file
pub fn generate_test_wav(path: &Path, config: &AudioConfig) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let total_samples = (config.duration_seconds * config.sample_rate as f64) as usize;
    let mut rng = match config.waveform {
        Waveform::Noise { seed } => StdRng::seed_from_u64(seed),
        Waveform::Tone { .. } => StdRng::seed_from_u64(0),
    };

    for i in 0..total_samples {
        let value = match config.waveform {
            Waveform::Tone { freq } => {
                let t = i as f32 / config.sample_rate as f32;
                (2.0 * std::f32::consts::PI * freq * t).sin()
            }
            Waveform::Noise { .. } => rng.gen_range(-1.0f32..1.0),
        };
        let sample = (config.amplitude * value * i16::MAX as f32) as i16;
        for _ in 0..config.channels {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}

/// Tone recording at the default rate and length
pub fn tone_config(freq: f32) -> AudioConfig {
    AudioConfig {
        waveform: Waveform::Tone { freq },
        ..AudioConfig::default()
    }
}

/// Seeded white-noise recording at the default rate and length
pub fn noise_config(seed: u64) -> AudioConfig {
    AudioConfig {
        waveform: Waveform::Noise { seed },
        ..AudioConfig::default()
    }
}
