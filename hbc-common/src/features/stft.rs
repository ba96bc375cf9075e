//! Short-time power spectrum.

use realfft::RealFftPlanner;

use crate::{Error, Result};

/// Computes the centered power spectrogram of a mono signal.
///
/// The signal is zero-padded by `n_fft / 2` on both sides so frame `t` is
/// centred on sample `t * hop`. Returns `[frames][n_fft / 2 + 1]` with
/// `frames = 1 + len / hop`.
pub fn power_spectrogram(
    signal: &[f32],
    n_fft: usize,
    hop: usize,
    window: &[f64],
) -> Result<Vec<Vec<f64>>> {
    if n_fft == 0 || hop == 0 || window.len() != n_fft {
        return Err(Error::InvalidInput(format!(
            "Invalid STFT parameters: n_fft={}, hop={}, window={}",
            n_fft,
            hop,
            window.len()
        )));
    }

    let pad = n_fft / 2;
    let mut padded = vec![0.0f64; signal.len() + 2 * pad];
    for (dst, &src) in padded[pad..].iter_mut().zip(signal) {
        *dst = src as f64;
    }

    let n_frames = 1 + (padded.len() - n_fft) / hop;

    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(n_fft);
    let mut input = r2c.make_input_vec();
    let mut spectrum = r2c.make_output_vec();

    let mut frames = Vec::with_capacity(n_frames);
    for t in 0..n_frames {
        let frame = &padded[t * hop..t * hop + n_fft];
        for ((dst, &x), &w) in input.iter_mut().zip(frame).zip(window) {
            *dst = x * w;
        }
        r2c.process(&mut input, &mut spectrum)
            .map_err(|e| Error::Feature(format!("FFT failed: {}", e)))?;
        frames.push(spectrum.iter().map(|c| c.norm_sqr()).collect());
    }

    Ok(frames)
}
