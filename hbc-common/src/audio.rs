//! Audio Decoding Utilities
//!
//! **Purpose:** Decode audio files to mono f32 PCM samples at their native
//! sample rate. No resampling is performed; feature extraction works on the
//! rate the recording was made at.
//!
//! Uses symphonia for format-agnostic decoding (WAV, FLAC, MP3, AAC, etc.)

use std::path::Path;

use symphonia::core::audio::{AudioBufferRef, SampleBuffer};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Decoded audio result
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Mono audio samples (f32, range [-1.0, 1.0])
    pub samples: Vec<f32>,
    /// Native sample rate in Hz
    pub sample_rate: u32,
    /// Original channel count
    pub channels: usize,
    /// Duration in seconds
    pub duration_seconds: f64,
}

/// Decode audio file to mono f32 PCM samples
///
/// **Algorithm:**
/// 1. Open file and probe format (extension used as a hint only)
/// 2. Select the first track with a known codec
/// 3. Decode every packet of that track
/// 4. Average channels into a single mono signal
///
/// Packets that fail to decode are skipped with a warning; any other
/// container or codec failure is returned as [`Error::Decode`].
pub fn decode_audio_file(file_path: &Path) -> Result<DecodedAudio> {
    debug!(path = %file_path.display(), "Decoding audio file");

    let file = std::fs::File::open(file_path).map_err(|e| {
        Error::Decode(format!(
            "Failed to open audio file {}: {}",
            file_path.display(),
            e
        ))
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = file_path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| Error::Decode(format!("Failed to probe audio file: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::Decode("No audio track found in file".to_string()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| Error::Decode("Sample rate unknown".to_string()))?;
    let channel_count = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(Error::Decode(format!("Error reading packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => append_mono(decoded, &mut samples),
            Err(SymphoniaError::DecodeError(msg)) => {
                warn!(path = %file_path.display(), "Skipping corrupt packet: {}", msg);
            }
            Err(e) => return Err(Error::Decode(format!("Failed to decode packet: {}", e))),
        }
    }

    let duration_seconds = samples.len() as f64 / sample_rate as f64;

    debug!(
        path = %file_path.display(),
        sample_rate,
        channels = channel_count,
        total_samples = samples.len(),
        duration_seconds = format!("{:.2}", duration_seconds),
        "Audio decoding complete"
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels: channel_count,
        duration_seconds,
    })
}

/// Convert one decoded buffer to f32 and append its channel average
fn append_mono(decoded: AudioBufferRef<'_>, out: &mut Vec<f32>) {
    let spec = *decoded.spec();
    let channels = spec.channels.count();
    if channels == 0 || decoded.frames() == 0 {
        return;
    }

    let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
    buf.copy_interleaved_ref(decoded);

    out.reserve(buf.samples().len() / channels);
    for frame in buf.samples().chunks_exact(channels) {
        out.push(frame.iter().sum::<f32>() / channels as f32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_decode_audio_file_not_found() {
        let result = decode_audio_file(Path::new("/nonexistent/file.wav"));
        let err = result.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert!(err.to_string().contains("Failed to open audio file"));
    }

    #[test]
    fn test_decode_rejects_non_audio_content() {
        let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        file.write_all(b"this is definitely not a RIFF header").unwrap();

        let err = decode_audio_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_decode_downmixes_stereo_at_native_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 2000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..1000 {
            writer.write_sample(i16::MAX / 2).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let decoded = decode_audio_file(&path).unwrap();
        assert_eq!(decoded.sample_rate, 2000);
        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.samples.len(), 1000);
        assert!((decoded.duration_seconds - 0.5).abs() < 1e-9);
        // Left at half scale, right silent: mono mean is a quarter scale
        assert!((decoded.samples[10] - 0.25).abs() < 1e-3);
    }
}
