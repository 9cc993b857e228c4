//! In-memory PCM audio segments.

use crate::error::{PdfcastError, Result};
use std::io::Cursor;
use std::path::Path;

/// Sample rate of raw PCM returned by the speech API.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// Interleaved signed 16-bit PCM audio.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSegment {
    samples: Vec<i16>,
    sample_rate: u32,
    channels: u16,
}

impl Default for AudioSegment {
    fn default() -> Self {
        Self::empty()
    }
}

impl AudioSegment {
    /// Wrap interleaved samples.
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Result<Self> {
        if sample_rate == 0 || channels == 0 {
            return Err(PdfcastError::Audio(format!(
                "Invalid audio format: {} Hz, {} channels",
                sample_rate, channels
            )));
        }
        if samples.len() % channels as usize != 0 {
            return Err(PdfcastError::Audio(format!(
                "{} samples do not divide into {} channels",
                samples.len(),
                channels
            )));
        }
        Ok(Self {
            samples,
            sample_rate,
            channels,
        })
    }

    /// A zero-length mono segment. Appending to it adopts the other segment's format.
    pub fn empty() -> Self {
        Self {
            samples: Vec::new(),
            sample_rate: SPEECH_SAMPLE_RATE,
            channels: 1,
        }
    }

    /// Silence of the given duration.
    pub fn silent(duration_secs: f64, sample_rate: u32, channels: u16) -> Result<Self> {
        let frames = (duration_secs.max(0.0) * sample_rate as f64).round() as usize;
        Self::new(vec![0; frames * channels as usize], sample_rate, channels)
    }

    /// Decode raw little-endian 16-bit PCM.
    pub fn from_pcm16le(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<Self> {
        if bytes.len() % 2 != 0 {
            return Err(PdfcastError::Audio(format!(
                "PCM stream has odd length {}",
                bytes.len()
            )));
        }
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self::new(samples, sample_rate, channels)
    }

    /// Decode a 16-bit integer WAV file.
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self> {
        let reader = hound::WavReader::new(Cursor::new(bytes))
            .map_err(|e| PdfcastError::Audio(format!("Failed to parse WAV data: {}", e)))?;

        let spec = reader.spec();
        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(PdfcastError::Audio(format!(
                "Unsupported WAV encoding: {:?} {}-bit",
                spec.sample_format, spec.bits_per_sample
            )));
        }

        let samples = reader
            .into_samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| PdfcastError::Audio(format!("Failed to read WAV samples: {}", e)))?;

        Self::new(samples, spec.sample_rate, spec.channels)
    }

    /// Encode as a 16-bit integer WAV file.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| PdfcastError::Audio(format!("Failed to start WAV: {}", e)))?;
            for &sample in &self.samples {
                writer
                    .write_sample(sample)
                    .map_err(|e| PdfcastError::Audio(format!("Failed to write WAV: {}", e)))?;
            }
            writer
                .finalize()
                .map_err(|e| PdfcastError::Audio(format!("Failed to finish WAV: {}", e)))?;
        }
        Ok(cursor.into_inner())
    }

    /// Write the segment to disk as WAV.
    pub fn export_wav(&self, path: &Path) -> Result<()> {
        let bytes = self.to_wav_bytes()?;
        std::fs::write(path, bytes).map_err(|e| PdfcastError::storage("write", path, e))
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of sample frames (one sample per channel).
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Append another segment, converting it to this segment's format.
    pub fn append(&mut self, other: &AudioSegment) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = other.clone();
            return;
        }
        let converted = other.converted(self.sample_rate, self.channels);
        self.samples.extend_from_slice(&converted.samples);
    }

    /// Change playback speed by reinterpreting the frames at `rate * speed`
    /// and resampling back to the original rate.
    ///
    /// Duration scales by `1 / speed` and pitch shifts with it.
    pub fn with_speed(&self, speed: f32) -> Result<Self> {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(PdfcastError::Audio(format!("Invalid playback speed {}", speed)));
        }
        if (speed - 1.0).abs() < f32::EPSILON {
            return Ok(self.clone());
        }

        let spawned_rate = (self.sample_rate as f64 * speed as f64) as u32;
        if spawned_rate == 0 {
            return Err(PdfcastError::Audio(format!(
                "Playback speed {} is too slow for {} Hz",
                speed, self.sample_rate
            )));
        }

        Ok(Self {
            samples: resample(&self.samples, self.channels, spawned_rate, self.sample_rate),
            sample_rate: self.sample_rate,
            channels: self.channels,
        })
    }

    fn converted(&self, sample_rate: u32, channels: u16) -> AudioSegment {
        let remixed = remix(&self.samples, self.channels, channels);
        AudioSegment {
            samples: resample(&remixed, channels, self.sample_rate, sample_rate),
            sample_rate,
            channels,
        }
    }
}

/// Linear interpolation resampling of interleaved frames.
fn resample(samples: &[i16], channels: u16, from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let channels = channels as usize;
    let frames = samples.len() / channels;
    let output_frames =
        ((frames as u64 * to_rate as u64 + from_rate as u64 - 1) / from_rate as u64) as usize;
    let ratio = from_rate as f64 / to_rate as f64;

    let mut output = Vec::with_capacity(output_frames * channels);
    for i in 0..output_frames {
        let source_pos = i as f64 * ratio;
        let source_idx = (source_pos.floor() as usize).min(frames - 1);
        let next_idx = (source_idx + 1).min(frames - 1);
        let fraction = source_pos - source_idx as f64;

        for c in 0..channels {
            let left = samples[source_idx * channels + c] as f64;
            let right = samples[next_idx * channels + c] as f64;
            output.push((left + (right - left) * fraction).round() as i16);
        }
    }
    output
}

/// Convert between channel layouts by averaging to mono and duplicating.
fn remix(samples: &[i16], from_channels: u16, to_channels: u16) -> Vec<i16> {
    if from_channels == to_channels {
        return samples.to_vec();
    }

    let from = from_channels as usize;
    let to = to_channels as usize;
    samples
        .chunks_exact(from)
        .flat_map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            let mono = (sum / from as i32) as i16;
            std::iter::repeat(mono).take(to)
        })
        .collect()
}
