//! Audio segments: decoding, concatenation, speed adjustment and WAV export.

mod segment;

pub use segment::{AudioSegment, SPEECH_SAMPLE_RATE};
