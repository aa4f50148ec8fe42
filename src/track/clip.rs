//! Source clips: decoded PCM, WAV loading, and linear-interpolation resampling.

use std::io::{Read, Seek};
use std::path::PathBuf;

/// Errors that can occur when loading clips.
#[derive(Debug)]
pub enum ClipError {
    /// WAV decoding error.
    Wav(hound::Error),
    /// Directory or file I/O error.
    Io(std::io::Error),
    /// The WAV file contains no samples.
    Empty,
    /// A folder held no decodable clips.
    NoClips(PathBuf),
}

impl std::fmt::Display for ClipError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClipError::Wav(e) => write!(f, "WAV error: {e}"),
            ClipError::Io(e) => write!(f, "I/O error: {e}"),
            ClipError::Empty => write!(f, "WAV file contains no samples"),
            ClipError::NoClips(path) => write!(f, "no .wav clips in {}", path.display()),
        }
    }
}

impl std::error::Error for ClipError {}

impl From<hound::Error> for ClipError {
    fn from(e: hound::Error) -> Self {
        ClipError::Wav(e)
    }
}

impl From<std::io::Error> for ClipError {
    fn from(e: std::io::Error) -> Self {
        ClipError::Io(e)
    }
}

/// A decoded audio clip: interleaved f32 frames at a known rate and channel count.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl Clip {
    /// Create from interleaved samples. Trailing partial frames are dropped.
    pub fn new(mut samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        let channels = channels.max(1);
        let whole = samples.len() - samples.len() % channels as usize;
        samples.truncate(whole);
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    /// Create from raw mono samples.
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(samples, 1, sample_rate)
    }

    /// Load a WAV file from a reader, converting to f32 at `target_sample_rate`.
    ///
    /// Supports integer (8–32 bit) and 32-bit float WAV. Channels are kept as-is.
    /// If the source rate differs from `target_sample_rate`, linear interpolation
    /// resampling is applied per channel.
    pub fn from_wav<R: Read + Seek>(reader: R, target_sample_rate: u32) -> Result<Self, ClipError> {
        let wav = hound::WavReader::new(reader)?;
        let spec = wav.spec();
        let channels = spec.channels.max(1);
        let source_rate = spec.sample_rate;

        let raw_samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => {
                let bits = spec.bits_per_sample;
                let max_val = (1u64 << (bits - 1)) as f32;
                wav.into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_val))
                    .collect::<Result<Vec<f32>, _>>()?
            }
            hound::SampleFormat::Float => {
                wav.into_samples::<f32>().collect::<Result<Vec<f32>, _>>()?
            }
        };

        if raw_samples.is_empty() {
            return Err(ClipError::Empty);
        }

        let clip = Self::new(raw_samples, channels, source_rate);
        Ok(clip.resampled(target_sample_rate))
    }

    /// Convert to `target_rate` by linear interpolation. Same rate returns a copy.
    pub fn resampled(&self, target_rate: u32) -> Self {
        if target_rate == self.sample_rate || target_rate == 0 {
            return self.clone();
        }
        let ratio = self.sample_rate as f64 / target_rate as f64;
        Self {
            samples: resample_linear(&self.samples, self.channels as usize, ratio),
            channels: self.channels,
            sample_rate: target_rate,
        }
    }

    /// Interleaved samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Linear-interpolation resampling of interleaved frames.
///
/// `ratio` is input frames consumed per output frame: 2.0 halves the length,
/// 0.5 doubles it.
pub fn resample_linear(input: &[f32], channels: usize, ratio: f64) -> Vec<f32> {
    resample_linear_capped(input, channels, ratio, usize::MAX)
}

/// [`resample_linear`], stopping after `max_frames` output frames.
pub fn resample_linear_capped(
    input: &[f32],
    channels: usize,
    ratio: f64,
    max_frames: usize,
) -> Vec<f32> {
    let channels = channels.max(1);
    let in_frames = input.len() / channels;
    if in_frames == 0 || ratio <= 0.0 || max_frames == 0 {
        return Vec::new();
    }
    if in_frames == 1 {
        return input[..channels].to_vec();
    }

    let out_frames = ((in_frames as f64 / ratio).round() as usize)
        .max(1)
        .min(max_frames);
    let mut output = Vec::with_capacity(out_frames * channels);

    for i in 0..out_frames {
        let src_pos = i as f64 * ratio;
        let idx = src_pos as usize;
        let frac = (src_pos - idx as f64) as f32;

        for ch in 0..channels {
            let sample = if idx + 1 < in_frames {
                input[idx * channels + ch] * (1.0 - frac) + input[(idx + 1) * channels + ch] * frac
            } else {
                input[(in_frames - 1) * channels + ch]
            };
            output.push(sample);
        }
    }

    output
}
