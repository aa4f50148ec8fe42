//! Time-scaling by frame-rate reinterpretation.
//!
//! Speed and pitch change together: a factor of 2 halves the length and raises
//! the pitch an octave. A negative factor plays the grain backwards.

use crate::formula::FormulaError;
use crate::track::clip::resample_linear_capped;

/// Factors closer to zero than this cannot be scaled.
pub const MIN_FACTOR: f64 = 1e-6;

/// Time-scale interleaved `samples` by `factor`, producing at most `max_frames` frames.
///
/// Output length is `min(round(frames / |factor|), max_frames)`.
pub fn time_scale(
    samples: &[f32],
    channels: usize,
    factor: f64,
    max_frames: usize,
) -> Result<Vec<f32>, FormulaError> {
    if !factor.is_finite() || factor.abs() < MIN_FACTOR {
        return Err(FormulaError::domain(
            format!("stretch factor {factor} is zero or not finite"),
            "stretch",
            0,
        ));
    }
    let channels = channels.max(1);

    let source = if factor < 0.0 {
        reversed(samples, channels)
    } else {
        samples.to_vec()
    };

    let ratio = factor.abs();
    if ratio == 1.0 {
        let mut source = source;
        source.truncate(max_frames.saturating_mul(channels));
        return Ok(source);
    }
    let frames = source.len() / channels;
    if frames == 1 {
        let target = ((1.0 / ratio).round() as usize).max(1).min(max_frames);
        return Ok(source.repeat(target));
    }
    Ok(resample_linear_capped(&source, channels, ratio, max_frames))
}

fn reversed(samples: &[f32], channels: usize) -> Vec<f32> {
    samples
        .chunks_exact(channels)
        .rev()
        .flatten()
        .copied()
        .collect()
}
