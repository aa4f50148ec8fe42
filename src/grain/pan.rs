//! Stereo panning with a linear law, applied through decibel gains.

use super::gain::{db_to_gain, multiplier_to_db};

/// Per-channel linear gains for a pan position in `[-1, 1]`.
///
/// Out-of-range values are clamped. `-1` keeps only the left channel, `+1`
/// only the right, and `0` gives each channel half amplitude.
pub fn pan_gains(value: f64) -> (f64, f64) {
    let p = if value.is_nan() { 0.0 } else { value.clamp(-1.0, 1.0) };
    if p <= -1.0 {
        return (1.0, 0.0);
    }
    if p >= 1.0 {
        return (0.0, 1.0);
    }
    let left = db_to_gain(multiplier_to_db((1.0 - p) / 2.0));
    let right = db_to_gain(multiplier_to_db((1.0 + p) / 2.0));
    (left, right)
}

/// Apply panning in place to interleaved stereo samples.
pub fn pan(samples: &mut [f32], value: f64) {
    let (left, right) = pan_gains(value);
    let (left, right) = (left as f32, right as f32);
    for frame in samples.chunks_exact_mut(2) {
        frame[0] *= left;
        frame[1] *= right;
    }
}
