//! Hann-shaped fade envelope applied to each grain.

use serde::{Deserialize, Serialize};

/// How fade-in / fade-out formula values are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FadeMode {
    /// Absolute seconds at the clip's sample rate.
    #[default]
    Seconds,
    /// Percent of the grain's length.
    Percent,
}

impl FadeMode {
    /// Fade length in frames for a formula `value`. Negative values give zero.
    pub fn frames(self, value: f64, grain_frames: usize, sample_rate: u32) -> usize {
        let frames = match self {
            FadeMode::Seconds => value * sample_rate as f64,
            FadeMode::Percent => value / 100.0 * grain_frames as f64,
        };
        if frames.is_finite() && frames > 0.0 {
            frames as usize
        } else {
            0
        }
    }
}

/// Fade-in and fade-out lengths for one grain, in frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HannFade {
    pub fade_in: usize,
    pub fade_out: usize,
}

impl HannFade {
    pub fn new(fade_in: usize, fade_out: usize) -> Self {
        Self { fade_in, fade_out }
    }

    /// Gain at frame `n` of a grain with `total` frames.
    ///
    /// - `n < fade_in`: `0.5 - 0.5 cos(π n / fade_in)`
    /// - `n > total - fade_out`: `0.5 - 0.5 cos(π (total - n) / fade_out)`
    /// - otherwise unity. A zero-length fade is an empty region.
    pub fn gain(&self, n: usize, total: usize) -> f64 {
        if self.fade_in > 0 && n < self.fade_in {
            0.5 - 0.5 * (std::f64::consts::PI * n as f64 / self.fade_in as f64).cos()
        } else if self.fade_out > 0 && n + self.fade_out > total {
            let remaining = total.saturating_sub(n) as f64;
            0.5 - 0.5 * (std::f64::consts::PI * remaining / self.fade_out as f64).cos()
        } else {
            1.0
        }
    }

    /// Apply the envelope in place to interleaved samples.
    pub fn apply(&self, samples: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let total = samples.len() / channels;
        if self.fade_in == 0 && self.fade_out == 0 {
            return;
        }
        for (n, frame) in samples.chunks_exact_mut(channels).enumerate() {
            let g = self.gain(n, total) as f32;
            for s in frame {
                *s *= g;
            }
        }
    }
}
