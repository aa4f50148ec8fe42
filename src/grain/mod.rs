//! Grains: short excerpts of a clip, enveloped, time-scaled and panned.
//!
//! The pipeline for one grain is:
//! 1. cut `[start, start + duration)` from the clip (percent of clip length)
//! 2. apply the Hann fade envelope
//! 3. time-scale by the stretch factor
//! 4. convert to stereo
//! 5. pan

pub mod envelope;
pub mod gain;
pub mod pan;
pub mod stretch;

pub use envelope::{FadeMode, HannFade};
pub use gain::{db_to_gain, multiplier_to_db};

use crate::formula::{EvaluationContext, FormulaError};
use crate::track::{Clip, Param};

/// Shaping parameters for one grain, read from an evaluation context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrainShape {
    /// Start, percent of clip length.
    pub start_pct: f64,
    /// Length, percent of clip length.
    pub duration_pct: f64,
    pub fade_in: f64,
    pub fade_out: f64,
    pub fade_mode: FadeMode,
    pub stretch: f64,
    pub pan: f64,
}

impl GrainShape {
    /// Read every grain parameter from `ctx`.
    pub fn from_context(ctx: &EvaluationContext, fade_mode: FadeMode) -> Result<Self, FormulaError> {
        Ok(Self {
            start_pct: ctx.param(Param::GrainStart.name())?,
            duration_pct: ctx.param(Param::GrainDuration.name())?,
            fade_in: ctx.param(Param::FadeIn.name())?,
            fade_out: ctx.param(Param::FadeOut.name())?,
            fade_mode,
            stretch: ctx.param(Param::Stretch.name())?,
            pan: ctx.param(Param::Panning.name())?,
        })
    }

    /// Frame range `[start, end)` inside a clip of `frames` frames.
    ///
    /// The end is clamped to the clip. A negative start is clamped to zero and
    /// a start past the end gives an empty range.
    pub fn span(&self, frames: usize) -> (usize, usize) {
        let len = frames as f64;
        let start = (self.start_pct / 100.0 * len).round();
        let duration = (self.duration_pct / 100.0 * len).round();
        let end = (start + duration).clamp(0.0, len);
        let start = start.clamp(0.0, len);
        if start.is_nan() || end.is_nan() || start >= end {
            return (0, 0);
        }
        (start as usize, end as usize)
    }
}

/// A shaped stereo grain, interleaved.
#[derive(Debug, Clone, PartialEq)]
pub struct Grain {
    samples: Vec<f32>,
}

impl Grain {
    /// Interleaved L/R samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Cut, envelope, time-scale and pan one grain of `clip`.
///
/// At most `max_frames` frames are produced; the rest of a long stretch is never
/// materialised.
pub fn extract_and_shape(
    clip: &Clip,
    shape: &GrainShape,
    max_frames: usize,
) -> Result<Grain, FormulaError> {
    let channels = clip.channels() as usize;
    let (start, end) = shape.span(clip.frames());
    let mut samples = clip.samples()[start * channels..end * channels].to_vec();

    let frames = end - start;
    let fade = HannFade::new(
        shape.fade_mode.frames(shape.fade_in, frames, clip.sample_rate()),
        shape.fade_mode.frames(shape.fade_out, frames, clip.sample_rate()),
    );
    fade.apply(&mut samples, channels);

    let scaled = stretch::time_scale(&samples, channels, shape.stretch, max_frames)?;
    let mut stereo = to_stereo(&scaled, channels);
    pan::pan(&mut stereo, shape.pan);

    Ok(Grain { samples: stereo })
}

/// Mono is duplicated; extra channels beyond the first two are dropped.
fn to_stereo(samples: &[f32], channels: usize) -> Vec<f32> {
    match channels {
        2 => samples.to_vec(),
        0 | 1 => samples.iter().flat_map(|&s| [s, s]).collect(),
        n => samples
            .chunks_exact(n)
            .flat_map(|frame| [frame[0], frame[1]])
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape() -> GrainShape {
        GrainShape {
            start_pct: 0.0,
            duration_pct: 100.0,
            fade_in: 0.0,
            fade_out: 0.0,
            fade_mode: FadeMode::Seconds,
            stretch: 1.0,
            pan: -1.0,
        }
    }

    #[test]
    fn span_percentages() {
        let s = GrainShape {
            start_pct: 25.0,
            duration_pct: 50.0,
            ..shape()
        };
        assert_eq!(s.span(1000), (250, 750));
    }

    #[test]
    fn span_end_is_clamped() {
        let s = GrainShape {
            start_pct: 90.0,
            duration_pct: 50.0,
            ..shape()
        };
        assert_eq!(s.span(1000), (900, 1000));
    }

    #[test]
    fn negative_start_is_clamped() {
        let s = GrainShape {
            start_pct: -10.0,
            duration_pct: 50.0,
            ..shape()
        };
        assert_eq!(s.span(1000), (0, 400));
    }

    #[test]
    fn start_past_end_is_empty() {
        let s = GrainShape {
            start_pct: 150.0,
            duration_pct: 10.0,
            ..shape()
        };
        assert_eq!(s.span(1000), (0, 0));
        let clip = Clip::from_mono(vec![1.0; 1000], 1000);
        assert!(extract_and_shape(&clip, &s, usize::MAX).unwrap().is_empty());
    }

    #[test]
    fn mono_becomes_stereo() {
        let clip = Clip::from_mono(vec![0.5; 4], 1000);
        let grain = extract_and_shape(&clip, &shape(), usize::MAX).unwrap();
        assert_eq!(grain.frames(), 4);
        assert_eq!(grain.samples()[0], 0.5);
        assert_eq!(grain.samples()[1], 0.0);
    }

    #[test]
    fn extra_channels_are_dropped() {
        let clip = Clip::new(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6], 3, 1000);
        let s = GrainShape { pan: 0.0, ..shape() };
        let grain = extract_and_shape(&clip, &s, usize::MAX).unwrap();
        assert_eq!(grain.frames(), 2);
        assert!((grain.samples()[2] - 0.2).abs() < 1e-6);
        assert!((grain.samples()[3] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn fade_shapes_both_ends() {
        let clip = Clip::from_mono(vec![1.0; 44100], 44100);
        let s = GrainShape {
            fade_in: 0.5,
            fade_out: 0.5,
            ..shape()
        };
        let grain = extract_and_shape(&clip, &s, usize::MAX).unwrap();
        let left: Vec<f32> = grain.samples().iter().step_by(2).copied().collect();
        assert_eq!(left[0], 0.0);
        assert_eq!(left[22050], 1.0);
        assert!(left[11025] > 0.49 && left[11025] < 0.51);
        assert!(left[44099] < 1e-3);
    }

    #[test]
    fn stretch_changes_length() {
        let clip = Clip::from_mono(vec![0.3; 1000], 1000);
        let s = GrainShape { stretch: 2.0, ..shape() };
        assert_eq!(extract_and_shape(&clip, &s, usize::MAX).unwrap().frames(), 500);
        let s = GrainShape { stretch: 0.0, ..shape() };
        assert!(extract_and_shape(&clip, &s, usize::MAX).is_err());
    }

    #[test]
    fn tiny_stretch_is_bounded() {
        let clip = Clip::from_mono(vec![0.3; 44100], 44100);
        let s = GrainShape {
            stretch: 0.00002,
            ..shape()
        };
        let grain = extract_and_shape(&clip, &s, 1000).unwrap();
        assert_eq!(grain.frames(), 1000);
        assert_eq!(grain.samples().len(), 2000);
    }

    #[test]
    fn shape_reads_context_params() {
        let mut ctx_formulas = crate::formula::FormulaSet::new();
        for p in Param::ALL {
            ctx_formulas.set(p.name(), p.default_formula());
        }
        let builder = crate::formula::ContextBuilder::single(0, &ctx_formulas);
        let mut cache = crate::formula::FormulaCache::default();
        let ctx = builder.build(0, 20_000, &mut cache).unwrap();
        let s = GrainShape::from_context(&ctx, FadeMode::Percent).unwrap();
        assert_eq!(s.start_pct, 2.0);
        assert_eq!(s.duration_pct, 100.0);
        assert_eq!(s.fade_mode, FadeMode::Percent);
    }
}
