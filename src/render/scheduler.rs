//! Grain scheduler: walks one track's timeline and overlays grains.

use std::borrow::Cow;

use tracing::{debug, info};

use crate::error::RenderError;
use crate::formula::{ContextBuilder, FormulaCache};
use crate::grain::{extract_and_shape, GrainShape};
use crate::track::{Clip, Param, Track};

use super::buffer::AudioBuffer;
use super::cancel::CancelFlag;
use super::RenderSettings;

/// Shortest gap between grains, in seconds.
pub const MIN_GAP_SECS: f64 = 0.001;

/// Where one grain landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrainPlacement {
    pub position_ms: u64,
    pub clip_index: usize,
    /// Frames written, after clipping to the buffer end.
    pub frames: usize,
}

/// A rendered track, before its amplitude is applied.
#[derive(Debug, Clone)]
pub struct TrackRender {
    pub buffer: AudioBuffer,
    pub placements: Vec<GrainPlacement>,
}

/// Advance the timeline by a `rhythm` gap in seconds.
///
/// Gaps below [`MIN_GAP_SECS`] (and NaN) use the minimum, and every step moves
/// at least one millisecond.
pub fn next_position(position_ms: u64, rhythm: f64) -> u64 {
    let gap = if rhythm.is_nan() { MIN_GAP_SECS } else { rhythm.max(MIN_GAP_SECS) };
    let step = ((gap * 1000.0).trunc() as u64).max(1);
    position_ms.saturating_add(step)
}

/// Which clip a `sample` value selects: `floor(value) mod count`, always in range.
pub fn clip_index(value: f64, count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    let floored = if value.is_finite() { value.floor() as i64 } else { 0 };
    floored.rem_euclid(count as i64) as usize
}

/// Render one audio track over `duration_ms`.
pub fn render_track(
    track: &Track,
    index: usize,
    builder: &ContextBuilder,
    duration_ms: u64,
    settings: &RenderSettings,
    cache: &mut FormulaCache,
    cancel: &CancelFlag,
) -> Result<TrackRender, RenderError> {
    let clips = track.clips();
    if clips.is_empty() {
        return Err(RenderError::EmptySource);
    }
    if let Some(e) = builder.plan_error(index) {
        return Err(e.clone().into());
    }

    info!(track = index, name = track.name(), clips = clips.len(), "rendering track");

    let sample_rate = settings.sample_rate;
    let clips = at_rate(clips, sample_rate);
    let mut buffer = AudioBuffer::silent(duration_ms, sample_rate);
    let mut placements = Vec::new();
    let mut position = 0u64;

    while position < duration_ms {
        if cancel.is_cancelled() {
            return Err(RenderError::Cancelled);
        }

        let ctx = builder.build(index, position, cache)?;
        let clip_index = clip_index(ctx.param(Param::Sample.name())?, clips.len());
        let shape = GrainShape::from_context(&ctx, track.fade_mode())?;
        let offset = (position * sample_rate as u64 / 1000) as usize;
        let remaining = buffer.frames().saturating_sub(offset);
        let grain = extract_and_shape(&clips[clip_index], &shape, remaining)?;

        buffer.overlay(grain.samples(), offset);
        placements.push(GrainPlacement {
            position_ms: position,
            clip_index,
            frames: grain.frames(),
        });

        position = next_position(position, ctx.param(Param::Rhythm.name())?);
    }

    debug!(
        track = index,
        grains = placements.len(),
        cache_hits = cache.hits(),
        cache_misses = cache.misses(),
        "track rendered"
    );

    Ok(TrackRender { buffer, placements })
}

/// Clips converted to the render rate. Clips already at that rate are borrowed.
fn at_rate(clips: &[Clip], sample_rate: u32) -> Vec<Cow<'_, Clip>> {
    clips
        .iter()
        .map(|clip| {
            if clip.sample_rate() == sample_rate {
                Cow::Borrowed(clip)
            } else {
                debug!(from = clip.sample_rate(), to = sample_rate, "resampling clip");
                Cow::Owned(clip.resampled(sample_rate))
            }
        })
        .collect()
}
