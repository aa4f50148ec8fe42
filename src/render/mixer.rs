//! Mixer: renders every track, applies amplitude, and sums the result.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::RenderError;
use crate::formula::{ContextBuilder, ContextMode, FormulaCache};
use crate::grain::{db_to_gain, multiplier_to_db};
use crate::notes::{self, NoteEvent};
use crate::track::{Param, Track, TrackKind};

use super::buffer::AudioBuffer;
use super::cancel::CancelFlag;
use super::limiter::Limiter;
use super::scheduler::{render_track, GrainPlacement};
use super::RenderSettings;

/// An audio track that made it into the mix.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTrack {
    pub index: usize,
    /// Track gain, from `amplitude` at the end of the timeline.
    pub gain_db: f64,
    pub placements: Vec<GrainPlacement>,
}

/// A track left out of the mix.
#[derive(Debug)]
pub struct TrackFailure {
    pub index: usize,
    pub name: String,
    pub error: RenderError,
}

/// Result of a full render.
#[derive(Debug)]
pub struct MixReport {
    pub buffer: AudioBuffer,
    pub rendered: Vec<RenderedTrack>,
    pub failures: Vec<TrackFailure>,
    pub notes: Vec<NoteEvent>,
}

impl MixReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

enum TrackOutput {
    Audio(AudioBuffer, RenderedTrack),
    Notes(Vec<NoteEvent>),
}

fn render_one(
    track: &Track,
    index: usize,
    shared: Option<&ContextBuilder>,
    duration_ms: u64,
    settings: &RenderSettings,
    cancel: &CancelFlag,
) -> Result<TrackOutput, RenderError> {
    let own;
    let builder = match shared {
        Some(b) => b,
        None => {
            own = ContextBuilder::single(index, track.formulas());
            &own
        }
    };
    let mut cache = FormulaCache::new(settings.cache_policy);

    match track.kind() {
        TrackKind::Notes => notes::generate(
            track,
            index,
            builder,
            duration_ms,
            settings.note_length_ms,
            &mut cache,
            cancel,
        )
        .map(TrackOutput::Notes),
        TrackKind::Audio => {
            let mut render =
                render_track(track, index, builder, duration_ms, settings, &mut cache, cancel)?;
            let amplitude = builder
                .build(index, duration_ms, &mut cache)?
                .param(Param::Amplitude.name())?;
            let gain_db = multiplier_to_db(amplitude);
            render.buffer.apply_gain(db_to_gain(gain_db) as f32);
            Ok(TrackOutput::Audio(
                render.buffer,
                RenderedTrack {
                    index,
                    gain_db,
                    placements: render.placements,
                },
            ))
        }
    }
}

/// Render `tracks` over `duration_ms` and mix them.
///
/// A track that fails is recorded in [`MixReport::failures`] and the rest
/// still render. Cancellation aborts the whole render.
pub fn render_all(
    tracks: &[Track],
    duration_ms: u64,
    settings: &RenderSettings,
    cancel: &CancelFlag,
) -> Result<MixReport, RenderError> {
    info!(
        tracks = tracks.len(),
        duration_ms,
        mode = ?settings.context_mode,
        parallel = settings.parallel,
        "render started"
    );

    let shared = (settings.context_mode == ContextMode::Multi)
        .then(|| ContextBuilder::multi(tracks.iter().map(Track::formulas)));

    let outputs: Vec<Result<TrackOutput, RenderError>> = if settings.parallel {
        tracks
            .par_iter()
            .enumerate()
            .map(|(i, t)| render_one(t, i, shared.as_ref(), duration_ms, settings, cancel))
            .collect()
    } else {
        tracks
            .iter()
            .enumerate()
            .map(|(i, t)| render_one(t, i, shared.as_ref(), duration_ms, settings, cancel))
            .collect()
    };

    let mut buffer = AudioBuffer::silent(duration_ms, settings.sample_rate);
    let mut rendered = Vec::new();
    let mut failures = Vec::new();
    let mut notes = Vec::new();

    for (index, output) in outputs.into_iter().enumerate() {
        match output {
            Ok(TrackOutput::Audio(track_buffer, track)) => {
                buffer.mix(&track_buffer);
                rendered.push(track);
            }
            Ok(TrackOutput::Notes(events)) => notes.extend(events),
            Err(RenderError::Cancelled) => return Err(RenderError::Cancelled),
            Err(error) => {
                let name = tracks[index].name().to_string();
                warn!(track = index, name = %name, error = %error, "track failed");
                failures.push(TrackFailure { index, name, error });
            }
        }
    }

    let clipped = Limiter::new(settings.ceiling).process_buffer(&mut buffer);
    if clipped > 0 {
        debug!(clipped, ceiling = settings.ceiling, "limiter engaged");
    }
    notes.sort_by_key(|n| (n.start_ms, n.track));

    info!(
        rendered = rendered.len(),
        failed = failures.len(),
        notes = notes.len(),
        "render finished"
    );

    Ok(MixReport {
        buffer,
        rendered,
        failures,
        notes,
    })
}

/// Note events of a session, with no audio rendered.
#[derive(Debug)]
pub struct NoteReport {
    pub notes: Vec<NoteEvent>,
    pub failures: Vec<TrackFailure>,
}

/// Generate the notes of every notes track over `duration_ms`. Audio tracks
/// are skipped, though in multi mode their formulas stay visible to the notes
/// tracks.
pub fn render_notes(
    tracks: &[Track],
    duration_ms: u64,
    settings: &RenderSettings,
    cancel: &CancelFlag,
) -> Result<NoteReport, RenderError> {
    let shared = (settings.context_mode == ContextMode::Multi)
        .then(|| ContextBuilder::multi(tracks.iter().map(Track::formulas)));

    let mut notes = Vec::new();
    let mut failures = Vec::new();
    for (index, track) in tracks.iter().enumerate() {
        if track.kind() != TrackKind::Notes {
            continue;
        }
        match render_one(track, index, shared.as_ref(), duration_ms, settings, cancel) {
            Ok(TrackOutput::Notes(events)) => notes.extend(events),
            Ok(TrackOutput::Audio(..)) => {}
            Err(RenderError::Cancelled) => return Err(RenderError::Cancelled),
            Err(error) => {
                let name = track.name().to_string();
                warn!(track = index, name = %name, error = %error, "track failed");
                failures.push(TrackFailure { index, name, error });
            }
        }
    }
    notes.sort_by_key(|n| (n.start_ms, n.track));

    info!(notes = notes.len(), failed = failures.len(), "notes generated");
    Ok(NoteReport { notes, failures })
}
