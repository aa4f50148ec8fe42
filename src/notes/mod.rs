//! Symbolic note generation: the same formula-driven timeline as the grain
//! scheduler, emitting note events instead of audio.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::RenderError;
use crate::formula::{ContextBuilder, FormulaCache};
use crate::render::scheduler::next_position;
use crate::render::CancelFlag;
use crate::track::{NoteParam, Track};

/// One note on a track's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Index of the track that produced it.
    pub track: usize,
    /// MIDI note number, 0-127.
    pub pitch: u8,
    /// MIDI velocity, 1-127.
    pub velocity: u8,
    pub start_ms: u64,
    pub length_ms: u64,
}

fn midi_value(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 127.0) as u8
}

/// Generate the note events of a notes track over `duration_ms`.
///
/// `amplitude` is evaluated once at the end of the timeline and scales every
/// velocity. Notes whose scaled velocity rounds to zero are skipped.
pub fn generate(
    track: &Track,
    index: usize,
    builder: &ContextBuilder,
    duration_ms: u64,
    note_length_ms: u64,
    cache: &mut FormulaCache,
    cancel: &CancelFlag,
) -> Result<Vec<NoteEvent>, RenderError> {
    if let Some(e) = builder.plan_error(index) {
        return Err(e.clone().into());
    }
    info!(track = index, name = track.name(), "generating notes");

    let amplitude = builder
        .build(index, duration_ms, cache)?
        .param(NoteParam::Amplitude.name())?;

    let mut events = Vec::new();
    let mut position = 0u64;
    while position < duration_ms {
        if cancel.is_cancelled() {
            return Err(RenderError::Cancelled);
        }

        let ctx = builder.build(index, position, cache)?;
        let pitch = midi_value(ctx.param(NoteParam::Pitch.name())?);
        let velocity = midi_value(ctx.param(NoteParam::Velocity.name())? * amplitude);
        if velocity > 0 {
            events.push(NoteEvent {
                track: index,
                pitch,
                velocity,
                start_ms: position,
                length_ms: note_length_ms.min(duration_ms - position),
            });
        }

        position = next_position(position, ctx.param(NoteParam::Rhythm.name())?);
    }

    debug!(track = index, notes = events.len(), "notes generated");
    Ok(events)
}
