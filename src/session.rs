//! Session: the ordered track list, the focused track, and the render entry point.

use tracing::info;

use crate::error::RenderError;
use crate::formula::{resolve_order, FormulaError};
use crate::render::{self, CancelFlag, MixReport, NoteReport, RenderSettings};
use crate::track::Track;

/// Editing state for a set of tracks.
///
/// The focused track is what an editor shows; rendering never depends on it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    tracks: Vec<Track>,
    focused: Option<usize>,
    settings: RenderSettings,
}

impl Session {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            tracks: Vec::new(),
            focused: None,
            settings,
        }
    }

    /// Append a track and focus it. Returns its index.
    pub fn add_track(&mut self, track: Track) -> usize {
        self.tracks.push(track);
        let index = self.tracks.len() - 1;
        self.focused = Some(index);
        index
    }

    /// Remove a track, keeping focus on the same track where possible.
    pub fn remove_track(&mut self, index: usize) -> Option<Track> {
        if index >= self.tracks.len() {
            return None;
        }
        let track = self.tracks.remove(index);
        self.focused = match self.focused {
            _ if self.tracks.is_empty() => None,
            Some(f) if f > index => Some(f - 1),
            Some(f) if f == index => Some(index.min(self.tracks.len() - 1)),
            other => other,
        };
        Some(track)
    }

    pub fn focus(&mut self, index: usize) -> Result<(), RenderError> {
        if index >= self.tracks.len() {
            return Err(RenderError::NoSuchTrack(index));
        }
        self.focused = Some(index);
        Ok(())
    }

    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    pub fn focused_track(&self) -> Option<&Track> {
        self.focused.and_then(|i| self.tracks.get(i))
    }

    /// Replace one formula on track `index`.
    pub fn set_formula(&mut self, index: usize, name: &str, text: &str) -> Result<(), RenderError> {
        let track = self
            .tracks
            .get_mut(index)
            .ok_or(RenderError::NoSuchTrack(index))?;
        track.set_formula(name, text)?;
        Ok(())
    }

    /// Each track's formula evaluation order, or why it has none.
    pub fn check(&self) -> Vec<Result<Vec<String>, FormulaError>> {
        self.tracks.iter().map(|t| resolve_order(t.formulas())).collect()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn track_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.tracks.get_mut(index)
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut RenderSettings {
        &mut self.settings
    }

    /// Render every track for `duration_secs` whole seconds.
    pub fn render(&self, duration_secs: f64, cancel: &CancelFlag) -> Result<MixReport, RenderError> {
        let duration_ms = render::duration_ms(duration_secs)?;
        info!(tracks = self.tracks.len(), duration_secs, "rendering session");
        render::render_all(&self.tracks, duration_ms, &self.settings, cancel)
    }

    /// Generate the notes tracks' events for `duration_secs` without rendering audio.
    pub fn notes(&self, duration_secs: f64, cancel: &CancelFlag) -> Result<NoteReport, RenderError> {
        let duration_ms = render::duration_ms(duration_secs)?;
        render::render_notes(&self.tracks, duration_ms, &self.settings, cancel)
    }
}
