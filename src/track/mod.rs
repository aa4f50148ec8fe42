//! Tracks: a clip collection plus the formulas that drive it.

pub mod clip;
pub mod source;
pub mod synth;

pub use clip::{Clip, ClipError};
pub use source::{ClipSource, WavFolder};
pub use synth::demo_clips;

use serde::{Deserialize, Serialize};

use crate::formula::{FormulaError, FormulaSet};
use crate::grain::FadeMode;

/// Recognized parameters of an audio track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    /// Which clip to use: `floor(value) mod clip_count`.
    Sample,
    /// Track gain multiplier, evaluated once at the end of the timeline.
    Amplitude,
    /// Gap to the next grain, in seconds.
    Rhythm,
    /// Playback-speed factor; negative plays the grain reversed.
    Stretch,
    /// Grain start, percent of clip length.
    GrainStart,
    /// Stereo position in [-1, 1].
    Panning,
    /// Grain length, percent of clip length.
    GrainDuration,
    FadeIn,
    FadeOut,
}

impl Param {
    pub const ALL: [Param; 9] = [
        Param::Sample,
        Param::Amplitude,
        Param::Rhythm,
        Param::Stretch,
        Param::GrainStart,
        Param::Panning,
        Param::GrainDuration,
        Param::FadeIn,
        Param::FadeOut,
    ];

    /// Parameter name as shown to users and stored in session files.
    pub fn name(self) -> &'static str {
        match self {
            Param::Sample => "sample",
            Param::Amplitude => "amplitude",
            Param::Rhythm => "rhythm",
            Param::Stretch => "stretch",
            Param::GrainStart => "grain start",
            Param::Panning => "panning",
            Param::GrainDuration => "grain duration",
            Param::FadeIn => "fade in",
            Param::FadeOut => "fade out",
        }
    }

    pub fn default_formula(self) -> &'static str {
        match self {
            Param::Sample => "x",
            Param::Amplitude => "0.9",
            Param::Rhythm => "(x + 5) / 10",
            Param::Stretch => "1.0",
            Param::GrainStart => "x/10%100",
            Param::Panning => "0",
            Param::GrainDuration => "100",
            Param::FadeIn => "0.5",
            Param::FadeOut => "0.5",
        }
    }
}

/// Recognized parameters of a note (symbolic) track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteParam {
    /// MIDI note number.
    Pitch,
    /// MIDI velocity; 0 skips the note.
    Velocity,
    /// Gap to the next note, in seconds.
    Rhythm,
    /// Velocity multiplier, evaluated once at the end of the timeline.
    Amplitude,
}

impl NoteParam {
    pub const ALL: [NoteParam; 4] = [
        NoteParam::Pitch,
        NoteParam::Velocity,
        NoteParam::Rhythm,
        NoteParam::Amplitude,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NoteParam::Pitch => "pitch",
            NoteParam::Velocity => "velocity",
            NoteParam::Rhythm => "rhythm",
            NoteParam::Amplitude => "amplitude",
        }
    }

    pub fn default_formula(self) -> &'static str {
        match self {
            NoteParam::Pitch => "60 + x % 12",
            NoteParam::Velocity => "100",
            NoteParam::Rhythm => "0.25",
            NoteParam::Amplitude => "1",
        }
    }
}

/// What a track produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    /// Grains of source clips.
    #[default]
    Audio,
    /// Discrete note events.
    Notes,
}

impl TrackKind {
    /// The parameter names this kind recognizes, in display order.
    pub fn param_names(self) -> Vec<&'static str> {
        match self {
            TrackKind::Audio => Param::ALL.iter().map(|p| p.name()).collect(),
            TrackKind::Notes => NoteParam::ALL.iter().map(|p| p.name()).collect(),
        }
    }

    fn default_formulas(self) -> FormulaSet {
        match self {
            TrackKind::Audio => Param::ALL
                .iter()
                .map(|p| (p.name(), p.default_formula()))
                .collect(),
            TrackKind::Notes => NoteParam::ALL
                .iter()
                .map(|p| (p.name(), p.default_formula()))
                .collect(),
        }
    }
}

/// A clip collection plus its formula set.
#[derive(Debug, Clone)]
pub struct Track {
    name: String,
    kind: TrackKind,
    clips: Vec<Clip>,
    formulas: FormulaSet,
    fade_mode: FadeMode,
}

impl Track {
    /// An audio track with the default formulas.
    pub fn audio(name: impl Into<String>, clips: Vec<Clip>) -> Self {
        Self {
            name: name.into(),
            kind: TrackKind::Audio,
            clips,
            formulas: TrackKind::Audio.default_formulas(),
            fade_mode: FadeMode::default(),
        }
    }

    /// A note track with the default formulas. Note tracks carry no clips.
    pub fn notes(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TrackKind::Notes,
            clips: Vec::new(),
            formulas: TrackKind::Notes.default_formulas(),
            fade_mode: FadeMode::default(),
        }
    }

    /// An audio track loaded from a clip source, named after it.
    pub fn from_source(source: &dyn ClipSource, sample_rate: u32) -> Result<Self, ClipError> {
        Ok(Self::audio(source.label(), source.load(sample_rate)?))
    }

    pub fn with_fade_mode(mut self, fade_mode: FadeMode) -> Self {
        self.fade_mode = fade_mode;
        self
    }

    /// Replace the formula for a recognized parameter.
    pub fn set_formula(&mut self, name: &str, text: &str) -> Result<(), FormulaError> {
        if !self.kind.param_names().iter().any(|p| *p == name) {
            return Err(FormulaError::unknown_parameter(name));
        }
        self.formulas.set(name, text.trim());
        Ok(())
    }

    pub fn formula(&self, name: &str) -> Option<&str> {
        self.formulas.get(name)
    }

    pub fn formulas(&self) -> &FormulaSet {
        &self.formulas
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn fade_mode(&self) -> FadeMode {
        self.fade_mode
    }

    pub fn set_fade_mode(&mut self, fade_mode: FadeMode) {
        self.fade_mode = fade_mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::ErrorKind;

    #[test]
    fn audio_defaults() {
        let track = Track::audio("drums", vec![]);
        assert_eq!(track.formulas().len(), 9);
        assert_eq!(track.formula("rhythm"), Some("(x + 5) / 10"));
        assert_eq!(track.formula("grain start"), Some("x/10%100"));
        assert_eq!(track.fade_mode(), FadeMode::Seconds);
    }

    #[test]
    fn note_defaults() {
        let track = Track::notes("lead");
        assert_eq!(track.kind(), TrackKind::Notes);
        assert_eq!(track.formula("pitch"), Some("60 + x % 12"));
        assert!(track.formula("grain start").is_none());
    }

    #[test]
    fn set_formula_replaces_text() {
        let mut track = Track::audio("a", vec![]);
        track.set_formula("panning", "  sin(x) ").unwrap();
        assert_eq!(track.formula("panning"), Some("sin(x)"));
    }

    #[test]
    fn unknown_parameter_rejected() {
        let mut track = Track::audio("a", vec![]);
        let err = track.set_formula("pitch", "60").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownParameter("pitch".into()));
    }

    #[test]
    fn from_in_memory_source() {
        let clips = vec![Clip::from_mono(vec![0.0; 10], 44100)];
        let track = Track::from_source(&clips, 44100).unwrap();
        assert_eq!(track.name(), "1 clips");
        assert_eq!(track.clips().len(), 1);
    }

    #[test]
    fn param_names_per_kind() {
        assert_eq!(TrackKind::Audio.param_names().len(), 9);
        assert_eq!(
            TrackKind::Notes.param_names(),
            vec!["pitch", "velocity", "rhythm", "amplitude"]
        );
    }
}
