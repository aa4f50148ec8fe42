//! Offline rendering: per-track grain scheduling, mixing, and limiting.

pub mod buffer;
pub mod cancel;
pub mod limiter;
pub mod mixer;
pub mod scheduler;

pub use buffer::AudioBuffer;
pub use cancel::CancelFlag;
pub use limiter::Limiter;
pub use mixer::{render_all, render_notes, MixReport, NoteReport, RenderedTrack, TrackFailure};
pub use scheduler::{render_track, GrainPlacement, TrackRender};

use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::formula::{CachePolicy, ContextMode};

/// Sample rate used when none is configured.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Knobs for one render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub sample_rate: u32,
    pub context_mode: ContextMode,
    pub cache_policy: CachePolicy,
    /// Render tracks on the rayon pool.
    pub parallel: bool,
    /// Limiter ceiling for the final mix.
    pub ceiling: f32,
    /// Length of every generated note.
    pub note_length_ms: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            context_mode: ContextMode::default(),
            cache_policy: CachePolicy::default(),
            parallel: true,
            ceiling: 1.0,
            note_length_ms: 250,
        }
    }
}

/// Convert a render duration to milliseconds. Only whole seconds >= 1 are accepted.
pub fn duration_ms(duration_secs: f64) -> Result<u64, RenderError> {
    if !duration_secs.is_finite() || duration_secs < 1.0 || duration_secs.fract() != 0.0 {
        return Err(RenderError::InvalidDuration(duration_secs));
    }
    Ok(duration_secs as u64 * 1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_seconds_only() {
        assert_eq!(duration_ms(3.0).unwrap(), 3000);
        assert!(matches!(duration_ms(0.0), Err(RenderError::InvalidDuration(_))));
        assert!(duration_ms(1.5).is_err());
        assert!(duration_ms(-2.0).is_err());
        assert!(duration_ms(f64::INFINITY).is_err());
    }

    #[test]
    fn settings_from_partial_yaml() {
        let settings: RenderSettings = serde_yaml::from_str("sample_rate: 48000\ncontext_mode: multi\n").unwrap();
        assert_eq!(settings.sample_rate, 48000);
        assert_eq!(settings.context_mode, ContextMode::Multi);
        assert!(settings.parallel);
        assert_eq!(settings.note_length_ms, 250);
    }
}
