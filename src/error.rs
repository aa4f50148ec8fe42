//! Errors raised while rendering a session.

use std::fmt;

use crate::formula::FormulaError;
use crate::track::ClipError;

/// Why a render (or one track of it) failed.
#[derive(Debug)]
pub enum RenderError {
    /// A formula could not be resolved or evaluated.
    Formula(FormulaError),
    /// An audio track has no clips to draw grains from.
    EmptySource,
    /// Clips could not be loaded.
    Clip(ClipError),
    /// The render was cancelled between grains.
    Cancelled,
    /// Durations are whole seconds, at least one.
    InvalidDuration(f64),
    /// A track index outside the session.
    NoSuchTrack(usize),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Formula(e) => write!(f, "formula error: {e}"),
            RenderError::EmptySource => write!(f, "track has no source clips"),
            RenderError::Clip(e) => write!(f, "clip error: {e}"),
            RenderError::Cancelled => write!(f, "render cancelled"),
            RenderError::InvalidDuration(secs) => {
                write!(f, "invalid duration {secs}: expected a whole number of seconds >= 1")
            }
            RenderError::NoSuchTrack(index) => write!(f, "no track at index {index}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Formula(e) => Some(e),
            RenderError::Clip(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FormulaError> for RenderError {
    fn from(e: FormulaError) -> Self {
        RenderError::Formula(e)
    }
}

impl From<ClipError> for RenderError {
    fn from(e: ClipError) -> Self {
        RenderError::Clip(e)
    }
}
