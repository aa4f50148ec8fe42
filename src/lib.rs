//! Deining: a formula-driven granular synthesis engine.
//!
//! Each track draws grains from a set of clips. Every grain parameter is a
//! formula over time `x` (seconds) and the track's other parameters,
//! evaluated at each grain onset.

pub mod config;
pub mod error;
pub mod export;
pub mod formula;
pub mod grain;
pub mod notes;
pub mod render;
pub mod session;
pub mod track;

pub use error::RenderError;
pub use session::Session;
