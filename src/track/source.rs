//! Clip providers: where a track's source clips come from.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::clip::{Clip, ClipError};

/// Supplies an ordered list of decoded clips.
pub trait ClipSource {
    fn load(&self, sample_rate: u32) -> Result<Vec<Clip>, ClipError>;

    /// A short label for logs and track names.
    fn label(&self) -> String;
}

/// Every `*.wav` file directly inside a directory, ordered by file name.
#[derive(Debug, Clone, PartialEq)]
pub struct WavFolder {
    path: PathBuf,
}

impl WavFolder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Paths of the WAV files that would be loaded, sorted.
    pub fn scan(&self) -> Result<Vec<PathBuf>, ClipError> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.path)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_wav(p))
            .collect();
        paths.sort();
        Ok(paths)
    }
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
}

impl ClipSource for WavFolder {
    fn load(&self, sample_rate: u32) -> Result<Vec<Clip>, ClipError> {
        let mut clips = Vec::new();
        for path in self.scan()? {
            let reader = BufReader::new(File::open(&path)?);
            match Clip::from_wav(reader, sample_rate) {
                Ok(clip) => {
                    debug!(path = %path.display(), frames = clip.frames(), "loaded clip");
                    clips.push(clip);
                }
                Err(ClipError::Empty) => {
                    warn!(path = %path.display(), "skipping empty clip");
                }
                Err(e) => return Err(e),
            }
        }
        if clips.is_empty() {
            return Err(ClipError::NoClips(self.path.clone()));
        }
        Ok(clips)
    }

    fn label(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Already-decoded clips, resampled on load.
impl ClipSource for Vec<Clip> {
    fn load(&self, sample_rate: u32) -> Result<Vec<Clip>, ClipError> {
        Ok(self.iter().map(|c| c.resampled(sample_rate)).collect())
    }

    fn label(&self) -> String {
        format!("{} clips", self.len())
    }
}
