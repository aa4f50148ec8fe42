//! Configuration: `~/.deining/config.yaml` plus YAML session files.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::export::ExportOptions;
use crate::formula::FormulaError;
use crate::grain::FadeMode;
use crate::render::RenderSettings;
use crate::session::Session;
use crate::track::{demo_clips, ClipError, Track, TrackKind, WavFolder};

/// Errors that can occur loading or saving configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    /// A track's clips could not be loaded.
    Clip { track: String, error: ClipError },
    /// A track's formula override was rejected.
    Formula { track: String, error: FormulaError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "I/O error: {e}"),
            ConfigError::Yaml(e) => write!(f, "YAML error: {e}"),
            ConfigError::Clip { track, error } => write!(f, "track '{track}': {error}"),
            ConfigError::Formula { track, error } => write!(f, "track '{track}': {error}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Yaml(e)
    }
}

/// User configuration loaded from `~/.deining/config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: RenderSettings,
    pub export: ExportOptions,
    /// Seed for the synthetic demo clips.
    pub demo_seed: u64,
}

/// Default path for the user configuration.
pub fn default_config_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".deining");
    path.push("config.yaml");
    path
}

impl Config {
    /// Load from the default path, falling back to defaults when it is missing or invalid.
    pub fn load() -> Self {
        let path = default_config_path();
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable config");
                Self::default()
            }
        }
    }

    /// Load from `path`. A missing file gives the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        write_yaml(path, self)
    }
}

/// One track in a session file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackEntry {
    /// Display name; defaults to the folder name.
    pub name: Option<String>,
    /// Folder of `*.wav` clips, relative to the session file. Audio tracks
    /// without a path use the demo clips.
    pub path: Option<PathBuf>,
    pub kind: TrackKind,
    pub fade_mode: FadeMode,
    /// Formula overrides by parameter name.
    pub formulas: BTreeMap<String, String>,
}

/// A saved session: tracks and optional render settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionFile {
    pub tracks: Vec<TrackEntry>,
    /// Overrides the user configuration's render settings.
    pub render: Option<RenderSettings>,
}

impl SessionFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        write_yaml(path, self)
    }

    /// Build a session, loading clips relative to `base_dir`.
    pub fn into_session(&self, config: &Config, base_dir: &Path) -> Result<Session, ConfigError> {
        let settings = self.render.clone().unwrap_or_else(|| config.render.clone());
        let sample_rate = settings.sample_rate;
        let mut session = Session::new(settings);

        for (i, entry) in self.tracks.iter().enumerate() {
            let label = entry.name.clone().unwrap_or_else(|| format!("track {i}"));
            let mut track = match (entry.kind, &entry.path) {
                (TrackKind::Notes, _) => Track::notes(label.clone()),
                (TrackKind::Audio, Some(path)) => {
                    let folder = WavFolder::new(base_dir.join(path));
                    let track = Track::from_source(&folder, sample_rate).map_err(|error| {
                        ConfigError::Clip {
                            track: label.clone(),
                            error,
                        }
                    })?;
                    match &entry.name {
                        Some(name) => Track::audio(name.clone(), track.clips().to_vec()),
                        None => track,
                    }
                }
                (TrackKind::Audio, None) => {
                    Track::audio(label.clone(), demo_clips(sample_rate, config.demo_seed))
                }
            };
            track.set_fade_mode(entry.fade_mode);
            for (name, text) in &entry.formulas {
                track
                    .set_formula(name, text)
                    .map_err(|error| ConfigError::Formula {
                        track: label.clone(),
                        error,
                    })?;
            }
            session.add_track(track);
        }
        Ok(session)
    }
}

fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let yaml = serde_yaml::to_string(value)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::ContextMode;

    #[test]
    fn missing_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("none.yaml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_config() {
        let config: Config = serde_yaml::from_str(
            "render:\n  context_mode: multi\nexport:\n  sample_rate: 48000\ndemo_seed: 9\n",
        )
        .unwrap();
        assert_eq!(config.render.context_mode, ContextMode::Multi);
        assert_eq!(config.render.sample_rate, 44100);
        assert_eq!(config.export.sample_rate, 48000);
        assert_eq!(config.demo_seed, 9);
    }

    #[test]
    fn save_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("config.yaml");
        let mut config = Config::default();
        config.render.parallel = false;
        config.save(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn invalid_yaml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "render: [unclosed").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn session_file_builds_demo_and_note_tracks() {
        let file: SessionFile = serde_yaml::from_str(
            r#"
tracks:
  - name: grains
    fade_mode: percent
    formulas:
      rhythm: "0.5"
  - name: lead
    kind: notes
"#,
        )
        .unwrap();
        let session = file
            .into_session(&Config::default(), Path::new("."))
            .unwrap();
        assert_eq!(session.tracks().len(), 2);
        let grains = &session.tracks()[0];
        assert_eq!(grains.fade_mode(), FadeMode::Percent);
        assert_eq!(grains.formula("rhythm"), Some("0.5"));
        assert!(!grains.clips().is_empty());
        assert_eq!(session.tracks()[1].kind(), TrackKind::Notes);
    }

    #[test]
    fn unknown_parameter_names_track() {
        let file: SessionFile =
            serde_yaml::from_str("tracks:\n  - name: lead\n    kind: notes\n    formulas:\n      stretch: \"2\"\n")
                .unwrap();
        match file.into_session(&Config::default(), Path::new(".")) {
            Err(ConfigError::Formula { track, .. }) => assert_eq!(track, "lead"),
            other => panic!("expected formula error, got {other:?}"),
        }
    }
}
