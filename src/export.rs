//! Export sinks: write a rendered mix to disk.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::render::AudioBuffer;
use crate::track::clip::resample_linear;

/// Sample rates an export may request.
pub const SAMPLE_RATES: [u32; 4] = [22050, 44100, 48000, 96000];

/// Bitrates for lossy formats.
pub const BITRATES: [&str; 5] = ["64k", "128k", "192k", "256k", "320k"];

/// Errors that can occur while exporting.
#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Wav(hound::Error),
    /// No encoder for this container.
    UnsupportedFormat(ExportFormat),
    /// An option outside its allowed set.
    InvalidOption(String),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "I/O error: {e}"),
            ExportError::Wav(e) => write!(f, "WAV error: {e}"),
            ExportError::UnsupportedFormat(format) => {
                write!(f, "no encoder available for {format}")
            }
            ExportError::InvalidOption(msg) => write!(f, "invalid export option: {msg}"),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::Io(e)
    }
}

impl From<hound::Error> for ExportError {
    fn from(e: hound::Error) -> Self {
        ExportError::Wav(e)
    }
}

/// Output container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Wav,
    Mp3,
    Flac,
    Ogg,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Wav => "wav",
            ExportFormat::Mp3 => "mp3",
            ExportFormat::Flac => "flac",
            ExportFormat::Ogg => "ogg",
        }
    }

    /// Whether the bitrate option applies.
    pub fn is_lossy(self) -> bool {
        matches!(self, ExportFormat::Mp3 | ExportFormat::Ogg)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wav" => Ok(ExportFormat::Wav),
            "mp3" => Ok(ExportFormat::Mp3),
            "flac" => Ok(ExportFormat::Flac),
            "ogg" => Ok(ExportFormat::Ogg),
            other => Err(ExportError::InvalidOption(format!("unknown format '{other}'"))),
        }
    }
}

/// Where and how to write an export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub bitrate: String,
    pub sample_rate: u32,
    pub directory: PathBuf,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Wav,
            bitrate: "128k".to_string(),
            sample_rate: 44100,
            directory: PathBuf::from("exports"),
        }
    }
}

impl ExportOptions {
    /// Check the rate and bitrate against their allowed sets. The bitrate is
    /// only checked for lossy formats.
    pub fn validate(&self) -> Result<(), ExportError> {
        if !SAMPLE_RATES.contains(&self.sample_rate) {
            return Err(ExportError::InvalidOption(format!(
                "sample rate {} (expected one of {SAMPLE_RATES:?})",
                self.sample_rate
            )));
        }
        if self.format.is_lossy() && !BITRATES.contains(&self.bitrate.as_str()) {
            return Err(ExportError::InvalidOption(format!(
                "bitrate '{}' (expected one of {BITRATES:?})",
                self.bitrate
            )));
        }
        Ok(())
    }
}

/// `combined_output_<YYYYmmdd_HHMMSS>.<ext>`
pub fn output_file_name(timestamp: &DateTime<Local>, format: ExportFormat) -> String {
    format!(
        "combined_output_{}.{}",
        timestamp.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Something that can persist a rendered mix.
pub trait ExportSink {
    /// Write `buffer`, returning the path written.
    fn export(&self, buffer: &AudioBuffer, options: &ExportOptions) -> Result<PathBuf, ExportError>;
}

/// 16-bit PCM WAV via hound.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavExporter;

impl ExportSink for WavExporter {
    fn export(&self, buffer: &AudioBuffer, options: &ExportOptions) -> Result<PathBuf, ExportError> {
        options.validate()?;
        if options.format != ExportFormat::Wav {
            return Err(ExportError::UnsupportedFormat(options.format));
        }

        std::fs::create_dir_all(&options.directory)?;
        let path = options
            .directory
            .join(output_file_name(&Local::now(), options.format));
        write_wav(&path, buffer, options.sample_rate)?;

        info!(path = %path.display(), frames = buffer.frames(), "exported mix");
        Ok(path)
    }
}

/// Write `buffer` as 16-bit stereo WAV at `sample_rate`, resampling if needed.
pub fn write_wav(path: &Path, buffer: &AudioBuffer, sample_rate: u32) -> Result<(), ExportError> {
    let samples = if sample_rate == buffer.sample_rate() || buffer.sample_rate() == 0 {
        buffer.samples().to_vec()
    } else {
        let ratio = buffer.sample_rate() as f64 / sample_rate as f64;
        resample_linear(buffer.samples(), 2, ratio)
    };

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for s in samples {
        writer.write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn file_name_uses_timestamp() {
        let ts = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            output_file_name(&ts, ExportFormat::Wav),
            "combined_output_20240309_140507.wav"
        );
    }

    #[test]
    fn format_parsing() {
        assert_eq!("WAV".parse::<ExportFormat>().unwrap(), ExportFormat::Wav);
        assert_eq!("ogg".parse::<ExportFormat>().unwrap(), ExportFormat::Ogg);
        assert!("aiff".parse::<ExportFormat>().is_err());
        assert!(ExportFormat::Mp3.is_lossy());
        assert!(!ExportFormat::Flac.is_lossy());
    }

    #[test]
    fn options_validation() {
        assert!(ExportOptions::default().validate().is_ok());
        let bad_rate = ExportOptions {
            sample_rate: 12345,
            ..ExportOptions::default()
        };
        assert!(matches!(bad_rate.validate(), Err(ExportError::InvalidOption(_))));
        let bad_bitrate = ExportOptions {
            format: ExportFormat::Mp3,
            bitrate: "96k".into(),
            ..ExportOptions::default()
        };
        assert!(bad_bitrate.validate().is_err());
    }

    #[test]
    fn bitrate_ignored_for_lossless() {
        let wav = ExportOptions {
            bitrate: "999k".into(),
            ..ExportOptions::default()
        };
        assert!(wav.validate().is_ok());
        let flac = ExportOptions {
            format: ExportFormat::Flac,
            ..wav
        };
        assert!(flac.validate().is_ok());
    }

    #[test]
    fn writes_wav_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions {
            directory: dir.path().join("nested"),
            ..ExportOptions::default()
        };
        let buffer = AudioBuffer::from_interleaved(vec![0.5; 200], 44100);
        let path = WavExporter.export(&buffer, &options).unwrap();
        assert!(path.starts_with(dir.path().join("nested")));

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().bits_per_sample, 16);
        assert_eq!(reader.len(), 200);
    }

    #[test]
    fn resamples_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let buffer = AudioBuffer::from_interleaved(vec![0.0; 2000], 44100);
        write_wav(&path, &buffer, 22050).unwrap();
        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 22050);
        assert_eq!(reader.duration(), 500);
    }

    #[test]
    fn lossy_formats_are_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions {
            format: ExportFormat::Mp3,
            directory: dir.path().to_path_buf(),
            ..ExportOptions::default()
        };
        let buffer = AudioBuffer::silent(1000, 44100);
        assert!(matches!(
            WavExporter.export(&buffer, &options),
            Err(ExportError::UnsupportedFormat(ExportFormat::Mp3))
        ));
    }
}
