//! Session file integration tests: YAML on disk → clips → render → export.

use std::path::Path;

use assert_approx_eq::assert_approx_eq;

use deining::config::{Config, SessionFile, TrackEntry};
use deining::export::{ExportOptions, ExportSink, WavExporter};
use deining::grain::FadeMode;
use deining::render::CancelFlag;
use deining::track::TrackKind;

fn write_clip(path: &Path, level: f32, frames: usize) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 22050,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..frames {
        writer.write_sample((level * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn session_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions").join("set.yaml");

    let mut entry = TrackEntry {
        name: Some("texture".into()),
        path: Some("clips".into()),
        fade_mode: FadeMode::Percent,
        ..TrackEntry::default()
    };
    entry.formulas.insert("panning".into(), "sin(x)".into());
    let file = SessionFile {
        tracks: vec![
            entry,
            TrackEntry {
                kind: TrackKind::Notes,
                ..TrackEntry::default()
            },
        ],
        render: None,
    };

    file.save(&path).unwrap();
    assert_eq!(SessionFile::load(&path).unwrap(), file);
}

#[test]
fn folder_tracks_load_and_render() {
    let dir = tempfile::tempdir().unwrap();
    let clips = dir.path().join("clips");
    std::fs::create_dir_all(&clips).unwrap();
    write_clip(&clips.join("01.wav"), 0.5, 22050);
    write_clip(&clips.join("02.wav"), 0.25, 11025);

    let session_path = dir.path().join("set.yaml");
    std::fs::write(
        &session_path,
        r#"
tracks:
  - path: clips
    formulas:
      rhythm: "1"
      sample: "x"
      amplitude: "1"
"#,
    )
    .unwrap();

    let file = SessionFile::load(&session_path).unwrap();
    let session = file.into_session(&Config::default(), dir.path()).unwrap();
    let track = &session.tracks()[0];
    assert_eq!(track.name(), "clips");
    assert_eq!(track.clips().len(), 2);
    // Resampled from 22050 to the default 44100.
    assert_eq!(track.clips()[0].frames(), 44100);

    let report = session.render(2.0, &CancelFlag::new()).unwrap();
    let clip_order: Vec<usize> = report.rendered[0]
        .placements
        .iter()
        .map(|p| p.clip_index)
        .collect();
    assert_eq!(clip_order, vec![0, 1]);
    assert_approx_eq!(report.rendered[0].gain_db, 0.0, 1e-12);

    let options = ExportOptions {
        directory: dir.path().join("exports"),
        ..ExportOptions::default()
    };
    let out = WavExporter.export(&report.buffer, &options).unwrap();
    let name = out.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("combined_output_"));
    assert!(name.ends_with(".wav"));

    let reader = hound::WavReader::open(&out).unwrap();
    assert_eq!(reader.duration(), 88200);
}

#[test]
fn session_render_settings_override_config() {
    let file: SessionFile =
        serde_yaml::from_str("render:\n  sample_rate: 22050\ntracks:\n  - name: demo\n").unwrap();
    let session = file.into_session(&Config::default(), Path::new(".")).unwrap();
    assert_eq!(session.settings().sample_rate, 22050);
    assert_eq!(session.tracks()[0].clips()[0].sample_rate(), 22050);
}

#[test]
fn missing_clip_folder_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let file: SessionFile =
        serde_yaml::from_str("tracks:\n  - name: gone\n    path: nowhere\n").unwrap();
    let err = file.into_session(&Config::default(), dir.path()).unwrap_err();
    assert!(err.to_string().contains("gone"));
}
