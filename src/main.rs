//! Deining CLI: render formula-driven granular sessions to WAV.

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use deining::config::{Config, SessionFile};
use deining::export::{ExportFormat, ExportOptions, ExportSink, WavExporter};
use deining::formula::ContextMode;
use deining::render::CancelFlag;
use deining::track::{demo_clips, Track, WavFolder};
use deining::Session;

#[derive(Parser)]
#[command(name = "deining")]
#[command(about = "Formula-driven granular synthesis", version)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.deining/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct Sources {
    /// Session file (YAML)
    #[arg(short, long, conflicts_with_all = ["track", "demo"])]
    session: Option<PathBuf>,

    /// Folder of WAV clips; repeat for more tracks
    #[arg(short, long)]
    track: Vec<PathBuf>,

    /// Add a track of synthetic demo clips
    #[arg(long)]
    demo: bool,

    /// Evaluate formulas with every track's values visible
    #[arg(long)]
    multi: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the session and export the mix
    Render {
        #[command(flatten)]
        sources: Sources,

        /// Duration in whole seconds
        #[arg(short, long, default_value = "10")]
        duration: f64,

        /// Output format (wav, mp3, flac, ogg)
        #[arg(short, long)]
        format: Option<ExportFormat>,

        /// Bitrate for lossy formats
        #[arg(short, long)]
        bitrate: Option<String>,

        /// Export sample rate
        #[arg(long)]
        sample_rate: Option<u32>,

        /// Output directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Generate note events from notes tracks and print them
    Notes {
        #[command(flatten)]
        sources: Sources,

        /// Duration in whole seconds
        #[arg(short, long, default_value = "10")]
        duration: f64,

        /// Print JSON instead of YAML
        #[arg(long)]
        json: bool,
    },
    /// Print each track's formula evaluation order
    Check {
        #[command(flatten)]
        sources: Sources,
    },
}

fn build_session(sources: &Sources, config: &Config) -> Result<Session, Box<dyn Error>> {
    let mut session = match &sources.session {
        Some(path) => {
            let base = path.parent().unwrap_or(Path::new("."));
            SessionFile::load(path)?.into_session(config, base)?
        }
        None => {
            let mut session = Session::new(config.render.clone());
            let sample_rate = config.render.sample_rate;
            for folder in &sources.track {
                session.add_track(Track::from_source(&WavFolder::new(folder), sample_rate)?);
            }
            if sources.demo || sources.track.is_empty() {
                session.add_track(Track::audio("demo", demo_clips(sample_rate, config.demo_seed)));
            }
            session
        }
    };
    if sources.multi {
        session.settings_mut().context_mode = ContextMode::Multi;
    }
    Ok(session)
}

fn install_cancel_handler() -> CancelFlag {
    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_flag.cancel()) {
        warn!(error = %e, "could not install Ctrl-C handler");
    }
    cancel
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    match cli.command {
        Commands::Render {
            sources,
            duration,
            format,
            bitrate,
            sample_rate,
            out,
        } => {
            let session = build_session(&sources, &config)?;
            let cancel = install_cancel_handler();
            let report = session.render(duration, &cancel)?;
            for failure in &report.failures {
                eprintln!("track {} ({}): {}", failure.index, failure.name, failure.error);
            }

            let defaults = config.export.clone();
            let options = ExportOptions {
                format: format.unwrap_or(defaults.format),
                bitrate: bitrate.unwrap_or(defaults.bitrate),
                sample_rate: sample_rate.unwrap_or(defaults.sample_rate),
                directory: out.unwrap_or(defaults.directory),
            };
            let path = WavExporter.export(&report.buffer, &options)?;
            info!(peak = report.buffer.peak(), "done");
            println!("{}", path.display());
        }
        Commands::Notes {
            sources,
            duration,
            json,
        } => {
            let session = build_session(&sources, &config)?;
            let cancel = install_cancel_handler();
            let report = session.notes(duration, &cancel)?;
            for failure in &report.failures {
                eprintln!("track {} ({}): {}", failure.index, failure.name, failure.error);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&report.notes)?);
            } else {
                print!("{}", serde_yaml::to_string(&report.notes)?);
            }
        }
        Commands::Check { sources } => {
            let session = build_session(&sources, &config)?;
            for (i, (track, result)) in session.tracks().iter().zip(session.check()).enumerate() {
                match result {
                    Ok(order) => println!("{i} {}: {}", track.name(), order.join(" -> ")),
                    Err(e) => println!("{i} {}: {e}", track.name()),
                }
            }
        }
    }

    Ok(())
}
