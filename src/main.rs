//! Nebula viewer.
//!
//! ```text
//! nebula --template saturn --color '#f472b6'
//! nebula --hands orbit --particles 20000
//! nebula --hands replay --recording session.jsonl
//! nebula --shape halo.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use nebula::{
    spawn_hand_source, Config, HandInput, OrbitHands, ReplayHands, ResponseFile, Rgb, Simulation,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Where hand positions come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum HandMode {
    /// Mouse cursor is the right hand, left button pinches, Shift adds a mirrored left hand.
    Pointer,
    /// Scripted hands circling the cloud.
    Orbit,
    /// Snapshots replayed from a JSON-lines recording.
    Replay,
}

/// Hand-driven particle cloud.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON config file. Values given on the command line override it.
    #[arg(short('c'), long)]
    config: Option<PathBuf>,

    /// Number of particles.
    #[arg(short('n'), long)]
    particles: Option<usize>,

    /// Starting built-in template id (heart, saturn, flowers, fireworks, sphere, spiral).
    #[arg(short('t'), long)]
    template: Option<String>,

    /// Particle color as #rrggbb.
    #[arg(long)]
    color: Option<Rgb>,

    /// Saved text-to-shape response to show instead of the starting template.
    #[arg(long)]
    shape: Option<PathBuf>,

    /// Hand input.
    #[arg(long, value_enum, default_value_t = HandMode::Pointer)]
    hands: HandMode,

    /// Recording for `--hands replay`.
    #[arg(long, required_if_eq("hands", "replay"))]
    recording: Option<PathBuf>,

    /// Seed for a reproducible initial cloud.
    #[arg(long)]
    seed: Option<u64>,

    /// Write the effective configuration to this path and continue.
    #[arg(long)]
    save_config: Option<PathBuf>,
}

fn build_config(args: &Args) -> Result<Config, nebula::ConfigError> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(n) = args.particles {
        config.particle_count = n;
    }
    if let Some(template) = &args.template {
        config.template = template.clone();
    }
    if let Some(color) = args.color {
        config.color = color;
    }
    config.validate()?;
    Ok(config)
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&args)?;
    if let Some(path) = &args.save_config {
        config.save(path)?;
        info!(path = %path.display(), "Saved configuration");
    }

    let mut simulation = match args.seed {
        Some(seed) => Simulation::with_seed(&config, seed)?,
        None => Simulation::new(&config)?,
    };

    if let Some(path) = &args.shape {
        let prompt = path.display().to_string();
        simulation.request_shape(&ResponseFile::new(path), &prompt);
    }

    let hands = match (args.hands, args.recording) {
        (HandMode::Pointer, _) => HandInput::Pointer,
        (HandMode::Orbit, _) => HandInput::Feed(spawn_hand_source(OrbitHands::default())),
        (HandMode::Replay, Some(path)) => {
            HandInput::Feed(spawn_hand_source(ReplayHands::new(path)))
        }
        (HandMode::Replay, None) => return Err("--hands replay needs --recording <file>".into()),
    };

    nebula::run(config, simulation, hands)?;
    Ok(())
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
