use std::{cell::Cell, f32::consts::PI, path::PathBuf, rc::Rc};

use city_groove_core::{AppConfig, BeatEvent, LightingEngine, SpectrumAnalyzer};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

fn main() -> city_groove_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            preset,
            seconds,
            bpm,
            fps,
            json,
        } => run_simulate(preset.as_ref(), seconds, bpm, fps, json),
        Commands::Config { preset } => run_config(preset.as_ref()),
    }
}

fn load_config(preset: Option<&PathBuf>) -> city_groove_core::Result<AppConfig> {
    match preset {
        Some(path) => {
            tracing::info!(?path, "loading preset");
            AppConfig::load(path)
        }
        None => Ok(AppConfig::default()),
    }
}

fn run_simulate(
    preset: Option<&PathBuf>,
    seconds: f32,
    bpm: f32,
    fps: f32,
    json: bool,
) -> city_groove_core::Result<()> {
    validate_simulation(seconds, bpm, fps)?;

    let config = load_config(preset)?;
    let mut engine = LightingEngine::new(config)?;
    let sample_rate = engine.config().audio.sample_rate;
    let mut analyzer = SpectrumAnalyzer::new(engine.bins(), engine.config().band.window)?;

    let beats = Rc::new(Cell::new(0_usize));
    let counter = beats.clone();
    engine.add_listener(move |event: &BeatEvent| {
        counter.set(counter.get() + 1);
        tracing::info!(timestamp = event.timestamp, score = event.score, "beat");
    });

    tracing::info!(sample_rate, bpm, fps, seconds, "starting simulation");

    let signal = SyntheticTrack::new(bpm);
    let dt = 1.0 / fps;
    let ticks = (seconds * fps).round() as usize;
    let block_size = analyzer.block_size();
    let mut block = vec![0.0_f32; block_size];
    let mut state = engine.initial_state();

    for tick in 1..=ticks {
        let end = tick as f32 * dt;
        for (index, sample) in block.iter_mut().enumerate() {
            let offset = (block_size - index) as f32 / sample_rate;
            *sample = signal.sample(end - offset);
        }

        let spectrum = analyzer.process(&block)?;
        let output = engine.advance(spectrum, dt, &mut state)?;
        if json {
            println!("{}", serde_json::to_string(&output)?);
        }
    }

    let expected = (seconds * bpm / 60.0).floor() as usize;
    tracing::info!(beats = beats.get(), expected, "simulation finished");
    Ok(())
}

fn validate_simulation(seconds: f32, bpm: f32, fps: f32) -> city_groove_core::Result<()> {
    let finite = seconds.is_finite() && bpm.is_finite() && fps.is_finite();
    if !(finite && fps > 0.0 && bpm > 0.0 && seconds >= 0.0) {
        return Err(city_groove_core::CityGrooveError::msg(
            "fps and bpm must be finite and positive, seconds finite and non-negative",
        ));
    }
    Ok(())
}

fn run_config(preset: Option<&PathBuf>) -> city_groove_core::Result<()> {
    let config = load_config(preset)?.validated()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Kick drum on every beat and a hi-hat on every off-beat.
struct SyntheticTrack {
    beat_period: f32,
}

impl SyntheticTrack {
    fn new(bpm: f32) -> Self {
        Self {
            beat_period: 60.0 / bpm,
        }
    }

    fn sample(&self, time: f32) -> f32 {
        if time < 0.0 {
            return 0.0;
        }

        let since_kick = time % self.beat_period;
        let kick_pitch = 50.0 + 70.0 * (-since_kick * 30.0).exp();
        let kick = (2.0 * PI * kick_pitch * since_kick).sin() * (-since_kick * 12.0).exp();

        let since_hat = (time + self.beat_period * 0.5) % self.beat_period;
        let hat_envelope = (-since_hat * 60.0).exp();
        let hat = ((2.0 * PI * 7_000.0 * time).sin() + (2.0 * PI * 9_300.0 * time).sin())
            * 0.1
            * hat_envelope;

        0.8 * kick + hat
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Audio-reactive lighting engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Drive the engine with a synthesized beat and report what it detects.
    Simulate {
        /// Optional JSON preset to load on startup.
        #[arg(short, long)]
        preset: Option<PathBuf>,
        /// Length of the simulated track in seconds.
        #[arg(long, default_value_t = 8.0)]
        seconds: f32,
        /// Tempo of the synthesized kick drum.
        #[arg(long, default_value_t = 120.0)]
        bpm: f32,
        /// Ticks per second.
        #[arg(long, default_value_t = 60.0)]
        fps: f32,
        /// Print every tick as a JSON line on stdout.
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as JSON.
    Config {
        /// Optional JSON preset to merge over the defaults.
        #[arg(short, long)]
        preset: Option<PathBuf>,
    },
}
