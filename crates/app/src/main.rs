use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use particle_canvas_core::{
    shapes::DEFAULT_EMOJI_FONT, AssetStore, BlankRasterizer, Container, EngineConfig,
    RecordingSurface,
};
use tracing_subscriber::EnvFilter;

fn main() -> particle_canvas_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            config,
            frames,
            fps,
        } => run_simulate(config.as_deref(), frames, fps),
        Commands::Defaults => print_defaults(),
    }
}

fn run_simulate(config: Option<&Path>, frames: u64, fps: f32) -> particle_canvas_core::Result<()> {
    let config = match config {
        Some(path) => {
            tracing::info!(?path, "loading configuration");
            EngineConfig::from_path(path)?
        }
        None => EngineConfig::default(),
    };
    if !(fps > 0.0) {
        return Err(particle_canvas_core::ParticleError::msg(format!(
            "fps must be positive, got {fps}"
        )));
    }

    let mut assets = AssetStore::with_rasterizer(Box::new(BlankRasterizer));
    for family in DEFAULT_EMOJI_FONT.split(',') {
        assets.register_font(family);
    }

    let mut container = Container::with_defaults(config, assets)?;
    container.start()?;
    tracing::info!(frames, fps, particles = container.particles().len(), "simulating");

    let mut surface = RecordingSurface::new();
    let elapsed = 1.0 / fps;
    for _ in 0..frames {
        let stats = container.tick(elapsed, &mut surface);
        let commands = surface.finish_frame();
        tracing::debug!(
            frame = stats.frame,
            particles = stats.particles,
            drawn = stats.drawn,
            attracted = stats.attracted,
            respawned = stats.respawned,
            destroyed = stats.destroyed,
            commands,
            "frame"
        );
    }

    container.stop();
    tracing::info!(
        frames = surface.frames(),
        released_bitmaps = container.assets().released_bitmaps(),
        "simulation finished"
    );
    Ok(())
}

fn print_defaults() -> particle_canvas_core::Result<()> {
    println!("{}", EngineConfig::default().to_json_pretty()?);
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless particle animation engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the simulation against a recording surface and log frame statistics.
    Simulate {
        /// JSON configuration file; defaults are used when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of frames to run.
        #[arg(short, long, default_value_t = 600)]
        frames: u64,
        /// Simulated frame rate.
        #[arg(long, default_value_t = 60.0)]
        fps: f32,
    },
    /// Print the default configuration as JSON.
    Defaults,
}
