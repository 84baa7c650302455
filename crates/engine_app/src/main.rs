//! # engine_app
//!
//! Runs the game headless with a scripted input sequence.
//!
//! ## Startup Sequence
//!
//! 1. Parse flags and initialise logging.
//! 2. Create the component manager instance and load textures and settings.
//! 3. Run the frame loop until the script closes the window or the frame
//!    cap is reached.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine_app::game::{FrameConfig, Game, GameOptions};
use engine_app::input::ScriptedInput;
use engine_app::surface::HeadlessSurface;

/// Frames spent on each side of the demo's steering square.
const FRAMES_PER_SIDE: usize = 120;

#[derive(Parser)]
#[command(name = "engine_app", about = "Entity-component game host")]
struct Args {
    /// Settings file holding the window configuration
    #[arg(short, long, default_value = "settings.json")]
    settings: PathBuf,

    /// Folder of .png/.jpg/.jpeg textures
    #[arg(short, long, default_value = "assets/textures")]
    textures: PathBuf,

    /// Stop after this many frames (0 = until the window closes)
    #[arg(short, long, default_value_t = 600)]
    frames: u64,

    /// Target frames per second
    #[arg(long, default_value_t = 60.0)]
    fps: f64,
}

fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("engine_app=info".parse()?))
        .init();

    let args = Args::parse();

    info!(
        settings = %args.settings.display(),
        textures = %args.textures.display(),
        "engine starting"
    );

    let options = GameOptions {
        settings_path: args.settings,
        textures_dir: args.textures,
        frame: FrameConfig {
            frame_rate: args.fps,
            max_frames: args.frames,
        },
    };

    let mut game = Game::new(
        options,
        HeadlessSurface::new(),
        ScriptedInput::square(FRAMES_PER_SIDE),
    );
    let frames = game.run()?;

    info!(
        frames,
        draws = game.surface().total_draws(),
        "engine shut down"
    );
    Ok(())
}
