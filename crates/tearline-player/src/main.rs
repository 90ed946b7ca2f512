//! Tearline Player - plays the card reveal in a native window
//!
//! Usage:
//!   tearline-player [--config <session.toml>] [--log-level <filter>] [--fullscreen]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tearline_player::PlayerApp;
use tearline_sequencer::SessionConfig;
use tracing::{info, warn};
use winit::event_loop::{ControlFlow, EventLoop};

#[derive(Parser)]
#[command(name = "tearline-player")]
#[command(about = "Play the card appear, tear and reveal sequence")]
struct Args {
    /// Session configuration file
    #[arg(long, default_value = "tearline.toml")]
    config: PathBuf,

    /// Log filter (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Launch in fullscreen mode
    #[arg(long)]
    fullscreen: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = if args.config.exists() {
        SessionConfig::load(&args.config)
            .with_context(|| format!("Failed to load config {}", args.config.display()))?
    } else {
        warn!("Config {} not found, using defaults", args.config.display());
        SessionConfig::default()
    };

    info!("Card image: {}", config.assets.card_image.display());
    info!("Card model: {}", config.assets.model.display());
    info!("Controls: click the glowing ring to tear, click the card to flip, R to replay, Esc to quit");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = PlayerApp::new(config, args.fullscreen);
    event_loop.run_app(&mut app)?;

    Ok(())
}

fn init_logging(default_filter: &str) {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();
}
