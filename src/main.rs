mod app;
mod host;
mod pet;
mod sprite;

use std::path::PathBuf;

use clap::Parser;

/// Desktop pet: a tiny sprite wandering your screen in an always-on-top
/// window. Drag it around with the left mouse button.
#[derive(Debug, Parser)]
#[command(name = "shiro", version)]
pub struct Args {
    /// Sprite sheet (PNG, 5 rows x 3 frames).
    #[arg(long, default_value = "assets/shiro.png")]
    pub sprite: PathBuf,

    /// Seed the behavior RNG for a reproducible session.
    #[arg(long)]
    pub seed: Option<u64>,
}

fn main() {
    env_logger::init();
    log::info!("shiro starting up");

    let args = Args::parse();
    if let Err(e) = app::run(args) {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}
