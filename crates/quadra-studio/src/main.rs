use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use quadra_engine::assets;
use quadra_engine::device::GpuInit;
use quadra_engine::logging::{LoggingConfig, init_logging};
use quadra_engine::window::{Runtime, RuntimeConfig};
use winit::dpi::LogicalSize;

mod canvas;
mod studio;

use studio::Studio;

#[derive(Debug, Parser)]
#[command(name = "quadra-studio", version, about = "Interactive canvas for the quadra renderer")]
struct Cli {
    /// Image applied to the picked node with `T` (png or jpeg, at most 50 MiB).
    #[arg(long)]
    texture: Option<PathBuf>,

    /// Initial window width in logical pixels.
    #[arg(long, default_value_t = 800.0)]
    width: f64,

    /// Initial window height in logical pixels.
    #[arg(long, default_value_t = 600.0)]
    height: f64,

    /// Log filter in env_logger syntax, e.g. "quadra_engine=debug".
    #[arg(long)]
    log: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        env_filter: cli.log.clone(),
        ..LoggingConfig::default()
    });

    let texture = match &cli.texture {
        Some(path) => match assets::acquire(path) {
            Ok(acquired) => {
                log::info!(
                    "loaded texture '{}' ({}x{}, {} bytes)",
                    acquired.name,
                    acquired.image.width(),
                    acquired.image.height(),
                    acquired.size
                );
                Some(acquired.image)
            }
            Err(e) => {
                log::error!("{e}");
                None
            }
        },
        None => None,
    };

    let config = RuntimeConfig {
        initial_size: LogicalSize::new(cli.width, cli.height),
        ..RuntimeConfig::default()
    };

    Runtime::run(config, GpuInit::default(), Studio::new(texture))
}
