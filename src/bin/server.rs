use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use meme_glasses::{
    config::Config,
    detector::{Detector, FixtureDetector, VisionDetector},
    media::Prop,
    pipeline::MemePipeline,
    server::{self, AppState},
};

#[derive(Parser)]
#[command(
    name = "meme-glasses-server",
    version,
    about = "Serve meme generation over HTTP"
)]
struct Args {
    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:5000
    #[arg(short, long)]
    bind: Option<String>,

    /// Directory generated memes are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Glasses image with transparency
    #[arg(short, long)]
    prop: Option<PathBuf>,

    /// Answer every request with landmarks from a saved detector response
    #[arg(short, long)]
    landmarks: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    info!("Starting Meme-Glasses server v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }
    if let Some(dir) = args.output_dir {
        config.output.directory = dir;
    }
    if args.prop.is_some() {
        config.prop.path = args.prop;
    }
    config.validate()?;

    let client = reqwest::Client::new();
    let detector = match &args.landmarks {
        Some(path) => {
            info!("Serving fixed landmarks from {:?}", path);
            Detector::from(FixtureDetector::load(path)?)
        }
        None => Detector::from(VisionDetector::from_config(client.clone(), &config.detector)?),
    };
    let prop = match &config.prop.path {
        Some(path) => Prop::load(path)?,
        None => Prop::pixel_glasses(),
    };

    info!("Output directory: {:?}", config.output.directory);
    let bind_addr = config.server.bind_addr.clone();
    let state = AppState::new(MemePipeline::new(config, detector, prop, client));

    server::serve(state, &bind_addr).await?;
    Ok(())
}
