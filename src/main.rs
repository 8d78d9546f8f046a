use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};

use meme_glasses::{
    config::Config,
    detector::{Detector, FixtureDetector, VisionDetector},
    media::{ImageSource, Prop},
    pipeline::MemePipeline,
    MemeError,
};

#[derive(Parser)]
#[command(
    name = "meme-glasses",
    version,
    about = "Put meme glasses on every face in a photo",
    long_about = "Meme-Glasses detects faces in a photo, then rotates, scales and pastes a pair of pixel glasses over each pair of eyes."
)]
struct Cli {
    /// Photo to decorate (file path or http(s) URL)
    input_image: String,

    /// Output image path (.jpg or .png)
    #[arg(long, default_value = "out.jpg")]
    out: PathBuf,

    /// Maximum number of faces to decorate
    #[arg(long, default_value_t = 4)]
    max_results: u32,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Glasses image with transparency (defaults to the built-in pixel glasses)
    #[arg(short, long)]
    prop: Option<PathBuf>,

    /// Read landmarks from a saved detector response instead of calling the API
    #[arg(short, long)]
    landmarks: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<MemeError>() {
                Some(meme_error) => eprintln!("Error: {}", meme_error.user_message()),
                None => eprintln!("Error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("Starting Meme-Glasses v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => Config::default(),
    };
    if cli.prop.is_some() {
        config.prop.path = cli.prop.clone();
    }
    config.detector.max_results = cli.max_results;
    config.validate()?;

    let source = ImageSource::parse(&cli.input_image)?;
    let client = reqwest::Client::new();

    let detector = match &cli.landmarks {
        Some(path) => {
            info!("Using landmarks from {:?}", path);
            Detector::from(FixtureDetector::load(path)?)
        }
        None => Detector::from(VisionDetector::from_config(client.clone(), &config.detector)?),
    };

    let prop = match &config.prop.path {
        Some(path) => Prop::load(path)?,
        None => Prop::pixel_glasses(),
    };

    let pipeline = MemePipeline::new(config, detector, prop, client);
    let report = pipeline
        .generate_to_file(&source, cli.max_results, &cli.out)
        .await?;

    let found = report.placement.faces_detected;
    println!("Found {} face{}", found, if found == 1 { "" } else { "s" });
    for skipped in &report.placement.skipped {
        println!("Skipped face {}: {}", skipped.face_index, skipped.reason);
    }
    println!("Writing to file {}", report.output.display());

    Ok(())
}
