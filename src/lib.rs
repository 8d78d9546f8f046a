//! # Meme-Glasses
//!
//! Put a pair of "deal with it" glasses on every face in a photo.
//!
//! Faces are found by a landmark detector (Google Cloud Vision by default); the
//! glasses are rotated to follow the eye line, scaled to the eye span and
//! centered between the eyes, then alpha-composited onto the photo.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meme_glasses::{
//!     config::Config,
//!     detector::{Detector, VisionDetector},
//!     media::{ImageSource, Prop},
//!     pipeline::MemePipeline,
//! };
//! use std::path::Path;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let client = reqwest::Client::new();
//! let detector = Detector::from(VisionDetector::from_config(client.clone(), &config.detector)?);
//!
//! let pipeline = MemePipeline::new(config, detector, Prop::pixel_glasses(), client);
//! let report = pipeline
//!     .generate_to_file(&ImageSource::parse("photo.jpg")?, 4, Path::new("out.jpg"))
//!     .await?;
//!
//! println!("Placed glasses on {} face(s)", report.placement.faces_placed());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - [`landmarks`] - Facial landmark types and eye-box extraction
//! - [`placement`] - Prop geometry and per-face compositing
//! - [`detector`] - Face detectors (Cloud Vision, fixtures)
//! - [`media`] - Image loading, rotation and encoding
//! - [`pipeline`] - End-to-end meme generation
//! - [`server`] - HTTP surface
//! - [`config`] - Configuration management
//!
//! ## Custom Detectors
//!
//! Any landmark source can drive the pipeline by implementing
//! [`FaceDetector`](detector::FaceDetector):
//!
//! ```rust,no_run
//! use meme_glasses::detector::{DetectionRequest, FaceDetector};
//! use meme_glasses::landmarks::FaceLandmarks;
//! use meme_glasses::Result;
//!
//! struct NoFaces;
//!
//! impl FaceDetector for NoFaces {
//!     fn name(&self) -> &str {
//!         "no-faces"
//!     }
//!
//!     async fn detect(&self, _request: &DetectionRequest<'_>) -> Result<Vec<FaceLandmarks>> {
//!         Ok(Vec::new())
//!     }
//! }
//! ```

pub mod config;
pub mod detector;
pub mod error;
pub mod landmarks;
pub mod media;
pub mod pipeline;
pub mod placement;
pub mod retry;
pub mod server;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    detector::{Detector, FaceDetector},
    error::{MemeError, Result},
    pipeline::MemePipeline,
    placement::{PlacementEngine, PropTransform},
};
