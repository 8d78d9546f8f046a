//! # Face Detector Boundary
//!
//! The pipeline only needs per-face landmark lists from a detector. The
//! [`FaceDetector`] trait is that seam; [`VisionDetector`] talks to the cloud
//! service and [`FixtureDetector`] replays a saved response offline.

use std::future::Future;

use crate::error::Result;
use crate::landmarks::FaceLandmarks;

pub mod fixture;
pub mod response;
pub mod vision;

pub use fixture::FixtureDetector;
pub use response::parse_annotate_body;
pub use vision::VisionDetector;

/// How the image is handed to the detector
#[derive(Debug, Clone, Copy)]
pub enum ImageRef<'a> {
    /// Publicly reachable URI; the detector fetches it itself
    Uri(&'a str),
    /// Raw encoded image bytes
    Content(&'a [u8]),
}

/// One detection call
#[derive(Debug, Clone, Copy)]
pub struct DetectionRequest<'a> {
    pub image: ImageRef<'a>,
    pub max_results: u32,
}

/// Core trait for anything that can find faces and their landmarks
pub trait FaceDetector: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Detect faces, returning their landmarks in ranked order
    fn detect(&self, request: &DetectionRequest<'_>) -> impl Future<Output = Result<Vec<FaceLandmarks>>> + Send;
}

/// The detectors shipped with the crate, chosen at startup
#[derive(Clone)]
pub enum Detector {
    Vision(VisionDetector),
    Fixture(FixtureDetector),
}

impl FaceDetector for Detector {
    fn name(&self) -> &str {
        match self {
            Self::Vision(detector) => detector.name(),
            Self::Fixture(detector) => detector.name(),
        }
    }

    async fn detect(&self, request: &DetectionRequest<'_>) -> Result<Vec<FaceLandmarks>> {
        match self {
            Self::Vision(detector) => detector.detect(request).await,
            Self::Fixture(detector) => detector.detect(request).await,
        }
    }
}

impl From<VisionDetector> for Detector {
    fn from(detector: VisionDetector) -> Self {
        Self::Vision(detector)
    }
}

impl From<FixtureDetector> for Detector {
    fn from(detector: FixtureDetector) -> Self {
        Self::Fixture(detector)
    }
}
