use std::path::Path;

use tracing::info;

use crate::detector::response::parse_annotate_body;
use crate::detector::{DetectionRequest, FaceDetector};
use crate::error::{AssetError, Result};
use crate::landmarks::FaceLandmarks;

/// Replays a saved detector response instead of calling the network
#[derive(Debug, Clone, Default)]
pub struct FixtureDetector {
    faces: Vec<FaceLandmarks>,
}

impl FixtureDetector {
    pub fn new(faces: Vec<FaceLandmarks>) -> Self {
        Self { faces }
    }

    /// Parse a saved `images:annotate` response body
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(Self::new(parse_annotate_body(body)?))
    }

    /// Load a saved response from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let body = std::fs::read_to_string(path)
            .map_err(|_| AssetError::NotFound { path: path.display().to_string() })?;

        let detector = Self::from_json(&body)?;
        info!("Loaded {} face(s) from {}", detector.faces.len(), path.display());
        Ok(detector)
    }
}

impl FaceDetector for FixtureDetector {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn detect(&self, request: &DetectionRequest<'_>) -> Result<Vec<FaceLandmarks>> {
        Ok(self.faces
            .iter()
            .take(request.max_results as usize)
            .cloned()
            .collect())
    }
}
