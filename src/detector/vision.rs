use std::time::Duration;

use base64::Engine;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::DetectorConfig;
use crate::detector::response::{parse_annotate_body, ErrorBody};
use crate::detector::{DetectionRequest, FaceDetector, ImageRef};
use crate::error::{DetectionError, MemeError, Result};
use crate::landmarks::FaceLandmarks;
use crate::retry::RetryPolicy;

/// Face detection through the Cloud Vision `images:annotate` REST endpoint
#[derive(Clone)]
pub struct VisionDetector {
    client: Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl VisionDetector {
    /// Create a detector with an explicit API key
    pub fn new(client: Client, config: &DetectorConfig, api_key: String) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            timeout: config.timeout(),
            retry: RetryPolicy::new(
                config.max_retries,
                Duration::from_millis(config.retry_backoff_ms),
            ),
        }
    }

    /// Create a detector, resolving the API key from the configuration
    pub fn from_config(client: Client, config: &DetectorConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;
        Ok(Self::new(client, config, api_key))
    }

    fn request_body(request: &DetectionRequest<'_>) -> Value {
        let image = match request.image {
            ImageRef::Uri(uri) => json!({ "source": { "imageUri": uri } }),
            ImageRef::Content(bytes) => json!({
                "content": base64::engine::general_purpose::STANDARD.encode(bytes)
            }),
        };

        json!({
            "requests": [{
                "image": image,
                "features": [{ "type": "FACE_DETECTION", "maxResults": request.max_results }]
            }]
        })
    }

    async fn annotate(&self, request: &DetectionRequest<'_>) -> Result<Vec<FaceLandmarks>> {
        debug!("Calling face detector at {}", self.endpoint);

        let response = self.client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .timeout(self.timeout)
            .json(&Self::request_body(request))
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.request_error(e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(DetectionError::Rejected {
                status: status.as_u16(),
                message,
            }.into());
        }

        parse_annotate_body(&body)
    }

    fn request_error(&self, error: reqwest::Error) -> MemeError {
        if error.is_timeout() {
            MemeError::Timeout {
                operation: "detecting faces".to_string(),
                seconds: self.timeout.as_secs(),
            }
        } else {
            // Strip the URL: its query string carries the API key.
            DetectionError::Unreachable {
                reason: error.without_url().to_string(),
            }.into()
        }
    }
}

impl FaceDetector for VisionDetector {
    fn name(&self) -> &str {
        "google-vision"
    }

    async fn detect(&self, request: &DetectionRequest<'_>) -> Result<Vec<FaceLandmarks>> {
        let faces = self.retry
            .run("face detection", || self.annotate(request))
            .await?;

        info!("Vision returned {} face{}", faces.len(), if faces.len() == 1 { "" } else { "s" });
        Ok(faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_for_uri() {
        let request = DetectionRequest {
            image: ImageRef::Uri("https://example.com/face.jpg"),
            max_results: 4,
        };
        let body = VisionDetector::request_body(&request);

        assert_eq!(body["requests"][0]["image"]["source"]["imageUri"], "https://example.com/face.jpg");
        assert_eq!(body["requests"][0]["features"][0]["type"], "FACE_DETECTION");
        assert_eq!(body["requests"][0]["features"][0]["maxResults"], 4);
    }

    #[test]
    fn test_request_body_for_content() {
        let request = DetectionRequest {
            image: ImageRef::Content(b"hello"),
            max_results: 1,
        };
        let body = VisionDetector::request_body(&request);

        assert_eq!(body["requests"][0]["image"]["content"], "aGVsbG8=");
    }

    /// Accept connections and never answer
    async fn stalled_endpoint() -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_stalled_detector_times_out() {
        let addr = stalled_endpoint().await;
        let config = DetectorConfig {
            endpoint: format!("http://{}/v1/images:annotate", addr),
            timeout_secs: 1,
            max_retries: 0,
            ..DetectorConfig::default()
        };
        let detector = VisionDetector::new(Client::new(), &config, "test-key".to_string());

        let request = DetectionRequest {
            image: ImageRef::Content(b"not really an image"),
            max_results: 1,
        };
        let result = detector.detect(&request).await;

        assert!(matches!(result, Err(MemeError::Timeout { seconds: 1, .. })));
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = DetectorConfig {
            api_key: None,
            api_key_env: "MEME_GLASSES_TEST_NO_SUCH_VAR".to_string(),
            ..DetectorConfig::default()
        };
        assert!(matches!(
            VisionDetector::from_config(Client::new(), &config),
            Err(MemeError::Detection(DetectionError::MissingCredentials { .. }))
        ));
    }
}
