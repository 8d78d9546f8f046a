use serde::Deserialize;
use serde_json::Value;

use crate::error::{DetectionError, Result};
use crate::landmarks::{FaceLandmarks, Landmark, LandmarkType, Point};

/// `images:annotate` batch response
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchAnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

/// Per-image response
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    face_annotations: Vec<FaceAnnotation>,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FaceAnnotation {
    #[serde(default)]
    landmarks: Vec<WireLandmark>,
    detection_confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct WireLandmark {
    #[serde(rename = "type", default = "unknown_landmark")]
    kind: LandmarkType,
    #[serde(default)]
    position: Position,
}

// Proto3 JSON drops zero-valued fields, so every coordinate is optional.
#[derive(Debug, Default, Deserialize)]
struct Position {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
}

/// `google.rpc.Status`, as embedded in responses and error bodies
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Status {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// Top-level error body returned with a non-2xx status
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Status,
}

fn unknown_landmark() -> LandmarkType {
    LandmarkType::UnknownLandmark
}

impl From<FaceAnnotation> for FaceLandmarks {
    fn from(annotation: FaceAnnotation) -> Self {
        FaceLandmarks {
            landmarks: annotation.landmarks
                .into_iter()
                .map(|l| Landmark {
                    kind: l.kind,
                    position: Point::new(l.position.x, l.position.y),
                })
                .collect(),
            confidence: annotation.detection_confidence,
        }
    }
}

/// Parse a detector response body into per-face landmarks.
///
/// Accepts the batch form (`{"responses": [...]}`, first image only), a single
/// `AnnotateImageResponse`, or a bare array of face annotations.
pub fn parse_annotate_body(body: &str) -> Result<Vec<FaceLandmarks>> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| DetectionError::Malformed { reason: e.to_string() })?;

    let response = if value.is_array() {
        AnnotateImageResponse {
            face_annotations: from_value(value)?,
            error: None,
        }
    } else if value.get("responses").is_some() {
        let batch: BatchAnnotateResponse = from_value(value)?;
        batch.responses.into_iter().next().unwrap_or_default()
    } else if value.is_object() {
        from_value(value)?
    } else {
        return Err(DetectionError::Malformed {
            reason: format!("expected an object or array, got {}", value),
        }.into());
    };

    if let Some(status) = response.error.filter(|s| s.code != 0) {
        return Err(DetectionError::Rejected {
            status: grpc_to_http_status(status.code),
            message: status.message,
        }.into());
    }

    Ok(response.face_annotations.into_iter().map(FaceLandmarks::from).collect())
}

fn from_value<T: serde::de::DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| DetectionError::Malformed { reason: e.to_string() }.into())
}

/// Map a `google.rpc.Code` to the HTTP status it corresponds to
pub(crate) fn grpc_to_http_status(code: i32) -> u16 {
    match code {
        0 => 200,
        1 => 499,
        3 | 9 | 11 => 400,
        4 => 504,
        5 => 404,
        6 | 10 => 409,
        7 => 403,
        8 => 429,
        12 => 501,
        14 => 503,
        16 => 401,
        _ => 500,
    }
}
