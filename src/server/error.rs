use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use crate::error::{DetectionError, FetchError, MemeError};

/// An error as it leaves the HTTP surface: status plus a JSON body, never a backtrace
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "invalid_request",
            message: message.into(),
        }
    }
}

fn status_for(error: &MemeError) -> StatusCode {
    match error {
        MemeError::Fetch(FetchError::InvalidUri { .. }) => StatusCode::BAD_REQUEST,
        MemeError::Fetch(FetchError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
        MemeError::Fetch(_) => StatusCode::BAD_GATEWAY,
        MemeError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        MemeError::Detection(DetectionError::MissingCredentials { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
        MemeError::Detection(_) => StatusCode::BAD_GATEWAY,
        MemeError::Landmark(_) | MemeError::Geometry(_) | MemeError::Asset(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MemeError::Output(_) | MemeError::Io(_) | MemeError::Config(_) | MemeError::Generic(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<MemeError> for ApiError {
    fn from(error: MemeError) -> Self {
        let status = status_for(&error);
        if status.is_server_error() {
            error!("Request failed: {}", error);
        } else {
            warn!("Request rejected: {}", error);
        }

        Self {
            status,
            kind: error.kind(),
            message: error.user_message(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            kind: "invalid_request",
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.kind,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LandmarkError;
    use crate::landmarks::LandmarkType;

    #[test]
    fn test_status_mapping() {
        let invalid: ApiError = MemeError::from(FetchError::InvalidUri { uri: "x".to_string() }).into();
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert_eq!(invalid.kind, "invalid_uri");

        let timeout: ApiError = MemeError::Timeout { operation: "detecting faces".to_string(), seconds: 30 }.into();
        assert_eq!(timeout.status, StatusCode::GATEWAY_TIMEOUT);

        let upstream: ApiError = MemeError::from(DetectionError::Unreachable { reason: "dns".to_string() }).into();
        assert_eq!(upstream.status, StatusCode::BAD_GATEWAY);

        let missing: ApiError = MemeError::from(LandmarkError::Missing {
            face_index: 0,
            landmark: LandmarkType::MidpointBetweenEyes,
        }).into();
        assert_eq!(missing.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(missing.kind, "landmark_missing");
    }
}
