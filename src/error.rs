use thiserror::Error;

use crate::landmarks::LandmarkType;

/// Main error type for the meme-glasses library
#[derive(Error, Debug)]
pub enum MemeError {
    #[error("Face detection error: {0}")]
    Detection(#[from] DetectionError),

    #[error("Landmark error: {0}")]
    Landmark(#[from] LandmarkError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out after {seconds}s while {operation}")]
    Timeout { operation: String, seconds: u64 },

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Errors raised at the face detector boundary
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Face detector unreachable: {reason}")]
    Unreachable { reason: String },

    #[error("Face detector rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed detector response: {reason}")]
    Malformed { reason: String },

    #[error("No detector credentials configured (set {env_var} or detector.api_key)")]
    MissingCredentials { env_var: String },
}

/// A detected face without one of the landmarks needed to place the prop
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LandmarkError {
    #[error("Face {face_index} is missing landmark {landmark}")]
    Missing { face_index: usize, landmark: LandmarkType },
}

/// Eye geometry that cannot produce a placement
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Face {face_index} has coincident eye corners")]
    CoincidentEyeCorners { face_index: usize },

    #[error("Face {face_index} needs a {width}x{height} prop, too large for a {canvas_width}x{canvas_height} image")]
    PropTooLarge {
        face_index: usize,
        width: u32,
        height: u32,
        canvas_width: u32,
        canvas_height: u32,
    },

    #[error("Face {face_index} would place the prop entirely outside the image")]
    OffCanvas { face_index: usize },
}

/// Prop or background image that cannot be loaded
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Asset not found: {path}")]
    NotFound { path: String },

    #[error("Failed to decode {what}: {reason}")]
    DecodeFailed { what: String, reason: String },

    #[error("Asset is empty: {what}")]
    Empty { what: String },
}

/// Network download failures for the background image
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid image URI: {uri}")]
    InvalidUri { uri: String },

    #[error("Request for {uri} failed: {reason}")]
    RequestFailed { uri: String, reason: String },

    #[error("Server returned {status} for {uri}")]
    HttpStatus { uri: String, status: u16 },

    #[error("Image at {uri} exceeds the {limit} byte limit")]
    TooLarge { uri: String, limit: u64 },
}

/// Encoding or persisting the composited image
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Unsupported output format for {path}")]
    UnsupportedFormat { path: String },

    #[error("Image encoding failed: {reason}")]
    EncodeFailed { reason: String },

    #[error("Failed to write {path}: {reason}")]
    WriteFailed { path: String, reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using MemeError
pub type Result<T> = std::result::Result<T, MemeError>;

impl MemeError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Check if this error is transient and worth retrying.
    ///
    /// Landmark and geometry failures are deterministic and never retried.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Detection(DetectionError::Unreachable { .. }) => true,
            Self::Detection(DetectionError::Rejected { status, .. }) => is_transient_status(*status),
            Self::Fetch(FetchError::RequestFailed { .. }) => true,
            Self::Fetch(FetchError::HttpStatus { status, .. }) => is_transient_status(*status),
            _ => false,
        }
    }

    /// Short machine-readable name, used in HTTP error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Detection(_) => "detection_error",
            Self::Landmark(_) => "landmark_missing",
            Self::Geometry(_) => "degenerate_geometry",
            Self::Asset(_) => "asset_error",
            Self::Fetch(FetchError::InvalidUri { .. }) => "invalid_uri",
            Self::Fetch(_) | Self::Io(_) | Self::Output(_) => "io_error",
            Self::Timeout { .. } => "timeout",
            Self::Config(_) => "config_error",
            Self::Generic(_) => "internal_error",
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Asset(AssetError::NotFound { path }) => {
                format!("Could not find '{}'. Please check the path exists.", path)
            }
            Self::Asset(AssetError::DecodeFailed { what, .. }) => {
                format!("Could not read {} as an image. Supported formats: PNG, JPEG.", what)
            }
            Self::Detection(DetectionError::MissingCredentials { env_var }) => {
                format!(
                    "No face detection credentials. Export {} or pass --landmarks with a saved detector response.",
                    env_var
                )
            }
            Self::Fetch(FetchError::InvalidUri { uri }) => {
                format!("'{}' is not a local path or an http(s) URL.", uri)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors_are_recoverable() {
        let timeout = MemeError::Timeout { operation: "fetching image".to_string(), seconds: 5 };
        assert!(timeout.is_recoverable());

        let busy: MemeError = DetectionError::Rejected { status: 503, message: "busy".to_string() }.into();
        assert!(busy.is_recoverable());

        let throttled: MemeError = FetchError::HttpStatus { uri: "http://x".to_string(), status: 429 }.into();
        assert!(throttled.is_recoverable());
    }

    #[test]
    fn test_deterministic_errors_are_not_recoverable() {
        let missing: MemeError = LandmarkError::Missing {
            face_index: 0,
            landmark: LandmarkType::MidpointBetweenEyes,
        }.into();
        assert!(!missing.is_recoverable());

        let degenerate: MemeError = GeometryError::CoincidentEyeCorners { face_index: 1 }.into();
        assert!(!degenerate.is_recoverable());

        let bad_key: MemeError = DetectionError::Rejected { status: 403, message: "denied".to_string() }.into();
        assert!(!bad_key.is_recoverable());
    }

    #[test]
    fn test_error_kinds() {
        let invalid: MemeError = FetchError::InvalidUri { uri: "ftp://x".to_string() }.into();
        assert_eq!(invalid.kind(), "invalid_uri");

        let timeout = MemeError::Timeout { operation: "detecting faces".to_string(), seconds: 30 };
        assert_eq!(timeout.kind(), "timeout");
        assert!(timeout.to_string().contains("detecting faces"));
    }
}
