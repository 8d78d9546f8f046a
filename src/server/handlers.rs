use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::media::{ImageSource, OutputFormat};
use crate::server::{ApiError, AppState};

/// Body of `POST /generatememe`
#[derive(Debug, Deserialize)]
pub struct MemeRequest {
    /// http(s) URL of the photo
    pub uri: String,

    /// Overrides the configured maximum number of faces
    #[serde(default)]
    pub max_results: Option<u32>,
}

impl MemeRequest {
    fn max_results(&self, default: u32) -> Result<u32, ApiError> {
        match self.max_results {
            Some(0) => Err(ApiError::bad_request("max_results must be at least 1")),
            Some(n) => Ok(n),
            None => Ok(default),
        }
    }
}

/// `GET /`
pub async fn health() -> Json<&'static str> {
    Json("GET OK")
}

/// `POST /generatememe`: write the meme under a unique name and acknowledge
pub async fn generate_meme(
    State(state): State<AppState>,
    payload: Result<Json<MemeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let source = ImageSource::remote(&request.uri)?;
    let max_results = request.max_results(state.default_max_results)?;

    let report = state.pipeline.generate_unique(&source, max_results).await?;
    let output_name = report.output
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    info!("Meme for {} written to {:?}", source, report.output);

    Ok((
        [
            ("x-meme-output", output_name),
            ("x-faces-detected", report.placement.faces_detected.to_string()),
            ("x-faces-placed", report.placement.faces_placed().to_string()),
        ],
        Json("OK"),
    ))
}

/// `POST /generatememe/image`: respond with the encoded meme itself
pub async fn generate_meme_image(
    State(state): State<AppState>,
    payload: Result<Json<MemeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let source = ImageSource::remote(&request.uri)?;
    let max_results = request.max_results(state.default_max_results)?;

    let output = &state.pipeline.config().output;
    let format = OutputFormat::from_extension(&output.extension, output.jpeg_quality)
        .unwrap_or(OutputFormat::Jpeg { quality: output.jpeg_quality });

    let image = state.pipeline.render(&source, max_results, format).await?;

    Ok((
        [
            (CONTENT_TYPE.as_str(), image.format.content_type().to_string()),
            ("x-faces-detected", image.report.faces_detected.to_string()),
            ("x-faces-placed", image.report.faces_placed().to_string()),
        ],
        image.bytes,
    ))
}
