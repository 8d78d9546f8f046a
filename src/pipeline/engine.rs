use std::path::{Path, PathBuf};

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    detector::{DetectionRequest, Detector, FaceDetector, ImageRef},
    error::{MemeError, Result},
    landmarks::FaceLandmarks,
    media::{Canvas, ImageFetcher, ImageSource, OutputFormat, Prop},
    pipeline::output::{unique_output_path, write_output},
    placement::{PlacementEngine, PlacementReport},
};

/// A composited image held in memory
#[derive(Debug, Clone)]
pub struct MemeImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub report: PlacementReport,
}

/// A composited image written to disk
#[derive(Debug, Clone)]
pub struct MemeReport {
    pub placement: PlacementReport,
    pub output: PathBuf,
    pub bytes_written: usize,
}

/// Main pipeline that turns one photo into one meme
///
/// The pipeline follows a clear sequence:
/// 1. Image Loading - Read the background from disk or download it
/// 2. Decoding - Fail early on anything that is not an image
/// 3. Face Detection - Ask the detector for per-face landmarks
/// 4. Placement - Composite the prop onto every face
/// 5. Output - Encode, then persist or hand back the bytes
///
/// Every call owns its canvas, so one pipeline can serve concurrent requests.
pub struct MemePipeline<D: FaceDetector = Detector> {
    config: Config,
    detector: D,
    prop: Prop,
    fetcher: ImageFetcher,
}

impl<D: FaceDetector> MemePipeline<D> {
    /// Create a new pipeline with the given configuration, detector and prop
    pub fn new(config: Config, detector: D, prop: Prop, client: Client) -> Self {
        let fetcher = ImageFetcher::new(client, config.fetch.clone());
        Self { config, detector, prop, fetcher }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the whole pipeline and write the result to `output_path`
    pub async fn generate_to_file(
        &self,
        source: &ImageSource,
        max_results: u32,
        output_path: &Path,
    ) -> Result<MemeReport> {
        let format = OutputFormat::from_path(output_path, self.config.output.jpeg_quality)?;
        let image = self.render(source, max_results, format).await?;

        // PIPELINE STEP 5b: PERSIST
        write_output(output_path, &image.bytes).await?;
        info!("   ✅ Output written: {:?} ({} bytes)", output_path, image.bytes.len());

        Ok(MemeReport {
            bytes_written: image.bytes.len(),
            placement: image.report,
            output: output_path.to_path_buf(),
        })
    }

    /// Run the pipeline and write the result under a freshly generated name
    pub async fn generate_unique(&self, source: &ImageSource, max_results: u32) -> Result<MemeReport> {
        let output_path = unique_output_path(
            &self.config.output.directory,
            &self.config.output.extension.to_ascii_lowercase(),
        );
        self.generate_to_file(source, max_results, &output_path).await
    }

    /// Run the pipeline and return the encoded image
    pub async fn render(
        &self,
        source: &ImageSource,
        max_results: u32,
        format: OutputFormat,
    ) -> Result<MemeImage> {
        info!("🕶️  Generating meme for {}", source);
        info!("   Detector: {}", self.detector.name());
        info!("   Max faces: {}", max_results);

        // PIPELINE STEP 1: IMAGE LOADING
        let bytes = self.fetcher.load(source).await?;
        debug!("Loaded {} bytes from {}", bytes.len(), source);

        // PIPELINE STEP 2: DECODING
        let canvas = Canvas::from_bytes(&bytes, &source.to_string())?;
        info!("   Background: {}x{}", canvas.width(), canvas.height());

        // PIPELINE STEP 3: FACE DETECTION
        let faces = self.detect_faces(source, &bytes, max_results).await?;
        info!("   Found {} face{}", faces.len(), if faces.len() == 1 { "" } else { "s" });

        // PIPELINE STEPS 4-5: PLACEMENT AND ENCODING
        let placement = PlacementEngine::new(self.config.placement.clone());
        let prop = self.prop.clone();

        let (encoded, report) = tokio::task::spawn_blocking(move || {
            composite_and_encode(placement, prop, canvas, bytes, faces, format)
        })
        .await
        .map_err(|e| MemeError::generic(format!("compositing task failed: {}", e)))??;

        info!("   ✅ Placed glasses on {}/{} face(s)", report.faces_placed(), report.faces_detected);
        Ok(MemeImage { bytes: encoded, format, report })
    }

    async fn detect_faces(
        &self,
        source: &ImageSource,
        bytes: &[u8],
        max_results: u32,
    ) -> Result<Vec<FaceLandmarks>> {
        let image = match source.as_uri() {
            Some(uri) => ImageRef::Uri(uri),
            None => ImageRef::Content(bytes),
        };

        self.detector
            .detect(&DetectionRequest { image, max_results })
            .await
    }
}

/// Place the prop on every face, then encode.
///
/// When nothing was placed and the source already has the requested format,
/// the original bytes are returned untouched.
fn composite_and_encode(
    placement: PlacementEngine,
    prop: Prop,
    mut canvas: Canvas,
    original: Vec<u8>,
    faces: Vec<FaceLandmarks>,
    format: OutputFormat,
) -> Result<(Vec<u8>, PlacementReport)> {
    let report = placement.place_all(&mut canvas, &prop, &faces)?;

    if report.is_unchanged() && canvas.source_format() == Some(format.image_format()) {
        debug!("No prop placed; passing the source image through unchanged");
        return Ok((original, report));
    }

    if report.is_unchanged() && matches!(format, OutputFormat::Jpeg { .. }) {
        warn!("No prop placed; re-encoding a {:?} source as JPEG is lossy", canvas.source_format());
    }

    Ok((canvas.encode(format)?, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnplaceablePolicy;
    use crate::detector::FixtureDetector;
    use crate::landmarks::{Landmark, LandmarkType};
    use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use tempfile::tempdir;

    const BACKGROUND: Rgba<u8> = Rgba([30, 120, 200, 255]);

    fn write_background(dir: &Path, name: &str) -> PathBuf {
        let image = RgbaImage::from_pixel(320, 240, BACKGROUND);
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(image).write_to(&mut bytes, ImageOutputFormat::Png).unwrap();

        let path = dir.join(name);
        std::fs::write(&path, bytes.into_inner()).unwrap();
        path
    }

    fn face(left: (f64, f64), right: (f64, f64), mid: Option<(f64, f64)>) -> FaceLandmarks {
        let mut landmarks = vec![
            Landmark::new(LandmarkType::LeftEyeLeftCorner, left.0, left.1),
            Landmark::new(LandmarkType::RightEyeRightCorner, right.0, right.1),
        ];
        if let Some((x, y)) = mid {
            landmarks.push(Landmark::new(LandmarkType::MidpointBetweenEyes, x, y));
        }
        FaceLandmarks::new(landmarks)
    }

    fn pipeline(faces: Vec<FaceLandmarks>, config: Config) -> MemePipeline<FixtureDetector> {
        MemePipeline::new(config, FixtureDetector::new(faces), Prop::pixel_glasses(), Client::new())
    }

    #[tokio::test]
    async fn test_upright_face_end_to_end() {
        let dir = tempdir().unwrap();
        let input = write_background(dir.path(), "face.png");
        let output = dir.path().join("out.png");

        let faces = vec![face((100.0, 150.0), (180.0, 150.0), Some((140.0, 150.0)))];
        let report = pipeline(faces, Config::default())
            .generate_to_file(&ImageSource::Path(input), 4, &output)
            .await
            .unwrap();

        assert_eq!(report.placement.faces_placed(), 1);
        let transform = report.placement.placed[0].transform;
        assert_eq!(transform.target_width, 136);
        assert!(transform.angle_degrees.abs() < 1e-9);

        let result = image::open(&output).unwrap().to_rgba8();
        // Prop spans y 138..163; its top bar crosses the midpoint column
        assert_ne!(*result.get_pixel(140, 140), BACKGROUND);
        assert_eq!(*result.get_pixel(10, 10), BACKGROUND);
    }

    #[tokio::test]
    async fn test_inverted_face_rotates_half_turn() {
        let dir = tempdir().unwrap();
        let input = write_background(dir.path(), "face.png");

        let faces = vec![face((180.0, 150.0), (100.0, 150.0), Some((140.0, 150.0)))];
        let image = pipeline(faces, Config::default())
            .render(&ImageSource::Path(input), 4, OutputFormat::Png)
            .await
            .unwrap();

        let transform = image.report.placed[0].transform;
        assert!(transform.inverted);
        assert!((transform.angle_degrees - 180.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_zero_faces_output_is_identical() {
        let dir = tempdir().unwrap();
        let input = write_background(dir.path(), "empty.png");
        let output = dir.path().join("out.png");

        let report = pipeline(vec![], Config::default())
            .generate_to_file(&ImageSource::Path(input.clone()), 4, &output)
            .await
            .unwrap();

        assert_eq!(report.placement.faces_detected, 0);
        assert_eq!(std::fs::read(&output).unwrap(), std::fs::read(&input).unwrap());
    }

    #[tokio::test]
    async fn test_zero_faces_format_change_keeps_image() {
        let dir = tempdir().unwrap();
        let input = write_background(dir.path(), "empty.png");
        let output = dir.path().join("out.jpg");

        let report = pipeline(vec![], Config::default())
            .generate_to_file(&ImageSource::Path(input), 4, &output)
            .await
            .unwrap();

        assert!(report.placement.is_unchanged());
        let result = image::open(&output).unwrap().to_rgb8();
        assert_eq!(result.dimensions(), (320, 240));

        // Lossy, but a flat background survives within JPEG tolerance
        let pixel = result.get_pixel(160, 120);
        for (got, want) in pixel.0.iter().zip(&BACKGROUND.0[..3]) {
            assert!((*got as i32 - *want as i32).abs() <= 6);
        }
    }

    #[tokio::test]
    async fn test_missing_midpoint_is_skipped() {
        let dir = tempdir().unwrap();
        let input = write_background(dir.path(), "face.png");

        let faces = vec![
            face((20.0, 40.0), (60.0, 40.0), None),
            face((100.0, 150.0), (180.0, 150.0), Some((140.0, 150.0))),
        ];
        let image = pipeline(faces, Config::default())
            .render(&ImageSource::Path(input), 4, OutputFormat::Png)
            .await
            .unwrap();

        assert_eq!(image.report.faces_placed(), 1);
        assert_eq!(image.report.skipped[0].face_index, 0);
    }

    #[tokio::test]
    async fn test_abort_policy_writes_nothing() {
        let dir = tempdir().unwrap();
        let input = write_background(dir.path(), "face.png");
        let output = dir.path().join("out.jpg");

        let mut config = Config::default();
        config.placement.on_unplaceable = UnplaceablePolicy::Abort;

        let faces = vec![face((20.0, 40.0), (60.0, 40.0), None)];
        let result = pipeline(faces, config)
            .generate_to_file(&ImageSource::Path(input), 4, &output)
            .await;

        assert!(matches!(result, Err(MemeError::Landmark(_))));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_max_results_limits_faces() {
        let dir = tempdir().unwrap();
        let input = write_background(dir.path(), "face.png");

        let faces = vec![
            face((20.0, 40.0), (80.0, 40.0), Some((50.0, 40.0))),
            face((200.0, 150.0), (280.0, 150.0), Some((240.0, 150.0))),
        ];
        let image = pipeline(faces, Config::default())
            .render(&ImageSource::Path(input), 1, OutputFormat::Png)
            .await
            .unwrap();

        assert_eq!(image.report.faces_detected, 1);
    }

    #[tokio::test]
    async fn test_unique_outputs_do_not_collide() {
        let dir = tempdir().unwrap();
        let input = write_background(dir.path(), "face.png");

        let mut config = Config::default();
        config.output.directory = dir.path().join("generated");
        let pipeline = pipeline(vec![face((100.0, 150.0), (180.0, 150.0), Some((140.0, 150.0)))], config);

        let source = ImageSource::Path(input);
        let (first, second) = tokio::join!(
            pipeline.generate_unique(&source, 4),
            pipeline.generate_unique(&source, 4),
        );

        let (first, second) = (first.unwrap(), second.unwrap());
        assert_ne!(first.output, second.output);
        assert!(first.output.exists() && second.output.exists());
    }

    #[tokio::test]
    async fn test_undecodable_background() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("not-an-image.jpg");
        std::fs::write(&input, b"plain text").unwrap();

        let result = pipeline(vec![], Config::default())
            .render(&ImageSource::Path(input), 4, OutputFormat::Png)
            .await;
        assert!(matches!(result, Err(MemeError::Asset(_))));
    }

    #[tokio::test]
    async fn test_unsupported_output_extension() {
        let dir = tempdir().unwrap();
        let input = write_background(dir.path(), "face.png");

        let result = pipeline(vec![], Config::default())
            .generate_to_file(&ImageSource::Path(input), 4, &dir.path().join("out.gif"))
            .await;
        assert!(matches!(result, Err(MemeError::Output(_))));
    }
}
