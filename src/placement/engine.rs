use tracing::{debug, warn};

use crate::config::{PlacementConfig, UnplaceablePolicy};
use crate::error::{GeometryError, MemeError, Result};
use crate::landmarks::{extract_all, EyeBox, FaceLandmarks};
use crate::media::{Canvas, Prop};
use crate::placement::transform::{compute_transform, PropTransform};

/// A face that received a prop
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedFace {
    pub face_index: usize,
    pub transform: PropTransform,
}

/// A face that was left untouched, and why
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFace {
    pub face_index: usize,
    pub reason: String,
}

/// Outcome of compositing one image
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementReport {
    pub faces_detected: usize,
    pub placed: Vec<PlacedFace>,
    pub skipped: Vec<SkippedFace>,
}

impl PlacementReport {
    pub fn faces_placed(&self) -> usize {
        self.placed.len()
    }

    /// True when the canvas was not touched
    pub fn is_unchanged(&self) -> bool {
        self.placed.is_empty()
    }
}

/// Largest prop side allowed, as a multiple of the canvas's longer side
const MAX_PROP_SCALE: u32 = 4;

/// Places a prop on every face of a canvas.
///
/// Faces are handled independently and in detection order; each one derives
/// its own rotated and resized copy of the prop.
pub struct PlacementEngine {
    config: PlacementConfig,
}

impl PlacementEngine {
    pub fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    /// Work out the transform for one face without touching any pixels
    pub fn plan(&self, eye_box: &EyeBox, prop: &Prop, face_index: usize) -> Result<PropTransform> {
        Ok(compute_transform(eye_box, prop.dimensions(), self.config.margin, face_index)?)
    }

    /// Render the prop for one face and paste it onto the canvas
    pub fn place_face(
        &self,
        canvas: &mut Canvas,
        prop: &Prop,
        eye_box: &EyeBox,
        face_index: usize,
    ) -> Result<PropTransform> {
        let transform = self.plan(eye_box, prop, face_index)?;
        check_fits(&transform, canvas, face_index)?;

        let rendered = prop.render(&transform);
        let (x, y) = transform.paste_position();

        debug!("Face {}: angle {:.1}°{}, {}x{} at ({}, {})",
               face_index, transform.angle_degrees,
               if transform.inverted { " (inverted)" } else { "" },
               transform.target_width, transform.target_height, x, y);

        canvas.paste_with_mask(&rendered, x, y);
        Ok(transform)
    }

    /// Place the prop on every face, applying the unplaceable-face policy
    pub fn place_all(
        &self,
        canvas: &mut Canvas,
        prop: &Prop,
        faces: &[FaceLandmarks],
    ) -> Result<PlacementReport> {
        let mut report = PlacementReport {
            faces_detected: faces.len(),
            ..PlacementReport::default()
        };

        for (face_index, eye_box) in extract_all(faces).into_iter().enumerate() {
            let outcome = eye_box
                .map_err(MemeError::from)
                .and_then(|eye_box| self.place_face(canvas, prop, &eye_box, face_index));

            match outcome {
                Ok(transform) => report.placed.push(PlacedFace { face_index, transform }),
                Err(e) if is_unplaceable(&e) && self.config.on_unplaceable == UnplaceablePolicy::Skip => {
                    warn!("Skipping face {}: {}", face_index, e);
                    report.skipped.push(SkippedFace { face_index, reason: e.to_string() });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }
}

/// Reject transforms whose prop would be absurdly large or land nowhere on the canvas
fn check_fits(transform: &PropTransform, canvas: &Canvas, face_index: usize) -> Result<()> {
    let (canvas_width, canvas_height) = (canvas.width(), canvas.height());
    let limit = canvas_width.max(canvas_height).saturating_mul(MAX_PROP_SCALE);

    if transform.target_width > limit || transform.target_height > limit {
        return Err(GeometryError::PropTooLarge {
            face_index,
            width: transform.target_width,
            height: transform.target_height,
            canvas_width,
            canvas_height,
        }.into());
    }

    if !transform.anchor.x.is_finite() || !transform.anchor.y.is_finite() {
        return Err(GeometryError::OffCanvas { face_index }.into());
    }

    let (x, y) = transform.paste_position();
    let overlaps = x < canvas_width as i64
        && y < canvas_height as i64
        && x + transform.target_width as i64 > 0
        && y + transform.target_height as i64 > 0;
    if !overlaps {
        return Err(GeometryError::OffCanvas { face_index }.into());
    }

    Ok(())
}

fn is_unplaceable(error: &MemeError) -> bool {
    matches!(error, MemeError::Landmark(_) | MemeError::Geometry(_))
}
