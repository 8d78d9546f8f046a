use crate::error::LandmarkError;
use crate::landmarks::types::{FaceLandmarks, LandmarkType, Point};

/// The three eye landmarks that anchor the prop on one face
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeBox {
    /// Outer corner of the subject's left eye
    pub left_corner: Point,

    /// Outer corner of the subject's right eye
    pub right_corner: Point,

    /// Point between the eyes, where the prop is centred
    pub midpoint: Point,
}

impl EyeBox {
    pub fn new(left_corner: Point, right_corner: Point, midpoint: Point) -> Self {
        Self { left_corner, right_corner, midpoint }
    }

    /// Distance between the outer eye corners
    pub fn eye_span(&self) -> f64 {
        self.right_corner.distance(&self.left_corner)
    }

    /// The subject's left corner appears right of the right corner, i.e. the face is upside-down
    pub fn is_inverted(&self) -> bool {
        self.left_corner.x > self.right_corner.x
    }
}

/// Build the eye box for one face.
///
/// Every call looks only at `face`; a missing landmark is reported, never
/// filled in from another face.
pub fn extract_eye_box(face: &FaceLandmarks, face_index: usize) -> Result<EyeBox, LandmarkError> {
    let find = |kind: LandmarkType| {
        face.find(kind)
            .ok_or(LandmarkError::Missing { face_index, landmark: kind })
    };

    Ok(EyeBox {
        left_corner: find(LandmarkType::LeftEyeLeftCorner)?,
        right_corner: find(LandmarkType::RightEyeRightCorner)?,
        midpoint: find(LandmarkType::MidpointBetweenEyes)?,
    })
}

/// Extract eye boxes for every face, in detection order
pub fn extract_all(faces: &[FaceLandmarks]) -> Vec<Result<EyeBox, LandmarkError>> {
    faces
        .iter()
        .enumerate()
        .map(|(index, face)| extract_eye_box(face, index))
        .collect()
}
