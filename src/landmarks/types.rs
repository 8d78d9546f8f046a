use std::fmt;

use serde::{Deserialize, Serialize};

/// A 2-D coordinate in image pixel space (origin top-left, y increasing downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Semantic label of a face landmark, as named by the detector.
///
/// Only the three eye landmarks matter for placement; everything else is
/// carried through so responses parse without loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LandmarkType {
    LeftEye,
    RightEye,
    LeftOfLeftEyebrow,
    RightOfLeftEyebrow,
    LeftOfRightEyebrow,
    RightOfRightEyebrow,
    MidpointBetweenEyes,
    NoseTip,
    UpperLip,
    LowerLip,
    MouthLeft,
    MouthRight,
    MouthCenter,
    NoseBottomRight,
    NoseBottomLeft,
    NoseBottomCenter,
    LeftEyeTopBoundary,
    LeftEyeRightCorner,
    LeftEyeBottomBoundary,
    LeftEyeLeftCorner,
    RightEyeTopBoundary,
    RightEyeRightCorner,
    RightEyeBottomBoundary,
    RightEyeLeftCorner,
    LeftEyebrowUpperMidpoint,
    RightEyebrowUpperMidpoint,
    LeftEarTragion,
    RightEarTragion,
    LeftEyePupil,
    RightEyePupil,
    ForeheadGlabella,
    ChinGnathion,
    ChinLeftGonion,
    ChinRightGonion,
    LeftCheekCenter,
    RightCheekCenter,
    #[serde(other)]
    UnknownLandmark,
}

impl LandmarkType {
    /// Detector wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeftEye => "LEFT_EYE",
            Self::RightEye => "RIGHT_EYE",
            Self::LeftOfLeftEyebrow => "LEFT_OF_LEFT_EYEBROW",
            Self::RightOfLeftEyebrow => "RIGHT_OF_LEFT_EYEBROW",
            Self::LeftOfRightEyebrow => "LEFT_OF_RIGHT_EYEBROW",
            Self::RightOfRightEyebrow => "RIGHT_OF_RIGHT_EYEBROW",
            Self::MidpointBetweenEyes => "MIDPOINT_BETWEEN_EYES",
            Self::NoseTip => "NOSE_TIP",
            Self::UpperLip => "UPPER_LIP",
            Self::LowerLip => "LOWER_LIP",
            Self::MouthLeft => "MOUTH_LEFT",
            Self::MouthRight => "MOUTH_RIGHT",
            Self::MouthCenter => "MOUTH_CENTER",
            Self::NoseBottomRight => "NOSE_BOTTOM_RIGHT",
            Self::NoseBottomLeft => "NOSE_BOTTOM_LEFT",
            Self::NoseBottomCenter => "NOSE_BOTTOM_CENTER",
            Self::LeftEyeTopBoundary => "LEFT_EYE_TOP_BOUNDARY",
            Self::LeftEyeRightCorner => "LEFT_EYE_RIGHT_CORNER",
            Self::LeftEyeBottomBoundary => "LEFT_EYE_BOTTOM_BOUNDARY",
            Self::LeftEyeLeftCorner => "LEFT_EYE_LEFT_CORNER",
            Self::RightEyeTopBoundary => "RIGHT_EYE_TOP_BOUNDARY",
            Self::RightEyeRightCorner => "RIGHT_EYE_RIGHT_CORNER",
            Self::RightEyeBottomBoundary => "RIGHT_EYE_BOTTOM_BOUNDARY",
            Self::RightEyeLeftCorner => "RIGHT_EYE_LEFT_CORNER",
            Self::LeftEyebrowUpperMidpoint => "LEFT_EYEBROW_UPPER_MIDPOINT",
            Self::RightEyebrowUpperMidpoint => "RIGHT_EYEBROW_UPPER_MIDPOINT",
            Self::LeftEarTragion => "LEFT_EAR_TRAGION",
            Self::RightEarTragion => "RIGHT_EAR_TRAGION",
            Self::LeftEyePupil => "LEFT_EYE_PUPIL",
            Self::RightEyePupil => "RIGHT_EYE_PUPIL",
            Self::ForeheadGlabella => "FOREHEAD_GLABELLA",
            Self::ChinGnathion => "CHIN_GNATHION",
            Self::ChinLeftGonion => "CHIN_LEFT_GONION",
            Self::ChinRightGonion => "CHIN_RIGHT_GONION",
            Self::LeftCheekCenter => "LEFT_CHEEK_CENTER",
            Self::RightCheekCenter => "RIGHT_CHEEK_CENTER",
            Self::UnknownLandmark => "UNKNOWN_LANDMARK",
        }
    }
}

impl fmt::Display for LandmarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One labelled landmark of a detected face
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub kind: LandmarkType,
    pub position: Point,
}

impl Landmark {
    pub fn new(kind: LandmarkType, x: f64, y: f64) -> Self {
        Self { kind, position: Point::new(x, y) }
    }
}

/// Landmarks of a single detected face, in detector order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceLandmarks {
    pub landmarks: Vec<Landmark>,

    /// Detector confidence, when reported
    pub confidence: Option<f32>,
}

impl FaceLandmarks {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks, confidence: None }
    }

    /// First position recorded for the given landmark type
    pub fn find(&self, kind: LandmarkType) -> Option<Point> {
        self.landmarks
            .iter()
            .find(|landmark| landmark.kind == kind)
            .map(|landmark| landmark.position)
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_type_wire_names() {
        let parsed: LandmarkType = serde_json::from_str("\"LEFT_EYE_LEFT_CORNER\"").unwrap();
        assert_eq!(parsed, LandmarkType::LeftEyeLeftCorner);

        let parsed: LandmarkType = serde_json::from_str("\"MIDPOINT_BETWEEN_EYES\"").unwrap();
        assert_eq!(parsed, LandmarkType::MidpointBetweenEyes);
        assert_eq!(parsed.to_string(), "MIDPOINT_BETWEEN_EYES");

        let unknown: LandmarkType = serde_json::from_str("\"THIRD_EYE\"").unwrap();
        assert_eq!(unknown, LandmarkType::UnknownLandmark);
    }

    #[test]
    fn test_find_returns_first_match() {
        let face = FaceLandmarks::new(vec![
            Landmark::new(LandmarkType::NoseTip, 5.0, 5.0),
            Landmark::new(LandmarkType::LeftEyeLeftCorner, 1.0, 2.0),
            Landmark::new(LandmarkType::LeftEyeLeftCorner, 9.0, 9.0),
        ]);

        assert_eq!(face.find(LandmarkType::LeftEyeLeftCorner), Some(Point::new(1.0, 2.0)));
        assert_eq!(face.find(LandmarkType::ChinGnathion), None);
    }

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance(&b), 5.0);
    }
}
