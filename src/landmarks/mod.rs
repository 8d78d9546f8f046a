//! # Landmarks
//!
//! Face landmark types as reported by the detector, and extraction of the
//! three eye points ([`EyeBox`]) that the prop is aligned to.

pub mod extract;
pub mod types;

pub use extract::{extract_all, extract_eye_box, EyeBox};
pub use types::{FaceLandmarks, Landmark, LandmarkType, Point};
