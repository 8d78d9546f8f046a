//! # Placement Engine
//!
//! Aligns the prop with each face's eyes. [`transform`] holds the pure
//! geometry (rotation, scale, anchor) and [`engine`] applies it to a canvas,
//! one face at a time.

pub mod engine;
pub mod transform;

pub use engine::{PlacedFace, PlacementEngine, PlacementReport, SkippedFace};
pub use transform::{compute_transform, eye_axis_angle, rotation_angle, target_width, PropTransform};
