//! # Media Module
//!
//! Image loading, the background canvas, the prop asset and the pixel-level
//! rotate/resize/paste primitives the placement engine builds on.

pub mod canvas;
pub mod prop;
pub mod rotate;
pub mod source;

pub use canvas::{Canvas, OutputFormat};
pub use prop::Prop;
pub use rotate::{rotate_expand, rotated_bounds};
pub use source::{ImageFetcher, ImageSource};
