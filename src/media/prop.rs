use std::path::Path;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::error::{AssetError, Result};
use crate::media::rotate::rotate_expand;
use crate::placement::PropTransform;

// Pixel-art "deal with it" glasses: X = frame, W = glint, . = transparent
const PIXEL_GLASSES: [&str; 4] = [
    "XXXXXXXXXXXXXXXXXXXXXX",
    ".XWWXXXXX....XWWXXXXX.",
    ".XXWWXXXX....XXWWXXXX.",
    "..XXXXXX......XXXXXX..",
];
const PIXEL_SIZE: u32 = 12;

/// The overlay asset. Shared read-only; every face renders its own transformed copy.
#[derive(Clone, Debug)]
pub struct Prop {
    image: Arc<RgbaImage>,
}

impl Prop {
    pub fn new(image: RgbaImage) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(AssetError::Empty { what: "prop image".to_string() }.into());
        }
        Ok(Self { image: Arc::new(image) })
    }

    /// Load a prop image (PNG with alpha) from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|_| AssetError::NotFound { path: path.display().to_string() })?;
        Self::from_bytes(&bytes, &path.display().to_string())
    }

    pub fn from_bytes(bytes: &[u8], what: &str) -> Result<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| AssetError::DecodeFailed {
                what: what.to_string(),
                reason: e.to_string(),
            })?
            .to_rgba8();
        Self::new(image)
    }

    /// Built-in pixel-art glasses, used when no prop file is configured
    pub fn pixel_glasses() -> Self {
        let cols = PIXEL_GLASSES[0].len() as u32;
        let rows = PIXEL_GLASSES.len() as u32;

        let image = RgbaImage::from_fn(cols * PIXEL_SIZE, rows * PIXEL_SIZE, |x, y| {
            let cell = PIXEL_GLASSES[(y / PIXEL_SIZE) as usize].as_bytes()[(x / PIXEL_SIZE) as usize];
            match cell {
                b'X' => Rgba([0, 0, 0, 255]),
                b'W' => Rgba([255, 255, 255, 255]),
                _ => Rgba([0, 0, 0, 0]),
            }
        });

        Self { image: Arc::new(image) }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    /// Rotate then resize a copy of the prop according to `transform`
    pub fn render(&self, transform: &PropTransform) -> RgbaImage {
        let rotated = rotate_expand(&self.image, transform.angle_degrees);

        if rotated.dimensions() == (transform.target_width, transform.target_height) {
            return rotated;
        }

        imageops::resize(
            &rotated,
            transform.target_width,
            transform.target_height,
            FilterType::CatmullRom,
        )
    }
}
