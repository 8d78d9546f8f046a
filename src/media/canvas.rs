use std::io::Cursor;
use std::path::Path;

use image::{imageops, DynamicImage, ImageFormat, ImageOutputFormat, RgbaImage};

use crate::error::{AssetError, OutputError, Result};

/// Encoded format of the composited output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg { quality: u8 },
    Png,
}

impl OutputFormat {
    /// Pick the format from a file extension (`jpg`, `jpeg`, `png`)
    pub fn from_extension(extension: &str, jpeg_quality: u8) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg { quality: jpeg_quality }),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Pick the format from the destination path's extension
    pub fn from_path<P: AsRef<Path>>(path: P, jpeg_quality: u8) -> Result<Self> {
        let path = path.as_ref();
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| Self::from_extension(ext, jpeg_quality))
            .ok_or_else(|| OutputError::UnsupportedFormat {
                path: path.display().to_string(),
            }.into())
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            Self::Jpeg { .. } => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "jpg",
            Self::Png => "png",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// The background image that props are composited onto.
///
/// Holds an RGBA working buffer plus enough about the source to encode the
/// result faithfully.
#[derive(Clone, Debug)]
pub struct Canvas {
    buffer: RgbaImage,
    source_format: Option<ImageFormat>,
    has_alpha: bool,
}

impl Canvas {
    /// Create a canvas from an RGBA buffer
    pub fn new(buffer: RgbaImage) -> Self {
        Self {
            buffer,
            source_format: None,
            has_alpha: true,
        }
    }

    /// Decode a canvas from encoded image bytes
    pub fn from_bytes(bytes: &[u8], what: &str) -> Result<Self> {
        if bytes.is_empty() {
            return Err(AssetError::Empty { what: what.to_string() }.into());
        }

        let source_format = image::guess_format(bytes).ok();
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| AssetError::DecodeFailed {
                what: what.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            has_alpha: decoded.color().has_alpha(),
            buffer: decoded.to_rgba8(),
            source_format,
        })
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Format the canvas was decoded from, if known
    pub fn source_format(&self) -> Option<ImageFormat> {
        self.source_format
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.buffer
    }

    /// Alpha-composite `overlay` with its top-left corner at `(x, y)`.
    ///
    /// The overlay's alpha acts as the paste mask; off-canvas parts are clipped.
    pub fn paste_with_mask(&mut self, overlay: &RgbaImage, x: i64, y: i64) {
        imageops::overlay(&mut self.buffer, overlay, x, y);
    }

    /// Encode the canvas. JPEG output drops the alpha channel.
    pub fn encode(&self, format: OutputFormat) -> Result<Vec<u8>> {
        let image = match format {
            OutputFormat::Png if self.has_alpha => DynamicImage::ImageRgba8(self.buffer.clone()),
            _ => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(self.buffer.clone()).to_rgb8()),
        };

        let output_format = match format {
            OutputFormat::Jpeg { quality } => ImageOutputFormat::Jpeg(quality),
            OutputFormat::Png => ImageOutputFormat::Png,
        };

        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, output_format)
            .map_err(|e| OutputError::EncodeFailed { reason: e.to_string() })?;

        Ok(bytes.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn png_bytes(image: &RgbaImage) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(image.clone())
            .write_to(&mut bytes, ImageOutputFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_output_format_from_path() {
        assert_eq!(OutputFormat::from_path("out.jpg", 90).unwrap(), OutputFormat::Jpeg { quality: 90 });
        assert_eq!(OutputFormat::from_path("OUT.PNG", 90).unwrap(), OutputFormat::Png);
        assert!(OutputFormat::from_path("out.gif", 90).is_err());
        assert!(OutputFormat::from_path("out", 90).is_err());
    }

    #[test]
    fn test_decode_records_format() {
        let image = RgbaImage::from_pixel(5, 4, Rgba([1, 2, 3, 255]));
        let canvas = Canvas::from_bytes(&png_bytes(&image), "test image").unwrap();

        assert_eq!(canvas.source_format(), Some(ImageFormat::Png));
        assert_eq!((canvas.width(), canvas.height()), (5, 4));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(Canvas::from_bytes(b"definitely not an image", "garbage").is_err());
        assert!(Canvas::from_bytes(&[], "nothing").is_err());
    }

    #[test]
    fn test_paste_uses_alpha_mask() {
        let mut canvas = Canvas::new(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255])));

        let mut overlay = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0]));
        overlay.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        canvas.paste_with_mask(&overlay, 1, 1);

        assert_eq!(*canvas.as_image().get_pixel(1, 1), Rgba([255, 0, 0, 255]));
        assert_eq!(*canvas.as_image().get_pixel(2, 2), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_paste_clips_off_canvas() {
        let mut canvas = Canvas::new(RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 255])));
        let overlay = RgbaImage::from_pixel(3, 3, Rgba([9, 9, 9, 255]));

        canvas.paste_with_mask(&overlay, -2, -2);
        assert_eq!(*canvas.as_image().get_pixel(0, 0), Rgba([9, 9, 9, 255]));
        assert_eq!(*canvas.as_image().get_pixel(1, 1), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_png_encode_preserves_pixels() {
        let image = RgbaImage::from_fn(6, 6, |x, y| Rgba([x as u8 * 40, y as u8 * 40, 7, 255]));
        let canvas = Canvas::from_bytes(&png_bytes(&image), "test image").unwrap();

        let encoded = canvas.encode(OutputFormat::Png).unwrap();
        let decoded = image::load_from_memory(&encoded).unwrap().to_rgba8();
        assert_eq!(decoded, image);
    }

    #[test]
    fn test_jpeg_encode() {
        let canvas = Canvas::new(RgbaImage::from_pixel(16, 16, Rgba([120, 60, 30, 255])));
        let encoded = canvas.encode(OutputFormat::Jpeg { quality: 90 }).unwrap();
        assert_eq!(image::guess_format(&encoded).unwrap(), ImageFormat::Jpeg);
    }
}
