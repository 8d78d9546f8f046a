use image::{Rgba, RgbaImage};

// Absorbs float noise from sin/cos at right angles, e.g. sin(180°) ≈ 1.2e-16.
const BOUNDS_EPSILON: f64 = 1e-6;

/// Size of the canvas needed to hold a `width`x`height` image rotated by `degrees`
pub fn rotated_bounds(width: u32, height: u32, degrees: f64) -> (u32, u32) {
    let radians = degrees.to_radians();
    let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
    let (w, h) = (width as f64, height as f64);

    let new_width = (w * cos + h * sin - BOUNDS_EPSILON).ceil().max(1.0);
    let new_height = (w * sin + h * cos - BOUNDS_EPSILON).ceil().max(1.0);

    (new_width as u32, new_height as u32)
}

/// Rotate counter-clockwise (as displayed) by `degrees`, growing the canvas so no corner is clipped.
///
/// Pixels outside the source are fully transparent. Sampling is bilinear on
/// premultiplied colour so transparent borders do not bleed dark fringes.
pub fn rotate_expand(source: &RgbaImage, degrees: f64) -> RgbaImage {
    let (src_w, src_h) = source.dimensions();
    let normalized = degrees.rem_euclid(360.0);
    if normalized.abs() < f64::EPSILON || src_w == 0 || src_h == 0 {
        return source.clone();
    }

    let (out_w, out_h) = rotated_bounds(src_w, src_h, degrees);
    let radians = degrees.to_radians();
    let (sin, cos) = radians.sin_cos();

    let src_cx = src_w as f64 / 2.0;
    let src_cy = src_h as f64 / 2.0;
    let out_cx = out_w as f64 / 2.0;
    let out_cy = out_h as f64 / 2.0;

    RgbaImage::from_fn(out_w, out_h, |x, y| {
        let dx = x as f64 + 0.5 - out_cx;
        let dy = y as f64 + 0.5 - out_cy;

        // Inverse of the y-down counter-clockwise rotation
        let sx = dx * cos - dy * sin + src_cx - 0.5;
        let sy = dx * sin + dy * cos + src_cy - 0.5;

        sample_bilinear(source, sx, sy)
    })
}

fn sample_bilinear(source: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let (w, h) = (source.width() as i64, source.height() as i64);
    if x <= -1.0 || y <= -1.0 || x >= w as f64 || y >= h as f64 {
        return Rgba([0, 0, 0, 0]);
    }

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let mut premultiplied = [0.0f64; 3];
    let mut alpha = 0.0f64;

    for (ox, oy, weight) in [
        (0, 0, (1.0 - fx) * (1.0 - fy)),
        (1, 0, fx * (1.0 - fy)),
        (0, 1, (1.0 - fx) * fy),
        (1, 1, fx * fy),
    ] {
        let (px, py) = (x0 + ox, y0 + oy);
        if weight == 0.0 || px < 0 || py < 0 || px >= w || py >= h {
            continue;
        }

        let pixel = source.get_pixel(px as u32, py as u32);
        let a = pixel[3] as f64 / 255.0 * weight;
        for channel in 0..3 {
            premultiplied[channel] += pixel[channel] as f64 * a;
        }
        alpha += a;
    }

    if alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let unpremultiply = |c: f64| (c / alpha).round().clamp(0.0, 255.0) as u8;
    Rgba([
        unpremultiply(premultiplied[0]),
        unpremultiply(premultiplied[1]),
        unpremultiply(premultiplied[2]),
        (alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}
