use crate::error::GeometryError;
use crate::landmarks::{EyeBox, Point};
use crate::media::rotate::rotated_bounds;

/// Where and how one copy of the prop lands on the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropTransform {
    /// Counter-clockwise rotation applied to the prop, half-turn included for inverted faces
    pub angle_degrees: f64,

    /// The half-turn was added because the eye order is flipped
    pub inverted: bool,

    pub target_width: u32,
    pub target_height: u32,

    /// Top-left corner of the pasted prop, before pixel rounding
    pub anchor: Point,
}

impl PropTransform {
    /// Integer paste position on the canvas
    pub fn paste_position(&self) -> (i64, i64) {
        (self.anchor.x.round() as i64, self.anchor.y.round() as i64)
    }

    /// Centre of the prop once pasted
    pub fn pasted_center(&self) -> Point {
        let (x, y) = self.paste_position();
        Point::new(
            x as f64 + self.target_width as f64 / 2.0,
            y as f64 + self.target_height as f64 / 2.0,
        )
    }
}

/// Angle of the eye axis in degrees, measured with y pointing up.
///
/// Vertically aligned corners give +90 when the right corner is higher and
/// -90 when it is lower.
pub fn eye_axis_angle(left: &Point, right: &Point) -> f64 {
    let rise = (-right.y) - (-left.y);
    let run = right.x - left.x;

    if run == 0.0 {
        return if rise > 0.0 {
            90.0
        } else if rise < 0.0 {
            -90.0
        } else {
            0.0
        };
    }

    (rise / run).atan().to_degrees()
}

/// Rotation for the prop: the eye-axis angle, plus a half-turn when the face is upside-down
pub fn rotation_angle(eye_box: &EyeBox) -> (f64, bool) {
    let base = eye_axis_angle(&eye_box.left_corner, &eye_box.right_corner);
    if eye_box.is_inverted() {
        (base + 180.0, true)
    } else {
        (base, false)
    }
}

/// Prop width for an eye span: the rounded-up span plus `margin` of itself, truncated
pub fn target_width(eye_span: f64, margin: f64) -> u32 {
    let size = eye_span.ceil();
    (size + margin * size) as u32
}

/// Compute the transform for one face.
///
/// `prop_size` is the unrotated prop. Scaling uses the rotated (expanded)
/// prop, since that is the image being resized.
pub fn compute_transform(
    eye_box: &EyeBox,
    prop_size: (u32, u32),
    margin: f64,
    face_index: usize,
) -> Result<PropTransform, GeometryError> {
    let eye_span = eye_box.eye_span();
    if !(eye_span > 0.0) || !eye_span.is_finite() {
        return Err(GeometryError::CoincidentEyeCorners { face_index });
    }

    let (angle_degrees, inverted) = rotation_angle(eye_box);
    let (native_width, native_height) = rotated_bounds(prop_size.0, prop_size.1, angle_degrees);

    let target_width = target_width(eye_span, margin).max(1);
    let scale_factor = native_width as f64 / target_width as f64;
    let target_height = ((native_height as f64 / scale_factor).round() as u32).max(1);

    let anchor = Point::new(
        eye_box.midpoint.x - target_width as f64 / 2.0,
        eye_box.midpoint.y - target_height as f64 / 2.0,
    );

    Ok(PropTransform {
        angle_degrees,
        inverted,
        target_width,
        target_height,
        anchor,
    })
}
