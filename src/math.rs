use std::f64::consts::PI;

/// Angle between neighbouring spokes
pub fn spoke_angle(spokes: u32) -> f64 {
    PI * 2.0 / spokes as f64
}

/// Point on the ellipse around `(cx, cy)` scaled by `ratio` of each half-axis.
/// Offsets are truncated toward zero before being added to the center.
pub fn elliptic_point(angle: f64, ratio: f64, cx: i32, cy: i32) -> [i32; 2] {
    [
        (angle.cos() * (ratio * cx as f64)) as i32 + cx,
        (angle.sin() * (ratio * cy as f64)) as i32 + cy,
    ]
}

/// Offset of the wobbling ring center for a given rotation
pub fn wobble(rotation: f64, amplitude: f64) -> [i32; 2] {
    [
        ((rotation * 2.0).sin() * amplitude) as i32,
        ((rotation * 2.0).cos() * amplitude) as i32,
    ]
}
