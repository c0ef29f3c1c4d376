//! Planar primitives on pixel-scaled points.

mod point;

pub use point::Point;

/// Euclidean distance in pixels.
pub fn distance(p1: Point, p2: Point) -> f64 {
    p1.squared_distance(p2).sqrt()
}

/// Direction of the segment `p1 -> p2` in degrees, `atan2(dy, dx)`, sign preserved.
pub fn slope_angle(p1: Point, p2: Point) -> f64 {
    let delta = p2 - p1;
    delta.y().atan2(delta.x()).to_degrees()
}

/// Deviation of the segment from horizontal, in `[0, 90]` degrees.
///
/// Unlike [`slope_angle`] this does not depend on which endpoint lies on the
/// left of the image, so a level pair of landmarks always measures zero.
pub fn inclination(p1: Point, p2: Point) -> f64 {
    let angle = slope_angle(p1, p2).abs();
    angle.min(180.0 - angle)
}

/// Angle at vertex `p2` between `p2 -> p1` and `p2 -> p3`, in degrees.
///
/// Returns 0.0 when either arm has zero length.
pub fn vertex_angle(p1: Point, p2: Point, p3: Point) -> f64 {
    let v1 = p1 - p2;
    let v2 = p3 - p2;
    let (n1, n2) = (v1.norm(), v2.norm());
    if n1 == 0.0 || n2 == 0.0 {
        return 0.0;
    }
    // rounding can push the cosine just past +-1
    let cosine = (v1.dot(v2) / (n1 * n2)).clamp(-1.0, 1.0);
    cosine.acos().to_degrees()
}

pub fn midpoint(p1: Point, p2: Point) -> Point {
    p1.midpoint(p2)
}
