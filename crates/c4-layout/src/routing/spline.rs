//! Cubic Bézier edges.

use c4_layout_core::geometry::Point;

use crate::routing::ports::Port;

/// Control points for a curve leaving `start` and entering `end` along
/// their normals.
pub fn control_points(start: Port, end: Port) -> [Point; 2] {
    let reach = (start.point.distance(end.point) / 3.0).max(20.0);
    [start.stub(reach), end.stub(reach)]
}

/// Point at `t` on the cubic curve `p0, c1, c2, p3`.
pub fn point_at(p0: Point, c1: Point, c2: Point, p3: Point, t: f32) -> Point {
    let u = 1.0 - t;
    let b0 = u * u * u;
    let b1 = 3.0 * u * u * t;
    let b2 = 3.0 * u * t * t;
    let b3 = t * t * t;
    Point::new(
        b0 * p0.x() + b1 * c1.x() + b2 * c2.x() + b3 * p3.x(),
        b0 * p0.y() + b1 * c1.y() + b2 * c2.y() + b3 * p3.y(),
    )
}

/// Tangent direction at `t`, unnormalized.
pub fn tangent_at(p0: Point, c1: Point, c2: Point, p3: Point, t: f32) -> Point {
    let u = 1.0 - t;
    let a = 3.0 * u * u;
    let b = 6.0 * u * t;
    let c = 3.0 * t * t;
    Point::new(
        a * (c1.x() - p0.x()) + b * (c2.x() - c1.x()) + c * (p3.x() - c2.x()),
        a * (c1.y() - p0.y()) + b * (c2.y() - c1.y()) + c * (p3.y() - c2.y()),
    )
}

/// Curve length by polyline sampling.
pub fn length(p0: Point, c1: Point, c2: Point, p3: Point) -> f32 {
    const STEPS: usize = 24;
    let mut total = 0.0;
    let mut last = p0;
    for i in 1..=STEPS {
        let p = point_at(p0, c1, c2, p3, i as f32 / STEPS as f32);
        total += last.distance(p);
        last = p;
    }
    total
}
