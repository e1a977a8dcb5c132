//! Geometric primitives for diagram layout.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in diagram space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - An axis-aligned box given by its minimum and maximum corners
//! - [`Insets`] - Padding values for four sides
//!
//! # Coordinate System
//!
//! Layouts use the SVG convention:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! "North" is therefore negative Y.

use serde::{Deserialize, Serialize};

/// Tolerance used by geometric predicates that compare floating coordinates.
pub const EPSILON: f32 = 1e-3;

/// A 2D point in diagram coordinate space.
///
/// # Examples
///
/// ```
/// # use c4_layout_core::geometry::Point;
/// let a = Point::new(10.0, 20.0);
/// let b = Point::new(13.0, 24.0);
///
/// assert_eq!(a.distance(b), 5.0);
/// assert_eq!(a.midpoint(b), Point::new(11.5, 22.0));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Creates a new point with the specified x-coordinate
    pub fn with_x(mut self, x: f32) -> Self {
        self.x = x;
        self
    }

    /// Creates a new point with the specified y-coordinate
    pub fn with_y(mut self, y: f32) -> Self {
        self.y = y;
        self
    }

    /// Adds another point to this point, returning a new point.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Calculates the midpoint between this point and another point
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Euclidean length of the vector from the origin to this point
    pub fn hypot(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance to another point
    pub fn distance(self, other: Point) -> f32 {
        self.sub_point(other).hypot()
    }

    /// Multiplies both coordinates by the given factor.
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Linear interpolation towards `other`; `t = 0` is `self`, `t = 1` is `other`.
    pub fn lerp(self, other: Point, t: f32) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// Angle of the vector from this point to `other`, in degrees.
    ///
    /// Measured clockwise from +X because Y grows downward.
    pub fn angle_to(self, other: Point) -> f32 {
        (other.y - self.y).atan2(other.x - self.x).to_degrees()
    }

    /// Returns true if both coordinates are within [`EPSILON`] of `other`.
    pub fn approx_eq(self, other: Point) -> bool {
        (self.x - other.x).abs() <= EPSILON && (self.y - other.y).abs() <= EPSILON
    }

    /// Converts a point and size into a bounds rectangle centered on the point.
    pub fn to_bounds(self, size: Size) -> Bounds {
        Bounds::new_from_center(self, size)
    }
}

/// Represents the dimensions of an element with width and height
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }

    /// Creates a new size with the specified width
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    /// Creates a new size with the specified height
    pub fn with_height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    /// Component-wise maximum of two sizes
    pub fn max(self, other: Size) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }

    /// Component-wise minimum of two sizes
    pub fn min(self, other: Size) -> Self {
        Self {
            width: self.width.min(other.width),
            height: self.height.min(other.height),
        }
    }

    /// Clamps each dimension between the matching dimensions of `min` and `max`.
    ///
    /// When `min` exceeds `max` on an axis, `min` wins.
    pub fn clamp(self, min: Size, max: Size) -> Self {
        Self {
            width: self.width.min(max.width).max(min.width),
            height: self.height.min(max.height).max(min.height),
        }
    }

    /// Returns a new Size grown by the horizontal and vertical inset sums
    pub fn add_padding(self, insets: Insets) -> Self {
        Self {
            width: self.width + insets.horizontal_sum(),
            height: self.height + insets.vertical_sum(),
        }
    }

    /// Area of the rectangle
    pub fn area(self) -> f32 {
        self.width * self.height
    }

    /// Length of the diagonal
    pub fn diagonal(self) -> f32 {
        self.width.hypot(self.height)
    }

    /// Returns true if both width and height are zero
    pub fn is_zero(self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }

    /// Merges two sizes vertically by adding their heights and taking the maximum width
    pub fn merge_vertical(self, other: Size) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height + other.height,
        }
    }
}

/// An axis-aligned rectangle stored as minimum and maximum coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates a new bounds from a center point and a size
    pub fn new_from_center(center: Point, size: Size) -> Self {
        let half_width = size.width / 2.0;
        let half_height = size.height / 2.0;
        Self {
            min_x: center.x - half_width,
            min_y: center.y - half_height,
            max_x: center.x + half_width,
            max_y: center.y + half_height,
        }
    }

    /// Creates a new bounds from a top-left point and a size
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    /// Smallest bounds containing every item, or `None` for an empty iterator.
    pub fn union_all<I>(items: I) -> Option<Self>
    where
        I: IntoIterator<Item = Bounds>,
    {
        items.into_iter().reduce(|acc, b| acc.merge(&b))
    }

    pub fn min_x(self) -> f32 {
        self.min_x
    }

    pub fn min_y(self) -> f32 {
        self.min_y
    }

    pub fn max_x(self) -> f32 {
        self.max_x
    }

    pub fn max_y(self) -> f32 {
        self.max_y
    }

    /// Returns the center point of the bounds
    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns the width of the bounds
    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Returns the top-left corner as a Point
    pub fn min_point(self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    /// Returns the bottom-right corner as a Point
    pub fn max_point(self) -> Point {
        Point::new(self.max_x, self.max_y)
    }

    /// Converts bounds to a Size object
    pub fn to_size(self) -> Size {
        Size::new(self.width(), self.height())
    }

    pub fn area(self) -> f32 {
        self.width() * self.height()
    }

    /// Smallest bounds containing both `self` and `other`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use c4_layout_core::geometry::{Bounds, Point, Size};
    /// let header = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 30.0));
    /// let body = Bounds::new_from_top_left(Point::new(10.0, 40.0), Size::new(120.0, 80.0));
    ///
    /// let combined = header.merge(&body);
    /// assert_eq!(combined.width(), 130.0);
    /// assert_eq!(combined.height(), 120.0);
    /// ```
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Moves the bounds by the specified offset.
    pub fn translate(&self, offset: Point) -> Self {
        Self {
            min_x: self.min_x + offset.x,
            min_y: self.min_y + offset.y,
            max_x: self.max_x + offset.x,
            max_y: self.max_y + offset.y,
        }
    }

    /// Returns a copy with the same size whose center is `center`.
    pub fn with_center(&self, center: Point) -> Self {
        Self::new_from_center(center, self.to_size())
    }

    /// Grows the bounds outward by the given insets.
    pub fn add_padding(&self, insets: Insets) -> Self {
        Self {
            min_x: self.min_x - insets.left(),
            min_y: self.min_y - insets.top(),
            max_x: self.max_x + insets.right(),
            max_y: self.max_y + insets.bottom(),
        }
    }

    /// Grows the bounds outward by `amount` on every side.
    pub fn inflate(&self, amount: f32) -> Self {
        self.add_padding(Insets::uniform(amount))
    }

    /// Returns true if the point lies strictly inside, ignoring the boundary.
    pub fn contains_point_strict(&self, p: Point) -> bool {
        p.x > self.min_x + EPSILON
            && p.x < self.max_x - EPSILON
            && p.y > self.min_y + EPSILON
            && p.y < self.max_y - EPSILON
    }

    /// Returns true if `other` lies within `self`, with [`EPSILON`] slack.
    pub fn contains_bounds(&self, other: &Bounds) -> bool {
        other.min_x >= self.min_x - EPSILON
            && other.min_y >= self.min_y - EPSILON
            && other.max_x <= self.max_x + EPSILON
            && other.max_y <= self.max_y + EPSILON
    }

    /// Amount of overlap on each axis once both boxes are grown by `padding / 2`.
    ///
    /// Positive values on both axes mean the boxes are closer than `padding`.
    pub fn padded_overlap(&self, other: &Bounds, padding: f32) -> (f32, f32) {
        let ox = self.max_x.min(other.max_x) - self.min_x.max(other.min_x) + padding;
        let oy = self.max_y.min(other.max_y) - self.min_y.max(other.min_y) + padding;
        (ox, oy)
    }

    /// Returns true if the interiors of the two boxes intersect.
    pub fn intersects(&self, other: &Bounds) -> bool {
        let (ox, oy) = self.padded_overlap(other, 0.0);
        ox > EPSILON && oy > EPSILON
    }

    /// Returns true if the segment `a..b` passes through the interior of the box.
    ///
    /// Segments that only touch the boundary do not count.
    pub fn intersects_segment(&self, a: Point, b: Point) -> bool {
        // Liang-Barsky clipping against the shrunk interior.
        let (x0, y0) = (self.min_x + EPSILON, self.min_y + EPSILON);
        let (x1, y1) = (self.max_x - EPSILON, self.max_y - EPSILON);
        if x0 >= x1 || y0 >= y1 {
            return false;
        }
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let mut t0 = 0.0f32;
        let mut t1 = 1.0f32;
        for (p, q) in [
            (-dx, a.x - x0),
            (dx, x1 - a.x),
            (-dy, a.y - y0),
            (dy, y1 - a.y),
        ] {
            if p == 0.0 {
                if q <= 0.0 {
                    return false;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return false;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return false;
                }
                t1 = t1.min(r);
            }
        }
        t0 < t1
    }
}

/// Represents spacing around an element with potentially different values per side
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Insets {
    top: f32,
    right: f32,
    bottom: f32,
    left: f32,
}

impl Insets {
    /// Creates new insets with specified values for each side
    pub fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Creates uniform insets with the same value for all sides
    pub fn uniform(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn top(self) -> f32 {
        self.top
    }

    pub fn right(self) -> f32 {
        self.right
    }

    pub fn bottom(self) -> f32 {
        self.bottom
    }

    pub fn left(self) -> f32 {
        self.left
    }

    /// Returns a new Insets with the specified top value
    pub fn with_top(self, top: f32) -> Self {
        Self { top, ..self }
    }

    /// Returns the sum of left and right insets
    pub fn horizontal_sum(self) -> f32 {
        self.left + self.right
    }

    /// Returns the sum of top and bottom insets
    pub fn vertical_sum(self) -> f32 {
        self.top + self.bottom
    }
}

/// Returns true if segments `a1..a2` and `b1..b2` cross.
///
/// Segments sharing an endpoint, or touching collinearly, are not counted so
/// that edges leaving the same port never register as crossings.
pub fn segments_cross(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    if a1.approx_eq(b1) || a1.approx_eq(b2) || a2.approx_eq(b1) || a2.approx_eq(b2) {
        return false;
    }
    let d1 = orientation(b1, b2, a1);
    let d2 = orientation(b1, b2, a2);
    let d3 = orientation(a1, a2, b1);
    let d4 = orientation(a1, a2, b2);
    ((d1 > EPSILON && d2 < -EPSILON) || (d1 < -EPSILON && d2 > EPSILON))
        && ((d3 > EPSILON && d4 < -EPSILON) || (d3 < -EPSILON && d4 > EPSILON))
}

fn orientation(a: Point, b: Point, c: Point) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Bounds {
        Bounds::new_from_top_left(Point::new(x, y), Size::new(w, h))
    }

    #[test]
    fn test_point_arithmetic() {
        let p1 = Point::new(1.0, 2.0);
        let p2 = Point::new(3.0, 4.0);
        assert_eq!(p1.add_point(p2), Point::new(4.0, 6.0));
        assert_eq!(p2.sub_point(p1), Point::new(2.0, 2.0));
        assert_eq!(p1.scale(2.0), Point::new(2.0, 4.0));
        assert_eq!(p1.lerp(p2, 0.5), p1.midpoint(p2));
    }

    #[test]
    fn test_point_angle_to() {
        let origin = Point::default();
        assert_approx_eq!(f32, origin.angle_to(Point::new(1.0, 0.0)), 0.0);
        assert_approx_eq!(f32, origin.angle_to(Point::new(0.0, 1.0)), 90.0);
        assert_approx_eq!(f32, origin.angle_to(Point::new(0.0, -1.0)), -90.0);
    }

    #[test]
    fn test_size_clamp() {
        let min = Size::new(50.0, 30.0);
        let max = Size::new(200.0, 100.0);
        assert_eq!(Size::new(10.0, 500.0).clamp(min, max), Size::new(50.0, 100.0));
        assert_eq!(Size::new(120.0, 60.0).clamp(min, max), Size::new(120.0, 60.0));
    }

    #[test]
    fn test_size_diagonal_and_area() {
        let size = Size::new(3.0, 4.0);
        assert_eq!(size.diagonal(), 5.0);
        assert_eq!(size.area(), 12.0);
    }

    #[test]
    fn test_bounds_constructors_agree() {
        let a = Bounds::new_from_center(Point::new(50.0, 60.0), Size::new(20.0, 30.0));
        let b = rect(40.0, 45.0, 20.0, 30.0);
        assert_eq!(a, b);
        assert_eq!(a.center(), Point::new(50.0, 60.0));
        assert_eq!(a.max_point(), Point::new(60.0, 75.0));
    }

    #[test]
    fn test_bounds_union_all() {
        assert_eq!(Bounds::union_all(Vec::new()), None);
        let merged = Bounds::union_all([rect(0.0, 0.0, 10.0, 10.0), rect(20.0, -5.0, 5.0, 5.0)])
            .unwrap();
        assert_eq!(merged, rect(0.0, -5.0, 25.0, 15.0));
    }

    #[test]
    fn test_bounds_contains_bounds() {
        let outer = rect(0.0, 0.0, 100.0, 100.0);
        assert!(outer.contains_bounds(&rect(10.0, 10.0, 80.0, 80.0)));
        assert!(outer.contains_bounds(&outer));
        assert!(!outer.contains_bounds(&rect(50.0, 50.0, 60.0, 10.0)));
    }

    #[test]
    fn test_bounds_padded_overlap() {
        let a = rect(0.0, 0.0, 100.0, 100.0);
        let b = rect(50.0, 50.0, 100.0, 100.0);
        assert_eq!(a.padded_overlap(&b, 10.0), (60.0, 60.0));

        // Touching boxes overlap only within the padding band.
        let c = rect(100.0, 0.0, 10.0, 10.0);
        let (ox, _) = a.padded_overlap(&c, 10.0);
        assert_eq!(ox, 10.0);
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_bounds_intersects_segment() {
        let b = rect(10.0, 10.0, 20.0, 20.0);
        assert!(b.intersects_segment(Point::new(0.0, 20.0), Point::new(40.0, 20.0)));
        assert!(b.intersects_segment(Point::new(20.0, 0.0), Point::new(20.0, 15.0)));
        // Running along the boundary is allowed.
        assert!(!b.intersects_segment(Point::new(0.0, 10.0), Point::new(40.0, 10.0)));
        assert!(!b.intersects_segment(Point::new(0.0, 0.0), Point::new(5.0, 40.0)));
        // Starting on the edge and leaving outward is allowed.
        assert!(!b.intersects_segment(Point::new(30.0, 20.0), Point::new(40.0, 20.0)));
    }

    #[test]
    fn test_segments_cross() {
        let cross = segments_cross(
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 0.0),
        );
        assert!(cross);

        let shared_endpoint = segments_cross(
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
        );
        assert!(!shared_endpoint);

        let parallel = segments_cross(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 5.0),
            Point::new(10.0, 5.0),
        );
        assert!(!parallel);
    }

    #[test]
    fn test_insets_sums() {
        let insets = Insets::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(insets.horizontal_sum(), 6.0);
        assert_eq!(insets.vertical_sum(), 4.0);
        assert_eq!(insets.with_top(9.0).top(), 9.0);
        let padded = rect(2.0, 3.0, 4.0, 5.0).add_padding(insets);
        assert_eq!(padded, Bounds::new_from_top_left(Point::new(-2.0, 2.0), Size::new(10.0, 9.0)));
    }
}
