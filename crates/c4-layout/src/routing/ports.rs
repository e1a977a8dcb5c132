//! Boundary port selection.

use serde::Serialize;

use c4_layout_core::geometry::{Bounds, Point};

/// Side of a box an edge attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    /// Outward unit normal.
    pub fn normal(self) -> Point {
        match self {
            Side::Top => Point::new(0.0, -1.0),
            Side::Right => Point::new(1.0, 0.0),
            Side::Bottom => Point::new(0.0, 1.0),
            Side::Left => Point::new(-1.0, 0.0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }
}

/// A point on a box boundary and the side it lies on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Port {
    pub point: Point,
    pub side: Side,
}

impl Port {
    /// Midpoint of `side`.
    pub fn on(bounds: Bounds, side: Side) -> Self {
        let c = bounds.center();
        let point = match side {
            Side::Top => Point::new(c.x(), bounds.min_y()),
            Side::Right => Point::new(bounds.max_x(), c.y()),
            Side::Bottom => Point::new(c.x(), bounds.max_y()),
            Side::Left => Point::new(bounds.min_x(), c.y()),
        };
        Self { point, side }
    }

    /// The point `length` away from the port along its outward normal.
    pub fn stub(&self, length: f32) -> Point {
        self.point.add_point(self.side.normal().scale(length))
    }

    /// Returns true if the port's side turns away from `target`.
    fn faces_away(&self, target: Point) -> bool {
        let n = self.side.normal();
        let d = target.sub_point(self.point);
        n.x() * d.x() + n.y() * d.y() < 0.0
    }
}

/// Picks the pair of side midpoints with the lowest connector cost.
///
/// Cost is the straight distance between the ports plus `facing_penalty`
/// for each port whose side faces away from the other box. Ties keep the
/// first pair in [`Side::ALL`] order.
pub fn choose_ports(from: Bounds, to: Bounds, facing_penalty: f32) -> (Port, Port) {
    let mut best: Option<(f32, Port, Port)> = None;
    for from_side in Side::ALL {
        let a = Port::on(from, from_side);
        for to_side in Side::ALL {
            let b = Port::on(to, to_side);
            let mut cost = a.point.distance(b.point);
            if a.faces_away(to.center()) {
                cost += facing_penalty;
            }
            if b.faces_away(from.center()) {
                cost += facing_penalty;
            }
            if best.is_none_or(|(c, _, _)| cost < c) {
                best = Some((cost, a, b));
            }
        }
    }
    match best {
        Some((_, a, b)) => (a, b),
        None => (Port::on(from, Side::Bottom), Port::on(to, Side::Top)),
    }
}

#[cfg(test)]
mod tests {
    use c4_layout_core::geometry::Size;

    use super::*;

    fn rect(x: f32, y: f32) -> Bounds {
        Bounds::new_from_top_left(Point::new(x, y), Size::new(100.0, 50.0))
    }

    #[test]
    fn test_vertical_neighbors_use_bottom_and_top() {
        let (a, b) = choose_ports(rect(0.0, 0.0), rect(0.0, 200.0), 200.0);
        assert_eq!(a.side, Side::Bottom);
        assert_eq!(b.side, Side::Top);
        assert_eq!(a.point, Point::new(50.0, 50.0));
        assert_eq!(b.point, Point::new(50.0, 200.0));
    }

    #[test]
    fn test_horizontal_neighbors_use_facing_sides() {
        let (a, b) = choose_ports(rect(300.0, 0.0), rect(0.0, 0.0), 200.0);
        assert_eq!(a.side, Side::Left);
        assert_eq!(b.side, Side::Right);
    }

    #[test]
    fn test_stub_extends_outward() {
        let port = Port::on(rect(0.0, 0.0), Side::Left);
        assert_eq!(port.stub(16.0), Point::new(-16.0, 25.0));
    }
}
