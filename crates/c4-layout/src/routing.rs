//! Edge routing.
//!
//! Relationships are drawn between the elements that represent their
//! endpoints: a relationship to an element inside a collapsed container is
//! drawn to the container. Each edge gets boundary ports, a path in the
//! requested [`RoutingStyle`], and derived label and arrow geometry.

pub mod orthogonal;
pub mod ports;
pub mod spline;

use indexmap::IndexMap;
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use c4_layout_core::{
    geometry::{Bounds, Point, Size},
    identifier::Id,
    model::{Graph, Level, NodeKind, Relationship, RoutingHint},
};

use crate::{config::LayoutOptions, hierarchy::Hierarchy};

use orthogonal::{Obstacle, SearchParams};
use ports::{Port, choose_ports};

/// How an edge path is shaped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingStyle {
    /// Axis-aligned segments around obstacles.
    #[default]
    Orthogonal,
    /// One cubic curve.
    Spline,
    /// A single straight segment.
    Straight,
}

/// Shape of one path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentKind {
    Line,
    /// Cubic curve through the relationship's control points.
    Arc,
}

/// Placement of a relationship label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeLabel {
    pub text: String,
    pub lines: Vec<String>,
    /// Center of the label.
    pub position: Point,
    /// Rotation in degrees, within [-90, 90].
    pub angle: f32,
    pub bounds: Bounds,
}

/// Arrow head at the target end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Arrow {
    pub end: Point,
    /// Direction of travel in degrees, clockwise from +X.
    pub angle: f32,
}

/// A relationship with its drawn geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutedRelationship {
    pub id: Id,
    pub from: Id,
    pub to: Id,
    /// Element the path leaves; `from` or the collapsed container hiding it.
    pub source: Id,
    /// Element the path enters.
    pub target: Id,
    pub style: RoutingStyle,
    pub points: Vec<Point>,
    pub control_points: Vec<Point>,
    pub segments: Vec<SegmentKind>,
    pub label: Option<EdgeLabel>,
    pub arrow: Arrow,
    pub length: f32,
    pub bends: usize,
    /// The requested style could not be routed and a straight line was used.
    pub fallback: bool,
    pub z_index: i32,
}

/// Normalizes an angle in degrees into [-90, 90] so text never reads upside down.
pub fn readable_angle(angle: f32) -> f32 {
    let mut a = angle;
    while a > 90.0 {
        a -= 180.0;
    }
    while a < -90.0 {
        a += 180.0;
    }
    a
}

/// Total length of a polyline.
pub fn polyline_length(points: &[Point]) -> f32 {
    points.windows(2).map(|s| s[0].distance(s[1])).sum()
}

/// Point halfway along a polyline and the index of the segment holding it.
pub fn polyline_midpoint(points: &[Point]) -> (Point, usize) {
    let half = polyline_length(points) / 2.0;
    let mut walked = 0.0;
    for (i, s) in points.windows(2).enumerate() {
        let len = s[0].distance(s[1]);
        if walked + len >= half && len > 0.0 {
            return (s[0].lerp(s[1], (half - walked) / len), i);
        }
        walked += len;
    }
    (points.first().copied().unwrap_or_default(), 0)
}

/// Routes every drawable relationship of a laid-out scene.
pub struct EdgeRouter<'a> {
    graph: &'a Graph,
    hierarchy: &'a Hierarchy,
    placed: &'a IndexMap<Id, Bounds>,
    options: &'a LayoutOptions,
}

impl<'a> EdgeRouter<'a> {
    pub fn new(
        graph: &'a Graph,
        hierarchy: &'a Hierarchy,
        placed: &'a IndexMap<Id, Bounds>,
        options: &'a LayoutOptions,
    ) -> Self {
        Self {
            graph,
            hierarchy,
            placed,
            options,
        }
    }

    /// Routes relationships in graph order, skipping those whose endpoints
    /// are not drawn or are drawn as the same element.
    pub fn route_all(&self) -> Vec<RoutedRelationship> {
        let routed: Vec<RoutedRelationship> = self
            .graph
            .relationships()
            .iter()
            .filter_map(|rel| self.route(rel))
            .collect();
        debug!(
            relationships = self.graph.relationships().len(),
            routed = routed.len(),
            fallbacks = routed.iter().filter(|r| r.fallback).count();
            "Routing finished",
        );
        routed
    }

    pub fn route(&self, rel: &Relationship) -> Option<RoutedRelationship> {
        let source = self.hierarchy.representative(rel.from())?;
        let target = self.hierarchy.representative(rel.to())?;
        if source == target {
            trace!(relationship:% = rel.id(); "Skipping relationship drawn onto one element");
            return None;
        }
        let from_box = *self.placed.get(&source)?;
        let to_box = *self.placed.get(&target)?;

        let style = match rel.routing() {
            RoutingHint::Auto => self.options.routing.style,
            RoutingHint::Orthogonal => RoutingStyle::Orthogonal,
            RoutingHint::Spline => RoutingStyle::Spline,
            RoutingHint::Straight => RoutingStyle::Straight,
        };
        let (start, end) = choose_ports(from_box, to_box, self.options.routing.facing_penalty);

        let mut fallback = false;
        let (points, control_points, segments) = match style {
            RoutingStyle::Spline => {
                let [c1, c2] = spline::control_points(start, end);
                (vec![start.point, end.point], vec![c1, c2], vec![SegmentKind::Arc])
            }
            RoutingStyle::Straight => (vec![start.point, end.point], Vec::new(), vec![SegmentKind::Line]),
            RoutingStyle::Orthogonal => {
                let points = match self.orthogonal(rel, source, target, start, end) {
                    Some(points) => points,
                    None => {
                        warn!(
                            relationship:% = rel.id();
                            "No orthogonal route found, using a straight line",
                        );
                        fallback = true;
                        vec![start.point, end.point]
                    }
                };
                let segments = vec![SegmentKind::Line; points.len().saturating_sub(1)];
                (points, Vec::new(), segments)
            }
        };

        let (length, label_anchor, arrow_angle) = match control_points.as_slice() {
            [c1, c2] => {
                let (p0, p3) = (start.point, end.point);
                let mid = spline::point_at(p0, *c1, *c2, p3, 0.5);
                let tangent = spline::tangent_at(p0, *c1, *c2, p3, 0.5);
                let end_tangent = spline::tangent_at(p0, *c1, *c2, p3, 1.0);
                (
                    spline::length(p0, *c1, *c2, p3),
                    (mid, Point::default().angle_to(tangent)),
                    Point::default().angle_to(end_tangent),
                )
            }
            _ => {
                let (mid, segment) = polyline_midpoint(&points);
                let angle = points
                    .get(segment)
                    .zip(points.get(segment + 1))
                    .map_or(0.0, |(a, b)| a.angle_to(*b));
                let n = points.len();
                let arrow_angle = if n >= 2 {
                    points[n - 2].angle_to(points[n - 1])
                } else {
                    0.0
                };
                (polyline_length(&points), (mid, angle), arrow_angle)
            }
        };

        let label = rel.display_label().map(|text| self.label(rel, text, label_anchor.0, label_anchor.1));
        let bends = if segments.first() == Some(&SegmentKind::Arc) {
            0
        } else {
            points.len().saturating_sub(2)
        };
        trace!(relationship:% = rel.id(), bends, length; "Routed relationship");

        Some(RoutedRelationship {
            id: rel.id(),
            from: rel.from(),
            to: rel.to(),
            source,
            target,
            style,
            arrow: Arrow {
                end: end.point,
                angle: arrow_angle,
            },
            points,
            control_points,
            segments,
            label,
            length,
            bends,
            fallback,
            z_index: rel.z_index(),
        })
    }

    fn label(&self, rel: &Relationship, text: String, position: Point, angle: f32) -> EdgeLabel {
        let (kind, level) = self
            .graph
            .node(rel.from())
            .map(|n| (n.kind(), n.level()))
            .unwrap_or((NodeKind::Container, Level::Container));
        let measured = self.options.measurer.measure_multiline(
            &text,
            kind,
            level,
            self.options.routing.label_max_width,
        );
        let pad = self.options.routing.label_padding;
        let size = Size::new(
            measured.size.width() + 2.0 * pad,
            measured.size.height() + 2.0 * pad,
        );
        EdgeLabel {
            text,
            lines: measured.lines,
            position,
            angle: readable_angle(angle),
            bounds: Bounds::new_from_center(position, size),
        }
    }

    /// Boxes the edge between `source` and `target` must not cross.
    ///
    /// The endpoints, their ancestors and their descendants are exempt.
    /// Elements the relationship asks to avoid get double clearance.
    fn obstacles(&self, rel: &Relationship, source: Id, target: Id) -> Vec<Obstacle> {
        let clearance = self.options.routing.clearance;
        self.placed
            .iter()
            .filter(|&(&id, _)| {
                id != source
                    && id != target
                    && !self.hierarchy.is_ancestor(id, source)
                    && !self.hierarchy.is_ancestor(id, target)
                    && !self.hierarchy.is_ancestor(source, id)
                    && !self.hierarchy.is_ancestor(target, id)
            })
            .map(|(id, bounds)| {
                let factor = if rel.avoid().contains(id) { 2.0 } else { 1.0 };
                Obstacle::new(*bounds, clearance * factor)
            })
            .collect()
    }

    fn orthogonal(
        &self,
        rel: &Relationship,
        source: Id,
        target: Id,
        start: Port,
        end: Port,
    ) -> Option<Vec<Point>> {
        let routing = &self.options.routing;
        let obstacles = self.obstacles(rel, source, target);
        let raw: Vec<Bounds> = obstacles.iter().map(|o| o.bounds).collect();

        let (from_box, to_box) = (self.placed.get(&source)?, self.placed.get(&target)?);
        let nested = self.hierarchy.is_ancestor(source, target) || self.hierarchy.is_ancestor(target, source);
        let hard: Vec<Bounds> = if nested {
            Vec::new()
        } else {
            vec![*from_box, *to_box]
        };

        let params = SearchParams {
            stub_length: routing.stub_length,
            bend_penalty: routing.bend_penalty,
            max_expansions: routing.max_expansions,
        };
        let endpoints = from_box.merge(to_box);
        let everything = Bounds::union_all(self.placed.values().copied()).unwrap_or(endpoints);
        let corridors = [
            endpoints.inflate(routing.corridor_margin),
            endpoints.inflate(routing.corridor_margin * 2.0),
            endpoints.inflate(routing.corridor_margin * 4.0),
            everything.inflate(routing.corridor_margin * 2.0),
        ];
        for (attempt, corridor) in corridors.iter().enumerate() {
            let Some(points) = orthogonal::route(start, end, &obstacles, &hard, *corridor, params) else {
                trace!(relationship:% = rel.id(), attempt; "Corridor attempt failed");
                continue;
            };
            if orthogonal::path_hits(&points, &raw) {
                trace!(relationship:% = rel.id(), attempt; "Route crossed an obstacle");
                continue;
            }
            return Some(points);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use c4_layout_core::{model::Node, view::ViewState};

    use super::*;

    fn id(s: &str) -> Id {
        Id::new(s).unwrap()
    }

    fn rect(x: f32, y: f32) -> Bounds {
        Bounds::new_from_top_left(Point::new(x, y), Size::new(120.0, 60.0))
    }

    struct Scene {
        graph: Graph,
        hierarchy: Hierarchy,
        placed: IndexMap<Id, Bounds>,
    }

    /// `a` and `b` with `wall` between them.
    fn walled(hint: RoutingHint) -> Scene {
        let mut builder = Graph::builder();
        builder
            .add_node(Node::new(id("a"), "A", NodeKind::Container))
            .add_node(Node::new(id("wall"), "Wall", NodeKind::Container))
            .add_node(Node::new(id("b"), "B", NodeKind::Container))
            .add_relationship(
                Relationship::new(id("r1"), id("a"), id("b"))
                    .with_label("Calls")
                    .with_technology("HTTPS")
                    .with_routing(hint),
            );
        let graph = builder.build().unwrap();
        let hierarchy = Hierarchy::build(&graph, &ViewState::all());
        let placed: IndexMap<Id, Bounds> = [
            (id("a"), rect(0.0, 0.0)),
            (id("wall"), rect(0.0, 150.0)),
            (id("b"), rect(0.0, 300.0)),
        ]
        .into_iter()
        .collect();
        Scene {
            graph,
            hierarchy,
            placed,
        }
    }

    fn route(scene: &Scene) -> RoutedRelationship {
        let options = LayoutOptions::default();
        let router = EdgeRouter::new(&scene.graph, &scene.hierarchy, &scene.placed, &options);
        router.route_all().pop().unwrap()
    }

    #[test]
    fn test_orthogonal_avoids_third_party_box() {
        let scene = walled(RoutingHint::Orthogonal);
        let routed = route(&scene);
        assert!(!routed.fallback);
        assert!(routed.points.len() > 2);
        assert!(!orthogonal::path_hits(&routed.points, &[scene.placed[&id("wall")]]));
        assert_eq!(routed.bends, routed.points.len() - 2);
        assert_eq!(routed.segments.len(), routed.points.len() - 1);
        assert_eq!(routed.arrow.end, *routed.points.last().unwrap());
        assert_approx_eq!(f32, routed.length, polyline_length(&routed.points), epsilon = 1e-3);
    }

    #[test]
    fn test_spline_has_two_points_and_controls() {
        let routed = route(&walled(RoutingHint::Spline));
        assert_eq!(routed.style, RoutingStyle::Spline);
        assert_eq!(routed.points.len(), 2);
        assert_eq!(routed.control_points.len(), 2);
        assert_eq!(routed.segments, vec![SegmentKind::Arc]);
        assert_eq!(routed.bends, 0);
    }

    #[test]
    fn test_label_geometry() {
        let routed = route(&walled(RoutingHint::Straight));
        let label = routed.label.unwrap();
        assert_eq!(label.text, "Calls\n[HTTPS]");
        assert!(label.bounds.width() > 0.0);
        assert!((-90.0..=90.0).contains(&label.angle));
        assert!(label.bounds.center().approx_eq(label.position));
        // Straight vertical edge: arrow points down.
        assert_approx_eq!(f32, routed.arrow.angle, 90.0, epsilon = 1e-3);
    }

    #[test]
    fn test_readable_angle() {
        assert_eq!(readable_angle(180.0), 0.0);
        assert_eq!(readable_angle(-135.0), 45.0);
        assert_eq!(readable_angle(90.0), 90.0);
    }

    #[test]
    fn test_polyline_midpoint() {
        let points = [Point::new(0.0, 0.0), Point::new(0.0, 10.0), Point::new(30.0, 10.0)];
        let (mid, segment) = polyline_midpoint(&points);
        assert_eq!(mid, Point::new(10.0, 10.0));
        assert_eq!(segment, 1);
    }
}
