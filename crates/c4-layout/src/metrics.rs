//! Layout quality scores and the per-phase debug trace.

use std::time::Duration;

use indexmap::IndexMap;
use serde::Serialize;

use c4_layout_core::{
    geometry::{Bounds, Point, segments_cross},
    identifier::Id,
};

use crate::{
    hierarchy::Hierarchy,
    pipeline::Phase,
    routing::{RoutedRelationship, RoutingStyle, spline},
};

/// Samples used when a curved edge takes part in crossing counts.
const CURVE_SAMPLES: usize = 8;

/// Aggregate scores of a finished layout.
///
/// Ratios are in `[0, 1]` unless noted; bigger is better except for the
/// crossing, bend and length totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct QualityMetrics {
    /// Width over height of the node bounding box.
    pub aspect_ratio: f32,
    /// Share of the bounding box covered by root elements.
    pub coverage: f32,
    /// Pairs of routed segments from different edges that cross.
    pub edge_crossings: usize,
    pub edge_bends: usize,
    pub total_edge_length: f32,
    /// One minus the coefficient of variation of edge lengths.
    pub uniformity: f32,
    /// How close the area-weighted centroid of the roots sits to the middle.
    pub balance: f32,
    /// Share of the bounding box covered by elements drawn as boxes without
    /// children inside.
    pub compactness: f32,
}

impl QualityMetrics {
    pub fn compute(
        hierarchy: &Hierarchy,
        placed: &IndexMap<Id, Bounds>,
        routed: &[RoutedRelationship],
    ) -> Self {
        let roots: Vec<Bounds> = hierarchy
            .roots()
            .iter()
            .filter_map(|id| placed.get(id).copied())
            .collect();
        let Some(bbox) = Bounds::union_all(roots.iter().copied()) else {
            return Self::default();
        };
        let area = bbox.area();

        let aspect_ratio = if bbox.height() > 0.0 {
            bbox.width() / bbox.height()
        } else {
            0.0
        };
        let root_area: f32 = roots.iter().map(|b| b.area()).sum();
        let leaf_area: f32 = hierarchy
            .iter()
            .filter(|n| !n.concealed && !n.is_open_container())
            .filter_map(|n| placed.get(&n.id))
            .map(|b| b.area())
            .sum();

        let balance = if root_area > 0.0 && bbox.to_size().diagonal() > 0.0 {
            let weighted = roots.iter().fold(Point::default(), |acc, b| {
                acc.add_point(b.center().scale(b.area()))
            });
            let centroid = weighted.scale(1.0 / root_area);
            let half_diagonal = bbox.to_size().diagonal() / 2.0;
            (1.0 - centroid.distance(bbox.center()) / half_diagonal).clamp(0.0, 1.0)
        } else {
            1.0
        };

        Self {
            aspect_ratio,
            coverage: ratio(root_area, area),
            edge_crossings: count_edge_crossings(routed),
            edge_bends: routed.iter().map(|r| r.bends).sum(),
            total_edge_length: routed.iter().map(|r| r.length).sum(),
            uniformity: uniformity(routed),
            balance,
            compactness: ratio(leaf_area, area),
        }
    }
}

fn ratio(part: f32, whole: f32) -> f32 {
    if whole > 0.0 {
        (part / whole).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn uniformity(routed: &[RoutedRelationship]) -> f32 {
    if routed.len() < 2 {
        return 1.0;
    }
    let n = routed.len() as f32;
    let mean = routed.iter().map(|r| r.length).sum::<f32>() / n;
    if mean <= 0.0 {
        return 1.0;
    }
    let variance = routed.iter().map(|r| (r.length - mean).powi(2)).sum::<f32>() / n;
    (1.0 - variance.sqrt() / mean).clamp(0.0, 1.0)
}

/// The drawn path of an edge as a polyline.
fn drawn_path(rel: &RoutedRelationship) -> Vec<Point> {
    match (rel.style, rel.points.as_slice(), rel.control_points.as_slice()) {
        (RoutingStyle::Spline, [p0, p3], [c1, c2]) => (0..=CURVE_SAMPLES)
            .map(|i| spline::point_at(*p0, *c1, *c2, *p3, i as f32 / CURVE_SAMPLES as f32))
            .collect(),
        _ => rel.points.clone(),
    }
}

/// Counts crossing segment pairs between distinct edges.
pub fn count_edge_crossings(routed: &[RoutedRelationship]) -> usize {
    let paths: Vec<Vec<Point>> = routed.iter().map(drawn_path).collect();
    let mut crossings = 0;
    for (i, a) in paths.iter().enumerate() {
        for b in &paths[i + 1..] {
            for sa in a.windows(2) {
                crossings += b
                    .windows(2)
                    .filter(|sb| segments_cross(sa[0], sa[1], sb[0], sb[1]))
                    .count();
            }
        }
    }
    crossings
}

/// Wall-clock time of one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseTiming {
    pub phase: Phase,
    pub micros: u64,
    /// Elements the phase worked on.
    pub nodes: usize,
}

/// Timings of a run, recorded when `LayoutOptions::debug` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DebugTrace {
    pub phases: Vec<PhaseTiming>,
}

impl DebugTrace {
    pub fn record(&mut self, phase: Phase, elapsed: Duration, nodes: usize) {
        self.phases.push(PhaseTiming {
            phase,
            micros: u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            nodes,
        });
    }

    pub fn total_micros(&self) -> u64 {
        self.phases.iter().map(|p| p.micros).sum()
    }

    pub fn get(&self, phase: Phase) -> Option<&PhaseTiming> {
        self.phases.iter().find(|p| p.phase == phase)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use c4_layout_core::{geometry::Size, view::ViewState};

    use super::*;
    use crate::{
        optimizer::test_support::{id, system_with},
        routing::{Arrow, SegmentKind},
    };

    fn edge(name: &str, points: Vec<Point>) -> RoutedRelationship {
        let length = crate::routing::polyline_length(&points);
        RoutedRelationship {
            id: id(name),
            from: id("a"),
            to: id("b"),
            source: id("a"),
            target: id("b"),
            style: RoutingStyle::Straight,
            segments: vec![SegmentKind::Line; points.len().saturating_sub(1)],
            arrow: Arrow {
                end: points.last().copied().unwrap_or_default(),
                angle: 0.0,
            },
            bends: points.len().saturating_sub(2),
            points,
            control_points: Vec::new(),
            label: None,
            length,
            fallback: false,
            z_index: 0,
        }
    }

    #[test]
    fn test_crossings_between_distinct_edges() {
        let routed = vec![
            edge("r1", vec![Point::new(0.0, 0.0), Point::new(100.0, 100.0)]),
            edge("r2", vec![Point::new(0.0, 100.0), Point::new(100.0, 0.0)]),
            edge("r3", vec![Point::new(200.0, 0.0), Point::new(200.0, 100.0)]),
        ];
        assert_eq!(count_edge_crossings(&routed), 1);
    }

    #[test]
    fn test_uniformity_of_equal_lengths() {
        let routed = vec![
            edge("r1", vec![Point::new(0.0, 0.0), Point::new(0.0, 50.0)]),
            edge("r2", vec![Point::new(10.0, 0.0), Point::new(10.0, 50.0)]),
        ];
        assert_approx_eq!(f32, uniformity(&routed), 1.0);
    }

    #[test]
    fn test_single_root_fills_its_box() {
        let graph = system_with(&["a", "b"]);
        let hierarchy = Hierarchy::build(&graph, &ViewState::all());
        let mut placed = IndexMap::new();
        placed.insert(
            id("sys"),
            Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(400.0, 200.0)),
        );
        placed.insert(
            id("a"),
            Bounds::new_from_top_left(Point::new(20.0, 40.0), Size::new(100.0, 100.0)),
        );
        placed.insert(
            id("b"),
            Bounds::new_from_top_left(Point::new(200.0, 40.0), Size::new(100.0, 100.0)),
        );

        let metrics = QualityMetrics::compute(&hierarchy, &placed, &[]);
        assert_approx_eq!(f32, metrics.aspect_ratio, 2.0);
        assert_approx_eq!(f32, metrics.coverage, 1.0);
        assert_approx_eq!(f32, metrics.balance, 1.0);
        assert_approx_eq!(f32, metrics.compactness, 0.25);
        assert_eq!(metrics.edge_crossings, 0);
    }

    #[test]
    fn test_trace_totals() {
        let mut trace = DebugTrace::default();
        trace.record(Phase::Sizing, Duration::from_micros(40), 3);
        trace.record(Phase::Route, Duration::from_micros(60), 1);
        assert_eq!(trace.total_micros(), 100);
        assert_eq!(trace.get(Phase::Route).map(|p| p.nodes), Some(1));
        assert!(trace.get(Phase::Metrics).is_none());
    }
}
