//! The output of a layout run.

use indexmap::IndexMap;
use serde::Serialize;

use c4_layout_core::{
    geometry::{Bounds, Point},
    identifier::Id,
    model::{Graph, Level, NodeKind},
};

use crate::{
    hierarchy::Hierarchy,
    metrics::{DebugTrace, QualityMetrics},
    routing::RoutedRelationship,
    sizing::SizedNode,
    strategy::StrategyKind,
};

/// A visible element with its absolute bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedNode {
    pub id: Id,
    pub bounds: Bounds,
    pub parent: Option<Id>,
    pub children: Vec<Id>,
    pub depth: usize,
    pub level: Level,
    pub kind: NodeKind,
    /// False for elements hidden inside a collapsed ancestor; those carry
    /// the bounds of the element drawn in their place.
    pub visible: bool,
    pub collapsed: bool,
    pub label_lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutResult {
    /// Every element of the view, parents before children.
    pub nodes: IndexMap<Id, PositionedNode>,
    pub relationships: Vec<RoutedRelationship>,
    /// Box around all drawn nodes, edges and labels.
    pub bounds: Bounds,
    pub center: Point,
    pub metrics: QualityMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugTrace>,
    pub strategy: StrategyKind,
}

impl LayoutResult {
    pub(crate) fn assemble(
        graph: &Graph,
        hierarchy: &Hierarchy,
        sized: &IndexMap<Id, SizedNode>,
        placed: &IndexMap<Id, Bounds>,
        relationships: Vec<RoutedRelationship>,
        strategy: StrategyKind,
    ) -> Self {
        let mut nodes = IndexMap::with_capacity(hierarchy.len());
        for id in hierarchy.pre_order() {
            let (Some(entry), Some(node)) = (hierarchy.get(id), graph.node(id)) else {
                continue;
            };
            let drawn_as = hierarchy.representative(id).unwrap_or(id);
            let Some(bounds) = placed.get(&drawn_as).copied() else {
                continue;
            };
            nodes.insert(
                id,
                PositionedNode {
                    id,
                    bounds,
                    parent: entry.parent,
                    children: entry.children.clone(),
                    depth: entry.depth,
                    level: node.level(),
                    kind: node.kind(),
                    visible: !entry.concealed,
                    collapsed: entry.collapsed,
                    label_lines: sized
                        .get(&id)
                        .map(|s| s.label_lines.clone())
                        .unwrap_or_default(),
                },
            );
        }

        let bounds = overall_bounds(placed, &relationships);
        Self {
            center: bounds.center(),
            bounds,
            nodes,
            metrics: QualityMetrics::compute(hierarchy, placed, &relationships),
            relationships,
            debug: None,
            strategy,
        }
    }

    pub fn node(&self, id: Id) -> Option<&PositionedNode> {
        self.nodes.get(&id)
    }

    /// Elements that are drawn, parents before children.
    pub fn visible_nodes(&self) -> impl Iterator<Item = &PositionedNode> {
        self.nodes.values().filter(|n| n.visible)
    }

    pub fn relationship(&self, id: Id) -> Option<&RoutedRelationship> {
        self.relationships.iter().find(|r| r.id == id)
    }
}

fn overall_bounds(placed: &IndexMap<Id, Bounds>, routed: &[RoutedRelationship]) -> Bounds {
    let path_points = routed
        .iter()
        .flat_map(|r| r.points.iter().chain(&r.control_points))
        .map(|p| Bounds::new_from_center(*p, Default::default()));
    let labels = routed.iter().filter_map(|r| r.label.as_ref().map(|l| l.bounds));
    Bounds::union_all(placed.values().copied().chain(path_points).chain(labels)).unwrap_or_default()
}
