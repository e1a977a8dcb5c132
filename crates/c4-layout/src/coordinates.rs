//! Top-down coordinate assignment.
//!
//! Roots are arranged by the root strategy; every container then places its
//! children at its content origin plus the relative positions computed while
//! sizing.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use log::{debug, trace};

use c4_layout_core::{
    geometry::{Bounds, Point},
    identifier::Id,
    model::{Graph, Level, Node},
    view::{ViewPreset, ViewState},
};

use crate::{
    config::LayoutOptions,
    hierarchy::Hierarchy,
    sizing::SizedNode,
    strategy::{Placement, PlacementInput, PlacementItem, StrategyBuilder, StrategyKind},
};

/// Resolves the strategy used for the root elements.
///
/// An explicit option wins. Otherwise a landscape view uses the landscape
/// strategy and every other view picks by the most common level among the
/// roots, preferring the more abstract level on ties.
pub fn select_root_strategy(
    graph: &Graph,
    hierarchy: &Hierarchy,
    view: &ViewState,
    options: &LayoutOptions,
) -> StrategyKind {
    if options.strategy != StrategyKind::Auto {
        return options.strategy;
    }
    if view.preset == ViewPreset::Landscape {
        return StrategyKind::Landscape;
    }

    let mut counts: BTreeMap<Level, usize> = BTreeMap::new();
    for root in hierarchy.roots() {
        if let Some(node) = graph.node(*root) {
            *counts.entry(node.level()).or_default() += 1;
        }
    }
    let dominant = counts
        .iter()
        .fold(None::<(Level, usize)>, |best, (&level, &count)| match best {
            Some((_, c)) if c >= count => best,
            _ => Some((level, count)),
        })
        .map(|(level, _)| level);

    match dominant {
        Some(Level::Landscape) => StrategyKind::Landscape,
        Some(Level::Context) => StrategyKind::Radial,
        Some(Level::Component) => StrategyKind::Layered,
        Some(Level::Container) | Some(Level::Deployment) | None => StrategyKind::GoldenGrid,
    }
}

/// Places drawn elements at absolute positions.
pub struct CoordinateAssignor<'a> {
    graph: &'a Graph,
    hierarchy: &'a Hierarchy,
    sized: &'a IndexMap<Id, SizedNode>,
    options: &'a LayoutOptions,
    strategies: &'a StrategyBuilder<'a>,
}

impl<'a> CoordinateAssignor<'a> {
    pub fn new(
        graph: &'a Graph,
        hierarchy: &'a Hierarchy,
        sized: &'a IndexMap<Id, SizedNode>,
        options: &'a LayoutOptions,
        strategies: &'a StrategyBuilder<'a>,
    ) -> Self {
        Self {
            graph,
            hierarchy,
            sized,
            options,
            strategies,
        }
    }

    /// Absolute bounds of every drawn element, parents before children.
    pub fn run(&self, root_strategy: StrategyKind) -> IndexMap<Id, Bounds> {
        let roots = self.root_positions(root_strategy);
        let mut placed: IndexMap<Id, Bounds> = IndexMap::with_capacity(self.sized.len());

        for id in self.hierarchy.pre_order() {
            let Some(sized) = self.sized.get(&id) else {
                continue;
            };
            let top_left = match self.hierarchy.parent(id) {
                None => roots.get(&id).copied().unwrap_or_default(),
                Some(parent) => {
                    let relative = self
                        .sized
                        .get(&parent)
                        .and_then(|p| p.sub_layout.as_ref())
                        .and_then(|sub| sub.positions.get(&id))
                        .copied();
                    let origin = placed
                        .get(&parent)
                        .zip(self.sized.get(&parent))
                        .map(|(bounds, p)| p.content_origin(bounds.min_point()));
                    match (origin, relative) {
                        (Some(origin), Some(relative)) => origin.add_point(relative),
                        _ => continue,
                    }
                }
            };
            trace!(node_id:% = id, x = top_left.x(), y = top_left.y(); "Placed node");
            placed.insert(id, Bounds::new_from_top_left(top_left, sized.size));
        }

        debug!(
            nodes = placed.len(),
            strategy:% = root_strategy;
            "Coordinates assigned",
        );
        placed
    }

    fn root_items(&self) -> Vec<PlacementItem> {
        self.hierarchy
            .roots()
            .iter()
            .filter_map(|&id| {
                let size = self.sized.get(&id)?.size;
                let kind = self.graph.node(id)?.kind();
                Some(PlacementItem { id, kind, size })
            })
            .collect()
    }

    /// Top-left position of every root.
    fn root_positions(&self, strategy: StrategyKind) -> IndexMap<Id, Point> {
        let items = self.root_items();
        let ids: Vec<Id> = items.iter().map(|item| item.id).collect();
        let edges = self.hierarchy.sibling_edges(self.graph, None, &ids);

        let mut positions: IndexMap<Id, Point> = if strategy == StrategyKind::Incremental {
            self.incremental(&items, &edges)
        } else {
            let placement = self
                .strategies
                .build(strategy)
                .place(&PlacementInput::new(&items, &edges));
            ids.iter().copied().zip(placement.positions).collect()
        };

        for item in &items {
            if let Some(pinned) = self.graph.node(item.id).and_then(Node::pinned) {
                trace!(node_id:% = item.id; "Using pinned position");
                positions.insert(item.id, pinned);
            }
        }
        positions
    }

    /// Keeps hinted positions and grids the rest below the hinted region.
    fn incremental(&self, items: &[PlacementItem], edges: &[(usize, usize)]) -> IndexMap<Id, Point> {
        let previous = &self.options.previous_positions;
        let mut positions = IndexMap::with_capacity(items.len());
        let mut hinted = Vec::new();
        let mut fresh = Vec::new();
        for (index, item) in items.iter().enumerate() {
            match previous.get(&item.id) {
                Some(&p) => {
                    positions.insert(item.id, p);
                    hinted.push(Bounds::new_from_top_left(p, item.size));
                }
                None => fresh.push(index),
            }
        }
        if fresh.is_empty() {
            return positions;
        }

        let remap: IndexMap<usize, usize> = fresh.iter().enumerate().map(|(i, &old)| (old, i)).collect();
        let fresh_items: Vec<PlacementItem> = fresh.iter().map(|&i| items[i]).collect();
        let fresh_edges: Vec<(usize, usize)> = edges
            .iter()
            .filter_map(|(a, b)| Some((*remap.get(a)?, *remap.get(b)?)))
            .collect();
        let placement: Placement = self
            .strategies
            .build(StrategyKind::GoldenGrid)
            .place(&PlacementInput::new(&fresh_items, &fresh_edges));

        let origin = match Bounds::union_all(hinted) {
            Some(region) => Point::new(region.min_x(), region.max_y() + self.options.sibling_gap()),
            None => Point::default(),
        };
        for (item, p) in fresh_items.iter().zip(&placement.positions) {
            positions.insert(item.id, origin.add_point(*p));
        }
        debug!(
            kept = items.len() - fresh.len(),
            placed = fresh.len();
            "Incremental root placement",
        );
        positions
    }
}

#[cfg(test)]
mod tests {
    use c4_layout_core::model::{NodeKind, Relationship};

    use super::*;
    use crate::sizing::SizingEngine;

    fn id(s: &str) -> Id {
        Id::new(s).unwrap()
    }

    fn shop() -> Graph {
        let mut builder = Graph::builder();
        builder
            .add_node(Node::new(id("customer"), "Customer", NodeKind::Person))
            .add_node(Node::new(id("shop"), "Shop", NodeKind::System))
            .add_node(Node::new(id("web"), "Web", NodeKind::Container).with_parent(id("shop")))
            .add_node(Node::new(id("api"), "API", NodeKind::Container).with_parent(id("shop")))
            .add_node(Node::new(id("payments"), "Payments", NodeKind::ExternalSystem))
            .add_relationship(Relationship::new(id("r1"), id("customer"), id("web")))
            .add_relationship(Relationship::new(id("r2"), id("api"), id("payments")));
        builder.build().unwrap()
    }

    fn place(graph: &Graph, view: &ViewState, options: &LayoutOptions) -> IndexMap<Id, Bounds> {
        let hierarchy = Hierarchy::build(graph, view);
        let strategies = StrategyBuilder::new(options, view);
        let sized = SizingEngine::new(graph, &hierarchy, options, &strategies).run();
        let kind = select_root_strategy(graph, &hierarchy, view, options);
        CoordinateAssignor::new(graph, &hierarchy, &sized, options, &strategies).run(kind)
    }

    #[test]
    fn test_strategy_selection() {
        let graph = shop();
        let options = LayoutOptions::default();
        let all = ViewState::all();
        let hierarchy = Hierarchy::build(&graph, &all);
        assert_eq!(
            select_root_strategy(&graph, &hierarchy, &all, &options),
            StrategyKind::Radial
        );
        assert_eq!(
            select_root_strategy(&graph, &hierarchy, &ViewState::landscape(), &options),
            StrategyKind::Landscape
        );
        let explicit = LayoutOptions::default().with_strategy(StrategyKind::Flow);
        assert_eq!(
            select_root_strategy(&graph, &hierarchy, &all, &explicit),
            StrategyKind::Flow
        );
    }

    #[test]
    fn test_children_inside_parent() {
        let graph = shop();
        let placed = place(&graph, &ViewState::all(), &LayoutOptions::default());
        let shop = placed[&id("shop")];
        for child in ["web", "api"] {
            assert!(shop.contains_bounds(&placed[&id(child)]), "{child} escapes shop");
        }
    }

    #[test]
    fn test_pinned_root_keeps_position() {
        let mut builder = Graph::builder();
        builder
            .add_node(Node::new(id("a"), "A", NodeKind::Container).with_pinned(Point::new(500.0, 300.0)))
            .add_node(Node::new(id("b"), "B", NodeKind::Container));
        let graph = builder.build().unwrap();
        let placed = place(&graph, &ViewState::all(), &LayoutOptions::default());
        assert_eq!(placed[&id("a")].min_point(), Point::new(500.0, 300.0));
    }

    #[test]
    fn test_incremental_keeps_previous_and_places_new_below() {
        let mut builder = Graph::builder();
        builder
            .add_node(Node::new(id("a"), "A", NodeKind::Container))
            .add_node(Node::new(id("b"), "B", NodeKind::Container))
            .add_node(Node::new(id("c"), "C", NodeKind::Container));
        let graph = builder.build().unwrap();
        let mut options = LayoutOptions::default().with_strategy(StrategyKind::Incremental);
        options.previous_positions.insert(id("a"), Point::new(10.0, 10.0));
        options.previous_positions.insert(id("b"), Point::new(400.0, 10.0));

        let placed = place(&graph, &ViewState::all(), &options);
        assert_eq!(placed[&id("a")].min_point(), Point::new(10.0, 10.0));
        assert_eq!(placed[&id("b")].min_point(), Point::new(400.0, 10.0));
        let lowest_hinted = placed[&id("a")].max_y().max(placed[&id("b")].max_y());
        assert!(placed[&id("c")].min_y() > lowest_hinted);
    }
}
