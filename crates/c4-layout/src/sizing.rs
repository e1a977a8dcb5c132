//! Bottom-up sizing.
//!
//! Leaves are sized from their measured text. Open containers first arrange
//! their (already sized) children with a level-specific strategy and then
//! wrap the arrangement with a header and padding. The child arrangement is
//! kept as a [`SubLayout`] so coordinate assignment can reuse it unchanged.

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};

use c4_layout_core::{
    geometry::{Point, Size},
    identifier::Id,
    model::{Graph, Node, SizeHint},
};

use crate::{
    config::LayoutOptions,
    hierarchy::Hierarchy,
    strategy::{PlacementInput, PlacementItem, StrategyBuilder, StrategyKind, align_offset},
};

/// Child positions of a container, relative to its content origin.
#[derive(Debug, Clone, PartialEq)]
pub struct SubLayout {
    pub strategy: StrategyKind,
    /// Top-left of each child, keyed in sibling order.
    pub positions: IndexMap<Id, Point>,
    /// Bounding size of the arranged children.
    pub size: Size,
}

/// Size and text layout of one visible element.
#[derive(Debug, Clone, PartialEq)]
pub struct SizedNode {
    pub id: Id,
    pub size: Size,
    pub label_lines: Vec<String>,
    /// Size of the stacked label, technology and description text.
    pub content_size: Size,
    /// Height reserved above the children of a container.
    pub header_height: f32,
    pub padding: f32,
    pub sub_layout: Option<SubLayout>,
}

impl SizedNode {
    /// Where children start for a node whose top-left corner is at `origin`.
    pub fn content_origin(&self, origin: Point) -> Point {
        origin.add_point(Point::new(self.padding, self.header_height + self.padding))
    }
}

/// Computes [`SizedNode`]s for every drawn element of a hierarchy.
pub struct SizingEngine<'a> {
    graph: &'a Graph,
    hierarchy: &'a Hierarchy,
    options: &'a LayoutOptions,
    strategies: &'a StrategyBuilder<'a>,
    badge_parents: IndexSet<Id>,
}

impl<'a> SizingEngine<'a> {
    pub fn new(
        graph: &'a Graph,
        hierarchy: &'a Hierarchy,
        options: &'a LayoutOptions,
        strategies: &'a StrategyBuilder<'a>,
    ) -> Self {
        Self {
            graph,
            hierarchy,
            options,
            strategies,
            badge_parents: IndexSet::new(),
        }
    }

    /// Set the containers whose children are drawn as fixed-size badges.
    pub fn set_badge_parents(&mut self, parents: IndexSet<Id>) -> &mut Self {
        self.badge_parents = parents;
        self
    }

    /// Size every drawn node, children before parents.
    pub fn run(&self) -> IndexMap<Id, SizedNode> {
        let mut sized: IndexMap<Id, SizedNode> = IndexMap::with_capacity(self.hierarchy.len());
        for id in self.hierarchy.post_order() {
            if !self.hierarchy.is_visible(id) {
                continue;
            }
            let Some(node) = self.graph.node(id) else {
                continue;
            };
            let entry = self.size_node(node, &sized);
            trace!(
                node_id:% = id,
                width = entry.size.width(),
                height = entry.size.height();
                "Sized node",
            );
            sized.insert(id, entry);
        }
        debug!(nodes = sized.len(); "Sizing finished",);
        sized
    }

    fn size_node(&self, node: &Node, sized: &IndexMap<Id, SizedNode>) -> SizedNode {
        let id = node.id();
        let padding = self.options.padding_for(node.kind());
        let (content_size, label_lines) = self.measure_content(node, padding);

        let parent_is_badge_host = self
            .hierarchy
            .parent(id)
            .is_some_and(|p| self.badge_parents.contains(&p));
        if parent_is_badge_host {
            return SizedNode {
                id,
                size: self.options.spacing.badge,
                label_lines,
                content_size,
                header_height: 0.0,
                padding: 0.0,
                sub_layout: None,
            };
        }

        let children = self.hierarchy.visible_children(id);
        if children.is_empty() {
            let size = apply_hint(self.leaf_size(content_size, padding), node.size_hint());
            return SizedNode {
                id,
                size,
                label_lines,
                content_size,
                header_height: content_size.height(),
                padding,
                sub_layout: None,
            };
        }

        let badges = self.badge_parents.contains(&id);
        let kind = if badges {
            StrategyKind::Badges
        } else {
            StrategyBuilder::container_kind(node.kind())
        };
        let items: Vec<PlacementItem> = children
            .iter()
            .filter_map(|c| {
                sized.get(c).map(|s| PlacementItem {
                    id: *c,
                    kind: self.graph.node(*c).map_or(node.kind(), Node::kind),
                    size: s.size,
                })
            })
            .collect();
        let edges = if badges {
            Vec::new()
        } else {
            self.hierarchy.sibling_edges(self.graph, Some(id), children)
        };
        let placement = self
            .strategies
            .build(kind)
            .place(&PlacementInput::new(&items, &edges));

        // Containers are clamped to the minimum only: containment of the
        // sub-layout wins over `max_size`.
        let header = content_size.height();
        let natural = Size::new(
            placement.size.width().max(content_size.width()) + 2.0 * padding,
            header + placement.size.height() + 2.0 * padding,
        );
        let size = apply_hint(natural.max(self.options.sizing.min_size()), node.size_hint());

        let inner_width = size.width() - 2.0 * padding;
        let inner_height = size.height() - header - 2.0 * padding;
        let offset = if badges {
            Point::new(
                (inner_width - placement.size.width()).max(0.0),
                (inner_height - placement.size.height()).max(0.0),
            )
        } else {
            Point::new(
                align_offset(self.strategies.alignment(), inner_width, placement.size.width()),
                0.0,
            )
        };
        let positions = items
            .iter()
            .zip(&placement.positions)
            .map(|(item, p)| (item.id, p.add_point(offset)))
            .collect();

        debug!(
            container:% = id,
            strategy:% = kind,
            children = items.len(),
            edges = edges.len();
            "Container sub-layout computed",
        );

        SizedNode {
            id,
            size,
            label_lines,
            content_size,
            header_height: header,
            padding,
            sub_layout: Some(SubLayout {
                strategy: kind,
                positions,
                size: placement.size,
            }),
        }
    }

    /// Measures label, technology and description stacked vertically.
    fn measure_content(&self, node: &Node, padding: f32) -> (Size, Vec<String>) {
        let measurer = &self.options.measurer;
        let max_width = (self.options.sizing.max_width - 2.0 * padding).max(1.0);
        let (kind, level) = (node.kind(), node.level());

        let label = measurer.measure_multiline(node.label(), kind, level, max_width);
        let mut content = label.size;
        if let Some(technology) = node.technology().filter(|t| !t.is_empty()) {
            let tech = measurer.measure(&format!("[{technology}]"), kind, level, max_width);
            content = content.merge_vertical(tech);
        }
        if let Some(description) = node.description().filter(|d| !d.is_empty()) {
            let desc = measurer.measure(description, kind, level, max_width);
            content = content.merge_vertical(desc);
        }
        (content, label.lines)
    }

    /// Pads the content, widens or heightens it into the aspect-ratio
    /// limits, then clamps to `[min_size, max_size]`. The clamp comes last so
    /// the size bounds always hold.
    fn leaf_size(&self, content: Size, padding: f32) -> Size {
        let sizing = &self.options.sizing;
        let padded = Size::new(
            content.width() + 2.0 * padding,
            content.height() + 2.0 * padding,
        );
        let ratio = padded.width() / padded.height().max(f32::EPSILON);
        let shaped = if ratio > sizing.max_aspect && sizing.max_aspect > 0.0 {
            padded.with_height(padded.width() / sizing.max_aspect)
        } else if ratio < sizing.min_aspect && sizing.min_aspect > 0.0 {
            padded.with_width(padded.height() * sizing.min_aspect)
        } else {
            padded
        };
        shaped.clamp(sizing.min_size(), sizing.max_size())
    }
}

/// Applies explicit size overrides to a computed size.
///
/// Non-positive aspect ratios are ignored.
pub fn apply_hint(size: Size, hint: SizeHint) -> Size {
    let aspect = hint.aspect.filter(|a| *a > 0.0);
    match (hint.width, hint.height, aspect) {
        (Some(w), Some(h), _) => Size::new(w, h),
        (Some(w), None, Some(a)) => Size::new(w, w / a),
        (None, Some(h), Some(a)) => Size::new(h * a, h),
        (Some(w), None, None) => size.with_width(w),
        (None, Some(h), None) => size.with_height(h),
        (None, None, Some(a)) => size.with_height(size.width() / a),
        (None, None, None) => size,
    }
}
