//! Views project a graph down to the nodes a diagram should show.
//!
//! A [`ViewState`] combines a [`ViewFilter`] (tag, kind and id predicates),
//! explicit hidden and collapsed sets, and an optional [`Focus`] that keeps
//! only the neighborhood of one element. Views are plain data and can be
//! reused across layout calls.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use indexmap::IndexSet;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    identifier::Id,
    model::{Graph, Node, NodeKind},
};

/// Primary flow direction for layered layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    #[default]
    TopBottom,
    LeftRight,
}

/// Placement of an element inside a cell larger than itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alignment {
    Start,
    #[default]
    Center,
    End,
}

/// The kind of diagram a view represents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewPreset {
    /// No particular C4 view; the layout picks a strategy from the content.
    #[default]
    Custom,
    Landscape,
    SystemContext,
    Container,
    Component,
    Deployment,
}

/// Include and exclude predicates over node tags, kinds and ids.
///
/// An empty include set is not applied. Exclusions always win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewFilter {
    pub include_tags: BTreeSet<String>,
    pub exclude_tags: BTreeSet<String>,
    pub include_kinds: BTreeSet<NodeKind>,
    pub exclude_kinds: BTreeSet<NodeKind>,
    pub include_ids: BTreeSet<Id>,
    pub exclude_ids: BTreeSet<Id>,
}

impl ViewFilter {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Returns true if `node` passes every configured predicate of `filter`.
///
/// # Examples
///
/// ```
/// # use c4_layout_core::{identifier::Id, model::{Node, NodeKind}, view::{apply_filter, ViewFilter}};
/// let db = Node::new(Id::new("db").unwrap(), "Orders", NodeKind::Database).with_tag("pii");
///
/// let mut filter = ViewFilter::default();
/// assert!(apply_filter(&db, &filter));
///
/// filter.exclude_tags.insert("pii".to_string());
/// assert!(!apply_filter(&db, &filter));
/// ```
pub fn apply_filter(node: &Node, filter: &ViewFilter) -> bool {
    if !filter.include_tags.is_empty() && node.tags().is_disjoint(&filter.include_tags) {
        return false;
    }
    if !filter.include_kinds.is_empty() && !filter.include_kinds.contains(&node.kind()) {
        return false;
    }
    if !filter.include_ids.is_empty() && !filter.include_ids.contains(&node.id()) {
        return false;
    }
    if !node.tags().is_disjoint(&filter.exclude_tags) {
        return false;
    }
    if filter.exclude_kinds.contains(&node.kind()) {
        return false;
    }
    !filter.exclude_ids.contains(&node.id())
}

/// Keeps only the neighborhood of one element.
///
/// The scope is the focus element plus its descendants up to `depth`
/// generations. Relationship endpoints outside the scope are lifted to the
/// element that represents them at this zoom level, and everything within
/// `radius` hops of the scope over those lifted edges stays visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Focus {
    pub id: Id,
    pub radius: usize,
    pub depth: usize,
}

impl Focus {
    pub fn new(id: Id) -> Self {
        Self {
            id,
            radius: 1,
            depth: 0,
        }
    }

    pub fn with_radius(mut self, radius: usize) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }
}

/// A projection of a graph applied per layout call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub filter: ViewFilter,
    pub hidden: BTreeSet<Id>,
    pub collapsed: BTreeSet<Id>,
    pub focus: Option<Focus>,
    pub preset: ViewPreset,
    pub direction: Option<Direction>,
    pub alignment: Option<Alignment>,
    pub grid_columns: Option<usize>,
}

impl ViewState {
    /// Shows every node in the graph.
    pub fn all() -> Self {
        Self::default()
    }

    /// Every system and person, with systems collapsed to boxes.
    pub fn landscape() -> Self {
        Self {
            preset: ViewPreset::Landscape,
            ..Self::default()
        }
    }

    /// System `system` and the people and systems it talks to.
    pub fn system_context(system: Id) -> Self {
        Self {
            focus: Some(Focus::new(system)),
            preset: ViewPreset::SystemContext,
            ..Self::default()
        }
    }

    /// System `system` opened up to show its containers and their neighbors.
    pub fn container(system: Id) -> Self {
        Self {
            focus: Some(Focus::new(system).with_depth(1)),
            preset: ViewPreset::Container,
            ..Self::default()
        }
    }

    /// Container `container` opened up to show its components and their neighbors.
    pub fn component(container: Id) -> Self {
        Self {
            focus: Some(Focus::new(container).with_depth(1)),
            preset: ViewPreset::Component,
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: ViewFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_hidden(mut self, id: Id) -> Self {
        self.hidden.insert(id);
        self
    }

    pub fn with_collapsed(mut self, id: Id) -> Self {
        self.collapsed.insert(id);
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    pub fn with_grid_columns(mut self, columns: usize) -> Self {
        self.grid_columns = Some(columns);
        self
    }

    /// Returns true if `node` passes the filter and is not hidden.
    pub fn admits(&self, node: &Node) -> bool {
        !node.is_hidden() && !self.hidden.contains(&node.id()) && apply_filter(node, &self.filter)
    }

    /// Returns true if the view or the node asks for its children to be collapsed.
    pub fn is_collapsed(&self, node: &Node) -> bool {
        node.collapse_children() || self.collapsed.contains(&node.id())
    }

    /// Ids of every node this view shows, in graph order.
    ///
    /// A focus naming an unknown element is ignored and the full graph is
    /// considered instead.
    pub fn visible_nodes(&self, graph: &Graph) -> IndexSet<Id> {
        let focused = self.focus.and_then(|focus| focus_neighborhood(graph, focus));
        let visible: IndexSet<Id> = graph
            .nodes()
            .filter(|node| focused.as_ref().is_none_or(|set| set.contains(&node.id())))
            .filter(|node| self.admits(node))
            .map(Node::id)
            .collect();
        debug!(
            total = graph.len(),
            visible = visible.len(),
            focused = focused.is_some();
            "View applied",
        );
        visible
    }
}

fn focus_neighborhood(graph: &Graph, focus: Focus) -> Option<HashSet<Id>> {
    if !graph.contains(focus.id) {
        warn!(focus:% = focus.id; "Focus element not found in graph, showing full hierarchy");
        return None;
    }

    let focus_depth = graph.depth(focus.id);
    let focus_ancestors: HashSet<Id> = graph.ancestors(focus.id).into_iter().collect();

    let mut scope = HashSet::from([focus.id]);
    let mut frontier = vec![focus.id];
    for _ in 0..focus.depth {
        let mut next = Vec::new();
        for id in frontier {
            for &child in graph.children(id) {
                scope.insert(child);
                next.push(child);
            }
        }
        frontier = next;
    }

    let lift = |id: Id| -> Option<Id> {
        if scope.contains(&id) {
            return Some(id);
        }
        if focus_ancestors.contains(&id) {
            return None;
        }
        if graph.is_ancestor(focus.id, id) {
            let limit = focus_depth + focus.depth;
            return graph
                .ancestors(id)
                .into_iter()
                .find(|&a| graph.depth(a) == limit);
        }
        let mut top = id;
        while let Some(parent) = graph.node(top).and_then(Node::parent) {
            if focus_ancestors.contains(&parent) {
                break;
            }
            top = parent;
        }
        Some(top)
    };

    let mut adjacency: BTreeMap<Id, BTreeSet<Id>> = BTreeMap::new();
    for rel in graph.relationships() {
        let (Some(a), Some(b)) = (lift(rel.from()), lift(rel.to())) else {
            continue;
        };
        if a == b {
            continue;
        }
        adjacency.entry(a).or_default().insert(b);
        adjacency.entry(b).or_default().insert(a);
    }

    let mut reached: HashSet<Id> = scope.clone();
    let mut queue: VecDeque<(Id, usize)> = scope.iter().map(|&id| (id, 0)).collect();
    while let Some((id, distance)) = queue.pop_front() {
        if distance >= focus.radius {
            continue;
        }
        for &neighbor in adjacency.get(&id).into_iter().flatten() {
            if reached.insert(neighbor) {
                queue.push_back((neighbor, distance + 1));
            }
        }
    }

    reached.extend(focus_ancestors);
    Some(reached)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GraphBuilder, Relationship};

    fn id(s: &str) -> Id {
        Id::new(s).unwrap()
    }

    /// customer -> shop.web -> shop.api -> shop.db, shop.api -> payments,
    /// shop.api.ctrl -> shop.api.repo, auditor standalone.
    fn shop_graph() -> Graph {
        let mut b = GraphBuilder::new();
        b.add_node(Node::new(id("customer"), "Customer", NodeKind::Person))
            .add_node(Node::new(id("shop"), "Shop", NodeKind::System))
            .add_node(Node::new(id("web"), "Web", NodeKind::Container).with_parent(id("shop")))
            .add_node(Node::new(id("api"), "API", NodeKind::Container).with_parent(id("shop")))
            .add_node(Node::new(id("db"), "DB", NodeKind::Database).with_parent(id("shop")))
            .add_node(Node::new(id("ctrl"), "Ctrl", NodeKind::Component).with_parent(id("api")))
            .add_node(Node::new(id("repo"), "Repo", NodeKind::Component).with_parent(id("api")))
            .add_node(Node::new(id("payments"), "Payments", NodeKind::ExternalSystem))
            .add_node(Node::new(id("auditor"), "Auditor", NodeKind::Person).with_tag("internal"))
            .add_relationship(Relationship::new(id("r1"), id("customer"), id("web")))
            .add_relationship(Relationship::new(id("r2"), id("web"), id("api")))
            .add_relationship(Relationship::new(id("r3"), id("repo"), id("db")))
            .add_relationship(Relationship::new(id("r4"), id("api"), id("payments")))
            .add_relationship(Relationship::new(id("r5"), id("ctrl"), id("repo")));
        b.build().unwrap()
    }

    fn names(set: &IndexSet<Id>) -> Vec<String> {
        set.iter().map(Id::as_string).collect()
    }

    #[test]
    fn test_default_view_shows_everything() {
        let graph = shop_graph();
        assert_eq!(ViewState::all().visible_nodes(&graph).len(), graph.len());
    }

    #[test]
    fn test_filter_include_and_exclude() {
        let node = Node::new(id("n"), "N", NodeKind::Queue).with_tag("async");
        let mut filter = ViewFilter::default();
        filter.include_kinds.insert(NodeKind::Queue);
        assert!(apply_filter(&node, &filter));

        filter.include_tags.insert("sync".to_string());
        assert!(!apply_filter(&node, &filter));

        filter.include_tags.insert("async".to_string());
        assert!(apply_filter(&node, &filter));

        filter.exclude_ids.insert(id("n"));
        assert!(!apply_filter(&node, &filter));
    }

    #[test]
    fn test_hidden_flag_and_set() {
        let graph = shop_graph();
        let view = ViewState::all().with_hidden(id("auditor"));
        let visible = view.visible_nodes(&graph);
        assert!(!visible.contains(&id("auditor")));
        assert!(visible.contains(&id("customer")));
    }

    #[test]
    fn test_system_context_view() {
        let graph = shop_graph();
        let visible = ViewState::system_context(id("shop")).visible_nodes(&graph);
        assert_eq!(names(&visible), ["customer", "shop", "payments"]);
    }

    #[test]
    fn test_container_view() {
        let graph = shop_graph();
        let visible = ViewState::container(id("shop")).visible_nodes(&graph);
        assert_eq!(names(&visible), ["customer", "shop", "web", "api", "db", "payments"]);
    }

    #[test]
    fn test_component_view() {
        let graph = shop_graph();
        let visible = ViewState::component(id("api")).visible_nodes(&graph);
        // db is one hop from repo; customer is two hops away through web.
        assert_eq!(names(&visible), ["shop", "web", "api", "db", "ctrl", "repo", "payments"]);
    }

    #[test]
    fn test_radius_zero_keeps_scope_only() {
        let graph = shop_graph();
        let mut view = ViewState::container(id("shop"));
        view.focus = view.focus.map(|f| f.with_radius(0));
        let visible = view.visible_nodes(&graph);
        assert_eq!(names(&visible), ["shop", "web", "api", "db"]);
    }

    #[test]
    fn test_unknown_focus_is_ignored() {
        let graph = shop_graph();
        let visible = ViewState::system_context(id("nope")).visible_nodes(&graph);
        assert_eq!(visible.len(), graph.len());
    }

    #[test]
    fn test_collapse_sources() {
        let graph = shop_graph();
        let view = ViewState::all().with_collapsed(id("shop"));
        assert!(view.is_collapsed(graph.node(id("shop")).unwrap()));
        assert!(!view.is_collapsed(graph.node(id("api")).unwrap()));
    }
}
