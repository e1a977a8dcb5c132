//! The per-call containment tree.
//!
//! A [`Hierarchy`] is an id-keyed arena: each entry names its parent and
//! children by [`Id`], so the tree is rebuilt from scratch on every layout
//! call and never holds references into the graph.

use std::cmp::Ordering;

use indexmap::IndexMap;
use log::{debug, trace};

use c4_layout_core::{
    identifier::Id,
    model::{Graph, Node},
    view::ViewState,
};

/// One visible element in the containment tree.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyNode {
    pub id: Id,
    pub parent: Option<Id>,
    /// Children in sibling order.
    pub children: Vec<Id>,
    /// Distance from the root level.
    pub depth: usize,
    /// Number of nodes in this subtree, including the node itself.
    pub subtree_size: usize,
    /// Height of this subtree; zero for leaves.
    pub subtree_depth: usize,
    /// The node hides its children.
    pub collapsed: bool,
    /// The node sits below a collapsed ancestor.
    pub concealed: bool,
}

impl HierarchyNode {
    /// A node whose children are laid out inside it.
    pub fn is_open_container(&self) -> bool {
        !self.collapsed && !self.concealed && !self.children.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    nodes: IndexMap<Id, HierarchyNode>,
    roots: Vec<Id>,
}

impl Hierarchy {
    /// Builds the tree of nodes `view` shows.
    ///
    /// A node whose parent is not visible becomes a root. Siblings are
    /// ordered by priority (descending), then sort key or label, then id.
    pub fn build(graph: &Graph, view: &ViewState) -> Self {
        let visible = view.visible_nodes(graph);

        let mut nodes: IndexMap<Id, HierarchyNode> = IndexMap::with_capacity(visible.len());
        let mut roots = Vec::new();
        for &id in &visible {
            let parent = graph
                .node(id)
                .and_then(Node::parent)
                .filter(|p| visible.contains(p));
            nodes.insert(
                id,
                HierarchyNode {
                    id,
                    parent,
                    children: Vec::new(),
                    depth: 0,
                    subtree_size: 1,
                    subtree_depth: 0,
                    collapsed: graph.node(id).is_some_and(|n| view.is_collapsed(n)),
                    concealed: false,
                },
            );
            if parent.is_none() {
                roots.push(id);
            }
        }
        for &id in &visible {
            if let Some(parent) = nodes.get(&id).and_then(|n| n.parent) {
                if let Some(entry) = nodes.get_mut(&parent) {
                    entry.children.push(id);
                }
            }
        }

        let order = |a: &Id, b: &Id| sibling_order(graph, *a, *b);
        roots.sort_by(order);
        for entry in nodes.values_mut() {
            entry.children.sort_by(order);
        }

        let mut hierarchy = Self { nodes, roots };
        hierarchy.assign_depths();
        hierarchy.assign_subtree_stats();

        debug!(
            nodes = hierarchy.nodes.len(),
            roots = hierarchy.roots.len();
            "Hierarchy built",
        );
        hierarchy
    }

    fn assign_depths(&mut self) {
        let mut stack: Vec<(Id, usize, bool)> =
            self.roots.iter().rev().map(|&id| (id, 0, false)).collect();
        while let Some((id, depth, concealed)) = stack.pop() {
            let Some(entry) = self.nodes.get_mut(&id) else {
                continue;
            };
            entry.depth = depth;
            entry.concealed = concealed;
            let hide_children = concealed || entry.collapsed;
            for &child in entry.children.iter().rev() {
                stack.push((child, depth + 1, hide_children));
            }
        }
    }

    fn assign_subtree_stats(&mut self) {
        for id in self.post_order() {
            let (size, height) = {
                let Some(entry) = self.nodes.get(&id) else {
                    continue;
                };
                entry
                    .children
                    .iter()
                    .filter_map(|c| self.nodes.get(c))
                    .fold((1, 0), |(size, height), child| {
                        (size + child.subtree_size, height.max(child.subtree_depth + 1))
                    })
            };
            if let Some(entry) = self.nodes.get_mut(&id) {
                entry.subtree_size = size;
                entry.subtree_depth = height;
            }
        }
    }

    /// Marks `id` collapsed and conceals everything below it.
    pub fn collapse(&mut self, id: Id) {
        let Some(entry) = self.nodes.get_mut(&id) else {
            return;
        };
        entry.collapsed = true;
        let mut stack = entry.children.clone();
        while let Some(next) = stack.pop() {
            if let Some(child) = self.nodes.get_mut(&next) {
                trace!(node_id:% = next, collapsed_by:% = id; "Concealing node");
                child.concealed = true;
                stack.extend(child.children.iter().copied());
            }
        }
    }

    pub fn get(&self, id: Id) -> Option<&HierarchyNode> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: Id) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[Id] {
        &self.roots
    }

    pub fn parent(&self, id: Id) -> Option<Id> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: Id) -> &[Id] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Children laid out inside `id`; empty for collapsed or concealed nodes.
    pub fn visible_children(&self, id: Id) -> &[Id] {
        match self.nodes.get(&id) {
            Some(n) if n.is_open_container() => &n.children,
            _ => &[],
        }
    }

    /// Returns true if `id` is drawn.
    pub fn is_visible(&self, id: Id) -> bool {
        self.nodes.get(&id).is_some_and(|n| !n.concealed)
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: Id) -> Vec<Id> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(parent) = current {
            out.push(parent);
            current = self.parent(parent);
        }
        out
    }

    pub fn is_ancestor(&self, ancestor: Id, id: Id) -> bool {
        let mut current = self.parent(id);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }

    /// Maps `id` to the child of `container` that is or contains it.
    ///
    /// Use `None` as `container` to map to a root.
    pub fn lift_to_child(&self, container: Option<Id>, id: Id) -> Option<Id> {
        if !self.contains(id) {
            return None;
        }
        let mut current = id;
        loop {
            let parent = self.parent(current);
            if parent == container {
                return Some(current);
            }
            current = parent?;
        }
    }

    /// Relationships between `siblings`, the children of `container`.
    ///
    /// Each endpoint is lifted to the sibling that contains it; edges whose
    /// endpoints lift to the same sibling or to none are dropped. Indices
    /// refer to positions in `siblings`.
    pub fn sibling_edges(
        &self,
        graph: &Graph,
        container: Option<Id>,
        siblings: &[Id],
    ) -> Vec<(usize, usize)> {
        let index: IndexMap<Id, usize> = siblings.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        graph
            .relationships()
            .iter()
            .filter_map(|rel| {
                let from = self.lift_to_child(container, rel.from())?;
                let to = self.lift_to_child(container, rel.to())?;
                if from == to {
                    return None;
                }
                Some((*index.get(&from)?, *index.get(&to)?))
            })
            .collect()
    }

    /// Maps `id` to the element that is drawn in its place.
    ///
    /// Visible nodes map to themselves; concealed nodes map to their
    /// outermost collapsed ancestor.
    pub fn representative(&self, id: Id) -> Option<Id> {
        let entry = self.nodes.get(&id)?;
        if !entry.concealed {
            return Some(id);
        }
        self.ancestors(id)
            .into_iter()
            .find(|&a| self.is_visible(a))
    }

    /// All nodes, parents before children, siblings in order.
    pub fn pre_order(&self) -> Vec<Id> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<Id> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// All nodes, children before parents.
    pub fn post_order(&self) -> Vec<Id> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(Id, bool)> = self.roots.iter().rev().map(|&id| (id, false)).collect();
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                out.push(id);
                continue;
            }
            stack.push((id, true));
            stack.extend(self.children(id).iter().rev().map(|&c| (c, false)));
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = &HierarchyNode> {
        self.nodes.values()
    }
}

fn sibling_order(graph: &Graph, a: Id, b: Id) -> Ordering {
    match (graph.node(a), graph.node(b)) {
        (Some(na), Some(nb)) => nb
            .priority()
            .cmp(&na.priority())
            .then_with(|| na.ordering_key().cmp(nb.ordering_key()))
            .then_with(|| a.cmp(&b)),
        _ => a.cmp(&b),
    }
}

#[cfg(test)]
mod tests {
    use c4_layout_core::model::{GraphBuilder, NodeKind, Relationship};

    use super::*;

    fn id(s: &str) -> Id {
        Id::new(s).unwrap()
    }

    fn graph() -> Graph {
        let mut b = GraphBuilder::new();
        b.add_node(Node::new(id("sys"), "System", NodeKind::System))
            .add_node(Node::new(id("web"), "Web", NodeKind::Container).with_parent(id("sys")))
            .add_node(Node::new(id("api"), "API", NodeKind::Container).with_parent(id("sys")))
            .add_node(
                Node::new(id("jobs"), "Jobs", NodeKind::Container)
                    .with_parent(id("sys"))
                    .with_priority(5),
            )
            .add_node(Node::new(id("ctrl"), "Ctrl", NodeKind::Component).with_parent(id("api")))
            .add_node(Node::new(id("user"), "User", NodeKind::Person));
        b.build().unwrap()
    }

    #[test]
    fn test_sibling_order_priority_then_label() {
        let h = Hierarchy::build(&graph(), &ViewState::all());
        assert_eq!(h.children(id("sys")), &[id("jobs"), id("api"), id("web")]);
        assert_eq!(h.roots(), &[id("sys"), id("user")]);
    }

    #[test]
    fn test_depths_and_subtree_stats() {
        let h = Hierarchy::build(&graph(), &ViewState::all());
        let sys = h.get(id("sys")).unwrap();
        assert_eq!(sys.depth, 0);
        assert_eq!(sys.subtree_size, 5);
        assert_eq!(sys.subtree_depth, 2);
        assert_eq!(h.get(id("ctrl")).unwrap().depth, 2);
    }

    #[test]
    fn test_traversal_orders() {
        let h = Hierarchy::build(&graph(), &ViewState::all());
        let pre: Vec<String> = h.pre_order().iter().map(Id::as_string).collect();
        assert_eq!(pre, ["sys", "jobs", "api", "ctrl", "web", "user"]);
        let post: Vec<String> = h.post_order().iter().map(Id::as_string).collect();
        assert_eq!(post, ["jobs", "ctrl", "api", "web", "sys", "user"]);
    }

    #[test]
    fn test_hidden_parent_makes_child_a_root() {
        let view = ViewState::all().with_hidden(id("sys"));
        let h = Hierarchy::build(&graph(), &view);
        assert!(h.roots().contains(&id("api")));
        assert_eq!(h.parent(id("ctrl")), Some(id("api")));
    }

    #[test]
    fn test_collapse_conceals_descendants() {
        let view = ViewState::all().with_collapsed(id("sys"));
        let h = Hierarchy::build(&graph(), &view);
        assert!(h.get(id("sys")).unwrap().collapsed);
        assert!(h.get(id("ctrl")).unwrap().concealed);
        assert!(h.visible_children(id("sys")).is_empty());
        assert_eq!(h.representative(id("ctrl")), Some(id("sys")));
        assert_eq!(h.representative(id("user")), Some(id("user")));
    }

    #[test]
    fn test_lift_to_child() {
        let h = Hierarchy::build(&graph(), &ViewState::all());
        assert_eq!(h.lift_to_child(Some(id("sys")), id("ctrl")), Some(id("api")));
        assert_eq!(h.lift_to_child(None, id("ctrl")), Some(id("sys")));
        assert_eq!(h.lift_to_child(Some(id("api")), id("user")), None);
    }

    #[test]
    fn test_sibling_edges_lift_nested_endpoints() {
        let mut b = GraphBuilder::new();
        b.add_node(Node::new(id("sys"), "System", NodeKind::System))
            .add_node(Node::new(id("web"), "Web", NodeKind::Container).with_parent(id("sys")))
            .add_node(Node::new(id("api"), "API", NodeKind::Container).with_parent(id("sys")))
            .add_node(Node::new(id("ctrl"), "Ctrl", NodeKind::Component).with_parent(id("api")))
            .add_node(Node::new(id("repo"), "Repo", NodeKind::Component).with_parent(id("api")))
            .add_node(Node::new(id("user"), "User", NodeKind::Person))
            .add_relationship(Relationship::new(id("calls"), id("web"), id("ctrl")))
            .add_relationship(Relationship::new(id("inner"), id("ctrl"), id("repo")))
            .add_relationship(Relationship::new(id("visits"), id("user"), id("web")));
        let graph = b.build().unwrap();
        let h = Hierarchy::build(&graph, &ViewState::all());

        // Children of sys are [api, web]; ctrl counts as api, the edge
        // inside api and the edge from outside sys are dropped.
        let siblings = h.children(id("sys")).to_vec();
        assert_eq!(siblings, [id("api"), id("web")]);
        assert_eq!(h.sibling_edges(&graph, Some(id("sys")), &siblings), [(1, 0)]);

        let roots = h.roots().to_vec();
        assert_eq!(h.sibling_edges(&graph, None, &roots), [(1, 0)]);
    }
}
