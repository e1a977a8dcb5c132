//! The validated architecture graph and its builder.

use std::collections::{BTreeMap, HashSet};

use indexmap::IndexMap;
use log::debug;
use petgraph::{algo::tarjan_scc, graph::DiGraph};

use crate::{
    error::{ValidationError, Violation, ViolationCode, ViolationCollector},
    identifier::{Id, IdError},
    model::{Node, Relationship},
};

/// An immutable, validated set of nodes and relationships.
///
/// A `Graph` can only be produced by [`GraphBuilder::build`], so every parent
/// reference, relationship endpoint and avoid reference resolves and the
/// parent chains are acyclic.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: IndexMap<Id, Node>,
    relationships: Vec<Relationship>,
    children: IndexMap<Id, Vec<Id>>,
    metadata: BTreeMap<String, String>,
}

impl Graph {
    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    pub fn node(&self, id: Id) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: Id) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direct children of `id` in insertion order.
    pub fn children(&self, id: Id) -> &[Id] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Nodes without a parent, in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(|n| n.parent().is_none())
    }

    /// Ancestors of `id`, nearest first. Empty for roots and unknown ids.
    pub fn ancestors(&self, id: Id) -> Vec<Id> {
        let mut chain = Vec::new();
        let mut current = self.node(id).and_then(Node::parent);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.node(parent).and_then(Node::parent);
        }
        chain
    }

    /// Returns true if `ancestor` lies strictly above `id` in the hierarchy.
    pub fn is_ancestor(&self, ancestor: Id, id: Id) -> bool {
        let mut current = self.node(id).and_then(Node::parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.node(parent).and_then(Node::parent);
        }
        false
    }

    /// Number of ancestors of `id`.
    pub fn depth(&self, id: Id) -> usize {
        self.ancestors(id).len()
    }

    /// All descendants of `id` in pre-order.
    pub fn descendants(&self, id: Id) -> Vec<Id> {
        let mut out = Vec::new();
        let mut stack: Vec<Id> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }
}

/// Accumulates nodes and relationships and validates them as a whole.
///
/// # Examples
///
/// ```
/// # use c4_layout_core::model::{GraphBuilder, Node, NodeKind, Relationship};
/// let mut builder = GraphBuilder::new();
/// let user = builder.id("user").unwrap();
/// let shop = builder.id("shop").unwrap();
/// let uses = builder.id("uses").unwrap();
///
/// builder
///     .add_node(Node::new(user, "Customer", NodeKind::Person))
///     .add_node(Node::new(shop, "Shop", NodeKind::System))
///     .add_relationship(Relationship::new(uses, user, shop).with_label("Buys from"));
///
/// let graph = builder.build().unwrap();
/// assert_eq!(graph.len(), 2);
/// assert_eq!(graph.relationships().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    relationships: Vec<Relationship>,
    metadata: BTreeMap<String, String>,
    collector: ViolationCollector,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a raw identifier.
    ///
    /// Invalid identifiers are recorded as violations (`V001`/`V002`) and make
    /// the eventual [`build`](Self::build) fail; `None` is returned so the
    /// caller can skip the element and keep collecting.
    pub fn id(&mut self, raw: &str) -> Option<Id> {
        match Id::new(raw) {
            Ok(id) => Some(id),
            Err(IdError::Empty) => {
                self.collector
                    .emit(Violation::new(ViolationCode::V001, "identifier must not be empty"));
                None
            }
            Err(err @ IdError::Malformed { .. }) => {
                self.collector.emit(
                    Violation::new(ViolationCode::V002, err.to_string()).with_subjects([raw]),
                );
                None
            }
        }
    }

    pub fn add_node(&mut self, node: Node) -> &mut Self {
        self.nodes.push(node);
        self
    }

    pub fn add_relationship(&mut self, relationship: Relationship) -> &mut Self {
        self.relationships.push(relationship);
        self
    }

    pub fn with_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Validates everything added so far and produces the graph.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] listing every violation: identifier
    /// problems recorded by [`id`](Self::id), duplicate ids, dangling
    /// references and parent cycles.
    pub fn build(self) -> Result<Graph, ValidationError> {
        let Self {
            nodes: pending_nodes,
            relationships: pending_relationships,
            metadata,
            mut collector,
        } = self;

        let mut nodes: IndexMap<Id, Node> = IndexMap::with_capacity(pending_nodes.len());
        for node in pending_nodes {
            let id = node.id();
            if nodes.contains_key(&id) {
                collector.emit(
                    Violation::new(ViolationCode::V100, format!("duplicate node id `{id}`"))
                        .with_subjects([id.to_string()]),
                );
                continue;
            }
            nodes.insert(id, node);
        }

        for node in nodes.values() {
            let Some(parent) = node.parent() else {
                continue;
            };
            if !nodes.contains_key(&parent) {
                collector.emit(
                    Violation::new(
                        ViolationCode::V200,
                        format!("node `{}` references unknown parent `{parent}`", node.id()),
                    )
                    .with_subjects([node.id().to_string(), parent.to_string()]),
                );
            }
        }

        let mut seen_relationships = HashSet::new();
        for rel in &pending_relationships {
            let id = rel.id();
            if !seen_relationships.insert(id) {
                collector.emit(
                    Violation::new(ViolationCode::V101, format!("duplicate relationship id `{id}`"))
                        .with_subjects([id.to_string()]),
                );
            }
            if !nodes.contains_key(&rel.from()) {
                collector.emit(
                    Violation::new(
                        ViolationCode::V201,
                        format!("relationship `{id}` starts at unknown node `{}`", rel.from()),
                    )
                    .with_subjects([id.to_string(), rel.from().to_string()]),
                );
            }
            if !nodes.contains_key(&rel.to()) {
                collector.emit(
                    Violation::new(
                        ViolationCode::V202,
                        format!("relationship `{id}` ends at unknown node `{}`", rel.to()),
                    )
                    .with_subjects([id.to_string(), rel.to().to_string()]),
                );
            }
            for avoided in rel.avoid() {
                if !nodes.contains_key(avoided) {
                    collector.emit(
                        Violation::new(
                            ViolationCode::V203,
                            format!("relationship `{id}` avoids unknown node `{avoided}`"),
                        )
                        .with_subjects([id.to_string(), avoided.to_string()]),
                    );
                }
            }
        }

        for cycle in parent_cycles(&nodes) {
            let members: Vec<String> = cycle.iter().map(ToString::to_string).collect();
            collector.emit(
                Violation::new(
                    ViolationCode::V300,
                    format!("parent chain forms a cycle: {}", members.join(" -> ")),
                )
                .with_subjects(members),
            );
        }

        collector.finish()?;

        let mut children: IndexMap<Id, Vec<Id>> = IndexMap::new();
        for node in nodes.values() {
            if let Some(parent) = node.parent() {
                children.entry(parent).or_default().push(node.id());
            }
        }

        debug!(
            nodes = nodes.len(),
            relationships = pending_relationships.len();
            "Graph validated",
        );

        Ok(Graph {
            nodes,
            relationships: pending_relationships,
            children,
            metadata,
        })
    }
}

/// Finds every cycle in the child-to-parent graph.
///
/// Each cycle is returned once with its members sorted by id; cycles are
/// ordered by their smallest member.
fn parent_cycles(nodes: &IndexMap<Id, Node>) -> Vec<Vec<Id>> {
    let mut graph: DiGraph<Id, ()> = DiGraph::with_capacity(nodes.len(), nodes.len());
    let indices: IndexMap<Id, _> = nodes.keys().map(|&id| (id, graph.add_node(id))).collect();

    let mut self_parented = HashSet::new();
    for node in nodes.values() {
        let Some(parent) = node.parent() else {
            continue;
        };
        if parent == node.id() {
            self_parented.insert(parent);
        }
        if let (Some(&child_ix), Some(&parent_ix)) = (indices.get(&node.id()), indices.get(&parent))
        {
            graph.add_edge(child_ix, parent_ix, ());
        }
    }

    let mut cycles: Vec<Vec<Id>> = tarjan_scc(&graph)
        .into_iter()
        .filter_map(|component| {
            let mut members: Vec<Id> = component.into_iter().map(|ix| graph[ix]).collect();
            let is_cycle = members.len() > 1 || self_parented.contains(&members[0]);
            if !is_cycle {
                return None;
            }
            members.sort();
            Some(members)
        })
        .collect();
    cycles.sort();
    cycles
}
