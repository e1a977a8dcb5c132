//! The architecture model: typed nodes, relationships and the validated graph.

mod graph;
mod kind;
mod node;
mod relationship;

pub use graph::{Graph, GraphBuilder};
pub use kind::{Level, NodeKind};
pub use node::{Node, SizeHint};
pub use relationship::{InteractionKind, Relationship, RoutingHint};
