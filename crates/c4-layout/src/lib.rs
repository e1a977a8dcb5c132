//! C4 Layout - deterministic layout for C4 architecture diagrams.
//!
//! Given a validated [`Graph`] and a [`ViewState`] selecting what to show,
//! [`layout`] computes a box for every element and a path for every
//! relationship. The run is a fixed sequence of phases:
//!
//! 1. [`hierarchy`] - the containment tree of the visible elements
//! 2. [`sizing`] - element sizes, bottom-up, with child sub-layouts
//! 3. [`coordinates`] - absolute positions from the level strategies
//! 4. [`optimizer`] - overlap removal, spacing, crossing reduction and
//!    containment repair
//! 5. [`routing`] - ports, obstacle-avoiding paths, labels and arrows
//! 6. [`metrics`] - quality scores and the optional phase trace
//!
//! The same graph, view and options always give the same [`LayoutResult`].

pub mod config;
pub mod coordinates;
pub mod hierarchy;
pub mod metrics;
pub mod optimizer;
pub mod pipeline;
pub mod result;
pub mod routing;
pub mod sizing;
pub mod strategy;
pub mod text;

mod error;

pub use c4_layout_core::{geometry, identifier, model, view};

pub use config::{LayoutOptions, Preset};
pub use error::{LayoutError, UnknownPreset};
pub use pipeline::{CancellationToken, LayoutEngine, Phase, PostLayoutHook};
pub use result::{LayoutResult, PositionedNode};

use model::Graph;
use view::ViewState;

/// Lays out `graph` as seen through `view`.
///
/// # Examples
///
/// ```
/// use c4_layout::{
///     LayoutOptions, identifier::Id,
///     model::{Graph, Node, NodeKind, Relationship},
///     view::ViewState,
/// };
///
/// let mut builder = Graph::builder();
/// let user = Id::new("user").unwrap();
/// let shop = Id::new("shop").unwrap();
/// builder
///     .add_node(Node::new(user, "Customer", NodeKind::Person))
///     .add_node(Node::new(shop, "Web Shop", NodeKind::System))
///     .add_relationship(Relationship::new(Id::new("buys").unwrap(), user, shop));
/// let graph = builder.build().unwrap();
///
/// let result = c4_layout::layout(&graph, &ViewState::all(), &LayoutOptions::default());
/// assert_eq!(result.nodes.len(), 2);
/// assert!(result.relationships[0].points.len() > 1);
/// ```
pub fn layout(graph: &Graph, view: &ViewState, options: &LayoutOptions) -> LayoutResult {
    let Ok(result) = pipeline::run(graph, view, options, &[], |_| {
        Ok::<(), std::convert::Infallible>(())
    });
    result
}
