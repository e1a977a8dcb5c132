//! The phase sequence that turns a graph and a view into a [`LayoutResult`].
//!
//! Phases run in [`Phase::ALL`] order. Every phase reads the output of the
//! ones before it and none of them fails: cancellation between phases is
//! the only way a run stops early.

use std::{
    convert::Infallible,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

use indexmap::{IndexMap, IndexSet};
use log::{debug, info};
use serde::Serialize;

use c4_layout_core::{
    geometry::{Bounds, Point},
    identifier::Id,
    model::{Graph, Node},
    view::ViewState,
};

use crate::{
    config::LayoutOptions,
    coordinates::{CoordinateAssignor, select_root_strategy},
    error::LayoutError,
    hierarchy::Hierarchy,
    metrics::DebugTrace,
    optimizer::{Optimizer, Scene, swap},
    result::LayoutResult,
    routing::EdgeRouter,
    sizing::SizingEngine,
    strategy::{StrategyBuilder, StrategyKind},
};

/// A step of the layout pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Hierarchy,
    Sizing,
    Coordinates,
    Optimize,
    Normalize,
    Route,
    LocalSwap,
    Metrics,
}

impl Phase {
    pub const ALL: [Phase; 8] = [
        Phase::Hierarchy,
        Phase::Sizing,
        Phase::Coordinates,
        Phase::Optimize,
        Phase::Normalize,
        Phase::Route,
        Phase::LocalSwap,
        Phase::Metrics,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Hierarchy => "hierarchy",
            Phase::Sizing => "sizing",
            Phase::Coordinates => "coordinates",
            Phase::Optimize => "optimize",
            Phase::Normalize => "normalize",
            Phase::Route => "route",
            Phase::LocalSwap => "local-swap",
            Phase::Metrics => "metrics",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adjusts a finished result. Hooks run in registration order once every
/// phase is done.
pub trait PostLayoutHook: Send + Sync {
    fn name(&self) -> &str;

    fn after_layout(&self, graph: &Graph, result: &mut LayoutResult);
}

/// A shared flag that asks a running layout to stop at the next phase
/// boundary.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Layout options plus the hooks applied to every result.
///
/// # Example
///
/// ```
/// # use c4_layout::{config::LayoutOptions, pipeline::LayoutEngine};
/// # use c4_layout_core::{identifier::Id, model::{Graph, Node, NodeKind}, view::ViewState};
/// let mut builder = Graph::builder();
/// builder.add_node(Node::new(Id::new("api").unwrap(), "API", NodeKind::System));
/// let graph = builder.build().unwrap();
///
/// let engine = LayoutEngine::new(LayoutOptions::default());
/// let result = engine.layout(&graph, &ViewState::all());
/// assert_eq!(result.nodes.len(), 1);
/// ```
pub struct LayoutEngine {
    options: LayoutOptions,
    hooks: Vec<Box<dyn PostLayoutHook>>,
}

impl LayoutEngine {
    pub fn new(options: LayoutOptions) -> Self {
        Self {
            options,
            hooks: Vec::new(),
        }
    }

    pub fn with_hook(mut self, hook: impl PostLayoutHook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    pub fn layout(&self, graph: &Graph, view: &ViewState) -> LayoutResult {
        let Ok(result) = run(graph, view, &self.options, &self.hooks, |_| {
            Ok::<(), Infallible>(())
        });
        result
    }

    /// Like [`LayoutEngine::layout`], but checks `token` before every phase.
    pub fn layout_cancellable(
        &self,
        graph: &Graph,
        view: &ViewState,
        token: &CancellationToken,
    ) -> Result<LayoutResult, LayoutError> {
        run(graph, view, &self.options, &self.hooks, |phase| {
            if token.is_cancelled() {
                Err(LayoutError::Cancelled { phase })
            } else {
                Ok(())
            }
        })
    }

    /// Runs [`LayoutEngine::layout`] on the calling task; the work itself is
    /// synchronous.
    pub async fn layout_async(&self, graph: &Graph, view: &ViewState) -> LayoutResult {
        self.layout(graph, view)
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutOptions::default())
    }
}

impl fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks: Vec<&str> = self.hooks.iter().map(|h| h.name()).collect();
        f.debug_struct("LayoutEngine")
            .field("options", &self.options)
            .field("hooks", &hooks)
            .finish()
    }
}

/// Records phase timings when debugging is on.
struct Stopwatch {
    trace: Option<DebugTrace>,
    started: Instant,
}

impl Stopwatch {
    fn new(enabled: bool) -> Self {
        Self {
            trace: enabled.then(DebugTrace::default),
            started: Instant::now(),
        }
    }

    fn lap(&mut self, phase: Phase, nodes: usize) {
        let now = Instant::now();
        if let Some(trace) = self.trace.as_mut() {
            trace.record(phase, now.duration_since(self.started), nodes);
        }
        self.started = now;
    }
}

pub(crate) fn run<E>(
    graph: &Graph,
    view: &ViewState,
    options: &LayoutOptions,
    hooks: &[Box<dyn PostLayoutHook>],
    mut checkpoint: impl FnMut(Phase) -> Result<(), E>,
) -> Result<LayoutResult, E> {
    info!(
        nodes = graph.len(),
        relationships = graph.relationships().len();
        "Starting layout",
    );
    let mut watch = Stopwatch::new(options.debug);

    checkpoint(Phase::Hierarchy)?;
    let mut hierarchy = Hierarchy::build(graph, view);
    let root_strategy = select_root_strategy(graph, &hierarchy, view, options);
    let badge_parents = badge_parents(graph, &hierarchy, root_strategy);
    for parent in &badge_parents {
        for child in hierarchy.visible_children(*parent).to_vec() {
            hierarchy.collapse(child);
        }
    }
    debug!(
        nodes = hierarchy.len(),
        roots = hierarchy.roots().len(),
        strategy:? = root_strategy,
        badge_hosts = badge_parents.len();
        "Hierarchy built",
    );
    watch.lap(Phase::Hierarchy, hierarchy.len());

    checkpoint(Phase::Sizing)?;
    let strategies = StrategyBuilder::new(options, view);
    let mut sizing = SizingEngine::new(graph, &hierarchy, options, &strategies);
    sizing.set_badge_parents(badge_parents);
    let sized = sizing.run();
    watch.lap(Phase::Sizing, sized.len());

    checkpoint(Phase::Coordinates)?;
    let mut placed =
        CoordinateAssignor::new(graph, &hierarchy, &sized, options, &strategies).run(root_strategy);
    watch.lap(Phase::Coordinates, placed.len());

    checkpoint(Phase::Optimize)?;
    Optimizer::new(
        Scene {
            graph,
            hierarchy: &hierarchy,
            sized: &sized,
            root_strategy,
        },
        options,
    )
    .run(&mut placed);
    watch.lap(Phase::Optimize, placed.len());

    checkpoint(Phase::Normalize)?;
    normalize(graph, &hierarchy, &mut placed, options.spacing.margin, root_strategy);
    watch.lap(Phase::Normalize, placed.len());

    checkpoint(Phase::Route)?;
    let mut routed = EdgeRouter::new(graph, &hierarchy, &placed, options).route_all();
    watch.lap(Phase::Route, routed.len());

    checkpoint(Phase::LocalSwap)?;
    if options.local_swap.enabled {
        let scene = Scene {
            graph,
            hierarchy: &hierarchy,
            sized: &sized,
            root_strategy,
        };
        let swaps = swap::run(&scene, &mut placed, &options.local_swap, options.overlap.padding);
        if swaps > 0 {
            routed = EdgeRouter::new(graph, &hierarchy, &placed, options).route_all();
        }
    }
    watch.lap(Phase::LocalSwap, routed.len());

    checkpoint(Phase::Metrics)?;
    let mut result =
        LayoutResult::assemble(graph, &hierarchy, &sized, &placed, routed, root_strategy);
    watch.lap(Phase::Metrics, result.nodes.len());
    result.debug = watch.trace;

    for hook in hooks {
        debug!(hook = hook.name(); "Running post-layout hook",);
        hook.after_layout(graph, &mut result);
    }

    info!(
        nodes = result.nodes.len(),
        relationships = result.relationships.len(),
        crossings = result.metrics.edge_crossings,
        width = result.bounds.width(),
        height = result.bounds.height();
        "Layout finished",
    );
    Ok(result)
}

/// Root systems whose children become badges in a landscape layout.
fn badge_parents(graph: &Graph, hierarchy: &Hierarchy, root_strategy: StrategyKind) -> IndexSet<Id> {
    if root_strategy != StrategyKind::Landscape {
        return IndexSet::new();
    }
    hierarchy
        .roots()
        .iter()
        .copied()
        .filter(|&id| graph.node(id).is_some_and(|n| n.kind().is_system_like()))
        .filter(|&id| !hierarchy.visible_children(id).is_empty())
        .collect()
}

/// Moves the drawing so its top-left corner sits at `(margin, margin)`.
///
/// Layouts that honor caller coordinates, pinned roots or the incremental
/// strategy, are left where they are.
fn normalize(
    graph: &Graph,
    hierarchy: &Hierarchy,
    placed: &mut IndexMap<Id, Bounds>,
    margin: f32,
    root_strategy: StrategyKind,
) -> bool {
    let pinned = hierarchy
        .roots()
        .iter()
        .any(|id| graph.node(*id).and_then(Node::pinned).is_some());
    if pinned || root_strategy == StrategyKind::Incremental {
        return false;
    }
    let Some(bbox) = Bounds::union_all(placed.values().copied()) else {
        return false;
    };
    let offset = Point::new(margin - bbox.min_x(), margin - bbox.min_y());
    if offset.approx_eq(Point::default()) {
        return false;
    }
    for bounds in placed.values_mut() {
        *bounds = bounds.translate(offset);
    }
    true
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use c4_layout_core::model::{NodeKind, Relationship};

    use super::*;
    use crate::optimizer::test_support::{id, system_with};

    fn chain() -> Graph {
        let mut builder = Graph::builder();
        builder
            .add_node(Node::new(id("user"), "User", NodeKind::Person))
            .add_node(Node::new(id("shop"), "Shop", NodeKind::System))
            .add_relationship(Relationship::new(id("uses"), id("user"), id("shop")));
        builder.build().unwrap()
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::LocalSwap.to_string(), "local-swap");
        assert_eq!(Phase::ALL.first(), Some(&Phase::Hierarchy));
        assert_eq!(Phase::ALL.last(), Some(&Phase::Metrics));
    }

    #[test]
    fn test_normalized_to_margin() {
        let options = LayoutOptions::default();
        let result = LayoutEngine::new(options.clone()).layout(&chain(), &ViewState::all());
        let nodes = Bounds::union_all(result.nodes.values().map(|n| n.bounds)).unwrap();
        assert!((nodes.min_x() - options.spacing.margin).abs() < 1e-3);
        assert!((nodes.min_y() - options.spacing.margin).abs() < 1e-3);
    }

    #[test]
    fn test_pinned_root_is_not_normalized() {
        let mut builder = Graph::builder();
        builder
            .add_node(Node::new(id("a"), "A", NodeKind::System).with_pinned(Point::new(-300.0, -300.0)))
            .add_node(Node::new(id("b"), "B", NodeKind::System));
        let graph = builder.build().unwrap();
        let result = LayoutEngine::default().layout(&graph, &ViewState::all());
        assert_eq!(result.node(id("a")).map(|n| n.bounds.min_point()), Some(Point::new(-300.0, -300.0)));
    }

    #[test]
    fn test_cancelled_before_first_phase() {
        let token = CancellationToken::new();
        token.cancel();
        let err = LayoutEngine::default()
            .layout_cancellable(&chain(), &ViewState::all(), &token)
            .unwrap_err();
        assert_eq!(err, LayoutError::Cancelled { phase: Phase::Hierarchy });
    }

    #[test]
    fn test_uncancelled_token_runs_to_completion() {
        let token = CancellationToken::new();
        let result = LayoutEngine::default()
            .layout_cancellable(&chain(), &ViewState::all(), &token)
            .unwrap();
        assert_eq!(result.relationships.len(), 1);
    }

    #[test]
    fn test_debug_trace_lists_every_phase() {
        let options = LayoutOptions::default().with_debug(true);
        let result = LayoutEngine::new(options).layout(&chain(), &ViewState::all());
        let trace = result.debug.unwrap();
        let phases: Vec<Phase> = trace.phases.iter().map(|p| p.phase).collect();
        assert_eq!(phases, Phase::ALL.to_vec());

        let plain = LayoutEngine::default().layout(&chain(), &ViewState::all());
        assert!(plain.debug.is_none());
    }

    struct CountingHook(Arc<AtomicUsize>);

    impl PostLayoutHook for CountingHook {
        fn name(&self) -> &str {
            "counting"
        }

        fn after_layout(&self, _graph: &Graph, result: &mut LayoutResult) {
            self.0.fetch_add(result.nodes.len(), Ordering::SeqCst);
        }
    }

    #[test]
    fn test_hooks_see_the_result() {
        let seen = Arc::new(AtomicUsize::new(0));
        let engine = LayoutEngine::default().with_hook(CountingHook(Arc::clone(&seen)));
        engine.layout(&chain(), &ViewState::all());
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_landscape_children_become_badges() {
        let options = LayoutOptions::default().with_strategy(StrategyKind::Landscape);
        let result = LayoutEngine::new(options.clone()).layout(&system_with(&["a", "b"]), &ViewState::all());
        let badge = result.node(id("a")).unwrap();
        assert!(badge.visible);
        assert!(badge.collapsed);
        assert_eq!(badge.bounds.to_size(), options.spacing.badge);
        let sys = result.node(id("sys")).unwrap();
        assert!(sys.bounds.contains_bounds(&badge.bounds));
    }
}
