//! Layered (Sugiyama-style) placement for component and container views.
//!
//! 1. Cycles are broken by reversing the back edges of a depth-first search
//!    that visits nodes and successors in index order.
//! 2. Every node gets its longest-path rank over the resulting DAG.
//! 3. Nodes within a rank are reordered by barycenter sweeps; the ordering
//!    with the fewest adjacent-rank crossings wins.
//! 4. Ranks are stacked along the flow direction.

use log::debug;
use petgraph::{algo::toposort, graph::DiGraph};

use c4_layout_core::{
    geometry::{Bounds, Point},
    view::{Alignment, Direction},
};

use crate::strategy::{Placement, PlacementInput, PlacementItem, Strategy, align_offset, clean_edges};

pub struct Layered {
    node_gap: f32,
    rank_gap: f32,
    direction: Direction,
    alignment: Alignment,
    sweeps: usize,
}

impl Layered {
    pub fn new() -> Self {
        Self {
            node_gap: 40.0,
            rank_gap: 60.0,
            direction: Direction::TopBottom,
            alignment: Alignment::Center,
            sweeps: 4,
        }
    }

    /// Set the spacing between nodes of the same rank
    pub fn set_node_gap(&mut self, gap: f32) -> &mut Self {
        self.node_gap = gap;
        self
    }

    /// Set the spacing between consecutive ranks
    pub fn set_rank_gap(&mut self, gap: f32) -> &mut Self {
        self.rank_gap = gap;
        self
    }

    pub fn set_direction(&mut self, direction: Direction) -> &mut Self {
        self.direction = direction;
        self
    }

    pub fn set_alignment(&mut self, alignment: Alignment) -> &mut Self {
        self.alignment = alignment;
        self
    }

    pub fn set_sweeps(&mut self, sweeps: usize) -> &mut Self {
        self.sweeps = sweeps;
        self
    }

    fn stack(&self, items: &[PlacementItem], layers: &[Vec<usize>]) -> Vec<Bounds> {
        let horizontal = self.direction == Direction::LeftRight;
        // Along = flow axis, across = axis within a rank.
        let along = |i: usize| {
            let s = items[i].size;
            if horizontal { s.width() } else { s.height() }
        };
        let across = |i: usize| {
            let s = items[i].size;
            if horizontal { s.height() } else { s.width() }
        };

        let thickness: Vec<f32> = layers
            .iter()
            .map(|layer| layer.iter().map(|&i| along(i)).fold(0.0f32, f32::max))
            .collect();
        let extents: Vec<f32> = layers
            .iter()
            .map(|layer| {
                let total: f32 = layer.iter().map(|&i| across(i)).sum();
                total + self.node_gap * layer.len().saturating_sub(1) as f32
            })
            .collect();
        let widest = extents.iter().copied().fold(0.0f32, f32::max);

        let mut rects = vec![Bounds::default(); items.len()];
        let mut along_cursor = 0.0f32;
        for (r, layer) in layers.iter().enumerate() {
            let mut across_cursor = align_offset(self.alignment, widest, extents[r]);
            for &i in layer {
                let a = along_cursor + align_offset(self.alignment, thickness[r], along(i));
                let origin = if horizontal {
                    Point::new(a, across_cursor)
                } else {
                    Point::new(across_cursor, a)
                };
                rects[i] = Bounds::new_from_top_left(origin, items[i].size);
                across_cursor += across(i) + self.node_gap;
            }
            along_cursor += thickness[r] + self.rank_gap;
        }
        rects
    }
}

impl Default for Layered {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for Layered {
    fn place(&self, input: &PlacementInput<'_>) -> Placement {
        let n = input.items.len();
        if n == 0 {
            return Placement::default();
        }
        let dag = acyclic_edges(n, input.edges);
        let ranks = longest_path_ranks(n, &dag);
        let layers = order_layers(&ranks, &dag, self.sweeps);
        debug!(
            nodes = n,
            edges = dag.len(),
            ranks = layers.len();
            "Layered placement",
        );
        Placement::from_bounds(&self.stack(input.items, &layers))
    }
}

/// Edges with every DFS back edge reversed, so the result is acyclic.
pub(crate) fn acyclic_edges(n: usize, edges: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let edges = clean_edges(edges, n);
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &(a, b) in &edges {
        successors[a].push(b);
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Active,
        Done,
    }

    let mut marks = vec![Mark::New; n];
    let mut reversed = Vec::new();
    for start in 0..n {
        if marks[start] != Mark::New {
            continue;
        }
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        marks[start] = Mark::Active;
        while let Some(top) = stack.last_mut() {
            let (node, next) = *top;
            if let Some(&succ) = successors[node].get(next) {
                top.1 += 1;
                match marks[succ] {
                    Mark::New => {
                        marks[succ] = Mark::Active;
                        stack.push((succ, 0));
                    }
                    Mark::Active => reversed.push((node, succ)),
                    Mark::Done => {}
                }
            } else {
                marks[node] = Mark::Done;
                stack.pop();
            }
        }
    }

    let mut out: Vec<(usize, usize)> = edges
        .into_iter()
        .map(|(a, b)| if reversed.contains(&(a, b)) { (b, a) } else { (a, b) })
        .collect();
    out.sort_unstable();
    out.dedup();
    out
}

/// Longest-path rank of every node in a DAG.
pub(crate) fn longest_path_ranks(n: usize, dag: &[(usize, usize)]) -> Vec<usize> {
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(n, dag.len());
    let indices: Vec<_> = (0..n).map(|i| graph.add_node(i)).collect();
    for &(a, b) in dag {
        graph.add_edge(indices[a], indices[b], ());
    }

    let mut ranks = vec![0usize; n];
    match toposort(&graph, None) {
        Ok(order) => {
            for ix in order {
                let from = graph[ix];
                for succ in graph.neighbors(ix) {
                    let to = graph[succ];
                    ranks[to] = ranks[to].max(ranks[from] + 1);
                }
            }
        }
        Err(cycle) => {
            debug!(node = graph[cycle.node_id()]; "Cycle left after reversal, using a single rank");
        }
    }
    ranks
}

/// Groups nodes by rank and orders each rank to reduce crossings.
pub(crate) fn order_layers(ranks: &[usize], dag: &[(usize, usize)], sweeps: usize) -> Vec<Vec<usize>> {
    let rank_count = ranks.iter().copied().max().map_or(0, |r| r + 1);
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); rank_count];
    for (i, &r) in ranks.iter().enumerate() {
        layers[r].push(i);
    }

    let mut best = layers.clone();
    let mut best_crossings = layer_crossings(&layers, ranks, dag);
    for sweep in 0..sweeps {
        if best_crossings == 0 {
            break;
        }
        let downward = sweep % 2 == 0;
        let rank_order: Vec<usize> = if downward {
            (1..rank_count).collect()
        } else {
            (0..rank_count.saturating_sub(1)).rev().collect()
        };
        for r in rank_order {
            let position = normalized_positions(&layers, ranks.len());
            let key = |v: usize| {
                let anchors: Vec<f32> = dag
                    .iter()
                    .filter_map(|&(a, b)| match downward {
                        true if b == v && ranks[a] < r => Some(position[a]),
                        false if a == v && ranks[b] > r => Some(position[b]),
                        _ => None,
                    })
                    .collect();
                if anchors.is_empty() {
                    position[v]
                } else {
                    anchors.iter().sum::<f32>() / anchors.len() as f32
                }
            };
            let mut keyed: Vec<(f32, usize)> = layers[r].iter().map(|&v| (key(v), v)).collect();
            keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
            layers[r] = keyed.into_iter().map(|(_, v)| v).collect();
        }
        let crossings = layer_crossings(&layers, ranks, dag);
        if crossings < best_crossings {
            best_crossings = crossings;
            best = layers.clone();
        }
    }
    best
}

/// Position of every node within its layer, scaled to `[0, 1]`.
fn normalized_positions(layers: &[Vec<usize>], n: usize) -> Vec<f32> {
    let mut position = vec![0.0f32; n];
    for layer in layers {
        let denom = layer.len().max(1) as f32;
        for (slot, &v) in layer.iter().enumerate() {
            position[v] = (slot as f32 + 0.5) / denom;
        }
    }
    position
}

/// Crossings between edges joining adjacent ranks.
pub(crate) fn layer_crossings(layers: &[Vec<usize>], ranks: &[usize], dag: &[(usize, usize)]) -> usize {
    let mut slot = vec![0usize; ranks.len()];
    for layer in layers {
        for (s, &v) in layer.iter().enumerate() {
            slot[v] = s;
        }
    }
    let adjacent: Vec<(usize, usize)> = dag
        .iter()
        .copied()
        .filter(|&(a, b)| ranks[b] == ranks[a] + 1)
        .collect();
    let mut count = 0;
    for (i, &(a1, b1)) in adjacent.iter().enumerate() {
        for &(a2, b2) in &adjacent[i + 1..] {
            if ranks[a1] != ranks[a2] {
                continue;
            }
            let upper = slot[a1] as isize - slot[a2] as isize;
            let lower = slot[b1] as isize - slot[b2] as isize;
            if upper * lower < 0 {
                count += 1;
            }
        }
    }
    count
}
