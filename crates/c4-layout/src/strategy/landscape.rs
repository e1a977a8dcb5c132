//! Landscape (L0) placement: connected systems cluster together, then flow.

use log::trace;

use c4_layout_core::view::Alignment;

use crate::strategy::{
    Placement, PlacementInput, PlacementItem, Strategy, clean_edges, flow::Flow,
};

pub struct Landscape {
    flow: Flow,
}

impl Landscape {
    pub fn new() -> Self {
        Self { flow: Flow::new() }
    }

    pub fn set_gap(&mut self, gap: f32) -> &mut Self {
        self.flow.set_gap(gap);
        self
    }

    pub fn set_max_row_width(&mut self, width: f32) -> &mut Self {
        self.flow.set_max_row_width(width);
        self
    }

    pub fn set_alignment(&mut self, alignment: Alignment) -> &mut Self {
        self.flow.set_alignment(alignment);
        self
    }
}

impl Default for Landscape {
    fn default() -> Self {
        Self::new()
    }
}

/// Orders items so that each seed is followed by its direct neighbors.
///
/// The seed is the unplaced system with the highest degree (ties keep input
/// order); when no system is left, any unplaced item qualifies. Its unplaced
/// neighbors follow, highest degree first.
pub(crate) fn cluster_order(items: &[PlacementItem], edges: &[(usize, usize)]) -> Vec<usize> {
    let n = items.len();
    let edges = clean_edges(edges, n);
    let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &(a, b) in &edges {
        if !neighbors[a].contains(&b) {
            neighbors[a].push(b);
        }
        if !neighbors[b].contains(&a) {
            neighbors[b].push(a);
        }
    }
    let degree: Vec<usize> = neighbors.iter().map(Vec::len).collect();

    let mut placed = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let by_degree = |candidates: &mut Vec<usize>| {
        candidates.sort_by(|&a, &b| degree[b].cmp(&degree[a]).then(a.cmp(&b)));
    };

    while order.len() < n {
        let mut candidates: Vec<usize> = (0..n)
            .filter(|&i| !placed[i] && items[i].kind.is_system_like())
            .collect();
        if candidates.is_empty() {
            candidates = (0..n).filter(|&i| !placed[i]).collect();
        }
        by_degree(&mut candidates);
        let Some(&seed) = candidates.first() else {
            break;
        };
        placed[seed] = true;
        order.push(seed);

        let mut cluster: Vec<usize> = neighbors[seed]
            .iter()
            .copied()
            .filter(|&i| !placed[i])
            .collect();
        by_degree(&mut cluster);
        for i in cluster {
            placed[i] = true;
            order.push(i);
        }
        trace!(seed:% = items[seed].id, placed = order.len(); "Landscape cluster placed");
    }
    order
}

impl Strategy for Landscape {
    fn place(&self, input: &PlacementInput<'_>) -> Placement {
        let order = cluster_order(input.items, input.edges);
        Placement::from_bounds(&self.flow.wrap(input.items, &order))
    }
}
