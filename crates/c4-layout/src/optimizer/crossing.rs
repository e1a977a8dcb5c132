//! Crossing minimization between rank rows of siblings.
//!
//! Siblings are grouped into rows by vertical position. Relationships that
//! reach into nested descendants are lifted to the sibling containing each
//! endpoint, so they count like edges between the siblings themselves. Edges
//! between adjacent rows are counted exactly, pairwise. Rows are reordered first by
//! barycenter sweeps and then by sifting, and finally re-packed into their
//! original slots so the row keeps its extent.

use indexmap::IndexMap;
use log::{debug, trace};

use c4_layout_core::{
    geometry::{Bounds, EPSILON, Point},
    identifier::Id,
};

use crate::{
    config::CrossingOptions,
    optimizer::{Scene, translate_subtree},
    strategy::StrategyKind,
};

/// Groups `rects` into rows, top to bottom, each ordered left to right.
///
/// A rectangle starts a new row once it lies at least `gap` below every
/// rectangle of the current row.
pub fn rank_rows(rects: &[Bounds], gap: f32) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..rects.len()).collect();
    order.sort_by(|&a, &b| {
        rects[a]
            .min_y()
            .total_cmp(&rects[b].min_y())
            .then(rects[a].min_x().total_cmp(&rects[b].min_x()))
            .then(a.cmp(&b))
    });

    let mut rows: Vec<Vec<usize>> = Vec::new();
    let mut row_bottom = f32::NEG_INFINITY;
    for i in order {
        let starts_row = rects[i].min_y() >= row_bottom + gap - EPSILON;
        match rows.last_mut() {
            Some(row) if !starts_row => {
                row.push(i);
                row_bottom = row_bottom.max(rects[i].max_y());
            }
            _ => {
                rows.push(vec![i]);
                row_bottom = rects[i].max_y();
            }
        }
    }
    for row in &mut rows {
        row.sort_by(|&a, &b| rects[a].min_x().total_cmp(&rects[b].min_x()).then(a.cmp(&b)));
    }
    rows
}

/// Number of crossing edge pairs between consecutive rows.
///
/// `edges` connect item indices; only edges between adjacent rows count.
pub fn count_crossings(rows: &[Vec<usize>], edges: &[(usize, usize)]) -> usize {
    let n = rows.iter().map(|r| r.iter().max().map_or(0, |m| m + 1)).max().unwrap_or(0);
    let mut row_of = vec![usize::MAX; n];
    let mut pos = vec![0usize; n];
    for (r, row) in rows.iter().enumerate() {
        for (p, &i) in row.iter().enumerate() {
            row_of[i] = r;
            pos[i] = p;
        }
    }

    let mut between: Vec<Vec<(usize, usize)>> = vec![Vec::new(); rows.len().saturating_sub(1)];
    for &(a, b) in edges {
        if a >= n || b >= n || row_of[a] == usize::MAX || row_of[b] == usize::MAX {
            continue;
        }
        let (upper, lower) = if row_of[a] < row_of[b] { (a, b) } else { (b, a) };
        if row_of[lower] == row_of[upper] + 1 {
            between[row_of[upper]].push((pos[upper], pos[lower]));
        }
    }

    between
        .iter()
        .map(|layer| {
            let mut crossings = 0;
            for (k, &(p1, q1)) in layer.iter().enumerate() {
                for &(p2, q2) in &layer[k + 1..] {
                    if (p1 < p2 && q1 > q2) || (p1 > p2 && q1 < q2) {
                        crossings += 1;
                    }
                }
            }
            crossings
        })
        .sum()
}

fn neighbors_in(row: &[usize], node: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    edges
        .iter()
        .filter_map(|&(a, b)| {
            let other = if a == node {
                b
            } else if b == node {
                a
            } else {
                return None;
            };
            row.iter().position(|&i| i == other)
        })
        .collect()
}

fn barycenter_sort(rows: &mut [Vec<usize>], r: usize, reference: usize, edges: &[(usize, usize)]) {
    let fixed = rows[reference].clone();
    let mut keyed: Vec<(f32, usize)> = rows[r]
        .iter()
        .enumerate()
        .map(|(p, &i)| {
            let ns = neighbors_in(&fixed, i, edges);
            let key = if ns.is_empty() {
                p as f32
            } else {
                ns.iter().sum::<usize>() as f32 / ns.len() as f32
            };
            (key, i)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    rows[r] = keyed.into_iter().map(|(_, i)| i).collect();
}

/// Reorders rows to reduce crossings. Rows with `movable[r] == false` keep
/// their order. Returns the final crossing count.
pub fn reduce_crossings(
    rows: &mut Vec<Vec<usize>>,
    movable: &[bool],
    edges: &[(usize, usize)],
    max_iterations: usize,
) -> usize {
    let mut best = count_crossings(rows, edges);
    if best == 0 || rows.len() < 2 {
        return best;
    }

    for _ in 0..max_iterations {
        let mut candidate = rows.clone();
        for r in 1..candidate.len() {
            if movable[r] {
                barycenter_sort(&mut candidate, r, r - 1, edges);
            }
        }
        for r in (0..candidate.len() - 1).rev() {
            if movable[r] {
                barycenter_sort(&mut candidate, r, r + 1, edges);
            }
        }
        let crossings = count_crossings(&candidate, edges);
        if crossings < best {
            best = crossings;
            *rows = candidate;
        } else {
            break;
        }
    }

    let mut degree: Vec<(usize, usize)> = rows
        .iter()
        .flatten()
        .map(|&i| (edges.iter().filter(|&&(a, b)| a == i || b == i).count(), i))
        .collect();
    degree.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    for _ in 0..max_iterations {
        if best == 0 {
            break;
        }
        let mut improved = false;
        for &(_, node) in &degree {
            let Some(r) = rows.iter().position(|row| row.contains(&node)) else {
                continue;
            };
            if !movable[r] || rows[r].len() < 2 {
                continue;
            }
            let mut best_row = rows[r].clone();
            let mut base = rows[r].clone();
            base.retain(|&i| i != node);
            for slot in 0..=base.len() {
                let mut trial = base.clone();
                trial.insert(slot, node);
                let saved = std::mem::replace(&mut rows[r], trial);
                let crossings = count_crossings(rows, edges);
                if crossings < best {
                    best = crossings;
                    best_row = rows[r].clone();
                    improved = true;
                }
                rows[r] = saved;
            }
            rows[r] = best_row;
        }
        if !improved {
            break;
        }
    }
    best
}

/// Moves the row's members into the slots of the original left-to-right
/// order, keeping the original gaps.
fn repack_row(
    scene: &Scene<'_>,
    placed: &mut IndexMap<Id, Bounds>,
    members: &[Id],
    original: &[usize],
    reordered: &[usize],
) {
    let rects: Vec<Bounds> = original.iter().map(|&i| placed[&members[i]]).collect();
    let gaps: Vec<f32> = rects.windows(2).map(|w| w[1].min_x() - w[0].max_x()).collect();
    let mut x = rects.first().map_or(0.0, |r| r.min_x());
    for (k, &i) in reordered.iter().enumerate() {
        let id = members[i];
        let current = placed[&id];
        translate_subtree(placed, scene.hierarchy, id, Point::new(x - current.min_x(), 0.0));
        x += current.width() + gaps.get(k).copied().unwrap_or(0.0);
    }
}

fn reorders_roots(strategy: StrategyKind) -> bool {
    matches!(
        strategy,
        StrategyKind::Layered | StrategyKind::Grid | StrategyKind::GoldenGrid
    )
}

/// Reorders siblings of every container, and of the root set for layered and
/// grid root layouts. Returns the number of crossings removed.
pub(crate) fn run(
    scene: &Scene<'_>,
    placed: &mut IndexMap<Id, Bounds>,
    options: &CrossingOptions,
    padding: f32,
) -> usize {
    let mut removed = 0;
    for group in scene.groups() {
        match group {
            Some(id) if scene.is_badge_host(id) => continue,
            None if !reorders_roots(scene.root_strategy) => continue,
            _ => {}
        }
        let members = scene.members(group, placed);
        if members.len() < 3 {
            continue;
        }
        let edges = scene.hierarchy.sibling_edges(scene.graph, group, &members);
        if edges.len() < 2 {
            continue;
        }
        let rects: Vec<Bounds> = members.iter().map(|id| placed[id]).collect();
        let original = rank_rows(&rects, padding);
        if original.len() < 2 {
            continue;
        }
        let movable: Vec<bool> = original
            .iter()
            .map(|row| {
                row.windows(2)
                    .all(|w| rects[w[1]].min_x() - rects[w[0]].max_x() >= padding - EPSILON)
            })
            .collect();

        let before = count_crossings(&original, &edges);
        let mut rows = original.clone();
        let after = reduce_crossings(&mut rows, &movable, &edges, options.max_iterations);
        if after >= before {
            continue;
        }
        for (r, row) in rows.iter().enumerate() {
            if *row != original[r] {
                repack_row(scene, placed, &members, &original[r], row);
            }
        }
        trace!(before, after; "Reordered rank rows");
        removed += before - after;
    }
    if removed > 0 {
        debug!(removed; "Crossings removed by reordering");
    }
    removed
}

#[cfg(test)]
mod tests {
    use c4_layout_core::geometry::Size;

    use super::*;

    fn rect(x: f32, y: f32) -> Bounds {
        Bounds::new_from_top_left(Point::new(x, y), Size::new(50.0, 30.0))
    }

    #[test]
    fn test_rank_rows_by_vertical_position() {
        let rects = [rect(100.0, 0.0), rect(0.0, 5.0), rect(0.0, 100.0), rect(80.0, 100.0)];
        assert_eq!(rank_rows(&rects, 20.0), vec![vec![1, 0], vec![2, 3]]);
    }

    #[test]
    fn test_count_crossings() {
        let rows = vec![vec![0, 1], vec![2, 3]];
        assert_eq!(count_crossings(&rows, &[(0, 3), (1, 2)]), 1);
        assert_eq!(count_crossings(&rows, &[(0, 2), (1, 3)]), 0);
        // Edges skipping a row are ignored.
        let rows = vec![vec![0, 1], vec![2], vec![3, 4]];
        assert_eq!(count_crossings(&rows, &[(0, 4), (1, 3)]), 0);
    }

    #[test]
    fn test_reduce_untangles_cross() {
        let mut rows = vec![vec![0, 1, 2], vec![3, 4, 5]];
        let edges = [(0, 5), (1, 4), (2, 3)];
        let after = reduce_crossings(&mut rows, &[true, true], &edges, 6);
        assert_eq!(after, 0);
        assert_eq!(count_crossings(&rows, &edges), 0);
    }

    #[test]
    fn test_fixed_rows_keep_order() {
        let mut rows = vec![vec![0, 1], vec![2, 3]];
        let edges = [(0, 3), (1, 2)];
        let after = reduce_crossings(&mut rows, &[false, false], &edges, 6);
        assert_eq!(after, 1);
        assert_eq!(rows, vec![vec![0, 1], vec![2, 3]]);
    }

    #[test]
    fn test_run_repacks_within_row_extent() {
        use c4_layout_core::model::{Graph, Node, NodeKind, Relationship};

        use crate::{
            config::LayoutOptions,
            optimizer::{containment, test_support::{Fixture, id}},
        };

        let mut builder = Graph::builder();
        builder.add_node(Node::new(id("sys"), "System", NodeKind::System));
        for name in ["a", "b", "c", "d"] {
            builder.add_node(Node::new(id(name), name, NodeKind::Container).with_parent(id("sys")));
        }
        // Grid rows are [a, b] and [c, d]; these edges cross.
        builder
            .add_relationship(Relationship::new(id("r1"), id("a"), id("d")))
            .add_relationship(Relationship::new(id("r2"), id("b"), id("c")));
        let options = LayoutOptions::default();
        let fixture = Fixture::new(builder.build().unwrap(), &options);
        let scene = fixture.scene();
        let mut placed = fixture.placed.clone();
        let extent_before = ["a", "b", "c", "d"]
            .iter()
            .map(|n| placed[&id(n)])
            .reduce(|a, b| a.merge(&b))
            .unwrap();

        let removed = run(&scene, &mut placed, &options.crossing, options.overlap.padding);
        assert_eq!(removed, 1);
        let extent_after = ["a", "b", "c", "d"]
            .iter()
            .map(|n| placed[&id(n)])
            .reduce(|a, b| a.merge(&b))
            .unwrap();
        assert!(extent_before.contains_bounds(&extent_after));
        assert!(containment::violations(&scene, &placed).is_empty());
    }
}
