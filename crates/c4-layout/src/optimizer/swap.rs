//! Localized swaps of neighboring siblings, run after routing.
//!
//! Within a rank band two horizontally adjacent siblings trade centers when
//! that strictly lowers the number of crossing straight lines between
//! relationship endpoints, and the swap keeps both containment and sibling
//! spacing intact.

use indexmap::IndexMap;
use log::{debug, trace};

use c4_layout_core::{
    geometry::{Bounds, EPSILON, Point, segments_cross},
    identifier::Id,
};

use crate::{
    config::LocalSwapOptions,
    optimizer::{Scene, crossing::rank_rows, translate_subtree},
    strategy::StrategyKind,
};

/// Crossings between straight lines joining the centers of every drawn
/// relationship's endpoints.
pub fn straight_line_crossings(scene: &Scene<'_>, placed: &IndexMap<Id, Bounds>) -> usize {
    let segments: Vec<(Point, Point)> = scene
        .graph
        .relationships()
        .iter()
        .filter_map(|rel| {
            let from = scene.hierarchy.representative(rel.from())?;
            let to = scene.hierarchy.representative(rel.to())?;
            if from == to {
                return None;
            }
            Some((placed.get(&from)?.center(), placed.get(&to)?.center()))
        })
        .collect();

    let mut crossings = 0;
    for (i, a) in segments.iter().enumerate() {
        for b in &segments[i + 1..] {
            if segments_cross(a.0, a.1, b.0, b.1) {
                crossings += 1;
            }
        }
    }
    crossings
}

fn keeps_constraints(
    scene: &Scene<'_>,
    placed: &IndexMap<Id, Bounds>,
    group: Option<Id>,
    members: &[Id],
    padding: f32,
) -> bool {
    let rects: Vec<Bounds> = members.iter().filter_map(|id| placed.get(id).copied()).collect();
    for (i, a) in rects.iter().enumerate() {
        for b in &rects[i + 1..] {
            let (ox, oy) = a.padded_overlap(b, padding);
            if ox > EPSILON && oy > EPSILON {
                return false;
            }
        }
    }
    match group.and_then(|id| placed.get(&id).map(|b| scene.content_area(id, *b))) {
        Some(area) => rects.iter().all(|r| area.contains_bounds(r)),
        None => true,
    }
}

fn swap_centers(scene: &Scene<'_>, placed: &mut IndexMap<Id, Bounds>, a: Id, b: Id) {
    let (Some(ra), Some(rb)) = (placed.get(&a).copied(), placed.get(&b).copied()) else {
        return;
    };
    let delta = rb.center().sub_point(ra.center());
    translate_subtree(placed, scene.hierarchy, a, delta);
    translate_subtree(placed, scene.hierarchy, b, delta.scale(-1.0));
}

/// Swaps neighboring siblings while it helps, up to `options.max_swaps`.
///
/// The root set of a radial layout is never touched. Returns the number of
/// swaps kept.
pub fn run(
    scene: &Scene<'_>,
    placed: &mut IndexMap<Id, Bounds>,
    options: &LocalSwapOptions,
    padding: f32,
) -> usize {
    let mut swaps = 0;
    let mut crossings = straight_line_crossings(scene, placed);
    if crossings == 0 {
        return 0;
    }

    'groups: for group in scene.groups() {
        match group {
            Some(id) if scene.is_badge_host(id) => continue,
            None if scene.root_strategy == StrategyKind::Radial => continue,
            _ => {}
        }
        let members = scene.members(group, placed);
        if members.len() < 2 {
            continue;
        }
        let rects: Vec<Bounds> = members.iter().filter_map(|id| placed.get(id).copied()).collect();
        for band in rank_rows(&rects, padding) {
            for pair in band.windows(2) {
                if swaps >= options.max_swaps || crossings == 0 {
                    break 'groups;
                }
                let (a, b) = (members[pair[0]], members[pair[1]]);
                let saved = placed.clone();
                swap_centers(scene, placed, a, b);
                let after = straight_line_crossings(scene, placed);
                if after < crossings && keeps_constraints(scene, placed, group, &members, padding) {
                    trace!(first:% = a, second:% = b, before = crossings, after; "Swapped siblings");
                    crossings = after;
                    swaps += 1;
                } else {
                    *placed = saved;
                }
            }
        }
    }
    debug!(swaps, crossings; "Local swap finished");
    swaps
}
