//! Sibling overlap removal.

use indexmap::IndexMap;
use log::trace;

use c4_layout_core::{
    geometry::{Bounds, EPSILON, Point},
    identifier::Id,
};

use crate::{
    config::OverlapOptions,
    optimizer::{Scene, containment, translate_subtree},
};

/// Pushes rectangles apart until no two are closer than `padding` on both
/// axes, or `max_iterations` sweeps have run.
///
/// Each overlapping pair is separated along the axis with less overlap, each
/// side moving half the distance. Returns the number of pair moves.
///
/// ```
/// # use c4_layout::optimizer::remove_overlaps;
/// # use c4_layout_core::geometry::{Bounds, Point, Size};
/// let mut rects = [
///     Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 100.0)),
///     Bounds::new_from_top_left(Point::new(50.0, 50.0), Size::new(100.0, 100.0)),
/// ];
/// remove_overlaps(&mut rects, 10.0, 50);
/// let (ox, oy) = rects[0].padded_overlap(&rects[1], 10.0);
/// assert!(ox <= 0.01 || oy <= 0.01);
/// ```
pub fn remove_overlaps(rects: &mut [Bounds], padding: f32, max_iterations: usize) -> usize {
    let mut moves = 0;
    for iteration in 0..max_iterations {
        let mut moved = false;
        for i in 0..rects.len() {
            for j in i + 1..rects.len() {
                let (ox, oy) = rects[i].padded_overlap(&rects[j], padding);
                if ox <= EPSILON || oy <= EPSILON {
                    continue;
                }
                let (ci, cj) = (rects[i].center(), rects[j].center());
                let offset = if ox <= oy {
                    let sign = if cj.x() >= ci.x() { 1.0 } else { -1.0 };
                    Point::new(sign * ox / 2.0, 0.0)
                } else {
                    let sign = if cj.y() >= ci.y() { 1.0 } else { -1.0 };
                    Point::new(0.0, sign * oy / 2.0)
                };
                rects[i] = rects[i].translate(offset.scale(-1.0));
                rects[j] = rects[j].translate(offset);
                moved = true;
                moves += 1;
            }
        }
        if !moved {
            trace!(iterations = iteration, moves; "Overlap removal converged");
            break;
        }
    }
    moves
}

/// Removes overlaps inside every group, innermost first, growing each
/// container around its children before its own siblings are processed.
pub(crate) fn run(scene: &Scene<'_>, placed: &mut IndexMap<Id, Bounds>, options: &OverlapOptions) -> usize {
    let mut moves = 0;
    for group in scene.groups() {
        if group.is_some_and(|id| scene.is_badge_host(id)) {
            continue;
        }
        let members = scene.members(group, placed);
        if members.len() > 1 {
            let before: Vec<Bounds> = members.iter().filter_map(|id| placed.get(id).copied()).collect();
            let mut after = before.clone();
            let group_moves = remove_overlaps(&mut after, options.padding, options.max_iterations);
            if group_moves > 0 {
                for ((id, old), new) in members.iter().zip(&before).zip(&after) {
                    let offset = new.min_point().sub_point(old.min_point());
                    translate_subtree(placed, scene.hierarchy, *id, offset);
                }
                trace!(group:? = group.map(|g| g.to_string()), moves = group_moves; "Separated siblings");
            }
            moves += group_moves;
        }
        if let Some(parent) = group {
            containment::grow_to_fit(scene, placed, parent);
        }
    }
    moves
}
