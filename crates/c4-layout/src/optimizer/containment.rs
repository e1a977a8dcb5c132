//! Containment repair.

use indexmap::IndexMap;
use log::trace;

use c4_layout_core::{
    geometry::{Bounds, EPSILON, Point, Size},
    identifier::Id,
};

use crate::optimizer::Scene;

/// Grows container `id` so its children fit inside with padding and header.
///
/// Never shrinks. Returns true if the container grew.
pub(crate) fn grow_to_fit(scene: &Scene<'_>, placed: &mut IndexMap<Id, Bounds>, id: Id) -> bool {
    let Some(sized) = scene.sized.get(&id) else {
        return false;
    };
    let members = scene.members(Some(id), placed);
    let Some(children) = Bounds::union_all(members.iter().filter_map(|c| placed.get(c).copied())) else {
        return false;
    };
    let Some(current) = placed.get(&id).copied() else {
        return false;
    };

    let pad = sized.padding;
    let required = Bounds::new_from_top_left(
        Point::new(
            children.min_x() - pad,
            children.min_y() - sized.header_height - pad,
        ),
        Size::new(
            children.width() + 2.0 * pad,
            children.height() + sized.header_height + 2.0 * pad,
        ),
    );
    let grown = current.merge(&required);
    let changed = (grown.min_x() - current.min_x()).abs() > EPSILON
        || (grown.min_y() - current.min_y()).abs() > EPSILON
        || (grown.max_x() - current.max_x()).abs() > EPSILON
        || (grown.max_y() - current.max_y()).abs() > EPSILON;
    if changed {
        trace!(
            node_id:% = id,
            width = grown.width(),
            height = grown.height();
            "Grew container to fit children",
        );
        placed.insert(id, grown);
    }
    changed
}

/// Grows every container, innermost first. Returns true if any grew.
pub(crate) fn run(scene: &Scene<'_>, placed: &mut IndexMap<Id, Bounds>) -> bool {
    let mut grew = false;
    for group in scene.groups().into_iter().flatten() {
        grew |= grow_to_fit(scene, placed, group);
    }
    grew
}

/// Containers whose content area does not hold all of their children.
pub fn violations(scene: &Scene<'_>, placed: &IndexMap<Id, Bounds>) -> Vec<Id> {
    scene
        .groups()
        .into_iter()
        .flatten()
        .filter(|&id| {
            let Some(bounds) = placed.get(&id) else {
                return false;
            };
            let area = scene.content_area(id, *bounds);
            scene
                .members(Some(id), placed)
                .iter()
                .filter_map(|c| placed.get(c))
                .any(|child| !area.contains_bounds(child))
        })
        .collect()
}
