//! Space distribution: children of a roomy container are centered as a group.

use indexmap::IndexMap;
use log::trace;

use c4_layout_core::{
    geometry::{Bounds, Point},
    identifier::Id,
};

use crate::{
    config::DistributionOptions,
    optimizer::{Scene, translate_subtree},
};

/// Offset that centers `group` inside `area` on every axis with more than
/// `threshold` spare room.
pub fn centering_offset(area: Bounds, group: Bounds, threshold: f32) -> Point {
    let spare_x = area.width() - group.width();
    let spare_y = area.height() - group.height();
    let dx = if spare_x > threshold {
        area.center().x() - group.center().x()
    } else {
        0.0
    };
    let dy = if spare_y > threshold {
        area.center().y() - group.center().y()
    } else {
        0.0
    };
    Point::new(dx, dy)
}

/// Re-centers children, outermost containers first. Returns the number of
/// groups moved.
pub(crate) fn run(
    scene: &Scene<'_>,
    placed: &mut IndexMap<Id, Bounds>,
    options: &DistributionOptions,
) -> usize {
    let mut moved = 0;
    let containers: Vec<Id> = scene.groups().into_iter().flatten().collect();
    for &id in containers.iter().rev() {
        if scene.is_badge_host(id) {
            continue;
        }
        let Some(bounds) = placed.get(&id).copied() else {
            continue;
        };
        let members = scene.members(Some(id), placed);
        let Some(group) = Bounds::union_all(members.iter().filter_map(|c| placed.get(c).copied())) else {
            continue;
        };
        let offset = centering_offset(scene.content_area(id, bounds), group, options.threshold);
        if offset == Point::default() {
            continue;
        }
        trace!(node_id:% = id, dx = offset.x(), dy = offset.y(); "Centering children");
        for member in members {
            translate_subtree(placed, scene.hierarchy, member, offset);
        }
        moved += 1;
    }
    moved
}

#[cfg(test)]
mod tests {
    use c4_layout_core::{
        geometry::Size,
        model::{Graph, Node, NodeKind, SizeHint},
    };
    use float_cmp::assert_approx_eq;

    use super::*;
    use crate::{
        config::LayoutOptions,
        optimizer::test_support::{Fixture, id},
    };

    #[test]
    fn test_centering_offset_respects_threshold() {
        let area = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(400.0, 100.0));
        let group = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 80.0));
        let offset = centering_offset(area, group, 40.0);
        assert_eq!(offset, Point::new(150.0, 0.0));
    }

    #[test]
    fn test_children_centered_in_enlarged_container() {
        let mut builder = Graph::builder();
        builder
            .add_node(Node::new(id("sys"), "System", NodeKind::System).with_size_hint(SizeHint {
                width: Some(900.0),
                height: Some(700.0),
                aspect: None,
            }))
            .add_node(Node::new(id("a"), "A", NodeKind::Container).with_parent(id("sys")))
            .add_node(Node::new(id("b"), "B", NodeKind::Container).with_parent(id("sys")));
        let options = LayoutOptions::default();
        let fixture = Fixture::new(builder.build().unwrap(), &options);
        let scene = fixture.scene();
        let mut placed = fixture.placed.clone();

        assert_eq!(run(&scene, &mut placed, &options.distribution), 1);
        let area = scene.content_area(id("sys"), placed[&id("sys")]);
        let group = placed[&id("a")].merge(&placed[&id("b")]);
        assert_approx_eq!(f32, group.center().x(), area.center().x(), epsilon = 0.01);
        assert_approx_eq!(f32, group.center().y(), area.center().y(), epsilon = 0.01);
        assert!(area.contains_bounds(&group));
    }
}
