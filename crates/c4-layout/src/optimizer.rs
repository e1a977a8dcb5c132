//! Post-placement optimization.
//!
//! Passes run in a fixed order over the absolute bounds of every drawn
//! element:
//!
//! 1. [`overlap`] - push overlapping siblings apart, bottom-up
//! 2. [`spacing`] - center children inside roomy containers, top-down
//! 3. [`crossing`] - reorder siblings within rank rows
//! 4. [`containment`] - grow containers around their children
//!
//! The first three can be switched off; containment repair always runs and
//! is repeated together with overlap removal while it keeps growing
//! containers. [`swap`] is a separate pass run after routing.

pub mod containment;
pub mod crossing;
pub mod overlap;
pub mod spacing;
pub mod swap;

use indexmap::IndexMap;
use log::debug;

use c4_layout_core::{
    geometry::{Bounds, Point, Size},
    identifier::Id,
    model::Graph,
};

use crate::{
    config::LayoutOptions,
    hierarchy::Hierarchy,
    sizing::SizedNode,
    strategy::StrategyKind,
};

pub use overlap::remove_overlaps;

/// What the optimizer did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizeStats {
    /// Siblings moved by overlap removal.
    pub overlap_moves: usize,
    /// Sibling groups re-centered by distribution.
    pub distributed: usize,
    /// Rank-row crossings removed by reordering.
    pub crossings_removed: usize,
    /// Containment repair rounds run.
    pub repair_rounds: usize,
}

/// Everything a pass needs to read besides the bounds it edits.
pub struct Scene<'a> {
    pub graph: &'a Graph,
    pub hierarchy: &'a Hierarchy,
    pub sized: &'a IndexMap<Id, SizedNode>,
    pub root_strategy: StrategyKind,
}

impl Scene<'_> {
    /// Containers whose children are optimized, innermost first, followed by
    /// `None` for the root set.
    pub fn groups(&self) -> Vec<Option<Id>> {
        self.hierarchy
            .post_order()
            .into_iter()
            .filter(|&id| !self.hierarchy.visible_children(id).is_empty())
            .map(Some)
            .chain(std::iter::once(None))
            .collect()
    }

    /// Drawn members of a group, in sibling order.
    pub fn members(&self, group: Option<Id>, placed: &IndexMap<Id, Bounds>) -> Vec<Id> {
        let ids = match group {
            Some(id) => self.hierarchy.visible_children(id),
            None => self.hierarchy.roots(),
        };
        ids.iter().copied().filter(|id| placed.contains_key(id)).collect()
    }

    /// Returns true for containers showing fixed landscape badges.
    pub fn is_badge_host(&self, id: Id) -> bool {
        self.sized
            .get(&id)
            .and_then(|s| s.sub_layout.as_ref())
            .is_some_and(|sub| sub.strategy == StrategyKind::Badges)
    }

    /// The area children of `id` must stay inside.
    pub fn content_area(&self, id: Id, bounds: Bounds) -> Bounds {
        let Some(sized) = self.sized.get(&id) else {
            return bounds;
        };
        let pad = sized.padding;
        Bounds::new_from_top_left(
            Point::new(bounds.min_x() + pad, bounds.min_y() + sized.header_height + pad),
            Size::new(
                (bounds.width() - 2.0 * pad).max(0.0),
                (bounds.height() - sized.header_height - 2.0 * pad).max(0.0),
            ),
        )
    }
}

/// Moves `id` and every drawn descendant by `offset`.
pub fn translate_subtree(
    placed: &mut IndexMap<Id, Bounds>,
    hierarchy: &Hierarchy,
    id: Id,
    offset: Point,
) {
    if offset == Point::default() {
        return;
    }
    let mut stack = vec![id];
    while let Some(next) = stack.pop() {
        if let Some(bounds) = placed.get_mut(&next) {
            *bounds = bounds.translate(offset);
            stack.extend(hierarchy.children(next).iter().copied());
        }
    }
}

/// Runs the optimization passes enabled in `options`.
pub struct Optimizer<'a> {
    scene: Scene<'a>,
    options: &'a LayoutOptions,
}

impl<'a> Optimizer<'a> {
    pub fn new(scene: Scene<'a>, options: &'a LayoutOptions) -> Self {
        Self { scene, options }
    }

    pub fn run(&self, placed: &mut IndexMap<Id, Bounds>) -> OptimizeStats {
        let options = self.options;
        let mut stats = OptimizeStats::default();

        if options.overlap.enabled {
            stats.overlap_moves += overlap::run(&self.scene, placed, &options.overlap);
        }
        if options.distribution.enabled {
            stats.distributed += spacing::run(&self.scene, placed, &options.distribution);
        }
        if options.crossing.enabled {
            stats.crossings_removed +=
                crossing::run(&self.scene, placed, &options.crossing, options.overlap.padding);
        }

        stats.repair_rounds = 1;
        let mut grew = containment::run(&self.scene, placed);
        while grew && stats.repair_rounds < options.repair_rounds.max(1) {
            if options.overlap.enabled {
                stats.overlap_moves += overlap::run(&self.scene, placed, &options.overlap);
            }
            grew = containment::run(&self.scene, placed);
            stats.repair_rounds += 1;
        }

        debug!(
            overlap_moves = stats.overlap_moves,
            distributed = stats.distributed,
            crossings_removed = stats.crossings_removed,
            repair_rounds = stats.repair_rounds;
            "Optimization finished",
        );
        stats
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use test_support::{Fixture, id, system_with};

    #[test]
    fn test_translate_subtree_moves_descendants() {
        let fixture = Fixture::new(system_with(&["a", "b"]), &LayoutOptions::default());
        let mut placed = fixture.placed.clone();
        translate_subtree(&mut placed, &fixture.hierarchy, id("sys"), Point::new(10.0, -5.0));
        for name in ["sys", "a", "b"] {
            let before = fixture.placed[&id(name)].min_point();
            let after = placed[&id(name)].min_point();
            assert_eq!(after, before.add_point(Point::new(10.0, -5.0)));
        }
    }

    #[test]
    fn test_groups_innermost_first() {
        let fixture = Fixture::new(system_with(&["a"]), &LayoutOptions::default());
        assert_eq!(fixture.scene().groups(), vec![Some(id("sys")), None]);
    }

    #[test]
    fn test_optimizer_separates_displaced_children() {
        let options = LayoutOptions::default();
        let fixture = Fixture::new(system_with(&["a", "b", "c"]), &options);
        let mut placed = fixture.placed.clone();
        let target = placed[&id("a")].min_point();
        for name in ["b", "c"] {
            let size: Size = placed[&id(name)].to_size();
            placed.insert(id(name), Bounds::new_from_top_left(target, size));
        }

        let stats = Optimizer::new(fixture.scene(), &options).run(&mut placed);
        assert!(stats.overlap_moves > 0);

        let sys = placed[&id("sys")];
        let area = fixture.scene().content_area(id("sys"), sys);
        let children: Vec<Bounds> = ["a", "b", "c"].iter().map(|n| placed[&id(n)]).collect();
        for (i, a) in children.iter().enumerate() {
            assert!(area.contains_bounds(a));
            for b in &children[i + 1..] {
                let (ox, oy) = a.padded_overlap(b, options.overlap.padding);
                assert!(ox <= 0.01 || oy <= 0.01);
            }
        }
    }
}
