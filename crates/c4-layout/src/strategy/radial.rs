//! System-context (L1) placement: the system in focus sits in the middle and
//! everything it talks to is arranged on a ring around it.
//!
//! Satellite angles depend only on the number of satellites and their order
//! (kind, then id); the hub only influences the ring radius.

use std::f32::consts::{PI, SQRT_2};

use log::trace;

use c4_layout_core::{
    geometry::{Bounds, Point, Size},
    model::NodeKind,
};

use crate::strategy::{Placement, PlacementInput, PlacementItem, Strategy};

pub struct Radial {
    hub_gap: f32,
    ring_padding: f32,
    min_clearance: f32,
}

impl Radial {
    pub fn new() -> Self {
        Self {
            hub_gap: 40.0,
            ring_padding: 60.0,
            min_clearance: 0.0,
        }
    }

    /// Set the spacing between hubs
    pub fn set_hub_gap(&mut self, gap: f32) -> &mut Self {
        self.hub_gap = gap;
        self
    }

    /// Set the distance between the hub cluster and the ring
    pub fn set_ring_padding(&mut self, padding: f32) -> &mut Self {
        self.ring_padding = padding;
        self
    }

    /// Set the per-axis gap any two elements must keep.
    ///
    /// The ring is widened so that boxes never come closer than this on both
    /// axes at once.
    pub fn set_min_clearance(&mut self, clearance: f32) -> &mut Self {
        self.min_clearance = clearance;
        self
    }

    fn effective_padding(&self) -> f32 {
        self.ring_padding.max(self.min_clearance * SQRT_2)
    }

    /// Ring radius for satellites of diagonal `satellite_diag` around a hub
    /// cluster of diagonal `hub_diag`.
    ///
    /// With a hub the radius always exceeds `hub_diag + satellite_diag` plus
    /// the ring padding.
    pub fn radius(&self, hub_diag: f32, satellite_diag: f32, count: usize) -> f32 {
        let pad = self.effective_padding();
        let around_hub = if hub_diag > 0.0 {
            hub_diag + satellite_diag + pad
        } else {
            0.0
        };
        let between_satellites = if count > 1 {
            (satellite_diag + pad) / (2.0 * (PI / count as f32).sin())
        } else {
            satellite_diag / 2.0 + pad
        };
        around_hub.max(between_satellites)
    }

    /// Angle of satellite `index` out of `count`, starting at the top.
    pub fn angle(index: usize, count: usize) -> f32 {
        -PI / 2.0 + index as f32 * 2.0 * PI / count.max(1) as f32
    }
}

impl Default for Radial {
    fn default() -> Self {
        Self::new()
    }
}

fn is_hub(item: &PlacementItem) -> bool {
    item.kind == NodeKind::System
}

impl Strategy for Radial {
    fn place(&self, input: &PlacementInput<'_>) -> Placement {
        let items = input.items;
        if items.is_empty() {
            return Placement::default();
        }
        let mut rects = vec![Bounds::default(); items.len()];

        let hubs: Vec<usize> = (0..items.len()).filter(|&i| is_hub(&items[i])).collect();
        let hub_width: f32 = hubs.iter().map(|&i| items[i].size.width()).sum::<f32>()
            + self.hub_gap * hubs.len().saturating_sub(1) as f32;
        let hub_height = hubs
            .iter()
            .map(|&i| items[i].size.height())
            .fold(0.0f32, f32::max);
        let mut x = -hub_width / 2.0;
        for &i in &hubs {
            let size = items[i].size;
            rects[i] = Bounds::new_from_center(Point::new(x + size.width() / 2.0, 0.0), size);
            x += size.width() + self.hub_gap;
        }
        let hub_diag = Size::new(hub_width, hub_height).diagonal();

        let mut satellites: Vec<usize> = (0..items.len()).filter(|&i| !is_hub(&items[i])).collect();
        satellites.sort_by(|&a, &b| {
            items[a]
                .kind
                .cmp(&items[b].kind)
                .then_with(|| items[a].id.cmp(&items[b].id))
        });
        let count = satellites.len();
        let satellite_diag = satellites
            .iter()
            .map(|&i| items[i].size.diagonal())
            .fold(0.0f32, f32::max);
        let radius = self.radius(hub_diag, satellite_diag, count);

        for (slot, &i) in satellites.iter().enumerate() {
            let angle = Self::angle(slot, count);
            let center = Point::new(radius * angle.cos(), radius * angle.sin());
            trace!(node_id:% = items[i].id, angle, radius; "Placed satellite");
            rects[i] = Bounds::new_from_center(center, items[i].size);
        }

        Placement::from_bounds(&rects)
    }
}
