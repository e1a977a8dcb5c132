//! Placement strategies.
//!
//! A strategy arranges a flat set of sized siblings and returns their
//! top-left positions relative to the arrangement's own origin. Strategies
//! are used both for the root level and for the children of each container.
//!
//! - [`grid::GoldenGrid`] - Uniform cells, golden-ratio column count
//! - [`grid::CompactGrid`] - Square-ish grid with per-column widths (L2)
//! - [`layered::Layered`] - Longest-path ranks with barycenter ordering (L3)
//! - [`radial::Radial`] - Hubs in the middle, satellites on a ring (L1)
//! - [`landscape::Landscape`] - Connectivity-clustered flow (L0)
//! - [`flow::Flow`] - Rows wrapped at a maximum width

pub mod flow;
pub mod grid;
pub mod landscape;
pub mod layered;
pub mod radial;

use std::fmt;

use serde::{Deserialize, Serialize};

use c4_layout_core::{
    geometry::{Bounds, Point, Size},
    identifier::Id,
    model::NodeKind,
    view::{Alignment, Direction, ViewState},
};

use crate::config::LayoutOptions;

/// Which strategy arranged a set of elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Pick a root strategy from the dominant level of the root elements.
    #[default]
    Auto,
    Landscape,
    Radial,
    GoldenGrid,
    Grid,
    Layered,
    Flow,
    /// Keep positions from a previous layout where available.
    Incremental,
    /// Fixed-size child badges inside a landscape system.
    Badges,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Auto => "auto",
            StrategyKind::Landscape => "landscape",
            StrategyKind::Radial => "radial",
            StrategyKind::GoldenGrid => "golden-grid",
            StrategyKind::Grid => "grid",
            StrategyKind::Layered => "layered",
            StrategyKind::Flow => "flow",
            StrategyKind::Incremental => "incremental",
            StrategyKind::Badges => "badges",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element to place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementItem {
    pub id: Id,
    pub kind: NodeKind,
    pub size: Size,
}

/// Elements to place and the directed edges between them, by index.
#[derive(Debug, Clone, Copy)]
pub struct PlacementInput<'a> {
    pub items: &'a [PlacementItem],
    pub edges: &'a [(usize, usize)],
}

impl<'a> PlacementInput<'a> {
    pub fn new(items: &'a [PlacementItem], edges: &'a [(usize, usize)]) -> Self {
        Self { items, edges }
    }
}

/// Result of a strategy: one top-left position per item.
///
/// Positions are normalized so the arrangement's bounding box starts at the
/// origin; `size` is that bounding box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placement {
    pub positions: Vec<Point>,
    pub size: Size,
}

impl Placement {
    /// Builds a normalized placement from item rectangles.
    pub fn from_bounds(rects: &[Bounds]) -> Self {
        let Some(outer) = Bounds::union_all(rects.iter().copied()) else {
            return Self::default();
        };
        let origin = outer.min_point();
        Self {
            positions: rects.iter().map(|r| r.min_point().sub_point(origin)).collect(),
            size: outer.to_size(),
        }
    }

    /// Rectangle of item `index`.
    pub fn bounds(&self, index: usize, size: Size) -> Option<Bounds> {
        self.positions
            .get(index)
            .map(|p| Bounds::new_from_top_left(*p, size))
    }
}

/// Trait implemented by every placement strategy.
pub trait Strategy {
    /// Arrange `input.items`.
    ///
    /// The returned placement has exactly one position per item.
    fn place(&self, input: &PlacementInput<'_>) -> Placement;
}

/// Creates strategies configured from layout options and view overrides.
pub struct StrategyBuilder<'a> {
    options: &'a LayoutOptions,
    direction: Direction,
    alignment: Alignment,
    grid_columns: Option<usize>,
}

impl<'a> StrategyBuilder<'a> {
    pub fn new(options: &'a LayoutOptions, view: &ViewState) -> Self {
        Self {
            options,
            direction: view.direction.unwrap_or(options.direction),
            alignment: view.alignment.unwrap_or(options.alignment),
            grid_columns: view.grid_columns,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    /// Strategy for the children of a container of `kind`.
    pub fn container_kind(kind: NodeKind) -> StrategyKind {
        if kind.is_system_like() {
            StrategyKind::Grid
        } else if kind.is_container_like() {
            StrategyKind::Layered
        } else {
            StrategyKind::Flow
        }
    }

    /// Get a strategy of the given kind with configured options.
    ///
    /// `Auto` and `Incremental` fall back to the golden grid; callers resolve
    /// them before asking for a strategy.
    pub fn build(&self, kind: StrategyKind) -> Box<dyn Strategy> {
        let options = self.options;
        let gap = options.sibling_gap();
        match kind {
            StrategyKind::Landscape => {
                let mut s = landscape::Landscape::new();
                s.set_gap(gap)
                    .set_max_row_width(options.spacing.max_row_width)
                    .set_alignment(self.alignment);
                Box::new(s)
            }
            StrategyKind::Radial => {
                let mut s = radial::Radial::new();
                s.set_hub_gap(gap)
                    .set_ring_padding(options.spacing.ring_padding)
                    .set_min_clearance(options.overlap.padding);
                Box::new(s)
            }
            StrategyKind::Grid => {
                let mut s = grid::CompactGrid::new();
                s.set_gap(gap)
                    .set_columns(self.grid_columns)
                    .set_alignment(self.alignment);
                Box::new(s)
            }
            StrategyKind::Badges => {
                let mut s = grid::CompactGrid::new();
                s.set_gap(options.spacing.badge_gap)
                    .set_alignment(Alignment::Start);
                Box::new(s)
            }
            StrategyKind::Layered => {
                let mut s = layered::Layered::new();
                s.set_node_gap(gap)
                    .set_rank_gap(options.rank_gap())
                    .set_direction(self.direction)
                    .set_alignment(self.alignment);
                Box::new(s)
            }
            StrategyKind::Flow => {
                let mut s = flow::Flow::new();
                s.set_gap(gap)
                    .set_max_row_width(options.spacing.max_row_width)
                    .set_alignment(self.alignment);
                Box::new(s)
            }
            StrategyKind::GoldenGrid | StrategyKind::Auto | StrategyKind::Incremental => {
                let mut s = grid::GoldenGrid::new();
                s.set_gap(gap)
                    .set_columns(self.grid_columns)
                    .set_alignment(self.alignment);
                Box::new(s)
            }
        }
    }
}

/// Offset of an element of length `inner` inside a slot of length `outer`.
pub(crate) fn align_offset(alignment: Alignment, outer: f32, inner: f32) -> f32 {
    let slack = (outer - inner).max(0.0);
    match alignment {
        Alignment::Start => 0.0,
        Alignment::Center => slack / 2.0,
        Alignment::End => slack,
    }
}

/// Distinct, non-loop edges in a stable order.
pub(crate) fn clean_edges(edges: &[(usize, usize)], n: usize) -> Vec<(usize, usize)> {
    let mut out: Vec<(usize, usize)> = edges
        .iter()
        .copied()
        .filter(|&(a, b)| a != b && a < n && b < n)
        .collect();
    out.sort_unstable();
    out.dedup();
    out
}
