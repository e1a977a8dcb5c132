//! Layout options and named presets.
//!
//! [`LayoutOptions`] groups every knob the pipeline reads. All option types
//! implement [`serde::Deserialize`] with `kebab-case` keys and per-field
//! defaults, so partial documents load cleanly.
//!
//! # Example
//!
//! ```
//! # use c4_layout::config::{LayoutOptions, Preset};
//! let options = Preset::Compact.options();
//! assert!(options.spacing.node < LayoutOptions::default().spacing.node);
//! ```

use std::{collections::BTreeMap, fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use c4_layout_core::{
    geometry::{Point, Size},
    identifier::Id,
    model::NodeKind,
    view::{Alignment, Direction},
};

use crate::{
    error::UnknownPreset,
    routing::RoutingStyle,
    strategy::StrategyKind,
    text::{ApproximateMeasurer, TextMeasurer},
};

fn default_measurer() -> Arc<dyn TextMeasurer> {
    Arc::new(ApproximateMeasurer::default())
}

/// Every option the layout pipeline reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LayoutOptions {
    /// Flow direction for layered placement.
    pub direction: Direction,

    /// Alignment of elements inside grid cells and containers.
    pub alignment: Alignment,

    /// Strategy for the root-level elements.
    pub strategy: StrategyKind,

    pub spacing: SpacingOptions,
    pub sizing: SizingOptions,
    pub routing: RoutingOptions,
    pub overlap: OverlapOptions,
    pub distribution: DistributionOptions,
    pub crossing: CrossingOptions,
    pub local_swap: LocalSwapOptions,

    /// Upper bound on overlap-removal and containment-repair rounds after a
    /// container had to grow.
    pub repair_rounds: usize,

    /// Top-left positions from a previous layout, read by the incremental strategy.
    pub previous_positions: BTreeMap<Id, Point>,

    /// Collect per-phase timings into the result.
    pub debug: bool,

    /// Backend used to measure labels.
    #[serde(skip, default = "default_measurer")]
    pub measurer: Arc<dyn TextMeasurer>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            direction: Direction::default(),
            alignment: Alignment::default(),
            strategy: StrategyKind::default(),
            spacing: SpacingOptions::default(),
            sizing: SizingOptions::default(),
            routing: RoutingOptions::default(),
            overlap: OverlapOptions::default(),
            distribution: DistributionOptions::default(),
            crossing: CrossingOptions::default(),
            local_swap: LocalSwapOptions::default(),
            repair_rounds: 4,
            previous_positions: BTreeMap::new(),
            debug: false,
            measurer: default_measurer(),
        }
    }
}

impl LayoutOptions {
    pub fn with_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.measurer = measurer;
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Gap between sibling elements.
    ///
    /// Never smaller than the overlap padding, so freshly placed siblings
    /// already satisfy the non-overlap pass.
    pub fn sibling_gap(&self) -> f32 {
        self.spacing.node.max(self.overlap.padding)
    }

    /// Gap between consecutive ranks of a layered layout.
    pub fn rank_gap(&self) -> f32 {
        self.spacing.rank.max(self.overlap.padding)
    }

    /// Inner padding of an element of `kind`.
    pub fn padding_for(&self, kind: NodeKind) -> f32 {
        self.spacing
            .kind_padding
            .get(&kind)
            .copied()
            .unwrap_or(self.spacing.padding)
    }
}

/// Distances between and inside elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SpacingOptions {
    /// Gap between siblings.
    pub node: f32,
    /// Gap between ranks of a layered layout.
    pub rank: f32,
    /// Inner padding of every element.
    pub padding: f32,
    /// Per-kind overrides of `padding`.
    pub kind_padding: BTreeMap<NodeKind, f32>,
    /// Clearance between the hub and the satellite ring in context views.
    pub ring_padding: f32,
    /// Wrap width for flow and landscape rows.
    pub max_row_width: f32,
    /// Distance kept between the layout and the coordinate origin.
    pub margin: f32,
    /// Size of a child badge in landscape views.
    pub badge: Size,
    /// Gap between landscape badges.
    pub badge_gap: f32,
}

impl Default for SpacingOptions {
    fn default() -> Self {
        Self {
            node: 40.0,
            rank: 60.0,
            padding: 16.0,
            kind_padding: BTreeMap::new(),
            ring_padding: 60.0,
            max_row_width: 1600.0,
            margin: 20.0,
            badge: Size::new(56.0, 24.0),
            badge_gap: 6.0,
        }
    }
}

/// Size limits for elements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SizingOptions {
    pub min_width: f32,
    pub min_height: f32,
    /// Widest a leaf may grow; text wraps inside it.
    pub max_width: f32,
    pub max_height: f32,
    /// Smallest allowed width / height ratio of a leaf.
    pub min_aspect: f32,
    /// Largest allowed width / height ratio of a leaf.
    pub max_aspect: f32,
}

impl Default for SizingOptions {
    fn default() -> Self {
        Self {
            min_width: 120.0,
            min_height: 60.0,
            max_width: 280.0,
            max_height: 400.0,
            min_aspect: 0.5,
            max_aspect: 4.0,
        }
    }
}

impl SizingOptions {
    pub fn min_size(&self) -> Size {
        Size::new(self.min_width, self.min_height)
    }

    pub fn max_size(&self) -> Size {
        Size::new(self.max_width, self.max_height)
    }
}

/// Edge routing settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RoutingOptions {
    /// Style used for relationships without an explicit routing hint.
    pub style: RoutingStyle,
    /// Distance kept between orthogonal paths and obstacles.
    pub clearance: f32,
    /// Length of the straight segment leaving each port.
    pub stub_length: f32,
    /// Extra cost of every bend, in pixels of path length.
    pub bend_penalty: f32,
    /// Initial margin of the search corridor around both endpoints.
    pub corridor_margin: f32,
    /// Cap on A* expansions per attempt.
    pub max_expansions: usize,
    /// Extra cost for a port whose side faces away from the other endpoint.
    pub facing_penalty: f32,
    /// Wrap width of relationship labels.
    pub label_max_width: f32,
    /// Padding around relationship label bounds.
    pub label_padding: f32,
}

impl Default for RoutingOptions {
    fn default() -> Self {
        Self {
            style: RoutingStyle::Orthogonal,
            clearance: 12.0,
            stub_length: 16.0,
            bend_penalty: 24.0,
            corridor_margin: 80.0,
            max_expansions: 60_000,
            facing_penalty: 200.0,
            label_max_width: 160.0,
            label_padding: 4.0,
        }
    }
}

/// Sibling overlap removal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OverlapOptions {
    pub enabled: bool,
    /// Minimum distance between siblings.
    pub padding: f32,
    pub max_iterations: usize,
}

impl Default for OverlapOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            padding: 20.0,
            max_iterations: 100,
        }
    }
}

/// Centering of children inside containers with spare room.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DistributionOptions {
    pub enabled: bool,
    /// Spare room on an axis, in pixels, above which children are re-centered.
    pub threshold: f32,
}

impl Default for DistributionOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 40.0,
        }
    }
}

/// Sibling reordering to reduce edge crossings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrossingOptions {
    pub enabled: bool,
    pub max_iterations: usize,
}

impl Default for CrossingOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            max_iterations: 6,
        }
    }
}

/// Post-routing swaps of neighboring siblings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LocalSwapOptions {
    pub enabled: bool,
    pub max_swaps: usize,
}

impl Default for LocalSwapOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            max_swaps: 16,
        }
    }
}

/// Named option bundles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// Tight spacing and light optimization.
    Compact,
    /// The defaults: balanced spacing and a quick optimizer.
    #[default]
    Interactive,
    /// Generous spacing and the full optimizer, including local swaps.
    Publication,
    /// Landscape strategy with wide rows.
    Landscape,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::Compact,
        Preset::Interactive,
        Preset::Publication,
        Preset::Landscape,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Preset::Compact => "compact",
            Preset::Interactive => "interactive",
            Preset::Publication => "publication",
            Preset::Landscape => "landscape",
        }
    }

    pub fn options(self) -> LayoutOptions {
        let mut options = LayoutOptions::default();
        match self {
            Preset::Compact => {
                options.spacing.node = 20.0;
                options.spacing.rank = 36.0;
                options.spacing.padding = 10.0;
                options.spacing.ring_padding = 36.0;
                options.sizing.min_width = 96.0;
                options.sizing.min_height = 48.0;
                options.overlap.padding = 10.0;
                options.routing.clearance = 8.0;
                options.crossing.max_iterations = 3;
                options.distribution.enabled = false;
            }
            Preset::Interactive => {}
            Preset::Publication => {
                options.spacing.node = 56.0;
                options.spacing.rank = 84.0;
                options.spacing.padding = 20.0;
                options.spacing.ring_padding = 80.0;
                options.overlap.padding = 28.0;
                options.routing.clearance = 16.0;
                options.crossing.max_iterations = 16;
                options.local_swap.enabled = true;
            }
            Preset::Landscape => {
                options.strategy = StrategyKind::Landscape;
                options.spacing.node = 48.0;
                options.spacing.max_row_width = 2000.0;
                options.routing.style = RoutingStyle::Spline;
            }
        }
        options
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sibling_gap_never_below_overlap_padding() {
        let mut options = LayoutOptions::default();
        options.spacing.node = 5.0;
        options.overlap.padding = 12.0;
        assert_eq!(options.sibling_gap(), 12.0);
    }

    #[test]
    fn test_kind_padding_override() {
        let mut options = LayoutOptions::default();
        options.spacing.kind_padding.insert(NodeKind::System, 30.0);
        assert_eq!(options.padding_for(NodeKind::System), 30.0);
        assert_eq!(options.padding_for(NodeKind::Container), options.spacing.padding);
    }

    #[test]
    fn test_presets_differ() {
        let compact = Preset::Compact.options();
        let publication = Preset::Publication.options();
        assert!(compact.spacing.node < publication.spacing.node);
        assert!(!compact.local_swap.enabled);
        assert!(publication.local_swap.enabled);
        assert_eq!(Preset::Landscape.options().strategy, StrategyKind::Landscape);
    }

    #[test]
    fn test_preset_from_str() {
        for preset in Preset::ALL {
            assert_eq!(preset.as_str().parse::<Preset>(), Ok(preset));
        }
        let err = "gigantic".parse::<Preset>().unwrap_err();
        assert_eq!(err, UnknownPreset("gigantic".to_string()));
        assert!(err.to_string().contains("gigantic"));
    }
}
