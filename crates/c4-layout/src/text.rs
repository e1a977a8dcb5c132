//! Text measurement for element labels.
//!
//! Sizing never looks at fonts directly; it asks a [`TextMeasurer`] how much
//! room a piece of text needs. Two measurers ship with the crate:
//!
//! - [`ApproximateMeasurer`] - Font-free character-width estimate. Fully
//!   deterministic across machines and the default.
//! - [`CosmicTextMeasurer`] - Real shaping through `cosmic-text`, using the
//!   fonts installed on the system.

use std::{
    fmt,
    sync::{Arc, Mutex},
};

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping};
use log::info;

use c4_layout_core::{
    geometry::Size,
    model::{Level, NodeKind},
};

/// Wrapped text with the size of its bounding box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultilineText {
    pub size: Size,
    pub lines: Vec<String>,
}

/// Measures text for a given element kind and level.
///
/// Implementations pick the font for each `(kind, level)` pair. `max_width`
/// bounds the wrapped width in pixels; pass `f32::INFINITY` for no wrapping.
pub trait TextMeasurer: Send + Sync + fmt::Debug {
    fn measure_multiline(
        &self,
        text: &str,
        kind: NodeKind,
        level: Level,
        max_width: f32,
    ) -> MultilineText;

    fn measure(&self, text: &str, kind: NodeKind, level: Level, max_width: f32) -> Size {
        self.measure_multiline(text, kind, level, max_width).size
    }

    fn line_height(&self, kind: NodeKind, level: Level) -> f32;

    fn descent(&self, kind: NodeKind, level: Level) -> f32;
}

/// Font size in pixels for a label of the given kind and level.
///
/// Boundaries and systems get larger type than the things inside them.
pub fn font_size(kind: NodeKind, level: Level) -> f32 {
    if kind.is_system_like() || matches!(kind, NodeKind::Person | NodeKind::ExternalPerson) {
        return 16.0;
    }
    match level {
        Level::Landscape | Level::Context => 16.0,
        Level::Container | Level::Deployment => 14.0,
        Level::Component => 13.0,
    }
}

/// Deterministic measurer that assumes a fixed average glyph width.
///
/// # Examples
///
/// ```
/// # use c4_layout::text::{ApproximateMeasurer, TextMeasurer};
/// # use c4_layout_core::model::{Level, NodeKind};
/// let measurer = ApproximateMeasurer::default();
/// let text = measurer.measure_multiline(
///     "Handles orders and payments",
///     NodeKind::Container,
///     Level::Container,
///     100.0,
/// );
/// assert!(text.lines.len() > 1);
/// assert!(text.size.width() <= 100.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproximateMeasurer {
    /// Average glyph advance as a fraction of the font size.
    char_width: f32,
    /// Line height as a multiple of the font size.
    line_spacing: f32,
}

impl Default for ApproximateMeasurer {
    fn default() -> Self {
        Self {
            char_width: 0.6,
            line_spacing: 1.25,
        }
    }
}

impl ApproximateMeasurer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_char_width(&mut self, factor: f32) -> &mut Self {
        self.char_width = factor;
        self
    }

    pub fn set_line_spacing(&mut self, factor: f32) -> &mut Self {
        self.line_spacing = factor;
        self
    }

    fn advance(&self, kind: NodeKind, level: Level) -> f32 {
        font_size(kind, level) * self.char_width
    }
}

impl TextMeasurer for ApproximateMeasurer {
    fn measure_multiline(
        &self,
        text: &str,
        kind: NodeKind,
        level: Level,
        max_width: f32,
    ) -> MultilineText {
        if text.trim().is_empty() {
            return MultilineText::default();
        }
        let advance = self.advance(kind, level);
        let max_chars = if max_width.is_finite() {
            ((max_width / advance).floor() as usize).max(1)
        } else {
            usize::MAX
        };

        let lines: Vec<String> = text
            .lines()
            .flat_map(|paragraph| wrap_words(paragraph, max_chars))
            .collect();
        let widest = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        let size = Size::new(
            widest as f32 * advance,
            lines.len() as f32 * self.line_height(kind, level),
        );
        MultilineText { size, lines }
    }

    fn line_height(&self, kind: NodeKind, level: Level) -> f32 {
        font_size(kind, level) * self.line_spacing
    }

    fn descent(&self, kind: NodeKind, level: Level) -> f32 {
        font_size(kind, level) * 0.2
    }
}

/// Greedy word wrap counting characters. Words longer than a line are split.
fn wrap_words(paragraph: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in paragraph.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > max_chars {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = chars.split_off(max_chars);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }
        let word_len = chars.len();
        if word_len == 0 {
            continue;
        }
        let needed = if current_len == 0 {
            word_len
        } else {
            current_len + 1 + word_len
        };
        if needed > max_chars && current_len > 0 {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(chars);
        current_len += word_len;
    }
    if current_len > 0 {
        lines.push(current);
    }
    lines
}

/// Measurer backed by `cosmic-text` shaping with system fonts.
///
/// Results depend on the installed fonts, so layouts measured with it are
/// only reproducible on machines with the same font set.
pub struct CosmicTextMeasurer {
    font_system: Arc<Mutex<FontSystem>>,
    family: String,
    line_spacing: f32,
}

impl fmt::Debug for CosmicTextMeasurer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CosmicTextMeasurer")
            .field("family", &self.family)
            .field("line_spacing", &self.line_spacing)
            .finish_non_exhaustive()
    }
}

impl Default for CosmicTextMeasurer {
    fn default() -> Self {
        Self::new("sans-serif")
    }
}

impl CosmicTextMeasurer {
    /// Create a measurer with a freshly loaded FontSystem
    pub fn new(family: impl Into<String>) -> Self {
        info!("Initializing FontSystem");
        Self {
            font_system: Arc::new(Mutex::new(FontSystem::new())),
            family: family.into(),
            line_spacing: 1.15,
        }
    }
}

impl TextMeasurer for CosmicTextMeasurer {
    fn measure_multiline(
        &self,
        text: &str,
        kind: NodeKind,
        level: Level,
        max_width: f32,
    ) -> MultilineText {
        if text.trim().is_empty() {
            return MultilineText::default();
        }

        // A poisoned FontSystem is still usable for measuring.
        let mut font_system = self
            .font_system
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let font_size_px = font_size(kind, level);
        let metrics = Metrics::new(font_size_px, self.line_height(kind, level));

        let mut buffer = Buffer::new(&mut font_system, metrics);
        let mut buffer = buffer.borrow_with(&mut font_system);

        let attrs = Attrs::new().family(Family::Name(&self.family));
        let wrap_width = max_width.is_finite().then_some(max_width);
        buffer.set_size(wrap_width, None);
        buffer.set_text(text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(true);

        let mut width: f32 = 0.0;
        let mut lines = Vec::new();
        for run in buffer.layout_runs() {
            if let (Some(first), Some(last)) = (run.glyphs.first(), run.glyphs.last()) {
                width = width.max(last.x + last.w);
                lines.push(run.text[first.start..last.end].trim_end().to_string());
            } else {
                lines.push(String::new());
            }
        }
        if lines.is_empty() {
            // No shaped runs: fall back to a glyph-width estimate.
            width = text.chars().count() as f32 * font_size_px * 0.55;
            lines.push(text.to_string());
        }

        let size = Size::new(width, lines.len() as f32 * metrics.line_height);
        MultilineText { size, lines }
    }

    fn line_height(&self, kind: NodeKind, level: Level) -> f32 {
        font_size(kind, level) * self.line_spacing
    }

    fn descent(&self, kind: NodeKind, level: Level) -> f32 {
        font_size(kind, level) * 0.22
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_wrap_words_greedy() {
        assert_eq!(wrap_words("aa bb cc", 5), vec!["aa bb", "cc"]);
        assert_eq!(wrap_words("aa bb cc", 100), vec!["aa bb cc"]);
        assert_eq!(wrap_words("   ", 5), Vec::<String>::new());
    }

    #[test]
    fn test_wrap_words_splits_long_words() {
        assert_eq!(wrap_words("abcdefgh ij", 3), vec!["abc", "def", "gh", "ij"]);
    }

    #[test]
    fn test_approximate_measure_single_line() {
        let m = ApproximateMeasurer::default();
        let size = m.measure("Shop", NodeKind::Container, Level::Container, f32::INFINITY);
        assert_approx_eq!(f32, size.width(), 4.0 * 14.0 * 0.6);
        assert_approx_eq!(f32, size.height(), 14.0 * 1.25);
    }

    #[test]
    fn test_approximate_respects_explicit_newlines() {
        let m = ApproximateMeasurer::default();
        let text = m.measure_multiline("one\ntwo", NodeKind::Component, Level::Component, 500.0);
        assert_eq!(text.lines, vec!["one", "two"]);
        assert_approx_eq!(f32, text.size.height(), 2.0 * m.line_height(NodeKind::Component, Level::Component));
    }

    #[test]
    fn test_approximate_empty_text_has_no_size() {
        let m = ApproximateMeasurer::default();
        let text = m.measure_multiline("", NodeKind::Person, Level::Context, 100.0);
        assert!(text.lines.is_empty());
        assert!(text.size.is_zero());
    }

    #[test]
    fn test_approximate_is_deterministic() {
        let m = ApproximateMeasurer::default();
        let a = m.measure_multiline("Payment Gateway Adapter", NodeKind::System, Level::Context, 90.0);
        let b = m.measure_multiline("Payment Gateway Adapter", NodeKind::System, Level::Context, 90.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_font_size_by_kind_and_level() {
        assert_eq!(font_size(NodeKind::System, Level::Context), 16.0);
        assert_eq!(font_size(NodeKind::Container, Level::Container), 14.0);
        assert_eq!(font_size(NodeKind::Component, Level::Component), 13.0);
    }
}
