//! Grid strategies.

use c4_layout_core::{
    geometry::{Bounds, Point, Size},
    view::Alignment,
};

use crate::strategy::{Placement, PlacementInput, Strategy, align_offset};

const GOLDEN_RATIO: f32 = 1.618;

/// Uniform cells sized to the largest element, `ceil(sqrt(n * 1.618))` columns.
pub struct GoldenGrid {
    gap: f32,
    columns: Option<usize>,
    alignment: Alignment,
}

impl GoldenGrid {
    pub fn new() -> Self {
        Self {
            gap: 40.0,
            columns: None,
            alignment: Alignment::Center,
        }
    }

    pub fn set_gap(&mut self, gap: f32) -> &mut Self {
        self.gap = gap;
        self
    }

    /// Fixes the column count instead of deriving it.
    pub fn set_columns(&mut self, columns: Option<usize>) -> &mut Self {
        self.columns = columns;
        self
    }

    pub fn set_alignment(&mut self, alignment: Alignment) -> &mut Self {
        self.alignment = alignment;
        self
    }

    /// Column count used for `n` elements.
    pub fn column_count(&self, n: usize) -> usize {
        let derived = ((n as f32) * GOLDEN_RATIO).sqrt().ceil() as usize;
        self.columns.unwrap_or(derived).clamp(1, n.max(1))
    }
}

impl Default for GoldenGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for GoldenGrid {
    fn place(&self, input: &PlacementInput<'_>) -> Placement {
        let n = input.items.len();
        if n == 0 {
            return Placement::default();
        }
        let cell = input
            .items
            .iter()
            .fold(Size::default(), |acc, item| acc.max(item.size));
        let columns = self.column_count(n);

        let rects: Vec<Bounds> = input
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let (row, col) = (i / columns, i % columns);
                let origin = Point::new(
                    col as f32 * (cell.width() + self.gap),
                    row as f32 * (cell.height() + self.gap),
                );
                let offset = Point::new(
                    align_offset(self.alignment, cell.width(), item.size.width()),
                    align_offset(self.alignment, cell.height(), item.size.height()),
                );
                Bounds::new_from_top_left(origin.add_point(offset), item.size)
            })
            .collect();
        Placement::from_bounds(&rects)
    }
}

/// Square-ish grid with per-column widths and per-row heights.
pub struct CompactGrid {
    gap: f32,
    columns: Option<usize>,
    alignment: Alignment,
}

impl CompactGrid {
    pub fn new() -> Self {
        Self {
            gap: 40.0,
            columns: None,
            alignment: Alignment::Center,
        }
    }

    pub fn set_gap(&mut self, gap: f32) -> &mut Self {
        self.gap = gap;
        self
    }

    pub fn set_columns(&mut self, columns: Option<usize>) -> &mut Self {
        self.columns = columns;
        self
    }

    pub fn set_alignment(&mut self, alignment: Alignment) -> &mut Self {
        self.alignment = alignment;
        self
    }

    pub fn column_count(&self, n: usize) -> usize {
        let derived = (n as f32).sqrt().ceil() as usize;
        self.columns.unwrap_or(derived).clamp(1, n.max(1))
    }
}

impl Default for CompactGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for CompactGrid {
    fn place(&self, input: &PlacementInput<'_>) -> Placement {
        let n = input.items.len();
        if n == 0 {
            return Placement::default();
        }
        let columns = self.column_count(n);
        let rows = n.div_ceil(columns);

        let mut widths = vec![0.0f32; columns];
        let mut heights = vec![0.0f32; rows];
        for (i, item) in input.items.iter().enumerate() {
            let (row, col) = (i / columns, i % columns);
            widths[col] = widths[col].max(item.size.width());
            heights[row] = heights[row].max(item.size.height());
        }

        let col_x = offsets(&widths, self.gap);
        let row_y = offsets(&heights, self.gap);

        let rects: Vec<Bounds> = input
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let (row, col) = (i / columns, i % columns);
                let origin = Point::new(
                    col_x[col] + align_offset(self.alignment, widths[col], item.size.width()),
                    row_y[row] + align_offset(self.alignment, heights[row], item.size.height()),
                );
                Bounds::new_from_top_left(origin, item.size)
            })
            .collect();
        Placement::from_bounds(&rects)
    }
}

/// Running start offsets of consecutive slots separated by `gap`.
fn offsets(lengths: &[f32], gap: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(lengths.len());
    let mut cursor = 0.0;
    for &len in lengths {
        out.push(cursor);
        cursor += len + gap;
    }
    out
}
