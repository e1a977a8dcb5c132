//! Left-to-right rows wrapped at a maximum width.

use c4_layout_core::{
    geometry::{Bounds, Point},
    view::Alignment,
};

use crate::strategy::{Placement, PlacementInput, PlacementItem, Strategy, align_offset};

pub struct Flow {
    gap: f32,
    max_row_width: f32,
    alignment: Alignment,
}

impl Flow {
    pub fn new() -> Self {
        Self {
            gap: 40.0,
            max_row_width: 1600.0,
            alignment: Alignment::Center,
        }
    }

    pub fn set_gap(&mut self, gap: f32) -> &mut Self {
        self.gap = gap;
        self
    }

    pub fn set_max_row_width(&mut self, width: f32) -> &mut Self {
        self.max_row_width = width;
        self
    }

    pub fn set_alignment(&mut self, alignment: Alignment) -> &mut Self {
        self.alignment = alignment;
        self
    }

    /// Lays out `items` in the given order.
    ///
    /// Returns rectangles indexed like `order`'s values, i.e. like `items`.
    pub(crate) fn wrap(&self, items: &[PlacementItem], order: &[usize]) -> Vec<Bounds> {
        let mut rows: Vec<Vec<usize>> = Vec::new();
        let mut current: Vec<usize> = Vec::new();
        let mut row_width = 0.0f32;
        for &i in order {
            let w = items[i].size.width();
            let needed = if current.is_empty() { w } else { row_width + self.gap + w };
            if !current.is_empty() && needed > self.max_row_width {
                rows.push(std::mem::take(&mut current));
                row_width = w;
            } else {
                row_width = needed;
            }
            current.push(i);
        }
        if !current.is_empty() {
            rows.push(current);
        }

        let mut rects = vec![Bounds::default(); items.len()];
        let mut y = 0.0f32;
        for row in rows {
            let height = row
                .iter()
                .map(|&i| items[i].size.height())
                .fold(0.0f32, f32::max);
            let mut x = 0.0f32;
            for i in row {
                let size = items[i].size;
                let dy = align_offset(self.alignment, height, size.height());
                rects[i] = Bounds::new_from_top_left(Point::new(x, y + dy), size);
                x += size.width() + self.gap;
            }
            y += height + self.gap;
        }
        rects
    }
}

impl Default for Flow {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for Flow {
    fn place(&self, input: &PlacementInput<'_>) -> Placement {
        let order: Vec<usize> = (0..input.items.len()).collect();
        Placement::from_bounds(&self.wrap(input.items, &order))
    }
}
