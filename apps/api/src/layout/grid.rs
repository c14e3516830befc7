//! Grid Layout Engine: maps a linear item index to a row, a column and a box.
//!
//! The page coordinate system has y growing upwards, so row `r` sits
//! `r * (cell_height + spacing_y)` below the origin. The origin is the top-left corner
//! of cell 0 (top-right for [`Direction::RightToLeft`]).
//!
//! The engine is pure. Page breaks are the caller's job: when [`GridSpec::rows_fitting`]
//! says the remaining items do not fit, the caller starts a new page and builds a fresh
//! grid with a new origin for the rest.

use std::ops::Range;

// ────────────────────────────────────────────────────────────────────────────
// Geometry types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    /// Top edge.
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.y - self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Largest box with the given aspect ratio (width / height) that fits inside,
    /// centered in both directions.
    pub fn fit_aspect(&self, aspect: f32) -> BoundingBox {
        if aspect <= 0.0 || !aspect.is_finite() {
            return *self;
        }
        let (w, h) = if aspect > self.width / self.height {
            (self.width, self.width / aspect)
        } else {
            (self.height * aspect, self.height)
        };
        BoundingBox {
            x: self.x + (self.width - w) / 2.0,
            y: self.y - (self.height - h) / 2.0,
            width: w,
            height: h,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Column 0 on the left, columns grow rightwards.
    #[default]
    LeftToRight,
    /// Column 0 on the right, columns grow leftwards. `origin.x` is the right edge.
    RightToLeft,
}

// ────────────────────────────────────────────────────────────────────────────
// GridSpec
// ────────────────────────────────────────────────────────────────────────────

/// Placement of item `index`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub index: usize,
    pub row: usize,
    pub col: usize,
    pub bounds: BoundingBox,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub per_row: usize,
    pub cell_width: f32,
    pub cell_height: f32,
    pub spacing_x: f32,
    pub spacing_y: f32,
    pub origin: Point,
    pub direction: Direction,
}

impl GridSpec {
    /// Same grid, anchored somewhere else. Used when a grid continues on a new page.
    pub fn with_origin(self, origin: Point) -> Self {
        Self { origin, ..self }
    }

    fn per_row(&self) -> usize {
        self.per_row.max(1)
    }

    pub fn cell(&self, index: usize) -> GridCell {
        let per_row = self.per_row();
        let row = index / per_row;
        let col = index % per_row;

        let step_x = col as f32 * (self.cell_width + self.spacing_x);
        let x = match self.direction {
            Direction::LeftToRight => self.origin.x + step_x,
            Direction::RightToLeft => self.origin.x - step_x - self.cell_width,
        };
        let y = self.origin.y - row as f32 * (self.cell_height + self.spacing_y);

        GridCell {
            index,
            row,
            col,
            bounds: BoundingBox::new(x, y, self.cell_width, self.cell_height),
        }
    }

    pub fn cells(&self, count: usize) -> impl Iterator<Item = GridCell> + '_ {
        (0..count).map(move |i| self.cell(i))
    }

    pub fn rows_for(&self, count: usize) -> usize {
        count.div_ceil(self.per_row())
    }

    /// Vertical extent of `count` items, without trailing spacing.
    pub fn height_for(&self, count: usize) -> f32 {
        let rows = self.rows_for(count);
        if rows == 0 {
            return 0.0;
        }
        rows as f32 * self.cell_height + (rows - 1) as f32 * self.spacing_y
    }

    /// Number of whole rows whose bottom edge stays at or above `min_y`.
    pub fn rows_fitting(&self, min_y: f32) -> usize {
        let available = self.origin.y - min_y;
        if available < self.cell_height {
            return 0;
        }
        let pitch = self.cell_height + self.spacing_y;
        ((available - self.cell_height) / pitch).floor() as usize + 1
    }

    /// Number of items that fit above `min_y`.
    pub fn capacity(&self, min_y: f32) -> usize {
        self.rows_fitting(min_y) * self.per_row()
    }
}

/// Splits `count` items into consecutive ranges of at most `per_page`.
pub fn paginate(count: usize, per_page: usize) -> Vec<Range<usize>> {
    let per_page = per_page.max(1);
    (0..count)
        .step_by(per_page)
        .map(|start| start..(start + per_page).min(count))
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
