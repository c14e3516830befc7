//! Colors and page geometry for the brochure templates.
//!
//! A `Theme` is built once at startup and shared read-only by every build.
//! All lengths are PDF points on an A4 page with the origin at the bottom-left.

use crate::layout::grid::{Direction, GridSpec, Point};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone)]
pub struct Palette {
    pub primary: Rgb,
    pub secondary: Rgb,
    pub accent: Rgb,
    pub sold: Rgb,
    pub available: Rgb,
    pub text: Rgb,
    pub light_gray: Rgb,
    pub dark_gray: Rgb,
    pub white: Rgb,
    pub border: Rgb,
    pub image_frame: Rgb,
    pub black: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: Rgb::new(0.102, 0.318, 0.545),
            secondary: Rgb::new(0.851, 0.373, 0.008),
            accent: Rgb::new(0.2, 0.6, 0.5),
            sold: Rgb::new(0.8, 0.2, 0.2),
            available: Rgb::new(0.2, 0.6, 0.3),
            text: Rgb::new(0.2, 0.2, 0.2),
            light_gray: Rgb::new(0.96, 0.96, 0.96),
            dark_gray: Rgb::new(0.3, 0.3, 0.3),
            white: Rgb::new(1.0, 1.0, 1.0),
            border: Rgb::new(0.85, 0.85, 0.85),
            image_frame: Rgb::new(0.9, 0.9, 0.9),
            black: Rgb::new(0.0, 0.0, 0.0),
        }
    }
}

/// Layout parameters for the three page templates.
#[derive(Debug, Clone)]
pub struct Theme {
    pub colors: Palette,
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub header_height: f32,
    /// Distance from the page top to the first content baseline.
    pub content_top_offset: f32,
    /// Content must stay above this y; below it lives the footer.
    pub content_min_y: f32,

    pub section_title_size: f32,
    pub section_title_gap: f32,

    pub cover_image_height: f32,
    pub cover_title_size: f32,
    pub cover_title_max_lines: usize,

    pub description_size: f32,
    pub description_line_height: f32,
    pub description_max_lines: usize,

    pub detail_cards_per_row: usize,
    pub detail_card_height: f32,
    pub detail_card_gap_x: f32,
    pub detail_card_gap_y: f32,

    pub features_per_row: usize,
    pub feature_height: f32,
    pub feature_gap_y: f32,
    pub feature_size: f32,

    pub contact_card_height: f32,

    pub gallery_per_row: usize,
    pub gallery_per_page: usize,
    pub gallery_cell_width: f32,
    pub gallery_cell_height: f32,
    pub gallery_gap_x: f32,
    pub gallery_gap_y: f32,

    pub logo_size: f32,
    pub max_logos: usize,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            colors: Palette::default(),
            page_width: 595.0,
            page_height: 842.0,
            margin: 50.0,
            header_height: 90.0,
            content_top_offset: 120.0,
            content_min_y: 100.0,

            section_title_size: 20.0,
            section_title_gap: 40.0,

            cover_image_height: 280.0,
            cover_title_size: 28.0,
            cover_title_max_lines: 2,

            description_size: 14.0,
            description_line_height: 1.6,
            description_max_lines: 7,

            detail_cards_per_row: 3,
            detail_card_height: 70.0,
            detail_card_gap_x: 10.0,
            detail_card_gap_y: 20.0,

            features_per_row: 2,
            feature_height: 30.0,
            feature_gap_y: 15.0,
            feature_size: 14.0,

            contact_card_height: 90.0,

            gallery_per_row: 2,
            gallery_per_page: 4,
            gallery_cell_width: 220.0,
            gallery_cell_height: 160.0,
            gallery_gap_x: 40.0,
            gallery_gap_y: 50.0,

            logo_size: 50.0,
            max_logos: 2,
        }
    }
}

impl Theme {
    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    pub fn content_top(&self) -> f32 {
        self.page_height - self.content_top_offset
    }

    /// Right edge used as the anchor for right-to-left text.
    pub fn right_edge(&self) -> f32 {
        self.page_width - self.margin
    }

    pub fn detail_card_grid(&self, top: f32) -> GridSpec {
        let pitch = self.content_width() / self.detail_cards_per_row.max(1) as f32;
        GridSpec {
            per_row: self.detail_cards_per_row,
            cell_width: pitch - self.detail_card_gap_x,
            cell_height: self.detail_card_height,
            spacing_x: self.detail_card_gap_x,
            spacing_y: self.detail_card_gap_y,
            origin: Point::new(self.margin, top),
            direction: Direction::LeftToRight,
        }
    }

    pub fn feature_grid(&self, top: f32) -> GridSpec {
        GridSpec {
            per_row: self.features_per_row,
            cell_width: self.content_width() / self.features_per_row.max(1) as f32,
            cell_height: self.feature_height,
            spacing_x: 0.0,
            spacing_y: self.feature_gap_y,
            origin: Point::new(self.right_edge(), top),
            direction: Direction::RightToLeft,
        }
    }

    pub fn gallery_grid(&self, top: f32) -> GridSpec {
        GridSpec {
            per_row: self.gallery_per_row,
            cell_width: self.gallery_cell_width,
            cell_height: self.gallery_cell_height,
            spacing_x: self.gallery_gap_x,
            spacing_y: self.gallery_gap_y,
            origin: Point::new(self.margin, top),
            direction: Direction::LeftToRight,
        }
    }
}
