//! The drawing surface the assembler renders onto.
//!
//! The surface is also the measurement provider: whatever font it draws with is the
//! font the text-flow engine must measure with, so `DrawingSurface: TextMeasure`.

use crate::layout::font_metrics::TextMeasure;
use crate::layout::grid::{BoundingBox, Point};
use crate::render::images::LoadedImage;
use crate::render::theme::Rgb;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgb,
    pub width: f32,
}

/// Primitive page operations. Coordinates are PDF points, origin bottom-left;
/// text `at` is the left end of the baseline.
pub trait DrawingSurface: TextMeasure {
    /// Starts a new page; subsequent draws land on it.
    fn begin_page(&mut self);

    fn page_count(&self) -> usize;

    fn draw_text(&mut self, text: &str, at: Point, size: f32, color: Rgb);

    fn draw_rect(&mut self, bounds: BoundingBox, fill: Option<Rgb>, stroke: Option<Stroke>);

    fn draw_line(&mut self, from: Point, to: Point, stroke: Stroke);

    fn draw_image(&mut self, image: &LoadedImage, bounds: BoundingBox);
}

// ────────────────────────────────────────────────────────────────────────────
// Recording surface (tests)
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub use recording::{DrawCommand, RecordingSurface};

#[cfg(test)]
mod recording {
    use super::*;
    use crate::layout::font_metrics::helvetica;

    #[derive(Debug, Clone, PartialEq)]
    pub enum DrawCommand {
        Text {
            text: String,
            at: Point,
            size: f32,
            color: Rgb,
        },
        Rect {
            bounds: BoundingBox,
            fill: Option<Rgb>,
            stroke: Option<Stroke>,
        },
        Line {
            from: Point,
            to: Point,
        },
        Image {
            bounds: BoundingBox,
            pixel_width: u32,
        },
    }

    /// Captures every command per page and measures with the Helvetica table.
    #[derive(Debug, Default)]
    pub struct RecordingSurface {
        pub pages: Vec<Vec<DrawCommand>>,
    }

    impl RecordingSurface {
        fn push(&mut self, command: DrawCommand) {
            match self.pages.last_mut() {
                Some(page) => page.push(command),
                None => panic!("draw command issued before begin_page"),
            }
        }

        pub fn texts(&self, page: usize) -> Vec<&str> {
            self.pages[page]
                .iter()
                .filter_map(|c| match c {
                    DrawCommand::Text { text, .. } => Some(text.as_str()),
                    _ => None,
                })
                .collect()
        }

        pub fn images(&self, page: usize) -> Vec<BoundingBox> {
            self.pages[page]
                .iter()
                .filter_map(|c| match c {
                    DrawCommand::Image { bounds, .. } => Some(*bounds),
                    _ => None,
                })
                .collect()
        }

        pub fn has_text(&self, page: usize, needle: &str) -> bool {
            self.texts(page).iter().any(|t| t.contains(needle))
        }
    }

    impl TextMeasure for RecordingSurface {
        fn measure(&self, text: &str, size: f32) -> f32 {
            helvetica().measure(text, size)
        }
    }

    impl DrawingSurface for RecordingSurface {
        fn begin_page(&mut self) {
            self.pages.push(Vec::new());
        }

        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn draw_text(&mut self, text: &str, at: Point, size: f32, color: Rgb) {
            self.push(DrawCommand::Text {
                text: text.to_string(),
                at,
                size,
                color,
            });
        }

        fn draw_rect(&mut self, bounds: BoundingBox, fill: Option<Rgb>, stroke: Option<Stroke>) {
            self.push(DrawCommand::Rect {
                bounds,
                fill,
                stroke,
            });
        }

        fn draw_line(&mut self, from: Point, to: Point, _stroke: Stroke) {
            self.push(DrawCommand::Line { from, to });
        }

        fn draw_image(&mut self, image: &LoadedImage, bounds: BoundingBox) {
            self.push(DrawCommand::Image {
                bounds,
                pixel_width: image.width,
            });
        }
    }
}
