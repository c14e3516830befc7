//! printpdf-backed [`DrawingSurface`].
//!
//! Page coordinates are points with the origin bottom-left; printpdf wants millimetres,
//! so every coordinate goes through [`mm`]. The document handle is not `Send`: create
//! the surface, draw and [`PdfSurface::finish`] inside one blocking task.

use std::io::{BufWriter, Cursor};

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject,
    IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Point as PdfPoint, Polygon, Px, Rgb as PdfRgb,
};
use thiserror::Error;
use tracing::warn;

use crate::layout::bidi::visual_order;
use crate::layout::font_metrics::TextMeasure;
use crate::layout::grid::{BoundingBox, Point};
use crate::render::fonts::{FontResource, ShapedLine};
use crate::render::images::LoadedImage;
use crate::render::surface::{DrawingSurface, Stroke};
use crate::render::theme::{Rgb, Theme};

const PT_TO_MM: f32 = 0.352_777_78;
const LAYER_NAME: &str = "Layer 1";

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("PDF backend error: {0}")]
    Pdf(String),

    #[error("document has no pages")]
    Empty,

    #[error("build task failed: {0}")]
    Task(String),
}

fn mm(points: f32) -> Mm {
    Mm(points * PT_TO_MM)
}

fn pdf_color(color: Rgb) -> Color {
    Color::Rgb(PdfRgb::new(color.r, color.g, color.b, None))
}

fn corner(x: f32, y: f32) -> (PdfPoint, bool) {
    (PdfPoint::new(mm(x), mm(y)), false)
}

// ────────────────────────────────────────────────────────────────────────────
// Surface
// ────────────────────────────────────────────────────────────────────────────

pub struct PdfSurface {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    /// Measures with the font actually embedded, which may be the fallback.
    measure: FontResource,
    page_width: f32,
    page_height: f32,
    layer: PdfLayerReference,
    pages: usize,
}

impl PdfSurface {
    pub fn new(title: &str, theme: &Theme, font: &FontResource) -> Result<Self, BuildError> {
        let (doc, page, layer) = PdfDocument::new(
            title,
            mm(theme.page_width),
            mm(theme.page_height),
            LAYER_NAME,
        );

        let (font_ref, measure) = match font {
            FontResource::Embedded(shaping) => {
                match doc.add_external_font(Cursor::new(shaping.bytes().as_slice())) {
                    Ok(font_ref) => (font_ref, font.clone()),
                    Err(e) => {
                        warn!(error = %e, "Font embedding failed, using Helvetica");
                        (builtin_font(&doc)?, FontResource::Builtin)
                    }
                }
            }
            FontResource::Builtin => (builtin_font(&doc)?, FontResource::Builtin),
        };

        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            font: font_ref,
            measure,
            page_width: theme.page_width,
            page_height: theme.page_height,
            layer,
            pages: 0,
        })
    }

    /// Serializes the document. A surface that never began a page is an error.
    pub fn finish(self) -> Result<Vec<u8>, BuildError> {
        if self.pages == 0 {
            return Err(BuildError::Empty);
        }
        let mut buf = Vec::new();
        {
            let mut writer = BufWriter::new(Cursor::new(&mut buf));
            self.doc
                .save(&mut writer)
                .map_err(|e| BuildError::Pdf(e.to_string()))?;
        }
        Ok(buf)
    }
}

impl PdfSurface {
    /// Paints shaped glyphs one by one at their shaped positions.
    ///
    /// Contextual forms have no entry in the embedded font's width table, so glyphs
    /// are never left to advance on their own. `Td` is relative to the previous glyph
    /// origin, hence the deltas.
    fn draw_glyphs(&self, line: &ShapedLine, at: Point, size: f32) {
        if line.glyphs.is_empty() {
            return;
        }
        self.layer.begin_text_section();
        self.layer.set_font(&self.font, size);

        let mut pen_x = at.x;
        let (mut last_x, mut last_y) = (0.0, 0.0);
        for glyph in &line.glyphs {
            if glyph.glyph_id != 0 {
                let x = pen_x + glyph.x_offset;
                let y = at.y + glyph.y_offset;
                self.layer.set_text_cursor(mm(x - last_x), mm(y - last_y));
                self.layer.write_codepoints([glyph.glyph_id]);
                last_x = x;
                last_y = y;
            }
            pen_x += glyph.x_advance;
        }
        self.layer.end_text_section();
    }
}

fn builtin_font(doc: &PdfDocumentReference) -> Result<IndirectFontRef, BuildError> {
    doc.add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| BuildError::Pdf(e.to_string()))
}

impl TextMeasure for PdfSurface {
    fn measure(&self, text: &str, size: f32) -> f32 {
        self.measure.measure(text, size)
    }
}

impl DrawingSurface for PdfSurface {
    fn begin_page(&mut self) {
        // PdfDocument::new already created page 1.
        if self.pages > 0 {
            let (page, layer) = self
                .doc
                .add_page(mm(self.page_width), mm(self.page_height), LAYER_NAME);
            self.layer = self.doc.get_page(page).get_layer(layer);
        }
        self.pages += 1;
    }

    fn page_count(&self) -> usize {
        self.pages
    }

    fn draw_text(&mut self, text: &str, at: Point, size: f32, color: Rgb) {
        self.layer.set_fill_color(pdf_color(color));
        match &self.measure {
            FontResource::Embedded(shaping) => {
                let line = shaping.shape_line(text, size);
                self.draw_glyphs(&line, at, size);
            }
            FontResource::Builtin => {
                self.layer
                    .use_text(visual_order(text), size, mm(at.x), mm(at.y), &self.font);
            }
        }
    }

    fn draw_rect(&mut self, bounds: BoundingBox, fill: Option<Rgb>, stroke: Option<Stroke>) {
        let (left, bottom) = (bounds.x, bounds.bottom());
        let (right, top) = (bounds.right(), bounds.y);
        let points = vec![
            corner(left, bottom),
            corner(right, bottom),
            corner(right, top),
            corner(left, top),
        ];

        if let Some(stroke) = stroke {
            self.layer.set_outline_color(pdf_color(stroke.color));
            self.layer.set_outline_thickness(stroke.width);
        }

        match fill {
            Some(fill) => {
                self.layer.set_fill_color(pdf_color(fill));
                self.layer.add_polygon(Polygon {
                    rings: vec![points],
                    mode: if stroke.is_some() {
                        PaintMode::FillStroke
                    } else {
                        PaintMode::Fill
                    },
                    winding_order: WindingOrder::NonZero,
                });
            }
            None if stroke.is_some() => {
                self.layer.add_line(Line {
                    points,
                    is_closed: true,
                });
            }
            None => {}
        }
    }

    fn draw_line(&mut self, from: Point, to: Point, stroke: Stroke) {
        self.layer.set_outline_color(pdf_color(stroke.color));
        self.layer.set_outline_thickness(stroke.width);
        self.layer.add_line(Line {
            points: vec![corner(from.x, from.y), corner(to.x, to.y)],
            is_closed: false,
        });
    }

    fn draw_image(&mut self, image: &LoadedImage, bounds: BoundingBox) {
        if image.width == 0 || image.height == 0 {
            return;
        }
        let xobject = Image::from(ImageXObject {
            width: Px(image.width as usize),
            height: Px(image.height as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: image.pixels.clone(),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        });

        // At 72 dpi one pixel is one point, so the scale is target size over pixel size.
        xobject.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(mm(bounds.x)),
                translate_y: Some(mm(bounds.bottom())),
                scale_x: Some(bounds.width / image.width as f32),
                scale_y: Some(bounds.height / image.height as f32),
                dpi: Some(72.0),
                ..Default::default()
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font_metrics::helvetica;
    use crate::render::fonts::fixture_font;
    use crate::render::images::solid_image;

    fn surface() -> PdfSurface {
        PdfSurface::new("Test brochure", &Theme::default(), &FontResource::Builtin).unwrap()
    }

    #[test]
    fn test_finish_without_pages_is_error() {
        assert!(matches!(surface().finish(), Err(BuildError::Empty)));
    }

    #[test]
    fn test_output_is_pdf() {
        let theme = Theme::default();
        let mut pdf = surface();
        pdf.begin_page();
        pdf.draw_rect(
            BoundingBox::new(0.0, theme.page_height, theme.page_width, 90.0),
            Some(theme.colors.primary),
            None,
        );
        pdf.draw_text("Villa", Point::new(50.0, 700.0), 14.0, theme.colors.text);
        pdf.draw_line(
            Point::new(50.0, 600.0),
            Point::new(545.0, 600.0),
            Stroke {
                color: theme.colors.border,
                width: 1.0,
            },
        );
        pdf.draw_image(&solid_image(4, 3), BoundingBox::new(50.0, 500.0, 220.0, 160.0));

        let bytes = pdf.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_page_count_tracks_begin_page() {
        let mut pdf = surface();
        assert_eq!(pdf.page_count(), 0);
        pdf.begin_page();
        pdf.begin_page();
        pdf.begin_page();
        assert_eq!(pdf.page_count(), 3);
        let bytes = pdf.finish().unwrap();
        assert!(bytes.len() > 100);
    }

    #[test]
    fn test_builtin_surface_measures_with_helvetica() {
        let pdf = surface();
        assert_eq!(pdf.measure("Garden", 12.0), helvetica().measure("Garden", 12.0));
    }

    #[test]
    fn test_embedded_font_draws_shaped_arabic() {
        let font = fixture_font();
        let mut pdf = PdfSurface::new("فيلا", &Theme::default(), &font).unwrap();
        pdf.begin_page();
        let line = "فيلا فاخرة 5";
        pdf.draw_text(line, Point::new(100.0, 700.0), 16.0, Rgb::new(0.0, 0.0, 0.0));
        assert_eq!(pdf.measure(line, 16.0), font.measure(line, 16.0));

        let bytes = pdf.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_builtin_surface_accepts_arabic() {
        let mut pdf = surface();
        pdf.begin_page();
        pdf.draw_text("مباع 2024", Point::new(50.0, 50.0), 12.0, Rgb::new(1.0, 0.0, 0.0));
        assert!(pdf.finish().is_ok());
    }

    #[test]
    fn test_stroke_only_rect_does_not_panic() {
        let mut pdf = surface();
        pdf.begin_page();
        pdf.draw_rect(
            BoundingBox::new(10.0, 100.0, 50.0, 50.0),
            None,
            Some(Stroke {
                color: Rgb::new(0.0, 0.0, 0.0),
                width: 0.5,
            }),
        );
        assert!(pdf.finish().is_ok());
    }
}
