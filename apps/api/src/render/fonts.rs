//! Font resource: the preferred TrueType font, or built-in Helvetica when it is missing.
//!
//! The resource is loaded once at startup. Measurement and embedding must agree: the
//! PDF surface draws with whichever font this resource carries, and measures with it too.
//! With an embedded font every line is shaped (Arabic joining, RTL glyph order) and the
//! shaped advances are the measured width.

use std::path::Path;
use std::sync::Arc;

use rustybuzz::{Direction, Face, UnicodeBuffer};
use thiserror::Error;
use tracing::{info, warn};

use crate::layout::bidi::visual_runs;
use crate::layout::font_metrics::{helvetica, TextMeasure};

#[derive(Debug, Error)]
pub enum FontError {
    #[error("cannot read font file: {0}")]
    Io(#[from] std::io::Error),

    #[error("font data is not a valid TrueType font")]
    Invalid,
}

// ────────────────────────────────────────────────────────────────────────────
// Shaping
// ────────────────────────────────────────────────────────────────────────────

/// One positioned glyph. Distances are points at the requested size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapedGlyph {
    pub glyph_id: u16,
    /// Byte offset of the source cluster in the logical line.
    pub cluster: usize,
    pub x_advance: f32,
    pub x_offset: f32,
    pub y_offset: f32,
}

/// A line shaped in visual order, ready to be painted left to right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapedLine {
    pub glyphs: Vec<ShapedGlyph>,
    pub width: f32,
}

/// A parsed TrueType font able to shape text.
///
/// `rustybuzz::Face` borrows its bytes, so the face is re-parsed from the shared
/// buffer per call; parsing only reads the table directory.
#[derive(Clone)]
pub struct ShapingFont {
    bytes: Arc<Vec<u8>>,
    units_per_em: f32,
}

impl ShapingFont {
    pub fn parse(bytes: Arc<Vec<u8>>) -> Result<Self, FontError> {
        let face = Face::from_slice(&bytes, 0).ok_or(FontError::Invalid)?;
        if face.number_of_glyphs() == 0 {
            return Err(FontError::Invalid);
        }
        let units_per_em = face.units_per_em().max(1) as f32;
        Ok(Self {
            bytes,
            units_per_em,
        })
    }

    pub fn bytes(&self) -> &Arc<Vec<u8>> {
        &self.bytes
    }

    /// Reorders `line` into visual runs and shapes each with its own direction.
    pub fn shape_line(&self, line: &str, size: f32) -> ShapedLine {
        let Some(face) = Face::from_slice(&self.bytes, 0) else {
            return ShapedLine::default();
        };
        let scale = size / self.units_per_em;
        let mut shaped = ShapedLine::default();

        for run in visual_runs(line) {
            let mut buffer = UnicodeBuffer::new();
            buffer.push_str(&line[run.range.clone()]);
            buffer.set_direction(if run.rtl {
                Direction::RightToLeft
            } else {
                Direction::LeftToRight
            });
            buffer.guess_segment_properties();

            let output = rustybuzz::shape(&face, &[], buffer);
            for (info, pos) in output.glyph_infos().iter().zip(output.glyph_positions()) {
                let glyph = ShapedGlyph {
                    glyph_id: info.glyph_id as u16,
                    cluster: run.range.start + info.cluster as usize,
                    x_advance: pos.x_advance as f32 * scale,
                    x_offset: pos.x_offset as f32 * scale,
                    y_offset: pos.y_offset as f32 * scale,
                };
                shaped.width += glyph.x_advance;
                shaped.glyphs.push(glyph);
            }
        }
        shaped
    }
}

impl TextMeasure for ShapingFont {
    fn measure(&self, text: &str, size: f32) -> f32 {
        self.shape_line(text, size).width
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font resource
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub enum FontResource {
    /// TTF to embed; shaped and measured from the same bytes.
    Embedded(ShapingFont),
    /// The PDF base-14 Helvetica, measured with the AFM table.
    Builtin,
}

impl FontResource {
    /// Loads `path`, falling back to Helvetica if the file is missing or unparseable.
    pub fn load(path: &Path) -> Self {
        match std::fs::read(path)
            .map_err(FontError::from)
            .and_then(Self::from_bytes)
        {
            Ok(font) => {
                info!(path = %path.display(), "Loaded brochure font");
                font
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Preferred font unavailable, using Helvetica");
                Self::Builtin
            }
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, FontError> {
        Ok(Self::Embedded(ShapingFont::parse(Arc::new(bytes))?))
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, Self::Embedded(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Embedded(_) => "embedded",
            Self::Builtin => helvetica().name,
        }
    }
}

impl TextMeasure for FontResource {
    fn measure(&self, text: &str, size: f32) -> f32 {
        match self {
            Self::Embedded(font) => font.measure(text, size),
            Self::Builtin => helvetica().measure(text, size),
        }
    }
}

#[cfg(test)]
pub fn fixture_font() -> FontResource {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/fonts/DejaVuSans.ttf");
    FontResource::from_bytes(std::fs::read(path).unwrap()).unwrap()
}
