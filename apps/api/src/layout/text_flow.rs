//! Text Flow Engine: greedy word-wrap against a measured width budget.
//!
//! # Rules
//! - Explicit line breaks split the input into paragraphs before wrapping.
//! - Words are packed greedily: the candidate `line + " " + word` is measured and the
//!   line is closed only when the candidate overflows and the line already has a word.
//! - A word wider than the budget sits alone on its own line; words are never split.
//! - Lines come out in logical order. Right-to-left callers anchor the right edge and
//!   draw each line at `x - line.width`.
//!
//! The engine has no failure modes: empty or whitespace-only input yields no lines.

use serde::Serialize;

use crate::layout::font_metrics::TextMeasure;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// One wrapped line, with its width measured at the size it was wrapped for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutLine {
    pub text: String,
    pub width: f32,
}

/// Wrapping parameters for one block of text.
///
/// `max_lines` enables truncation: surplus lines are dropped and the last kept line
/// ends with `marker`.
pub struct TextFlow<'a, M: TextMeasure + ?Sized> {
    pub measure: &'a M,
    pub size: f32,
    pub max_width: f32,
    pub max_lines: Option<usize>,
    pub marker: &'a str,
}

impl<'a, M: TextMeasure + ?Sized> TextFlow<'a, M> {
    pub fn new(measure: &'a M, size: f32, max_width: f32) -> Self {
        Self {
            measure,
            size,
            max_width,
            max_lines: None,
            marker: "",
        }
    }

    pub fn truncated(mut self, max_lines: usize, marker: &'a str) -> Self {
        self.max_lines = Some(max_lines);
        self.marker = marker;
        self
    }

    /// Wraps `text` and applies truncation if configured.
    pub fn layout(&self, text: &str) -> Vec<LayoutLine> {
        let lines = wrap_text(text, self.max_width, self.size, self.measure);
        match self.max_lines {
            Some(max) => {
                truncate_lines(lines, max, self.marker, self.max_width, self.size, self.measure)
            }
            None => lines,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wrapping
// ────────────────────────────────────────────────────────────────────────────

/// Wraps multi-paragraph text. Each `\n` / `\r\n` separated paragraph wraps on its own.
pub fn wrap_text<M: TextMeasure + ?Sized>(
    text: &str,
    max_width: f32,
    size: f32,
    measure: &M,
) -> Vec<LayoutLine> {
    text.lines()
        .flat_map(|paragraph| wrap_paragraph(paragraph, max_width, size, measure))
        .collect()
}

/// Greedy word-wrap of a single paragraph.
pub fn wrap_paragraph<M: TextMeasure + ?Sized>(
    paragraph: &str,
    max_width: f32,
    size: f32,
    measure: &M,
) -> Vec<LayoutLine> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0_f32;

    for word in paragraph.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            current_width = measure.measure(&current, size);
            continue;
        }

        let candidate = format!("{current} {word}");
        let candidate_width = measure.measure(&candidate, size);

        if candidate_width > max_width {
            lines.push(LayoutLine {
                text: std::mem::take(&mut current),
                width: current_width,
            });
            current.push_str(word);
            current_width = measure.measure(&current, size);
        } else {
            current = candidate;
            current_width = candidate_width;
        }
    }

    if !current.is_empty() {
        lines.push(LayoutLine {
            text: current,
            width: current_width,
        });
    }
    lines
}

// ────────────────────────────────────────────────────────────────────────────
// Truncation
// ────────────────────────────────────────────────────────────────────────────

/// Cuts `lines` to `max_lines` when it is longer, and ends the last kept line with `marker`.
///
/// The last line loses characters from its end until `line + marker` fits `max_width`.
/// If nothing of the line fits, the marker stands alone.
pub fn truncate_lines<M: TextMeasure + ?Sized>(
    mut lines: Vec<LayoutLine>,
    max_lines: usize,
    marker: &str,
    max_width: f32,
    size: f32,
    measure: &M,
) -> Vec<LayoutLine> {
    if lines.len() <= max_lines {
        return lines;
    }
    lines.truncate(max_lines);

    if let Some(last) = lines.last_mut() {
        let mut text = std::mem::take(&mut last.text);
        loop {
            let candidate = format!("{text}{marker}");
            let width = measure.measure(&candidate, size);
            if width <= max_width || text.is_empty() {
                *last = LayoutLine {
                    text: candidate,
                    width,
                };
                break;
            }
            text.pop();
        }
    }
    lines
}

/// Fits `text` on a single line, clipping with `marker` when it overflows.
pub fn fit_single_line<M: TextMeasure + ?Sized>(
    text: &str,
    max_width: f32,
    size: f32,
    marker: &str,
    measure: &M,
) -> Option<LayoutLine> {
    let flattened = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let lines = wrap_paragraph(&flattened, max_width, size, measure);
    truncate_lines(lines, 1, marker, max_width, size, measure)
        .into_iter()
        .next()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
