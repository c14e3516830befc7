//! Bidirectional ordering for single drawn lines.
//!
//! Text arrives in logical order. PDF text is painted left to right, so every line is
//! split into directional runs and the runs are put in visual order before shaping.

use std::ops::Range;

use unicode_bidi::BidiInfo;

/// A maximal same-direction slice of a line, in visual (left-to-right) position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualRun {
    /// Byte range into the logical line.
    pub range: Range<usize>,
    pub rtl: bool,
}

/// Directional runs of `line` ordered left to right as they will be painted.
///
/// The paragraph direction comes from the first strong character, so an Arabic line
/// with embedded digits keeps the digits in reading order inside the RTL flow.
pub fn visual_runs(line: &str) -> Vec<VisualRun> {
    if line.is_empty() {
        return Vec::new();
    }
    let info = BidiInfo::new(line, None);
    let mut runs = Vec::new();
    for para in &info.paragraphs {
        let (levels, level_runs) = info.visual_runs(para, para.range.clone());
        for range in level_runs {
            if range.is_empty() {
                continue;
            }
            runs.push(VisualRun {
                rtl: levels[range.start].is_rtl(),
                range,
            });
        }
    }
    runs
}

/// Characters of `line` reordered for left-to-right painting.
///
/// Used where no shaper is available (the builtin font); RTL runs come out reversed.
pub fn visual_order(line: &str) -> String {
    let info = BidiInfo::new(line, None);
    info.paragraphs
        .iter()
        .map(|para| info.reorder_line(para, para.range.clone()).into_owned())
        .collect()
}
