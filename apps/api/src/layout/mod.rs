// Page layout primitives: font measurement, line wrapping and grid placement.
// Everything here is pure and synchronous; drawing lives in `render`.

pub mod bidi;
pub mod font_metrics;
pub mod grid;
pub mod text_flow;
