//! Brochure rendering: fetch images, assemble pages, serialize to PDF.
//!
//! # Architecture
//! - `render_brochure` is the async entry point used by every route that produces a PDF.
//! - Image fetches run concurrently on the async runtime (`images::BrochureImages::fetch`).
//! - Assembly and serialization are CPU-bound and run in `tokio::task::spawn_blocking`.
//!   The printpdf document is not `Send`, so it is created and dropped inside the closure.

pub mod assembler;
pub mod fonts;
pub mod handlers;
pub mod images;
pub mod labels;
pub mod pdf;
pub mod surface;
pub mod theme;

use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::property::PropertyRecord;
use crate::render::assembler::{BrochureAssembler, BuildReport, FooterStamp};
use crate::render::fonts::FontResource;
use crate::render::images::{BrochureImages, ImageProvider};
use crate::render::pdf::{BuildError, PdfSurface};
use crate::render::theme::Theme;

const FILENAME_PREFIX: &str = "تقرير";

/// A finished brochure.
#[derive(Debug)]
pub struct RenderedBrochure {
    pub bytes: Vec<u8>,
    pub report: BuildReport,
    pub filename: AttachmentName,
}

/// Download name for a brochure, in UTF-8 and as an ASCII fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentName {
    pub utf8: String,
    pub ascii: String,
}

impl AttachmentName {
    /// `تقرير-<title with whitespace runs as '-'>-<millis>.pdf`
    pub fn for_title(title: &str, millis: i64) -> Self {
        let slug = title.split_whitespace().collect::<Vec<_>>().join("-");
        let utf8 = if slug.is_empty() {
            format!("{FILENAME_PREFIX}-{millis}.pdf")
        } else {
            format!("{FILENAME_PREFIX}-{slug}-{millis}.pdf")
        };
        Self {
            utf8,
            ascii: format!("brochure-{millis}.pdf"),
        }
    }

    /// `Content-Disposition` value with an RFC 5987 `filename*` parameter.
    pub fn content_disposition(&self) -> String {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            self.ascii,
            urlencoding::encode(&self.utf8)
        )
    }
}

/// Everything one build needs from the application besides the record.
#[derive(Clone, Copy)]
pub struct RenderDeps<'a> {
    pub theme: &'a Theme,
    pub font: &'a FontResource,
    pub images: &'a dyn ImageProvider,
}

/// Renders a validated record into PDF bytes.
pub async fn render_brochure(
    deps: RenderDeps<'_>,
    property: PropertyRecord,
) -> Result<RenderedBrochure, AppError> {
    let build_id = Uuid::new_v4();
    let started = Instant::now();
    info!(
        %build_id,
        title = %property.title,
        images = property.images.len(),
        features = property.features.len(),
        "Building brochure"
    );

    let images = BrochureImages::fetch(deps.images, &property).await;
    let failed = images.failed_count();
    if failed > 0 {
        warn!(%build_id, failed, "Some images could not be loaded");
    }

    let filename = AttachmentName::for_title(&property.title, Utc::now().timestamp_millis());
    let theme = deps.theme.clone();
    let font = deps.font.clone();
    let stamp = FooterStamp::now();

    let (bytes, report) = tokio::task::spawn_blocking(move || {
        build_pdf(&theme, &font, &property, &images, &stamp)
    })
    .await
    .map_err(|e| BuildError::Task(e.to_string()))??;

    info!(
        %build_id,
        pages = report.pages,
        gallery_pages = report.gallery_pages,
        blank_cells = report.gallery_cells_blank,
        bytes = bytes.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Brochure built"
    );

    Ok(RenderedBrochure {
        bytes,
        report,
        filename,
    })
}

/// Synchronous build: assemble every page onto a fresh PDF surface and serialize it.
pub fn build_pdf(
    theme: &Theme,
    font: &FontResource,
    property: &PropertyRecord,
    images: &BrochureImages,
    stamp: &FooterStamp,
) -> Result<(Vec<u8>, BuildReport), BuildError> {
    let mut surface = PdfSurface::new(&property.title, theme, font)?;
    let report = BrochureAssembler::new(theme).assemble(&mut surface, property, images, stamp);
    let bytes = surface.finish()?;
    Ok((bytes, report))
}
