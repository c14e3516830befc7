//! Document Assembler: drives one brochure through its page templates.
//!
//! # Stages
//! `Cover → Details → Gallery → Done`, strictly in that order. `Details` goes straight
//! to `Done` when the record has at most one image.
//!
//! Every page gets the header band and the footer (file number, date, status badge).
//! Body content stays above `Theme::content_min_y`; when a details section would cross
//! it, the section continues on a fresh details page.
//!
//! The assembler performs no I/O. Images arrive already fetched in [`BrochureImages`],
//! and a `None` slot leaves its cell blank.

use chrono::Local;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::layout::grid::{paginate, BoundingBox, Point};
use crate::layout::text_flow::{fit_single_line, TextFlow};
use crate::models::property::{PropertyRecord, PropertyStatus};
use crate::render::images::{BrochureImages, LoadedImage};
use crate::render::labels::{self, DetailCard};
use crate::render::surface::{DrawingSurface, Stroke};
use crate::render::theme::{Rgb, Theme};

const HEADER_INSET: f32 = 20.0;
const HEADER_TITLE_SIZE: f32 = 21.0;
const HEADER_TEXT_SIZE: f32 = 12.0;
const HEADER_NAME_SIZE: f32 = 16.0;
const LOGO_GAP: f32 = 10.0;

const FOOTER_BASELINE: f32 = 30.0;
const FOOTER_TEXT_SIZE: f32 = 10.0;
const BADGE_BOTTOM: f32 = 50.0;
const BADGE_HEIGHT: f32 = 30.0;
const BADGE_PADDING: f32 = 30.0;
const BADGE_TEXT_SIZE: f32 = 14.0;

const COVER_IMAGE_GAP: f32 = 60.0;
const COVER_FRAME: f32 = 5.0;
const TITLE_LINE_HEIGHT: f32 = 1.2;
const TITLE_GAP: f32 = 50.0;
const PRICE_SIZE: f32 = 22.0;
const PRICE_GAP: f32 = 40.0;
const LOCATION_SIZE: f32 = 16.0;
const LOCATION_GAP: f32 = 50.0;
const CARD_LABEL_SIZE: f32 = 12.0;
const CARD_VALUE_SIZE: f32 = 16.0;

const SECTION_GAP: f32 = 30.0;
const FEATURES_TRAILING_GAP: f32 = 40.0;
const CONTACT_VALUE_SIZE: f32 = 16.0;
const CONTACT_ROLE_SIZE: f32 = 14.0;

const GALLERY_GRID_OFFSET: f32 = 30.0;
const GALLERY_LABEL_SIZE: f32 = 12.0;

// ────────────────────────────────────────────────────────────────────────────
// Public types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Cover,
    Details,
    Gallery,
    Done,
}

impl Stage {
    pub fn next(self, has_gallery: bool) -> Self {
        match self {
            Stage::Cover => Stage::Details,
            Stage::Details if has_gallery => Stage::Gallery,
            Stage::Details | Stage::Gallery | Stage::Done => Stage::Done,
        }
    }
}

/// Decoration printed in every footer.
#[derive(Debug, Clone, PartialEq)]
pub struct FooterStamp {
    pub file_number: u32,
    pub date: String,
}

impl FooterStamp {
    pub fn now() -> Self {
        Self {
            file_number: (Uuid::new_v4().as_u128() % 10_000) as u32,
            date: Local::now().format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildReport {
    pub pages: usize,
    pub gallery_pages: usize,
    pub gallery_cells_populated: usize,
    pub gallery_cells_blank: usize,
}

/// Everything a page template reads besides the theme.
struct PageContext<'r> {
    property: &'r PropertyRecord,
    images: &'r BrochureImages,
    stamp: &'r FooterStamp,
}

// ────────────────────────────────────────────────────────────────────────────
// Assembler
// ────────────────────────────────────────────────────────────────────────────

pub struct BrochureAssembler<'t> {
    theme: &'t Theme,
}

impl<'t> BrochureAssembler<'t> {
    pub fn new(theme: &'t Theme) -> Self {
        Self { theme }
    }

    pub fn assemble<S: DrawingSurface>(
        &self,
        surface: &mut S,
        property: &PropertyRecord,
        images: &BrochureImages,
        stamp: &FooterStamp,
    ) -> BuildReport {
        let ctx = PageContext {
            property,
            images,
            stamp,
        };
        let has_gallery = property.has_gallery();
        let mut report = BuildReport::default();
        let mut stage = Stage::Cover;

        while stage != Stage::Done {
            debug!(?stage, "Assembling stage");
            match stage {
                Stage::Cover => self.cover_page(surface, &ctx),
                Stage::Details => self.details_pages(surface, &ctx),
                Stage::Gallery => self.gallery_pages(surface, &ctx, &mut report),
                Stage::Done => {}
            }
            stage = stage.next(has_gallery);
        }

        report.pages = surface.page_count();
        report
    }

    // ── page chrome ─────────────────────────────────────────────────────────

    /// Starts a page with header and footer; returns the first content baseline.
    fn open_page<S: DrawingSurface>(
        &self,
        surface: &mut S,
        ctx: &PageContext,
        title: &str,
        with_logos: bool,
    ) -> f32 {
        surface.begin_page();
        let logo_width = if with_logos { self.logos_width(ctx) } else { 0.0 };
        self.header(surface, ctx, title, logo_width);
        if with_logos {
            self.logos(surface, ctx);
        }
        self.footer(surface, ctx);
        self.theme.content_top()
    }

    fn logo_slots<'r>(&self, ctx: &PageContext<'r>) -> impl Iterator<Item = &'r LoadedImage> {
        ctx.images.logos.iter().take(self.theme.max_logos).flatten()
    }

    fn logos_width(&self, ctx: &PageContext) -> f32 {
        self.logo_slots(ctx).count() as f32 * (self.theme.logo_size + LOGO_GAP)
    }

    /// Company logos sit at the left end of the header band.
    fn logos<S: DrawingSurface>(&self, surface: &mut S, ctx: &PageContext) {
        let t = self.theme;
        let slot = t.logo_size;
        let top = t.page_height - (t.header_height - slot) / 2.0;
        for (i, logo) in self.logo_slots(ctx).enumerate() {
            let x = HEADER_INSET + i as f32 * (slot + LOGO_GAP);
            let cell = BoundingBox::new(x, top, slot, slot);
            surface.draw_image(logo, cell.fit_aspect(logo.aspect()));
        }
    }

    /// Band, page title on the right, contact block on the left (after any logos),
    /// marketer centered.
    fn header<S: DrawingSurface>(
        &self,
        surface: &mut S,
        ctx: &PageContext,
        title: &str,
        left_offset: f32,
    ) {
        let t = self.theme;
        let c = &t.colors;
        let top = t.page_height;
        surface.draw_rect(
            BoundingBox::new(0.0, top, t.page_width, t.header_height),
            Some(c.primary),
            None,
        );

        draw_right(
            surface,
            title,
            t.page_width - HEADER_INSET,
            top - 50.0,
            HEADER_TITLE_SIZE,
            c.white,
        );

        let contact_x = left_offset + HEADER_INSET;
        surface.draw_text(
            labels::CONTACT_LABEL,
            Point::new(contact_x + 40.0, top - 40.0),
            HEADER_TEXT_SIZE,
            c.white,
        );
        if !ctx.property.contact_info.trim().is_empty() {
            surface.draw_text(
                &ctx.property.contact_info,
                Point::new(contact_x + 10.0, top - 60.0),
                HEADER_TEXT_SIZE,
                c.white,
            );
        }

        let marketer = &ctx.property.marketer;
        let center = t.page_width / 2.0;
        if !marketer.name.trim().is_empty() {
            draw_centered(surface, &marketer.name, center, top - 40.0, HEADER_NAME_SIZE, c.white);
        }
        if !marketer.role.trim().is_empty() {
            draw_centered(surface, &marketer.role, center, top - 60.0, HEADER_TEXT_SIZE, c.white);
        }
    }

    fn footer<S: DrawingSurface>(&self, surface: &mut S, ctx: &PageContext) {
        let t = self.theme;
        let c = &t.colors;

        surface.draw_text(
            &labels::file_number_label(ctx.stamp.file_number),
            Point::new(HEADER_INSET, FOOTER_BASELINE),
            FOOTER_TEXT_SIZE,
            c.dark_gray,
        );
        draw_right(
            surface,
            &labels::generated_on_label(&ctx.stamp.date),
            t.page_width - HEADER_INSET,
            FOOTER_BASELINE,
            FOOTER_TEXT_SIZE,
            c.dark_gray,
        );

        let status = ctx.property.status;
        let label = labels::status_label(status);
        let fill = match status {
            PropertyStatus::Available => c.available,
            PropertyStatus::Sold => c.sold,
        };
        let width = surface.measure(label, BADGE_TEXT_SIZE) + BADGE_PADDING;
        let badge = BoundingBox::new(
            (t.page_width - width) / 2.0,
            BADGE_BOTTOM + BADGE_HEIGHT,
            width,
            BADGE_HEIGHT,
        );
        surface.draw_rect(
            badge,
            Some(fill),
            Some(Stroke {
                color: c.black,
                width: 1.0,
            }),
        );
        draw_centered(
            surface,
            label,
            badge.center_x(),
            BADGE_BOTTOM + 7.0,
            BADGE_TEXT_SIZE,
            c.white,
        );
    }

    fn section_heading<S: DrawingSurface>(&self, surface: &mut S, text: &str, y: f32) {
        let t = self.theme;
        draw_right(
            surface,
            text,
            t.right_edge(),
            y,
            t.section_title_size,
            t.colors.primary,
        );
    }

    // ── cover ───────────────────────────────────────────────────────────────

    fn cover_page<S: DrawingSurface>(&self, surface: &mut S, ctx: &PageContext) {
        let t = self.theme;
        let c = &t.colors;
        let property = ctx.property;
        let width = t.content_width();
        let center = t.page_width / 2.0;
        let mut y = self.open_page(surface, ctx, labels::COVER_TITLE, true);

        let title_lines = TextFlow::new(&*surface, t.cover_title_size, width)
            .truncated(t.cover_title_max_lines, labels::CLIP_MARKER)
            .layout(&property.title);
        let title_line_height = t.cover_title_size * TITLE_LINE_HEIGHT;
        let extra_title = title_lines.len().saturating_sub(1) as f32 * title_line_height;

        let cards = labels::detail_cards(property);
        let cards_grid = t.detail_card_grid(0.0);

        if let Some(image) = &ctx.images.cover {
            // The image shrinks below its nominal height when the text and cards need the room.
            let below_image = COVER_IMAGE_GAP
                + TITLE_GAP
                + extra_title
                + PRICE_GAP
                + LOCATION_GAP
                + cards_grid.height_for(cards.len());
            let room = y - below_image - t.content_min_y;
            let mut height = t.cover_image_height.min(room);
            if height > 0.0 {
                let aspect = image.aspect();
                let mut image_width = height * aspect;
                if image_width > width {
                    image_width = width;
                    height = image_width / aspect;
                }
                let x = (t.page_width - image_width) / 2.0;
                surface.draw_rect(
                    BoundingBox::new(
                        x - COVER_FRAME,
                        y + COVER_FRAME,
                        image_width + 2.0 * COVER_FRAME,
                        height + 2.0 * COVER_FRAME,
                    ),
                    Some(c.image_frame),
                    None,
                );
                surface.draw_image(image, BoundingBox::new(x, y, image_width, height));
                y -= height + COVER_IMAGE_GAP;
            }
        }

        for (i, line) in title_lines.iter().enumerate() {
            surface.draw_text(
                &line.text,
                Point::new(center - line.width / 2.0, y - i as f32 * title_line_height),
                t.cover_title_size,
                c.primary,
            );
        }
        y -= TITLE_GAP + extra_title;

        draw_centered(
            surface,
            &labels::price_text(property),
            center,
            y,
            PRICE_SIZE,
            c.secondary,
        );
        y -= PRICE_GAP;

        if let Some(line) = fit_single_line(
            &labels::location_text(property),
            width,
            LOCATION_SIZE,
            labels::CLIP_MARKER,
            &*surface,
        ) {
            surface.draw_text(
                &line.text,
                Point::new(center - line.width / 2.0, y),
                LOCATION_SIZE,
                c.dark_gray,
            );
        }
        y -= LOCATION_GAP;

        let grid = cards_grid.with_origin(Point::new(t.margin, y));
        for (cell, card) in grid.cells(cards.len()).zip(&cards) {
            self.detail_card(surface, card, cell.bounds);
        }
    }

    fn detail_card<S: DrawingSurface>(&self, surface: &mut S, card: &DetailCard, bounds: BoundingBox) {
        let c = &self.theme.colors;
        surface.draw_rect(
            bounds,
            Some(c.light_gray),
            Some(Stroke {
                color: c.border,
                width: 1.0,
            }),
        );
        let center = bounds.center_x();
        draw_centered(surface, card.label, center, bounds.y - 25.0, CARD_LABEL_SIZE, c.dark_gray);
        if let Some(value) = fit_single_line(
            &card.value,
            bounds.width - 10.0,
            CARD_VALUE_SIZE,
            labels::CLIP_MARKER,
            &*surface,
        ) {
            surface.draw_text(
                &value.text,
                Point::new(center - value.width / 2.0, bounds.y - 50.0),
                CARD_VALUE_SIZE,
                c.primary,
            );
        }
    }

    // ── details ─────────────────────────────────────────────────────────────

    fn details_pages<S: DrawingSurface>(&self, surface: &mut S, ctx: &PageContext) {
        let t = self.theme;
        let property = ctx.property;
        let mut y = self.open_page(surface, ctx, labels::DETAILS_TITLE, false);

        if !property.description.trim().is_empty() {
            self.section_heading(surface, labels::DESCRIPTION_HEADING, y);
            y -= t.section_title_gap;

            let lines = TextFlow::new(&*surface, t.description_size, t.content_width())
                .truncated(t.description_max_lines, labels::CONTINUED_MARKER)
                .layout(&property.description);
            let line_height = t.description_size * t.description_line_height;
            for (i, line) in lines.iter().enumerate() {
                surface.draw_text(
                    &line.text,
                    Point::new(t.right_edge() - line.width, y - i as f32 * line_height),
                    t.description_size,
                    t.colors.text,
                );
            }
            y -= lines.len() as f32 * line_height + SECTION_GAP;
        }

        if !property.features.is_empty() {
            y = self.features(surface, ctx, y);
        }
        self.contact_card(surface, ctx, y);
    }

    /// Feature bullets in a mirrored grid, continuing on new pages as needed.
    /// Returns the baseline for the next section.
    fn features<S: DrawingSurface>(&self, surface: &mut S, ctx: &PageContext, mut y: f32) -> f32 {
        let t = self.theme;
        let features = &ctx.property.features;

        if y - t.section_title_gap - t.feature_height < t.content_min_y {
            y = self.open_page(surface, ctx, labels::DETAILS_TITLE, false);
        }
        self.section_heading(surface, labels::FEATURES_HEADING, y);
        y -= t.section_title_gap;

        let mut placed = 0;
        loop {
            let grid = t.feature_grid(y);
            let take = grid
                .capacity(t.content_min_y)
                .max(1)
                .min(features.len() - placed);
            for cell in grid.cells(take) {
                self.feature(surface, &features[placed + cell.index], cell.bounds);
            }
            placed += take;

            if placed >= features.len() {
                return y
                    - grid.rows_for(take) as f32 * (t.feature_height + t.feature_gap_y)
                    - FEATURES_TRAILING_GAP;
            }
            debug!(placed, total = features.len(), "Features continue on a new page");
            y = self.open_page(surface, ctx, labels::DETAILS_TITLE, false);
        }
    }

    fn feature<S: DrawingSurface>(&self, surface: &mut S, feature: &str, bounds: BoundingBox) {
        let t = self.theme;
        surface.draw_text(
            labels::FEATURE_BULLET,
            Point::new(bounds.x + 15.0, bounds.y - 15.0),
            t.feature_size,
            t.colors.accent,
        );
        if let Some(line) = fit_single_line(
            feature,
            bounds.width - 40.0,
            t.feature_size,
            labels::CLIP_MARKER,
            &*surface,
        ) {
            surface.draw_text(
                &line.text,
                Point::new(bounds.x + 30.0, bounds.y - 20.0),
                t.feature_size,
                t.colors.text,
            );
        }
    }

    fn contact_card<S: DrawingSurface>(&self, surface: &mut S, ctx: &PageContext, mut y: f32) {
        let t = self.theme;
        let c = &t.colors;
        let property = ctx.property;

        if y - t.section_title_gap - t.contact_card_height < t.content_min_y {
            y = self.open_page(surface, ctx, labels::DETAILS_TITLE, false);
        }
        self.section_heading(surface, labels::CONTACT_HEADING, y);
        y -= t.section_title_gap;

        let card = BoundingBox::new(t.margin, y, t.content_width(), t.contact_card_height);
        surface.draw_rect(
            card,
            Some(c.light_gray),
            Some(Stroke {
                color: c.border,
                width: 1.0,
            }),
        );

        let contact = if property.contact_info.trim().is_empty() {
            labels::CONTACT_MISSING
        } else {
            property.contact_info.as_str()
        };
        surface.draw_text(
            contact,
            Point::new(card.x + 20.0, card.y - 67.0),
            CONTACT_VALUE_SIZE,
            c.primary,
        );

        let marketer = &property.marketer;
        if !marketer.name.trim().is_empty() {
            draw_right(
                surface,
                &marketer.name,
                card.right() - 20.0,
                card.y - 40.0,
                CONTACT_VALUE_SIZE,
                c.primary,
            );
        }
        if !marketer.role.trim().is_empty() {
            draw_right(
                surface,
                &marketer.role,
                card.right() - 20.0,
                card.y - 63.0,
                CONTACT_ROLE_SIZE,
                c.dark_gray,
            );
        }
    }

    // ── gallery ─────────────────────────────────────────────────────────────

    fn gallery_pages<S: DrawingSurface>(
        &self,
        surface: &mut S,
        ctx: &PageContext,
        report: &mut BuildReport,
    ) {
        let t = self.theme;
        let c = &t.colors;
        let gallery = &ctx.images.gallery;

        let grid = t.gallery_grid(t.content_top() - GALLERY_GRID_OFFSET);
        let per_page = t
            .gallery_per_page
            .min(grid.capacity(t.content_min_y))
            .max(1);
        let pages = paginate(gallery.len(), per_page);
        let total = pages.len();

        for (page_index, range) in pages.into_iter().enumerate() {
            let y = self.open_page(surface, ctx, labels::GALLERY_TITLE, false);
            self.section_heading(surface, labels::GALLERY_HEADING, y);
            surface.draw_text(
                &labels::gallery_page_label(page_index + 1, total),
                Point::new(t.margin, y),
                GALLERY_LABEL_SIZE,
                c.dark_gray,
            );
            surface.draw_line(
                Point::new(t.margin, y - 10.0),
                Point::new(t.right_edge(), y - 10.0),
                Stroke {
                    color: c.border,
                    width: 1.0,
                },
            );

            for (slot, index) in range.enumerate() {
                let cell = grid.cell(slot);
                match &gallery[index] {
                    Some(image) => {
                        surface.draw_image(image, cell.bounds.fit_aspect(image.aspect()));
                        report.gallery_cells_populated += 1;
                    }
                    None => {
                        debug!(index, "Gallery cell left blank");
                        report.gallery_cells_blank += 1;
                    }
                }
            }
            report.gallery_pages += 1;
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Text placement
// ────────────────────────────────────────────────────────────────────────────

fn draw_right<S: DrawingSurface>(
    surface: &mut S,
    text: &str,
    right: f32,
    y: f32,
    size: f32,
    color: Rgb,
) {
    let width = surface.measure(text, size);
    surface.draw_text(text, Point::new(right - width, y), size, color);
}

fn draw_centered<S: DrawingSurface>(
    surface: &mut S,
    text: &str,
    center: f32,
    y: f32,
    size: f32,
    color: Rgb,
) {
    let width = surface.measure(text, size);
    surface.draw_text(text, Point::new(center - width / 2.0, y), size, color);
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
