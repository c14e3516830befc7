use std::sync::Arc;

use crate::config::Config;
use crate::relay::WhatsAppClient;
use crate::render::fonts::FontResource;
use crate::render::images::ImageProvider;
use crate::render::theme::Theme;
use crate::render::RenderDeps;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Page geometry and colors, fixed at startup.
    pub theme: Arc<Theme>,
    /// Preferred TrueType font, or the Helvetica fallback.
    pub font: Arc<FontResource>,
    /// Pluggable image source. Default: `HttpImageProvider` (HTTP + local files).
    pub images: Arc<dyn ImageProvider>,
    /// `None` when WhatsApp credentials are not configured.
    pub relay: Option<WhatsAppClient>,
}

impl AppState {
    pub fn render_deps(&self) -> RenderDeps<'_> {
        RenderDeps {
            theme: &self.theme,
            font: &self.font,
            images: self.images.as_ref(),
        }
    }
}
