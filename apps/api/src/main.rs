mod config;
mod errors;
mod layout;
mod models;
mod relay;
mod render;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::relay::WhatsAppClient;
use crate::render::fonts::FontResource;
use crate::render::images::HttpImageProvider;
use crate::render::theme::Theme;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting brochure API v{}", env!("CARGO_PKG_VERSION"));

    // Upload targets for the multipart form
    for dir in [&config.upload_dir, &config.logo_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    // Font: embedded TrueType when available, Helvetica otherwise
    let font = FontResource::load(&config.font_path);
    info!("Brochure font: {}", font.name());

    let images = HttpImageProvider::new(config.image_fetch_timeout)
        .context("failed to build image HTTP client")?;

    let relay = match &config.whatsapp {
        Some(settings) => {
            let client = WhatsAppClient::new(settings)
                .context("failed to build WhatsApp client")?;
            info!("WhatsApp relay enabled (api base: {})", settings.api_base);
            Some(client)
        }
        None => {
            warn!("WHATSAPP_TOKEN / WHATSAPP_PHONE_NUMBER_ID not set; /send-pdf-whatsapp disabled");
            None
        }
    };

    let state = AppState {
        config: config.clone(),
        theme: Arc::new(Theme::default()),
        font: Arc::new(font),
        images: Arc::new(images),
        relay,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
