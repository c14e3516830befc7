pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::relay::handlers as relay;
use crate::render::handlers as render;
use crate::state::AppState;

/// Upper bound for a form submission carrying ten photos and two logos.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Brochure generation
        .route("/generate-pdf", post(render::handle_generate_pdf))
        .route(
            "/generate-pdf-form",
            post(render::handle_generate_pdf_form).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/sample-property", get(render::handle_sample_property))
        .route(
            "/generate-sample-pdf",
            get(render::handle_generate_sample_pdf),
        )
        // Messaging relay
        .route("/send-pdf-whatsapp", post(relay::handle_send_pdf_whatsapp))
        .fallback(not_found)
        .with_state(state)
}
