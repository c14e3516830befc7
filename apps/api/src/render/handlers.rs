//! Axum route handlers for brochure generation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use axum::{
    extract::{multipart::Field, Multipart, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Datelike, Utc};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::errors::{AppError, JsonBody};
use crate::models::property::{sample_property, PropertyRecord};
use crate::models::validation::{validate_property, DEFAULT_CURRENCY};
use crate::render::{render_brochure, AttachmentName};
use crate::state::AppState;

/// Most gallery images accepted in one form submission.
pub const MAX_FORM_IMAGES: usize = 10;
const SAMPLE_FILENAME: &str = "sample-property-report.pdf";

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /generate-pdf
///
/// JSON listing → validation → PDF attachment.
pub async fn handle_generate_pdf(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Response, AppError> {
    let property = validate_property(&body)?;
    let rendered = render_brochure(state.render_deps(), property).await?;
    pdf_response(rendered.bytes, &rendered.filename)
}

/// POST /generate-pdf-form
///
/// Multipart form with text fields, up to ten `images` files and optional `logo1` /
/// `logo2`. Files are stored under the configured upload and logo directories and
/// referenced by path. Missing text fields take form defaults before validation.
pub async fn handle_generate_pdf_form(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut form = PropertyForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "images" | "images[]" => {
                if form.images.len() >= MAX_FORM_IMAGES {
                    return Err(AppError::BadRequest(format!(
                        "At most {MAX_FORM_IMAGES} images are accepted"
                    )));
                }
                if let Some(path) = store_upload(field, &state.config.upload_dir, None).await? {
                    form.images.push(path);
                }
            }
            "logo1" | "logo2" => {
                if let Some(path) =
                    store_upload(field, &state.config.logo_dir, Some(name.as_str())).await?
                {
                    form.logos.push((name, path));
                }
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Unreadable field '{name}': {e}")))?;
                form.fields.insert(name, value);
            }
        }
    }

    info!(
        images = form.images.len(),
        logos = form.logos.len(),
        "Received brochure form"
    );
    let body = form.into_value(Utc::now().year());
    let property = validate_property(&body)?;
    let rendered = render_brochure(state.render_deps(), property).await?;
    pdf_response(rendered.bytes, &rendered.filename)
}

/// GET /sample-property
pub async fn handle_sample_property() -> Json<PropertyRecord> {
    Json(sample_property())
}

/// GET /generate-sample-pdf
pub async fn handle_generate_sample_pdf(
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let rendered = render_brochure(state.render_deps(), sample_property()).await?;
    let filename = AttachmentName {
        utf8: SAMPLE_FILENAME.to_string(),
        ascii: SAMPLE_FILENAME.to_string(),
    };
    pdf_response(rendered.bytes, &filename)
}

fn pdf_response(bytes: Vec<u8>, filename: &AttachmentName) -> Result<Response, AppError> {
    let disposition = HeaderValue::from_str(&filename.content_disposition())
        .map_err(|e| AppError::Internal(anyhow!("invalid Content-Disposition: {e}")))?;
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

// ────────────────────────────────────────────────────────────────────────────
// Form mapping
// ────────────────────────────────────────────────────────────────────────────

/// Collected multipart fields before defaults are applied.
#[derive(Debug, Default)]
pub struct PropertyForm {
    pub fields: HashMap<String, String>,
    pub images: Vec<PathBuf>,
    /// `(field name, stored path)`; `logo1` sorts before `logo2`.
    pub logos: Vec<(String, PathBuf)>,
}

impl PropertyForm {
    fn text(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn text_or(&self, key: &str, default: &str) -> String {
        self.text(key).unwrap_or(default).to_string()
    }

    /// Leading numeric value, or 0 when absent or unparseable.
    fn number(&self, key: &str) -> f64 {
        self.text(key)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    fn integer(&self, key: &str) -> Option<i64> {
        self.text(key)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .map(|v| v.trunc() as i64)
    }

    /// JSON listing with form defaults applied; still subject to validation.
    pub fn into_value(mut self, current_year: i32) -> Value {
        self.logos.sort_by(|a, b| a.0.cmp(&b.0));

        let features: Vec<String> = self
            .text("features")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let path_strings =
            |paths: Vec<PathBuf>| -> Vec<String> { paths.iter().map(|p| p.display().to_string()).collect() };
        let logos = self.logos.drain(..).map(|(_, p)| p).collect();

        let mut body = json!({
            "title": self.text_or("title", "عقار بدون عنوان"),
            "description": self.text_or("description", "لا يوجد وصف متاح"),
            "price": self.number("price"),
            "area": self.number("area"),
            "bedrooms": self.integer("bedrooms").unwrap_or(0),
            "bathrooms": self.integer("bathrooms").unwrap_or(0),
            "parking": self.integer("parking").unwrap_or(0),
            "yearBuilt": self.integer("yearBuilt").filter(|y| *y != 0).unwrap_or(i64::from(current_year)),
            "location": self.text_or("location", "موقع غير محدد"),
            "city": self.text_or("city", "مدينة غير محددة"),
            "contactInfo": self.text_or("contactInfo", "غير متوفر"),
            "status": self.text_or("status", "AVAILABLE"),
            "currency": DEFAULT_CURRENCY,
            "type": self.text_or("type", "RESIDENTIAL"),
            "features": features,
            "images": path_strings(std::mem::take(&mut self.images)),
            "companyLogos": path_strings(logos),
            "marketer": {
                "name": self.text_or("marketerName", "أحمد منصور"),
                "role": self.text_or("marketerRole", "مسوق عقاري"),
            },
        });
        if let Some(country) = self.text("country") {
            body["country"] = Value::String(country.to_string());
        }
        body
    }
}

/// Writes an uploaded file to `dir`. Empty parts (no file chosen) are skipped.
///
/// Images are stored as `<millis>-<original name>`, logos as `<field>-<millis><ext>`.
async fn store_upload(
    field: Field<'_>,
    dir: &Path,
    logo_field: Option<&str>,
) -> Result<Option<PathBuf>, AppError> {
    let original = field.file_name().map(sanitize_file_name).unwrap_or_default();
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(format!("Unreadable upload: {e}")))?;
    if data.is_empty() {
        return Ok(None);
    }

    let millis = Utc::now().timestamp_millis();
    let stored_name = match logo_field {
        Some(logo) => {
            let ext = Path::new(&original)
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| format!(".{e}"))
                .unwrap_or_default();
            format!("{logo}-{millis}{ext}")
        }
        None if original.is_empty() => format!("{millis}-upload"),
        None => format!("{millis}-{original}"),
    };

    let path = dir.join(stored_name);
    tokio::fs::write(&path, &data)
        .await
        .map_err(|e| AppError::Internal(anyhow!("failed to store upload {}: {e}", path.display())))?;
    debug!(path = %path.display(), bytes = data.len(), "Stored upload");
    Ok(Some(path))
}

/// Keeps only the final path component and replaces anything outside a safe set.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    base.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}
