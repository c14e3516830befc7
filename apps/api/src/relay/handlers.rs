//! Axum route handler for WhatsApp delivery.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::errors::{AppError, JsonBody};
use crate::models::validation::validate_property;
use crate::render::render_brochure;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendPdfRequest {
    pub property: Option<Value>,
    /// Phone number in international format; a JSON number is accepted too.
    pub recipient: Option<Value>,
}

impl SendPdfRequest {
    fn recipient(&self) -> Option<String> {
        let recipient = match self.recipient.as_ref()? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!recipient.is_empty()).then_some(recipient)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPdfResponse {
    pub success: bool,
    pub send_result: Value,
}

/// POST /send-pdf-whatsapp
///
/// Validates and renders the listing in-process, uploads the PDF as WhatsApp media
/// and sends it to `recipient` as a document message.
pub async fn handle_send_pdf_whatsapp(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SendPdfRequest>,
) -> Result<Json<SendPdfResponse>, AppError> {
    let relay = state.relay.as_ref().ok_or(AppError::RelayNotConfigured)?;

    let (Some(property), Some(recipient)) = (request.property.as_ref(), request.recipient()) else {
        return Err(AppError::BadRequest(
            "property and recipient are required in body".to_string(),
        ));
    };

    let property = validate_property(property)?;
    let rendered = render_brochure(state.render_deps(), property).await?;

    let send_result = relay
        .deliver_pdf(
            &recipient,
            &rendered.bytes,
            &rendered.filename.ascii,
            &rendered.filename.utf8,
        )
        .await?;
    info!(pages = rendered.report.pages, "Brochure delivered over WhatsApp");

    Ok(Json(SendPdfResponse {
        success: true,
        send_result,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> SendPdfRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_numeric_recipient_is_accepted() {
        let req = request(json!({ "recipient": 966500000000u64 }));
        assert_eq!(req.recipient().as_deref(), Some("966500000000"));
    }

    #[test]
    fn test_string_recipient_is_trimmed() {
        let req = request(json!({ "recipient": "  966500000000 " }));
        assert_eq!(req.recipient().as_deref(), Some("966500000000"));
    }

    #[test]
    fn test_blank_or_odd_recipient_is_missing() {
        assert_eq!(request(json!({ "recipient": "  " })).recipient(), None);
        assert_eq!(request(json!({ "recipient": ["1"] })).recipient(), None);
        assert_eq!(request(json!({})).recipient(), None);
    }
}
