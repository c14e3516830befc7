//! Messaging relay: delivers a rendered brochure over the WhatsApp Cloud API.
//!
//! Two calls per delivery:
//! 1. `POST {base}/{phone_number_id}/media` (multipart `file` + `messaging_product`) → media id
//! 2. `POST {base}/{phone_number_id}/messages` with a `document` message referencing that id
//!
//! The upload retries on 429, 5xx and transport errors with exponential backoff. The
//! send is not idempotent: it retries only on 429 or when the connection was never
//! established, so a lost response cannot deliver the same document twice. Other
//! non-2xx responses fail immediately.

pub mod handlers;

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::WhatsAppSettings;

const MESSAGING_PRODUCT: &str = "whatsapp";
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("{step} response is missing `{field}`: {body}")]
    MissingField {
        step: &'static str,
        field: &'static str,
        body: Value,
    },

    #[error("Gave up after {retries} attempts")]
    RetriesExhausted { retries: u32 },
}

/// Which failures a step may safely repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryPolicy {
    /// 429, 5xx and any transport error.
    Transient,
    /// 429 and connection failures only; the request never reached the API.
    NotDelivered,
}

impl RetryPolicy {
    fn retries_status(self, status: reqwest::StatusCode) -> bool {
        status.as_u16() == 429 || (self == Self::Transient && status.is_server_error())
    }

    fn retries_transport(self, error: &reqwest::Error) -> bool {
        self == Self::Transient || error.is_connect()
    }
}

#[derive(Debug, Serialize)]
struct DocumentMessage<'a> {
    messaging_product: &'a str,
    to: &'a str,
    #[serde(rename = "type")]
    message_type: &'a str,
    document: DocumentRef<'a>,
}

#[derive(Debug, Serialize)]
struct DocumentRef<'a> {
    id: &'a str,
    filename: &'a str,
}

/// WhatsApp Cloud API client. Cheap to clone; the HTTP pool is shared.
#[derive(Clone)]
pub struct WhatsAppClient {
    client: Client,
    token: String,
    phone_number_id: String,
    api_base: String,
    retry_base: Duration,
}

impl WhatsAppClient {
    pub fn new(settings: &WhatsAppSettings) -> Result<Self, RelayError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            token: settings.token.clone(),
            phone_number_id: settings.phone_number_id.clone(),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            retry_base: RETRY_BASE_DELAY,
        })
    }

    /// First retry waits `base`, each later one twice as long.
    pub fn with_retry_base(mut self, base: Duration) -> Self {
        self.retry_base = base;
        self
    }

    fn endpoint(&self, resource: &str) -> String {
        format!("{}/{}/{resource}", self.api_base, self.phone_number_id)
    }

    /// Uploads a PDF and returns its media id.
    pub async fn upload_media(&self, pdf: &[u8], filename: &str) -> Result<String, RelayError> {
        let url = self.endpoint("media");
        let body = self
            .send_with_retry("upload", RetryPolicy::Transient, || {
                let part = Part::bytes(pdf.to_vec())
                    .file_name(filename.to_string())
                    .mime_str("application/pdf")?;
                let form = Form::new()
                    .part("file", part)
                    .text("messaging_product", MESSAGING_PRODUCT);
                Ok(self
                    .client
                    .post(&url)
                    .bearer_auth(&self.token)
                    .multipart(form))
            })
            .await?;

        match body.get("id").and_then(Value::as_str) {
            Some(id) => Ok(id.to_string()),
            None => Err(RelayError::MissingField {
                step: "upload",
                field: "id",
                body,
            }),
        }
    }

    /// Sends an uploaded document to `recipient`; returns the API's response body.
    pub async fn send_document(
        &self,
        recipient: &str,
        media_id: &str,
        filename: &str,
    ) -> Result<Value, RelayError> {
        let url = self.endpoint("messages");
        let message = DocumentMessage {
            messaging_product: MESSAGING_PRODUCT,
            to: recipient,
            message_type: "document",
            document: DocumentRef {
                id: media_id,
                filename,
            },
        };
        let body = self
            .send_with_retry("send", RetryPolicy::NotDelivered, || {
                Ok(self
                    .client
                    .post(&url)
                    .bearer_auth(&self.token)
                    .json(&message))
            })
            .await?;

        if body.get("messages").is_none() {
            return Err(RelayError::MissingField {
                step: "send",
                field: "messages",
                body,
            });
        }
        Ok(body)
    }

    /// Upload then send. `upload_name` must be ASCII; `display_name` is what the
    /// recipient sees.
    pub async fn deliver_pdf(
        &self,
        recipient: &str,
        pdf: &[u8],
        upload_name: &str,
        display_name: &str,
    ) -> Result<Value, RelayError> {
        let media_id = self.upload_media(pdf, upload_name).await?;
        info!(%media_id, bytes = pdf.len(), "Brochure uploaded to WhatsApp");
        let result = self.send_document(recipient, &media_id, display_name).await?;
        info!(%media_id, "Brochure sent over WhatsApp");
        Ok(result)
    }

    /// Sends the request built by `build`, retrying what `policy` allows.
    async fn send_with_retry<F>(
        &self,
        step: &'static str,
        policy: RetryPolicy,
        build: F,
    ) -> Result<Value, RelayError>
    where
        F: Fn() -> Result<RequestBuilder, RelayError>,
    {
        let mut last_error: Option<RelayError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = self.retry_base * (1 << (attempt - 1));
                warn!(
                    "WhatsApp {step} attempt {attempt} failed, retrying after {}ms...",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match build()?.send().await {
                Ok(r) => r,
                Err(e) if policy.retries_transport(&e) => {
                    warn!("WhatsApp {step} request failed: {e}");
                    last_error = Some(RelayError::Http(e));
                    continue;
                }
                Err(e) => return Err(RelayError::Http(e)),
            };

            let status = response.status();
            if policy.retries_status(status) {
                let body = response.text().await.unwrap_or_default();
                warn!("WhatsApp {step} returned {status}: {body}");
                last_error = Some(RelayError::Api {
                    status: status.as_u16(),
                    body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(RelayError::Api {
                    status: status.as_u16(),
                    body,
                });
            }

            let body: Value = response.json().await?;
            debug!("WhatsApp {step} succeeded");
            return Ok(body);
        }

        Err(last_error.unwrap_or(RelayError::RetriesExhausted {
            retries: MAX_RETRIES,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> WhatsAppClient {
        WhatsAppClient::new(&WhatsAppSettings {
            token: "test-token".into(),
            phone_number_id: "12345".into(),
            api_base: server.base_url(),
        })
        .unwrap()
        .with_retry_base(Duration::from_millis(1))
    }

    // ── upload ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_upload_returns_media_id() {
        let server = MockServer::start_async().await;
        let upload = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/12345/media")
                    .header("authorization", "Bearer test-token")
                    .body_contains("messaging_product")
                    .body_contains("whatsapp");
                then.status(200).json_body(json!({ "id": "media-1" }));
            })
            .await;

        let id = client_for(&server)
            .upload_media(b"%PDF-1.3 test", "brochure.pdf")
            .await
            .unwrap();
        assert_eq!(id, "media-1");
        upload.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_without_id_is_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/12345/media");
                then.status(200).json_body(json!({ "error": "nope" }));
            })
            .await;

        let result = client_for(&server).upload_media(b"%PDF", "a.pdf").await;
        assert!(matches!(
            result,
            Err(RelayError::MissingField { field: "id", .. })
        ));
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_three_times() {
        let server = MockServer::start_async().await;
        let upload = server
            .mock_async(|when, then| {
                when.method(POST).path("/12345/media");
                then.status(503).body("unavailable");
            })
            .await;

        let result = client_for(&server).upload_media(b"%PDF", "a.pdf").await;
        assert!(matches!(result, Err(RelayError::Api { status: 503, .. })));
        upload.assert_hits_async(3).await;
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start_async().await;
        let upload = server
            .mock_async(|when, then| {
                when.method(POST).path("/12345/media");
                then.status(401).body("bad token");
            })
            .await;

        let result = client_for(&server).upload_media(b"%PDF", "a.pdf").await;
        assert!(matches!(result, Err(RelayError::Api { status: 401, .. })));
        upload.assert_hits_async(1).await;
    }

    // ── send ────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_send_server_error_is_not_repeated() {
        let server = MockServer::start_async().await;
        let send = server
            .mock_async(|when, then| {
                when.method(POST).path("/12345/messages");
                then.status(500).body("internal");
            })
            .await;

        let result = client_for(&server).send_document("1", "m", "a.pdf").await;
        assert!(matches!(result, Err(RelayError::Api { status: 500, .. })));
        send.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_send_rate_limit_is_retried() {
        let server = MockServer::start_async().await;
        let send = server
            .mock_async(|when, then| {
                when.method(POST).path("/12345/messages");
                then.status(429).body("slow down");
            })
            .await;

        let result = client_for(&server).send_document("1", "m", "a.pdf").await;
        assert!(matches!(result, Err(RelayError::Api { status: 429, .. })));
        send.assert_hits_async(3).await;
    }

    #[test]
    fn test_retry_policy_statuses() {
        use reqwest::StatusCode;
        assert!(RetryPolicy::Transient.retries_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(RetryPolicy::Transient.retries_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!RetryPolicy::NotDelivered.retries_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(RetryPolicy::NotDelivered.retries_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!RetryPolicy::Transient.retries_status(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn test_send_document_message_shape() {
        let server = MockServer::start_async().await;
        let send = server
            .mock_async(|when, then| {
                when.method(POST).path("/12345/messages").json_body_partial(
                    r#"{
                        "messaging_product": "whatsapp",
                        "to": "966500000000",
                        "type": "document",
                        "document": { "id": "media-1", "filename": "تقرير.pdf" }
                    }"#,
                );
                then.status(200)
                    .json_body(json!({ "messages": [{ "id": "wamid.1" }] }));
            })
            .await;

        let result = client_for(&server)
            .send_document("966500000000", "media-1", "تقرير.pdf")
            .await
            .unwrap();
        assert_eq!(result["messages"][0]["id"], "wamid.1");
        send.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_without_messages_is_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/12345/messages");
                then.status(200).json_body(json!({ "contacts": [] }));
            })
            .await;

        let result = client_for(&server).send_document("1", "m", "a.pdf").await;
        assert!(matches!(
            result,
            Err(RelayError::MissingField { field: "messages", .. })
        ));
    }

    #[tokio::test]
    async fn test_deliver_uploads_then_sends() {
        let server = MockServer::start_async().await;
        let upload = server
            .mock_async(|when, then| {
                when.method(POST).path("/12345/media");
                then.status(200).json_body(json!({ "id": "media-9" }));
            })
            .await;
        let send = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/12345/messages")
                    .json_body_partial(r#"{ "document": { "id": "media-9" } }"#);
                then.status(200).json_body(json!({ "messages": [{ "id": "w" }] }));
            })
            .await;

        client_for(&server)
            .deliver_pdf("966500000000", b"%PDF", "brochure-1.pdf", "تقرير-1.pdf")
            .await
            .unwrap();
        upload.assert_async().await;
        send.assert_async().await;
    }
}
