//! WhatsApp Cloud API dispatch: a text message, then the quotation document
//! uploaded as media and sent as a document message.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::info;

use showroom_core::config::WhatsAppConfig;

use crate::pdf::PublishedDocument;

/// Longest text body the Cloud API accepts.
pub const MAX_TEXT_CHARS: usize = 4000;

#[derive(Debug, Error)]
pub enum WhatsAppError {
    #[error("whatsapp request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("WhatsApp {stage} failed ({status}): {body}")]
    Rejected { stage: &'static str, status: StatusCode, body: String },
    #[error("WhatsApp media upload failed: no media id returned")]
    MissingMediaId,
    #[error("could not read quotation document: {0}")]
    Document(#[from] std::io::Error),
}

#[derive(Deserialize)]
struct MediaUploaded {
    id: Option<String>,
}

pub struct WhatsAppClient {
    /// `<api_base_url>/<phone_number_id>`, no trailing slash.
    base_url: String,
    token: SecretString,
    client: Client,
}

impl WhatsAppClient {
    pub fn new(
        api_base_url: &str,
        phone_number_id: &str,
        token: SecretString,
        timeout: Duration,
    ) -> Result<Self, WhatsAppError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = format!("{}/{}", api_base_url.trim_end_matches('/'), phone_number_id);
        Ok(Self { base_url, token, client })
    }

    /// Client for the configured account, or `None` when credentials are not
    /// set.
    pub fn from_config(config: &WhatsAppConfig) -> Result<Option<Self>, WhatsAppError> {
        match config.credentials() {
            Some((token, phone_number_id)) => Self::new(
                &config.api_base_url,
                phone_number_id,
                token.clone(),
                Duration::from_secs(config.timeout_secs),
            )
            .map(Some),
            None => Ok(None),
        }
    }

    async fn post_message(
        &self,
        stage: &'static str,
        payload: serde_json::Value,
    ) -> Result<(), WhatsAppError> {
        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .bearer_auth(self.token.expose_secret())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WhatsAppError::Rejected { stage, status, body });
        }
        Ok(())
    }

    pub async fn send_text(&self, to: &str, body: &str) -> Result<(), WhatsAppError> {
        let payload = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": truncate_chars(body, MAX_TEXT_CHARS) },
        });
        self.post_message("text send", payload).await
    }

    /// Uploads a document and returns its media id.
    pub async fn upload_media(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, WhatsAppError> {
        let part = Part::bytes(bytes).file_name(file_name.to_string()).mime_str(content_type)?;
        let form = Form::new()
            .text("messaging_product", "whatsapp")
            .text("type", content_type.to_string())
            .part("file", part);

        let response = self
            .client
            .post(format!("{}/media", self.base_url))
            .bearer_auth(self.token.expose_secret())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WhatsAppError::Rejected { stage: "media upload", status, body });
        }

        let uploaded: MediaUploaded = response.json().await?;
        uploaded.id.filter(|id| !id.is_empty()).ok_or(WhatsAppError::MissingMediaId)
    }

    pub async fn send_document(
        &self,
        to: &str,
        media_id: &str,
        file_name: &str,
    ) -> Result<(), WhatsAppError> {
        let payload = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "document",
            "document": {
                "id": media_id,
                "filename": file_name,
                "caption": "Quotation PDF attached.",
            },
        });
        self.post_message("document send", payload).await
    }

    /// Text first (skipped when blank), then the document. Stops at the first
    /// failure and reports it as the API returned it.
    pub async fn send_quotation(
        &self,
        to: &str,
        body: &str,
        document: &PublishedDocument,
    ) -> Result<(), WhatsAppError> {
        if !body.trim().is_empty() {
            self.send_text(to, body).await?;
        }

        let bytes = tokio::fs::read(&document.path).await?;
        let media_id =
            self.upload_media(&document.file_name, document.format.content_type(), bytes).await?;
        self.send_document(to, &media_id, &document.file_name).await?;

        info!(
            event_name = "share.whatsapp.sent",
            file_name = %document.file_name,
            "quotation sent over WhatsApp"
        );
        Ok(())
    }
}

/// First `max` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
