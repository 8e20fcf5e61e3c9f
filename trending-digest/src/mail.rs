//! Resend client behind the core [`MailBackend`] contract.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use trending_digest_core::config::DeliveryConfig;
use trending_digest_core::contract::{EmailBody, EmailMessage, MailBackend};
use trending_digest_core::error::BackendError;

pub struct ResendClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ResendClient {
    pub fn new(api_key: String, config: &DeliveryConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        tracing::info!(
            base_url = %config.api_base_url,
            from = %config.from,
            api_key_set = !api_key.is_empty(),
            "Initialized ResendClient"
        );
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

impl<'a> From<&'a EmailMessage> for SendRequest<'a> {
    fn from(m: &'a EmailMessage) -> Self {
        let (html, text) = match &m.body {
            EmailBody::Html(h) => (Some(h.as_str()), None),
            EmailBody::Text(t) => (None, Some(t.as_str())),
        };
        Self {
            from: &m.from,
            to: &m.to,
            subject: &m.subject,
            html,
            text,
        }
    }
}

#[derive(Deserialize)]
struct SendResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiError {
    status_code: Option<u16>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    message: String,
}

#[async_trait]
impl MailBackend for ResendClient {
    async fn send_email(&self, message: &EmailMessage) -> Result<String, BackendError> {
        tracing::debug!(to = ?message.to, subject = %message.subject, "Sending email via Resend");
        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&SendRequest::from(message))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let sent: SendResponse = response.json().await?;
            return Ok(sent.id);
        }

        let raw = response.text().await.unwrap_or_default();
        let reason = match serde_json::from_str::<ApiError>(&raw) {
            Ok(api) => format!(
                "Resend API error {} {}: {}",
                api.status_code.unwrap_or(status.as_u16()),
                api.name,
                api.message
            ),
            Err(_) => format!("Resend API returned {status}: {}", raw.trim()),
        };
        tracing::error!(status = %status, reason = %reason, "Resend rejected the message");
        Err(reason.into())
    }
}
