//! Slack incoming webhook (payload + HTTP)

use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::DeliveryError;
use crate::ntfy::NtfyEvent;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackMessage {
    pub text: String,
}

impl SlackMessage {
    /// `**{title}**: {body}` when there is a non-empty title, otherwise the body as-is.
    pub fn new(title: Option<&str>, body: &str) -> Self {
        let text = match title.filter(|t| !t.is_empty()) {
            Some(title) => format!("**{title}**: {body}"),
            None => body.to_string(),
        };
        Self { text }
    }
}

impl From<&NtfyEvent> for SlackMessage {
    fn from(ev: &NtfyEvent) -> Self {
        Self::new(ev.title(), &ev.message)
    }
}

/// Posts one message to the webhook.
///
/// The response body is always drained so the connection can go back to the pool.
/// A status of 400 or above is reported as `Rejected` even when the body read fails.
pub async fn post_message(
    client: &reqwest::Client,
    webhook: Option<&Url>,
    message: &SlackMessage,
    timeout: Duration,
) -> Result<StatusCode, DeliveryError> {
    let webhook = webhook.ok_or(DeliveryError::Configuration)?;

    let resp = client
        .post(webhook.as_str())
        .header(CONTENT_TYPE, "application/json")
        .json(message)
        .timeout(timeout)
        .send()
        .await
        .map_err(DeliveryError::Connection)?;

    let status = resp.status();
    match resp.text().await {
        Ok(body) => debug!(status = status.as_u16(), body = %body, "slack response"),
        Err(e) if status.as_u16() < 400 => return Err(DeliveryError::Body(e)),
        Err(e) => debug!(status = status.as_u16(), error = %e, "unreadable slack error body"),
    }

    if status.as_u16() >= 400 {
        return Err(DeliveryError::Rejected { status });
    }

    Ok(status)
}
