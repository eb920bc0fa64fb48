//! Error types for the subscription and delivery sides.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that end one subscription session (or, for `ReconnectLimit`, the loop).
#[derive(Error, Debug)]
pub enum SubscribeError {
    #[error("invalid subscription URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to connect to ntfy server: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("unexpected status from ntfy server: {0}")]
    UnexpectedStatus(StatusCode),

    #[error("failed to read ntfy stream: {0}")]
    Read(#[source] std::io::Error),

    #[error("giving up after {attempts} consecutive failed sessions")]
    ReconnectLimit { attempts: u32 },
}

/// One inbound line that could not be decoded. Never ends a session.
#[derive(Error, Debug)]
#[error("failed to decode ntfy event: {source}")]
pub struct DecodeError {
    pub line: String,
    #[source]
    pub source: serde_json::Error,
}

/// Errors from a single webhook delivery. Only ever logged.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("no Slack webhook configured")]
    Configuration,

    #[error("failed to reach Slack webhook: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("failed to read Slack response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("Slack webhook rejected message with status {status}")]
    Rejected { status: StatusCode },
}
