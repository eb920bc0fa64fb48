//! ntfy subscription types and URL building

use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;

use crate::error::DecodeError;

/// `event` field of a streamed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Open,
    Keepalive,
    Message,
    #[default]
    #[serde(other)]
    Unknown,
}

/// One line of the `/json` stream. Every field may be absent on the wire.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NtfyEvent {
    pub id: String,
    pub time: i64,
    pub event: EventKind,
    pub topic: String,
    pub title: Option<String>,
    pub message: String,
}

impl NtfyEvent {
    pub fn decode(line: &[u8]) -> Result<Self, DecodeError> {
        serde_json::from_slice(line).map_err(|source| DecodeError {
            line: String::from_utf8_lossy(line).into_owned(),
            source,
        })
    }

    /// Title, treating an empty string the same as no title.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.time, 0)
    }
}

/// Builds `https://{domain}/{topic}/json`.
///
/// A domain that already carries an `http://` or `https://` scheme is used as
/// the base unchanged. `since` resumes the stream after the given message id.
pub fn subscribe_url(
    domain: &str,
    topic: &str,
    since: Option<&str>,
) -> Result<Url, url::ParseError> {
    let base = if domain.starts_with("https://") || domain.starts_with("http://") {
        domain.trim_end_matches('/').to_string()
    } else {
        format!("https://{domain}")
    };

    let mut url = Url::parse(&format!("{base}/{topic}/json"))?;
    if let Some(id) = since {
        url.query_pairs_mut().append_pair("since", id);
    }
    Ok(url)
}
