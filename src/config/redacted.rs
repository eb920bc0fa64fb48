use super::RelayConfig;

pub struct Redacted<'a>(pub(crate) &'a RelayConfig);

impl std::fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = self.0;
        f.debug_struct("RelayConfig")
            .field("ntfy_domain", &c.ntfy_domain)
            .field("ntfy_topic", &c.ntfy_topic)
            .field("ntfy_auth", &c.ntfy_auth.as_deref().map(mask))
            .field("slack_webhook", &c.slack_webhook.as_ref().map(mask_url))
            .field("backoff", &c.backoff.kind)
            .field("reconnect_delay_secs", &c.backoff.base.as_secs())
            .field("max_reconnects", &c.backoff.max_attempts)
            .field("resume", &c.resume)
            .field("delivery_timeout_secs", &c.delivery_timeout.as_secs())
            .field("shutdown_grace_secs", &c.shutdown_grace.as_secs())
            .finish()
    }
}

fn mask(s: &str) -> String {
    match s.get(..3) {
        Some(prefix) if s.len() > 6 => format!("{prefix}***"),
        _ => "***".into(),
    }
}

// webhook URLs carry their secret in the path
fn mask_url(url: &url::Url) -> String {
    format!("{}://***", url.scheme())
}
