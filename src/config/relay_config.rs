use crate::config::{Cli, Redacted};
use crate::notification_stream::Backoff;
use anyhow::{Context, Result, bail};
use std::time::Duration;
use url::Url;

/// Immutable settings shared by the subscriber and the dispatcher.
#[derive(Clone)]
pub struct RelayConfig {
    pub ntfy_domain: String,
    pub ntfy_topic: String,
    pub ntfy_auth: Option<String>,

    /// `None` means every delivery fails with a configuration error.
    pub slack_webhook: Option<Url>,

    pub backoff: Backoff,
    pub resume: bool,

    pub delivery_timeout: Duration,
    pub shutdown_grace: Duration,
}

impl RelayConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let ntfy_topic = match opt(&cli.ntfy_topic) {
            Some(topic) => topic,
            None => bail!("missing ntfy topic: pass --ntfy-topic or set NTFY_TOPIC"),
        };

        let slack_webhook = opt(&cli.slack_webhook)
            .map(|raw| {
                Url::parse(&raw).with_context(|| format!("invalid Slack webhook URL '{raw}'"))
            })
            .transpose()?;

        let base = Duration::from_secs(cli.reconnect_delay_secs);
        let backoff = Backoff {
            kind: cli.backoff,
            max: Duration::from_secs(cli.max_reconnect_delay_secs).max(base),
            max_attempts: cli.max_reconnects,
            ..Backoff::fixed(base)
        };

        Ok(Self {
            ntfy_domain: cli.ntfy_domain.trim().to_string(),
            ntfy_topic,
            ntfy_auth: opt(&cli.ntfy_auth),
            slack_webhook,
            backoff,
            resume: cli.resume,
            delivery_timeout: Duration::from_secs(cli.delivery_timeout_secs),
            shutdown_grace: Duration::from_secs(cli.shutdown_grace_secs),
        })
    }

    pub fn redacted(&self) -> Redacted<'_> {
        Redacted(self)
    }

    #[cfg(test)]
    pub fn for_test(ntfy_domain: &str, slack_webhook: Option<&str>) -> Self {
        Self {
            ntfy_domain: ntfy_domain.to_string(),
            ntfy_topic: "alerts".to_string(),
            ntfy_auth: None,
            slack_webhook: slack_webhook.map(|u| Url::parse(u).unwrap()),
            backoff: Backoff::fixed(Duration::from_millis(20)),
            resume: false,
            delivery_timeout: Duration::from_secs(5),
            shutdown_grace: Duration::from_secs(1),
        }
    }
}

fn opt(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification_stream::BackoffKind;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["ntfy-slack-relay"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn builds_from_flags() {
        let config = RelayConfig::from_cli(&cli(&[
            "--ntfy-topic",
            "alerts",
            "--ntfy-auth",
            "tk_abcdef",
            "--slack-webhook",
            "https://hooks.slack.com/services/T/B/X",
        ]))
        .unwrap();

        assert_eq!(config.ntfy_domain, "ntfy.sh");
        assert_eq!(config.ntfy_topic, "alerts");
        assert_eq!(config.ntfy_auth.as_deref(), Some("tk_abcdef"));
        assert_eq!(
            config.slack_webhook.as_ref().map(Url::as_str),
            Some("https://hooks.slack.com/services/T/B/X")
        );
        assert_eq!(config.backoff.kind, BackoffKind::Fixed);
        assert_eq!(config.backoff.delay(7), Duration::from_secs(30));
        assert_eq!(config.backoff.max_attempts, None);
        assert!(!config.resume);
    }

    #[test]
    fn topic_is_required() {
        assert!(RelayConfig::from_cli(&cli(&[])).is_err());
        assert!(RelayConfig::from_cli(&cli(&["--ntfy-topic", "  "])).is_err());
    }

    #[test]
    fn webhook_is_optional_but_must_parse() {
        let config = RelayConfig::from_cli(&cli(&["--ntfy-topic", "t"])).unwrap();
        assert!(config.slack_webhook.is_none());

        let err =
            RelayConfig::from_cli(&cli(&["--ntfy-topic", "t", "--slack-webhook", "not a url"]));
        assert!(err.is_err());
    }

    #[test]
    fn empty_token_is_no_token() {
        let config =
            RelayConfig::from_cli(&cli(&["--ntfy-topic", "t", "--ntfy-auth", ""])).unwrap();
        assert_eq!(config.ntfy_auth, None);
    }

    #[test]
    fn max_delay_never_below_base() {
        let config = RelayConfig::from_cli(&cli(&[
            "--ntfy-topic",
            "t",
            "--reconnect-delay-secs",
            "60",
            "--max-reconnect-delay-secs",
            "10",
        ]))
        .unwrap();
        assert_eq!(config.backoff.max, Duration::from_secs(60));
    }
}
