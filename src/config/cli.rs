use clap::Parser;

use crate::logging::LogFormat;
use crate::notification_stream::BackoffKind;

pub const DEFAULT_NTFY_DOMAIN: &str = "ntfy.sh";

/// Every option can also come from the environment; a flag wins over its variable.
#[derive(Debug, Parser)]
#[command(name = "ntfy-slack-relay", about = "Relay an ntfy topic to a Slack webhook")]
pub struct Cli {
    /// ntfy server to subscribe to (host, or full base URL with scheme)
    #[arg(long, env = "NTFY_DOMAIN", default_value = DEFAULT_NTFY_DOMAIN)]
    pub ntfy_domain: String,

    /// ntfy topic to subscribe to
    #[arg(long, env = "NTFY_TOPIC")]
    pub ntfy_topic: Option<String>,

    /// Access token for reserved topics
    #[arg(long, env = "NTFY_AUTH", hide_env_values = true)]
    pub ntfy_auth: Option<String>,

    /// Slack incoming webhook URL to send messages to
    #[arg(long = "slack-webhook", env = "SLACK_WEBHOOK_URL", hide_env_values = true)]
    pub slack_webhook: Option<String>,

    /// debug, info, warn or error (RUST_LOG overrides)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,

    /// Wait before reconnecting after a session ends
    #[arg(long, env = "RECONNECT_DELAY_SECS", default_value_t = 30)]
    pub reconnect_delay_secs: u64,

    /// fixed or exponential
    #[arg(long, env = "RECONNECT_BACKOFF", default_value = "fixed")]
    pub backoff: BackoffKind,

    #[arg(long, env = "MAX_RECONNECT_DELAY_SECS", default_value_t = 300)]
    pub max_reconnect_delay_secs: u64,

    /// Give up after this many consecutive failed sessions (default: never)
    #[arg(long, env = "MAX_RECONNECTS", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_reconnects: Option<u32>,

    /// Resume from the last seen message id after a reconnect
    #[arg(long, env = "NTFY_RESUME")]
    pub resume: bool,

    #[arg(long, env = "DELIVERY_TIMEOUT_SECS", default_value_t = 10)]
    pub delivery_timeout_secs: u64,

    /// How long in-flight deliveries may run after shutdown is requested
    #[arg(long, env = "SHUTDOWN_GRACE_SECS", default_value_t = 5)]
    pub shutdown_grace_secs: u64,

    /// Print the version and exit
    #[arg(short = 'v', long = "version")]
    pub show_version: bool,
}
