//! Subscribes to the ntfy topic and hands every message to the dispatcher.

mod backoff;
mod connection;
mod handler;

pub use backoff::{Backoff, BackoffKind};
pub use connection::Subscriber;

use crate::config::RelayConfig;
use crate::dispatcher::Dispatcher;
use crate::error::SubscribeError;
use tokio_util::sync::CancellationToken;

pub async fn run_notification_stream(
    client: &reqwest::Client,
    config: &RelayConfig,
    dispatcher: Dispatcher,
    cancel: &CancellationToken,
) -> Result<(), SubscribeError> {
    Subscriber::new(client.clone(), config.clone(), dispatcher).run(cancel).await
}
