use crate::config::RelayConfig;
use crate::dispatcher::Dispatcher;
use crate::error::SubscribeError;
use crate::ntfy::subscribe_url;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::StatusCode;
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::handler::{LineOutcome, handle_line};

/// Longest line accepted from the stream; anything longer ends the session.
const MAX_LINE_BYTES: usize = 1024 * 1024;

pub struct Subscriber {
    client: reqwest::Client,
    config: RelayConfig,
    dispatcher: Dispatcher,
    /// Id of the last relayed message, sent as `since` when resuming is enabled.
    cursor: Option<String>,
}

impl Subscriber {
    pub fn new(client: reqwest::Client, config: RelayConfig, dispatcher: Dispatcher) -> Self {
        Self {
            client,
            config,
            dispatcher,
            cursor: None,
        }
    }

    /// Reconnects forever (or until the configured attempt cap) and only
    /// returns `Ok` once `cancel` fires.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<(), SubscribeError> {
        let mut failures: u32 = 0;

        loop {
            info!(
                domain = %self.config.ntfy_domain,
                topic = %self.config.ntfy_topic,
                "connecting to ntfy server"
            );

            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!("shutdown requested, closing subscription");
                    return Ok(());
                }
                result = self.connect_and_stream() => result,
            };

            // a session that got a 200 counts as a success, however it ended
            let established = matches!(result, Ok(()) | Err(SubscribeError::Read(_)));
            match result {
                Ok(()) => info!("connection closed, restarting"),
                Err(e) => error!(error = %e, "subscription session failed"),
            }

            if established {
                failures = 0;
            } else {
                failures += 1;
                if self.config.backoff.exhausted(failures) {
                    error!(attempts = failures, "reconnect limit reached, giving up");
                    return Err(SubscribeError::ReconnectLimit { attempts: failures });
                }
            }

            let delay = self.config.backoff.delay(failures.max(1));
            info!(delay_ms = delay.as_millis() as u64, "waiting before reconnect");

            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!("shutdown requested during backoff");
                    return Ok(());
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// One session: connect, then read the stream until it ends.
    pub async fn connect_and_stream(&mut self) -> Result<(), SubscribeError> {
        let since = self.cursor.as_deref().filter(|_| self.config.resume);
        let url = subscribe_url(&self.config.ntfy_domain, &self.config.ntfy_topic, since)?;

        let mut req = self.client.get(url.as_str());
        if let Some(token) = &self.config.ntfy_auth {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(SubscribeError::Connection)?;
        if resp.status() != StatusCode::OK {
            warn!(
                expected = StatusCode::OK.as_u16(),
                status = resp.status().as_u16(),
                domain = %self.config.ntfy_domain,
                "invalid status code"
            );
            return Err(SubscribeError::UnexpectedStatus(resp.status()));
        }
        info!(url = %url, "connected to ntfy stream");

        let body = StreamReader::new(resp.bytes_stream().map_err(std::io::Error::other));
        let codec =
            AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), b"\n".to_vec(), MAX_LINE_BYTES);
        let mut lines = FramedRead::new(body, codec);

        while let Some(line) = lines.next().await {
            let line = line.map_err(|e| SubscribeError::Read(std::io::Error::other(e)))?;
            if let LineOutcome::Dispatched { id } = handle_line(&line, &self.dispatcher)
                && !id.is_empty()
            {
                self.cursor = Some(id);
            }
        }

        Ok(())
    }
}
