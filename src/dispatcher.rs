//! Fire-and-forget delivery of relayed messages.
//!
//! Every message gets its own task. Nothing waits on a delivery except
//! `drain`, which is only called on shutdown.

use reqwest::StatusCode;
use std::time::Duration;
use tokio_util::task::TaskTracker;
use tracing::{debug, error};
use url::Url;

use crate::config::RelayConfig;
use crate::error::DeliveryError;
use crate::slack::{SlackMessage, post_message};

#[derive(Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    webhook: Option<Url>,
    timeout: Duration,
    tracker: TaskTracker,
}

impl Dispatcher {
    pub fn new(client: reqwest::Client, config: &RelayConfig) -> Self {
        Self {
            client,
            webhook: config.slack_webhook.clone(),
            timeout: config.delivery_timeout,
            tracker: TaskTracker::new(),
        }
    }

    /// Spawns the delivery and returns immediately. The outcome only shows up in the logs.
    pub fn dispatch(&self, message: SlackMessage) {
        let this = self.clone();
        self.tracker.spawn(async move {
            match this.deliver(&message).await {
                Ok(status) => debug!(status = status.as_u16(), "message delivered to slack"),
                Err(e) => error!(error = %e, "failed to deliver message to slack"),
            }
        });
    }

    pub async fn deliver(&self, message: &SlackMessage) -> Result<StatusCode, DeliveryError> {
        post_message(&self.client, self.webhook.as_ref(), message, self.timeout).await
    }

    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stops accepting work and waits up to `grace` for running deliveries.
    /// Returns `false` if some were still running when the grace period ran out.
    pub async fn drain(&self, grace: Duration) -> bool {
        self.tracker.close();
        tokio::time::timeout(grace, self.tracker.wait()).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dispatcher_for(server: &MockServer) -> Dispatcher {
        let webhook = format!("{}/hook", server.uri());
        let config = RelayConfig::for_test("http://127.0.0.1:1", Some(&webhook));
        Dispatcher::new(reqwest::Client::new(), &config)
    }

    #[tokio::test]
    async fn every_dispatch_is_delivered() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(3)
            .mount(&server)
            .await;

        let dispatcher = dispatcher_for(&server);
        for n in 0..3 {
            dispatcher.dispatch(SlackMessage::new(None, &format!("msg {n}")));
        }
        assert!(dispatcher.drain(Duration::from_secs(5)).await);
        assert_eq!(dispatcher.in_flight(), 0);

        let mut texts: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| {
                let v: Value = serde_json::from_slice(&r.body).unwrap();
                v["text"].as_str().unwrap().to_string()
            })
            .collect();
        texts.sort();
        assert_eq!(texts, ["msg 0", "msg 1", "msg 2"]);
    }

    #[tokio::test]
    async fn dispatch_does_not_wait_for_slow_webhook() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let dispatcher = dispatcher_for(&server);
        let started = std::time::Instant::now();
        dispatcher.dispatch(SlackMessage::new(None, "a"));
        dispatcher.dispatch(SlackMessage::new(None, "b"));
        assert!(started.elapsed() < Duration::from_millis(100));
        assert_eq!(dispatcher.in_flight(), 2);

        assert!(dispatcher.drain(Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn drain_gives_up_after_grace() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let dispatcher = dispatcher_for(&server);
        dispatcher.dispatch(SlackMessage::new(None, "slow"));
        assert!(!dispatcher.drain(Duration::from_millis(50)).await);
    }

    #[tokio::test]
    async fn rejected_delivery_is_reported_to_direct_caller() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dispatcher = dispatcher_for(&server);
        let err = dispatcher
            .deliver(&SlackMessage::new(Some("Alert"), "disk full"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Rejected { status } if status.as_u16() == 500));

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body, json!({ "text": "**Alert**: disk full" }));
    }

    #[tokio::test]
    async fn missing_webhook_is_logged_not_raised() {
        let config = RelayConfig::for_test("http://127.0.0.1:1", None);
        let dispatcher = Dispatcher::new(reqwest::Client::new(), &config);

        assert!(matches!(
            dispatcher.deliver(&SlackMessage::new(None, "x")).await,
            Err(DeliveryError::Configuration)
        ));

        dispatcher.dispatch(SlackMessage::new(None, "x"));
        assert!(dispatcher.drain(Duration::from_secs(1)).await);
    }
}
