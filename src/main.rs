mod config;
mod dispatcher;
mod error;
mod logging;
mod notification_stream;
mod ntfy;
mod slack;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Cli, RelayConfig};
use dispatcher::Dispatcher;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env");
    let cli = Cli::parse();

    if cli.show_version {
        println!("v{VERSION}");
        return Ok(());
    }

    logging::init(&cli.log_level, cli.log_format);
    let config = RelayConfig::from_cli(&cli)?;
    info!(version = VERSION, log_format = %cli.log_format, "starting ntfy-slack-relay");
    info!("config = {:?}", config.redacted());
    if config.slack_webhook.is_none() {
        warn!("no Slack webhook configured, messages will be dropped");
    }

    let client = reqwest::Client::builder()
        .user_agent(concat!("ntfy-slack-relay/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .context("failed to build HTTP client")?;

    let dispatcher = Dispatcher::new(client.clone(), &config);
    let cancel = CancellationToken::new();

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("received shutdown signal");
        shutdown.cancel();
    });

    let result =
        notification_stream::run_notification_stream(&client, &config, dispatcher.clone(), &cancel)
            .await;

    let pending = dispatcher.in_flight();
    if pending > 0 {
        info!(pending, "waiting for in-flight deliveries");
    }
    if !dispatcher.drain(config.shutdown_grace).await {
        warn!(pending = dispatcher.in_flight(), "abandoning unfinished deliveries");
    }

    if let Err(e) = result {
        error!(error = %e, "subscription stopped");
        return Err(e.into());
    }
    info!("shut down cleanly");
    Ok(())
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
