use crate::dispatcher::Dispatcher;
use crate::ntfy::{EventKind, NtfyEvent};
use crate::slack::SlackMessage;
use tracing::{debug, error, info, warn};

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum LineOutcome {
    Blank,
    Undecodable,
    Open,
    Keepalive,
    Dispatched { id: String },
    Unexpected,
}

/// Classifies one line of the stream. Never blocks on delivery.
pub(crate) fn handle_line(line: &[u8], dispatcher: &Dispatcher) -> LineOutcome {
    let line = line.trim_ascii();
    if line.is_empty() {
        return LineOutcome::Blank;
    }

    let ev = match NtfyEvent::decode(line) {
        Ok(ev) => ev,
        Err(e) => {
            error!(error = %e.source, text = %e.line, "error while processing ntfy message");
            return LineOutcome::Undecodable;
        }
    };

    match ev.event {
        EventKind::Open => {
            info!(topic = %ev.topic, "subscription established");
            LineOutcome::Open
        }
        EventKind::Keepalive => {
            debug!("keepalive");
            LineOutcome::Keepalive
        }
        EventKind::Message => {
            info!(
                id = %ev.id,
                published_at = ?ev.published_at(),
                title = ev.title().unwrap_or_default(),
                body = %ev.message,
                "sending message"
            );
            dispatcher.dispatch(SlackMessage::from(&ev));
            LineOutcome::Dispatched { id: ev.id }
        }
        EventKind::Unknown => {
            warn!(text = %String::from_utf8_lossy(line), "bad message received");
            LineOutcome::Unexpected
        }
    }
}
