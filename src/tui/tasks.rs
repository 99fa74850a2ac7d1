//! Background network work. Every task reports back to the event loop as
//! `Action`s over the std channel; nothing here touches UI state.

use std::sync::{Arc, mpsc};
use std::time::Duration;

use log::{debug, info, warn};

use crate::backend::{BackendError, ChatBackend, FeedEvent, SendReply, SendRequest};
use crate::core::action::{Action, SendOutcome};
use crate::core::status::ConnectionState;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);
const FEED_BUFFER: usize = 64;

pub fn send_outcome(result: Result<SendReply, BackendError>) -> SendOutcome {
    match result {
        Ok(reply) if reply.success => SendOutcome::Accepted {
            channel_id: reply.channel_id,
        },
        Ok(_) => SendOutcome::Rejected,
        Err(e) => SendOutcome::Failed(e.to_string()),
    }
}

fn action_for(event: FeedEvent) -> Action {
    match event {
        FeedEvent::Opened => Action::ConnectionChanged(ConnectionState::Connected),
        FeedEvent::Snapshot(messages) => Action::Snapshot(messages),
        FeedEvent::Message(message) => Action::MessageReceived(message),
        FeedEvent::Loading(is_loading) => Action::LoadingChanged(is_loading),
        FeedEvent::ThreadState(state) => Action::ThreadStateChanged(state),
        FeedEvent::Status {
            process_status,
            input_disabled,
        } => Action::StatusChanged {
            process_status,
            input_disabled,
        },
    }
}

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}

/// Deliver one submission. The loop hears back through `SendFinished`.
pub fn spawn_send(
    backend: Arc<dyn ChatBackend>,
    text: String,
    user_id: Option<String>,
    channel_id: Option<String>,
    tx: mpsc::Sender<Action>,
) {
    info!("Spawning send via {} ({} chars)", backend.name(), text.len());
    tokio::spawn(async move {
        if let Some(channel) = &channel_id
            && let Err(e) = backend.set_typing(channel, false).await
        {
            debug!("Stop-typing before send failed: {}", e);
        }

        let request = SendRequest {
            content: &text,
            user_id: user_id.as_deref(),
            channel_id: channel_id.as_deref(),
        };
        let outcome = send_outcome(backend.send(request).await);
        debug!("Send finished: {:?}", outcome);

        if tx.send(Action::SendFinished { text, outcome }).is_err() {
            warn!("Failed to report send result: receiver dropped");
        }
    });
}

/// Fire-and-forget typing signal. Failures are only logged.
pub fn spawn_typing(backend: Arc<dyn ChatBackend>, channel_id: String, typing: bool) {
    tokio::spawn(async move {
        if let Err(e) = backend.set_typing(&channel_id, typing).await {
            debug!("Typing signal ({}) for {} failed: {}", typing, channel_id, e);
        }
    });
}

/// Keep a feed open for `channel_id`, reconnecting with capped exponential
/// backoff. Runs until the loop's receiver is gone or the task is aborted.
pub fn spawn_feed(
    backend: Arc<dyn ChatBackend>,
    channel_id: String,
    tx: mpsc::Sender<Action>,
) -> tokio::task::AbortHandle {
    info!("Subscribing to channel {}", channel_id);
    let handle = tokio::spawn(async move {
        if tx
            .send(Action::ConnectionChanged(ConnectionState::Connecting))
            .is_err()
        {
            return;
        }
        let mut backoff = INITIAL_BACKOFF;

        loop {
            let (feed_tx, mut feed_rx) = tokio::sync::mpsc::channel(FEED_BUFFER);
            let stream = backend.stream_events(&channel_id, feed_tx);
            let forward = async {
                let mut opened = false;
                while let Some(event) = feed_rx.recv().await {
                    opened |= event == FeedEvent::Opened;
                    if tx.send(action_for(event)).is_err() {
                        return None;
                    }
                }
                Some(opened)
            };

            let (result, forwarded) = tokio::join!(stream, forward);
            let Some(opened) = forwarded else {
                info!("Event loop gone; feed for {} stops", channel_id);
                return;
            };
            match result {
                Ok(()) => info!("Feed for {} ended", channel_id),
                Err(e) => warn!("Feed for {} failed: {}", channel_id, e),
            }

            if opened {
                backoff = INITIAL_BACKOFF;
            }
            if tx
                .send(Action::ConnectionChanged(ConnectionState::Reconnecting))
                .is_err()
            {
                return;
            }
            info!("Reconnecting to {} in {:?}", channel_id, backoff);
            tokio::time::sleep(backoff).await;
            backoff = next_backoff(backoff);
        }
    });
    handle.abort_handle()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Message;
    use crate::test_support::ScriptedBackend;

    #[test]
    fn backoff_doubles_up_to_cap() {
        let mut delay = INITIAL_BACKOFF;
        let mut seen = Vec::new();
        for _ in 0..7 {
            seen.push(delay.as_secs());
            delay = next_backoff(delay);
        }
        assert_eq!(seen, vec![1, 2, 4, 8, 16, 30, 30]);
    }

    #[test]
    fn outcome_maps_reply_and_errors() {
        let accepted = send_outcome(Ok(SendReply {
            success: true,
            channel_id: Some("c".into()),
        }));
        assert_eq!(
            accepted,
            SendOutcome::Accepted {
                channel_id: Some("c".into())
            }
        );
        let rejected = send_outcome(Ok(SendReply {
            success: false,
            channel_id: None,
        }));
        assert_eq!(rejected, SendOutcome::Rejected);
        let failed = send_outcome(Err(BackendError::Network("down".into())));
        assert!(matches!(failed, SendOutcome::Failed(reason) if reason.contains("down")));
    }

    #[test]
    fn feed_events_become_actions() {
        assert_eq!(
            action_for(FeedEvent::Opened),
            Action::ConnectionChanged(ConnectionState::Connected)
        );
        assert_eq!(
            action_for(FeedEvent::Message(Message::ai("hi"))),
            Action::MessageReceived(Message::ai("hi"))
        );
        assert_eq!(action_for(FeedEvent::Loading(true)), Action::LoadingChanged(true));
    }

    #[tokio::test]
    async fn send_task_reports_outcome() {
        let backend = Arc::new(ScriptedBackend::rejecting());
        let (tx, rx) = mpsc::channel();
        spawn_send(
            backend.clone(),
            "hello".into(),
            Some("u".into()),
            Some("c".into()),
            tx,
        );

        let action = tokio::task::spawn_blocking(move || rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            action,
            Action::SendFinished {
                text: "hello".into(),
                outcome: SendOutcome::Rejected,
            }
        );
        assert_eq!(backend.sent(), vec!["hello".to_string()]);
    }
}
