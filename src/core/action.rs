//! # Actions
//!
//! Everything that can happen in Parlor becomes an `Action`.
//! User presses Enter? That's `Action::Submit(text)`.
//! The feed delivers a message? That's `Action::MessageReceived(message)`.
//!
//! `update()` applies an action to the state and returns an `Effect` telling
//! the event loop which I/O to start. No I/O happens here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use std::time::Instant;

use log::{debug, info, warn};
use serde_json::Value;

use crate::core::message::Message;
use crate::core::notice::Notice;
use crate::core::state::App;
use crate::core::status::{ConnectionState, ProcessStatus, ThreadState};
use crate::core::upload::{CARD_TAG, UploadedFile};

/// How a send attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Accepted for processing. The backend may have opened a channel.
    Accepted { channel_id: Option<String> },
    /// The backend answered but declined the message.
    Rejected,
    /// Transport or server fault.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // User
    Submit(String),
    OptionSelected(Value),
    UploadsChanged(Vec<UploadedFile>),
    /// The user pressed send on the upload card.
    UploadsSubmitted(Vec<UploadedFile>),
    Quit,

    // Background tasks
    SendFinished { text: String, outcome: SendOutcome },
    Snapshot(Vec<Message>),
    MessageReceived(Message),
    LoadingChanged(bool),
    ThreadStateChanged(ThreadState),
    StatusChanged {
        process_status: Option<ProcessStatus>,
        input_disabled: Option<bool>,
    },
    ConnectionChanged(ConnectionState),

    // Local
    Notify(Notice),
    Tick(Instant),
}

/// I/O the event loop should perform after an update.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Quit,
    /// Send this text (stop-typing goes out first).
    Send(String),
    /// A send failed; give the text back to the input box.
    RestoreDraft(String),
    /// Start streaming events for this channel.
    Subscribe(String),
}

/// Text to send for a chosen menu option.
///
/// Options are opaque JSON; strings are used as-is, objects by their
/// `label` (or `value`) field, anything else by its JSON form.
pub fn option_text(option: &Value) -> String {
    match option {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("label")
            .or_else(|| map.get("value"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| option.to_string()),
        other => other.to_string(),
    }
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Submit(text) => {
            app.in_flight_sends += 1;
            if app.channel_id.is_none() {
                // The backend opens a thread for the first message.
                app.connection = ConnectionState::CreatingThread;
            }
            info!("Submitting message ({} chars)", text.len());
            Effect::Send(text)
        }
        Action::OptionSelected(option) => {
            let text = option_text(&option);
            if app.input_gate().blocks_submit() {
                app.notice = Some(Notice::error("Not connected yet. Try again in a moment."));
                return Effect::None;
            }
            info!("Menu option selected: {}", text);
            app.in_flight_sends += 1;
            Effect::Send(text)
        }
        Action::UploadsChanged(files) => {
            debug!("Upload list now has {} file(s)", files.len());
            app.uploaded_files = files;
            Effect::None
        }
        Action::UploadsSubmitted(files) => {
            let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
            info!("Upload submitted: {}", names.join(", "));
            app.notice = Some(Notice::info(format!(
                "{} file(s) submitted: {}",
                files.len(),
                names.join(", ")
            )));
            Effect::None
        }
        Action::Quit => Effect::Quit,

        Action::SendFinished { text, outcome } => {
            app.in_flight_sends = app.in_flight_sends.saturating_sub(1);
            if app.connection == ConnectionState::CreatingThread {
                app.connection = ConnectionState::Disconnected;
            }
            match outcome {
                SendOutcome::Accepted { channel_id } => {
                    // No local echo: the message arrives through the feed.
                    match channel_id {
                        Some(id) if app.channel_id.is_none() => {
                            info!("Backend opened channel {}", id);
                            app.channel_id = Some(id.clone());
                            Effect::Subscribe(id)
                        }
                        _ => Effect::None,
                    }
                }
                SendOutcome::Rejected => {
                    warn!("Send rejected by backend");
                    app.notice = Some(Notice::error(
                        "Message could not be sent. Please try again.",
                    ));
                    Effect::RestoreDraft(text)
                }
                SendOutcome::Failed(reason) => {
                    warn!("Send failed: {}", reason);
                    app.notice = Some(Notice::error(format!(
                        "Error while sending message: {reason}"
                    )));
                    Effect::RestoreDraft(text)
                }
            }
        }
        Action::Snapshot(messages) => {
            debug!("Snapshot replaced transcript ({} messages)", messages.len());
            // Uploads belong to a card; without one they have nowhere to go.
            if !messages.iter().any(|m| m.component() == Some(CARD_TAG)) {
                app.uploaded_files.clear();
            }
            app.messages = messages;
            Effect::None
        }
        Action::MessageReceived(message) => {
            app.messages.push(message);
            Effect::None
        }
        Action::LoadingChanged(is_loading) => {
            app.is_loading = is_loading;
            Effect::None
        }
        Action::ThreadStateChanged(state) => {
            app.thread_state = Some(state);
            Effect::None
        }
        Action::StatusChanged {
            process_status,
            input_disabled,
        } => {
            if let Some(status) = process_status {
                app.process_status = status;
            }
            if let Some(disabled) = input_disabled {
                app.input_disabled = disabled;
            }
            Effect::None
        }
        Action::ConnectionChanged(state) => {
            debug!("Connection: {:?} -> {:?}", app.connection, state);
            app.connection = state;
            Effect::None
        }

        Action::Notify(notice) => {
            app.notice = Some(notice);
            Effect::None
        }
        Action::Tick(now) => {
            if app
                .notice
                .as_ref()
                .is_some_and(|n| n.is_expired(now, app.notice_ttl))
            {
                app.notice = None;
            }
            Effect::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ChatBackend, SendRequest};
    use crate::core::composer::Composer;
    use crate::core::notice::NoticeLevel;
    use crate::test_support::{ScriptedBackend, test_app};
    use serde_json::json;

    /// Drives one submit through composer → update → backend → update,
    /// the way the event loop does.
    fn submit_through(backend: &ScriptedBackend, app: &mut App, composer: &mut Composer) {
        let submission = composer.begin_submit(app.input_gate()).expect("submittable");
        let Effect::Send(text) = update(app, Action::Submit(submission.text)) else {
            panic!("expected send effect");
        };
        let request = SendRequest {
            content: &text,
            user_id: app.user_id.as_deref(),
            channel_id: app.channel_id.as_deref(),
        };
        let outcome = tokio_test::block_on(backend.send(request));
        let outcome = match outcome {
            Ok(reply) if reply.success => SendOutcome::Accepted {
                channel_id: reply.channel_id,
            },
            Ok(_) => SendOutcome::Rejected,
            Err(e) => SendOutcome::Failed(e.to_string()),
        };
        if let Effect::RestoreDraft(text) = update(app, Action::SendFinished { text, outcome }) {
            composer.restore(&text);
        }
    }

    fn connected_app() -> App {
        let mut app = test_app();
        app.connection = ConnectionState::Connected;
        app
    }

    #[test]
    fn successful_send_clears_draft_without_local_echo() {
        let backend = ScriptedBackend::accepting();
        let mut app = connected_app();
        let mut composer = Composer::new();
        composer.draft_mut().push_str("hello");

        submit_through(&backend, &mut app, &mut composer);

        assert_eq!(composer.draft(), "");
        assert!(app.messages.is_empty(), "no synthetic echo");
        assert!(app.notice.is_none());
        assert_eq!(app.in_flight_sends, 0);
        assert_eq!(backend.sent(), vec!["hello".to_string()]);
    }

    #[test]
    fn rejected_send_restores_draft_and_notifies() {
        let backend = ScriptedBackend::rejecting();
        let mut app = connected_app();
        let mut composer = Composer::new();
        composer.draft_mut().push_str("hello");

        submit_through(&backend, &mut app, &mut composer);

        assert_eq!(composer.draft(), "hello");
        let notice = app.notice.as_ref().expect("failure notice");
        assert_eq!(notice.level, NoticeLevel::Error);
    }

    #[test]
    fn failed_send_restores_draft_and_notifies() {
        let backend = ScriptedBackend::failing();
        let mut app = connected_app();
        let mut composer = Composer::new();
        composer.draft_mut().push_str("hello");

        submit_through(&backend, &mut app, &mut composer);

        assert_eq!(composer.draft(), "hello");
        assert!(app.notice.as_ref().unwrap().text.contains("Error while sending"));
    }

    #[test]
    fn accepted_send_can_open_a_channel() {
        let mut app = connected_app();
        app.channel_id = None;
        app.in_flight_sends = 1;
        let effect = update(
            &mut app,
            Action::SendFinished {
                text: "hi".into(),
                outcome: SendOutcome::Accepted {
                    channel_id: Some("new".into()),
                },
            },
        );
        assert_eq!(effect, Effect::Subscribe("new".into()));
        assert_eq!(app.channel_id.as_deref(), Some("new"));
    }

    #[test]
    fn first_send_without_channel_blocks_until_answered() {
        let mut app = connected_app();
        app.channel_id = None;
        let effect = update(&mut app, Action::Submit("hi".into()));
        assert_eq!(effect, Effect::Send("hi".into()));
        assert_eq!(app.connection, ConnectionState::CreatingThread);
        assert!(app.input_gate().blocks_submit());

        update(
            &mut app,
            Action::SendFinished {
                text: "hi".into(),
                outcome: SendOutcome::Failed("down".into()),
            },
        );
        assert_eq!(app.connection, ConnectionState::Disconnected);
        assert!(!app.input_gate().blocks_submit());
    }

    #[test]
    fn accepted_send_keeps_existing_channel() {
        let mut app = connected_app();
        let effect = update(
            &mut app,
            Action::SendFinished {
                text: "hi".into(),
                outcome: SendOutcome::Accepted {
                    channel_id: Some("other".into()),
                },
            },
        );
        assert_eq!(effect, Effect::None);
        assert_eq!(app.channel_id.as_deref(), Some("test-channel"));
    }

    #[test]
    fn feed_actions_append_in_order() {
        let mut app = test_app();
        update(&mut app, Action::Snapshot(vec![Message::human("a")]));
        update(&mut app, Action::MessageReceived(Message::ai("b")));
        update(&mut app, Action::MessageReceived(Message::ai("b")));
        let bodies: Vec<String> = app.messages.iter().map(|m| m.body.joined()).collect();
        assert_eq!(bodies, vec!["a", "b", "b"]);
    }

    #[test]
    fn status_change_is_partial() {
        let mut app = test_app();
        update(
            &mut app,
            Action::StatusChanged {
                process_status: Some(ProcessStatus::Report),
                input_disabled: None,
            },
        );
        update(
            &mut app,
            Action::StatusChanged {
                process_status: None,
                input_disabled: Some(true),
            },
        );
        assert_eq!(app.process_status, ProcessStatus::Report);
        assert!(app.input_disabled);
    }

    #[test]
    fn option_selection_sends_label() {
        let mut app = connected_app();
        let effect = update(
            &mut app,
            Action::OptionSelected(json!({"label": "Upload files", "id": 2})),
        );
        assert_eq!(effect, Effect::Send("Upload files".into()));

        let effect = update(&mut app, Action::OptionSelected(json!("Skip")));
        assert_eq!(effect, Effect::Send("Skip".into()));
    }

    #[test]
    fn option_selection_blocked_while_connecting() {
        let mut app = test_app();
        app.connection = ConnectionState::Connecting;
        let effect = update(&mut app, Action::OptionSelected(json!("Skip")));
        assert_eq!(effect, Effect::None);
        assert!(app.notice.is_some());
    }

    #[test]
    fn submitted_uploads_are_confirmed() {
        let mut app = test_app();
        let files = vec![crate::core::upload::validate("sales.csv", 10).unwrap()];
        let effect = update(&mut app, Action::UploadsSubmitted(files));
        assert_eq!(effect, Effect::None);
        let notice = app.notice.as_ref().unwrap();
        assert_eq!(notice.level, NoticeLevel::Info);
        assert!(notice.text.contains("sales.csv"));
    }

    #[test]
    fn snapshot_without_card_drops_uploads() {
        let mut app = test_app();
        app.uploaded_files = vec![crate::core::upload::validate("a.csv", 10).unwrap()];

        update(
            &mut app,
            Action::Snapshot(vec![Message::ai("Upload").with_component(CARD_TAG)]),
        );
        assert_eq!(app.uploaded_files.len(), 1);

        update(&mut app, Action::Snapshot(vec![Message::ai("fresh")]));
        assert!(app.uploaded_files.is_empty());
    }

    #[test]
    fn tick_expires_notice() {
        let mut app = test_app();
        let notice = Notice::info("hello");
        let raised = notice.raised_at;
        update(&mut app, Action::Notify(notice));
        let ttl = app.notice_ttl;
        update(&mut app, Action::Tick(raised));
        assert!(app.notice.is_some());
        update(&mut app, Action::Tick(raised + ttl));
        assert!(app.notice.is_none());
    }
}
