//! # Application State
//!
//! Core state for Parlor. Domain data only; presentation state (scroll
//! position, draft cursor, selection) lives in the `tui` module.
//!
//! ```text
//! App
//! ├── messages: Vec<Message>            // transcript snapshot, append-only
//! ├── is_loading: bool                  // assistant is composing
//! ├── thread_state: Option<ThreadState> // observed lifecycle
//! ├── connection: ConnectionState       // event stream status
//! ├── process_status: ProcessStatus     // drives the input placeholder
//! ├── input_disabled: bool              // server-side input lock
//! ├── channel_id: Option<String>        // open session, if any
//! ├── user_id: Option<String>           // forwarded with every send
//! ├── uploaded_files: Vec<UploadedFile> // last list reported by the upload card
//! ├── notice: Option<Notice>            // transient status-bar message
//! └── in_flight_sends: usize            // sends awaiting a result
//! ```
//!
//! State changes only happen through `update(app, action)` in action.rs.

use std::time::Duration;

use crate::core::composer::Gate;
use crate::core::config::ResolvedConfig;
use crate::core::message::Message;
use crate::core::notice::Notice;
use crate::core::status::{ConnectionState, ProcessStatus, ThreadState};
use crate::core::upload::UploadedFile;

pub struct App {
    pub messages: Vec<Message>,
    pub is_loading: bool,
    pub thread_state: Option<ThreadState>,
    pub connection: ConnectionState,
    pub process_status: ProcessStatus,
    pub input_disabled: bool,
    pub channel_id: Option<String>,
    pub user_id: Option<String>,
    pub uploaded_files: Vec<UploadedFile>,
    pub notice: Option<Notice>,
    pub notice_ttl: Duration,
    pub in_flight_sends: usize,
}

impl App {
    pub fn new(channel_id: Option<String>, user_id: Option<String>) -> Self {
        Self {
            messages: Vec::new(),
            is_loading: false,
            thread_state: None,
            connection: ConnectionState::Disconnected,
            process_status: ProcessStatus::default(),
            input_disabled: false,
            channel_id,
            user_id,
            uploaded_files: Vec::new(),
            notice: None,
            notice_ttl: Duration::from_secs(crate::core::config::DEFAULT_NOTICE_SECONDS),
            in_flight_sends: 0,
        }
    }

    pub fn from_config(config: &ResolvedConfig) -> Self {
        let mut app = Self::new(config.channel_id.clone(), config.user_id.clone());
        app.notice_ttl = Duration::from_secs(config.notice_seconds);
        app
    }

    /// Conditions the input box must respect.
    pub fn input_gate(&self) -> Gate {
        Gate {
            disabled: self.input_disabled,
            connection: self.connection,
        }
    }

    /// Placeholder for the input box. Empty while input is disabled.
    pub fn placeholder(&self) -> &'static str {
        if self.input_disabled {
            ""
        } else {
            self.process_status.placeholder()
        }
    }
}
