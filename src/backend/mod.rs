//! # Backend
//!
//! The external collaborators the chat core talks to: the send operation,
//! typing signals, and the event feed. [`ChatBackend`] is the seam; the
//! shipped implementation is [`HttpBackend`] (JSON over HTTP plus a
//! server-sent-events stream).

pub mod client;
pub mod http;
pub mod sse;
pub mod types;

pub use client::{BackendError, ChatBackend};
pub use http::HttpBackend;
pub use types::{FeedEvent, SendReply, SendRequest};
