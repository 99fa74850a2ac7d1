//! # Core Application Logic
//!
//! Parlor's chat logic. It knows nothing about any specific UI technology
//! or transport.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Message model        │
//!                    │  • Transcript planning  │
//!                    │  • Scroll follow        │
//!                    │  • Composer (draft)     │
//!                    │  • update() (reducer)   │
//!                    │                         │
//!                    │  No I/O. No UI.         │
//!                    └───────────┬─────────────┘
//!                                │
//!                  ┌─────────────┴─────────────┐
//!                  ▼                           ▼
//!           ┌────────────┐              ┌────────────┐
//!           │    TUI     │              │  Backend   │
//!           │  Adapter   │              │ (HTTP/SSE) │
//!           │ (ratatui)  │              │            │
//!           └────────────┘              └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`message`]: the `Message` value and its wire format
//! - [`transcript`]: empty-vs-list decision and per-row plan
//! - [`scroll`]: follow-the-bottom intent
//! - [`composer`]: draft text and the two-phase submit
//! - [`upload`]: upload validation policy
//! - [`state`]: the `App` struct
//! - [`action`]: the `Action` enum and `update()`
//!
//! File I/O is limited to [`config`] and [`upload::inspect`].

pub mod action;
pub mod composer;
pub mod config;
pub mod message;
pub mod notice;
pub mod scroll;
pub mod state;
pub mod status;
pub mod transcript;
pub mod upload;
