//! # TUI Components
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Receive all data as fields and are rebuilt every frame:
//! - `StatusBar`: channel, connection, notices, "↓ New"
//! - `MessageBubble`: one transcript row
//! - `ComposingIndicator`: "AI is composing" row
//! - `EmptyState`: copy shown when there is nothing to list
//!
//! ### Stateful Components (Event-Driven)
//!
//! Persistent state in `TuiState`, wrapped by a transient component per frame:
//! - `InputBox`: draft editing on top of `Composer`
//! - `Transcript`: scrollable rows with layout caching and follow-the-bottom
//! - `structured`: renderers for rows carrying a component tag
//!
//! ```text
//! components/
//! ├── mod.rs
//! ├── status_bar.rs
//! ├── message.rs
//! ├── composing.rs
//! ├── empty_state.rs
//! ├── transcript.rs
//! ├── input_box/
//! └── structured/
//! ```

pub mod composing;
pub mod empty_state;
pub mod input_box;
pub mod message;
pub mod status_bar;
pub mod structured;
pub mod transcript;

pub use input_box::{InputBox, InputEvent};
pub use status_bar::StatusBar;
pub use structured::{StructuredCallbacks, StructuredRegistry};
pub use transcript::{Transcript, TranscriptState};
