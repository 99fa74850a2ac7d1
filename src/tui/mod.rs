//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! translates keyboard events into core `Action`s and performs the
//! `Effect`s that `update` asks for.
//!
//! ## Redraw Strategy
//!
//! - **Animating** (composing indicator visible): draws every ~80ms.
//! - **Idle**: sleeps up to 500ms and only redraws on events, background
//!   actions, or an expired notice.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call, making blinking cursors appear erratic during continuous redraws.

mod component;
mod components;
mod event;
pub mod markdown;
mod tasks;
mod ui;

use log::{debug, info};
use serde_json::Value;
use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;

use crate::backend::{ChatBackend, HttpBackend};
use crate::core::action::{Action, Effect, update};
use crate::core::composer::Presence;
use crate::core::config::ResolvedConfig;
use crate::core::notice::Notice;
use crate::core::state::App;
use crate::core::upload::UploadedFile;
use crate::tui::component::EventHandler;
use crate::tui::components::structured::RowFocus;
use crate::tui::components::{
    InputBox, InputEvent, StructuredCallbacks, StructuredRegistry, TranscriptState,
};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// Modal input mode: determines how keyboard events are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Navigate rows with arrow keys; a selected structured row gets keys
    /// first. Typing auto-switches to Input.
    Cursor,
    /// Text editing in the input box. Esc switches to Cursor.
    Input,
}

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub transcript: TranscriptState,
    pub input_box: InputBox,
    pub input_mode: InputMode,
    pub registry: StructuredRegistry,
    pub time_format: String,
}

impl TuiState {
    pub fn new(scroll_threshold: u16, time_format: String) -> Self {
        Self {
            transcript: TranscriptState::new(scroll_threshold),
            input_box: InputBox::new(),
            input_mode: InputMode::Input, // User expects to type immediately
            registry: StructuredRegistry::with_builtins(),
            time_format,
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol lets Shift+Enter be told apart from Enter.
        // Terminals without it ignore the request.
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

/// Performs effects. Owns the handles the loop needs to talk to the network.
struct Runtime {
    backend: Arc<dyn ChatBackend>,
    tx: mpsc::Sender<Action>,
    feed: Option<tokio::task::AbortHandle>,
}

impl Runtime {
    fn subscribe(&mut self, channel_id: String) {
        if let Some(previous) = self.feed.take() {
            previous.abort();
        }
        self.feed = Some(tasks::spawn_feed(
            self.backend.clone(),
            channel_id,
            self.tx.clone(),
        ));
    }

    fn signal(&self, app: &App, presence: Presence) {
        if let Some(channel) = &app.channel_id {
            debug!("Presence: {:?}", presence);
            tasks::spawn_typing(
                self.backend.clone(),
                channel.clone(),
                presence == Presence::Typing,
            );
        }
    }

    /// Apply one action and perform its effect. Returns `true` to quit.
    ///
    /// The input box gate is refreshed right away, so a second Enter in the
    /// same batch of terminal events sees the state the first one caused.
    fn dispatch(&mut self, app: &mut App, tui: &mut TuiState, action: Action) -> bool {
        let replaced = matches!(action, Action::Snapshot(_));
        let effect = update(app, action);
        if replaced {
            tui.transcript.reset();
            tui.registry.transcript_replaced(&app.messages);
        }
        tui.input_box.gate = app.input_gate();
        tui.input_box.placeholder = app.placeholder();

        match effect {
            Effect::None => {}
            Effect::Quit => return true,
            Effect::Send(text) => tasks::spawn_send(
                self.backend.clone(),
                text,
                app.user_id.clone(),
                app.channel_id.clone(),
                self.tx.clone(),
            ),
            Effect::RestoreDraft(text) => {
                tui.input_box.restore(&text);
                tui.input_mode = InputMode::Input;
            }
            Effect::Subscribe(channel_id) => {
                // A different conversation starts at its newest message.
                tui.transcript.follow.follow();
                self.subscribe(channel_id);
            }
        }
        false
    }

    fn shutdown(&mut self) {
        if let Some(feed) = self.feed.take() {
            feed.abort();
        }
    }
}

/// Offer `event` to the structured renderer of the selected row.
///
/// Returns the actions its callbacks produced, or `None` if the row has no
/// renderer or the renderer ignored the event.
fn dispatch_structured(app: &App, tui: &mut TuiState, event: &TuiEvent) -> Option<Vec<Action>> {
    let index = tui.transcript.selected?;
    let message = app.messages.get(index)?;
    let tag = message.component()?;

    let mut options = Vec::new();
    let mut uploads = None;
    let mut submitted = None;
    let mut notices = Vec::new();
    let consumed = {
        let mut on_option_selected = |value: Value| options.push(value);
        let mut on_uploaded_files_changed = |files: Vec<UploadedFile>| uploads = Some(files);
        let mut on_files_submitted = |files: Vec<UploadedFile>| submitted = Some(files);
        let mut on_notice = |notice: Notice| notices.push(notice);
        let mut callbacks = StructuredCallbacks {
            on_option_selected: &mut on_option_selected,
            on_uploaded_files_changed: &mut on_uploaded_files_changed,
            on_files_submitted: &mut on_files_submitted,
            on_notice: &mut on_notice,
        };
        tui.registry.handle_event(
            tag,
            message,
            RowFocus {
                row: index,
                selected: true,
            },
            event,
            &mut callbacks,
        )
    };
    if !consumed {
        return None;
    }
    tui.transcript.layout.invalidate();

    let mut actions: Vec<Action> = options.into_iter().map(Action::OptionSelected).collect();
    actions.extend(uploads.map(Action::UploadsChanged));
    actions.extend(submitted.map(Action::UploadsSubmitted));
    actions.extend(notices.into_iter().map(Action::Notify));
    Some(actions)
}

/// Route one terminal event. Returns `true` to quit.
fn handle_event(
    event: TuiEvent,
    app: &mut App,
    tui: &mut TuiState,
    runtime: &mut Runtime,
    frame_area: ratatui::layout::Rect,
) -> bool {
    match event {
        TuiEvent::Resize => return false,
        TuiEvent::ForceQuit => return runtime.dispatch(app, tui, Action::Quit),
        TuiEvent::MouseMove(_, row) | TuiEvent::MouseClick(_, row) => {
            let hit = ui::hit_test_row(
                row,
                frame_area,
                tui.input_box.calculate_height(frame_area.width),
                tui.transcript.absolute_offset(),
                &tui.transcript.layout.prefix_heights,
            );
            if matches!(event, TuiEvent::MouseMove(..)) {
                tui.transcript.hovered = hit;
            } else if hit.is_some() {
                tui.transcript.selected = hit;
                if tui.input_mode == InputMode::Input {
                    tui.input_mode = InputMode::Cursor;
                    let presence = tui.input_box.blur();
                    runtime.signal(app, presence);
                }
            }
            return false;
        }
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown
        | TuiEvent::ScrollToBottom => {
            tui.transcript.handle_event(&event);
            return false;
        }
        _ => {}
    }

    match tui.input_mode {
        InputMode::Input => {
            if matches!(event, TuiEvent::Escape) {
                tui.input_mode = InputMode::Cursor;
                let presence = tui.input_box.blur();
                runtime.signal(app, presence);
                tui.transcript.select_prev(app.messages.len());
                return false;
            }
            route_input(event, app, tui, runtime)
        }
        InputMode::Cursor => {
            if let Some(actions) = dispatch_structured(app, tui, &event) {
                for action in actions {
                    if runtime.dispatch(app, tui, action) {
                        return true;
                    }
                }
                return false;
            }
            match event {
                TuiEvent::Escape => tui.transcript.selected = None,
                TuiEvent::CursorUp => tui.transcript.select_prev(app.messages.len()),
                TuiEvent::CursorDown => tui.transcript.select_next(app.messages.len()),
                TuiEvent::CursorEnd => {
                    tui.transcript.handle_event(&TuiEvent::ScrollToBottom);
                }
                TuiEvent::Submit => {
                    tui.input_mode = InputMode::Input;
                    tui.transcript.selected = None;
                }
                TuiEvent::InputChar(_) | TuiEvent::Paste(_) => {
                    tui.input_mode = InputMode::Input;
                    tui.transcript.selected = None;
                    return route_input(event, app, tui, runtime);
                }
                _ => {}
            }
            false
        }
    }
}

fn route_input(event: TuiEvent, app: &mut App, tui: &mut TuiState, runtime: &mut Runtime) -> bool {
    match tui.input_box.handle_event(&event) {
        Some(InputEvent::Submit(submission)) => {
            runtime.dispatch(app, tui, Action::Submit(submission.text))
        }
        Some(InputEvent::Presence(presence)) => {
            runtime.signal(app, presence);
            false
        }
        Some(InputEvent::Edited) | None => false,
    }
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let backend: Arc<dyn ChatBackend> = Arc::new(HttpBackend::new(config.base_url.clone()));
    info!("Backend: {} at {}", backend.name(), config.base_url);

    let mut app = App::from_config(&config);
    let mut tui = TuiState::new(config.scroll_threshold, config.time_format.clone());

    let (tx, rx) = mpsc::channel();
    let mut runtime = Runtime {
        backend,
        tx,
        feed: None,
    };
    if let Some(channel_id) = app.channel_id.clone() {
        runtime.subscribe(channel_id);
    }

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    let start_time = Instant::now();
    let mut needs_redraw = true;

    'event_loop: loop {
        tui.input_box.gate = app.input_gate();
        tui.input_box.placeholder = app.placeholder();

        let animating = app.is_loading;
        if animating {
            needs_redraw = true;
        }

        if needs_redraw {
            let spinner_frame = (start_time.elapsed().as_secs_f32() * 4.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui, spinner_frame))?;
            needs_redraw = false;
        }

        let timeout = if animating {
            Duration::from_millis(80)
        } else {
            Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        let frame_area = terminal.get_frame().area();
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if handle_event(event, &mut app, &mut tui, &mut runtime, frame_area) {
                break 'event_loop;
            }
        }

        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            if runtime.dispatch(&mut app, &mut tui, action) {
                break 'event_loop;
            }
        }

        let had_notice = app.notice.is_some();
        runtime.dispatch(&mut app, &mut tui, Action::Tick(Instant::now()));
        if had_notice && app.notice.is_none() {
            needs_redraw = true;
        }
    }

    runtime.shutdown();
    ratatui::restore();
    Ok(())
}
