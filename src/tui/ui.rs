use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};

use crate::core::state::App;
use crate::core::transcript::plan;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{StatusBar, Transcript};

/// Split the frame into status bar, transcript and input box.
pub fn areas(frame_area: Rect, input_height: u16) -> [Rect; 3] {
    use Constraint::{Length, Min};
    Layout::vertical([Length(1), Min(0), Length(input_height)]).areas(frame_area)
}

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, spinner_frame: usize) {
    let input_height = tui.input_box.calculate_height(frame.area().width);
    let [status_area, transcript_area, input_area] = areas(frame.area(), input_height);

    let view = plan(
        &app.messages,
        app.is_loading,
        app.thread_state,
        app.channel_id.as_deref(),
    );
    Transcript {
        state: &mut tui.transcript,
        view: &view,
        registry: &tui.registry,
        time_format: &tui.time_format,
        spinner_frame,
    }
    .render(frame, transcript_area);

    StatusBar {
        channel_id: app.channel_id.as_deref(),
        connection: app.connection,
        notice: app.notice.as_ref(),
        has_unseen: tui.transcript.has_unseen,
        upload_count: app.uploaded_files.len(),
        sending: app.in_flight_sends,
    }
    .render(frame, status_area);

    tui.input_box.render(frame, input_area);
}

/// Transcript row under screen row `screen_y`, if any.
pub fn hit_test_row(
    screen_y: u16,
    frame_area: Rect,
    input_height: u16,
    scroll_offset_y: u32,
    prefix_heights: &[u32],
) -> Option<usize> {
    let [_, transcript_area, _] = areas(frame_area, input_height);
    if screen_y < transcript_area.y || screen_y >= transcript_area.bottom() {
        return None;
    }
    let content_y = u32::from(screen_y - transcript_area.y) + scroll_offset_y;
    let index = prefix_heights.partition_point(|&end| end <= content_y);
    (index < prefix_heights.len()).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Message;
    use crate::core::status::ConnectionState;
    use crate::test_support::test_app;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn frame_text(app: &App, tui: &mut TuiState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(70, 20)).unwrap();
        terminal.draw(|f| draw_ui(f, app, tui, 0)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn hit_test_maps_screen_rows_to_transcript_rows() {
        let frame = Rect::new(0, 0, 80, 24);
        let prefix = [4, 8, 12];
        // Transcript starts below the one-line status bar.
        assert_eq!(hit_test_row(0, frame, 3, 0, &prefix), None);
        assert_eq!(hit_test_row(1, frame, 3, 0, &prefix), Some(0));
        assert_eq!(hit_test_row(5, frame, 3, 0, &prefix), Some(1));
        assert_eq!(hit_test_row(1, frame, 3, 8, &prefix), Some(2));
        assert_eq!(hit_test_row(20, frame, 3, 0, &prefix), None);
        // Input box rows are never transcript rows.
        assert_eq!(hit_test_row(22, frame, 3, 0, &prefix), None);
        // Offsets past the u16 range still resolve.
        let tall = [70_000, 70_004];
        assert_eq!(hit_test_row(1, frame, 3, 70_000, &tall), Some(1));
    }

    #[test]
    fn empty_channel_shows_empty_state_and_status() {
        let app = test_app();
        let mut tui = TuiState::new(1, "%H:%M".into());
        let text = frame_text(&app, &mut tui);
        assert!(text.contains("No conversation history"));
        assert!(text.contains("#test-channel"));
    }

    #[test]
    fn messages_render_in_order() {
        let mut app = test_app();
        app.connection = ConnectionState::Connected;
        app.messages = vec![Message::human("first question"), Message::ai("first answer")];
        let mut tui = TuiState::new(1, "%H:%M".into());
        let text = frame_text(&app, &mut tui);
        let q = text.find("first question").unwrap();
        let a = text.find("first answer").unwrap();
        assert!(q < a);
    }
}
