use ratatui::Frame;
use ratatui::layout::Rect;

/// Something that draws itself into a frame region.
///
/// `render` takes `&mut self` so components can refresh caches (row heights,
/// scroll offsets) during the draw, the way ratatui's `StatefulWidget` does.
pub trait Component {
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// Something that consumes terminal events and may report a higher-level one.
pub trait EventHandler {
    type Event;

    fn handle_event(&mut self, event: &super::event::TuiEvent) -> Option<Self::Event>;
}
