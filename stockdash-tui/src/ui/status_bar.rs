//! Bottom status bar: last error/status message, panel hints.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::{AppState, StatusLevel, ViewState};
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let mut spans: Vec<Span> = Vec::new();

    // Panel hints
    spans.push(Span::styled(
        " 1:Overview 2:Analysis 3:Help r:Refresh e:Errors q:Quit",
        theme::muted(),
    ));

    if matches!(app.view, ViewState::Loading(_)) {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled("loading", theme::neutral()));
    }

    // Separator
    spans.push(Span::raw(" | "));

    // Status message
    if let Some((msg, level)) = &app.status_message {
        let style = match level {
            StatusLevel::Info => theme::accent(),
            StatusLevel::Warning => theme::warning(),
            StatusLevel::Error => theme::negative(),
        };
        spans.push(Span::styled(msg.as_str(), style));
    }

    let line = Line::from(spans);
    let para = Paragraph::new(line);
    f.render_widget(para, area);
}
