//! Panel 3 (Help): keyboard shortcuts.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, _app: &AppState) {
    let mut lines: Vec<Line> = Vec::new();

    section(&mut lines, "Global Navigation");
    key(&mut lines, "1-3", "Switch to panel by number");
    key(&mut lines, "Tab / Shift+Tab", "Cycle panels forward / back");
    key(&mut lines, "r", "Reload the current selection");
    key(&mut lines, "e", "Open error history overlay");
    key(&mut lines, "q", "Quit");
    lines.push(Line::from(""));

    section(&mut lines, "Sidebar");
    key(&mut lines, "j / k", "Move focus: company, start date, end date");
    key(&mut lines, "h / l", "Previous / next company, or date -1 / +1 day");
    key(&mut lines, "H / L", "Date -30 / +30 days");
    key(&mut lines, "Enter", "Type a date (YYYY-MM-DD) for the focused field");
    key(&mut lines, "t", "Reset the range to the default lookback");
    lines.push(Line::from(""));

    section(&mut lines, "Panel 1: Overview");
    key(&mut lines, "", "Current price, period high, period low");
    key(&mut lines, "", "Closing price as line, points and trend");
    lines.push(Line::from(""));

    section(&mut lines, "Panel 2: Analysis");
    key(&mut lines, "", "Close with 20- and 50-day moving averages");
    key(&mut lines, "", "Daily trading volume");
    lines.push(Line::from(""));

    section(&mut lines, "Notes");
    key(&mut lines, "MA20 / MA50", "Undefined for the first 19 / 49 trading days");
    key(&mut lines, "End date", "Exclusive: the last bar is the day before");

    let para = Paragraph::new(lines);
    f.render_widget(para, area);
}

fn section<'a>(lines: &mut Vec<Line<'a>>, title: &str) {
    lines.push(Line::from(Span::styled(title.to_string(), theme::accent_bold())));
}

fn key<'a>(lines: &mut Vec<Line<'a>>, keys: &str, desc: &str) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {:>20}  ", keys), theme::accent()),
        Span::styled(desc.to_string(), theme::muted()),
    ]));
}
