//! Top-level UI layout: sidebar, active panel, status bar, overlays.

pub mod analysis_panel;
pub mod help_panel;
pub mod overlays;
pub mod overview_panel;
pub mod price_charts;
pub mod sidebar;
pub mod status_bar;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use stockdash_core::DashboardView;

use crate::app::{AppState, Overlay, Panel, ViewState};
use crate::theme;

const SIDEBAR_WIDTH: u16 = 30;

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &AppState) {
    // Split: main area + 1-line status bar.
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(chunks[0]);

    sidebar::render(f, body[0], app);
    draw_panel(f, body[1], app);
    status_bar::render(f, chunks[1], app);

    // Draw overlays on top.
    match app.overlay {
        Overlay::ErrorHistory => overlays::render_error_history(f, chunks[0], app),
        Overlay::DateEntry(field) => overlays::render_date_entry(f, chunks[0], field, &app.date_input),
        Overlay::None => {}
    }
}

/// Draw the active panel with its border.
fn draw_panel(f: &mut Frame, area: Rect, app: &AppState) {
    let panel = app.active_panel;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(true))
        .title(format!(" {} [{}] ", panel.label(), panel.index() + 1))
        .title_style(theme::panel_title(true));

    let inner = block.inner(area);
    f.render_widget(block, area);

    match panel {
        Panel::Overview => overview_panel::render(f, inner, app),
        Panel::Analysis => analysis_panel::render(f, inner, app),
        Panel::Help => help_panel::render(f, inner, app),
    }
}

/// Return the view when results are ready; otherwise draw the loading,
/// no-data or error message in `area` and return `None`.
pub(crate) fn ready_view<'a>(f: &mut Frame, area: Rect, app: &'a AppState) -> Option<&'a DashboardView> {
    let lines = match &app.view {
        ViewState::Ready(view) => return Some(&**view),
        ViewState::Loading(selection) => vec![Line::from(Span::styled(
            format!("Loading {} ({})...", selection.company, selection.range),
            theme::muted(),
        ))],
        ViewState::NoData {
            company,
            ticker,
            range,
        } => vec![
            Line::from(Span::styled(
                format!("No price data for {company} ({ticker})"),
                theme::warning(),
            )),
            Line::from(""),
            Line::from(Span::styled(
                format!("The provider returned no trading days for {range}."),
                theme::muted(),
            )),
            Line::from(Span::styled(
                "Adjust the date range or pick another company.",
                theme::muted(),
            )),
        ],
        ViewState::Failed { selection, message } => vec![
            Line::from(Span::styled(
                format!("Error loading {}", selection.company),
                theme::accent_bold(),
            )),
            Line::from(""),
            Line::from(Span::styled(message.as_str(), theme::negative())),
        ],
    };

    let mut padded = vec![Line::from("")];
    padded.extend(lines);
    f.render_widget(Paragraph::new(padded).wrap(Wrap { trim: true }), area);
    None
}

/// Compute a centered rect for overlays.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
