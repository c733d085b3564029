//! Panel 1 (Overview): metric cards and three renderings of the close series.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, GraphType, Paragraph};

use stockdash_core::{format_usd, DashboardView};

use crate::app::AppState;
use crate::theme::{self, Theme};
use crate::ui::{price_charts, ready_view};

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(view) = ready_view(f, area, app) else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Min(6),
        ])
        .split(area);

    render_title(f, chunks[0], view);
    render_cards(f, chunks[1], view);

    price_charts::render_close(
        f,
        chunks[2],
        &view.series,
        "Closing price",
        Marker::Braille,
        GraphType::Line,
    );

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[3]);
    price_charts::render_close(
        f,
        bottom[0],
        &view.series,
        "Closing price (points)",
        Marker::Block,
        GraphType::Scatter,
    );
    price_charts::render_close_sparkline(f, bottom[1], &view.series, "Closing price (trend)");
}

fn render_title(f: &mut Frame, area: Rect, view: &DashboardView) {
    let line = Line::from(vec![
        Span::styled(view.title(), theme::accent_bold()),
        Span::styled(format!("  {}  ", view.range), theme::muted()),
        Span::styled(format!("{} trading days", view.series.len()), theme::muted()),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_cards(f: &mut Frame, area: Rect, view: &DashboardView) {
    let palette = Theme::default();
    let summary = &view.summary;
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let current_color =
        palette.range_position_color(summary.current, summary.period_low, summary.period_high);
    metric_card(f, cards[0], "Current price", summary.current, Style::default().fg(current_color));
    metric_card(f, cards[1], "Period high", summary.period_high, theme::positive());
    metric_card(f, cards[2], "Period low", summary.period_low, theme::negative());
}

fn metric_card(f: &mut Frame, area: Rect, label: &str, value: f64, style: Style) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::muted())
        .title(format!(" {label} "))
        .title_style(theme::muted());
    let para = Paragraph::new(Span::styled(
        format_usd(value),
        style.add_modifier(Modifier::BOLD),
    ))
    .block(block);
    f.render_widget(para, area);
}
