//! Panel 2 (Analysis): close with moving averages, daily volume.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use stockdash_core::{format_usd, DashboardView};

use crate::app::AppState;
use crate::theme;
use crate::ui::{price_charts, ready_view};

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(view) = ready_view(f, area, app) else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Percentage(60),
            Constraint::Min(5),
        ])
        .split(area);

    render_latest(f, chunks[0], view);
    price_charts::render_moving_averages(f, chunks[1], &view.series);
    price_charts::render_volume(f, chunks[2], &view.series);
}

/// Latest close alongside the latest defined MA values.
fn render_latest(f: &mut Frame, area: Rect, view: &DashboardView) {
    let latest = |column: Option<&[Option<f64>]>| {
        column
            .and_then(|c| c.last().copied().flatten())
            .filter(|v| v.is_finite())
            .map(format_usd)
            .unwrap_or_else(|| "n/a".to_string())
    };

    let line = Line::from(vec![
        Span::styled(view.title(), theme::accent_bold()),
        Span::styled("  Close ", theme::muted()),
        Span::styled(format_usd(view.summary.current), theme::accent()),
        Span::styled("  MA20 ", theme::muted()),
        Span::styled(latest(view.series.ma20()), theme::neutral()),
        Span::styled("  MA50 ", theme::muted()),
        Span::styled(latest(view.series.ma50()), theme::warning()),
    ]);
    f.render_widget(Paragraph::new(line), area);
}
