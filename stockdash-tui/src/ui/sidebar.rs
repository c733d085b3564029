//! Sidebar: company selector and the two date inputs.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::app::{AppState, Field};
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let warning_height = if app.catalog_warning.is_some() { 5 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(4),
            Constraint::Length(4),
            Constraint::Length(warning_height),
        ])
        .split(area);

    render_companies(f, chunks[0], app);
    render_dates(f, chunks[1], app);
    if let Some(warning) = &app.catalog_warning {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme::warning())
            .title(" Catalog ")
            .title_style(theme::warning());
        let para = Paragraph::new(Span::styled(warning.as_str(), theme::warning()))
            .block(block)
            .wrap(Wrap { trim: true });
        f.render_widget(para, chunks[2]);
    }
}

fn render_companies(f: &mut Frame, area: Rect, app: &AppState) {
    let focused = app.focus == Field::Company;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(focused))
        .title(format!(" {} ({}) ", Field::Company.label(), app.catalog.len()))
        .title_style(theme::panel_title(focused));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let names = app.company_names();
    let height = inner.height as usize;
    let (start, end) = visible_window(names.len(), app.company_idx, height);

    let lines: Vec<Line> = names[start..end]
        .iter()
        .enumerate()
        .map(|(offset, name)| {
            let idx = start + offset;
            let ticker = app.catalog.get(name).unwrap_or_default();
            if idx == app.company_idx {
                Line::from(vec![
                    Span::styled("> ", theme::accent()),
                    Span::styled(format!("{name} "), theme::selected(focused)),
                    Span::styled(ticker.to_string(), theme::muted()),
                ])
            } else {
                Line::from(vec![
                    Span::raw("  "),
                    Span::styled(format!("{name} "), theme::text()),
                    Span::styled(ticker.to_string(), theme::muted()),
                ])
            }
        })
        .collect();

    f.render_widget(Paragraph::new(lines), inner);
}

fn render_dates(f: &mut Frame, area: Rect, app: &AppState) {
    let focused = matches!(app.focus, Field::Start | Field::End);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(focused))
        .title(" Date range ")
        .title_style(theme::panel_title(focused));

    let date_style = if app.range.is_inverted() {
        theme::warning()
    } else {
        theme::text()
    };

    let line = |field: Field, date: chrono::NaiveDate| {
        let is_focus = app.focus == field;
        Line::from(vec![
            Span::styled(
                if is_focus { "> " } else { "  " },
                theme::accent(),
            ),
            Span::styled(format!("{:<11}", field.label()), theme::muted()),
            Span::styled(
                date.format("%Y-%m-%d").to_string(),
                if is_focus { theme::selected(true) } else { date_style },
            ),
        ])
    };

    let lines = vec![line(Field::Start, app.range.start), line(Field::End, app.range.end)];
    f.render_widget(Paragraph::new(lines).block(block), area);
}

/// `[start, end)` of the rows to show so the cursor stays visible.
pub fn visible_window(len: usize, cursor: usize, height: usize) -> (usize, usize) {
    if height == 0 || len == 0 {
        return (0, 0);
    }
    if len <= height {
        return (0, len);
    }
    let half = height / 2;
    let start = cursor.saturating_sub(half).min(len - height);
    (start, start + height)
}
