//! Keyboard input dispatch: overlays → global keys → sidebar handlers.

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{AppState, Field, Overlay, Panel};

/// Days moved by `H` / `L` on a date field.
const LARGE_STEP_DAYS: i64 = 30;

/// Handle a key event.
pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // 1. Overlays consume input first.
    match app.overlay {
        Overlay::ErrorHistory => {
            handle_error_overlay(app, key);
            return;
        }
        Overlay::DateEntry(field) => {
            handle_date_overlay(app, field, key);
            return;
        }
        Overlay::None => {}
    }

    // 2. Global keys (always available).
    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Char('1') => { app.active_panel = Panel::Overview; return; }
        KeyCode::Char('2') => { app.active_panel = Panel::Analysis; return; }
        KeyCode::Char('3') => { app.active_panel = Panel::Help; return; }
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.active_panel = app.active_panel.prev();
            } else {
                app.active_panel = app.active_panel.next();
            }
            return;
        }
        KeyCode::BackTab => {
            app.active_panel = app.active_panel.prev();
            return;
        }
        KeyCode::Char('e') => {
            app.error_scroll = 0;
            app.overlay = Overlay::ErrorHistory;
            return;
        }
        KeyCode::Char('r') => {
            app.request_refresh();
            return;
        }
        _ => {}
    }

    // 3. Sidebar keys, shared by every panel.
    handle_sidebar_key(app, key);
}

fn handle_error_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('e') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.error_scroll + 1 < app.error_history.len() {
                app.error_scroll += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.error_scroll = app.error_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

fn handle_date_overlay(app: &mut AppState, field: Field, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.overlay = Overlay::None;
            app.date_input.clear();
        }
        KeyCode::Enter => {
            let input = app.date_input.trim().to_string();
            match NaiveDate::parse_from_str(&input, "%Y-%m-%d") {
                Ok(date) => {
                    app.overlay = Overlay::None;
                    app.date_input.clear();
                    app.set_date(field, date);
                }
                Err(_) => {
                    app.set_warning(format!("'{input}' is not a YYYY-MM-DD date"));
                }
            }
        }
        KeyCode::Backspace => {
            app.date_input.pop();
        }
        KeyCode::Char(c) if (c.is_ascii_digit() || c == '-') && app.date_input.len() < 10 => {
            app.date_input.push(c);
        }
        _ => {}
    }
}

fn handle_sidebar_key(app: &mut AppState, key: KeyEvent) {
    let field = app.focus;

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.focus = field.next(),
        KeyCode::Char('k') | KeyCode::Up => app.focus = field.prev(),
        KeyCode::Char('l') | KeyCode::Right => step(app, field, 1),
        KeyCode::Char('h') | KeyCode::Left => step(app, field, -1),
        KeyCode::Char('L') => step(app, field, LARGE_STEP_DAYS),
        KeyCode::Char('H') => step(app, field, -LARGE_STEP_DAYS),
        KeyCode::Enter => {
            if let Some(date) = match field {
                Field::Start => Some(app.range.start),
                Field::End => Some(app.range.end),
                Field::Company => None,
            } {
                app.date_input = date.format("%Y-%m-%d").to_string();
                app.overlay = Overlay::DateEntry(field);
            }
        }
        KeyCode::Char('t') => app.reset_range(chrono::Local::now().date_naive()),
        _ => {}
    }
}

fn step(app: &mut AppState, field: Field, amount: i64) {
    match field {
        Field::Company => app.cycle_company(amount.signum() as isize),
        Field::Start | Field::End => app.shift_date(field, amount),
    }
}
