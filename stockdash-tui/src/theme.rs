//! Parrot/neon theme tokens for the stockdash TUI
//!
//! # Color Palette
//! - **Background**: Near-black / deep charcoal (base layer)
//! - **Accent**: Electric cyan (primary highlights, focus, close price)
//! - **Positive**: Neon green (near the period high)
//! - **Negative**: Hot pink (near the period low, errors)
//! - **Warning**: Neon orange (alerts, MA50)
//! - **Neutral**: Cool purple (secondary info, MA20)
//! - **Muted**: Steel blue (disabled, secondary text)

use ratatui::style::{Color, Modifier, Style};

pub const BACKGROUND: Color = Color::Rgb(18, 18, 20);
pub const ACCENT: Color = Color::Rgb(0, 255, 255);
pub const POSITIVE: Color = Color::Rgb(0, 255, 128);
pub const NEGATIVE: Color = Color::Rgb(255, 20, 147);
pub const WARNING: Color = Color::Rgb(255, 140, 0);
pub const NEUTRAL: Color = Color::Rgb(147, 112, 219);
pub const MUTED: Color = Color::Rgb(100, 149, 237);

/// Palette used to grade the current price against the period's range.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub accent: Color,
    /// Neon green (near the period high)
    pub positive: Color,
    /// Hot pink (near the period low)
    pub negative: Color,
    pub neutral: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::parrot_neon()
    }
}

impl Theme {
    /// Create the default Parrot/neon theme
    pub fn parrot_neon() -> Self {
        Self {
            accent: ACCENT,
            positive: POSITIVE,
            negative: NEGATIVE,
            neutral: NEUTRAL,
        }
    }

    /// Color for where `current` sits inside `[low, high]`.
    pub fn range_position_color(&self, current: f64, low: f64, high: f64) -> Color {
        let span = high - low;
        if !span.is_finite() || span <= 0.0 {
            return self.neutral;
        }
        match (current - low) / span {
            p if p >= 0.8 => self.positive,
            p if p >= 0.5 => self.accent,
            p if p >= 0.2 => self.neutral,
            _ => self.negative,
        }
    }
}

// ── Style helpers ────────────────────────────────────────────────────

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn positive() -> Style {
    Style::default().fg(POSITIVE)
}

pub fn negative() -> Style {
    Style::default().fg(NEGATIVE)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

pub fn neutral() -> Style {
    Style::default().fg(NEUTRAL)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn text() -> Style {
    Style::default().fg(Color::White)
}

pub fn panel_border(active: bool) -> Style {
    if active {
        accent()
    } else {
        muted()
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent_bold()
    } else {
        muted()
    }
}

/// Highlight for the focused sidebar row.
pub fn selected(focused: bool) -> Style {
    if focused {
        Style::default()
            .fg(BACKGROUND)
            .bg(ACCENT)
            .add_modifier(Modifier::BOLD)
    } else {
        accent_bold()
    }
}
