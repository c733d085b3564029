//! stockdash TUI: terminal stock dashboard.
//!
//! Panels:
//! 1. Overview: metric cards and three renderings of the close series
//! 2. Analysis: close with MA20/MA50, daily volume
//! 3. Help: keyboard shortcuts
//!
//! A sidebar holds the company selector and the date range. Every change
//! re-runs the core pipeline on the worker thread.

pub mod app;
pub mod input;
pub mod theme;
pub mod ui;
pub mod worker;

pub use app::AppState;
pub use input::handle_key;
pub use theme::Theme;
