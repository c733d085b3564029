//! Application state: single-owner, main-thread only.
//!
//! All TUI state lives here. The worker thread communicates via channels.

use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use stockdash_core::{
    CatalogLoad, DashboardError, DashboardOutcome, DashboardView, DateRange, FetchError,
    Selection, TickerCatalog,
};

use crate::worker::{WorkerCommand, WorkerResponse};

const ERROR_HISTORY_CAP: usize = 50;

/// Which panel is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Overview,
    Analysis,
    Help,
}

impl Panel {
    pub const COUNT: usize = 3;

    pub fn index(self) -> usize {
        match self {
            Panel::Overview => 0,
            Panel::Analysis => 1,
            Panel::Help => 2,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Panel::Overview),
            1 => Some(Panel::Analysis),
            2 => Some(Panel::Help),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Panel::Overview => "Overview",
            Panel::Analysis => "Analysis",
            Panel::Help => "Help",
        }
    }

    pub fn next(self) -> Panel {
        Panel::from_index((self.index() + 1) % Self::COUNT).unwrap_or(Panel::Overview)
    }

    pub fn prev(self) -> Panel {
        Panel::from_index((self.index() + Self::COUNT - 1) % Self::COUNT).unwrap_or(Panel::Overview)
    }
}

/// Sidebar input that has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Company,
    Start,
    End,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::Company => "Company",
            Field::Start => "Start date",
            Field::End => "End date",
        }
    }

    pub fn next(self) -> Field {
        match self {
            Field::Company => Field::Start,
            Field::Start => Field::End,
            Field::End => Field::Company,
        }
    }

    pub fn prev(self) -> Field {
        match self {
            Field::Company => Field::End,
            Field::Start => Field::Company,
            Field::End => Field::Start,
        }
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// An error record for the error history overlay.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
    pub context: String,
}

/// Error category for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Catalog,
    Network,
    Data,
    Compute,
    Input,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Catalog => "CAT",
            ErrorCategory::Network => "NET",
            ErrorCategory::Data => "DATA",
            ErrorCategory::Compute => "CALC",
            ErrorCategory::Input => "INPUT",
        }
    }

    pub fn of(error: &DashboardError) -> Self {
        match error {
            DashboardError::Catalog(_) => ErrorCategory::Catalog,
            DashboardError::Fetch(
                FetchError::Network(_)
                | FetchError::RateLimited { .. }
                | FetchError::Http { .. }
                | FetchError::ClientBuild(_),
            ) => ErrorCategory::Network,
            DashboardError::Fetch(_) => ErrorCategory::Data,
            DashboardError::Compute(_) => ErrorCategory::Compute,
        }
    }
}

/// What the results area currently shows.
#[derive(Debug, Clone)]
pub enum ViewState {
    /// Waiting for the worker.
    Loading(Selection),
    Ready(Box<DashboardView>),
    NoData {
        company: String,
        ticker: String,
        range: DateRange,
    },
    /// The last run failed; the message replaces the results.
    Failed { selection: Selection, message: String },
}

/// Which overlay (if any) is shown on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    ErrorHistory,
    /// Typing a `YYYY-MM-DD` date for the given field.
    DateEntry(Field),
}

/// Top-level application state.
pub struct AppState {
    // Navigation
    pub active_panel: Panel,
    pub running: bool,

    // Sidebar
    pub catalog: Arc<TickerCatalog>,
    pub catalog_warning: Option<String>,
    pub focus: Field,
    pub company_idx: usize,
    pub range: DateRange,
    pub lookback_days: i64,

    // Results
    pub view: ViewState,
    request_id: u64,

    // Worker communication
    pub worker_tx: Sender<WorkerCommand>,
    pub worker_rx: Receiver<WorkerResponse>,

    // Cross-cutting
    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,
    pub overlay: Overlay,
    pub date_input: String,
}

impl AppState {
    /// Build state from the loaded catalog and an initial selection.
    pub fn new(
        load: CatalogLoad,
        initial: Selection,
        lookback_days: i64,
        worker_tx: Sender<WorkerCommand>,
        worker_rx: Receiver<WorkerResponse>,
    ) -> Self {
        let company_idx = load.catalog.position(&initial.company).unwrap_or(0);
        let mut app = Self {
            active_panel: Panel::Overview,
            running: true,
            catalog: load.catalog,
            catalog_warning: None,
            focus: Field::Company,
            company_idx,
            range: initial.range,
            lookback_days,
            view: ViewState::Loading(initial),
            request_id: 0,
            worker_tx,
            worker_rx,
            status_message: None,
            error_history: VecDeque::with_capacity(ERROR_HISTORY_CAP),
            error_scroll: 0,
            overlay: Overlay::None,
            date_input: String::new(),
        };

        if let Some(err) = load.error {
            let message = err.to_string();
            app.push_error(ErrorCategory::Catalog, message.clone(), "using fallback catalog".into());
            app.set_warning(format!("{message} (using fallback catalog)"));
            app.catalog_warning = Some(message);
        }
        app
    }

    /// Display names in selector order.
    pub fn company_names(&self) -> Vec<&str> {
        self.catalog.names().collect()
    }

    pub fn selected_company(&self) -> &str {
        self.catalog
            .names()
            .nth(self.company_idx)
            .or_else(|| self.catalog.first_name())
            .unwrap_or(stockdash_core::catalog::FALLBACK_NAME)
    }

    pub fn selection(&self) -> Selection {
        Selection::new(self.selected_company(), self.range)
    }

    /// Id of the newest load request; older responses are ignored.
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    /// Ask the worker to run the pipeline for the current selection.
    pub fn request_refresh(&mut self) {
        self.request_id += 1;
        let selection = self.selection();
        tracing::debug!(id = self.request_id, company = %selection.company, range = %selection.range, "refresh requested");
        self.view = ViewState::Loading(selection.clone());
        if self
            .worker_tx
            .send(WorkerCommand::Load {
                id: self.request_id,
                selection,
            })
            .is_err()
        {
            self.push_error(
                ErrorCategory::Data,
                "worker thread is not running".into(),
                String::new(),
            );
        }
    }

    /// Move the company cursor by `delta`, wrapping around.
    pub fn cycle_company(&mut self, delta: isize) {
        let len = self.catalog.len();
        if len == 0 {
            return;
        }
        let idx = (self.company_idx as isize + delta).rem_euclid(len as isize) as usize;
        if idx != self.company_idx {
            self.company_idx = idx;
            self.request_refresh();
        }
    }

    /// Shift one end of the range by `days`. Past the calendar edge the date stays put.
    pub fn shift_date(&mut self, field: Field, days: i64) {
        let shift = |date: NaiveDate| {
            Duration::try_days(days)
                .and_then(|span| date.checked_add_signed(span))
                .unwrap_or(date)
        };
        let range = match field {
            Field::Start => self.range.with_start(shift(self.range.start)),
            Field::End => self.range.with_end(shift(self.range.end)),
            Field::Company => return,
        };
        self.set_range(range);
    }

    pub fn set_date(&mut self, field: Field, date: NaiveDate) {
        let range = match field {
            Field::Start => self.range.with_start(date),
            Field::End => self.range.with_end(date),
            Field::Company => return,
        };
        self.set_range(range);
    }

    /// Back to the default window ending `today`.
    pub fn reset_range(&mut self, today: NaiveDate) {
        self.set_range(DateRange::trailing(today, self.lookback_days));
    }

    fn set_range(&mut self, range: DateRange) {
        if range == self.range {
            return;
        }
        self.range = range;
        if range.is_inverted() {
            self.set_warning(format!("Start date is after end date ({range})"));
        }
        self.request_refresh();
    }

    /// Apply a worker response. Stale responses are dropped.
    pub fn handle_response(&mut self, resp: WorkerResponse) {
        if resp.id() != self.request_id {
            tracing::debug!(id = resp.id(), latest = self.request_id, "dropping stale response");
            return;
        }

        match resp {
            WorkerResponse::Loaded { outcome, .. } => match *outcome {
                DashboardOutcome::Ready(view) => {
                    self.set_status(format!(
                        "{}: {} trading days, {}",
                        view.title(),
                        view.series.len(),
                        view.range
                    ));
                    self.view = ViewState::Ready(Box::new(view));
                }
                DashboardOutcome::NoData {
                    company,
                    ticker,
                    range,
                } => {
                    self.set_warning(format!("No price data for {ticker} between {range}"));
                    self.view = ViewState::NoData {
                        company,
                        ticker,
                        range,
                    };
                }
            },
            WorkerResponse::Failed {
                selection, error, ..
            } => {
                let message = error.to_string();
                self.push_error(
                    ErrorCategory::of(&error),
                    message.clone(),
                    format!("{} {}", selection.company, selection.range),
                );
                self.view = ViewState::Failed { selection, message };
            }
        }
    }

    /// Drain pending worker responses without blocking.
    pub fn poll_worker(&mut self) {
        while let Ok(resp) = self.worker_rx.try_recv() {
            self.handle_response(resp);
        }
    }

    pub fn current_view(&self) -> Option<&DashboardView> {
        match &self.view {
            ViewState::Ready(view) => Some(&**view),
            _ => None,
        }
    }

    /// Push an error to the history, capping at 50.
    pub fn push_error(&mut self, category: ErrorCategory, message: String, context: String) {
        let record = ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message: message.clone(),
            context,
        };
        self.error_history.push_front(record);
        if self.error_history.len() > ERROR_HISTORY_CAP {
            self.error_history.pop_back();
        }
        self.status_message = Some((message, StatusLevel::Error));
    }

    /// Set an info status message.
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    /// Set a warning status message.
    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }
}
