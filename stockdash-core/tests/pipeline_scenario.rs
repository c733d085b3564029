//! End-to-end pipeline runs against a recording provider and CSV files.

use chrono::{Duration, NaiveDate, Weekday, Datelike};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use stockdash_core::data::{
    CsvProvider, DataSource, FetchKey, FetchResult, MemoCache, NoCache,
};
use stockdash_core::{
    DashboardError, DashboardOutcome, DataProvider, DateRange, Dashboard, FetchError,
    PriceRecord, PriceSeries, Selection,
};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_dir() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("stockdash_scenario_{}_{id}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Weekdays in `[start, end)`.
fn trading_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut day = start;
    while day < end {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(day);
        }
        day += Duration::days(1);
    }
    days
}

fn record(date: NaiveDate, close: f64) -> PriceRecord {
    PriceRecord::new(date, close - 0.5, close + 1.0, close - 1.0, close, 1_000_000)
}

/// Returns one record per weekday in the window and remembers every call.
#[derive(Default)]
struct RecordingProvider {
    calls: Mutex<Vec<(String, NaiveDate, NaiveDate)>>,
    fail: Mutex<bool>,
}

impl RecordingProvider {
    fn calls(&self) -> Vec<(String, NaiveDate, NaiveDate)> {
        self.calls.lock().unwrap().clone()
    }

    fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

impl DataProvider for RecordingProvider {
    fn name(&self) -> &str {
        "recording"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((symbol.to_string(), start, end));
        if *self.fail.lock().unwrap() {
            return Err(FetchError::Network("connection reset".into()));
        }
        let records = trading_days(start, end)
            .into_iter()
            .enumerate()
            .map(|(i, date)| record(date, 200.0 + i as f64))
            .collect();
        Ok(FetchResult {
            symbol: symbol.to_string(),
            records,
            source: DataSource::YahooFinance,
        })
    }
}

fn dashboard_with(provider: Arc<RecordingProvider>, memoized: bool) -> (PathBuf, Dashboard) {
    let dir = temp_dir();
    let catalog = dir.join("stock_tickers.txt");
    std::fs::write(&catalog, "Apple:AAPL\nTesla:TSLA\n").unwrap();
    let dash = if memoized {
        Dashboard::with_provider(
            catalog,
            provider,
            Arc::new(MemoCache::<FetchKey, Arc<PriceSeries>>::unbounded()),
        )
    } else {
        Dashboard::with_provider(catalog, provider, Arc::new(NoCache))
    };
    (dir, dash)
}

// ── Scenario: Tesla over a month ─────────────────────────────────────

#[test]
fn tesla_month_has_three_ma20_values_and_no_ma50() {
    let provider = Arc::new(RecordingProvider::default());
    let (dir, dash) = dashboard_with(provider.clone(), true);

    // 30 days starting on a Monday: four full weeks plus Monday and Tuesday
    let range = DateRange::new(d(2024, 1, 1), d(2024, 1, 31));
    assert_eq!(range.span_days(), 30);
    assert_eq!(trading_days(range.start, range.end).len(), 22);

    let outcome = dash.run(&Selection::new("Tesla", range)).unwrap();
    let view = outcome.view().expect("expected data");

    assert_eq!(provider.calls(), vec![("TSLA".to_string(), range.start, range.end)]);
    assert_eq!(view.ticker, "TSLA");
    assert_eq!(view.series.len(), 22);

    let ma20 = view.series.ma20().unwrap();
    let defined: Vec<usize> = (0..ma20.len()).filter(|&i| ma20[i].is_some()).collect();
    assert_eq!(defined, vec![19, 20, 21]);
    assert!(view.series.ma50().unwrap().iter().all(|v| v.is_none()));

    // closes are 200, 201, ... so MA20 at index 19 is mean(200..=219)
    assert!((ma20[19].unwrap() - 209.5).abs() < 1e-9);
    assert_eq!(view.summary.current, 221.0);
    assert_eq!(view.summary.period_high, 222.0);
    assert_eq!(view.summary.period_low, 199.0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn repeated_selection_is_served_from_memo() {
    let provider = Arc::new(RecordingProvider::default());
    let (dir, dash) = dashboard_with(provider.clone(), true);
    let selection = Selection::new("Apple", DateRange::new(d(2024, 1, 1), d(2024, 6, 1)));

    let first = dash.run(&selection).unwrap();
    let second = dash.run(&selection).unwrap();

    assert_eq!(provider.calls().len(), 1);
    assert_eq!(first, second);
    assert_eq!(dash.fetcher().cache().stats().hits, 1);

    // A different end date is a different request
    let moved = Selection::new("Apple", selection.range.with_end(d(2024, 6, 2)));
    dash.run(&moved).unwrap();
    assert_eq!(provider.calls().len(), 2);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn failed_fetch_is_retried_on_next_run() {
    let provider = Arc::new(RecordingProvider::default());
    let (dir, dash) = dashboard_with(provider.clone(), true);
    let selection = Selection::new("Apple", DateRange::new(d(2024, 1, 1), d(2024, 2, 1)));

    provider.set_failing(true);
    let err = dash.run(&selection).unwrap_err();
    assert!(matches!(err, DashboardError::Fetch(FetchError::Network(_))));

    provider.set_failing(false);
    assert!(dash.run(&selection).unwrap().view().is_some());
    assert_eq!(provider.calls().len(), 2);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn weekend_only_range_is_no_data() {
    let provider = Arc::new(RecordingProvider::default());
    let (dir, dash) = dashboard_with(provider, false);
    // Saturday and Sunday
    let range = DateRange::new(d(2024, 3, 2), d(2024, 3, 4));
    let outcome = dash.run(&Selection::new("Apple", range)).unwrap();
    assert!(matches!(outcome, DashboardOutcome::NoData { ref ticker, .. } if ticker == "AAPL"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn inverted_range_is_passed_through_as_is() {
    let provider = Arc::new(RecordingProvider::default());
    let (dir, dash) = dashboard_with(provider.clone(), false);
    let range = DateRange::new(d(2024, 5, 1), d(2024, 4, 1));

    let outcome = dash.run(&Selection::new("Tesla", range)).unwrap();
    assert!(matches!(outcome, DashboardOutcome::NoData { .. }));
    assert_eq!(provider.calls(), vec![("TSLA".to_string(), range.start, range.end)]);

    let _ = std::fs::remove_dir_all(&dir);
}

// ── CSV provider through the pipeline ───────────────────────────────

#[test]
fn csv_provider_feeds_the_dashboard() {
    let dir = temp_dir();
    std::fs::write(dir.join("stock_tickers.txt"), "Microsoft:MSFT\n").unwrap();

    let mut csv = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
    for (i, date) in trading_days(d(2024, 1, 1), d(2024, 4, 1)).iter().enumerate() {
        let close = 370.0 + i as f64 * 0.5;
        csv.push_str(&format!(
            "{date},{:.2},{:.2},{:.2},{close:.2},{close:.2},{}\n",
            close - 1.0,
            close + 2.0,
            close - 2.0,
            20_000_000 + i
        ));
    }
    std::fs::write(dir.join("MSFT.csv"), csv).unwrap();

    let dash = Dashboard::with_provider(
        dir.join("stock_tickers.txt"),
        Arc::new(CsvProvider::new(&dir)),
        Arc::new(NoCache),
    );
    let selection = dash.default_selection(d(2024, 4, 1), 90);
    assert_eq!(selection.company, "Microsoft");

    let outcome = dash.run(&selection).unwrap();
    let view = outcome.view().unwrap();
    assert!(view.series.len() >= 60);
    let ma50 = view.series.ma50().unwrap();
    assert!(ma50[48].is_none());
    assert!(ma50[49].is_some());
    assert!(view.summary.period_low <= view.summary.current);
    assert!(view.summary.current <= view.summary.period_high);

    let _ = std::fs::remove_dir_all(&dir);
}
