//! stockdash CLI: catalog listing, price metrics, and CSV export.
//!
//! Commands:
//! - `catalog`: print the resolved company → ticker catalog
//! - `show`: run the pipeline for one company and print metrics and recent rows
//! - `export`: write the series with MA20/MA50 columns as CSV

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use stockdash_core::config::ProviderKind;
use stockdash_core::{
    format_usd, Dashboard, DashboardConfig, DashboardOutcome, DashboardView, DateRange,
    PriceSeries, PriceSummary, Selection,
};

#[derive(Parser)]
#[command(
    name = "stockdash",
    about = "stockdash CLI: stock prices with moving averages"
)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ticker catalog file (`Name:TICKER` per line).
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Read prices from `<DIR>/<TICKER>.csv` instead of Yahoo Finance.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Debug logging on stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the ticker catalog.
    Catalog,
    /// Print price metrics and the most recent rows for a company.
    Show {
        /// Company display name from the catalog.
        #[arg(long)]
        company: String,

        /// Start date (YYYY-MM-DD). Defaults to the configured lookback before --end.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD), exclusive. Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Number of trailing rows to print.
        #[arg(long, default_value_t = 10)]
        tail: usize,

        /// Emit JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write the price series with MA20/MA50 to a CSV file.
    Export {
        /// Company display name from the catalog.
        #[arg(long)]
        company: String,

        /// Output CSV path.
        #[arg(long)]
        out: PathBuf,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD), exclusive.
        #[arg(long)]
        end: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config =
        DashboardConfig::load(cli.config.as_deref()).context("loading configuration")?;
    apply_overrides(&mut config, &cli);
    init_tracing(&config.logging.filter, cli.verbose);

    let dashboard = Dashboard::from_config(&config).context("building data provider")?;
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Commands::Catalog => run_catalog(&dashboard),
        Commands::Show {
            company,
            start,
            end,
            tail,
            json,
        } => {
            let range = resolve_range(start.as_deref(), end.as_deref(), today, config.lookback_days)?;
            run_show(&dashboard, Selection::new(company, range), tail, json)
        }
        Commands::Export {
            company,
            out,
            start,
            end,
        } => {
            let range = resolve_range(start.as_deref(), end.as_deref(), today, config.lookback_days)?;
            run_export(&dashboard, Selection::new(company, range), &out)
        }
    }
}

fn apply_overrides(config: &mut DashboardConfig, cli: &Cli) {
    if let Some(path) = &cli.catalog {
        config.catalog_path = path.clone();
    }
    if let Some(dir) = &cli.data_dir {
        config.provider.kind = ProviderKind::Csv;
        config.provider.data_dir = dir.clone();
    }
}

fn init_tracing(filter: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(filter))
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
}

/// Range from optional flags: `end` defaults to `today`, `start` to
/// `lookback_days` before `end`. An inverted range is passed through.
fn resolve_range(
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
    lookback_days: i64,
) -> Result<DateRange> {
    let end = end.map(parse_date).transpose()?.unwrap_or(today);
    let range = match start.map(parse_date).transpose()? {
        Some(start) => DateRange::new(start, end),
        None => DateRange::trailing(end, lookback_days),
    };
    if range.is_inverted() {
        tracing::warn!(%range, "start date is after end date");
    }
    Ok(range)
}

fn run_catalog(dashboard: &Dashboard) -> Result<()> {
    let load = dashboard.catalog();
    if let Some(err) = &load.error {
        eprintln!("WARNING: {err} (using fallback catalog)");
    }

    let width = load.catalog.names().map(str::len).max().unwrap_or(0).max(7);
    println!("{:<width$}  Ticker", "Company");
    println!("{}", "-".repeat(width + 8));
    for (name, ticker) in load.catalog.iter() {
        println!("{name:<width$}  {ticker}");
    }
    Ok(())
}

/// Run the pipeline. `None` means the provider returned no rows.
fn load_view(dashboard: &Dashboard, selection: &Selection) -> Result<Option<DashboardView>> {
    if let Some(err) = dashboard.catalog_warning() {
        eprintln!("WARNING: {err} (using fallback catalog)");
    }
    match dashboard.run(selection)? {
        DashboardOutcome::Ready(view) => Ok(Some(view)),
        DashboardOutcome::NoData {
            company,
            ticker,
            range,
        } => {
            eprintln!("No price data for {company} ({ticker}) between {range}");
            Ok(None)
        }
    }
}

fn run_show(dashboard: &Dashboard, selection: Selection, tail: usize, json: bool) -> Result<()> {
    let Some(view) = load_view(dashboard, &selection)? else {
        return Ok(());
    };

    let mut stdout = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &ShowReport::new(&view, tail))?;
        writeln!(stdout)?;
    } else {
        write!(stdout, "{}", format_view(&view, tail))?;
    }
    Ok(())
}

fn run_export(dashboard: &Dashboard, selection: Selection, out: &Path) -> Result<()> {
    let Some(view) = load_view(dashboard, &selection)? else {
        bail!("nothing to export for {}", selection.company);
    };

    let file = std::fs::File::create(out)
        .with_context(|| format!("creating {}", out.display()))?;
    write_series_csv(file, &view.series)?;
    println!(
        "Wrote {} rows for {} to {}",
        view.series.len(),
        view.title(),
        out.display()
    );
    Ok(())
}

// ── Output ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ShowReport<'a> {
    company: &'a str,
    ticker: &'a str,
    start: NaiveDate,
    end: NaiveDate,
    trading_days: usize,
    summary: PriceSummary,
    rows: Vec<ShowRow>,
}

#[derive(Debug, Serialize)]
struct ShowRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
    ma20: Option<f64>,
    ma50: Option<f64>,
}

impl<'a> ShowReport<'a> {
    fn new(view: &'a DashboardView, tail: usize) -> Self {
        Self {
            company: &view.company,
            ticker: &view.ticker,
            start: view.range.start,
            end: view.range.end,
            trading_days: view.series.len(),
            summary: view.summary,
            rows: tail_rows(&view.series, tail),
        }
    }
}

fn tail_rows(series: &PriceSeries, tail: usize) -> Vec<ShowRow> {
    let ma20 = series.ma20().unwrap_or(&[]);
    let ma50 = series.ma50().unwrap_or(&[]);
    let skip = series.len().saturating_sub(tail);
    series
        .records()
        .iter()
        .enumerate()
        .skip(skip)
        .map(|(i, r)| ShowRow {
            date: r.date,
            open: r.open,
            high: r.high,
            low: r.low,
            close: r.close,
            volume: r.volume,
            ma20: ma20.get(i).copied().flatten(),
            ma50: ma50.get(i).copied().flatten(),
        })
        .collect()
}

fn format_view(view: &DashboardView, tail: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} ===\n", view.title()));
    out.push_str(&format!("Period:         {}\n", view.range));
    out.push_str(&format!("Trading days:   {}\n", view.series.len()));
    out.push_str(&format!("Current price:  {}\n", format_usd(view.summary.current)));
    out.push_str(&format!("Period high:    {}\n", format_usd(view.summary.period_high)));
    out.push_str(&format!("Period low:     {}\n", format_usd(view.summary.period_low)));

    let rows = tail_rows(&view.series, tail);
    if rows.is_empty() {
        return out;
    }

    let opt = |v: Option<f64>| v.map(|x| format!("{x:.2}")).unwrap_or_else(|| "-".into());
    out.push('\n');
    out.push_str(&format!(
        "{:<10} {:>10} {:>10} {:>10} {:>10} {:>12} {:>10} {:>10}\n",
        "Date", "Open", "High", "Low", "Close", "Volume", "MA20", "MA50"
    ));
    out.push_str(&format!("{}\n", "-".repeat(89)));
    for row in rows {
        out.push_str(&format!(
            "{:<10} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>12} {:>10} {:>10}\n",
            row.date.format("%Y-%m-%d"),
            row.open,
            row.high,
            row.low,
            row.close,
            row.volume,
            opt(row.ma20),
            opt(row.ma50),
        ));
    }
    out
}

/// CSV with OHLCV, any provider pass-through fields, then MA20/MA50.
/// Undefined averages are written as empty fields.
fn write_series_csv<W: Write>(writer: W, series: &PriceSeries) -> Result<()> {
    let records = series.records();
    let has_adj = records.iter().any(|r| r.adj_close.is_some());
    let extra_keys: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.extra.keys().map(String::as_str))
        .collect();

    let mut header = vec!["Date", "Open", "High", "Low", "Close"];
    if has_adj {
        header.push("Adj Close");
    }
    header.push("Volume");
    header.extend(extra_keys.iter().copied());
    header.extend(["MA20", "MA50"]);

    let ma20 = series.ma20().unwrap_or(&[]);
    let ma50 = series.ma50().unwrap_or(&[]);
    let num = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&header)?;
    for (i, r) in records.iter().enumerate() {
        let mut row = vec![
            r.date.format("%Y-%m-%d").to_string(),
            r.open.to_string(),
            r.high.to_string(),
            r.low.to_string(),
            r.close.to_string(),
        ];
        if has_adj {
            row.push(num(r.adj_close));
        }
        row.push(r.volume.to_string());
        for key in &extra_keys {
            row.push(num(r.extra.get(*key).copied()));
        }
        row.push(num(ma20.get(i).copied().flatten()));
        row.push(num(ma50.get(i).copied().flatten()));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockdash_core::{compute_moving_averages, summarize, PriceRecord};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn make_series(n: usize) -> PriceSeries {
        let records = (0..n)
            .map(|i| {
                let c = 100.0 + i as f64;
                PriceRecord::new(d(2024, 1, 1) + chrono::Duration::days(i as i64), c, c + 1.0, c - 1.0, c, 1000 + i as u64)
            })
            .collect();
        compute_moving_averages(&PriceSeries::new("TEST", records))
    }

    fn make_view(n: usize) -> DashboardView {
        let series = make_series(n);
        let summary = summarize(&series).unwrap();
        DashboardView {
            company: "Test Co".into(),
            ticker: "TEST".into(),
            range: DateRange::new(d(2024, 1, 1), d(2024, 6, 1)),
            series,
            summary,
        }
    }

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "stockdash", "show", "--company", "Apple", "--tail", "3", "--data-dir", "prices",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("prices")));
        match cli.command {
            Commands::Show { company, tail, json, .. } => {
                assert_eq!(company, "Apple");
                assert_eq!(tail, 3);
                assert!(!json);
            }
            _ => panic!("expected show"),
        }
    }

    #[test]
    fn data_dir_switches_to_csv_provider() {
        let cli = Cli::try_parse_from([
            "stockdash", "--catalog", "tickers.txt", "--data-dir", "prices", "catalog",
        ])
        .unwrap();
        let mut config = DashboardConfig::default();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.provider.kind, ProviderKind::Csv);
        assert_eq!(config.provider.data_dir, PathBuf::from("prices"));
        assert_eq!(config.catalog_path, PathBuf::from("tickers.txt"));
    }

    #[test]
    fn range_defaults() {
        let today = d(2024, 6, 1);
        let r = resolve_range(None, None, today, 30).unwrap();
        assert_eq!(r, DateRange::trailing(today, 30));

        let r = resolve_range(Some("2024-01-02"), Some("2024-02-01"), today, 30).unwrap();
        assert_eq!(r, DateRange::new(d(2024, 1, 2), d(2024, 2, 1)));

        // Inverted ranges are not rejected
        let r = resolve_range(Some("2024-03-01"), Some("2024-02-01"), today, 30).unwrap();
        assert!(r.is_inverted());
    }

    #[test]
    fn bad_date_is_an_error() {
        let err = resolve_range(Some("01/02/2024"), None, d(2024, 6, 1), 30).unwrap_err();
        assert!(err.to_string().contains("01/02/2024"));
    }

    #[test]
    fn tail_rows_carry_moving_averages() {
        let rows = tail_rows(&make_series(25), 3);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].date, d(2024, 1, 23));
        assert!(rows.iter().all(|r| r.ma20.is_some()));
        assert!(rows.iter().all(|r| r.ma50.is_none()));

        assert_eq!(tail_rows(&make_series(2), 10).len(), 2);
    }

    #[test]
    fn table_shows_metrics_and_placeholders() {
        let text = format_view(&make_view(5), 2);
        assert!(text.contains("=== Test Co (TEST) ==="));
        assert!(text.contains("Current price:  $104.00"));
        assert!(text.contains("Period high:    $105.00"));
        assert!(text.contains("Period low:     $99.00"));
        assert_eq!(text.lines().filter(|l| l.starts_with("2024-")).count(), 2);
        assert!(text.lines().last().unwrap().ends_with('-'));
    }

    #[test]
    fn json_report_serializes_nulls_for_undefined_averages() {
        let view = make_view(21);
        let value = serde_json::to_value(ShowReport::new(&view, 3)).unwrap();
        assert_eq!(value["ticker"], "TEST");
        assert_eq!(value["trading_days"], 21);
        let rows = value["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[0]["ma20"].is_null());
        assert!(rows[2]["ma20"].is_number());
        assert!(rows[2]["ma50"].is_null());
    }

    #[test]
    fn csv_export_has_header_and_blank_averages() {
        let mut series_records = make_series(21).records().to_vec();
        series_records[0].extra.insert("Dividends".into(), 0.24);
        let series = compute_moving_averages(&PriceSeries::new("TEST", series_records));

        let mut buf = Vec::new();
        write_series_csv(&mut buf, &series).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Date,Open,High,Low,Close,Volume,Dividends,MA20,MA50"
        );
        assert_eq!(lines.next().unwrap(), "2024-01-01,100,101,99,100,1000,0.24,,");
        let last = text.lines().last().unwrap();
        assert!(last.starts_with("2024-01-21,120,"));
        assert!(last.ends_with(",110.5,"));
    }

    #[test]
    fn export_end_to_end_with_csv_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tickers.txt"), "Test Co:TEST\n").unwrap();
        let mut csv_text = String::from("Date,Open,High,Low,Close,Volume\n");
        for r in make_series(30).records() {
            csv_text.push_str(&format!(
                "{},{},{},{},{},{}\n",
                r.date, r.open, r.high, r.low, r.close, r.volume
            ));
        }
        std::fs::write(dir.path().join("TEST.csv"), csv_text).unwrap();

        let args: Vec<std::ffi::OsString> = vec![
            "stockdash".into(),
            "--catalog".into(),
            dir.path().join("tickers.txt").into(),
            "--data-dir".into(),
            dir.path().into(),
            "catalog".into(),
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let mut config = DashboardConfig::default();
        apply_overrides(&mut config, &cli);
        let dashboard = Dashboard::from_config(&config).unwrap();

        let out = dir.path().join("out.csv");
        let selection = Selection::new("Test Co", DateRange::new(d(2024, 1, 1), d(2024, 3, 1)));
        run_export(&dashboard, selection, &out).unwrap();

        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(written.lines().count(), 31);
        assert!(written.starts_with("Date,Open,High,Low,Close,Volume,MA20,MA50"));
    }

    #[test]
    fn export_of_empty_range_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tickers.txt"), "Test Co:TEST\n").unwrap();
        std::fs::write(dir.path().join("TEST.csv"), "Date,Open,High,Low,Close,Volume\n").unwrap();

        let mut config = DashboardConfig::default();
        config.catalog_path = dir.path().join("tickers.txt");
        config.provider.kind = ProviderKind::Csv;
        config.provider.data_dir = dir.path().to_path_buf();
        let dashboard = Dashboard::from_config(&config).unwrap();

        let selection = Selection::new("Test Co", DateRange::new(d(2024, 1, 1), d(2024, 3, 1)));
        let err = run_export(&dashboard, selection, &dir.path().join("out.csv")).unwrap_err();
        assert!(err.to_string().contains("nothing to export"));
    }
}
