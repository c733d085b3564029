//! Derived metrics: moving-average columns and period summaries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{PriceSeries, MA20, MA50};
use crate::indicators::Sma;

/// Window of the short moving average.
pub const SHORT_WINDOW: usize = 20;
/// Window of the long moving average.
pub const LONG_WINDOW: usize = 50;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComputeError {
    #[error("no price data for {symbol}")]
    EmptySeries { symbol: String },

    #[error("{field} is missing for {symbol}")]
    MissingValue { field: &'static str, symbol: String },
}

/// Scalar summaries shown on the metric cards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    /// Close of the last record.
    pub current: f64,
    /// Highest `high` over the series.
    pub period_high: f64,
    /// Lowest `low` over the series.
    pub period_low: f64,
}

/// Return a copy of `series` with `MA20` and `MA50` columns.
///
/// Existing columns with those names are recomputed, so applying this twice
/// gives the same columns as applying it once.
pub fn compute_moving_averages(series: &PriceSeries) -> PriceSeries {
    let mut augmented = series.clone();
    augmented.apply_indicator(MA20, &Sma::new(SHORT_WINDOW));
    augmented.apply_indicator(MA50, &Sma::new(LONG_WINDOW));
    augmented
}

/// Current close, period high and period low. NaN highs/lows are skipped.
pub fn summarize(series: &PriceSeries) -> Result<PriceSummary, ComputeError> {
    let symbol = series.symbol();
    let last = series.last().ok_or_else(|| ComputeError::EmptySeries {
        symbol: symbol.to_string(),
    })?;

    if last.close.is_nan() {
        return Err(ComputeError::MissingValue {
            field: "current close",
            symbol: symbol.to_string(),
        });
    }

    let period_high = series
        .records()
        .iter()
        .map(|r| r.high)
        .filter(|v| !v.is_nan())
        .reduce(f64::max)
        .ok_or_else(|| ComputeError::MissingValue {
            field: "period high",
            symbol: symbol.to_string(),
        })?;

    let period_low = series
        .records()
        .iter()
        .map(|r| r.low)
        .filter(|v| !v.is_nan())
        .reduce(f64::min)
        .ok_or_else(|| ComputeError::MissingValue {
            field: "period low",
            symbol: symbol.to_string(),
        })?;

    Ok(PriceSummary {
        current: last.close,
        period_high,
        period_low,
    })
}

/// Dollar amount with two decimals, e.g. `$187.44`.
pub fn format_usd(value: f64) -> String {
    if value < 0.0 {
        format!("-${:.2}", value.abs())
    } else {
        format!("${value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_records, DEFAULT_EPSILON};

    fn series_of(closes: &[f64]) -> PriceSeries {
        PriceSeries::new("TEST", make_records(closes))
    }

    #[test]
    fn moving_average_boundaries() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let augmented = compute_moving_averages(&series_of(&closes));

        let ma20 = augmented.ma20().unwrap();
        let ma50 = augmented.ma50().unwrap();
        assert_eq!(ma20.len(), 60);
        assert!(ma20[..19].iter().all(|v| v.is_none()));
        assert!(ma20[19..].iter().all(|v| v.is_some()));
        assert!(ma50[..49].iter().all(|v| v.is_none()));
        assert!(ma50[49..].iter().all(|v| v.is_some()));

        // mean(100..=119) = 109.5
        assert_approx(ma20[19].unwrap(), 109.5, DEFAULT_EPSILON);
        // mean(100..=149) = 124.5
        assert_approx(ma50[49].unwrap(), 124.5, DEFAULT_EPSILON);
    }

    #[test]
    fn input_series_is_untouched() {
        let series = series_of(&[1.0, 2.0, 3.0]);
        let augmented = compute_moving_averages(&series);
        assert!(series.ma20().is_none());
        assert_eq!(augmented.records(), series.records());
    }

    #[test]
    fn recompute_is_idempotent() {
        let closes: Vec<f64> = (0..55).map(|i| (i as f64 * 0.3).sin() * 10.0 + 50.0).collect();
        let once = compute_moving_averages(&series_of(&closes));
        let twice = compute_moving_averages(&once);
        assert_eq!(once.ma20(), twice.ma20());
        assert_eq!(once.ma50(), twice.ma50());
    }

    #[test]
    fn summary_values() {
        // make_records: high = max(open, close) + 1, low = min(open, close) - 1
        let summary = summarize(&series_of(&[10.0, 14.0, 8.0, 12.0])).unwrap();
        assert_eq!(summary.current, 12.0);
        assert_eq!(summary.period_high, 15.0);
        assert_eq!(summary.period_low, 7.0);
    }

    #[test]
    fn summary_skips_nan_extremes() {
        let mut records = make_records(&[10.0, 11.0, 12.0]);
        records[1].high = f64::NAN;
        records[1].low = f64::NAN;
        let summary = summarize(&PriceSeries::new("TEST", records)).unwrap();
        assert_eq!(summary.period_high, 13.0);
        assert_eq!(summary.period_low, 9.0);
    }

    #[test]
    fn summary_of_empty_series_is_an_error() {
        let err = summarize(&PriceSeries::empty("TSLA")).unwrap_err();
        assert_eq!(
            err,
            ComputeError::EmptySeries {
                symbol: "TSLA".into()
            }
        );
    }

    #[test]
    fn summary_rejects_missing_last_close() {
        let mut records = make_records(&[10.0, 11.0]);
        records[1].close = f64::NAN;
        let err = summarize(&PriceSeries::new("TEST", records)).unwrap_err();
        assert!(matches!(err, ComputeError::MissingValue { field: "current close", .. }));
    }

    #[test]
    fn usd_formatting() {
        assert_eq!(format_usd(187.4449), "$187.44");
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(1234.5), "$1234.50");
        assert_eq!(format_usd(-2.5), "-$2.50");
    }
}
