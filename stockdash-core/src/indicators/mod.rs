//! Indicators over a price series.
//!
//! An indicator is a pure function: records in, one value per record out.
//! Values that cannot be computed (warmup, gaps in the input) are `None`.

pub mod sma;

pub use sma::Sma;

use crate::domain::PriceRecord;

/// Trait for single-series indicators.
///
/// # Look-ahead guard
/// The value at index t may only depend on records 0..=t.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20").
    fn name(&self) -> &str;

    /// Number of records before the first defined value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the whole series.
    ///
    /// Returns a `Vec` of the same length as `records`; the first
    /// `lookback()` entries are `None`.
    fn compute(&self, records: &[PriceRecord]) -> Vec<Option<f64>>;
}

/// Build consecutive daily records from close prices for testing.
///
/// open = previous close, high/low = max/min(open, close) +/- 1.0, volume = 1000.
#[cfg(test)]
pub fn make_records(closes: &[f64]) -> Vec<PriceRecord> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceRecord::new(
                base_date + chrono::Duration::days(i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
                1000,
            )
        })
        .collect()
}

/// Assert two f64 values are approximately equal.
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
