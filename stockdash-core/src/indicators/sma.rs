//! Simple Moving Average (SMA).
//!
//! Trailing mean of close prices over a fixed window.
//! Lookback: period - 1 (first defined value at index period-1).

use super::Indicator;
use crate::domain::PriceRecord;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, records: &[PriceRecord]) -> Vec<Option<f64>> {
        let n = records.len();
        let mut result = vec![None; n];

        if n < self.period {
            return result;
        }

        let mut sum = 0.0;
        let mut nan_in_window = false;
        for record in records.iter().take(self.period) {
            if record.close.is_nan() {
                nan_in_window = true;
            }
            sum += record.close;
        }

        if !nan_in_window {
            result[self.period - 1] = Some(sum / self.period as f64);
        }

        for i in self.period..n {
            let leaving = records[i - self.period].close;
            let entering = records[i].close;
            sum = sum - leaving + entering;

            // A NaN poisons the running sum, so rescan the window whenever one
            // enters, leaves, or is still inside it.
            if entering.is_nan() || leaving.is_nan() || nan_in_window {
                nan_in_window = false;
                sum = 0.0;
                for record in &records[(i + 1 - self.period)..=i] {
                    if record.close.is_nan() {
                        nan_in_window = true;
                    }
                    sum += record.close;
                }
                if nan_in_window {
                    continue;
                }
            }

            result[i] = Some(sum / self.period as f64);
        }

        result
    }
}
