//! DateRange: the user-selected (start, end) pair.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar date range requested from the provider.
///
/// No `start <= end` invariant: an inverted range is carried as-is and the
/// provider decides what it means (in practice, no rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The `days`-long window ending at `end`.
    ///
    /// Saturates at `NaiveDate::MIN` when the window reaches past the
    /// representable calendar.
    pub fn trailing(end: NaiveDate, days: i64) -> Self {
        let start = Duration::try_days(days)
            .and_then(|span| end.checked_sub_signed(span))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    /// Calendar days covered, negative for an inverted range.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn with_start(self, start: NaiveDate) -> Self {
        Self { start, ..self }
    }

    pub fn with_end(self, end: NaiveDate) -> Self {
        Self { end, ..self }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn trailing_window() {
        let range = DateRange::trailing(d(2024, 12, 31), 365);
        assert_eq!(range.start, d(2024, 1, 1));
        assert_eq!(range.span_days(), 365);
        assert!(!range.is_inverted());
    }

    #[test]
    fn huge_trailing_window_saturates() {
        let today = d(2026, 10, 17);
        let range = DateRange::trailing(today, 100_000_000);
        assert_eq!(range.start, NaiveDate::MIN);
        assert_eq!(range.end, today);

        let range = DateRange::trailing(today, i64::MAX);
        assert_eq!(range.start, NaiveDate::MIN);
    }

    #[test]
    fn inverted_range_is_kept() {
        let range = DateRange::new(d(2024, 3, 1), d(2024, 2, 1));
        assert!(range.is_inverted());
        assert!(range.span_days() < 0);
        assert_eq!(range.start, d(2024, 3, 1));
    }

    #[test]
    fn display_format() {
        let range = DateRange::new(d(2024, 1, 2), d(2024, 2, 1));
        assert_eq!(range.to_string(), "2024-01-02 to 2024-02-01");
    }
}
