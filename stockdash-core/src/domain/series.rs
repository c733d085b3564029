//! PriceSeries: date-ordered records plus named derived columns.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::record::PriceRecord;
use crate::indicators::Indicator;

/// Column name of the 20-period moving average.
pub const MA20: &str = "MA20";
/// Column name of the 50-period moving average.
pub const MA50: &str = "MA50";

/// Price history for one symbol, ascending by trading date.
///
/// Derived columns hold one entry per record; `None` marks an undefined value
/// (warmup period or a gap in the input).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    records: Vec<PriceRecord>,
    #[serde(default)]
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl PriceSeries {
    /// Build a series, sorting records by date (stable for equal dates).
    pub fn new(symbol: impl Into<String>, mut records: Vec<PriceRecord>) -> Self {
        records.sort_by_key(|r| r.date);
        Self {
            symbol: symbol.into(),
            records,
            columns: BTreeMap::new(),
        }
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self::new(symbol, Vec::new())
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&PriceRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&PriceRecord> {
        self.records.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.close).collect()
    }

    pub fn volumes(&self) -> Vec<u64> {
        self.records.iter().map(|r| r.volume).collect()
    }

    /// Compute `indicator` over the records and store it under `name`,
    /// replacing any column of the same name.
    pub fn apply_indicator(&mut self, name: impl Into<String>, indicator: &dyn Indicator) {
        let mut values = indicator.compute(&self.records);
        values.resize(self.records.len(), None);
        self.columns.insert(name.into(), values);
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    pub fn ma20(&self) -> Option<&[Option<f64>]> {
        self.column(MA20)
    }

    pub fn ma50(&self) -> Option<&[Option<f64>]> {
        self.column(MA50)
    }
}
