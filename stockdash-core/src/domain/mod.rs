//! Domain types: daily price records, date ranges, price series.

pub mod range;
pub mod record;
pub mod series;

pub use range::DateRange;
pub use record::PriceRecord;
pub use series::{PriceSeries, MA20, MA50};
