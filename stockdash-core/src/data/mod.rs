//! Price data: providers, the memo cache and the memoized fetcher.

pub mod csv_provider;
pub mod fetcher;
pub mod memo;
pub mod provider;
pub mod yahoo;

pub use csv_provider::CsvProvider;
pub use fetcher::{FetchKey, NoCache, PriceFetcher, SeriesCache};
pub use memo::{CacheStats, Eviction, MemoCache};
pub use provider::{DataProvider, DataSource, FetchError, FetchResult};
pub use yahoo::YahooProvider;

use std::sync::Arc;

use crate::config::{CacheConfig, CachePolicy, ProviderConfig, ProviderKind};
use crate::domain::PriceSeries;

/// Build the provider selected by `config`.
pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn DataProvider>, FetchError> {
    let provider: Arc<dyn DataProvider> = match config.kind {
        ProviderKind::Yahoo => Arc::new(YahooProvider::with_base_url(
            config.timeout(),
            &config.user_agent,
            &config.base_url,
        )?),
        ProviderKind::Csv => Arc::new(CsvProvider::new(&config.data_dir)),
    };
    Ok(provider)
}

/// Build the series cache selected by `config`.
pub fn build_cache(config: &CacheConfig) -> Arc<dyn SeriesCache> {
    let eviction = match config.policy {
        CachePolicy::Unbounded => Eviction::Unbounded,
        CachePolicy::Lru => Eviction::Lru {
            capacity: config.capacity,
        },
    };
    Arc::new(MemoCache::<FetchKey, Arc<PriceSeries>>::new(eviction))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_csv_provider() {
        let config = ProviderConfig {
            kind: ProviderKind::Csv,
            ..ProviderConfig::default()
        };
        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.name(), "csv");
    }

    #[test]
    fn builds_yahoo_provider() {
        let provider = build_provider(&ProviderConfig::default()).unwrap();
        assert_eq!(provider.name(), "yahoo_finance");
    }

    #[test]
    fn lru_cache_respects_capacity() {
        let cache = build_cache(&CacheConfig {
            policy: CachePolicy::Lru,
            capacity: 2,
        });
        let series = Arc::new(PriceSeries::empty("X"));
        let day = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        for ticker in ["A", "B", "C"] {
            cache.insert(FetchKey::new(ticker, day, day), Arc::clone(&series));
        }
        assert_eq!(cache.len(), 2);
    }
}
