//! Ticker catalog: display name to ticker symbol.
//!
//! The catalog file holds one `Display Name:TICKER` pair per line. Lines
//! without a colon are ignored. When the file cannot be used the catalog falls
//! back to a single Apple entry so the dashboard always has something to show.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::data::memo::MemoCache;

pub const FALLBACK_NAME: &str = "Apple";
pub const FALLBACK_TICKER: &str = "AAPL";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("cannot read ticker catalog {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("ticker catalog {} has no `Name:Ticker` entries", path.display())]
    Empty { path: PathBuf },

    #[error("unknown company: {name}")]
    UnknownCompany { name: String },
}

/// Ordered mapping from display name to ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerCatalog {
    entries: BTreeMap<String, String>,
}

impl TickerCatalog {
    /// Parse catalog text. Splits each line on its first `:`; later duplicates
    /// overwrite earlier ones. May return an empty catalog.
    pub fn parse(content: &str) -> Self {
        let mut entries = BTreeMap::new();
        for line in content.lines() {
            if let Some((name, ticker)) = line.split_once(':') {
                entries.insert(name.trim().to_string(), ticker.trim().to_string());
            }
        }
        Self { entries }
    }

    /// Load a catalog from a file, without fallback.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let catalog = Self::parse(&content);
        if catalog.is_empty() {
            return Err(CatalogError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(catalog)
    }

    /// The single-entry catalog used when the file is unusable.
    pub fn fallback() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(FALLBACK_NAME.to_string(), FALLBACK_TICKER.to_string());
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|t| t.as_str())
    }

    /// Ticker for a display name.
    pub fn resolve(&self, name: &str) -> Result<&str, CatalogError> {
        self.get(name).ok_or_else(|| CatalogError::UnknownCompany {
            name: name.to_string(),
        })
    }

    /// Display names in selector order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), t.as_str()))
    }

    pub fn first_name(&self) -> Option<&str> {
        self.names().next()
    }

    /// Position of `name` in selector order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names().position(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A catalog that is always usable, plus the reason if it is the fallback.
#[derive(Debug, Clone)]
pub struct CatalogLoad {
    pub catalog: Arc<TickerCatalog>,
    pub error: Option<CatalogError>,
}

impl CatalogLoad {
    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }
}

/// Load `path`, falling back to `{"Apple": "AAPL"}` on any failure.
pub fn load_catalog(path: &Path) -> CatalogLoad {
    match TickerCatalog::from_file(path) {
        Ok(catalog) => {
            tracing::info!(path = %path.display(), entries = catalog.len(), "loaded ticker catalog");
            CatalogLoad {
                catalog: Arc::new(catalog),
                error: None,
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "using fallback ticker catalog");
            CatalogLoad {
                catalog: Arc::new(TickerCatalog::fallback()),
                error: Some(e),
            }
        }
    }
}

/// Loads each catalog path once and keeps the result for the life of the loader.
pub struct CatalogLoader {
    cache: MemoCache<PathBuf, CatalogLoad>,
}

impl CatalogLoader {
    pub fn new() -> Self {
        Self {
            cache: MemoCache::unbounded(),
        }
    }

    pub fn load(&self, path: &Path) -> CatalogLoad {
        self.cache.get_or_insert_with(path.to_path_buf(), || load_catalog(path))
    }
}

impl Default for CatalogLoader {
    fn default() -> Self {
        Self::new()
    }
}
