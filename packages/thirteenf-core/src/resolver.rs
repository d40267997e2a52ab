//! CUSIP to ticker symbol resolution.
//!
//! The resolver is an explicit component: the caller builds it once around a
//! cache store and passes it by reference to the reporting code.

use crate::Result;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Storage for known CUSIP to symbol mappings.
pub trait TickerCache {
    /// Look up a symbol by CUSIP (9-char) or issue prefix (8-char).
    fn get(&self, cusip: &str) -> Option<String>;

    /// Record a mapping, replacing any existing one.
    fn insert(&mut self, cusip: &str, symbol: &str);

    /// Number of known mappings.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flush the mappings to durable storage, if any.
    fn persist(&self) -> Result<()>;
}

/// In-memory cache with no persistence.
#[derive(Debug, Clone, Default)]
pub struct MemoryTickerCache {
    entries: BTreeMap<String, String>,
}

impl MemoryTickerCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TickerCache for MemoryTickerCache {
    fn get(&self, cusip: &str) -> Option<String> {
        self.entries.get(cusip).cloned()
    }

    fn insert(&mut self, cusip: &str, symbol: &str) {
        self.entries.insert(cusip.to_string(), symbol.to_string());
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn persist(&self) -> Result<()> {
        Ok(())
    }
}

/// Cache backed by a JSON object file (`{"037833100": "AAPL", ...}`).
#[derive(Debug, Clone)]
pub struct JsonTickerCache {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonTickerCache {
    /// Open the cache at the default path.
    pub fn open_default() -> Self {
        Self::open(Self::default_path())
    }

    /// Open a cache file. A missing or unreadable file starts an empty cache.
    pub fn open(path: PathBuf) -> Self {
        let entries = match Self::load_from_path(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable ticker cache");
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    /// Get the default cache file path.
    ///
    /// Default path: `~/.thirteenf/ticker_cache.json`
    /// Can be overridden with `THIRTEENF_TICKER_CACHE` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("THIRTEENF_TICKER_CACHE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".thirteenf/ticker_cache.json"))
            .unwrap_or_else(|| PathBuf::from("ticker_cache.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_path(path: &Path) -> Result<BTreeMap<String, String>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl TickerCache for JsonTickerCache {
    fn get(&self, cusip: &str) -> Option<String> {
        self.entries.get(cusip).cloned()
    }

    fn insert(&mut self, cusip: &str, symbol: &str) {
        self.entries.insert(cusip.to_string(), symbol.to_string());
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

/// Resolves CUSIPs to display symbols through an injected cache.
#[derive(Debug, Clone)]
pub struct TickerResolver<C: TickerCache> {
    cache: C,
}

impl TickerResolver<MemoryTickerCache> {
    /// A resolver with an empty in-memory cache.
    pub fn in_memory() -> Self {
        Self::new(MemoryTickerCache::new())
    }
}

impl<C: TickerCache> TickerResolver<C> {
    pub fn new(cache: C) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn into_cache(self) -> C {
        self.cache
    }

    /// Resolve a CUSIP to a ticker symbol.
    ///
    /// Tries the full CUSIP first, then the 8-character issue prefix
    /// (CUSIP without its check digit).
    pub fn resolve(&self, cusip: &str) -> Option<String> {
        let cusip = cusip.trim();
        if cusip.is_empty() {
            return None;
        }

        self.cache.get(cusip).or_else(|| {
            cusip
                .get(..8)
                .filter(|prefix| *prefix != cusip)
                .and_then(|prefix| self.cache.get(prefix))
        })
    }

    /// A `$TICKER` label for display.
    ///
    /// Falls back to the first word of the issuer name, then to `$?`.
    pub fn display_symbol(&self, issuer: &str, cusip: &str) -> String {
        if let Some(symbol) = self.resolve(cusip) {
            return format!("${symbol}");
        }

        match issuer.split_whitespace().next() {
            Some(word) => format!("${}", word.to_uppercase()),
            None => "$?".to_string(),
        }
    }

    /// Record one mapping and persist the cache.
    pub fn insert(&mut self, cusip: &str, symbol: &str) -> Result<()> {
        self.cache.insert(cusip.trim(), symbol.trim());
        self.cache.persist()
    }

    /// Bulk-load mappings, keeping any existing entry for a CUSIP.
    ///
    /// Blank pairs are skipped. Returns how many mappings were added.
    pub fn import_pairs<I, S>(&mut self, pairs: I) -> Result<usize>
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for (cusip, symbol) in pairs {
            let (cusip, symbol) = (cusip.as_ref().trim(), symbol.as_ref().trim());
            if cusip.is_empty() || symbol.is_empty() || self.cache.get(cusip).is_some() {
                continue;
            }
            self.cache.insert(cusip, symbol);
            added += 1;
        }
        if added > 0 {
            self.cache.persist()?;
        }
        Ok(added)
    }
}
