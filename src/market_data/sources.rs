use std::collections::HashMap;

use anyhow::Result;

use crate::models::{CachedValuation, FetchedValuation, GradedAsset, Token};

/// Offset/limit of one inventory page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 20;

    pub fn new(offset: u32, limit: u32) -> Self {
        Self { offset, limit }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_LIMIT)
    }
}

/// Marketplace view of the cards a wallet holds.
#[async_trait::async_trait]
pub trait InventorySource: Send + Sync {
    /// One page of the wallet's tokens, in marketplace order.
    async fn fetch_page(&self, wallet: &str, page: PageRequest) -> Result<Vec<Token>>;

    fn name(&self) -> &str;
}

/// Read-only store of valuations computed earlier.
#[async_trait::async_trait]
pub trait ValuationCache: Send + Sync {
    /// Bulk lookup by mint address. Unknown mints are simply absent.
    async fn lookup(&self, mints: &[String]) -> Result<HashMap<String, CachedValuation>>;

    fn name(&self) -> &str;
}

/// External valuation service.
///
/// Resolution never fails: anything that goes wrong is logged by the
/// implementation and reported as `None`.
#[async_trait::async_trait]
pub trait ValuationSource: Send + Sync {
    async fn resolve(&self, asset: &GradedAsset) -> Option<FetchedValuation>;

    fn name(&self) -> &str;
}

/// Cache with nothing in it; used when no database is configured.
pub struct NullValuationCache;

#[async_trait::async_trait]
impl ValuationCache for NullValuationCache {
    async fn lookup(&self, _mints: &[String]) -> Result<HashMap<String, CachedValuation>> {
        Ok(HashMap::new())
    }

    fn name(&self) -> &str {
        "null"
    }
}

/// Valuation source that never knows anything; used when the service has no
/// credentials configured.
pub struct NoopValuationSource;

#[async_trait::async_trait]
impl ValuationSource for NoopValuationSource {
    async fn resolve(&self, _asset: &GradedAsset) -> Option<FetchedValuation> {
        None
    }

    fn name(&self) -> &str {
        "noop"
    }
}

/// In-memory cache, for tests and offline runs.
#[derive(Default)]
pub struct MemoryValuationCache {
    entries: tokio::sync::RwLock<HashMap<String, CachedValuation>>,
}

impl MemoryValuationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: impl IntoIterator<Item = CachedValuation>) -> Self {
        Self {
            entries: tokio::sync::RwLock::new(
                entries.into_iter().map(|e| (e.mint.clone(), e)).collect(),
            ),
        }
    }

    pub async fn insert(&self, entry: CachedValuation) {
        self.entries.write().await.insert(entry.mint.clone(), entry);
    }
}

#[async_trait::async_trait]
impl ValuationCache for MemoryValuationCache {
    async fn lookup(&self, mints: &[String]) -> Result<HashMap<String, CachedValuation>> {
        let entries = self.entries.read().await;
        Ok(mints
            .iter()
            .filter_map(|m| entries.get(m).map(|e| (m.clone(), e.clone())))
            .collect())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_cache_returns_only_known_mints() -> Result<()> {
        let mut known = CachedValuation::new("a");
        known.value = Some(10.0);
        let cache = MemoryValuationCache::with_entries([known.clone()]);
        cache.insert(CachedValuation::new("b")).await;

        let found = cache
            .lookup(&["a".to_string(), "zzz".to_string()])
            .await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found.get("a"), Some(&known));

        assert!(cache.lookup(&[]).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn null_cache_and_noop_source_are_empty() -> Result<()> {
        assert!(NullValuationCache.lookup(&["a".into()]).await?.is_empty());
        let asset = GradedAsset::new("1", "9", "PSA");
        assert_eq!(NoopValuationSource.resolve(&asset).await, None);
        Ok(())
    }
}
