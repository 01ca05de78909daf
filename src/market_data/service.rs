use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::{
    InventorySource, NoopValuationSource, NullValuationCache, PageRequest, ValuationCache,
    ValuationSource,
};
use crate::models::{
    CachedValuation, EnrichedToken, FetchedValuation, RenderOptions, Token, ValuationRecord,
    WalletHoldings,
};

#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("a wallet address is required")]
    MissingWallet,
    #[error("failed to fetch wallet inventory: {0:#}")]
    Inventory(#[source] anyhow::Error),
}

/// Enriches a wallet's card inventory with valuations.
///
/// Valuations come from the cache when present and from the external
/// valuation source otherwise. Only the inventory fetch can fail a request;
/// cache and valuation problems leave the affected tokens unvalued.
pub struct EnrichmentService {
    inventory: Arc<dyn InventorySource>,
    cache: Arc<dyn ValuationCache>,
    valuations: Arc<dyn ValuationSource>,
    resolve_timeout: Duration,
    render: RenderOptions,
}

impl EnrichmentService {
    pub fn new(inventory: Arc<dyn InventorySource>) -> Self {
        Self {
            inventory,
            cache: Arc::new(NullValuationCache),
            valuations: Arc::new(NoopValuationSource),
            resolve_timeout: Duration::from_secs(30),
            render: RenderOptions::default(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ValuationCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_valuation_source(mut self, source: Arc<dyn ValuationSource>) -> Self {
        self.valuations = source;
        self
    }

    /// Upper bound on one token's resolution; a timeout counts as no data.
    pub fn with_resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = timeout;
        self
    }

    pub fn with_render_options(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }

    /// Enrich one inventory page of `wallet`.
    pub async fn enrich(
        &self,
        wallet: &str,
        offset: u32,
        limit: u32,
    ) -> Result<WalletHoldings, EnrichError> {
        let wallet = wallet.trim();
        if wallet.is_empty() {
            return Err(EnrichError::MissingWallet);
        }

        let tokens = self
            .inventory
            .fetch_page(wallet, PageRequest::new(offset, limit))
            .await
            .map_err(EnrichError::Inventory)?;
        debug!(
            wallet = %wallet,
            tokens = tokens.len(),
            source = self.inventory.name(),
            "inventory page fetched"
        );

        let cached = self.cached_valuations(&tokens).await;
        let fetched = self.fetch_missing(&tokens, &cached).await;

        let enriched: Vec<EnrichedToken> = tokens
            .iter()
            .zip(fetched)
            .map(|(token, fetched)| {
                let hit = token.mint.as_ref().and_then(|mint| cached.get(mint)).cloned();
                let record = ValuationRecord::prefer_cached(hit, fetched);
                EnrichedToken::assemble(token, record.as_ref(), &self.render)
            })
            .collect();

        info!(
            wallet = %wallet,
            tokens = enriched.len(),
            valued = enriched.iter().filter(|t| t.valuation.is_available()).count(),
            "wallet holdings enriched"
        );

        Ok(WalletHoldings::new(wallet, enriched, offset, limit))
    }

    /// Cache records for every mint on the page. A failing cache counts as an
    /// empty one.
    async fn cached_valuations(&self, tokens: &[Token]) -> HashMap<String, CachedValuation> {
        let mints: Vec<String> = tokens.iter().filter_map(|t| t.mint.clone()).collect();
        if mints.is_empty() {
            return HashMap::new();
        }

        match self.cache.lookup(&mints).await {
            Ok(found) => {
                debug!(
                    requested = mints.len(),
                    hits = found.len(),
                    cache = self.cache.name(),
                    "cache lookup"
                );
                found
            }
            Err(e) => {
                warn!(
                    error = %e,
                    cache = self.cache.name(),
                    "valuation cache unavailable; fetching everything"
                );
                HashMap::new()
            }
        }
    }

    /// Resolve every token without a cache record, concurrently. The result is
    /// aligned with `tokens`; cached tokens, tokens without a mint and tokens
    /// lacking grading details get `None`.
    async fn fetch_missing(
        &self,
        tokens: &[Token],
        cached: &HashMap<String, CachedValuation>,
    ) -> Vec<Option<FetchedValuation>> {
        let lookups = tokens.iter().map(|token| async move {
            let Some(mint) = token.mint.as_deref() else {
                debug!(name = ?token.name, "token has no mint address; skipping valuation");
                return None;
            };
            if cached.contains_key(mint) {
                return None;
            }
            let Some(asset) = token.grading.graded_asset() else {
                debug!(mint = %mint, "token lacks grading details; skipping valuation");
                return None;
            };

            let resolution = self.valuations.resolve(&asset);
            match tokio::time::timeout(self.resolve_timeout, resolution).await {
                Ok(found) => found,
                Err(_) => {
                    warn!(
                        mint = %mint,
                        cert_id = %asset.cert_id,
                        timeout = ?self.resolve_timeout,
                        "valuation lookup timed out"
                    );
                    None
                }
            }
        });

        join_all(lookups).await
    }
}
