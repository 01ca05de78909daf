use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::market_data::providers::{AltValuationSource, MagicEdenInventory};
use crate::market_data::{
    EnrichmentService, ListingRepository, ListingsError, NoopValuationSource, NullValuationCache,
    PgListingStore, ValuationCache, ValuationSource,
};

/// Builds an [`EnrichmentService`] and the listings repository from [`Config`].
///
/// Optional collaborators are wired only when fully configured: the Postgres
/// cache needs every connection part, and the Alt source needs both
/// credentials. Anything missing is replaced by its null counterpart.
pub struct EnrichmentServiceBuilder<'a> {
    config: &'a Config,
    client: Option<reqwest::Client>,
    clock: Arc<dyn Clock>,
    offline_only: bool,
}

impl<'a> EnrichmentServiceBuilder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            client: None,
            clock: Arc::new(SystemClock),
            offline_only: false,
        }
    }

    /// Disable the valuation source; only cached valuations are reported.
    pub fn offline_only(mut self) -> Self {
        self.offline_only = true;
        self
    }

    /// Share a caller-provided HTTP client instead of building one.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn http_client(&self) -> Result<reqwest::Client> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }
        reqwest::Client::builder()
            .timeout(self.config.http.request_timeout)
            .build()
            .context("Failed to build HTTP client")
    }

    fn listing_store(&self) -> Option<Arc<PgListingStore>> {
        self.config.database.connect_options().map(|options| {
            Arc::new(PgListingStore::new(options).with_timeout(self.config.http.request_timeout))
        })
    }

    /// The listings repository, when the database is configured.
    pub fn listings(&self) -> Result<Arc<dyn ListingRepository>, ListingsError> {
        match self.listing_store() {
            Some(store) => Ok(store as Arc<dyn ListingRepository>),
            None => Err(ListingsError::NotConfigured),
        }
    }

    pub fn build(self) -> Result<EnrichmentService> {
        let client = self.http_client()?;
        let inventory_config = &self.config.inventory;

        let inventory = MagicEdenInventory::with_client(
            client.clone(),
            inventory_config.collection_symbol.clone(),
        )
        .with_base_url(inventory_config.base_url.clone())
        .with_filter(inventory_config.trait_filter());

        let cache: Arc<dyn ValuationCache> = match self.listing_store() {
            Some(store) => store as Arc<dyn ValuationCache>,
            None => {
                info!("listings database not configured; valuation cache disabled");
                Arc::new(NullValuationCache)
            }
        };

        let valuations: Arc<dyn ValuationSource> = match self.config.valuation.credentials() {
            _ if self.offline_only => Arc::new(NoopValuationSource),
            Some((token, cookie)) => Arc::new(
                AltValuationSource::with_client(client)
                    .with_endpoint(self.config.valuation.graphql_url.clone())
                    .with_credentials(token, cookie)
                    .with_clock(self.clock.clone()),
            ),
            None => {
                info!("Alt credentials not configured; valuation lookups disabled");
                Arc::new(NoopValuationSource)
            }
        };

        Ok(EnrichmentService::new(Arc::new(inventory))
            .with_cache(cache)
            .with_valuation_source(valuations)
            .with_resolve_timeout(self.config.http.resolve_timeout)
            .with_render_options(self.config.render_options()))
    }
}
