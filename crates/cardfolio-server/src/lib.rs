//! HTTP front end for wallet holdings and marketplace listings.

mod error;
mod handlers;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use cardfolio::config::Config;
use cardfolio::market_data::{EnrichmentService, EnrichmentServiceBuilder, ListingRepository};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};

/// Shared state behind every route.
pub struct AppState {
    pub enrichment: EnrichmentService,
    /// `None` when the listings database is not configured.
    pub listings: Option<Arc<dyn ListingRepository>>,
    pub default_limit: u32,
}

impl AppState {
    pub fn new(enrichment: EnrichmentService) -> Self {
        Self {
            enrichment,
            listings: None,
            default_limit: 20,
        }
    }

    pub fn with_listings(mut self, listings: Arc<dyn ListingRepository>) -> Self {
        self.listings = Some(listings);
        self
    }

    pub fn with_default_limit(mut self, limit: u32) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let builder = EnrichmentServiceBuilder::new(config);
        let listings = builder.listings().ok();
        let enrichment = builder.build()?;

        Ok(Self {
            enrichment,
            listings,
            default_limit: config.http.default_limit,
        })
    }
}

pub fn app_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/api/wallet-holdings", get(handlers::get_wallet_holdings))
        .route("/api/listings", get(handlers::get_listings))
        .route("/api/deals", get(handlers::get_deals))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
