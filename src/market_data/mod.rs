mod aggregate;
mod builder;
mod postgres;
pub mod providers;
mod service;
mod sources;
mod store;

pub use aggregate::{
    aggregate_price, MarketTransaction, LIQUID_SUPPLY_THRESHOLD, RECENT_SALES, WINDOW_DAYS,
};
pub use builder::EnrichmentServiceBuilder;
pub use postgres::PgListingStore;
pub use service::{EnrichError, EnrichmentService};
pub use sources::{
    InventorySource, MemoryValuationCache, NoopValuationSource, NullValuationCache, PageRequest,
    ValuationCache, ValuationSource,
};
pub use store::{ListingRepository, ListingsError, MemoryListingRepository};
