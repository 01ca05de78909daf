use anyhow::Result;

use crate::models::{ListingRecord, ListingsPage, PageWindow};

#[derive(Debug, thiserror::Error)]
pub enum ListingsError {
    #[error("database configuration is incomplete")]
    NotConfigured,
    #[error("could not connect to or query the database: {0:#}")]
    Query(#[source] anyhow::Error),
}

/// Read access to the marketplace listings table.
#[async_trait::async_trait]
pub trait ListingRepository: Send + Sync {
    /// Every row currently flagged as listed.
    async fn listed(&self) -> Result<Vec<ListingRecord>>;

    /// One page of all rows, newest listing first, with table totals.
    async fn page(&self, window: PageWindow) -> Result<ListingsPage>;
}

/// In-memory listings table, for tests and offline runs.
#[derive(Default)]
pub struct MemoryListingRepository {
    rows: tokio::sync::RwLock<Vec<ListingRecord>>,
}

impl MemoryListingRepository {
    pub fn new(rows: Vec<ListingRecord>) -> Self {
        Self {
            rows: tokio::sync::RwLock::new(rows),
        }
    }
}

#[async_trait::async_trait]
impl ListingRepository for MemoryListingRepository {
    async fn listed(&self) -> Result<Vec<ListingRecord>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|r| r.listed()).cloned().collect())
    }

    async fn page(&self, window: PageWindow) -> Result<ListingsPage> {
        let rows = self.rows.read().await;
        let mut sorted: Vec<_> = rows.iter().cloned().collect();
        // Postgres sorts NULLs first under DESC.
        sorted.sort_by(|a, b| match (a.listed_at, b.listed_at) {
            (None, None) => std::cmp::Ordering::Equal,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (Some(_), None) => std::cmp::Ordering::Greater,
            (Some(x), Some(y)) => y.cmp(&x),
        });

        let data = sorted
            .into_iter()
            .skip(window.offset() as usize)
            .take(window.limit as usize)
            .collect();
        Ok(ListingsPage::new(data, window, rows.len() as u64))
    }
}
