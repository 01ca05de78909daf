//! Postgres-backed valuation cache and listings repository.
//!
//! Each call opens its own connection, runs one statement, and closes it.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, FromRow};
use tracing::debug;

use super::{ListingRepository, ValuationCache};
use crate::models::{
    CachedValuation, DisplayOverrides, ListingRecord, ListingsPage, PageWindow,
};

/// Column list shared by every listings query. Casts pin the wire types so
/// decoding does not depend on how the table was declared.
const LISTING_COLUMNS: &str = "\
    token_mint::text AS token_mint, \
    name::text AS name, \
    grade::text AS grade, \
    grade_num::text AS grade_num, \
    grading_id::text AS grading_id, \
    img_url::text AS img_url, \
    alt_value::float8 AS alt_value, \
    avg_price::float8 AS avg_price, \
    supply::int8 AS supply, \
    alt_asset_id::text AS alt_asset_id, \
    alt_value_lower_bound::float8 AS alt_value_lower_bound, \
    alt_value_upper_bound::float8 AS alt_value_upper_bound, \
    is_listed::int4 AS is_listed, \
    listed_at::timestamptz AS listed_at";

#[derive(Debug, FromRow)]
struct ListingRow {
    token_mint: String,
    name: Option<String>,
    grade: Option<String>,
    grade_num: Option<String>,
    grading_id: Option<String>,
    img_url: Option<String>,
    alt_value: Option<f64>,
    avg_price: Option<f64>,
    supply: Option<i64>,
    alt_asset_id: Option<String>,
    alt_value_lower_bound: Option<f64>,
    alt_value_upper_bound: Option<f64>,
    is_listed: Option<i32>,
    listed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<ListingRow> for CachedValuation {
    fn from(row: ListingRow) -> Self {
        CachedValuation {
            mint: row.token_mint,
            value: row.alt_value,
            average_price: row.avg_price,
            supply: row.supply,
            asset_id: row.alt_asset_id,
            lower_bound: row.alt_value_lower_bound,
            upper_bound: row.alt_value_upper_bound,
            overrides: DisplayOverrides {
                name: row.name,
                grade: row.grade,
                grade_number: row.grade_num,
                grading_id: row.grading_id,
                image: row.img_url,
            },
        }
    }
}

impl From<ListingRow> for ListingRecord {
    fn from(row: ListingRow) -> Self {
        ListingRecord {
            token_mint: row.token_mint,
            name: row.name,
            grade: row.grade,
            grade_num: row.grade_num,
            grading_id: row.grading_id,
            img_url: row.img_url,
            alt_value: row.alt_value,
            avg_price: row.avg_price,
            supply: row.supply,
            alt_asset_id: row.alt_asset_id,
            alt_value_lower_bound: row.alt_value_lower_bound,
            alt_value_upper_bound: row.alt_value_upper_bound,
            is_listed: row.is_listed,
            listed_at: row.listed_at,
        }
    }
}

/// The `listings` table of the marketplace database.
pub struct PgListingStore {
    options: PgConnectOptions,
    timeout: Duration,
}

impl PgListingStore {
    pub fn new(options: PgConnectOptions) -> Self {
        Self {
            options,
            timeout: Duration::from_secs(10),
        }
    }

    /// Upper bound on connect + query time for a single call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn connect(&self) -> Result<PgConnection> {
        PgConnection::connect_with(&self.options)
            .await
            .context("Failed to connect to listings database")
    }

    async fn bounded<T>(&self, what: &str, fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .with_context(|| format!("{what} timed out after {:?}", self.timeout))?
    }

    async fn query_by_mints(&self, mints: &[String]) -> Result<Vec<ListingRow>> {
        let mut conn = self.connect().await?;
        let sql = format!("SELECT {LISTING_COLUMNS} FROM listings WHERE token_mint = ANY($1)");
        let rows = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(mints)
            .fetch_all(&mut conn)
            .await
            .context("Failed to query cached valuations")?;
        conn.close().await.ok();
        Ok(rows)
    }

    async fn query_listed(&self) -> Result<Vec<ListingRow>> {
        let mut conn = self.connect().await?;
        let sql = format!("SELECT {LISTING_COLUMNS} FROM listings WHERE is_listed = 1");
        let rows = sqlx::query_as::<_, ListingRow>(&sql)
            .fetch_all(&mut conn)
            .await
            .context("Failed to query listed cards")?;
        conn.close().await.ok();
        Ok(rows)
    }

    async fn query_page(&self, window: PageWindow) -> Result<(Vec<ListingRow>, i64)> {
        let mut conn = self.connect().await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM listings")
            .fetch_one(&mut conn)
            .await
            .context("Failed to count listings")?;

        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM listings ORDER BY listed_at DESC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(window.limit as i64)
            .bind(window.offset() as i64)
            .fetch_all(&mut conn)
            .await
            .context("Failed to query listings page")?;
        conn.close().await.ok();
        Ok((rows, total))
    }
}

#[async_trait::async_trait]
impl ValuationCache for PgListingStore {
    async fn lookup(&self, mints: &[String]) -> Result<HashMap<String, CachedValuation>> {
        if mints.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = self
            .bounded("valuation cache lookup", self.query_by_mints(mints))
            .await?;
        debug!(requested = mints.len(), found = rows.len(), "cache lookup complete");

        Ok(rows
            .into_iter()
            .map(|row| (row.token_mint.clone(), CachedValuation::from(row)))
            .collect())
    }

    fn name(&self) -> &str {
        "postgres"
    }
}

#[async_trait::async_trait]
impl ListingRepository for PgListingStore {
    async fn listed(&self) -> Result<Vec<ListingRecord>> {
        let rows = self.bounded("listed cards query", self.query_listed()).await?;
        Ok(rows.into_iter().map(ListingRecord::from).collect())
    }

    async fn page(&self, window: PageWindow) -> Result<ListingsPage> {
        let (rows, total) = self.bounded("listings page query", self.query_page(window)).await?;
        let data = rows.into_iter().map(ListingRecord::from).collect();
        Ok(ListingsPage::new(data, window, total.max(0) as u64))
    }
}
