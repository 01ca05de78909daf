use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of the marketplace listings table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub token_mint: String,
    pub name: Option<String>,
    pub grade: Option<String>,
    pub grade_num: Option<String>,
    pub grading_id: Option<String>,
    pub img_url: Option<String>,
    pub alt_value: Option<f64>,
    pub avg_price: Option<f64>,
    pub supply: Option<i64>,
    pub alt_asset_id: Option<String>,
    pub alt_value_lower_bound: Option<f64>,
    pub alt_value_upper_bound: Option<f64>,
    pub is_listed: Option<i32>,
    pub listed_at: Option<DateTime<Utc>>,
}

impl ListingRecord {
    pub fn new(token_mint: impl Into<String>) -> Self {
        Self {
            token_mint: token_mint.into(),
            ..Default::default()
        }
    }

    pub fn listed(&self) -> bool {
        self.is_listed == Some(1)
    }
}

/// Page number and size after clamping client input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub limit: u32,
}

impl PageWindow {
    pub const DEFAULT_LIMIT: u32 = 10;

    /// Pages start at 1; a non-positive limit falls back to the default.
    pub fn clamp(page: i64, limit: i64) -> Self {
        let page = if page < 1 { 1 } else { page.min(u32::MAX as i64) as u32 };
        let limit = if limit < 1 {
            Self::DEFAULT_LIMIT
        } else {
            limit.min(u32::MAX as i64) as u32
        };
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

/// A page of listings with totals for the whole table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingsPage {
    pub data: Vec<ListingRecord>,
    pub pagination: Pagination,
}

impl ListingsPage {
    pub fn new(data: Vec<ListingRecord>, window: PageWindow, total: u64) -> Self {
        Self {
            data,
            pagination: Pagination {
                page: window.page,
                limit: window.limit,
                total,
                total_pages: window.total_pages(total),
            },
        }
    }
}
