use serde::{Deserialize, Serialize};

use crate::format::format_range;

/// Display fields the cache treats as authoritative over marketplace metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayOverrides {
    pub name: Option<String>,
    pub grade: Option<String>,
    pub grade_number: Option<String>,
    pub grading_id: Option<String>,
    pub image: Option<String>,
}

/// A previously computed valuation read from the relational cache.
///
/// Every column is nullable upstream, so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedValuation {
    pub mint: String,
    pub value: Option<f64>,
    pub average_price: Option<f64>,
    pub supply: Option<i64>,
    pub asset_id: Option<String>,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    #[serde(default)]
    pub overrides: DisplayOverrides,
}

impl CachedValuation {
    pub fn new(mint: impl Into<String>) -> Self {
        Self {
            mint: mint.into(),
            ..Default::default()
        }
    }

    /// `"lower - upper"`, only when both bounds are known.
    pub fn confidence_range(&self, decimals: Option<u32>) -> Option<String> {
        match (self.lower_bound, self.upper_bound) {
            (Some(lower), Some(upper)) => Some(format_range(lower, upper, decimals)),
            _ => None,
        }
    }
}

/// A valuation assembled from the external valuation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedValuation {
    pub asset_id: String,
    pub value: f64,
    pub average_price: f64,
    pub supply: i64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub confidence: f64,
}

impl FetchedValuation {
    pub fn confidence_range(&self, decimals: Option<u32>) -> String {
        format_range(self.lower_bound, self.upper_bound, decimals)
    }
}

/// Where a token's valuation came from. The cache always outranks a fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum ValuationRecord {
    Cached(CachedValuation),
    Fetched(FetchedValuation),
}

impl ValuationRecord {
    /// Pick the cache record if there is one, else the fetched record.
    pub fn prefer_cached(
        cached: Option<CachedValuation>,
        fetched: Option<FetchedValuation>,
    ) -> Option<Self> {
        cached
            .map(ValuationRecord::Cached)
            .or(fetched.map(ValuationRecord::Fetched))
    }

    pub fn asset_id(&self) -> Option<&str> {
        match self {
            ValuationRecord::Cached(c) => c.asset_id.as_deref(),
            ValuationRecord::Fetched(f) => Some(f.asset_id.as_str()),
        }
    }

    pub fn overrides(&self) -> Option<&DisplayOverrides> {
        match self {
            ValuationRecord::Cached(c) => Some(&c.overrides),
            ValuationRecord::Fetched(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetched() -> FetchedValuation {
        FetchedValuation {
            asset_id: "asset-1".into(),
            value: 250.0,
            average_price: 240.0,
            supply: 12,
            lower_bound: 200.0,
            upper_bound: 300.5,
            confidence: 0.8,
        }
    }

    #[test]
    fn cache_outranks_fetch() {
        let mut cached = CachedValuation::new("mint-1");
        cached.value = Some(100.0);

        let record = ValuationRecord::prefer_cached(Some(cached.clone()), Some(fetched()));
        assert_eq!(record, Some(ValuationRecord::Cached(cached)));

        let record = ValuationRecord::prefer_cached(None, Some(fetched()));
        assert_eq!(record, Some(ValuationRecord::Fetched(fetched())));

        assert_eq!(ValuationRecord::prefer_cached(None, None), None);
    }

    #[test]
    fn cached_range_needs_both_bounds() {
        let mut cached = CachedValuation::new("mint-1");
        cached.lower_bound = Some(90.0);
        assert_eq!(cached.confidence_range(None), None);

        cached.upper_bound = Some(110.25);
        assert_eq!(cached.confidence_range(None).as_deref(), Some("90 - 110.25"));
    }

    #[test]
    fn fetched_range_is_always_present() {
        assert_eq!(fetched().confidence_range(None), "200 - 300.5");
    }
}
