use serde::{Serialize, Serializer};

use super::{Token, ValuationRecord};

/// Placeholder written for any valuation field nobody could supply.
pub const UNAVAILABLE: &str = "N/A";

/// A value that is either known or explicitly reported as unavailable.
///
/// Serializes as the bare value, or as the string `"N/A"`.
#[derive(Debug, Clone, PartialEq)]
pub enum Reported<T> {
    Available(T),
    Unavailable,
}

impl<T> Reported<T> {
    pub fn available(&self) -> Option<&T> {
        match self {
            Reported::Available(v) => Some(v),
            Reported::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Reported::Available(_))
    }
}

impl<T> From<Option<T>> for Reported<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Reported::Available(v),
            None => Reported::Unavailable,
        }
    }
}

impl Reported<f64> {
    /// Missing amounts and amounts of exactly zero are unavailable.
    pub fn amount(value: Option<f64>) -> Self {
        match value {
            Some(v) if v != 0.0 => Reported::Available(v),
            _ => Reported::Unavailable,
        }
    }
}

impl<T: Serialize> Serialize for Reported<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reported::Available(v) => v.serialize(serializer),
            Reported::Unavailable => serializer.serialize_str(UNAVAILABLE),
        }
    }
}

/// How valuation fields are rendered for clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Asset page prefix; the asset id is appended after a `/`.
    pub asset_link_base: String,
    /// Rounding applied to confidence range bounds.
    pub range_decimals: Option<u32>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            asset_link_base: "https://alt.xyz/assets".to_string(),
            range_decimals: None,
        }
    }
}

impl RenderOptions {
    pub fn asset_link(&self, asset_id: &str) -> String {
        format!("{}/{}", self.asset_link_base.trim_end_matches('/'), asset_id)
    }
}

/// The client-facing view of one held token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedToken {
    pub mint: Option<String>,
    pub name: Option<String>,
    pub grade: Option<String>,
    #[serde(rename = "grading_number")]
    pub grade_number: Option<String>,
    pub supply: Option<i64>,
    #[serde(rename = "img")]
    pub image: Option<String>,
    #[serde(rename = "alt_value")]
    pub valuation: Reported<f64>,
    #[serde(rename = "alt_range")]
    pub confidence_range: Reported<String>,
    #[serde(rename = "cartel_avg")]
    pub average_price: Reported<f64>,
    #[serde(rename = "alt_link")]
    pub asset_link: Reported<String>,
}

impl EnrichedToken {
    /// Merge a token with whatever valuation was found for it. Non-empty cache
    /// overrides replace the marketplace's display fields.
    pub fn assemble(token: &Token, record: Option<&ValuationRecord>, opts: &RenderOptions) -> Self {
        let overrides = record.and_then(ValuationRecord::overrides);
        let pick = |over: Option<&Option<String>>, fallback: &Option<String>| {
            over.and_then(|o| o.as_deref())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .or_else(|| fallback.clone())
        };

        let (valuation, confidence_range, average_price, supply) = match record {
            Some(ValuationRecord::Cached(c)) => (
                Reported::amount(c.value),
                Reported::from(c.confidence_range(opts.range_decimals)),
                Reported::amount(c.average_price),
                c.supply,
            ),
            Some(ValuationRecord::Fetched(f)) => (
                Reported::amount(Some(f.value)),
                Reported::Available(f.confidence_range(opts.range_decimals)),
                Reported::amount(Some(f.average_price)),
                Some(f.supply),
            ),
            None => (
                Reported::Unavailable,
                Reported::Unavailable,
                Reported::Unavailable,
                None,
            ),
        };

        let asset_link = record
            .and_then(ValuationRecord::asset_id)
            .filter(|id| !id.is_empty())
            .map(|id| opts.asset_link(id));

        Self {
            mint: token.mint.clone(),
            name: pick(overrides.map(|o| &o.name), &token.name),
            grade: pick(overrides.map(|o| &o.grade), &token.grading.grade),
            grade_number: pick(
                overrides.map(|o| &o.grade_number),
                &token.grading.grade_number,
            ),
            supply,
            image: pick(overrides.map(|o| &o.image), &token.image),
            valuation,
            confidence_range,
            average_price,
            asset_link: asset_link.into(),
        }
    }
}

/// One enriched inventory page, echoing the request's pagination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletHoldings {
    pub wallet: String,
    pub tokens: Vec<EnrichedToken>,
    pub count: usize,
    pub offset: u32,
    pub limit: u32,
}

impl WalletHoldings {
    pub fn new(wallet: impl Into<String>, tokens: Vec<EnrichedToken>, offset: u32, limit: u32) -> Self {
        Self {
            wallet: wallet.into(),
            count: tokens.len(),
            tokens,
            offset,
            limit,
        }
    }
}
