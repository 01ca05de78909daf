//! Representative recent sale price for a graded card population.
//!
//! Large populations trade often enough that a time-windowed average is
//! meaningful; small ones do not, so they use the last few sales instead.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

/// Populations above this size are priced from the recent daily window.
pub const LIQUID_SUPPLY_THRESHOLD: i64 = 3000;
/// Length of the daily window, in days before now.
pub const WINDOW_DAYS: i64 = 15;
/// Number of most recent sales averaged for small populations.
pub const RECENT_SALES: usize = 4;

/// A completed sale as reported by the valuation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketTransaction {
    /// ISO-8601 date or timestamp (`2024-05-01T13:22:00Z`).
    pub date: String,
    #[serde(deserialize_with = "deserialize_price")]
    pub price: f64,
}

impl MarketTransaction {
    pub fn new(date: impl Into<String>, price: f64) -> Self {
        Self {
            date: date.into(),
            price,
        }
    }

    /// Calendar day of the sale; anything after a `T` is ignored.
    pub fn day(&self) -> Option<NaiveDate> {
        let day = self.date.split('T').next().unwrap_or_default();
        NaiveDate::parse_from_str(day.trim(), "%Y-%m-%d").ok()
    }
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Price {
        Number(f64),
        Text(String),
    }

    match Price::deserialize(deserializer)? {
        Price::Number(n) => Ok(n),
        Price::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid price {s:?}"))),
    }
}

/// Average recent price for a population of `supply` cards.
///
/// - `supply > 3000`: sales whose day starts at or after `now - 15 days` are
///   grouped by day; the result is the mean of the daily means.
/// - otherwise: the mean of the first four sales, in the order given (the
///   service lists newest first).
///
/// Returns `0.0` when nothing qualifies.
pub fn aggregate_price(transactions: &[MarketTransaction], supply: i64, now: DateTime<Utc>) -> f64 {
    if supply > LIQUID_SUPPLY_THRESHOLD {
        windowed_daily_mean(transactions, now)
    } else {
        mean(transactions.iter().take(RECENT_SALES).map(|tx| tx.price))
    }
}

fn windowed_daily_mean(transactions: &[MarketTransaction], now: DateTime<Utc>) -> f64 {
    let cutoff = (now - chrono::Duration::days(WINDOW_DAYS)).naive_utc();

    let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for tx in transactions {
        let Some(day) = tx.day() else {
            continue;
        };
        if day.and_time(NaiveTime::default()) >= cutoff {
            by_day.entry(day).or_default().push(tx.price);
        }
    }

    mean(by_day.values().map(|prices| mean(prices.iter().copied())))
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}
