#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use cardfolio::market_data::{InventorySource, PageRequest, ValuationCache, ValuationSource};
use cardfolio::models::{
    CachedValuation, FetchedValuation, GradedAsset, GradingAttributes, Token, TokenTrait,
    CERT_ID_TRAIT, GRADE_TRAIT, GRADING_COMPANY_TRAIT,
};

/// A token carrying all three grading attributes.
pub fn graded_token(mint: &str, cert_id: &str, grade: &str, company: &str) -> Token {
    let traits = [
        TokenTrait::new(CERT_ID_TRAIT, cert_id),
        TokenTrait::new(GRADE_TRAIT, grade),
        TokenTrait::new(GRADING_COMPANY_TRAIT, company),
    ];
    Token::new(mint)
        .with_name(format!("Card {mint}"))
        .with_grading(GradingAttributes::from_traits(&traits))
}

pub fn fetched(asset_id: &str, value: f64) -> FetchedValuation {
    FetchedValuation {
        asset_id: asset_id.to_string(),
        value,
        average_price: value - 5.0,
        supply: 12,
        lower_bound: value - 20.0,
        upper_bound: value + 20.0,
        confidence: 0.75,
    }
}

/// Inventory returning a fixed page and recording every request.
#[derive(Default)]
pub struct MockInventory {
    tokens: Vec<Token>,
    error: Option<String>,
    requests: Mutex<Vec<(String, PageRequest)>>,
}

impl MockInventory {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            ..Self::default()
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<(String, PageRequest)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl InventorySource for MockInventory {
    async fn fetch_page(&self, wallet: &str, page: PageRequest) -> Result<Vec<Token>> {
        self.requests.lock().unwrap().push((wallet.to_string(), page));
        match &self.error {
            Some(message) => Err(anyhow!(message.clone())),
            None => Ok(self.tokens.clone()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Valuation source keyed by certificate id, with optional per-certificate
/// delays.
#[derive(Default)]
pub struct MockValuationSource {
    valuations: HashMap<String, FetchedValuation>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockValuationSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_valuation(mut self, cert_id: &str, valuation: FetchedValuation) -> Self {
        self.valuations.insert(cert_id.to_string(), valuation);
        self
    }

    pub fn with_delay(mut self, cert_id: &str, delay: Duration) -> Self {
        self.delays.insert(cert_id.to_string(), delay);
        self
    }

    /// Certificate ids looked up, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ValuationSource for MockValuationSource {
    async fn resolve(&self, asset: &GradedAsset) -> Option<FetchedValuation> {
        self.calls.lock().unwrap().push(asset.cert_id.clone());
        if let Some(delay) = self.delays.get(&asset.cert_id) {
            tokio::time::sleep(*delay).await;
        }
        self.valuations.get(&asset.cert_id).cloned()
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Cache that always fails, as an unreachable database would.
pub struct FailingCache;

#[async_trait]
impl ValuationCache for FailingCache {
    async fn lookup(&self, _mints: &[String]) -> Result<HashMap<String, CachedValuation>> {
        Err(anyhow!("connection refused"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}
