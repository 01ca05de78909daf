//! Magic Eden wallet inventory.
//!
//! `GET /v2/wallets/{wallet}/tokens` lists the tokens a wallet holds, filtered
//! by collection symbol and an attribute filter encoded as JSON.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::market_data::{InventorySource, PageRequest};
use crate::models::{GradingAttributes, Token, TokenTrait, TraitFilter};

const MAGIC_EDEN_API_BASE: &str = "https://api-mainnet.magiceden.dev/v2";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletToken {
    mint_address: Option<String>,
    name: Option<String>,
    image: Option<String>,
    #[serde(default)]
    attributes: Vec<TokenTrait>,
}

impl WalletToken {
    fn into_token(self) -> Token {
        Token {
            mint: self.mint_address.filter(|m| !m.is_empty()),
            name: self.name,
            image: self.image,
            grading: GradingAttributes::from_traits(&self.attributes),
        }
    }
}

/// Inventory source backed by the Magic Eden wallet tokens endpoint.
pub struct MagicEdenInventory {
    client: reqwest::Client,
    base_url: String,
    collection_symbol: String,
    filter: TraitFilter,
}

impl MagicEdenInventory {
    pub fn new(collection_symbol: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), collection_symbol)
    }

    pub fn with_client(client: reqwest::Client, collection_symbol: impl Into<String>) -> Self {
        Self {
            client,
            base_url: MAGIC_EDEN_API_BASE.to_string(),
            collection_symbol: collection_symbol.into(),
            filter: TraitFilter::new(),
        }
    }

    /// Point at a different API root (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_filter(mut self, filter: TraitFilter) -> Self {
        self.filter = filter;
        self
    }
}

#[async_trait::async_trait]
impl InventorySource for MagicEdenInventory {
    async fn fetch_page(&self, wallet: &str, page: PageRequest) -> Result<Vec<Token>> {
        let url = format!("{}/wallets/{}/tokens", self.base_url, wallet);

        let mut query = vec![
            ("collection_symbol", self.collection_symbol.clone()),
            ("limit", page.limit.to_string()),
            ("offset", page.offset.to_string()),
        ];
        if !self.filter.is_empty() {
            let attributes =
                serde_json::to_string(&self.filter).context("Failed to encode trait filter")?;
            query.push(("attributes", attributes));
        }

        let response = self
            .client
            .get(&url)
            .query(&query)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Magic Eden request failed for wallet {wallet}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Magic Eden API error: {} - {}", status, body));
        }

        let raw: Vec<WalletToken> = response
            .json()
            .await
            .context("Failed to decode Magic Eden wallet tokens")?;
        let tokens: Vec<Token> = raw.into_iter().map(WalletToken::into_token).collect();

        let unminted = tokens.iter().filter(|t| t.mint.is_none()).count();
        if unminted > 0 {
            debug!(wallet = %wallet, unminted, "tokens without a mint address");
        }

        Ok(tokens)
    }

    fn name(&self) -> &str {
        "magic_eden"
    }
}
