//! Alt valuation service (GraphQL).
//!
//! A card is resolved in two steps: its grading certificate is mapped to an
//! Alt asset id, then the asset's value estimate, population counts and sale
//! history for the card's grade are requested together.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::market_data::{aggregate_price, MarketTransaction, ValuationSource};
use crate::models::{format_grade, FetchedValuation, GradedAsset};

const ALT_GRAPHQL_URL: &str = "https://alt-platform-server.production.internal.onlyalt.com/graphql/";

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:142.0) Gecko/20100101 Firefox/142.0";
const APP_ORIGIN: &str = "https://app.alt.xyz";

const CERT_QUERY: &str = "query Cert($certNumber: String!) { cert(certNumber: $certNumber) { asset { id name __typename } __typename } }";

const ASSET_DETAILS_QUERY: &str = r#"
query AssetDetails($id: ID!, $tsFilter: TimeSeriesFilter!) {
  asset(id: $id) {
    altValueInfo(tsFilter: $tsFilter) {
      currentAltValue
      confidenceData {
        currentConfidenceMetric
        currentErrorLowerBound
        currentErrorUpperBound
      }
    }
    cardPops {
      gradingCompany
      gradeNumber
      count
    }
  }
}
"#;

const MARKET_TRANSACTIONS_QUERY: &str = r#"
query AssetMarketTransactions($id: ID!, $marketTransactionFilter: MarketTransactionFilter!) {
  asset(id: $id) {
    marketTransactions(marketTransactionFilter: $marketTransactionFilter) {
      date
      price
    }
  }
}
"#;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphQlRequest<'a> {
    operation_name: &'a str,
    variables: serde_json::Value,
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct CertData {
    cert: Option<CertNode>,
}

#[derive(Debug, Deserialize)]
struct CertNode {
    asset: Option<AssetRef>,
}

#[derive(Debug, Deserialize)]
struct AssetRef {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsData {
    asset: Option<AssetDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetDetails {
    alt_value_info: Option<AltValueInfo>,
    #[serde(default)]
    card_pops: Option<Vec<CardPop>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AltValueInfo {
    current_alt_value: Option<f64>,
    confidence_data: Option<ConfidenceData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfidenceData {
    current_confidence_metric: Option<f64>,
    current_error_lower_bound: Option<f64>,
    current_error_upper_bound: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardPop {
    grading_company: Option<String>,
    grade_number: Option<serde_json::Value>,
    count: Option<i64>,
}

impl CardPop {
    /// Grade as text. Numbers follow the service's own rendering, where a
    /// whole float keeps one decimal (`9.0`) and an integer has none (`9`).
    fn grade_text(&self) -> Option<String> {
        match self.grade_number.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) if n.is_f64() => {
                let f = n.as_f64()?;
                if f.fract() == 0.0 {
                    Some(format!("{f:.1}"))
                } else {
                    Some(f.to_string())
                }
            }
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TransactionsData {
    asset: Option<TransactionsAsset>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionsAsset {
    #[serde(default)]
    market_transactions: Option<Vec<MarketTransaction>>,
}

/// Population count for the card's grading company and formatted grade.
fn population_supply(pops: &[CardPop], company: &str, grade: &str) -> i64 {
    pops.iter()
        .find(|p| {
            p.grading_company.as_deref() == Some(company)
                && p.grade_text().as_deref() == Some(grade)
        })
        .and_then(|p| p.count)
        .unwrap_or(0)
}

/// Valuation source backed by Alt's GraphQL API.
///
/// The API requires both a bearer token and a session cookie; without them
/// no request is made and every card resolves to nothing.
pub struct AltValuationSource {
    client: reqwest::Client,
    endpoint: String,
    auth_token: Option<SecretString>,
    cookie: Option<SecretString>,
    clock: Arc<dyn Clock>,
}

impl AltValuationSource {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: ALT_GRAPHQL_URL.to_string(),
            auth_token: None,
            cookie: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_credentials(mut self, auth_token: SecretString, cookie: SecretString) -> Self {
        self.auth_token = Some(auth_token);
        self.cookie = Some(cookie);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    async fn post<T: DeserializeOwned>(
        &self,
        operation_name: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<Option<T>> {
        let (Some(token), Some(cookie)) = (&self.auth_token, &self.cookie) else {
            return Err(anyhow!("Alt credentials are not configured"));
        };

        let body = GraphQlRequest {
            operation_name,
            variables,
            query,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "*/*")
            .header("Referer", format!("{APP_ORIGIN}/"))
            .header("Origin", APP_ORIGIN)
            .header("authorization", format!("Bearer {}", token.expose_secret()))
            .header("Cookie", cookie.expose_secret())
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Alt {operation_name} request failed"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Alt {} error: {} - {}", operation_name, status, body));
        }

        let parsed: GraphQlResponse<T> = response
            .json()
            .await
            .with_context(|| format!("Failed to decode Alt {operation_name} response"))?;
        Ok(parsed.data)
    }

    /// Map a grading certificate number to an Alt asset id.
    async fn asset_id_for_cert(&self, cert_id: &str) -> Result<Option<String>> {
        let data: Option<CertData> = self
            .post("Cert", CERT_QUERY, json!({ "certNumber": cert_id }))
            .await?;

        Ok(data
            .and_then(|d| d.cert)
            .and_then(|c| c.asset)
            .and_then(|a| a.id)
            .filter(|id| !id.is_empty()))
    }

    async fn asset_details(&self, asset_id: &str, grade: &str, company: &str) -> Result<AssetDetails> {
        let data: Option<DetailsData> = self
            .post(
                "AssetDetails",
                ASSET_DETAILS_QUERY,
                json!({
                    "id": asset_id,
                    "tsFilter": { "gradeNumber": grade, "gradingCompany": company },
                }),
            )
            .await?;
        Ok(data.and_then(|d| d.asset).unwrap_or_default())
    }

    async fn market_transactions(
        &self,
        asset_id: &str,
        grade: &str,
        company: &str,
    ) -> Result<Vec<MarketTransaction>> {
        let data: Option<TransactionsData> = self
            .post(
                "AssetMarketTransactions",
                MARKET_TRANSACTIONS_QUERY,
                json!({
                    "id": asset_id,
                    "marketTransactionFilter": {
                        "gradingCompany": company,
                        "gradeNumber": grade,
                        "showSkipped": true,
                    },
                }),
            )
            .await?;
        Ok(data
            .and_then(|d| d.asset)
            .and_then(|a| a.market_transactions)
            .unwrap_or_default())
    }

    async fn try_resolve(&self, asset: &GradedAsset) -> Result<Option<FetchedValuation>> {
        let Some(grade) = format_grade(&asset.grade) else {
            debug!(cert_id = %asset.cert_id, grade = %asset.grade, "grade is not numeric");
            return Ok(None);
        };

        let Some(asset_id) = self.asset_id_for_cert(&asset.cert_id).await? else {
            debug!(cert_id = %asset.cert_id, "no Alt asset for certificate");
            return Ok(None);
        };

        let company = asset.grading_company.as_str();
        let (details, transactions) = tokio::join!(
            self.asset_details(&asset_id, &grade, company),
            self.market_transactions(&asset_id, &grade, company),
        );
        let details = details?;
        let transactions = transactions?;

        let supply = population_supply(
            details.card_pops.as_deref().unwrap_or_default(),
            company,
            &grade,
        );
        let average_price = aggregate_price(&transactions, supply, self.clock.now());

        let info = details.alt_value_info.unwrap_or_default();
        let confidence = info.confidence_data.unwrap_or_default();

        Ok(Some(FetchedValuation {
            asset_id,
            value: info.current_alt_value.unwrap_or(0.0),
            average_price,
            supply,
            lower_bound: confidence.current_error_lower_bound.unwrap_or(0.0),
            upper_bound: confidence.current_error_upper_bound.unwrap_or(0.0),
            confidence: confidence.current_confidence_metric.unwrap_or(0.0),
        }))
    }
}

impl Default for AltValuationSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ValuationSource for AltValuationSource {
    async fn resolve(&self, asset: &GradedAsset) -> Option<FetchedValuation> {
        if self.auth_token.is_none() || self.cookie.is_none() {
            return None;
        }

        match self.try_resolve(asset).await {
            Ok(valuation) => valuation,
            Err(e) => {
                warn!(cert_id = %asset.cert_id, error = %e, "Alt valuation lookup failed");
                None
            }
        }
    }

    fn name(&self) -> &str {
        "alt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pops() -> Vec<CardPop> {
        serde_json::from_str(
            r#"[
                {"gradingCompany": "PSA", "gradeNumber": "10.0", "count": 120},
                {"gradingCompany": "PSA", "gradeNumber": 9.0, "count": 4100},
                {"gradingCompany": "BGS", "gradeNumber": "9.0", "count": 7},
                {"gradingCompany": "PSA", "gradeNumber": 8, "count": 33}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn supply_matches_company_and_formatted_grade() {
        let pops = pops();
        assert_eq!(population_supply(&pops, "PSA", "10.0"), 120);
        assert_eq!(population_supply(&pops, "PSA", "9.0"), 4100);
        assert_eq!(population_supply(&pops, "BGS", "9.0"), 7);
    }

    #[test]
    fn supply_uses_exact_strings_not_numbers() {
        let pops = pops();
        // integer 8 renders as "8", so "8.0" does not match
        assert_eq!(population_supply(&pops, "PSA", "8.0"), 0);
        assert_eq!(population_supply(&pops, "CGC", "10.0"), 0);
        assert_eq!(population_supply(&[], "PSA", "10.0"), 0);
    }

    #[tokio::test]
    async fn missing_credentials_resolve_to_nothing() {
        let source = AltValuationSource::new().with_endpoint("http://127.0.0.1:1/graphql");
        let asset = GradedAsset::new("123", "9", "PSA");
        assert_eq!(source.resolve(&asset).await, None);
    }
}
