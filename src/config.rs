use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::postgres::PgConnectOptions;
use tracing::warn;

use crate::duration::{deserialize_duration, serialize_duration};
use crate::models::{RenderOptions, TraitFilter, CATEGORY_TRAIT, GRADING_COMPANY_TRAIT};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "cardfolio.toml";

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()).map(SecretString::from))
}

/// Wallet inventory (Magic Eden) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// API root, without the trailing `/wallets/...` path.
    pub base_url: String,

    /// Collection the wallet listing is restricted to.
    pub collection_symbol: String,

    /// Required value of the `Category` trait.
    pub category: Option<String>,

    /// Accepted values of the `Grading Company` trait.
    pub grading_companies: Vec<String>,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api-mainnet.magiceden.dev/v2".to_string(),
            collection_symbol: "collector_crypt".to_string(),
            category: Some("Pokemon".to_string()),
            grading_companies: vec!["PSA".to_string(), "Beckett".to_string(), "BGS".to_string()],
        }
    }
}

impl InventoryConfig {
    /// Attribute filter sent with every wallet request.
    pub fn trait_filter(&self) -> TraitFilter {
        TraitFilter::new()
            .one_of(CATEGORY_TRAIT, self.category.iter().cloned())
            .one_of(GRADING_COMPANY_TRAIT, self.grading_companies.iter().cloned())
    }
}

/// Valuation (Alt GraphQL) settings.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    pub graphql_url: String,

    /// Base for `alt_link`; the asset id is appended as a path segment.
    pub asset_link_base: String,

    /// Bearer token. Usually supplied through `ALT_AUTH_TOKEN`.
    #[serde(skip_serializing, deserialize_with = "deserialize_secret")]
    pub auth_token: Option<SecretString>,

    /// Session cookie. Usually supplied through `ALT_COOKIE`.
    #[serde(skip_serializing, deserialize_with = "deserialize_secret")]
    pub cookie: Option<SecretString>,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            graphql_url: "https://alt-platform-server.production.internal.onlyalt.com/graphql/"
                .to_string(),
            asset_link_base: "https://alt.xyz/assets".to_string(),
            auth_token: None,
            cookie: None,
        }
    }
}

impl ValuationConfig {
    /// Both credentials, when both are present.
    pub fn credentials(&self) -> Option<(SecretString, SecretString)> {
        match (&self.auth_token, &self.cookie) {
            (Some(token), Some(cookie)) => Some((
                SecretString::from(token.expose_secret().to_owned()),
                SecretString::from(cookie.expose_secret().to_owned()),
            )),
            _ => None,
        }
    }
}

/// Listings database connection parts.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
    pub user: Option<String>,

    /// Usually supplied through `POSTGRES_PASSWORD`.
    #[serde(skip_serializing, deserialize_with = "deserialize_secret")]
    pub password: Option<SecretString>,
}

impl DatabaseConfig {
    /// Connection options, or `None` unless every part is set.
    pub fn connect_options(&self) -> Option<PgConnectOptions> {
        let host = self.host.as_deref().filter(|s| !s.is_empty())?;
        let port = self.port?;
        let dbname = self.dbname.as_deref().filter(|s| !s.is_empty())?;
        let user = self.user.as_deref().filter(|s| !s.is_empty())?;
        let password = self.password.as_ref()?;

        Some(
            PgConnectOptions::new()
                .host(host)
                .port(port)
                .database(dbname)
                .username(user)
                .password(password.expose_secret()),
        )
    }

    pub fn is_complete(&self) -> bool {
        self.connect_options().is_some()
    }
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_resolve_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_page_limit() -> u32 {
    20
}

/// Outbound request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout for inventory, valuation and database calls.
    #[serde(
        default = "default_request_timeout",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub request_timeout: Duration,

    /// Bound on one token's whole valuation. A resolution makes at least two
    /// sequential requests, so this should exceed twice `request_timeout`.
    #[serde(
        default = "default_resolve_timeout",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub resolve_timeout: Duration,

    /// Page size used when a caller does not pass one.
    #[serde(default = "default_page_limit")]
    pub default_limit: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            resolve_timeout: default_resolve_timeout(),
            default_limit: default_page_limit(),
        }
    }
}

/// Output formatting settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// When set, confidence range bounds are rounded to this many places.
    pub range_decimals: Option<u32>,
}

/// Application configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(default)]
    pub inventory: InventoryConfig,

    #[serde(default)]
    pub valuation: ValuationConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Overlay values from the process environment.
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup`. Empty values are ignored.
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("POSTGRES_HOST") {
            self.database.host = Some(host);
        }
        if let Some(port) = get("POSTGRES_PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => self.database.port = Some(port),
                Err(_) => warn!(value = %port, "ignoring invalid POSTGRES_PORT"),
            }
        }
        if let Some(dbname) = get("POSTGRES_DB") {
            self.database.dbname = Some(dbname);
        }
        if let Some(user) = get("POSTGRES_USER") {
            self.database.user = Some(user);
        }
        if let Some(password) = get("POSTGRES_PASSWORD") {
            self.database.password = Some(SecretString::from(password));
        }
        if let Some(token) = get("ALT_AUTH_TOKEN") {
            self.valuation.auth_token = Some(SecretString::from(token));
        }
        if let Some(cookie) = get("ALT_COOKIE") {
            self.valuation.cookie = Some(SecretString::from(cookie));
        }

        self
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            asset_link_base: self.valuation.asset_link_base.clone(),
            range_decimals: self.display.range_decimals,
        }
    }
}
