//! Wire-level types and transport for the remote creature catalog (PokeAPI v2).
//!
//! The rest of the crate talks to the catalog through the [`CatalogApi`]
//! trait; [`HttpCatalog`] is the production implementation and tests
//! substitute canned stubs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::errors::{FetchError, FetchResult};

/// Production catalog endpoint, without a trailing slash.
pub const DEFAULT_API_URL: &str = "https://pokeapi.co/api/v2/pokemon";

const ARTWORK_BASE: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/other/official-artwork";

/// Official-artwork sprite URL for a creature identifier.
pub fn artwork_url(id: u32) -> String {
    format!("{ARTWORK_BASE}/{id}.png")
}

/// Canonical catalog URL for a creature identifier.
pub fn canonical_url(id: u32) -> String {
    format!("{DEFAULT_API_URL}/{id}/")
}

/// One detail document as the catalog serves it. Every field beyond the
/// identifier and name is optional upstream and defaults to empty here.
#[derive(Debug, Deserialize, Clone)]
pub struct PokemonPayload {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub base_experience: Option<u32>,
    #[serde(default)]
    pub abilities: Vec<AbilitySlot>,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
    #[serde(default)]
    pub stats: Vec<StatSlot>,
    #[serde(default)]
    pub moves: Vec<MoveSlot>,
    #[serde(default)]
    pub sprites: Value,
    #[serde(default)]
    pub cries: Option<CriesPayload>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NamedResource {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AbilitySlot {
    #[serde(default)]
    pub is_hidden: bool,
    pub ability: Option<NamedResource>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatSlot {
    #[serde(default)]
    pub base_stat: u16,
    pub stat: Option<NamedResource>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TypeSlot {
    pub r#type: Option<NamedResource>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MoveSlot {
    pub r#move: Option<NamedResource>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CriesPayload {
    #[serde(default)]
    pub latest: Option<String>,
    #[serde(default)]
    pub legacy: Option<String>,
}

/// One page of the creature listing.
#[derive(Debug, Deserialize, Clone)]
pub struct PagePayload {
    pub count: u32,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub results: Vec<SummaryPayload>,
}

/// One listing entry: a name plus the canonical detail URL.
#[derive(Debug, Deserialize, Clone)]
pub struct SummaryPayload {
    pub name: String,
    pub url: String,
}

impl SummaryPayload {
    /// Extracts the creature identifier from the trailing URL segment.
    pub fn parse_id(&self) -> Option<u32> {
        self.url
            .split('/')
            .rev()
            .find(|segment| !segment.is_empty())?
            .parse()
            .ok()
    }
}

/// Read-only boundary to the remote creature catalog.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Fetches one detail document by identifier or name. Returns the raw
    /// JSON value so callers can retain the untouched payload.
    async fn detail(&self, key: &str) -> FetchResult<Value>;

    /// Fetches one page of the creature listing.
    async fn page(&self, offset: u32, limit: u32) -> FetchResult<PagePayload>;
}

/// reqwest-backed catalog client.
pub struct HttpCatalog {
    base_url: String,
    timeout: Duration,
    client: Client,
}

impl HttpCatalog {
    pub fn new(config: &ApiConfig) -> Self {
        HttpCatalog {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl CatalogApi for HttpCatalog {
    async fn detail(&self, key: &str) -> FetchResult<Value> {
        let url = format!("{}/{}", self.base_url, key);
        tracing::debug!("Fetching Pokemon detail from URL: {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| {
                tracing::error!("Failed to make HTTP request to {}: {}", url, err);
                FetchError::from(err)
            })?;

        if !response.status().is_success() {
            let err = FetchError::detail_status(response.status().as_u16());
            tracing::error!("{}", err);
            return Err(err);
        }

        response.json::<Value>().await.map_err(|err| {
            tracing::error!("Failed to parse JSON response from {}: {}", url, err);
            FetchError::Decode(err.to_string())
        })
    }

    async fn page(&self, offset: u32, limit: u32) -> FetchResult<PagePayload> {
        let url = format!("{}/?offset={}&limit={}", self.base_url, offset, limit);
        tracing::debug!("Fetching Pokemon page from URL: {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| {
                tracing::error!("Failed to make HTTP request to {}: {}", url, err);
                FetchError::from(err)
            })?;

        if !response.status().is_success() {
            let err = FetchError::page_status(response.status().as_u16());
            tracing::error!("{}", err);
            return Err(err);
        }

        response.json::<PagePayload>().await.map_err(|err| {
            tracing::error!("Failed to parse JSON response from {}: {}", url, err);
            FetchError::Decode(err.to_string())
        })
    }
}
