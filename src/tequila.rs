//! Typed client for the Tequila flight-search API
//!
//! All upstream access goes through the [`FlightApi`] trait so the
//! resolver and ranker can be exercised against stub implementations in
//! tests. The real client sends the configured API key on every request
//! and applies a bounded per-request timeout; it never retries.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::FarescoutConfig;
use crate::{FarescoutError, Result};

/// Location types understood by the locations endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationType {
    City,
    Airport,
    Country,
}

impl LocationType {
    /// Wire value for the `location_types` query parameter
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LocationType::City => "city",
            LocationType::Airport => "airport",
            LocationType::Country => "country",
        }
    }
}

/// Coordinates as the locations endpoints report them
#[derive(Debug, Clone, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Parent city attached to an airport record
#[derive(Debug, Clone, Deserialize)]
pub struct ParentCity {
    pub code: Option<String>,
    pub name: Option<String>,
}

/// A single location returned by `locations/query` or `locations/radius`
#[derive(Debug, Clone, Deserialize)]
pub struct LocationRecord {
    pub code: String,
    pub name: String,
    pub location: Coordinates,
    /// Parent city, present on airport records
    pub city: Option<ParentCity>,
    /// Prominence score, lower is more prominent
    pub rank: Option<i64>,
}

impl LocationRecord {
    /// Rank used for main-airport selection; unranked records sort last
    #[must_use]
    pub fn effective_rank(&self) -> i64 {
        self.rank.unwrap_or(i64::MAX)
    }
}

/// A fare returned by `v2/search`
#[derive(Debug, Clone, Deserialize)]
pub struct FareRecord {
    /// Fare price in the requested currency
    pub price: f64,
    /// Upstream-reported route distance in km, when available
    pub distance: Option<f64>,
}

/// Departure window for the fare search, in the API's `%d/%m/%Y` format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateWindow {
    pub date_from: String,
    pub date_to: String,
}

impl DateWindow {
    /// The next 24 hours starting from the current UTC date
    #[must_use]
    pub fn next_24_hours() -> Self {
        let now = Utc::now();
        Self {
            date_from: now.format("%d/%m/%Y").to_string(),
            date_to: (now + chrono::Duration::days(1)).format("%d/%m/%Y").to_string(),
        }
    }
}

/// Access to the upstream location and fare search service
#[async_trait]
pub trait FlightApi: Send + Sync {
    /// Active locations matching a free-text term, best match first
    async fn query_locations(
        &self,
        term: &str,
        location_type: LocationType,
        limit: u32,
    ) -> Result<Vec<LocationRecord>>;

    /// Active locations of a given type within `radius_km` of a coordinate
    async fn query_radius(
        &self,
        lat: f64,
        lon: f64,
        radius_km: u32,
        location_type: LocationType,
        limit: u32,
    ) -> Result<Vec<LocationRecord>>;

    /// Cheapest one-way fares between two airport codes inside the window,
    /// sorted by price
    async fn search_one_way(
        &self,
        from_code: &str,
        to_code: &str,
        window: &DateWindow,
        currency: &str,
    ) -> Result<Vec<FareRecord>>;
}

/// Envelope around the locations endpoints' response
#[derive(Debug, Deserialize)]
struct LocationsResponse {
    #[serde(default)]
    locations: Vec<LocationRecord>,
}

/// Envelope around the `v2/search` response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<FareRecord>,
}

/// HTTP client for the Tequila API
pub struct TequilaClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TequilaClient {
    /// Create a new client from the loaded configuration
    pub fn new(config: &FarescoutConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.tequila.timeout_seconds.into()))
            .user_agent(concat!("farescout/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FarescoutError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.tequila.base_url.trim_end_matches('/').to_string(),
            api_key: config.tequila.api_key.clone(),
        })
    }

    async fn get<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FarescoutError::upstream(format!(
                "{path} returned {status}"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FarescoutError::upstream(format!("Failed to parse {path} response: {e}")))
    }
}

#[async_trait]
impl FlightApi for TequilaClient {
    async fn query_locations(
        &self,
        term: &str,
        location_type: LocationType,
        limit: u32,
    ) -> Result<Vec<LocationRecord>> {
        let response: LocationsResponse = self
            .get(
                "locations/query",
                &[
                    ("term", term.to_string()),
                    ("location_types", location_type.as_str().to_string()),
                    ("limit", limit.to_string()),
                    ("active_only", "true".to_string()),
                ],
            )
            .await?;
        Ok(response.locations)
    }

    async fn query_radius(
        &self,
        lat: f64,
        lon: f64,
        radius_km: u32,
        location_type: LocationType,
        limit: u32,
    ) -> Result<Vec<LocationRecord>> {
        let response: LocationsResponse = self
            .get(
                "locations/radius",
                &[
                    ("lat", lat.to_string()),
                    ("lon", lon.to_string()),
                    ("radius", radius_km.to_string()),
                    ("location_types", location_type.as_str().to_string()),
                    ("limit", limit.to_string()),
                    ("active_only", "true".to_string()),
                ],
            )
            .await?;
        Ok(response.locations)
    }

    async fn search_one_way(
        &self,
        from_code: &str,
        to_code: &str,
        window: &DateWindow,
        currency: &str,
    ) -> Result<Vec<FareRecord>> {
        let response: SearchResponse = self
            .get(
                "v2/search",
                &[
                    ("fly_from", from_code.to_string()),
                    ("fly_to", to_code.to_string()),
                    ("date_from", window.date_from.clone()),
                    ("date_to", window.date_to.clone()),
                    ("flight_type", "oneway".to_string()),
                    ("one_for_city", "0".to_string()),
                    ("one_per_date", "0".to_string()),
                    ("adults", "1".to_string()),
                    ("curr", currency.to_string()),
                    ("sort", "price".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(response.data)
    }
}
