//! Location resolution: free-text place name to a single main airport
//!
//! The waterfall tries a city match first, then a direct airport match,
//! then a country/territory match; the first step that produces an
//! airport wins. City and country matches are refined to one "main"
//! airport by picking the most prominent (lowest-rank) airport within a
//! radius of the matched coordinates. Countries get a wider radius since
//! they have no single central point.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Serialize;
use tracing::debug;

use crate::tequila::{FlightApi, LocationRecord, LocationType};
use crate::{FarescoutError, Result};

/// Radius around a matched city used to look for its main airport
const CITY_RADIUS_KM: u32 = 80;

/// Wider radius for country matches
const COUNTRY_RADIUS_KM: u32 = 300;

/// How many airports to consider when picking the main one
const RADIUS_AIRPORT_LIMIT: u32 = 20;

/// Synonym table mapping common alternate names to a canonical city,
/// keyed lowercase. Shipped as data so it can be versioned and localized
/// without touching the lookup logic.
static SYNONYMS: LazyLock<HashMap<String, String>> = LazyLock::new(|| {
    serde_json::from_str(include_str!("../data/synonyms.json"))
        .expect("data/synonyms.json must be a string-to-string map")
});

/// A resolved location, pinned to exactly one airport
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Airport {
    pub city_code: Option<String>,
    pub city_name: Option<String>,
    pub airport_code: String,
    pub airport_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Airport {
    /// Build from an airport record, deriving city fields from the parent
    /// city when present and falling back to the airport's own code/name
    fn from_record(record: LocationRecord) -> Self {
        let (city_code, city_name) = match record.city {
            Some(city) => (
                city.code.or_else(|| Some(record.code.clone())),
                city.name.or_else(|| Some(record.name.clone())),
            ),
            None => (Some(record.code.clone()), Some(record.name.clone())),
        };
        Self {
            city_code,
            city_name,
            airport_code: record.code,
            airport_name: record.name,
            latitude: record.location.lat,
            longitude: record.location.lon,
        }
    }
}

/// Service for resolving place names against the locations endpoints
pub struct LocationResolver<'a> {
    api: &'a dyn FlightApi,
}

impl<'a> LocationResolver<'a> {
    #[must_use]
    pub fn new(api: &'a dyn FlightApi) -> Self {
        Self { api }
    }

    /// Resolve a free-text place name to its main airport
    pub async fn resolve(&self, term: &str) -> Result<Airport> {
        let trimmed = term.trim();
        if trimmed.is_empty() {
            return Err(FarescoutError::invalid_input("Empty location term"));
        }

        let query = SYNONYMS
            .get(&trimmed.to_lowercase())
            .map_or(trimmed, String::as_str);
        debug!("Resolving '{}' (lookup term: '{}')", term, query);

        // 1) City: best name match, then its main airport nearby
        if let Some(city) = self.best_match(query, LocationType::City).await? {
            if let Some(main) = self
                .main_airport_near(city.location.lat, city.location.lon, CITY_RADIUS_KM)
                .await?
            {
                let mut airport = Airport::from_record(main);
                airport.city_name = Some(city.name);
                airport.city_code = Some(city.code);
                debug!("'{}' resolved via city match to {}", term, airport.airport_code);
                return Ok(airport);
            }
        }

        // 2) Airport: direct name/code match
        if let Some(record) = self.best_match(query, LocationType::Airport).await? {
            debug!("'{}' resolved via airport match to {}", term, record.code);
            return Ok(Airport::from_record(record));
        }

        // 3) Country/territory: main airport within the wider radius
        if let Some(country) = self.best_match(query, LocationType::Country).await? {
            if let Some(main) = self
                .main_airport_near(
                    country.location.lat,
                    country.location.lon,
                    COUNTRY_RADIUS_KM,
                )
                .await?
            {
                debug!("'{}' resolved via country match to {}", term, main.code);
                return Ok(Airport::from_record(main));
            }
        }

        Err(FarescoutError::not_found(term))
    }

    async fn best_match(
        &self,
        term: &str,
        location_type: LocationType,
    ) -> Result<Option<LocationRecord>> {
        let mut locations = self.api.query_locations(term, location_type, 1).await?;
        if locations.is_empty() {
            Ok(None)
        } else {
            Ok(Some(locations.remove(0)))
        }
    }

    /// Most prominent airport within `radius_km` of a coordinate, ties
    /// going to the earliest record in upstream order
    async fn main_airport_near(
        &self,
        lat: f64,
        lon: f64,
        radius_km: u32,
    ) -> Result<Option<LocationRecord>> {
        let airports = self
            .api
            .query_radius(lat, lon, radius_km, LocationType::Airport, RADIUS_AIRPORT_LIMIT)
            .await?;

        let mut best: Option<LocationRecord> = None;
        for airport in airports {
            let better = best
                .as_ref()
                .map_or(true, |b| airport.effective_rank() < b.effective_rank());
            if better {
                best = Some(airport);
            }
        }
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tequila::{Coordinates, DateWindow, FareRecord, ParentCity};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn record(
        code: &str,
        name: &str,
        lat: f64,
        lon: f64,
        rank: Option<i64>,
        city: Option<(&str, &str)>,
    ) -> LocationRecord {
        LocationRecord {
            code: code.to_string(),
            name: name.to_string(),
            location: Coordinates { lat, lon },
            city: city.map(|(code, name)| ParentCity {
                code: Some(code.to_string()),
                name: Some(name.to_string()),
            }),
            rank,
        }
    }

    /// Canned upstream responses keyed by location type
    #[derive(Default)]
    struct StubApi {
        cities: Vec<LocationRecord>,
        airports: Vec<LocationRecord>,
        countries: Vec<LocationRecord>,
        nearby: Vec<LocationRecord>,
        calls: AtomicUsize,
        queried_terms: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl FlightApi for StubApi {
        async fn query_locations(
            &self,
            term: &str,
            location_type: LocationType,
            _limit: u32,
        ) -> Result<Vec<LocationRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queried_terms.lock().unwrap().push(term.to_string());
            Ok(match location_type {
                LocationType::City => self.cities.clone(),
                LocationType::Airport => self.airports.clone(),
                LocationType::Country => self.countries.clone(),
            })
        }

        async fn query_radius(
            &self,
            _lat: f64,
            _lon: f64,
            _radius_km: u32,
            _location_type: LocationType,
            _limit: u32,
        ) -> Result<Vec<LocationRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.nearby.clone())
        }

        async fn search_one_way(
            &self,
            _from_code: &str,
            _to_code: &str,
            _window: &DateWindow,
            _currency: &str,
        ) -> Result<Vec<FareRecord>> {
            unreachable!("resolver tests never search fares")
        }
    }

    #[tokio::test]
    async fn test_empty_term_fails_before_any_upstream_call() {
        let api = StubApi::default();
        let resolver = LocationResolver::new(&api);

        for term in ["", "   ", "\t\n"] {
            let err = resolver.resolve(term).await.unwrap_err();
            assert!(matches!(err, FarescoutError::InvalidInput { .. }));
        }
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_city_match_picks_lowest_rank_airport() {
        let api = StubApi {
            cities: vec![record("MAD", "Madrid", 40.4722, -3.5608, None, None)],
            nearby: vec![
                record("TOJ", "Torrejon", 40.4967, -3.4459, Some(25), None),
                record("MAD", "Adolfo Suarez Madrid-Barajas", 40.4722, -3.5608, Some(2), None),
            ],
            ..StubApi::default()
        };
        let resolver = LocationResolver::new(&api);

        let airport = resolver.resolve("Madrid").await.unwrap();
        assert_eq!(airport.airport_code, "MAD");
        assert_eq!(airport.city_name.as_deref(), Some("Madrid"));
        assert_eq!(airport.city_code.as_deref(), Some("MAD"));
    }

    #[tokio::test]
    async fn test_unranked_airport_loses_to_ranked() {
        let api = StubApi {
            cities: vec![record("BER", "Berlin", 52.52, 13.405, None, None)],
            nearby: vec![
                record("XXX", "Unranked Field", 52.5, 13.4, None, None),
                record("BER", "Brandenburg", 52.36, 13.5, Some(10), None),
            ],
            ..StubApi::default()
        };
        let resolver = LocationResolver::new(&api);

        let airport = resolver.resolve("Berlin").await.unwrap();
        assert_eq!(airport.airport_code, "BER");
    }

    #[tokio::test]
    async fn test_rank_tie_keeps_upstream_order() {
        let api = StubApi {
            cities: vec![record("LON", "London", 51.5074, -0.1278, None, None)],
            nearby: vec![
                record("LHR", "Heathrow", 51.47, -0.4543, Some(1), None),
                record("LGW", "Gatwick", 51.1537, -0.1821, Some(1), None),
            ],
            ..StubApi::default()
        };
        let resolver = LocationResolver::new(&api);

        let airport = resolver.resolve("London").await.unwrap();
        assert_eq!(airport.airport_code, "LHR");
    }

    #[tokio::test]
    async fn test_city_without_nearby_airport_falls_through_to_airport_match() {
        let api = StubApi {
            cities: vec![record("RMT", "Remoteville", 10.0, 10.0, None, None)],
            airports: vec![record(
                "RMA",
                "Remoteville Intl",
                10.5,
                10.5,
                Some(7),
                Some(("RMT", "Remoteville")),
            )],
            ..StubApi::default()
        };
        let resolver = LocationResolver::new(&api);

        let airport = resolver.resolve("Remoteville").await.unwrap();
        assert_eq!(airport.airport_code, "RMA");
        assert_eq!(airport.city_code.as_deref(), Some("RMT"));
        assert_eq!(airport.city_name.as_deref(), Some("Remoteville"));
    }

    #[tokio::test]
    async fn test_airport_without_parent_city_uses_own_code_and_name() {
        let api = StubApi {
            airports: vec![record("SVQ", "Sevilla", 37.418, -5.893, Some(12), None)],
            ..StubApi::default()
        };
        let resolver = LocationResolver::new(&api);

        let airport = resolver.resolve("Sevilla").await.unwrap();
        assert_eq!(airport.city_code.as_deref(), Some("SVQ"));
        assert_eq!(airport.city_name.as_deref(), Some("Sevilla"));
    }

    #[tokio::test]
    async fn test_country_match_uses_wider_radius_result() {
        let api = StubApi {
            countries: vec![record("IS", "Iceland", 64.96, -19.02, None, None)],
            nearby: vec![record("KEF", "Keflavik", 63.985, -22.605, Some(4), None)],
            ..StubApi::default()
        };
        let resolver = LocationResolver::new(&api);

        let airport = resolver.resolve("Iceland").await.unwrap();
        assert_eq!(airport.airport_code, "KEF");
    }

    #[tokio::test]
    async fn test_nothing_matched_is_not_found_with_original_term() {
        let api = StubApi::default();
        let resolver = LocationResolver::new(&api);

        let err = resolver.resolve("Atlantis").await.unwrap_err();
        match err {
            FarescoutError::NotFound { term } => assert_eq!(term, "Atlantis"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_synonym_is_applied_before_lookup() {
        let api = StubApi::default();
        let resolver = LocationResolver::new(&api);

        let _ = resolver.resolve("  USA  ").await;
        let terms = api.queried_terms.lock().unwrap();
        assert!(terms.iter().all(|t| t == "New York"));
    }

    #[test]
    fn test_synonym_table_is_well_formed() {
        assert!(!SYNONYMS.is_empty());
        // Keys are stored lowercase so lookups can be case-insensitive
        for key in SYNONYMS.keys() {
            assert_eq!(key, &key.to_lowercase());
        }
        assert_eq!(SYNONYMS.get("uk").map(String::as_str), Some("London"));
    }
}
