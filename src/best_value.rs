//! Best-value ranking: cheapest one-way fare per kilometer
//!
//! For a fixed origin and a list of candidate destinations, fetches the
//! cheapest fare per destination departing within the next 24 hours,
//! normalizes it by great-circle distance, and keeps the strict minimum.
//! Destinations are processed sequentially in input order, so a tie on
//! price per kilometer goes to the destination listed first.

use haversine::{distance, Location as HaversineLocation, Units};
use serde::Serialize;
use tracing::{debug, warn};

use crate::resolver::{Airport, LocationResolver};
use crate::tequila::{DateWindow, FlightApi};
use crate::Result;

/// A scored destination
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Destination city display name
    pub destination: String,
    /// Destination airport IATA code
    pub airport: String,
    /// Cheapest one-way fare in the configured currency
    pub price: f64,
    /// Route distance in km, rounded to 2 decimal places
    pub distance_km: f64,
    /// Ranking metric, rounded to 4 decimal places
    pub price_per_km: f64,
}

/// Ranks destinations by price per kilometer for a fixed origin
pub struct BestValueRanker<'a> {
    api: &'a dyn FlightApi,
    currency: String,
}

impl<'a> BestValueRanker<'a> {
    #[must_use]
    pub fn new(api: &'a dyn FlightApi, currency: impl Into<String>) -> Self {
        Self {
            api,
            currency: currency.into(),
        }
    }

    /// Find the best-value destination for departures in the next 24 hours.
    ///
    /// Origin resolution failures abort the whole search. A destination
    /// that fails to resolve, returns no fare, or has no usable distance
    /// is skipped so the remaining destinations can still produce a
    /// result; `None` means nothing qualified.
    pub async fn rank(
        &self,
        origin_term: &str,
        destination_terms: &[String],
    ) -> Result<Option<Candidate>> {
        let resolver = LocationResolver::new(self.api);
        let origin = resolver.resolve(origin_term).await?;

        let window = DateWindow::next_24_hours();
        debug!(
            "Searching departures from {} between {} and {}",
            origin.airport_code, window.date_from, window.date_to
        );

        let mut best: Option<Candidate> = None;
        for term in destination_terms {
            match self
                .score_destination(&resolver, &origin, term, &window)
                .await
            {
                Ok(Some(candidate)) => {
                    let better = best
                        .as_ref()
                        .map_or(true, |b| candidate.price_per_km < b.price_per_km);
                    if better {
                        best = Some(candidate);
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    warn!("Skipping destination '{}': {}", term, err);
                }
            }
        }
        Ok(best)
    }

    async fn score_destination(
        &self,
        resolver: &LocationResolver<'_>,
        origin: &Airport,
        term: &str,
        window: &DateWindow,
    ) -> Result<Option<Candidate>> {
        let destination = resolver.resolve(term).await?;

        let fares = self
            .api
            .search_one_way(
                &origin.airport_code,
                &destination.airport_code,
                window,
                &self.currency,
            )
            .await?;
        let Some(fare) = fares.first() else {
            debug!(
                "No fares from {} to {}",
                origin.airport_code, destination.airport_code
            );
            return Ok(None);
        };

        // Prefer the upstream route distance, fall back to great-circle
        let distance_km = match fare.distance {
            Some(d) if d > 0.0 => d,
            _ => great_circle_km(origin, &destination),
        };
        if distance_km <= 0.0 {
            debug!(
                "Dropping {}: no usable distance",
                destination.airport_code
            );
            return Ok(None);
        }

        let price_per_km = fare.price / distance_km;
        Ok(Some(Candidate {
            destination: destination
                .city_name
                .unwrap_or_else(|| destination.airport_name.clone()),
            airport: destination.airport_code,
            price: fare.price,
            distance_km: round_to(distance_km, 2),
            price_per_km: round_to(price_per_km, 4),
        }))
    }
}

/// Great-circle distance between two airports in kilometers
#[must_use]
pub fn great_circle_km(from: &Airport, to: &Airport) -> f64 {
    let from = HaversineLocation {
        latitude: from.latitude,
        longitude: from.longitude,
    };
    let to = HaversineLocation {
        latitude: to.latitude,
        longitude: to.longitude,
    };
    distance(from, to, Units::Kilometers)
}

/// Round to `places` decimal places, halves rounding away from zero
fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}
