//! Farescout - best-value one-way flight finder
//!
//! This library resolves free-text place names to a "main" airport,
//! queries the Tequila flight-search API for the cheapest one-way fare
//! departing within the next 24 hours, and ranks candidate destinations
//! by price per kilometer.

pub mod api;
pub mod best_value;
pub mod config;
pub mod error;
pub mod resolver;
pub mod tequila;
pub mod web;

// Re-export core types for public API
pub use best_value::{BestValueRanker, Candidate};
pub use config::FarescoutConfig;
pub use error::FarescoutError;
pub use resolver::{Airport, LocationResolver};
pub use tequila::{DateWindow, FareRecord, FlightApi, LocationRecord, LocationType, TequilaClient};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, FarescoutError>;
