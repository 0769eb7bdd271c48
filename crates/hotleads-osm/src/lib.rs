//! OpenStreetMap access for lead discovery.
//!
//! [`Geocoder`] resolves a location hint through Nominatim, [`QueryBuilder`]
//! turns a [`hotleads_core::LocationQuery`] into Overpass QL, and
//! [`OverpassClient`] executes those queries and returns raw records.

pub mod error;
pub mod geocode;
pub mod overpass;
pub mod query;

mod types;

pub use error::OsmError;
pub use geocode::{GeocodeResult, Geocoder};
pub use overpass::OverpassClient;
pub use query::{QueryBuilder, QuerySpec, CATCH_ALL_KEYS};
