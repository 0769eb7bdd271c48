//! Shared domain types, configuration, and caching for the lead discovery
//! pipeline.

pub mod app_config;
pub mod cache;
pub mod config;
pub mod error;
pub mod niches;
pub mod types;

pub use app_config::AppConfig;
pub use cache::TtlCache;
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use niches::{load_niches, parse_niches, NicheTag, NichesFile, ScoringConfig};
pub use types::{
    BoundingBox, CategoryFilter, GeoPoint, Lead, LocationQuery, RawRecord, SearchArea,
    ValuePattern,
};
