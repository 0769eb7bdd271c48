//! Domain types shared by every stage of the lead pipeline.
//!
//! Records flow through as [`RawRecord`] (straight from the spatial query
//! service) and come out as [`Lead`] once filtered, enriched, and scored.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Axis-aligned box in degrees, in the `(south, north, west, east)` order
/// Nominatim reports it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

impl BoundingBox {
    #[must_use]
    pub fn center(&self) -> GeoPoint {
        GeoPoint {
            lat: (self.south + self.north) / 2.0,
            lon: (self.west + self.east) / 2.0,
        }
    }

    /// Scale the box about its centre by `factor`, clamped to valid
    /// latitude/longitude ranges.
    #[must_use]
    pub fn expanded(&self, factor: f64) -> Self {
        let center = self.center();
        let half_lat = (self.north - self.south) / 2.0 * factor;
        let half_lon = (self.east - self.west) / 2.0 * factor;
        Self {
            south: (center.lat - half_lat).max(-90.0),
            north: (center.lat + half_lat).min(90.0),
            west: (center.lon - half_lon).max(-180.0),
            east: (center.lon + half_lon).min(180.0),
        }
    }
}

/// Geographic scope of a spatial query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SearchArea {
    /// Centre point plus radius in metres.
    Around { center: GeoPoint, radius_m: u32 },
    Within(BoundingBox),
    /// No spatial restriction; only meaningful combined with a recency threshold.
    Anywhere,
}

impl SearchArea {
    /// Returns a wider version of this area for the single fallback retry.
    ///
    /// Radii grow by `factor` but never beyond `max_radius_m` (an area that
    /// already exceeds the cap is left as-is). Boxes scale about their centre.
    #[must_use]
    pub fn widened(&self, factor: u32, max_radius_m: u32) -> Self {
        match *self {
            SearchArea::Around { center, radius_m } => SearchArea::Around {
                center,
                radius_m: radius_m
                    .saturating_mul(factor)
                    .min(max_radius_m)
                    .max(radius_m),
            },
            SearchArea::Within(bbox) => SearchArea::Within(bbox.expanded(f64::from(factor))),
            SearchArea::Anywhere => SearchArea::Anywhere,
        }
    }
}

impl fmt::Display for SearchArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchArea::Around { center, radius_m } => {
                write!(f, "{radius_m}m around {},{}", center.lat, center.lon)
            }
            SearchArea::Within(b) => {
                write!(f, "bbox {},{},{},{}", b.south, b.west, b.north, b.east)
            }
            SearchArea::Anywhere => write!(f, "anywhere"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ValuePattern {
    /// Attribute key present with any value.
    Any,
    Exact(String),
    /// Regular expression in the query service's dialect.
    Regex(String),
}

/// One `(attributeKey, attributeValuePattern)` selection criterion.
///
/// Parsed from `key=value`, `key=*` or bare `key` (any value), and
/// `key~regex`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CategoryFilter {
    pub key: String,
    pub value: ValuePattern,
}

impl CategoryFilter {
    #[must_use]
    pub fn any(key: &str) -> Self {
        Self {
            key: key.to_string(),
            value: ValuePattern::Any,
        }
    }

    #[must_use]
    pub fn exact(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: ValuePattern::Exact(value.to_string()),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = ConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigError::InvalidCategoryFilter {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("filter is empty"));
        }

        let split_at = trimmed.find(['=', '~']);
        let (key, value) = match split_at {
            None => (trimmed, ValuePattern::Any),
            Some(idx) => {
                let key = trimmed[..idx].trim();
                let rest = trimmed[idx + 1..].trim();
                let is_regex = trimmed[idx..].starts_with('~');
                let value = if rest.is_empty() {
                    return Err(invalid("value is empty"));
                } else if is_regex {
                    ValuePattern::Regex(rest.to_string())
                } else if rest == "*" {
                    ValuePattern::Any
                } else {
                    ValuePattern::Exact(rest.to_string())
                };
                (key, value)
            }
        };

        if key.is_empty() {
            return Err(invalid("key is empty"));
        }
        if key.contains('"') {
            return Err(invalid("key must not contain quotes"));
        }

        Ok(Self {
            key: key.to_string(),
            value,
        })
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            ValuePattern::Any => write!(f, "{}=*", self.key),
            ValuePattern::Exact(v) => write!(f, "{}={v}", self.key),
            ValuePattern::Regex(re) => write!(f, "{}~{re}", self.key),
        }
    }
}

/// Immutable selection criteria for one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationQuery {
    pub area: SearchArea,
    /// Empty means unrestricted; the query builder substitutes catch-all clauses.
    pub category_filters: Vec<CategoryFilter>,
    /// Only entities modified at or after this instant qualify.
    pub recency_threshold: Option<DateTime<Utc>>,
    pub require_no_website: bool,
}

/// One entity as returned by the spatial query service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Source-assigned id, unique within a fetch (e.g. `node/123`).
    pub id: String,
    pub position: Option<GeoPoint>,
    pub attributes: BTreeMap<String, String>,
    /// ISO-8601 instant as sent by the source; may be absent or malformed.
    pub last_modified: Option<String>,
}

impl RawRecord {
    /// Trimmed attribute value, treating blank values as absent.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.attr("name")
    }
}

/// A ranked, call-ready business record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub name: String,
    /// Phone number or email address.
    pub contact: String,
    /// Up to five address parts joined by `", "`; empty when none are known.
    pub address: String,
    pub days_since_listed: u32,
    /// Always within `0..=100`.
    pub score: u8,
    pub position: GeoPoint,
}
