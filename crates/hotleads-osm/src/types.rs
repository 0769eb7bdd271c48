//! Wire shapes for Nominatim and Overpass JSON responses.
//!
//! ### Nominatim `jsonv2`
//! Coordinates arrive as **strings** (`"lat": "33.4255"`), and `boundingbox`
//! is a four-element string array ordered `[south, north, west, east]`.
//!
//! ### Overpass `out meta center`
//! Nodes carry `lat`/`lon` directly; ways and relations carry a `center`
//! object instead, and may carry neither when geometry could not be
//! computed. `timestamp` is the last-modified instant from element metadata.
//! A query the server aborts still returns HTTP 200, with the reason in a
//! top-level `remark`.

use std::collections::BTreeMap;

use hotleads_core::{BoundingBox, GeoPoint, RawRecord};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct NominatimPlace {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub boundingbox: Option<Vec<String>>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl NominatimPlace {
    pub(crate) fn point(&self) -> Option<GeoPoint> {
        let lat = self.lat.trim().parse::<f64>().ok()?;
        let lon = self.lon.trim().parse::<f64>().ok()?;
        Some(GeoPoint { lat, lon })
    }

    /// Parsed bounding box; `None` when absent or not four numbers.
    pub(crate) fn bounding_box(&self) -> Option<BoundingBox> {
        let raw = self.boundingbox.as_ref()?;
        let values: Vec<f64> = raw
            .iter()
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .ok()?;
        match values.as_slice() {
            [south, north, west, east] => Some(BoundingBox {
                south: *south,
                north: *north,
                west: *west,
                east: *east,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
    #[serde(default)]
    pub remark: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OverpassElement {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: u64,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub center: Option<OverpassCenter>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OverpassCenter {
    pub lat: f64,
    pub lon: f64,
}

impl OverpassElement {
    pub(crate) fn into_record(self) -> RawRecord {
        let position = match (self.lat, self.lon, &self.center) {
            (Some(lat), Some(lon), _) => Some(GeoPoint { lat, lon }),
            (_, _, Some(c)) => Some(GeoPoint {
                lat: c.lat,
                lon: c.lon,
            }),
            _ => None,
        };
        RawRecord {
            id: format!("{}/{}", self.kind, self.id),
            position,
            attributes: self.tags,
            last_modified: self.timestamp,
        }
    }
}
