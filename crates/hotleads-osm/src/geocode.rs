//! Nominatim geocoding client.
//!
//! Resolves a postal code or free-text address to a point and, when
//! Nominatim reports one, a bounding box. Each distinct hint is looked up at
//! most once per cache window; the surrounding caller re-resolves the same
//! location on every parameter change.

use std::sync::LazyLock;
use std::time::Duration;

use hotleads_core::{BoundingBox, GeoPoint, TtlCache};
use regex::Regex;
use reqwest::{Client, Url};
use serde::Serialize;

use crate::error::OsmError;
use crate::types::NominatimPlace;

const DEFAULT_CACHE_CAPACITY: u64 = 128;
const DEFAULT_CACHE_TTL_SECS: u64 = 600;

/// Numeric codes with an optional numeric suffix (US ZIP+4, BR, JP, most of
/// Europe), Canadian `A1A 1A1`, and UK outward/inward codes.
static POSTAL_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:\d{3,6}(?:[ -]\d{3,4})?|[a-z]\d[a-z][ -]?\d[a-z]\d|[a-z]{1,2}\d[a-z\d]?\s*\d[a-z]{2})$",
    )
    .expect("valid regex")
});

/// Result of resolving a location hint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodeResult {
    pub point: GeoPoint,
    pub bounding_box: Option<BoundingBox>,
    pub display_name: Option<String>,
}

/// Client for the Nominatim `/search` endpoint.
///
/// Use [`Geocoder::new`] with the public instance URL, or point it at a mock
/// server in tests.
pub struct Geocoder {
    client: Client,
    search_url: Url,
    cache: TtlCache<String, GeocodeResult>,
}

impl Geocoder {
    /// Creates a geocoder for the Nominatim instance at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`OsmError::Http`] if the `reqwest::Client` cannot be built, or
    /// [`OsmError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, OsmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let raw = format!("{}/search", base_url.trim_end_matches('/'));
        let search_url = Url::parse(&raw).map_err(|e| OsmError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            search_url,
            cache: TtlCache::new(
                DEFAULT_CACHE_CAPACITY,
                Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            ),
        })
    }

    /// Replaces the result cache with one of the given size and lifetime.
    #[must_use]
    pub fn with_cache(mut self, capacity: u64, ttl: Duration) -> Self {
        self.cache = TtlCache::new(capacity, ttl);
        self
    }

    /// Resolves `hint` to a point and optional bounding box.
    ///
    /// Results are cached by the exact hint string; failures are not.
    ///
    /// # Errors
    ///
    /// - [`OsmError::NotFound`] when the hint is blank or Nominatim returns no match.
    /// - [`OsmError::UnexpectedStatus`], [`OsmError::Timeout`], [`OsmError::Http`]
    ///   when the service is unreachable or refuses the request.
    /// - [`OsmError::Deserialize`] / [`OsmError::InvalidResponse`] for a
    ///   malformed body.
    pub async fn resolve(&self, hint: &str) -> Result<GeocodeResult, OsmError> {
        if hint.trim().is_empty() {
            return Err(OsmError::NotFound {
                query: hint.to_owned(),
            });
        }
        self.cache
            .try_get_or_compute(hint.to_owned(), || self.lookup(hint))
            .await
    }

    async fn lookup(&self, hint: &str) -> Result<GeocodeResult, OsmError> {
        let url = self.search_url_for(hint);
        tracing::debug!(hint, %url, "geocoding location hint");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| OsmError::from_transport(e, url.as_str()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OsmError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| OsmError::from_transport(e, url.as_str()))?;
        let places: Vec<NominatimPlace> =
            serde_json::from_str(&body).map_err(|e| OsmError::Deserialize {
                context: format!("nominatim search for \"{hint}\""),
                source: e,
            })?;

        let Some(place) = places.into_iter().next() else {
            return Err(OsmError::NotFound {
                query: hint.to_owned(),
            });
        };

        let point = place.point().ok_or_else(|| OsmError::InvalidResponse {
            context: format!("nominatim search for \"{hint}\""),
            reason: format!("unparseable coordinates ({}, {})", place.lat, place.lon),
        })?;

        Ok(GeocodeResult {
            point,
            bounding_box: place.bounding_box(),
            display_name: place.display_name,
        })
    }

    /// Builds the search URL: structured `postalcode=` for postal-code-shaped
    /// hints, free-text `q=` otherwise.
    fn search_url_for(&self, hint: &str) -> Url {
        let hint = hint.trim();
        let mut url = self.search_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            if looks_like_postal_code(hint) {
                pairs.append_pair("postalcode", hint);
            } else {
                pairs.append_pair("q", hint);
            }
            pairs.append_pair("format", "jsonv2");
            pairs.append_pair("limit", "1");
        }
        url
    }
}

/// True when `hint` is shaped like a postal code rather than a street or
/// place name. Street addresses such as `12 Elm Rd` or `5th Ave` go to `q=`.
pub(crate) fn looks_like_postal_code(hint: &str) -> bool {
    POSTAL_CODE_RE.is_match(hint.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geocoder() -> Geocoder {
        Geocoder::new("https://nominatim.example/", 5, "hotleads-test/0.1")
            .expect("geocoder construction should not fail")
    }

    #[test]
    fn postal_code_heuristic() {
        assert!(looks_like_postal_code("85281"));
        assert!(looks_like_postal_code("85281-1234"));
        assert!(looks_like_postal_code("SW1A 1AA"));
        assert!(looks_like_postal_code("m5v 3l9"));
        assert!(looks_like_postal_code("10115"));
        assert!(!looks_like_postal_code("Tempe, AZ"));
        assert!(!looks_like_postal_code("Main Street"));
        assert!(!looks_like_postal_code("12"));
        assert!(!looks_like_postal_code("700 S Mill Ave Tempe"));
        assert!(!looks_like_postal_code("12 Elm Rd"));
        assert!(!looks_like_postal_code("5th Ave"));
    }

    #[test]
    fn short_street_addresses_use_free_text() {
        let url = geocoder().search_url_for("12 Elm Rd");
        assert_eq!(
            url.as_str(),
            "https://nominatim.example/search?q=12+Elm+Rd&format=jsonv2&limit=1"
        );
        let url = geocoder().search_url_for("5th Ave");
        assert!(url.as_str().contains("?q=5th+Ave&"), "{url}");
    }

    #[test]
    fn search_url_uses_postalcode_param_for_zip() {
        let url = geocoder().search_url_for(" 85281 ");
        assert_eq!(
            url.as_str(),
            "https://nominatim.example/search?postalcode=85281&format=jsonv2&limit=1"
        );
    }

    #[test]
    fn search_url_encodes_free_text() {
        let url = geocoder().search_url_for("Tempe, AZ");
        assert_eq!(
            url.as_str(),
            "https://nominatim.example/search?q=Tempe%2C+AZ&format=jsonv2&limit=1"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = Geocoder::new("not a url", 5, "ua");
        assert!(matches!(result, Err(OsmError::InvalidBaseUrl { .. })));
    }

    #[tokio::test]
    async fn blank_hint_is_not_found_without_network() {
        let err = geocoder().resolve("   ").await.unwrap_err();
        assert!(matches!(err, OsmError::NotFound { .. }));
    }
}
