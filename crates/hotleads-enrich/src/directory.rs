//! Business-directory phone lookup.
//!
//! The directory is any search page that accepts `search_terms` and
//! `geo_location_terms` query parameters and returns HTML or text containing
//! the listing's phone number. The first phone-shaped token in the body is
//! taken as the answer.

use std::time::Duration;

use hotleads_core::TtlCache;
use reqwest::{Client, Url};

use crate::error::EnrichError;
use crate::phone::extract_phone;

type CacheKey = (String, Option<String>);

/// Client for a directory search endpoint.
pub struct DirectoryClient {
    client: Client,
    base_url: Url,
    cache: TtlCache<CacheKey, Option<String>>,
}

impl DirectoryClient {
    /// # Errors
    ///
    /// Returns [`EnrichError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`EnrichError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        cache_capacity: u64,
        cache_ttl: Duration,
    ) -> Result<Self, EnrichError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent)
            .build()?;
        let base_url = Url::parse(base_url).map_err(|e| EnrichError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            base_url,
            cache: TtlCache::new(cache_capacity, cache_ttl),
        })
    }

    /// Looks up a phone number for `name` near `city`.
    ///
    /// Returns `None` on any failure or when the page holds no phone number.
    /// Hits and misses are cached by `(name, city)`; failed requests are not.
    pub async fn find_phone(&self, name: &str, city: Option<&str>) -> Option<String> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let city = city.map(str::trim).filter(|c| !c.is_empty());
        let key = (name.to_lowercase(), city.map(str::to_lowercase));

        match self
            .cache
            .try_get_or_compute(key, || self.lookup(name, city))
            .await
        {
            Ok(phone) => phone,
            Err(e) => {
                tracing::debug!(name, city, error = %e, "directory lookup failed");
                None
            }
        }
    }

    async fn lookup(&self, name: &str, city: Option<&str>) -> Result<Option<String>, EnrichError> {
        let url = self.search_url(name, city);
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnrichError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let phone = extract_phone(&body);
        tracing::debug!(name, found = phone.is_some(), "directory lookup finished");
        Ok(phone)
    }

    fn search_url(&self, name: &str, city: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("search_terms", name);
            if let Some(city) = city {
                pairs.append_pair("geo_location_terms", city);
            }
        }
        url
    }
}
