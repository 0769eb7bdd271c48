//! The enrichment seam used by the lead processor.

use std::time::Duration;

use async_trait::async_trait;
use hotleads_core::AppConfig;

use crate::directory::DirectoryClient;
use crate::error::EnrichError;
use crate::probe::WebsiteProber;

/// Best-effort contact and website lookups for a single business.
///
/// Implementations never fail: anything that goes wrong is reported as
/// "no contact" or "no website".
#[async_trait]
pub trait Enrichment: Send + Sync {
    /// A phone number for `name` near `city`, if one can be found.
    async fn enrich_contact(&self, name: &str, city: Option<&str>) -> Option<String>;

    /// Whether `name` appears to already have a working website.
    async fn probe_website(&self, name: &str) -> bool;
}

/// Enrichment that finds nothing. Used when enrichment is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnrichment;

#[async_trait]
impl Enrichment for NoEnrichment {
    async fn enrich_contact(&self, _name: &str, _city: Option<&str>) -> Option<String> {
        None
    }

    async fn probe_website(&self, _name: &str) -> bool {
        false
    }
}

/// Directory lookup plus website probe; either half may be absent.
#[derive(Default)]
pub struct Enricher {
    directory: Option<DirectoryClient>,
    prober: Option<WebsiteProber>,
}

impl Enricher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_directory(mut self, directory: DirectoryClient) -> Self {
        self.directory = Some(directory);
        self
    }

    #[must_use]
    pub fn with_prober(mut self, prober: WebsiteProber) -> Self {
        self.prober = Some(prober);
        self
    }

    /// Builds both halves from application config. The directory client is
    /// only created when `HOTLEADS_DIRECTORY_URL` is set.
    ///
    /// # Errors
    ///
    /// Returns [`EnrichError`] if an HTTP client cannot be built or the
    /// directory URL is invalid.
    pub fn from_config(config: &AppConfig, probe_tlds: &[String]) -> Result<Self, EnrichError> {
        let ttl = Duration::from_secs(config.cache_ttl_secs);
        let mut enricher = Self::new().with_prober(WebsiteProber::new(
            probe_tlds.to_vec(),
            config.probe_timeout_secs,
            &config.user_agent,
            config.cache_capacity,
            ttl,
        )?);
        if let Some(url) = config.directory_url.as_deref() {
            enricher = enricher.with_directory(DirectoryClient::new(
                url,
                config.enrich_timeout_secs,
                &config.user_agent,
                config.cache_capacity,
                ttl,
            )?);
        } else {
            tracing::debug!("no directory URL configured; contact lookups disabled");
        }
        Ok(enricher)
    }
}

#[async_trait]
impl Enrichment for Enricher {
    async fn enrich_contact(&self, name: &str, city: Option<&str>) -> Option<String> {
        match &self.directory {
            Some(directory) => directory.find_phone(name, city).await,
            None => None,
        }
    }

    async fn probe_website(&self, name: &str) -> bool {
        match &self.prober {
            Some(prober) => prober.has_website(name).await,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_enrichment_finds_nothing() {
        assert_eq!(NoEnrichment.enrich_contact("Joe's Cuts", Some("Tempe")).await, None);
        assert!(!NoEnrichment.probe_website("Joe's Cuts").await);
    }

    #[tokio::test]
    async fn empty_enricher_behaves_like_no_enrichment() {
        let enricher = Enricher::new();
        assert_eq!(enricher.enrich_contact("Joe's Cuts", None).await, None);
        assert!(!enricher.probe_website("Joe's Cuts").await);
    }
}
