//! Heuristic website detection.
//!
//! A business name is slugged and tried against a short list of TLDs. A
//! candidate counts as a live site when its host resolves and a `HEAD`
//! request answers with a status below 400.
//!
//! The slug is naive: "Joe's Cuts & Color" becomes `joescutscolor`, so
//! hyphenated or branded domains (`joes-cuts.com`, `cutsbyjoe.com`) are
//! never tried. Those businesses pass as website-less; that false-negative
//! rate is a known limitation of the heuristic.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hotleads_core::TtlCache;
use reqwest::Client;

use crate::error::EnrichError;

const DEFAULT_URL_TEMPLATE: &str = "https://{domain}/";

/// Name-resolution check used before any HTTP probe.
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolves(&self, host: &str) -> bool;
}

/// Resolves through the operating system's resolver.
#[derive(Debug, Clone)]
pub struct SystemResolver {
    timeout: Duration,
}

impl SystemResolver {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolves(&self, host: &str) -> bool {
        match tokio::time::timeout(self.timeout, tokio::net::lookup_host((host, 443))).await {
            Ok(Ok(mut addrs)) => addrs.next().is_some(),
            Ok(Err(e)) => {
                let err = EnrichError::Resolve {
                    host: host.to_owned(),
                    detail: e.to_string(),
                };
                tracing::trace!(error = %err, "host did not resolve");
                false
            }
            Err(_) => {
                tracing::trace!(host, "host resolution timed out");
                false
            }
        }
    }
}

/// Lowercased ASCII alphanumerics of `name`; everything else is dropped.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// `slug.tld` for each TLD, in order. Empty when the slug is empty.
#[must_use]
pub fn candidate_domains(slug: &str, tlds: &[String]) -> Vec<String> {
    if slug.is_empty() {
        return Vec::new();
    }
    tlds.iter().map(|tld| format!("{slug}.{tld}")).collect()
}

/// Probes candidate domains for an existing website.
pub struct WebsiteProber {
    client: Client,
    resolver: Arc<dyn HostResolver>,
    tlds: Vec<String>,
    url_template: String,
    cache: TtlCache<String, bool>,
}

impl WebsiteProber {
    /// Creates a prober using the system resolver and `https://{domain}/`.
    ///
    /// # Errors
    ///
    /// Returns [`EnrichError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        tlds: Vec<String>,
        timeout_secs: u64,
        user_agent: &str,
        cache_capacity: u64,
        cache_ttl: Duration,
    ) -> Result<Self, EnrichError> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            resolver: Arc::new(SystemResolver::new(timeout)),
            tlds,
            url_template: DEFAULT_URL_TEMPLATE.to_owned(),
            cache: TtlCache::new(cache_capacity, cache_ttl),
        })
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: impl HostResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Overrides the probe URL; `{domain}` is replaced by each candidate.
    #[must_use]
    pub fn with_url_template(mut self, template: &str) -> Self {
        self.url_template = template.to_owned();
        self
    }

    /// `true` on the first candidate domain that resolves and answers below 400.
    pub async fn has_website(&self, name: &str) -> bool {
        let slug = slugify(name);
        if slug.is_empty() {
            return false;
        }
        self.cache
            .get_or_compute(slug.clone(), || self.probe_slug(slug.clone()))
            .await
    }

    async fn probe_slug(&self, slug: String) -> bool {
        for domain in candidate_domains(&slug, &self.tlds) {
            if !self.resolver.resolves(&domain).await {
                continue;
            }
            let url = self.url_template.replace("{domain}", &domain);
            match self.client.head(&url).send().await {
                Ok(resp) if resp.status().as_u16() < 400 => {
                    tracing::debug!(domain = %domain, status = resp.status().as_u16(), "website found");
                    return true;
                }
                Ok(resp) => {
                    tracing::trace!(domain = %domain, status = resp.status().as_u16(), "probe rejected");
                }
                Err(e) => {
                    tracing::trace!(domain = %domain, error = %e, "probe request failed");
                }
            }
        }
        false
    }
}
