//! HTTP client for the Overpass API interpreter endpoint.

use std::collections::HashSet;
use std::time::Duration;

use hotleads_core::RawRecord;
use reqwest::{Client, Url};

use crate::error::OsmError;
use crate::query::QuerySpec;
use crate::types::OverpassResponse;

/// Extra client-side time allowed beyond the query's own `[timeout:N]`, so
/// the server gets to report its timeout before the client gives up.
const DEFAULT_TIMEOUT_GRACE: Duration = Duration::from_secs(10);

/// Executes [`QuerySpec`]s against an Overpass interpreter.
///
/// Performs no retries: a failed request is surfaced to the caller, which
/// owns the single widen-and-retry fallback.
pub struct OverpassClient {
    client: Client,
    endpoint: Url,
    timeout_grace: Duration,
}

impl OverpassClient {
    /// # Errors
    ///
    /// Returns [`OsmError::Http`] if the `reqwest::Client` cannot be built, or
    /// [`OsmError::InvalidBaseUrl`] if `endpoint` does not parse.
    pub fn new(endpoint: &str, user_agent: &str) -> Result<Self, OsmError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        let endpoint = Url::parse(endpoint).map_err(|e| OsmError::InvalidBaseUrl {
            url: endpoint.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            endpoint,
            timeout_grace: DEFAULT_TIMEOUT_GRACE,
        })
    }

    #[must_use]
    pub fn with_timeout_grace(mut self, grace: Duration) -> Self {
        self.timeout_grace = grace;
        self
    }

    /// Sends one query and returns its elements as [`RawRecord`]s.
    ///
    /// The request timeout is the query's own server-side budget plus the
    /// configured grace period.
    ///
    /// # Errors
    ///
    /// - [`OsmError::UnexpectedStatus`] for any non-2xx response (429 and 504
    ///   are common under load).
    /// - [`OsmError::Timeout`] when the client times out or the server
    ///   reports a runtime error / timeout in the response `remark`.
    /// - [`OsmError::Http`] on other transport failures.
    /// - [`OsmError::Deserialize`] if the body is not Overpass JSON.
    pub async fn execute(&self, spec: &QuerySpec) -> Result<Vec<RawRecord>, OsmError> {
        let url = self.endpoint.as_str();
        let timeout = Duration::from_secs(spec.timeout_secs) + self.timeout_grace;

        tracing::debug!(
            clauses = spec.clause_count,
            max_results = spec.max_results,
            "sending Overpass query"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .timeout(timeout)
            .form(&[("data", spec.text.as_str())])
            .send()
            .await
            .map_err(|e| OsmError::from_transport(e, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OsmError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| OsmError::from_transport(e, url))?;
        let parsed: OverpassResponse =
            serde_json::from_str(&body).map_err(|e| OsmError::Deserialize {
                context: "overpass interpreter response".to_owned(),
                source: e,
            })?;

        if let Some(remark) = parsed.remark.as_deref() {
            let lowered = remark.to_ascii_lowercase();
            if lowered.contains("timed out") || lowered.contains("runtime error") {
                return Err(OsmError::Timeout {
                    url: url.to_owned(),
                    detail: remark.to_owned(),
                });
            }
            tracing::debug!(remark, "Overpass returned a remark");
        }

        let records: Vec<RawRecord> = parsed
            .elements
            .into_iter()
            .map(crate::types::OverpassElement::into_record)
            .collect();
        tracing::debug!(count = records.len(), "Overpass query returned records");
        Ok(records)
    }

    /// Runs every batch in order and concatenates the results, keeping the
    /// first occurrence of each record id.
    ///
    /// # Errors
    ///
    /// Propagates the first error from [`Self::execute`]; later batches are
    /// not attempted.
    pub async fn execute_all(&self, specs: &[QuerySpec]) -> Result<Vec<RawRecord>, OsmError> {
        let mut seen = HashSet::new();
        let mut records = Vec::new();
        for spec in specs {
            for record in self.execute(spec).await? {
                if seen.insert(record.id.clone()) {
                    records.push(record);
                }
            }
        }
        Ok(records)
    }
}
