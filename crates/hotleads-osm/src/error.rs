use thiserror::Error;

#[derive(Debug, Error)]
pub enum OsmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Geocoding produced zero results; the caller should ask for a different hint.
    #[error("no location found for \"{query}\"")]
    NotFound { query: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// Client-side request timeout, or a query the server aborted at its own limit.
    #[error("request to {url} timed out: {detail}")]
    Timeout { url: String, detail: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid response from {context}: {reason}")]
    InvalidResponse { context: String, reason: String },

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl OsmError {
    /// `true` when the failure came from the remote service rather than from
    /// the caller's input, i.e. the "service down" half of the taxonomy.
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        !matches!(
            self,
            OsmError::NotFound { .. } | OsmError::InvalidBaseUrl { .. }
        )
    }

    /// Map a `reqwest` send/read failure, separating timeouts from other
    /// transport errors.
    pub(crate) fn from_transport(err: reqwest::Error, url: &str) -> Self {
        if err.is_timeout() {
            OsmError::Timeout {
                url: url.to_owned(),
                detail: err.to_string(),
            }
        } else {
            OsmError::Http(err)
        }
    }
}
