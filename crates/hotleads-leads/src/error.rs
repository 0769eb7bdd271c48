use hotleads_core::ConfigError;
use hotleads_enrich::EnrichError;
use hotleads_osm::OsmError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("location not found: {query}")]
    LocationNotFound { query: String },

    #[error(transparent)]
    Osm(#[from] OsmError),

    #[error(transparent)]
    Enrich(#[from] EnrichError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid specificity pattern \"{pattern}\": {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl PipelineError {
    /// Whether an external service failed, as opposed to bad input.
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        match self {
            Self::Osm(e) => e.is_upstream(),
            Self::LocationNotFound { .. }
            | Self::Enrich(_)
            | Self::Config(_)
            | Self::InvalidPattern { .. } => false,
        }
    }
}
