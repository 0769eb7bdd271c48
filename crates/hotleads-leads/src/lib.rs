//! Lead processing and search orchestration.
//!
//! [`LeadProcessor`] turns raw spatial records into a ranked lead list;
//! [`LeadPipeline`] wires geocoding, query building, fetching, and
//! processing together with a single fallback widen and a result cache.

pub mod error;
pub mod fields;
pub mod pipeline;
pub mod processor;
pub mod scorer;

pub use error::PipelineError;
pub use pipeline::{LeadPipeline, LeadReport, LocationSpec, SearchParams, SearchStatus};
pub use processor::{parse_timestamp, LeadProcessor, ProcessOptions};
pub use scorer::Scorer;
