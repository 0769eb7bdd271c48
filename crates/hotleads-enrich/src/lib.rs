//! Best-effort contact enrichment: directory phone lookups and a heuristic
//! website probe. Nothing in this crate fails a lead search; every lookup
//! degrades to "nothing found".

pub mod directory;
pub mod enricher;
pub mod error;
pub mod phone;
pub mod probe;

pub use directory::DirectoryClient;
pub use enricher::{Enricher, Enrichment, NoEnrichment};
pub use error::EnrichError;
pub use phone::extract_phone;
pub use probe::{candidate_domains, slugify, HostResolver, SystemResolver, WebsiteProber};
