use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub niches_path: PathBuf,
    pub overpass_url: String,
    pub nominatim_url: String,
    /// Directory search endpoint used for phone enrichment. `None` disables it.
    pub directory_url: Option<String>,
    pub user_agent: String,
    pub geocode_timeout_secs: u64,
    /// Server-side query budget, embedded into every Overpass query.
    pub overpass_timeout_secs: u64,
    pub enrich_timeout_secs: u64,
    pub probe_timeout_secs: u64,
    /// Per-query element cap, embedded into the `out` statement.
    pub max_results: u32,
    pub max_clauses_per_query: usize,
    pub enrich_concurrency: usize,
    pub default_radius_m: u32,
    pub max_radius_m: u32,
    pub cache_ttl_secs: u64,
    pub geocode_cache_ttl_secs: u64,
    pub cache_capacity: u64,
}
