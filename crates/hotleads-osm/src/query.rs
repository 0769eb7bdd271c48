//! Overpass QL construction.
//!
//! A [`LocationQuery`] becomes one clause per category filter, each scoped
//! by area, recency, and website absence, then chunked into batches so no
//! single request carries an unbounded union. The server-side timeout and
//! element cap are written into the query text itself so the service stops
//! work early instead of the client truncating a slow full fetch.

use chrono::{DateTime, SecondsFormat, Utc};
use hotleads_core::{CategoryFilter, LocationQuery, SearchArea, ValuePattern};

/// Top-level categories queried when the caller supplies no filters.
pub const CATCH_ALL_KEYS: [&str; 4] = ["shop", "amenity", "office", "leisure"];

/// Website attributes whose presence disqualifies a record.
const WEBSITE_KEYS: [&str; 2] = ["website", "contact:website"];

/// One ready-to-send Overpass request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub text: String,
    pub clause_count: usize,
    pub timeout_secs: u64,
    pub max_results: u32,
}

/// Renders [`LocationQuery`] values into [`QuerySpec`] batches.
///
/// Output depends only on the builder's own fields and the query passed in.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    timeout_secs: u64,
    max_results: u32,
    max_clauses_per_query: usize,
}

impl QueryBuilder {
    #[must_use]
    pub fn new(timeout_secs: u64, max_results: u32, max_clauses_per_query: usize) -> Self {
        Self {
            timeout_secs,
            max_results,
            max_clauses_per_query: max_clauses_per_query.max(1),
        }
    }

    /// Builds the batch of Overpass queries for `query`.
    ///
    /// Never returns an empty batch: with no category filters the catch-all
    /// keys in [`CATCH_ALL_KEYS`] are queried instead.
    #[must_use]
    pub fn build(&self, query: &LocationQuery) -> Vec<QuerySpec> {
        if matches!(query.area, SearchArea::Anywhere) && query.recency_threshold.is_none() {
            tracing::warn!("building an Overpass query with neither area nor recency bound");
        }

        let filters: Vec<CategoryFilter> = if query.category_filters.is_empty() {
            CATCH_ALL_KEYS
                .iter()
                .map(|k| CategoryFilter::any(k))
                .collect()
        } else {
            query.category_filters.clone()
        };

        let clauses: Vec<String> = filters
            .iter()
            .map(|f| render_clause(f, query))
            .collect();

        clauses
            .chunks(self.max_clauses_per_query)
            .map(|batch| self.render_batch(batch))
            .collect()
    }

    fn render_batch(&self, clauses: &[String]) -> QuerySpec {
        let mut text = format!("[out:json][timeout:{}];\n(\n", self.timeout_secs);
        for clause in clauses {
            text.push_str("  ");
            text.push_str(clause);
            text.push('\n');
        }
        text.push_str(&format!(");\nout meta center {};\n", self.max_results));

        QuerySpec {
            text,
            clause_count: clauses.len(),
            timeout_secs: self.timeout_secs,
            max_results: self.max_results,
        }
    }
}

fn render_clause(filter: &CategoryFilter, query: &LocationQuery) -> String {
    let mut clause = String::from("nwr");
    clause.push_str(&render_tag_filter(filter));

    if query.require_no_website {
        for key in WEBSITE_KEYS {
            clause.push_str(&format!("[!\"{key}\"]"));
        }
    }

    if let Some(area) = render_area(&query.area) {
        clause.push_str(&area);
    }

    if let Some(threshold) = query.recency_threshold {
        clause.push_str(&format!("(newer:\"{}\")", format_instant(threshold)));
    }

    clause.push(';');
    clause
}

fn render_tag_filter(filter: &CategoryFilter) -> String {
    let key = escape(&filter.key);
    match &filter.value {
        ValuePattern::Any => format!("[\"{key}\"]"),
        ValuePattern::Exact(v) => format!("[\"{key}\"=\"{}\"]", escape(v)),
        ValuePattern::Regex(re) => format!("[\"{key}\"~\"{}\"]", escape(re)),
    }
}

fn render_area(area: &SearchArea) -> Option<String> {
    match area {
        SearchArea::Around { center, radius_m } => Some(format!(
            "(around:{radius_m},{},{})",
            center.lat, center.lon
        )),
        SearchArea::Within(b) => Some(format!("({},{},{},{})", b.south, b.west, b.north, b.east)),
        SearchArea::Anywhere => None,
    }
}

/// Overpass expects `YYYY-MM-DDTHH:MM:SSZ`.
fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn escape(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}
