//! End-to-end lead search: location → query → fetch → process.
//!
//! The pipeline holds no per-request state. A resolved location is returned
//! in the [`LeadReport`] rather than stored, and every call is a pure
//! function of its parameters, the evaluation instant, and upstream
//! responses (modulo the result cache).

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hotleads_core::{
    AppConfig, BoundingBox, CategoryFilter, GeoPoint, Lead, LocationQuery, NichesFile,
    SearchArea, TtlCache,
};
use hotleads_enrich::{Enricher, Enrichment, NoEnrichment};
use hotleads_osm::{Geocoder, OsmError, OverpassClient, QueryBuilder, QuerySpec};

use crate::error::PipelineError;
use crate::processor::{LeadProcessor, ProcessOptions};
use crate::scorer::Scorer;

/// Multiplier applied to radius, box size, and lookback on the fallback retry.
const WIDEN_FACTOR: u32 = 2;

/// Where to search.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationSpec {
    /// Postal code or free-text address, resolved through the geocoder.
    Hint(String),
    Point(GeoPoint),
    Bounds(BoundingBox),
}

/// One search request from the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub location: LocationSpec,
    /// Overrides the geocoder's bounding box; falls back to the configured default.
    pub radius_m: Option<u32>,
    /// Empty means all categories (catch-all query).
    pub categories: Vec<CategoryFilter>,
    pub recency_days: u32,
    pub exclusion_list: Vec<String>,
    pub require_no_website: bool,
    pub enrich_contacts: bool,
    pub probe_websites: bool,
}

impl SearchParams {
    /// Canonical rendering used as the result-cache key.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let mut key = match &self.location {
            LocationSpec::Hint(h) => format!("hint:{}", h.trim()),
            LocationSpec::Point(p) => format!("point:{},{}", p.lat, p.lon),
            LocationSpec::Bounds(b) => {
                format!("bbox:{},{},{},{}", b.south, b.west, b.north, b.east)
            }
        };
        if let Some(r) = self.radius_m {
            let _ = write!(key, "|r={r}");
        }
        let categories: Vec<String> = self.categories.iter().map(ToString::to_string).collect();
        let exclusions: Vec<String> = self
            .exclusion_list
            .iter()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        let _ = write!(
            key,
            "|cats={}|days={}|excl={}|noweb={}|enrich={}|probe={}",
            categories.join(","),
            self.recency_days,
            exclusions.join(","),
            self.require_no_website,
            self.enrich_contacts,
            self.probe_websites,
        );
        key
    }
}

/// Outcome classification for a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStatus {
    Found,
    NoResults,
    LocationNotFound,
    UpstreamError(String),
}

impl SearchStatus {
    /// Reason code for an empty result; `None` when leads were found.
    #[must_use]
    pub fn reason_code(&self) -> Option<&'static str> {
        match self {
            Self::Found => None,
            Self::NoResults => Some("no-results"),
            Self::LocationNotFound => Some("location-not-found"),
            Self::UpstreamError(_) => Some("upstream-error"),
        }
    }
}

/// Ranked leads plus how they were obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadReport {
    pub leads: Vec<Lead>,
    pub status: SearchStatus,
    /// Area actually searched (after widening), when one was resolved.
    pub area: Option<SearchArea>,
    pub widened: bool,
}

impl LeadReport {
    fn empty(status: SearchStatus) -> Self {
        Self {
            leads: Vec::new(),
            status,
            area: None,
            widened: false,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedSearch {
    leads: Vec<Lead>,
    area: SearchArea,
    widened: bool,
}

pub struct LeadPipeline {
    geocoder: Geocoder,
    overpass: OverpassClient,
    builder: QueryBuilder,
    processor: LeadProcessor,
    enrichment: Arc<dyn Enrichment>,
    default_radius_m: u32,
    max_radius_m: u32,
    concurrency: usize,
    cache: TtlCache<String, CachedSearch>,
}

impl LeadPipeline {
    #[must_use]
    pub fn new(
        geocoder: Geocoder,
        overpass: OverpassClient,
        builder: QueryBuilder,
        processor: LeadProcessor,
    ) -> Self {
        Self {
            geocoder,
            overpass,
            builder,
            processor,
            enrichment: Arc::new(NoEnrichment),
            default_radius_m: 50_000,
            max_radius_m: 200_000,
            concurrency: 5,
            cache: TtlCache::new(256, Duration::from_secs(300)),
        }
    }

    #[must_use]
    pub fn with_enrichment(mut self, enrichment: Arc<dyn Enrichment>) -> Self {
        self.enrichment = enrichment;
        self
    }

    #[must_use]
    pub fn with_radius_limits(mut self, default_radius_m: u32, max_radius_m: u32) -> Self {
        self.default_radius_m = default_radius_m;
        self.max_radius_m = max_radius_m.max(default_radius_m);
        self
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub fn with_cache(mut self, capacity: u64, ttl: Duration) -> Self {
        self.cache = TtlCache::new(capacity, ttl);
        self
    }

    /// Wires every component from application config and the niches file.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if an HTTP client cannot be built, a
    /// configured URL is invalid, or a niche tier does not compile.
    pub fn from_config(config: &AppConfig, niches: &NichesFile) -> Result<Self, PipelineError> {
        let geocoder = Geocoder::new(
            &config.nominatim_url,
            config.geocode_timeout_secs,
            &config.user_agent,
        )?
        .with_cache(
            config.cache_capacity,
            Duration::from_secs(config.geocode_cache_ttl_secs),
        );
        let overpass = OverpassClient::new(&config.overpass_url, &config.user_agent)?;
        let builder = QueryBuilder::new(
            config.overpass_timeout_secs,
            config.max_results,
            config.max_clauses_per_query,
        );
        let processor = LeadProcessor::new(Scorer::from_niches(niches)?);
        let enricher = Enricher::from_config(config, &niches.probe_tlds)?;

        Ok(Self::new(geocoder, overpass, builder, processor)
            .with_enrichment(Arc::new(enricher))
            .with_radius_limits(config.default_radius_m, config.max_radius_m)
            .with_concurrency(config.enrich_concurrency)
            .with_cache(
                config.cache_capacity,
                Duration::from_secs(config.cache_ttl_secs),
            ))
    }

    /// Runs a search and classifies the outcome; never fails.
    pub async fn search(&self, params: &SearchParams, now: DateTime<Utc>) -> LeadReport {
        match self.run(params, now).await {
            Ok(report) => report,
            Err(PipelineError::LocationNotFound { query }) => {
                tracing::info!(query = %query, "location not found");
                LeadReport::empty(SearchStatus::LocationNotFound)
            }
            Err(e) => {
                tracing::warn!(error = %e, "lead search failed");
                LeadReport::empty(SearchStatus::UpstreamError(e.to_string()))
            }
        }
    }

    /// Runs a search, retrying once with a widened area and lookback when
    /// the first attempt yields no leads.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::LocationNotFound`] when the hint geocodes to nothing.
    /// - [`PipelineError::Osm`] when the geocoder or Overpass fails.
    pub async fn run(
        &self,
        params: &SearchParams,
        now: DateTime<Utc>,
    ) -> Result<LeadReport, PipelineError> {
        let key = params.cache_key();
        let cached = self
            .cache
            .try_get_or_compute(key, || self.run_uncached(params, now))
            .await?;

        let status = if cached.leads.is_empty() {
            SearchStatus::NoResults
        } else {
            SearchStatus::Found
        };
        Ok(LeadReport {
            leads: cached.leads,
            status,
            area: Some(cached.area),
            widened: cached.widened,
        })
    }

    /// Resolves the search area and renders the first-attempt queries
    /// without fetching anything.
    ///
    /// # Errors
    ///
    /// Same geocoding errors as [`Self::run`].
    pub async fn plan(
        &self,
        params: &SearchParams,
        now: DateTime<Utc>,
    ) -> Result<(SearchArea, Vec<QuerySpec>), PipelineError> {
        let area = self.resolve_area(params).await?;
        let query = location_query(params, area, params.recency_days, now);
        Ok((area, self.builder.build(&query)))
    }

    async fn run_uncached(
        &self,
        params: &SearchParams,
        now: DateTime<Utc>,
    ) -> Result<CachedSearch, PipelineError> {
        let area = self.resolve_area(params).await?;

        let leads = self.attempt(params, area, params.recency_days, now).await?;
        if !leads.is_empty() {
            tracing::info!(count = leads.len(), %area, "lead search complete");
            return Ok(CachedSearch {
                leads,
                area,
                widened: false,
            });
        }

        let wider = area.widened(WIDEN_FACTOR, self.max_radius_m);
        let lookback = params
            .recency_days
            .saturating_mul(WIDEN_FACTOR)
            .max(1);
        tracing::warn!(
            from = %area,
            to = %wider,
            recency_days = lookback,
            "no leads found; retrying once with widened parameters"
        );

        let leads = self.attempt(params, wider, lookback, now).await?;
        tracing::info!(count = leads.len(), area = %wider, "widened lead search complete");
        Ok(CachedSearch {
            leads,
            area: wider,
            widened: true,
        })
    }

    async fn resolve_area(&self, params: &SearchParams) -> Result<SearchArea, PipelineError> {
        let radius = params.radius_m.map(|r| {
            if r > self.max_radius_m {
                tracing::warn!(requested = r, max = self.max_radius_m, "radius capped");
            }
            r.min(self.max_radius_m)
        });

        match &params.location {
            LocationSpec::Point(center) => Ok(SearchArea::Around {
                center: *center,
                radius_m: radius.unwrap_or(self.default_radius_m),
            }),
            LocationSpec::Bounds(bbox) => Ok(match radius {
                Some(radius_m) => SearchArea::Around {
                    center: bbox.center(),
                    radius_m,
                },
                None => SearchArea::Within(*bbox),
            }),
            LocationSpec::Hint(hint) => {
                let place = self.geocoder.resolve(hint).await.map_err(|e| match e {
                    OsmError::NotFound { query } => PipelineError::LocationNotFound { query },
                    other => PipelineError::Osm(other),
                })?;
                Ok(match (radius, place.bounding_box) {
                    (Some(radius_m), _) => SearchArea::Around {
                        center: place.point,
                        radius_m,
                    },
                    (None, Some(bbox)) => SearchArea::Within(bbox),
                    (None, None) => SearchArea::Around {
                        center: place.point,
                        radius_m: self.default_radius_m,
                    },
                })
            }
        }
    }

    async fn attempt(
        &self,
        params: &SearchParams,
        area: SearchArea,
        recency_days: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<Lead>, PipelineError> {
        let query = location_query(params, area, recency_days, now);
        let specs = self.builder.build(&query);
        let records = self.overpass.execute_all(&specs).await?;
        tracing::debug!(
            batches = specs.len(),
            records = records.len(),
            %area,
            "fetched raw records"
        );

        let opts = ProcessOptions {
            exclusion_list: params.exclusion_list.clone(),
            recency_window_days: recency_days,
            enrich_contacts: params.enrich_contacts,
            probe_websites: params.probe_websites,
            concurrency: self.concurrency,
        };
        if opts.enrich_contacts || opts.probe_websites {
            Ok(self
                .processor
                .process_enriched(&records, &opts, now, self.enrichment.as_ref())
                .await)
        } else {
            Ok(self.processor.process(&records, &opts, now))
        }
    }
}

/// A lookback reaching past the earliest representable instant drops the
/// `newer` bound instead of overflowing.
fn location_query(
    params: &SearchParams,
    area: SearchArea,
    recency_days: u32,
    now: DateTime<Utc>,
) -> LocationQuery {
    LocationQuery {
        area,
        category_filters: params.categories.clone(),
        recency_threshold: chrono::TimeDelta::try_days(i64::from(recency_days))
            .and_then(|lookback| now.checked_sub_signed(lookback)),
        require_no_website: params.require_no_website,
    }
}
