//! Composite lead score.
//!
//! `score = round(min(100, 100 * (wf * freshness + ws * specificity + wc * completeness)))`
//!
//! - freshness: `(window - age) / window`, linear, floored at 0; the window
//!   is treated as at least one day.
//! - specificity: highest weight among the configured tiers the record
//!   matches (never below the floor), or the default for unmatched records.
//! - completeness: fraction of the five address sub-fields present.

use hotleads_core::{CategoryFilter, NichesFile, RawRecord, ScoringConfig, ValuePattern};
use regex::Regex;

use crate::error::PipelineError;
use crate::fields::ADDRESS_FIELDS;

#[derive(Debug, Clone)]
enum TierMatch {
    Present,
    Exact(String),
    Pattern(Regex),
}

#[derive(Debug, Clone)]
struct Tier {
    key: String,
    matcher: TierMatch,
    weight: f64,
}

impl Tier {
    fn matches(&self, record: &RawRecord) -> bool {
        let Some(value) = record.attr(&self.key) else {
            return false;
        };
        match &self.matcher {
            TierMatch::Present => true,
            TierMatch::Exact(expected) => value == expected,
            TierMatch::Pattern(re) => re.is_match(value),
        }
    }
}

/// Deterministic scorer; holds no state beyond its configuration.
#[derive(Debug, Clone)]
pub struct Scorer {
    config: ScoringConfig,
    tiers: Vec<Tier>,
}

impl Scorer {
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidPattern`] if a regex tier does not compile.
    pub fn new(
        config: ScoringConfig,
        tiers: Vec<(CategoryFilter, f64)>,
    ) -> Result<Self, PipelineError> {
        let tiers = tiers
            .into_iter()
            .map(|(filter, weight)| {
                let matcher = match filter.value {
                    ValuePattern::Any => TierMatch::Present,
                    ValuePattern::Exact(v) => TierMatch::Exact(v),
                    ValuePattern::Regex(pattern) => TierMatch::Pattern(
                        Regex::new(&pattern)
                            .map_err(|source| PipelineError::InvalidPattern { pattern, source })?,
                    ),
                };
                Ok(Tier {
                    key: filter.key,
                    matcher,
                    weight,
                })
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;
        Ok(Self { config, tiers })
    }

    /// Scorer using the weights and niche tiers of a niches file.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] for an unparseable tag or regex tier.
    pub fn from_niches(niches: &NichesFile) -> Result<Self, PipelineError> {
        Self::new(niches.scoring, niches.specificity_tiers()?)
    }

    #[must_use]
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    #[must_use]
    pub fn freshness(days_since_listed: u32, recency_window_days: u32) -> f64 {
        let window = recency_window_days.max(1);
        let remaining = window.saturating_sub(days_since_listed);
        f64::from(remaining) / f64::from(window)
    }

    #[must_use]
    pub fn specificity(&self, record: &RawRecord) -> f64 {
        self.tiers
            .iter()
            .filter(|t| t.matches(record))
            .map(|t| t.weight)
            .reduce(f64::max)
            .map_or(self.config.default_specificity, |w| {
                w.max(self.config.specificity_floor)
            })
    }

    #[must_use]
    pub fn completeness(address_fields_present: usize) -> f64 {
        let present = address_fields_present.min(ADDRESS_FIELDS.len());
        #[allow(clippy::cast_precision_loss)]
        let ratio = present as f64 / ADDRESS_FIELDS.len() as f64;
        ratio
    }

    /// Final score in `[0, 100]`.
    #[must_use]
    pub fn score(
        &self,
        record: &RawRecord,
        days_since_listed: u32,
        recency_window_days: u32,
        address_fields_present: usize,
    ) -> u8 {
        let c = &self.config;
        let weighted = c.freshness * Self::freshness(days_since_listed, recency_window_days)
            + c.specificity * self.specificity(record)
            + c.completeness * Self::completeness(address_fields_present);
        let scaled = (100.0 * weighted).clamp(0.0, 100.0).round();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let score = scaled as u8;
        score
    }
}
