//! Raw record filtering, contact resolution, scoring, and ranking.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use futures::stream::{self, StreamExt};
use hotleads_core::{GeoPoint, Lead, RawRecord};
use hotleads_enrich::Enrichment;

use crate::fields::{address_parts, city, explicit_contact, ADDRESS_SEPARATOR};
use crate::scorer::Scorer;

/// Per-invocation processing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Names containing any of these (case-insensitively) are dropped.
    pub exclusion_list: Vec<String>,
    pub recency_window_days: u32,
    /// Ask the enricher for a phone number when a record carries no contact.
    pub enrich_contacts: bool,
    /// Drop records whose name probes as an existing website.
    pub probe_websites: bool,
    /// Maximum in-flight enrichment lookups.
    pub concurrency: usize,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            exclusion_list: Vec::new(),
            recency_window_days: 7,
            enrich_contacts: false,
            probe_websites: false,
            concurrency: 5,
        }
    }
}

/// A record that passed the name, exclusion, position, and recency checks.
struct Candidate<'a> {
    index: usize,
    record: &'a RawRecord,
    name: &'a str,
    position: GeoPoint,
    days_since_listed: u32,
}

pub struct LeadProcessor {
    scorer: Scorer,
}

impl LeadProcessor {
    #[must_use]
    pub fn new(scorer: Scorer) -> Self {
        Self { scorer }
    }

    #[must_use]
    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Processes `records` using only the contact data they already carry.
    ///
    /// `enrich_contacts` and `probe_websites` are ignored here; use
    /// [`Self::process_enriched`] for those. The output is sorted by score
    /// descending, ties in source order, and depends only on the arguments.
    #[must_use]
    pub fn process(
        &self,
        records: &[RawRecord],
        opts: &ProcessOptions,
        now: DateTime<Utc>,
    ) -> Vec<Lead> {
        let exclusions = normalize_exclusions(&opts.exclusion_list);
        let leads = screen_all(records, &exclusions, opts.recency_window_days, now)
            .into_iter()
            .filter_map(|c| {
                let Some(contact) = explicit_contact(c.record) else {
                    skip(c.record, "no contact");
                    return None;
                };
                Some(self.build_lead(&c, contact.to_owned(), opts.recency_window_days))
            })
            .collect();
        rank(leads)
    }

    /// Like [`Self::process`], with optional directory lookups for records
    /// lacking a contact and an optional website probe.
    ///
    /// Lookups run with at most `opts.concurrency` in flight. Completion
    /// order never affects the output order.
    pub async fn process_enriched(
        &self,
        records: &[RawRecord],
        opts: &ProcessOptions,
        now: DateTime<Utc>,
        enrichment: &dyn Enrichment,
    ) -> Vec<Lead> {
        let exclusions = normalize_exclusions(&opts.exclusion_list);
        let candidates = screen_all(records, &exclusions, opts.recency_window_days, now);
        let candidate_count = candidates.len();

        let mut resolved: Vec<(usize, Option<Lead>)> = stream::iter(candidates)
            .map(|c| async move {
                let index = c.index;
                (index, self.resolve_candidate(c, opts, enrichment).await)
            })
            .buffer_unordered(opts.concurrency.max(1))
            .collect()
            .await;
        resolved.sort_by_key(|(index, _)| *index);

        let leads: Vec<Lead> = resolved.into_iter().filter_map(|(_, lead)| lead).collect();
        tracing::debug!(
            candidates = candidate_count,
            kept = leads.len(),
            "enrichment pass finished"
        );
        rank(leads)
    }

    async fn resolve_candidate(
        &self,
        c: Candidate<'_>,
        opts: &ProcessOptions,
        enrichment: &dyn Enrichment,
    ) -> Option<Lead> {
        let contact = match explicit_contact(c.record) {
            Some(contact) => contact.to_owned(),
            None if opts.enrich_contacts => {
                match enrichment.enrich_contact(c.name, city(c.record)).await {
                    Some(found) => found,
                    None => {
                        skip(c.record, "no contact after enrichment");
                        return None;
                    }
                }
            }
            None => {
                skip(c.record, "no contact");
                return None;
            }
        };

        if opts.probe_websites && enrichment.probe_website(c.name).await {
            skip(c.record, "website found by probe");
            return None;
        }

        Some(self.build_lead(&c, contact, opts.recency_window_days))
    }

    fn build_lead(&self, c: &Candidate<'_>, contact: String, recency_window_days: u32) -> Lead {
        let parts = address_parts(c.record);
        let score = self
            .scorer
            .score(c.record, c.days_since_listed, recency_window_days, parts.len());
        Lead {
            id: c.record.id.clone(),
            name: c.name.to_owned(),
            contact,
            address: parts.join(ADDRESS_SEPARATOR),
            days_since_listed: c.days_since_listed,
            score,
            position: c.position,
        }
    }
}

fn screen_all<'a>(
    records: &'a [RawRecord],
    exclusions: &[String],
    recency_window_days: u32,
    now: DateTime<Utc>,
) -> Vec<Candidate<'a>> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| screen(index, record, exclusions, recency_window_days, now))
        .collect()
}

fn screen<'a>(
    index: usize,
    record: &'a RawRecord,
    exclusions: &[String],
    recency_window_days: u32,
    now: DateTime<Utc>,
) -> Option<Candidate<'a>> {
    let Some(name) = record.name() else {
        skip(record, "missing name");
        return None;
    };

    let lowered = name.to_lowercase();
    if let Some(entry) = exclusions.iter().find(|e| lowered.contains(e.as_str())) {
        tracing::debug!(id = %record.id, name, entry = %entry, "record skipped: excluded name");
        return None;
    }

    let Some(position) = record.position else {
        skip(record, "no position");
        return None;
    };

    let Some(listed) = record.last_modified.as_deref().and_then(parse_timestamp) else {
        tracing::debug!(
            id = %record.id,
            timestamp = record.last_modified.as_deref(),
            "record skipped: unparseable timestamp"
        );
        return None;
    };

    let days_since_listed = age_in_days(listed, now);
    if days_since_listed > recency_window_days {
        tracing::debug!(
            id = %record.id,
            days_since_listed,
            recency_window_days,
            "record skipped: outside recency window"
        );
        return None;
    }

    Some(Candidate {
        index,
        record,
        name,
        position,
        days_since_listed,
    })
}

fn skip(record: &RawRecord, reason: &str) {
    tracing::debug!(id = %record.id, reason, "record skipped");
}

/// Parses an RFC 3339 instant, or a naive `YYYY-MM-DDTHH:MM:SS` taken as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Whole days elapsed, truncated; instants in the future count as 0.
fn age_in_days(listed: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let days = now.signed_duration_since(listed).num_days().max(0);
    u32::try_from(days).unwrap_or(u32::MAX)
}

fn normalize_exclusions(list: &[String]) -> Vec<String> {
    list.iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Drops repeated `(name, contact)` pairs, keeping the first, then sorts by
/// score descending. The sort is stable so ties stay in source order.
fn rank(leads: Vec<Lead>) -> Vec<Lead> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Lead> = leads
        .into_iter()
        .filter(|lead| seen.insert((lead.name.to_lowercase(), lead.contact.clone())))
        .collect();
    unique.sort_by(|a, b| b.score.cmp(&a.score));
    unique
}

#[cfg(test)]
#[path = "processor_test.rs"]
mod tests;
