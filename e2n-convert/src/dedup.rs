//! Cross-source service deduplication.
//!
//! Services are grouped by [`Service::identity`]. Within a group the entrant
//! with the smallest rank survives:
//!
//! 1. source priority (lower wins, default 100)
//! 2. freshness (newer wins)
//! 3. providerless services lose
//! 4. longer trimmed names win
//! 5. service key, ascending

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use e2n_core::{Bouquet, Profile, Service};
use serde::Serialize;

use crate::freshness::parse_timestamp;

pub const DEFAULT_PRIORITY: i64 = 100;
const PREVIEW_LEN: usize = 20;

/// One losing entrant of an identity group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DedupRecord {
    pub identity: String,
    /// Name of the surviving service.
    pub kept: String,
    /// Name of the dropped service.
    pub dropped: String,
    pub kept_key: String,
    pub dropped_key: String,
}

/// Fallbacks for services that carry no ranking extras of their own.
#[derive(Debug, Clone, Copy)]
pub struct RankDefaults {
    pub priority: i64,
    pub freshness: Option<DateTime<Utc>>,
    pub now: DateTime<Utc>,
}

impl RankDefaults {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            priority: profile
                .meta("source_priority")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_PRIORITY),
            freshness: profile.meta("last_seen").and_then(parse_timestamp),
            now: Utc::now(),
        }
    }
}

type Rank = (i64, Reverse<DateTime<Utc>>, u8, Reverse<usize>, String);

fn rank(service: &Service, defaults: &RankDefaults) -> Rank {
    let priority = service
        .extra
        .get("source_priority")
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(defaults.priority);
    let freshness = service
        .extra
        .get("fetched_at")
        .and_then(|f| parse_timestamp(f))
        .or(defaults.freshness)
        .unwrap_or(defaults.now);
    let provider_penalty = u8::from(service.provider_name().is_none());
    let name_len = service.name.trim().chars().count();
    (priority, Reverse(freshness), provider_penalty, Reverse(name_len), service.key.clone())
}

/// Keep one service per identity; return survivors and the audit records.
pub fn deduplicate_services(
    services: impl IntoIterator<Item = Service>,
    defaults: &RankDefaults,
) -> (Vec<Service>, Vec<DedupRecord>) {
    let mut groups: BTreeMap<String, Vec<Service>> = BTreeMap::new();
    for service in services {
        groups.entry(service.identity()).or_default().push(service);
    }

    let mut kept = Vec::with_capacity(groups.len());
    let mut records = Vec::new();
    for (identity, mut members) in groups {
        members.sort_by_cached_key(|s| rank(s, defaults));
        let mut members = members.into_iter();
        let Some(winner) = members.next() else {
            continue;
        };
        for loser in members {
            records.push(DedupRecord {
                identity: identity.clone(),
                kept: winner.name.clone(),
                dropped: loser.name,
                kept_key: winner.key.clone(),
                dropped_key: loser.key,
            });
        }
        kept.push(winner);
    }
    records.sort();
    (kept, records)
}

/// Drop bouquet entries whose service is gone, then empty bouquets.
pub fn prune_bouquets(bouquets: &mut Vec<Bouquet>, services: &BTreeMap<String, Service>) {
    for bouquet in bouquets.iter_mut() {
        bouquet
            .entries
            .retain(|entry| services.contains_key(&entry.service_key()));
    }
    bouquets.retain(|b| !b.entries.is_empty());
}

/// Deduplicate a profile in place and stamp the dedup metadata.
pub fn deduplicate_profile(profile: &mut Profile) -> Vec<DedupRecord> {
    let defaults = RankDefaults::from_profile(profile);
    let services = std::mem::take(&mut profile.services);
    let (kept, records) = deduplicate_services(services.into_values(), &defaults);
    for service in kept {
        profile.add_service(service);
    }
    prune_bouquets(&mut profile.bouquets, &profile.services);
    stamp_dedup_metadata(profile, &records);
    if !records.is_empty() {
        log::info!("removed {} duplicate services", records.len());
    }
    records
}

fn stamp_dedup_metadata(profile: &mut Profile, records: &[DedupRecord]) {
    profile.set_meta("service_count", profile.services.len().to_string());
    profile.set_meta("deduplicated_services", records.len().to_string());
    let preview: Vec<serde_json::Value> = records
        .iter()
        .take(PREVIEW_LEN)
        .map(|r| serde_json::json!({"identity": r.identity, "kept": r.kept, "dropped": r.dropped}))
        .collect();
    profile.set_meta(
        "deduplicated_preview",
        serde_json::Value::Array(preview).to_string(),
    );
}

/// Aggregate several source profiles into one and deduplicate the result.
///
/// Each service is stamped with its source's `source_priority` and
/// `fetched_at` so ranking still sees per-source values after the merge.
/// Transponders and metadata keep the first occurrence; bouquets with the
/// same name and category are concatenated without repeated entries.
pub fn merge_profiles(profiles: impl IntoIterator<Item = Profile>) -> (Profile, Vec<DedupRecord>) {
    let mut merged = Profile::new();
    let mut all_services = Vec::new();
    let mut sources = Vec::new();

    for profile in profiles {
        let priority = profile
            .meta("source_priority")
            .map_or_else(|| DEFAULT_PRIORITY.to_string(), str::to_string);
        let fetched = profile
            .meta("fetched_at")
            .or_else(|| profile.meta("last_seen"))
            .map(str::to_string);
        if let Some(source) = profile.meta("source_id") {
            sources.push(source.to_string());
        }

        for mut service in profile.services.into_values() {
            service
                .extra
                .entry("source_priority".into())
                .or_insert_with(|| priority.clone());
            if let Some(fetched) = &fetched {
                service
                    .extra
                    .entry("fetched_at".into())
                    .or_insert_with(|| fetched.clone());
            }
            all_services.push(service);
        }
        for (key, transponder) in profile.transponders {
            merged.transponders.entry(key).or_insert(transponder);
        }
        for (key, value) in profile.metadata {
            merged.metadata.entry(key).or_insert(value);
        }
        for bouquet in profile.bouquets {
            merge_bouquet(&mut merged.bouquets, bouquet);
        }
    }

    let defaults = RankDefaults {
        priority: DEFAULT_PRIORITY,
        freshness: None,
        now: Utc::now(),
    };
    let (kept, records) = deduplicate_services(all_services, &defaults);
    for service in kept {
        merged.add_service(service);
    }
    prune_bouquets(&mut merged.bouquets, &merged.services);
    if !sources.is_empty() {
        merged.set_meta("merged_sources", sources.join(","));
    }
    stamp_dedup_metadata(&mut merged, &records);
    (merged, records)
}

fn merge_bouquet(into: &mut Vec<Bouquet>, bouquet: Bouquet) {
    match into
        .iter_mut()
        .find(|b| b.name == bouquet.name && b.category == bouquet.category)
    {
        Some(existing) => {
            let mut seen: BTreeSet<String> =
                existing.entries.iter().map(|e| e.service_key()).collect();
            for entry in bouquet.entries {
                if seen.insert(entry.service_key()) {
                    existing.entries.push(entry);
                }
            }
        }
        None => into.push(bouquet),
    }
}

#[cfg(test)]
#[path = "tests/dedup_tests.rs"]
mod tests;
