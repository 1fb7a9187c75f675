//! Scan entry normalization: filter, deduplicate, group.

use std::collections::{BTreeSet, HashMap};

use e2n_core::{DedupReason, Delivery, ScanDedupDecision, ScanfileBundle, TransponderScanEntry};

use crate::freshness::parse_timestamp;

/// Provider/region allow-lists and expectations, all case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    pub providers: Vec<String>,
    pub regions: Vec<String>,
    pub expected_providers: Vec<String>,
    pub expected_regions: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ScanNormalization {
    pub bundle: ScanfileBundle,
    pub deduplicated: Vec<ScanDedupDecision>,
    pub warnings: Vec<String>,
    pub missing_providers: BTreeSet<String>,
    pub missing_regions: BTreeSet<String>,
}

pub fn normalize_scan_entries(
    entries: impl IntoIterator<Item = TransponderScanEntry>,
    options: &NormalizeOptions,
) -> ScanNormalization {
    let filtered = filter_entries(entries, &options.providers, &options.regions);
    let (survivors, deduplicated) = deduplicate_scan_entries(filtered);
    let bundle = group_entries(survivors);

    let missing_providers = missing(bundle.cable.keys(), &options.expected_providers);
    let missing_regions = missing(bundle.terrestrial.keys(), &options.expected_regions);
    let mut warnings = Vec::new();
    if !missing_providers.is_empty() {
        warnings.push(format!("missing cable providers: {}", join(&missing_providers)));
    }
    if !missing_regions.is_empty() {
        warnings.push(format!("missing terrestrial regions: {}", join(&missing_regions)));
    }
    for warning in &warnings {
        log::warn!("scanfiles: {warning}");
    }

    ScanNormalization {
        bundle,
        deduplicated,
        warnings,
        missing_providers,
        missing_regions,
    }
}

fn join(set: &BTreeSet<String>) -> String {
    set.iter().cloned().collect::<Vec<_>>().join(", ")
}

/// Entries without a provider (or region) always pass that filter.
fn filter_entries(
    entries: impl IntoIterator<Item = TransponderScanEntry>,
    providers: &[String],
    regions: &[String],
) -> Vec<TransponderScanEntry> {
    let providers: BTreeSet<String> = providers.iter().map(|p| p.to_lowercase()).collect();
    let regions: BTreeSet<String> = regions.iter().map(|r| r.to_lowercase()).collect();
    let allowed = |filter: &BTreeSet<String>, value: Option<&str>| {
        let value = value.unwrap_or_default().to_lowercase();
        filter.is_empty() || value.is_empty() || filter.contains(&value)
    };
    entries
        .into_iter()
        .filter(|e| {
            allowed(&providers, e.provider.as_deref()) && allowed(&regions, e.region.as_deref())
        })
        .collect()
}

/// `DELIVERY|scope|frequency|rate-or-bandwidth|modulation|fec|polarization`.
pub fn scan_identity(entry: &TransponderScanEntry) -> String {
    let delivery = entry.delivery_system.to_uppercase();
    let scope = match entry.delivery_class() {
        Some(Delivery::Cable) => entry.provider.as_deref(),
        Some(Delivery::Terrestrial) => entry.region.as_deref(),
        _ => entry.provider.as_deref().or(entry.region.as_deref()),
    };
    let lower = |v: &Option<String>| v.as_deref().unwrap_or_default().to_lowercase();
    [
        delivery,
        scope.unwrap_or_default().to_lowercase(),
        entry.frequency_hz.to_string(),
        entry.rate_or_bandwidth().to_string(),
        lower(&entry.modulation),
        lower(&entry.fec),
        lower(&entry.polarization),
    ]
    .join("|")
}

/// Keep one entry per identity in first-seen order, recording each collision.
pub fn deduplicate_scan_entries(
    entries: impl IntoIterator<Item = TransponderScanEntry>,
) -> (Vec<TransponderScanEntry>, Vec<ScanDedupDecision>) {
    let mut kept: Vec<TransponderScanEntry> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut decisions = Vec::new();

    for entry in entries {
        let identity = scan_identity(&entry);
        let Some(&slot) = index.get(&identity) else {
            index.insert(identity, kept.len());
            kept.push(entry);
            continue;
        };
        let existing = kept[slot].clone();
        let (replace, reason) = prefer(&existing, &entry);
        let (keep, drop) = if replace {
            kept[slot] = entry.clone();
            (entry, existing)
        } else {
            (existing, entry)
        };
        log::debug!("scan duplicate {identity}: {}", reason.as_str());
        decisions.push(ScanDedupDecision {
            identity,
            kept: keep,
            dropped: drop,
            reason,
        });
    }
    (kept, decisions)
}

/// Whether `second` should replace `first`.
fn prefer(first: &TransponderScanEntry, second: &TransponderScanEntry) -> (bool, DedupReason) {
    let first_seen = parse_timestamp(&first.last_seen);
    let second_seen = parse_timestamp(&second.last_seen);
    match (first_seen, second_seen) {
        (Some(a), Some(b)) if b > a => return (true, DedupReason::NewerLastSeen),
        (Some(a), Some(b)) if a > b => return (false, DedupReason::OlderLastSeen),
        (None, Some(_)) => return (true, DedupReason::NewerLastSeen),
        (Some(_), None) => return (false, DedupReason::OlderLastSeen),
        _ => {}
    }
    match second.extras.len().cmp(&first.extras.len()) {
        std::cmp::Ordering::Greater => (true, DedupReason::MoreMetadata),
        std::cmp::Ordering::Less => (false, DedupReason::MoreMetadata),
        std::cmp::Ordering::Equal => (false, DedupReason::StableOrder),
    }
}

/// Cable by provider, terrestrial by region, satellite by region then
/// provider; anything else is only noted under `ignored` provenance.
fn group_entries(entries: Vec<TransponderScanEntry>) -> ScanfileBundle {
    let mut bundle = ScanfileBundle::default();
    for entry in entries {
        let (class, key) = match entry.delivery_class() {
            Some(Delivery::Cable) => ("cable", entry.provider.clone()),
            Some(Delivery::Terrestrial) => ("terrestrial", entry.region.clone()),
            Some(Delivery::Sat) => (
                "satellite",
                entry.region.clone().or_else(|| entry.provider.clone()),
            ),
            None => ("ignored", entry.provider.clone().or_else(|| entry.region.clone())),
        };
        let fallback = if class == "ignored" { "unknown" } else { "Unknown" };
        let key = key.unwrap_or_else(|| fallback.into());
        bundle
            .provenance
            .entry(class.into())
            .or_default()
            .entry(key.clone())
            .or_default()
            .push(entry.source_provenance.clone());

        let table = match entry.delivery_class() {
            Some(Delivery::Cable) => &mut bundle.cable,
            Some(Delivery::Terrestrial) => &mut bundle.terrestrial,
            Some(Delivery::Sat) => &mut bundle.satellite,
            None => continue,
        };
        table.entry(key).or_default().push(entry);
    }

    for table in [&mut bundle.cable, &mut bundle.terrestrial, &mut bundle.satellite] {
        for entries in table.values_mut() {
            entries.sort_by_cached_key(|e| {
                (e.frequency_hz, e.rate_or_bandwidth(), e.modulation.clone().unwrap_or_default())
            });
        }
    }
    bundle
}

fn missing<'a>(present: impl Iterator<Item = &'a String>, expected: &[String]) -> BTreeSet<String> {
    let present: BTreeSet<String> = present.map(|p| p.to_lowercase()).collect();
    expected
        .iter()
        .filter(|e| !present.contains(&e.to_lowercase()))
        .cloned()
        .collect()
}

#[cfg(test)]
#[path = "tests/normalize_tests.rs"]
mod tests;
