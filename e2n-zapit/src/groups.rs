//! Delivery groups: the unit each output folder is rendered from.

use std::collections::{BTreeMap, HashMap, HashSet};

use e2n_core::{Bouquet, BouquetEntry, Delivery, Profile, Service, Transponder};
use regex::Regex;

use crate::auto_bouquets::generate_auto_bouquets;
use crate::names::{NameResolver, derive_hint};
use crate::options::WriterOptions;

/// Services, transponders and bouquets written into one folder.
#[derive(Debug, Clone)]
pub struct OutputGroup<'a> {
    /// `sat:Astra-19.2E`, `combo:...`, `all`.
    pub key: String,
    pub display_name: String,
    /// `None` for the master bundle.
    pub delivery: Option<Delivery>,
    pub services: Vec<&'a Service>,
    /// Transponders used by `services`; group members carry `display_name` in
    /// their extras.
    pub transponders: BTreeMap<String, Transponder>,
    pub bouquets: Vec<Bouquet>,
    pub metadata: BTreeMap<String, String>,
}

impl OutputGroup<'_> {
    /// `sat`, `cable`, `terrestrial` or `all`.
    pub fn category(&self) -> &'static str {
        self.delivery.map_or("all", |d| d.as_str())
    }

    /// Group element names for `services.xml`, keyed by transponder key.
    pub fn display_names(&self) -> HashMap<String, String> {
        self.transponders
            .iter()
            .filter_map(|(key, t)| {
                t.extra
                    .get("display_name")
                    .map(|name| (key.clone(), name.clone()))
            })
            .collect()
    }
}

/// Radio after TV, then by lowercase name and service id.
pub fn sort_services(services: &mut [&Service]) {
    services.sort_by_cached_key(|s| (s.is_radio, s.name.to_lowercase(), s.service_id));
}

/// Services with a known transponder whose delivery passes `include_types`.
pub fn filter_services<'a>(profile: &'a Profile, options: &WriterOptions) -> Vec<&'a Service> {
    let filter = options.delivery_filter();
    profile
        .services
        .values()
        .filter(|service| match profile.transponder_for(service) {
            Some(t) => filter.as_ref().is_none_or(|allowed| allowed.contains(&t.delivery)),
            None => false,
        })
        .collect()
}

/// Split `services` into satellite, cable and terrestrial groups.
///
/// Satellites are grouped by orbital position; cable and terrestrial
/// transponders are grouped by the hint derived from their services. Groups
/// come back ordered by category then lowercase display name.
pub fn build_groups<'a>(
    profile: &'a Profile,
    services: &[&'a Service],
    resolver: &NameResolver,
    options: &WriterOptions,
    filter: Option<&Regex>,
) -> Vec<OutputGroup<'a>> {
    let mut by_transponder: BTreeMap<&str, Vec<&'a Service>> = BTreeMap::new();
    for service in services {
        by_transponder
            .entry(service.transponder_key.as_str())
            .or_default()
            .push(service);
    }

    let mut groups: BTreeMap<(Delivery, String), OutputGroup<'a>> = BTreeMap::new();
    for (transponder_key, members) in by_transponder {
        let Some(transponder) = profile.transponders.get(transponder_key) else {
            continue;
        };
        let (folder, code_key, code) = match transponder.delivery {
            Delivery::Sat => {
                let name = resolver.satellite(transponder);
                if !options.satellites.is_empty()
                    && !options.satellites.iter().any(|s| *s == name.code || *s == name.folder)
                {
                    continue;
                }
                (name.folder, "satellite_code", name.code)
            }
            Delivery::Cable => {
                let name = resolver.cable(&derive_hint(&members));
                (name.folder, "provider_code", name.code)
            }
            Delivery::Terrestrial => {
                let name = resolver.terrestrial(&derive_hint(&members));
                (name.folder, "region_code", name.code)
            }
        };

        let group = groups
            .entry((transponder.delivery, folder.clone()))
            .or_insert_with(|| OutputGroup {
                key: format!("{}:{}", transponder.delivery, folder),
                display_name: folder.clone(),
                delivery: Some(transponder.delivery),
                services: Vec::new(),
                transponders: BTreeMap::new(),
                bouquets: Vec::new(),
                metadata: BTreeMap::from([
                    ("display_name".to_string(), folder.clone()),
                    (code_key.to_string(), code),
                ]),
            });
        group.services.extend(members);
        let mut labelled = transponder.clone();
        labelled.extra.insert("display_name".into(), folder);
        group.transponders.insert(transponder_key.to_string(), labelled);
    }

    let mut groups: Vec<OutputGroup<'a>> = groups.into_values().collect();
    for group in &mut groups {
        sort_services(&mut group.services);
        group.bouquets = filter_bouquets(&profile.bouquets, &group.services, filter);
    }
    groups.sort_by_cached_key(|g| (g.category(), g.display_name.to_lowercase()));
    groups
}

/// Keep the bouquets (and entries) that reference `services`.
///
/// Bouquets whose name does not match `filter` are skipped and bouquets left
/// without entries are dropped. When nothing survives, a fallback set is
/// generated from the services.
pub fn filter_bouquets(
    bouquets: &[Bouquet],
    services: &[&Service],
    filter: Option<&Regex>,
) -> Vec<Bouquet> {
    let allowed: HashSet<&str> = services.iter().map(|s| s.key.as_str()).collect();
    let kept: Vec<Bouquet> = bouquets
        .iter()
        .filter(|b| filter.is_none_or(|re| re.is_match(&b.name)))
        .filter_map(|b| {
            let entries: Vec<BouquetEntry> = b
                .entries
                .iter()
                .filter(|e| allowed.contains(e.service_key().as_str()))
                .cloned()
                .collect();
            if entries.is_empty() {
                return None;
            }
            let mut bouquet = Bouquet::new(b.name.clone(), b.category);
            bouquet.entries = entries;
            Some(bouquet)
        })
        .collect();

    if kept.is_empty() {
        generate_auto_bouquets(services)
    } else {
        kept
    }
}

/// Merge same-named bouquets, union their entries by service reference, sort
/// entries by reference and bouquets by lowercase name.
pub fn merge_bouquets(bouquets: impl IntoIterator<Item = Bouquet>) -> Vec<Bouquet> {
    let mut merged: Vec<Bouquet> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for bouquet in bouquets {
        match index.get(&bouquet.name) {
            Some(&i) => {
                let target = &mut merged[i];
                let existing: HashSet<String> =
                    target.entries.iter().map(|e| e.service_ref.clone()).collect();
                target.entries.extend(
                    bouquet
                        .entries
                        .into_iter()
                        .filter(|e| !existing.contains(&e.service_ref)),
                );
            }
            None => {
                index.insert(bouquet.name.clone(), merged.len());
                let mut fresh = Bouquet::new(bouquet.name, bouquet.category);
                fresh.entries = bouquet.entries;
                merged.push(fresh);
            }
        }
    }
    for bouquet in &mut merged {
        bouquet.entries.sort_by(|a, b| a.service_ref.cmp(&b.service_ref));
    }
    merged.sort_by_cached_key(|b| b.name.to_lowercase());
    merged
}

#[cfg(test)]
#[path = "tests/groups_tests.rs"]
mod tests;
