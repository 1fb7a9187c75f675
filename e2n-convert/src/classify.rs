//! Category bouquet synthesis.

use std::collections::{BTreeMap, HashMap};

use e2n_catalog::Catalog;
use e2n_core::{Bouquet, BouquetCategory, Profile, Service};

pub const GENERAL: &str = "General";
pub const RADIO: &str = "Radio";

/// Build category bouquets and place them ahead of the existing ones.
///
/// Order: `General` (every TV service), each non-empty catalog category in
/// catalog order, `Radio` with its sub-categories alphabetically, then the
/// profile's own bouquets untouched.
pub fn apply_category_bouquets(profile: &mut Profile, catalog: &Catalog) {
    let mut services: Vec<&Service> = profile.services.values().collect();
    services.sort_by_cached_key(|s| (s.is_radio, s.name.to_lowercase(), s.service_id));

    let mut buckets: HashMap<&str, Vec<&Service>> = HashMap::new();
    let mut radio_buckets: BTreeMap<&str, Vec<&Service>> = BTreeMap::new();
    let (radio, tv): (Vec<&Service>, Vec<&Service>) =
        services.iter().copied().partition(|s| s.is_radio);

    for &service in &tv {
        buckets
            .entry(catalog.infer_category(service))
            .or_default()
            .push(service);
        for category in catalog.paytv_categories(service) {
            buckets.entry(category).or_default().push(service);
        }
        if let Some(category) = catalog.provider_category(service) {
            buckets.entry(category).or_default().push(service);
        }
        for category in catalog.resolution_categories(service) {
            buckets.entry(category).or_default().push(service);
        }
    }
    for &service in &radio {
        for category in catalog.radio_categories(service) {
            radio_buckets.entry(category).or_default().push(service);
        }
    }

    let mut generated = Vec::new();
    if !tv.is_empty() {
        generated.push(Bouquet::from_services(GENERAL, BouquetCategory::Tv, tv.iter().copied()));
    }
    for category in catalog.category_order() {
        if let Some(members) = buckets.get(category).filter(|m| !m.is_empty()) {
            generated.push(Bouquet::from_services(
                category,
                BouquetCategory::Tv,
                members.iter().copied(),
            ));
        }
    }
    if !radio.is_empty() {
        generated.push(Bouquet::from_services(
            RADIO,
            BouquetCategory::Radio,
            radio.iter().copied(),
        ));
        for (category, members) in &radio_buckets {
            generated.push(Bouquet::from_services(
                *category,
                BouquetCategory::Radio,
                members.iter().copied(),
            ));
        }
    }

    log::debug!("generated {} category bouquets", generated.len());
    generated.append(&mut profile.bouquets);
    profile.bouquets = generated;
}
