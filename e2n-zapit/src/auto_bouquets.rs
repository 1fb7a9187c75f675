//! Fallback bouquets for groups that no existing bouquet covers.

use std::collections::{BTreeMap, HashSet};

use e2n_core::{Bouquet, BouquetCategory, BouquetEntry, Service};

/// Service types carrying HD video.
pub const HD_TYPES: &[u32] = &[0x11, 0x16, 0x19, 0x1A, 0x1F, 0x20, 0x21, 0x22, 0x86];
/// Service types carrying UHD video.
pub const UHD_TYPES: &[u32] = &[0x1F, 0x20, 0x21, 0x22, 0x87];

/// Upper-case keywords marking public broadcasters in a name or provider.
const PUBLIC_BROADCASTERS: &[&str] = &[
    "ARD",
    "ZDF",
    "ORF",
    "SRF",
    "SRG",
    "3SAT",
    "ARTE",
    "PHOENIX",
    "TAGESSCHAU",
    "KIKA",
    "DEUTSCHLANDRADIO",
    "WDR",
    "NDR",
    "MDR",
    "RBB",
    "HR",
    "SWR",
    "BR",
];

fn is_public_service(service: &Service) -> bool {
    let name = service.name.to_uppercase();
    let provider = service.provider.as_deref().unwrap_or_default().to_uppercase();
    PUBLIC_BROADCASTERS
        .iter()
        .any(|kw| name.contains(kw) || provider.contains(kw))
}

/// Entries sorted by (lowercase name, sid), unique by key and reference.
fn entries(services: &[&Service]) -> Vec<BouquetEntry> {
    let mut sorted = services.to_vec();
    sorted.sort_by_cached_key(|s| (s.name.to_lowercase(), s.service_id));
    let mut seen_keys = HashSet::new();
    let mut seen_refs = HashSet::new();
    sorted
        .into_iter()
        .filter(|s| seen_keys.insert(s.key.as_str()))
        .filter_map(|s| {
            let entry = BouquetEntry::for_service(s);
            seen_refs.insert(entry.service_ref.clone()).then_some(entry)
        })
        .collect()
}

fn push_recipe(
    out: &mut Vec<Bouquet>,
    name: String,
    category: BouquetCategory,
    services: &[&Service],
) {
    let entries = entries(services);
    if !entries.is_empty() {
        let mut bouquet = Bouquet::new(name, category);
        bouquet.entries = entries;
        out.push(bouquet);
    }
}

fn of_types<'a>(services: &[&'a Service], types: &[u32]) -> Vec<&'a Service> {
    services
        .iter()
        .copied()
        .filter(|s| types.contains(&s.service_type))
        .collect()
}

/// Per-provider buckets, ordered by upper-cased provider name.
fn push_providers(
    out: &mut Vec<Bouquet>,
    prefix: &str,
    category: BouquetCategory,
    services: &[&Service],
) {
    let mut by_provider: BTreeMap<(String, &str), Vec<&Service>> = BTreeMap::new();
    for service in services {
        if let Some(provider) = service.provider.as_deref().filter(|p| !p.is_empty()) {
            by_provider
                .entry((provider.to_uppercase(), provider))
                .or_default()
                .push(service);
        }
    }
    for ((_, provider), members) in by_provider {
        push_recipe(out, format!("{prefix}{provider}"), category, &members);
    }
}

/// Free / Free HD / Free UHD / Public Service / Private / Pay / Pay HD and
/// per-provider TV bouquets, then the radio equivalents, sorted by
/// lowercase name.
pub fn generate_auto_bouquets(services: &[&Service]) -> Vec<Bouquet> {
    let (radio, tv): (Vec<&Service>, Vec<&Service>) =
        services.iter().copied().partition(|s| s.is_radio);
    let mut bouquets = Vec::new();

    if !tv.is_empty() {
        let (pay, free): (Vec<&Service>, Vec<&Service>) =
            tv.iter().copied().partition(|s| s.is_encrypted());
        let (public, private): (Vec<&Service>, Vec<&Service>) =
            free.iter().copied().partition(|s| is_public_service(s));

        let recipes: [(&str, Vec<&Service>); 7] = [
            ("TV – Free", free.clone()),
            ("TV – Free HD", of_types(&free, HD_TYPES)),
            ("TV – Free UHD", of_types(&free, UHD_TYPES)),
            ("TV – Public Service", public),
            ("TV – Private", private),
            ("TV – Pay HD", of_types(&pay, HD_TYPES)),
            ("TV – Pay", pay),
        ];
        for (name, members) in &recipes {
            push_recipe(&mut bouquets, name.to_string(), BouquetCategory::Tv, members);
        }
        push_providers(&mut bouquets, "TV – Provider: ", BouquetCategory::Tv, &tv);
    }

    if !radio.is_empty() {
        let (pay, free): (Vec<&Service>, Vec<&Service>) =
            radio.iter().copied().partition(|s| s.is_encrypted());
        push_recipe(&mut bouquets, "Radio – Free".into(), BouquetCategory::Radio, &free);
        push_recipe(&mut bouquets, "Radio – Pay".into(), BouquetCategory::Radio, &pay);
        push_providers(&mut bouquets, "Radio – Provider: ", BouquetCategory::Radio, &radio);
    }

    bouquets.sort_by_cached_key(|b| b.name.to_lowercase());
    bouquets
}
