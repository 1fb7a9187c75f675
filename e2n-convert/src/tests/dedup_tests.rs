use super::*;
use chrono::TimeZone;
use e2n_core::{BouquetCategory, Delivery, Transponder};

fn transponder() -> Transponder {
    Transponder::with_ids(Delivery::Sat, 11_493_750, 0x00c0_0000, 0x0421, 1)
}

fn service(name: &str, provider: Option<&str>, priority: Option<&str>) -> Service {
    let mut s = Service::new(&transponder(), 0x6dca, 1, name);
    s.provider = provider.map(str::to_string);
    if let Some(p) = priority {
        s.extra.insert("source_priority".into(), p.into());
    }
    s
}

fn defaults() -> RankDefaults {
    RankDefaults {
        priority: DEFAULT_PRIORITY,
        freshness: None,
        now: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
    }
}

#[test]
fn test_priority_wins_over_everything() {
    let (kept, records) = deduplicate_services(
        [
            service("Das Erste HD", Some("ARD"), Some("50")),
            service("Erste", None, Some("10")),
        ],
        &defaults(),
    );
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].name, "Erste");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kept, "Erste");
    assert_eq!(records[0].dropped, "Das Erste HD");
}

#[test]
fn test_newer_fetch_wins() {
    let mut older = service("Das Erste HD", Some("ARD"), None);
    older.extra.insert("fetched_at".into(), "2024-01-01T00:00:00Z".into());
    let mut newer = service("Erste", Some("ARD"), None);
    newer.extra.insert("fetched_at".into(), "2024-06-01T00:00:00Z".into());
    let (kept, _) = deduplicate_services([older, newer], &defaults());
    assert_eq!(kept[0].name, "Erste");
}

#[test]
fn test_provider_then_name_length() {
    let (kept, _) = deduplicate_services(
        [service("Das Erste HD", None, None), service("Erste", Some("ARD"), None)],
        &defaults(),
    );
    assert_eq!(kept[0].name, "Erste");

    let (kept, _) = deduplicate_services(
        [service("Erste", Some("ARD"), None), service("  Das Erste HD  ", Some("ARD"), None)],
        &defaults(),
    );
    assert_eq!(kept[0].name.trim(), "Das Erste HD");
}

#[test]
fn test_outcome_independent_of_order() {
    let input = vec![
        service("Das Erste", Some("ARD"), None),
        service("Das Erste HD", None, None),
        service("Erste", Some("ARD"), Some("90")),
    ];
    let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
    for order in orders {
        let permuted: Vec<Service> = order.iter().map(|&i| input[i].clone()).collect();
        let (kept, records) = deduplicate_services(permuted, &defaults());
        assert_eq!(kept.len(), 1, "{order:?}");
        assert_eq!(kept[0].name, "Erste", "{order:?}");
        let dropped: Vec<&str> = records.iter().map(|r| r.dropped.as_str()).collect();
        assert_eq!(dropped, vec!["Das Erste", "Das Erste HD"], "{order:?}");
    }
}

#[test]
fn test_merge_profiles_prunes_and_stamps() {
    let t = transponder();
    let other = Transponder::with_ids(Delivery::Sat, 11_523_750, 0x00c0_0000, 0x0425, 1);

    let mut primary = Profile::new();
    primary.set_meta("source_id", "primary");
    primary.set_meta("source_priority", "10");
    primary.add_transponder(t.clone());
    let erste = service("Das Erste HD", Some("ARD"), None);
    primary.bouquets.push(Bouquet::from_services("Favourites", BouquetCategory::Tv, [&erste]));
    primary.add_service(erste);

    let mut secondary = Profile::new();
    secondary.set_meta("source_id", "secondary");
    secondary.add_transponder(t);
    secondary.add_transponder(other.clone());
    let dup = service("Erste", None, None);
    let zdf = Service::new(&other, 0x2b7a, 1, "ZDF HD");
    secondary
        .bouquets
        .push(Bouquet::from_services("Favourites", BouquetCategory::Tv, [&dup, &zdf]));
    secondary.add_service(dup);
    secondary.add_service(zdf);

    let (merged, records) = merge_profiles([primary, secondary]);
    assert_eq!(merged.services.len(), 2);
    assert_eq!(merged.transponders.len(), 2);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kept, "Das Erste HD");
    assert_eq!(merged.meta("merged_sources"), Some("primary,secondary"));
    assert_eq!(merged.meta("deduplicated_services"), Some("1"));
    assert_eq!(merged.meta("service_count"), Some("2"));

    // same-name bouquets merge by service key
    assert_eq!(merged.bouquets.len(), 1);
    assert_eq!(merged.bouquets[0].entries.len(), 2);

    let preview: serde_json::Value =
        serde_json::from_str(merged.meta("deduplicated_preview").unwrap()).unwrap();
    assert_eq!(preview[0]["dropped"], "Erste");
}

#[test]
fn test_prune_drops_dangling_entries() {
    let t = transponder();
    let kept = Service::new(&t, 1, 1, "Kept");
    let gone = Service::new(&t, 2, 1, "Gone");
    let mut bouquets = vec![
        Bouquet::from_services("Mixed", BouquetCategory::Tv, [&kept, &gone]),
        Bouquet::from_services("Orphans", BouquetCategory::Tv, [&gone]),
    ];
    let mut services = BTreeMap::new();
    services.insert(kept.key.clone(), kept);
    prune_bouquets(&mut bouquets, &services);
    assert_eq!(bouquets.len(), 1);
    assert_eq!(bouquets[0].entries.len(), 1);
}

#[test]
fn test_deduplicate_profile_metadata() {
    let mut profile = Profile::new();
    profile.add_transponder(transponder());
    profile.add_service(service("Das Erste HD", Some("ARD"), None));
    let records = deduplicate_profile(&mut profile);
    assert!(records.is_empty());
    assert_eq!(profile.meta("deduplicated_services"), Some("0"));
    assert_eq!(profile.meta("deduplicated_preview"), Some("[]"));
}
