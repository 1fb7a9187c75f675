use e2n_catalog::{
    Catalog, CatalogOverrides, OTHERS, PayTvNetwork, ProviderCategory, RESOLUTION_HD,
    RESOLUTION_SD, RESOLUTION_UHD,
};
use e2n_core::{Delivery, Service, Transponder};

fn service(name: &str, provider: Option<&str>) -> Service {
    let t = Transponder::with_ids(Delivery::Sat, 11_493_750, 0x00c0_0000, 0x0421, 1);
    let mut s = Service::new(&t, 0x6dca, 1, name);
    s.provider = provider.map(str::to_string);
    s
}

#[test]
fn first_matching_category_wins() {
    let catalog = Catalog::builtin().unwrap();
    // "cinema" (Movies) comes before "sky" (Sky) in the order
    assert_eq!(catalog.infer_category(&service("Sky Cinema Action", None)), "Movies");
    assert_eq!(catalog.infer_category(&service("Eurosport 1", None)), "Sports");
    assert_eq!(catalog.infer_category(&service("SAT.1 Gold", None)), "ProSiebenSat.1");
}

#[test]
fn punctuation_in_brand_patterns_is_literal() {
    let catalog = Catalog::builtin().unwrap();
    assert_eq!(catalog.infer_category(&service("Canal+ Premium", None)), "TF1");
    assert_eq!(catalog.infer_category(&service("Canall Zzz", None)), OTHERS);
    assert_eq!(catalog.infer_category(&service("Satx1 Zzz", None)), OTHERS);
}

#[test]
fn provider_participates_in_matching() {
    let catalog = Catalog::builtin().unwrap();
    assert_eq!(catalog.infer_category(&service("Kanal X", Some("QVC"))), "Shopping");
}

#[test]
fn unmatched_falls_back_to_others() {
    let catalog = Catalog::builtin().unwrap();
    assert_eq!(catalog.infer_category(&service("Zzz", Some("Qqq"))), OTHERS);
}

#[test]
fn resolution_priority() {
    let catalog = Catalog::builtin().unwrap();
    assert_eq!(catalog.resolution_categories(&service("Foo UHD", None)), vec![RESOLUTION_UHD]);
    assert_eq!(catalog.resolution_categories(&service("Das Erste HD", None)), vec![RESOLUTION_HD]);
    assert_eq!(catalog.resolution_categories(&service("Foo SD", None)), vec![RESOLUTION_SD]);
    assert!(catalog.resolution_categories(&service("Foo", None)).is_empty());
}

#[test]
fn resolution_extra_is_a_fallback() {
    let catalog = Catalog::builtin().unwrap();
    let mut s = service("Foo", None);
    s.extra.insert("resolution".into(), "fhd".into());
    assert_eq!(catalog.resolution_categories(&s), vec![RESOLUTION_HD]);
}

#[test]
fn overrides_append_categories() {
    let mut overrides = CatalogOverrides::default();
    overrides
        .category_patterns
        .insert("Gaming".into(), vec!["pixel".into()]);
    overrides.paytv.push(PayTvNetwork {
        brand: "Sky".into(),
        country: Some("DE".into()),
        resolution: None,
        keywords: vec!["Sky Cinema".into()],
    });
    overrides.providers.push(ProviderCategory {
        provider: "Vodafone".into(),
        category: "Provider - Vodafone".into(),
    });
    let catalog = Catalog::with_overrides(overrides).unwrap();

    let order: Vec<&str> = catalog.category_order().collect();
    let others = order.iter().position(|c| *c == OTHERS).unwrap();
    assert_eq!(&order[others + 1..], ["Gaming", "PayTV - Sky - DE", "Provider - Vodafone"]);

    assert_eq!(catalog.infer_category(&service("Pixel Arena", None)), "Gaming");
    assert_eq!(
        catalog.paytv_categories(&service("Sky Cinema Premieren", None)),
        vec!["PayTV - Sky - DE"]
    );
    assert_eq!(
        catalog.provider_category(&service("x", Some("Vodafone Kabel"))),
        Some("Provider - Vodafone")
    );
    assert_eq!(catalog.provider_category(&service("x", None)), None);
}

#[test]
fn radio_categories_match_every_bucket() {
    let catalog = Catalog::builtin().unwrap();
    let cats = catalog.radio_categories(&service("Bayern 3 Hits", None));
    assert!(cats.contains(&"Radio - Music"));
    assert!(cats.contains(&"Radio - Regional"));
}

#[test]
fn radio_override_replaces_patterns() {
    let mut overrides = CatalogOverrides::default();
    overrides
        .radio_patterns
        .insert("Radio - Music".into(), vec!["^never$".into()]);
    let catalog = Catalog::with_overrides(overrides).unwrap();
    assert!(
        !catalog
            .radio_categories(&service("Rock Antenne", None))
            .contains(&"Radio - Music")
    );
}
