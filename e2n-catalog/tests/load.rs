use e2n_catalog::{LoadError, load_catalog, load_name_map, load_overrides};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

#[test]
fn missing_directory_yields_no_overrides() {
    let tmp = TempDir::new().unwrap();
    let overrides = load_overrides(&tmp.path().join("nope")).unwrap();
    assert!(overrides.is_empty());
}

#[test]
fn file_instead_of_directory_is_an_error() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "plain", "x");
    let err = load_overrides(&tmp.path().join("plain")).unwrap_err();
    assert!(matches!(err, LoadError::NotADirectory(_)));
}

#[test]
fn reads_all_override_files() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "bouquet_category_patterns.json", r#"{"Gaming": ["pixel", ""]}"#);
    write(
        tmp.path(),
        "paytv_networks.json",
        r#"[{"brand": "Sky", "country": "DE", "keywords": ["sky cinema"]}, {"brand": "", "keywords": ["x"]}]"#,
    );
    write(
        tmp.path(),
        "provider_categories.json",
        r#"[{"provider": "Vodafone", "category": "Provider - Vodafone"}]"#,
    );
    write(tmp.path(), "radio_category_patterns.json", r#"{"Radio - Talk": ["talk"]}"#);

    let overrides = load_overrides(tmp.path()).unwrap();
    assert_eq!(overrides.category_patterns["Gaming"], vec!["pixel", ""]);
    assert_eq!(overrides.paytv.len(), 2);
    assert_eq!(overrides.providers[0].provider, "Vodafone");

    let catalog = load_catalog(Some(tmp.path())).unwrap();
    let order: Vec<&str> = catalog.category_order().collect();
    assert!(order.contains(&"Gaming"));
    assert!(order.contains(&"PayTV - Sky - DE"));
    // entries without a brand are ignored
    assert!(!order.iter().any(|c| c.starts_with("PayTV - x")));
}

#[test]
fn malformed_json_names_the_file() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "paytv_networks.json", "{ nope");
    let err = load_overrides(tmp.path()).unwrap_err();
    assert!(err.to_string().contains("paytv_networks.json"));
}

#[test]
fn name_map_json_and_yaml() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "names.json", r#"{"sat": {"S19.2E": "Astra 1"}}"#);
    write(tmp.path(), "names.yaml", "cable:\n  vodafone: Vodafone West\n");

    let json = load_name_map(&tmp.path().join("names.json")).unwrap();
    assert_eq!(json.lookup("sat", "S19.2E"), Some("Astra 1"));
    assert_eq!(json.lookup("cable", "S19.2E"), None);

    let yaml = load_name_map(&tmp.path().join("names.yaml")).unwrap();
    assert_eq!(yaml.lookup("cable", "vodafone"), Some("Vodafone West"));
}
