use super::*;
use std::fs;

use e2n_core::{Service, Transponder};
use tempfile::TempDir;

const SERVICES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<zapit api="4">
  <satellites>
    <satellite key="S19.2E" name="Astra-19.2E" namespace="0x00c00000" position="192">
      <transponder key="00c00000:0421:0001" frequency="11493750">
        <service id="0x6dca" name="Das Erste HD" type="25"/>
        <service id="0x2b7a" name="ZDF HD" type="25"/>
      </transponder>
    </satellite>
  </satellites>
</zapit>
"#;

const BOUQUETS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<zapit>
  <bouquet name="Favourites" category="tv">
    <channel service_ref="1:0:25:6dca:0421:0001:00c00000:0:0:0:" name="Das Erste HD"/>
  </bouquet>
</zapit>
"#;

fn write_root(dir: &Path, services: &str, bouquets: &str) {
    fs::write(dir.join("services.xml"), services).unwrap();
    fs::write(dir.join("bouquets.xml"), bouquets).unwrap();
}

#[test]
fn test_profile_warnings() {
    let report = validate_profile(&Profile::new());
    assert_eq!(
        report.warnings,
        vec!["profile contains no services", "profile contains no transponders"]
    );

    let t = Transponder::with_ids(Delivery::Cable, 346_000, 0xffff_0000, 1, 0x3d);
    let mut profile = Profile::new();
    profile.add_service(Service::new(&t, 1, 1, "Orphan"));
    profile.add_service(Service::new(&t, 2, 2, "Radio"));
    let report = validate_profile(&profile);
    assert!(report.warnings.contains(&format!(
        "service Orphan references unknown transponder {}",
        t.key
    )));
    assert_eq!(report.stats.total_services, 2);
    assert_eq!(report.stats.radio_services, 1);
    assert_eq!(report.stats.cable_services, 0);

    profile.add_transponder(t);
    assert_eq!(ProfileStats::of(&profile).cable_services, 2);
}

#[test]
fn test_minimums_only_for_active_deliveries() {
    let stats = ProfileStats {
        total_services: 12,
        sat_services: 10,
        cable_services: 2,
        ..Default::default()
    };
    let thresholds = Thresholds {
        sat: 50,
        cable: 20,
        terrestrial: 20,
    };
    let active: BTreeSet<Delivery> = [Delivery::Sat, Delivery::Cable].into();
    let err = assert_minimums(&stats, &thresholds, &active).unwrap_err();
    assert_eq!(
        err.to_string(),
        "sat services 10 below minimum 50; cable services 2 below minimum 20"
    );

    let relaxed = Thresholds {
        sat: 0,
        cable: 2,
        terrestrial: 20,
    };
    assert!(assert_minimums(&stats, &relaxed, &active).is_ok());
}

#[test]
fn test_remaining_duplicates_are_fatal() {
    assert!(assert_no_dupes(&[]).is_ok());
    let dup = DuplicateRecord {
        identity: "abc".into(),
        first: "A".into(),
        second: "B".into(),
    };
    let err = assert_no_dupes(&[dup]).unwrap_err();
    assert_eq!(err.to_string(), "duplicate service identities remain: abc");
}

#[test]
fn test_output_schema_checks_counts_and_refs() {
    let tmp = TempDir::new().unwrap();
    write_root(tmp.path(), SERVICES_XML, BOUQUETS_XML);
    assert!(assert_output_schema(tmp.path(), 2).is_ok());

    let err = assert_output_schema(tmp.path(), 3).unwrap_err();
    assert!(matches!(
        err,
        ConvertError::Schema(ref m) if m == "services.xml contains 2 services, expected 3"
    ));

    write_root(
        tmp.path(),
        SERVICES_XML,
        "<zapit><bouquet name=\"x\"><channel name=\"y\"/></bouquet></zapit>",
    );
    let err = assert_output_schema(tmp.path(), 2).unwrap_err();
    assert!(err.to_string().contains("channel without service_ref"));

    write_root(tmp.path(), SERVICES_XML, "<zapit/>");
    let err = assert_output_schema(tmp.path(), 2).unwrap_err();
    assert!(err.to_string().contains("no <bouquet> entries"));

    fs::remove_file(tmp.path().join("services.xml")).unwrap();
    assert!(matches!(assert_output_schema(tmp.path(), 2), Err(ConvertError::Schema(_))));
}

#[test]
fn test_scanfile_schema() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("cable.xml"),
        r#"<cable><provider name="Vodafone"><transponder frequency="114000" symbol_rate="6900000" modulation="5" fec_inner="0" system="0"/></provider></cable>"#,
    )
    .unwrap();
    fs::write(
        tmp.path().join("terrestrial.xml"),
        r#"<terrestrial><region name="DE-Berlin"><transponder frequency="474000" bandwidth="0" constellation="5" code_rate_hp="2" transmission_mode="1" guard_interval="0" hierarchy="0" system="1" plp_id="0"/></region></terrestrial>"#,
    )
    .unwrap();
    assert!(validate_scanfiles(tmp.path()).is_ok());

    fs::write(
        tmp.path().join("terrestrial.xml"),
        r#"<terrestrial><region name="DE-Berlin"><transponder frequency="474000" bandwidth="9" constellation="5" code_rate_hp="2" transmission_mode="1" guard_interval="0" hierarchy="0" system="1"/></region></terrestrial>"#,
    )
    .unwrap();
    let err = validate_scanfiles(tmp.path()).unwrap_err();
    assert!(
        err.to_string()
            .starts_with("schema validation failed: terrestrial.xml failed schema validation")
    );
    assert!(err.to_string().contains("bandwidth 9 exceeds 3"));

    fs::write(
        tmp.path().join("terrestrial.xml"),
        r#"<terrestrial><region name="DE-Berlin"><transponder frequency="474000" bandwidth="0" constellation="5" code_rate_hp="2" transmission_mode="1" guard_interval="0" hierarchy="0" system="1" plp_id="-1"/></region></terrestrial>"#,
    )
    .unwrap();
    assert!(validate_scanfiles(tmp.path()).unwrap_err().to_string().contains("plp_id"));

    fs::write(
        tmp.path().join("terrestrial.xml"),
        r#"<terrestrial><region name=""/></terrestrial>"#,
    )
    .unwrap();
    assert!(validate_scanfiles(tmp.path()).unwrap_err().to_string().contains("has no name"));

    fs::write(
        tmp.path().join("cable.xml"),
        r#"<cable><provider name="Vodafone"><transponder frequency="0" modulation="5" fec_inner="0" system="0"/></provider></cable>"#,
    )
    .unwrap();
    assert!(validate_scanfiles(tmp.path()).unwrap_err().to_string().contains("positive"));
}
