use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use e2n_convert::*;
use tempfile::TempDir;

const LAMEDB: &str = "eDVB services /4/
transponders
00c00000:0421:0001
\ts 11493750:22000000:0:4:192:2:0
/
end
services
6dca:00c00000:0421:0001:1:0
Das Erste HD
p:ARD
/
283d:00c00000:0421:0001:1:0
ZDF HD
p:ZDF
/
end
";

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

/// `root/<source>/<profile>/enigma2` with one satellite transponder, two TV
/// services and a favourites bouquet.
fn profile_dir(root: &Path) -> PathBuf {
    let dir = root.join("local").join("astra").join("enigma2");
    fs::create_dir_all(&dir).unwrap();
    write(&dir, "lamedb", LAMEDB);
    write(
        &dir,
        "bouquets.tv",
        "#NAME User - Bouquets (TV)\n\
         #SERVICE 1:7:1:0:0:0:0:0:0:0:FROM BOUQUET \"userbouquet.favourites.tv\" ORDER BY bouquet\n",
    );
    write(
        &dir,
        "userbouquet.favourites.tv",
        "#NAME Favourites\n\
         #SERVICE 1:0:1:6dca:0421:0001:00c00000:0:0:0:\n\
         #SERVICE 1:0:1:283d:0421:0001:00c00000:0:0:0:\n",
    );
    dir
}

fn stamp_fetched_at(input: &Path, days_ago: i64) {
    let fetched = (Utc::now() - Duration::days(days_ago)).to_rfc3339();
    let info = serde_json::json!({"source_id": "local", "fetched_at": fetched});
    fs::write(input.parent().unwrap().join("BUILDINFO.json"), info.to_string()).unwrap();
}

#[test]
fn converts_minimal_profile() {
    let tmp = TempDir::new().unwrap();
    let input = profile_dir(tmp.path());
    let output = tmp.path().join("out");

    let result = convert(&input, &output, &ConversionOptions::default()).unwrap();
    assert_eq!(result.output_path, output);
    assert_eq!(result.profile.meta("profile_id"), Some("enigma2"));

    let services = fs::read_to_string(output.join("services.xml")).unwrap();
    assert_eq!(services.matches("<service ").count(), 2);
    let bouquets = fs::read_to_string(output.join("bouquets.xml")).unwrap();
    assert!(bouquets.contains("<bouquet "));
    assert!(bouquets.contains("Favourites"));

    let qa = fs::read_to_string(output.join("qa_report.md")).unwrap();
    assert!(qa.contains("QA Report"));
    assert!(output.join("qa_report.json").is_file());
    assert!(output.join("BUILDINFO.json").is_file());
    assert_eq!(result.profile.meta("stale"), Some("unknown"));
}

#[test]
fn stale_source_aborts_unless_included() {
    let tmp = TempDir::new().unwrap();
    let input = profile_dir(tmp.path());
    stamp_fetched_at(&input, 200);

    let options = ConversionOptions {
        stale_after_days: 120,
        ..ConversionOptions::default()
    };
    let err = convert(&input, &tmp.path().join("out"), &options).unwrap_err();
    assert!(matches!(err, ConvertError::Stale(_)));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let options = ConversionOptions {
        include_stale: true,
        ..options
    };
    let result = convert(&input, &tmp.path().join("out"), &options).unwrap();
    assert_eq!(result.profile.meta("stale"), Some("true"));
    assert_eq!(result.profile.meta("source_id"), Some("local"));
}

#[test]
fn fresh_source_is_marked_fresh() {
    let tmp = TempDir::new().unwrap();
    let input = profile_dir(tmp.path());
    stamp_fetched_at(&input, 3);

    let result = convert(&input, &tmp.path().join("out"), &ConversionOptions::default()).unwrap();
    assert_eq!(result.profile.meta("stale"), Some("false"));
}

#[test]
fn strict_mode_escalates_warnings() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("empty");
    fs::create_dir_all(&input).unwrap();
    write(&input, "lamedb", "eDVB services /4/\ntransponders\nend\nservices\nend\n");

    let options = ConversionOptions {
        strict: true,
        ..ConversionOptions::default()
    };
    let err = convert(&input, &tmp.path().join("out"), &options).unwrap_err();
    assert_eq!(err.to_string(), STRICT_MESSAGE);
}

#[test]
fn minimums_apply_when_requested() {
    let tmp = TempDir::new().unwrap();
    let input = profile_dir(tmp.path());

    let options = ConversionOptions {
        abort_on_empty: true,
        ..ConversionOptions::default()
    };
    let err = convert(&input, &tmp.path().join("out"), &options).unwrap_err();
    assert_eq!(err.to_string(), "sat services 2 below minimum 50");

    let options = ConversionOptions {
        min_services_sat: 2,
        ..options
    };
    assert!(convert(&input, &tmp.path().join("out"), &options).is_ok());
}

#[test]
fn scan_entries_are_deduplicated_into_scanfiles() {
    let tmp = TempDir::new().unwrap();
    let input = profile_dir(tmp.path());
    let scan = tmp.path().join("local").join("scan");
    fs::create_dir_all(&scan).unwrap();
    write(
        &scan,
        "cable.json",
        r#"{"entries": [
            {"delivery_system": "DVB-C", "frequency": 114, "symbol_rate": 6900000,
             "modulation": "QAM256", "provider": "Vodafone", "last_seen": "2025-01-01"},
            {"delivery_system": "DVB-C", "frequency_khz": 114000, "symbol_rate": 6900000,
             "modulation": "QAM256", "provider": "Vodafone", "last_seen": "2024-12-01"},
            {"delivery_system": "DVB-C", "frequency_mhz": 122, "symbol_rate": 6900000,
             "modulation": "QAM256", "provider": "Vodafone"},
            {"delivery_system": "DVB-C"}
        ]}"#,
    );

    let result = convert(&input, &tmp.path().join("out"), &ConversionOptions::default()).unwrap();
    let report = result.scanfiles.expect("scanfile report");
    assert_eq!(report.cable_counts["Vodafone"], 2);

    let cable = fs::read_to_string(tmp.path().join("out").join("cable.xml")).unwrap();
    assert!(cable.contains("<provider name=\"Vodafone\""));
    assert_eq!(cable.matches("<transponder ").count(), 2);

    let meta: serde_json::Value =
        serde_json::from_str(result.profile.meta("scanfiles").unwrap()).unwrap();
    assert_eq!(meta["deduplicated"].as_array().unwrap().len(), 1);
    assert_eq!(meta["deduplicated"][0]["reason"], "older-last-seen");
    assert!(result.warnings.iter().any(|w| w.contains("missing frequency")));
    assert!(result.warnings.iter().any(|w| w.contains("no terrestrial regions")));
}

#[test]
fn strict_scanfiles_fail_on_missing_tables() {
    let tmp = TempDir::new().unwrap();
    let input = profile_dir(tmp.path());
    let options = ConversionOptions {
        strict_scanfiles: true,
        ..ConversionOptions::default()
    };
    let err = convert(&input, &tmp.path().join("out"), &options).unwrap_err();
    assert!(matches!(err, ConvertError::Scanfile(_)));

    let options = ConversionOptions {
        emit_scanfiles: false,
        ..options
    };
    let result = convert(&input, &tmp.path().join("out2"), &options).unwrap();
    assert!(result.scanfiles.is_none());
    assert_eq!(result.profile.meta("scanfiles"), Some(r#"{"enabled":false}"#));
}

#[test]
fn missing_input_is_a_parse_error() {
    let tmp = TempDir::new().unwrap();
    let err = convert(
        &tmp.path().join("nope"),
        &tmp.path().join("out"),
        &ConversionOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}
