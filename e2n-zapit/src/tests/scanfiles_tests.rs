use super::*;
use e2n_core::TransponderScanEntry;
use tempfile::TempDir;

fn entries(system: &str, count: u64) -> Vec<TransponderScanEntry> {
    (0..count)
        .map(|i| {
            let mut e = TransponderScanEntry::new(system, 114_000_000 + i * 8_000_000);
            e.symbol_rate = Some(6_900_000);
            e.bandwidth_hz = Some(8_000_000);
            e
        })
        .collect()
}

fn bundle(cable: u64, terrestrial: u64) -> ScanfileBundle {
    let mut bundle = ScanfileBundle::default();
    if cable > 0 {
        bundle.cable.insert("Vodafone".into(), entries("DVB-C", cable));
    }
    if terrestrial > 0 {
        bundle.terrestrial.insert("DE-Berlin".into(), entries("DVB-T2", terrestrial));
    }
    bundle
}

#[test]
fn test_writes_cable_and_terrestrial() {
    let tmp = TempDir::new().unwrap();
    let report = write_scanfiles(&bundle(10, 3), tmp.path(), &ScanfilePolicy::default()).unwrap();
    assert!(tmp.path().join("cable.xml").exists());
    assert!(tmp.path().join("terrestrial.xml").exists());
    assert!(!tmp.path().join("satellites.xml").exists());
    assert_eq!(report.cable_counts["Vodafone"], 10);
    assert_eq!(report.terrestrial_counts["DE-Berlin"], 3);
    assert_eq!(report.output_paths.len(), 2);
    assert!(report.warnings.is_empty());
}

#[test]
fn test_empty_terrestrial_is_a_warning() {
    let tmp = TempDir::new().unwrap();
    let report = write_scanfiles(&bundle(10, 0), tmp.path(), &ScanfilePolicy::default()).unwrap();
    assert_eq!(report.warnings, vec!["no terrestrial regions available for terrestrial.xml"]);
    assert!(!tmp.path().join("terrestrial.xml").exists());
}

#[test]
fn test_strict_refuses_empty_tables() {
    let tmp = TempDir::new().unwrap();
    let policy = ScanfilePolicy {
        strict: true,
        ..Default::default()
    };
    let err = write_scanfiles(&bundle(0, 3), tmp.path(), &policy).unwrap_err();
    assert_eq!(
        err.to_string(),
        "scanfile error: strict scanfile mode: cable.xml would be empty"
    );
}

#[test]
fn test_minimum_entries() {
    let tmp = TempDir::new().unwrap();
    let report = write_scanfiles(&bundle(4, 3), tmp.path(), &ScanfilePolicy::default()).unwrap();
    assert_eq!(
        report.warnings,
        vec!["provider Vodafone has 4 cable entries, below minimum 10"]
    );

    let strict = ScanfilePolicy {
        strict: true,
        ..Default::default()
    };
    let err = write_scanfiles(&bundle(4, 3), tmp.path(), &strict).unwrap_err();
    assert!(matches!(err, WriterError::Scanfile(ref m) if m.contains("below strict minimum 10")));
}

#[test]
fn test_emission_disabled() {
    let tmp = TempDir::new().unwrap();
    let policy = ScanfilePolicy {
        emit: false,
        ..Default::default()
    };
    let report = write_scanfiles(&bundle(10, 3), tmp.path(), &policy).unwrap();
    assert!(report.output_paths.is_empty());
    assert_eq!(report.warnings, vec!["scanfile emission disabled by CLI option"]);
    assert_eq!(report.cable_counts["Vodafone"], 10);
}

#[test]
fn test_satellites_written_when_present() {
    let tmp = TempDir::new().unwrap();
    let mut bundle = bundle(10, 3);
    bundle
        .satellite
        .insert("Astra 19.2E".into(), entries("DVB-S2", 1));
    let report = write_scanfiles(&bundle, tmp.path(), &ScanfilePolicy::default()).unwrap();
    assert_eq!(report.output_paths["satellite"], tmp.path().join("satellites.xml"));
    assert_eq!(report.satellite_counts["Astra 19.2E"], 1);
}
