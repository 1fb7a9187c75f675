use std::fs;
use std::path::Path;

use e2n_adapters::SourceConfig;
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
end
";

fn raw_profile(root: &Path, name: &str) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("lamedb"), LAMEDB).unwrap();
}

fn file_source(id: &str, path: &Path) -> SourceConfig {
    SourceConfig::new()
        .with("id", id)
        .with("type", "file")
        .with("path", path.display().to_string())
        .with("priority", 10)
}

#[test]
fn ingests_file_source_into_layout() {
    let tmp = TempDir::new().unwrap();
    let raw = tmp.path().join("raw");
    raw_profile(&raw, "astra");
    raw_profile(&raw, "hotbird");
    let out = tmp.path().join("build");

    let config = IngestConfig::new(vec![file_source("local", &raw)]);
    let results = ingest(&config, &out, &[]).unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.profile_id.as_str()).collect();
    assert_eq!(ids, vec!["astra", "hotbird"]);

    let astra = &results[0];
    assert_eq!(astra.output_path, out.join("local").join("astra"));
    assert!(astra.output_path.join("enigma2").join("lamedb").is_file());
    assert!(astra.output_path.join("SOURCE_PROVENANCE.json").is_file());
    assert_eq!(astra.metadata["adapter"], "enigma2");
    assert_eq!(astra.metadata["service_count"], 1);
    assert_eq!(astra.metadata["source_priority"], "10");
    assert_eq!(astra.metadata["provenance"]["type"], "file");

    let buildinfo = fs::read_to_string(astra.output_path.join("BUILDINFO.json")).unwrap();
    let buildinfo: serde_json::Value = serde_json::from_str(&buildinfo).unwrap();
    assert_eq!(buildinfo["source_id"], "local");
    assert_eq!(buildinfo["service_count"], 1);
    assert_eq!(buildinfo["transponder_count"], 1);
    assert_eq!(buildinfo["fetched_at"], astra.metadata["fetched_at"]);
    assert!(buildinfo["fetched_at"].as_str().is_some_and(|s| !s.is_empty()));

    let source_record =
        fs::read_to_string(out.join("local").join("SOURCE_PROVENANCE.json")).unwrap();
    let source_record: serde_json::Value = serde_json::from_str(&source_record).unwrap();
    assert_eq!(source_record["profiles"], serde_json::json!(["astra", "hotbird"]));
}

#[test]
fn ingested_profile_converts_with_source_metadata() {
    let tmp = TempDir::new().unwrap();
    let raw = tmp.path().join("raw");
    raw_profile(&raw, "astra");
    let out = tmp.path().join("build");
    ingest(&IngestConfig::new(vec![file_source("local", &raw)]), &out, &[]).unwrap();

    let input = out.join("local").join("astra").join("enigma2");
    let result =
        convert(&input, &tmp.path().join("neutrino"), &ConversionOptions::default()).unwrap();
    assert_eq!(result.profile.meta("source_id"), Some("local"));
    assert_eq!(result.profile.meta("profile_id"), Some("astra"));
    assert_eq!(result.profile.meta("stale"), Some("false"));
}

#[test]
fn only_filter_and_yaml_config() {
    let tmp = TempDir::new().unwrap();
    let raw = tmp.path().join("raw");
    raw_profile(&raw, "astra");
    let yaml = format!(
        "sources:\n  - id: first\n    path: {0}\n  - id: second\n    path: {0}\n",
        raw.display()
    );
    let config_path = tmp.path().join("sources.yaml");
    fs::write(&config_path, yaml).unwrap();

    let out = tmp.path().join("build");
    let results = ingest_file(&config_path, &out, &["second".to_string()]).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source_id, "second");
    assert!(!out.join("first").exists());
}

#[test]
fn policy_refusals_are_fetch_errors() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("build");

    let mock = file_source("mocked", tmp.path()).with("is_mock", true);
    let err = ingest(&IngestConfig::new(vec![mock]), &out, &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Fetch);
    assert!(err.to_string().contains("flagged as mock"));

    let remote = SourceConfig::new()
        .with("id", "remote")
        .with("type", "http")
        .with("url", "https://downloads.example.net/lamedb.zip")
        .with("path", tmp.path().display().to_string());
    let err = ingest(&IngestConfig::new(vec![remote.clone()]), &out, &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Fetch);
    assert!(err.to_string().contains("not in allowlist"));

    let config = IngestConfig::new(vec![remote]).allow_host("Downloads.Example.NET");
    assert!(ingest(&config, &out, &[]).is_ok());

    let missing = file_source("gone", &tmp.path().join("missing"));
    let err = ingest(&IngestConfig::new(vec![missing]), &out, &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Fetch);
}

#[test]
fn unknown_adapter_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let source = file_source("odd", tmp.path()).with("adapter", "teletext");
    let err = ingest(&IngestConfig::new(vec![source]), &tmp.path().join("build"), &[]).unwrap_err();
    assert_eq!(err.to_string(), "adapter teletext not registered");
    assert_eq!(err.kind(), ErrorKind::Parse);
}
