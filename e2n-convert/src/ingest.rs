//! File-source ingest: run adapters over already-fetched material and lay the
//! results out as native profiles plus scan JSON.
//!
//! Layout under the output directory:
//!
//! ```text
//! <source>/SOURCE_PROVENANCE.json
//! <source>/<profile>/enigma2/...
//! <source>/<profile>/BUILDINFO.json
//! <source>/<profile>/SOURCE_PROVENANCE.json
//! <source>/scan/<source>.json
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use e2n_adapters::{AdapterRegistry, SourceConfig};
use e2n_core::{Profile, TransponderScanEntry};
use e2n_formats::write_profile;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use url::Url;

use crate::dedup::DEFAULT_PRIORITY;
use crate::error::ConvertError;

/// Hosts every source config may fetch from.
pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &["github.com", "raw.githubusercontent.com"];

/// Parsed `sources.yaml`.
#[derive(Debug, Clone, Default)]
pub struct IngestConfig {
    pub sources: Vec<SourceConfig>,
    /// Lowercased; always includes [`DEFAULT_ALLOWED_HOSTS`].
    pub allow_hosts: BTreeSet<String>,
}

#[derive(Deserialize)]
struct RawConfig {
    sources: Option<Value>,
    #[serde(default)]
    allow_hosts: Vec<Value>,
}

impl IngestConfig {
    pub fn new(sources: Vec<SourceConfig>) -> Self {
        Self {
            sources,
            allow_hosts: DEFAULT_ALLOWED_HOSTS.iter().map(|h| h.to_string()).collect(),
        }
    }

    pub fn allow_host(mut self, host: &str) -> Self {
        let host = host.trim().to_lowercase();
        if !host.is_empty() {
            self.allow_hosts.insert(host);
        }
        self
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConvertError> {
        let raw: RawConfig = serde_yml::from_str(text)
            .map_err(|e| ConvertError::config(format!("invalid sources file: {e}")))?;
        let items = match raw.sources {
            Some(Value::Array(items)) => items,
            Some(_) => return Err(ConvertError::config("'sources' must be a list")),
            None => return Err(ConvertError::config("config must define a 'sources' list")),
        };
        let sources = items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(SourceConfig(map.into_iter().collect())),
                _ => None,
            })
            .collect();
        let config = raw
            .allow_hosts
            .iter()
            .filter_map(Value::as_str)
            .fold(Self::new(sources), |config, host| config.allow_host(host));
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConvertError> {
        let text = fs::read_to_string(path)
            .map_err(|e| ConvertError::config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_yaml(&text)
    }
}

/// One profile written by [`ingest`].
#[derive(Debug, Clone, PartialEq)]
pub struct IngestResult {
    pub source_id: String,
    pub profile_id: String,
    /// Directory holding `enigma2/`, `BUILDINFO.json` and `SOURCE_PROVENANCE.json`.
    pub output_path: PathBuf,
    /// The BUILDINFO document.
    pub metadata: Value,
}

/// Load `config_path` and ingest every source (or the `only` subset) into `out`.
pub fn ingest_file(
    config_path: &Path,
    out: &Path,
    only: &[String],
) -> Result<Vec<IngestResult>, ConvertError> {
    ingest(&IngestConfig::load(config_path)?, out, only)
}

pub fn ingest(
    config: &IngestConfig,
    out: &Path,
    only: &[String],
) -> Result<Vec<IngestResult>, ConvertError> {
    fs::create_dir_all(out)?;
    let requested: BTreeSet<&str> =
        only.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).collect();
    let registry = AdapterRegistry::with_builtins();

    let mut results = Vec::new();
    for source in &config.sources {
        let source_id = source
            .str("id")
            .ok_or_else(|| ConvertError::config("source entry missing 'id'"))?;
        if !requested.is_empty() && !requested.contains(source_id.as_str()) {
            log::info!("skipping source {source_id} (filtered)");
            continue;
        }
        match ingest_source(&registry, source, &source_id, config, out) {
            Ok(mut written) => results.append(&mut written),
            Err(e) => {
                log::error!("failed to ingest source {source_id}: {e}");
                return Err(e);
            }
        }
    }
    Ok(results)
}

/// Refuse mock sources and remote URLs outside the allow-list.
pub fn ensure_source_allowed(
    source: &SourceConfig,
    allow_hosts: &BTreeSet<String>,
) -> Result<(), ConvertError> {
    let id = source.str_or("id", "?");
    if source.flag("is_mock") || source.flag("mock") {
        return Err(ConvertError::fetch(format!("source {id} flagged as mock; refusing to ingest")));
    }
    let kind = source.str_or("type", "file").to_lowercase();
    match kind.as_str() {
        "file" => Ok(()),
        "git" | "http" => {
            let host = source
                .str("url")
                .and_then(|u| Url::parse(&u).ok())
                .and_then(|u| u.host_str().map(str::to_lowercase))
                .unwrap_or_default();
            if allow_hosts.contains(&host) {
                Ok(())
            } else {
                Err(ConvertError::fetch(format!("source {id} host {host} not in allowlist")))
            }
        }
        other => Err(ConvertError::config(format!("unsupported source type {other}"))),
    }
}

fn ingest_source(
    registry: &AdapterRegistry,
    source: &SourceConfig,
    source_id: &str,
    config: &IngestConfig,
    out: &Path,
) -> Result<Vec<IngestResult>, ConvertError> {
    ensure_source_allowed(source, &config.allow_hosts)?;
    let material = source_material(source, source_id)?;
    let mut provenance = provenance_record(source, source_id, &material);

    let adapter_name = source.str_or("adapter", "enigma2");
    let adapter = registry.get(&adapter_name)?;
    log::info!("ingesting {source_id} with adapter {adapter_name} from {}", material.display());
    let bundle = adapter.ingest_bundle(&material, source)?;
    if bundle.profiles.is_empty() && bundle.scan_entries.is_empty() {
        log::warn!("adapter {adapter_name} returned no profiles for {source_id}");
    }
    if !bundle.extra_metadata.is_empty() {
        provenance.insert("adapter_metadata".into(), json!(bundle.extra_metadata));
    }

    let source_root = out.join(source_id);
    let priority = source.int("priority").unwrap_or(DEFAULT_PRIORITY);
    let fetched_at = provenance
        .get("fetched_at")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let provenance_json = Value::Object(provenance.clone()).to_string();

    let mut results = Vec::new();
    for mut profile in bundle.profiles {
        let profile_id = profile
            .meta("profile_id")
            .map(str::to_string)
            .unwrap_or_else(|| adapter.default_profile_id(&material));
        profile.set_meta("source_id", source_id);
        profile.set_meta("profile_id", profile_id.as_str());
        profile.set_meta("source_priority", priority.to_string());
        profile.set_meta("source_provenance", provenance_json.as_str());
        profile.metadata.entry("fetched_at".into()).or_insert_with(|| fetched_at.clone());

        let profile_root = source_root.join(&profile_id);
        write_profile(&profile, &profile_root.join("enigma2"))?;
        let buildinfo = buildinfo(
            source_id,
            &profile_id,
            adapter.name(),
            &material,
            &profile,
            &provenance,
        );
        write_json(&profile_root.join("BUILDINFO.json"), &buildinfo)?;
        write_json(
            &profile_root.join("SOURCE_PROVENANCE.json"),
            &Value::Object(provenance.clone()),
        )?;
        log::info!(
            "wrote {source_id}/{profile_id}: {} services, {} bouquets",
            profile.services.len(),
            profile.bouquets.len()
        );
        results.push(IngestResult {
            source_id: source_id.to_string(),
            profile_id,
            output_path: profile_root,
            metadata: buildinfo,
        });
    }

    if !bundle.scan_entries.is_empty() {
        let path = write_scan_entries(&source_root, source_id, bundle.scan_entries, &fetched_at)?;
        provenance.insert("scan_file".into(), json!(path.display().to_string()));
    }

    let profiles: Vec<&str> = results.iter().map(|r| r.profile_id.as_str()).collect();
    provenance.insert("profiles".into(), json!(profiles));
    write_json(&source_root.join("SOURCE_PROVENANCE.json"), &Value::Object(provenance))?;
    Ok(results)
}

/// The local directory or file the adapter reads. Fetching is external, so
/// remote sources must name where their checkout lives too.
fn source_material(source: &SourceConfig, source_id: &str) -> Result<PathBuf, ConvertError> {
    let path = source
        .str("path")
        .map(PathBuf::from)
        .ok_or_else(|| ConvertError::fetch(format!("source {source_id} has no local 'path'")))?;
    if !path.exists() {
        return Err(ConvertError::fetch(format!(
            "source {source_id} path {} missing",
            path.display()
        )));
    }
    Ok(path)
}

fn provenance_record(
    source: &SourceConfig,
    source_id: &str,
    material: &Path,
) -> Map<String, Value> {
    let mut record = Map::new();
    record.insert("source_id".into(), json!(source_id));
    record.insert("type".into(), json!(source.str_or("type", "file").to_lowercase()));
    let path = fs::canonicalize(material).unwrap_or_else(|_| material.to_path_buf());
    record.insert("path".into(), json!(path.display().to_string()));
    for key in ["url", "ref", "commit", "commit_date"] {
        if let Some(value) = source.str(key) {
            record.insert(key.into(), json!(value));
        }
    }
    record.insert("fetched_at".into(), json!(iso_now()));
    if let Some(mtime) = fs::metadata(material).and_then(|m| m.modified()).ok() {
        let mtime: DateTime<Utc> = mtime.into();
        record.insert(
            "source_mtime".into(),
            json!(mtime.to_rfc3339_opts(SecondsFormat::Secs, false)),
        );
    }
    record
}

fn buildinfo(
    source_id: &str,
    profile_id: &str,
    adapter: &str,
    material: &Path,
    profile: &Profile,
    provenance: &Map<String, Value>,
) -> Value {
    let mut info: Map<String, Value> = profile
        .metadata
        .iter()
        .map(|(key, value)| (key.clone(), json!(value)))
        .collect();
    let fetched_at = match profile.meta("fetched_at") {
        Some(stamp) => json!(stamp),
        None => provenance.get("fetched_at").cloned().unwrap_or(Value::Null),
    };
    info.insert("source_id".into(), json!(source_id));
    info.insert("profile_id".into(), json!(profile_id));
    info.insert("adapter".into(), json!(adapter));
    info.insert("origin".into(), json!(material.display().to_string()));
    info.insert("fetched_at".into(), fetched_at);
    info.insert("service_count".into(), json!(profile.services.len()));
    info.insert("transponder_count".into(), json!(profile.transponders.len()));
    info.insert("bouquet_count".into(), json!(profile.bouquets.len()));
    info.insert("provenance".into(), Value::Object(provenance.clone()));
    Value::Object(info)
}

fn write_scan_entries(
    source_root: &Path,
    source_id: &str,
    mut entries: Vec<TransponderScanEntry>,
    fetched_at: &str,
) -> Result<PathBuf, ConvertError> {
    for entry in &mut entries {
        if entry.source_provenance.is_empty() {
            entry.source_provenance = source_id.to_string();
        }
        if entry.last_seen.is_empty() {
            entry.last_seen = fetched_at.to_string();
        }
    }
    let count = entries.len();
    let path = source_root.join("scan").join(format!("{source_id}.json"));
    write_json(&path, &json!({"source_id": source_id, "entries": entries}))?;
    log::info!("wrote {count} scan entries to {}", path.display());
    Ok(path)
}

/// Pretty JSON via a temp file and rename.
fn write_json(path: &Path, value: &Value) -> Result<(), ConvertError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_string_pretty(value)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}
