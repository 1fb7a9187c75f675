use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use e2n_core::{Profile, TransponderScanEntry};
use serde_json::{Map, Value};

use crate::error::AdapterError;
use crate::util::{date_iso, glob_files, now_iso, read_lossy};
use crate::{Adapter, AdapterBundle, SourceConfig};

/// wilhelm.tel DVB-C channel list, pre-parsed into JSON datasets.
pub struct WilhelmTelDeAdapter;

const PREVIEW_CHANNELS: usize = 10;

struct DatasetContext<'a> {
    provider: &'a str,
    country: &'a str,
    region: &'a str,
    provenance: &'a str,
    last_seen: &'a str,
}

/// `dd.mm.yyyy` or `yyyy-mm-dd` as midnight UTC.
fn parse_stand(value: &str) -> Option<String> {
    let value = value.trim();
    ["%d.%m.%Y", "%Y-%m-%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .map(date_iso)
}

/// Any ISO timestamp converted to UTC; naive values are taken as UTC.
fn normalise_timestamp(value: Option<&str>) -> String {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return now_iso();
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Secs, false);
    }
    let naive = value.strip_suffix('Z').unwrap_or(value);
    if let Ok(dt) = NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.and_utc().to_rfc3339_opts(SecondsFormat::Secs, false);
    }
    if let Ok(date) = NaiveDate::parse_from_str(naive, "%Y-%m-%d") {
        return date_iso(date);
    }
    now_iso()
}

fn int_value(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn build_entry(tp: &Map<String, Value>, ctx: &DatasetContext) -> Option<TransponderScanEntry> {
    let Some(frequency) = int_value(tp.get("frequency_hz")) else {
        log::warn!("skipping transponder without valid frequency: {}", Value::Object(tp.clone()));
        return None;
    };

    let mut entry = TransponderScanEntry::new("DVB-C", frequency);
    entry.system = Some("DVB-C".into());
    entry.symbol_rate = int_value(tp.get("symbol_rate"));
    entry.modulation = tp
        .get("modulation")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string);
    entry.country = Some(ctx.country.to_string());
    entry.provider = Some(ctx.provider.to_string());
    entry.region = Some(ctx.region.to_string());
    entry.last_seen = ctx.last_seen.to_string();
    entry.source_provenance = ctx.provenance.to_string();

    let channels: Vec<&Map<String, Value>> = tp
        .get("channels")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default();
    entry.extras.insert("channel_count".into(), channels.len().to_string());

    let bouquets: BTreeSet<&str> = tp
        .get("bouquets")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_str).filter(|b| !b.is_empty()).collect())
        .unwrap_or_default();
    if !bouquets.is_empty() {
        entry
            .extras
            .insert("bouquets".into(), bouquets.into_iter().collect::<Vec<_>>().join(","));
    }

    let preview: Vec<String> = channels
        .iter()
        .take(PREVIEW_CHANNELS)
        .filter_map(|ch| {
            let name = ch.get("name").and_then(Value::as_str).filter(|n| !n.is_empty())?;
            let lcn = match ch.get("lcn") {
                None | Some(Value::Null) => "?".to_string(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            };
            Some(format!("{lcn}:{name}"))
        })
        .collect();
    if !preview.is_empty() {
        entry.extras.insert("channel_preview".into(), preview.join(";"));
    }
    Some(entry)
}

impl Adapter for WilhelmTelDeAdapter {
    fn name(&self) -> &'static str {
        "provider_wilhelm_tel_de"
    }

    fn description(&self) -> &'static str {
        "wilhelm.tel DVB-C channel list (JSON, scan entries only)"
    }

    fn scan_only(&self) -> bool {
        true
    }

    fn ingest(&self, _source: &Path, _config: &SourceConfig) -> Result<Vec<Profile>, AdapterError> {
        log::info!(
            "provider_wilhelm_tel_de emits scan entries only; no Enigma2 profile is produced"
        );
        Ok(Vec::new())
    }

    fn ingest_bundle(
        &self,
        source: &Path,
        config: &SourceConfig,
    ) -> Result<AdapterBundle, AdapterError> {
        if !source.exists() {
            return Err(AdapterError::not_found(format!(
                "wilhelm.tel payload directory {} missing",
                source.display()
            )));
        }
        let datasets = glob_files(source, "*.json")?;
        if datasets.is_empty() {
            return Err(AdapterError::not_found(format!(
                "no JSON datasets found in {}",
                source.display()
            )));
        }

        let country = config.str_or("country", "DE");
        let region = config.str_or("region", "de-hamburg");
        let provider = config.str_or("provider_name", "wilhelm-tel");

        let mut entries = Vec::new();
        let mut sources = Vec::new();
        for path in datasets {
            let Value::Object(payload) = serde_json::from_str::<Value>(&read_lossy(&path)?)? else {
                return Err(AdapterError::parse(format!(
                    "dataset {} must contain a JSON object",
                    path.display()
                )));
            };
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let transponders = match payload.get("transponders") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(list)) => list.iter().filter_map(Value::as_object).collect(),
                Some(_) => {
                    log::warn!("dataset {} has no transponder list", path.display());
                    continue;
                }
            };

            let stand = payload.get("stand").and_then(Value::as_str).and_then(parse_stand);
            let retrieved = payload.get("retrieved_at").and_then(Value::as_str);
            let last_seen = normalise_timestamp(stand.as_deref().or(retrieved));
            let ctx = DatasetContext {
                provider: &provider,
                country: &country,
                region: &region,
                provenance: &name,
                last_seen: &last_seen,
            };
            entries.extend(transponders.into_iter().filter_map(|tp| build_entry(tp, &ctx)));
            sources.push(Value::from(name));
        }

        let extra_metadata = BTreeMap::from([
            ("entry_count".to_string(), Value::from(entries.len().to_string())),
            ("sources".to_string(), Value::Array(sources)),
            ("provider".to_string(), Value::from(provider)),
        ]);
        Ok(AdapterBundle {
            profiles: Vec::new(),
            scan_entries: entries,
            extra_metadata,
        })
    }
}
