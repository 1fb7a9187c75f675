//! Loading of transponder scan entries from JSON files.
//!
//! Entries live in `scan/` or `scanfiles/` directories next to the input
//! directory or any of its ancestors. A file holds either a bare list or an
//! object with an `entries`, `transponders` or `data` list.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use e2n_core::{Extra, TransponderScanEntry};
use serde_json::{Map, Value};
use walkdir::WalkDir;

const SCAN_DIRS: &[&str] = &["scan", "scanfiles"];

const KNOWN_KEYS: &[&str] = &[
    "delivery_system",
    "delivery",
    "system",
    "frequency_hz",
    "frequencyHz",
    "frequency",
    "frequency_khz",
    "frequencyKHz",
    "frequency_mhz",
    "frequencyMHz",
    "symbol_rate",
    "bandwidth",
    "bandwidth_hz",
    "bandwidthHz",
    "modulation",
    "fec",
    "fec_inner",
    "polarization",
    "plp_id",
    "country",
    "provider",
    "region",
    "last_seen",
    "source_provenance",
    "provenance",
    "extras",
];

/// Scan entries found for an input directory, plus per-item warnings.
#[derive(Debug, Clone, Default)]
pub struct ScanLoad {
    pub entries: Vec<TransponderScanEntry>,
    pub files: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// Every `*.json` under the scan directories of `input` and its ancestors.
pub fn scan_json_files(input: &Path) -> Vec<PathBuf> {
    let mut seen = BTreeSet::new();
    let mut files = Vec::new();
    for ancestor in input.ancestors() {
        for name in SCAN_DIRS {
            let dir = ancestor.join(name);
            if !dir.is_dir() {
                continue;
            }
            let walker = WalkDir::new(&dir)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name();
            for entry in walker.into_iter().filter_map(Result::ok) {
                let path = entry.path();
                let is_json = path.extension().is_some_and(|e| e == "json");
                if is_json && entry.file_type().is_file() {
                    let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
                    if seen.insert(canonical) {
                        files.push(path.to_path_buf());
                    }
                }
            }
        }
    }
    files
}

/// Load every scan entry reachable from `input`.
pub fn load_scan_entries(input: &Path) -> ScanLoad {
    let mut load = ScanLoad::default();
    for path in scan_json_files(input) {
        match fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str::<Value>(&text).map_err(|e| e.to_string()))
        {
            Ok(payload) => {
                let origin = path.display().to_string();
                let (entries, warnings) = parse_scan_payload(&payload, &origin);
                load.entries.extend(entries);
                load.warnings.extend(warnings);
            }
            Err(e) => {
                log::error!("failed to parse scan JSON {}: {}", path.display(), e);
                load.warnings.push(format!("failed to parse scan JSON {}: {e}", path.display()));
            }
        }
        load.files.push(path);
    }
    if !load.entries.is_empty() {
        log::info!("loaded {} scan entries from {} files", load.entries.len(), load.files.len());
    }
    load
}

/// Coerce one decoded scan file; `origin` names it in warnings.
pub fn parse_scan_payload(
    payload: &Value,
    origin: &str,
) -> (Vec<TransponderScanEntry>, Vec<String>) {
    let items: &[Value] = match payload {
        Value::Array(items) => items,
        Value::Object(map) => ["entries", "transponders", "data"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        _ => {
            let warning = format!("scanfile json {origin} has unsupported structure");
            log::warn!("{warning}");
            return (Vec::new(), vec![warning]);
        }
    };

    let mut entries = Vec::new();
    let mut warnings = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let Some(map) = item.as_object() else {
            warnings.push(format!("scan entry #{index} in {origin} is not a mapping"));
            continue;
        };
        match coerce_entry(map) {
            Some(entry) => entries.push(entry),
            None => warnings.push(format!("scan entry #{index} in {origin} missing frequency")),
        }
    }
    for warning in &warnings {
        log::warn!("{warning}");
    }
    (entries, warnings)
}

fn coerce_entry(item: &Map<String, Value>) -> Option<TransponderScanEntry> {
    let frequency = frequency_hz(item).filter(|f| *f > 0)?;
    let delivery =
        first_text(item, &["delivery_system", "delivery"]).unwrap_or_else(|| "UNKNOWN".into());

    let mut entry = TransponderScanEntry::new(delivery, frequency as u64);
    entry.system = first_text(item, &["system"]);
    entry.symbol_rate = item
        .get("symbol_rate")
        .and_then(as_int)
        .and_then(|v| u64::try_from(v).ok());
    entry.bandwidth_hz = bandwidth_hz(item);
    entry.modulation = first_text(item, &["modulation"]);
    entry.fec = first_text(item, &["fec", "fec_inner"]);
    entry.polarization = first_text(item, &["polarization"]);
    entry.plp_id = item.get("plp_id").and_then(as_int);
    entry.country = first_text(item, &["country"]);
    entry.provider = first_text(item, &["provider"]);
    entry.region = first_text(item, &["region"]);
    entry.last_seen = first_text(item, &["last_seen"]).unwrap_or_default();
    entry.source_provenance =
        first_text(item, &["source_provenance", "provenance"]).unwrap_or_default();
    entry.extras = extras(item);
    Some(entry)
}

fn extras(item: &Map<String, Value>) -> Extra {
    let mut extras = Extra::new();
    if let Some(Value::Object(raw)) = item.get("extras") {
        for (key, value) in raw {
            if let Some(text) = as_text(value) {
                extras.insert(key.clone(), text);
            }
        }
    }
    for (key, value) in item {
        if KNOWN_KEYS.contains(&key.as_str()) {
            continue;
        }
        if let Some(text) = as_text(value) {
            extras.insert(key.clone(), text);
        }
    }
    extras
}

fn frequency_hz(item: &Map<String, Value>) -> Option<i64> {
    if let Some(v) = first_value(item, &["frequency_hz", "frequencyHz"]) {
        return as_int(v);
    }
    if let Some(khz) = first_value(item, &["frequency_khz", "frequencyKHz"]).and_then(as_float) {
        return Some((khz * 1_000.0) as i64);
    }
    if let Some(mhz) = first_value(item, &["frequency_mhz", "frequencyMHz"]).and_then(as_float) {
        return Some((mhz * 1_000_000.0) as i64);
    }
    let freq = item.get("frequency").and_then(as_float)?;
    Some(if freq >= 1_000_000.0 {
        freq as i64
    } else if freq >= 1_000.0 {
        (freq * 1_000.0) as i64
    } else {
        (freq * 1_000_000.0) as i64
    })
}

/// `bandwidth_hz` as-is, or `bandwidth` as `8MHz`, `8000kHz` or a bare
/// number scaled by magnitude.
fn bandwidth_hz(item: &Map<String, Value>) -> Option<u64> {
    if let Some(v) = first_value(item, &["bandwidth_hz", "bandwidthHz"]) {
        return as_int(v).and_then(|v| u64::try_from(v).ok());
    }
    let text = as_text(item.get("bandwidth")?)?;
    let hz = if let Some(base) = text.strip_suffix("MHz") {
        base.trim().parse::<f64>().ok()? * 1_000_000.0
    } else if let Some(base) = text.strip_suffix("kHz") {
        base.trim().parse::<f64>().ok()? * 1_000.0
    } else {
        let n = text.parse::<f64>().ok()?;
        if n > 10_000.0 {
            n
        } else if n > 100.0 {
            n * 1_000.0
        } else {
            n * 1_000_000.0
        }
    };
    (hz >= 0.0).then_some(hz as u64)
}

fn first_value<'a>(item: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| item.get(*k)).find(|v| !v.is_null())
}

fn first_text(item: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|k| item.get(*k)).find_map(as_text)
}

fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(_) => as_float(value).map(|f| f as i64),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/scan_load_tests.rs"]
mod tests;
