use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use e2n_core::{Profile, TransponderScanEntry};
use serde_json::{Map, Value};

use crate::error::AdapterError;
use crate::util::{glob_files, now_iso, read_lossy};
use crate::{Adapter, AdapterBundle, SourceConfig};

/// ASTRA channel finder listings (JSON, or the JSON embedded in the HTML page).
pub struct AstraAdapter;

pub const ASTRA_DEFAULT_URL: &str = "https://astra.de/channel-finder/listing\
    ?filter%5Blanguage%5D=german\
    &filter%5Borbital_position%5D=19.20\
    &filter%5Bpay_model%5D=free\
    &layout=list&more_filters=no&tv=on&items_per_page=500";

const EMBED_MARKER: &str = "window.__CHANNEL_FINDER__";

struct RowContext<'a> {
    provider: &'a str,
    delivery_system: &'a str,
    orbital_position: &'a str,
    last_seen: &'a str,
    source_url: &'a str,
}

/// Text of a scalar JSON value; blank, zero-like and `null` values are absent.
fn scalar(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".into()),
        _ => None,
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite() && *v > 0.0)
}

fn sorted_join(value: Option<&Value>, sep: &str) -> Option<String> {
    let items: BTreeSet<String> = value?
        .as_array()?
        .iter()
        .filter_map(|v| scalar(Some(v)))
        .collect();
    (!items.is_empty()).then(|| items.into_iter().collect::<Vec<_>>().join(sep))
}

fn coerce_row(row: &Map<String, Value>, ctx: &RowContext) -> Option<TransponderScanEntry> {
    let raw_frequency = row.get("frequency");
    scalar(raw_frequency)?;
    let Some(mhz) = number(raw_frequency) else {
        log::debug!("provider_astra: skipping row with invalid frequency {:?}", raw_frequency);
        return None;
    };

    let mut entry = TransponderScanEntry::new(ctx.delivery_system, (mhz * 1_000_000.0) as u64);
    entry.symbol_rate = number(row.get("symbolRate")).map(|ksym| (ksym * 1_000.0) as u64);
    entry.polarization = scalar(row.get("polarity")).map(|p| p.to_uppercase());

    let quality = scalar(row.get("qualityName")).unwrap_or_default().to_lowercase();
    entry.system = Some(if quality == "hd" || quality == "uhd" {
        "DVB-S2".to_string()
    } else {
        ctx.delivery_system.to_string()
    });

    if let Some(tp) = scalar(row.get("transponderNumber")) {
        entry.extras.insert("transponder_number".into(), tp);
    }
    if let Some(packages) = sorted_join(row.get("packages"), ",") {
        entry.extras.insert("packages".into(), packages);
    }
    if let Some(encryption) = sorted_join(row.get("encryption"), ",") {
        entry.extras.insert("encryption".into(), encryption);
    }
    if let Some(encoding) = scalar(row.get("encoding")) {
        entry.extras.insert("encoding".into(), encoding);
    }
    entry.extras.insert(
        "orbital_position".into(),
        scalar(row.get("orbitalPosition")).unwrap_or_else(|| ctx.orbital_position.to_string()),
    );
    if let Some(service_type) = scalar(row.get("serviceType")) {
        entry.extras.insert("service_type".into(), service_type);
    }

    entry.country = sorted_join(row.get("countries"), "; ");
    entry.provider = Some(ctx.provider.to_string());
    entry.last_seen = ctx.last_seen.to_string();
    entry.source_provenance = ctx.source_url.to_string();
    Some(entry)
}

/// Row lists found in the source directory. JSON files win over HTML pages.
fn load_row_lists(source: &Path) -> Result<Vec<Vec<Value>>, AdapterError> {
    let json_files = glob_files(source, "*.json")?;
    if !json_files.is_empty() {
        let mut lists = Vec::new();
        for path in json_files {
            let payload: Value = match serde_json::from_str(&read_lossy(&path)?) {
                Ok(v) => v,
                Err(e) => {
                    log::error!("provider_astra: failed to parse {}: {e}", path.display());
                    continue;
                }
            };
            match payload {
                Value::Array(rows) => lists.push(rows),
                Value::Object(mut obj) => match obj.remove("data") {
                    Some(Value::Array(rows)) => lists.push(rows),
                    _ => log::warn!("provider_astra: unsupported payload in {}", path.display()),
                },
                _ => log::warn!("provider_astra: unsupported payload in {}", path.display()),
            }
        }
        return Ok(lists);
    }

    let mut lists = Vec::new();
    for path in glob_files(source, "*.html")? {
        if let Some(rows) = embedded_rows(&read_lossy(&path)?) {
            lists.push(rows);
        }
    }
    Ok(lists)
}

/// Rows of the channel finder state object embedded in a page script.
fn embedded_rows(html: &str) -> Option<Vec<Value>> {
    let marker = html.find(EMBED_MARKER)?;
    let start = marker + html[marker..].find('{')?;
    let end = start + html[start..].find("</script>")?;
    let snippet = html[start..end].trim().trim_end_matches(';');
    let Value::Object(mut payload) = serde_json::from_str(snippet).ok()? else {
        return None;
    };
    let rows = match payload.remove("channels") {
        Some(Value::Array(rows)) if !rows.is_empty() => rows,
        _ => match payload.remove("data") {
            Some(Value::Array(rows)) => rows,
            _ => return None,
        },
    };
    Some(rows)
}

impl Adapter for AstraAdapter {
    fn name(&self) -> &'static str {
        "provider_astra"
    }

    fn description(&self) -> &'static str {
        "ASTRA channel finder (JSON, scan entries only)"
    }

    fn scan_only(&self) -> bool {
        true
    }

    fn ingest(&self, _source: &Path, _config: &SourceConfig) -> Result<Vec<Profile>, AdapterError> {
        log::info!("provider_astra emits scan entries only; no Enigma2 profile is produced");
        Ok(Vec::new())
    }

    fn ingest_bundle(
        &self,
        source: &Path,
        config: &SourceConfig,
    ) -> Result<AdapterBundle, AdapterError> {
        let lists = load_row_lists(source)?;
        if lists.is_empty() {
            return Err(AdapterError::not_found(format!(
                "no JSON payloads found in {}",
                source.display()
            )));
        }

        let provider = config
            .str("provider_name")
            .or_else(|| config.str("position"))
            .unwrap_or_else(|| "ASTRA 19.2E".into());
        let delivery_system = config.str_or("delivery_system", "DVB-S");
        let orbital_position = config.str_or("orbital_position", "19.2E");
        let source_url = config.str_or("url", ASTRA_DEFAULT_URL);
        let last_seen = now_iso();
        let ctx = RowContext {
            provider: &provider,
            delivery_system: &delivery_system,
            orbital_position: &orbital_position,
            last_seen: &last_seen,
            source_url: &source_url,
        };

        let entries: Vec<TransponderScanEntry> = lists
            .iter()
            .flatten()
            .filter_map(|row| row.as_object().and_then(|obj| coerce_row(obj, &ctx)))
            .collect();

        let extra_metadata = BTreeMap::from([
            ("provider".to_string(), Value::from(provider.as_str())),
            ("orbital_position".to_string(), Value::from(orbital_position.as_str())),
            ("delivery_system".to_string(), Value::from(delivery_system.as_str())),
            ("entry_count".to_string(), Value::from(entries.len().to_string())),
            ("source_url".to_string(), Value::from(source_url.as_str())),
        ]);
        Ok(AdapterBundle {
            profiles: Vec::new(),
            scan_entries: entries,
            extra_metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> RowContext<'static> {
        RowContext {
            provider: "ASTRA 19.2E",
            delivery_system: "DVB-S",
            orbital_position: "19.2E",
            last_seen: "2025-01-01T00:00:00+00:00",
            source_url: ASTRA_DEFAULT_URL,
        }
    }

    #[test]
    fn test_coerce_row() {
        let row = json!({
            "frequency": "11493.75",
            "symbolRate": 22000,
            "polarity": "h",
            "transponderNumber": 19,
            "qualityName": "HD",
            "packages": ["free", "basic"],
            "countries": ["DE", "AT", "DE"],
        });
        let entry = coerce_row(row.as_object().unwrap(), &ctx()).unwrap();
        assert_eq!(entry.frequency_hz, 11_493_750_000);
        assert_eq!(entry.symbol_rate, Some(22_000_000));
        assert_eq!(entry.polarization.as_deref(), Some("H"));
        assert_eq!(entry.system.as_deref(), Some("DVB-S2"));
        assert_eq!(entry.country.as_deref(), Some("AT; DE"));
        assert_eq!(entry.extras["packages"], "basic,free");
        assert_eq!(entry.extras["orbital_position"], "19.2E");
        assert_eq!(entry.extras["transponder_number"], "19");
    }

    #[test]
    fn test_rows_without_frequency_are_skipped() {
        let row = json!({"frequency": "", "symbolRate": 22000});
        assert!(coerce_row(row.as_object().unwrap(), &ctx()).is_none());
        let row = json!({"frequency": "n/a"});
        assert!(coerce_row(row.as_object().unwrap(), &ctx()).is_none());
    }

    #[test]
    fn test_embedded_rows() {
        let html = r#"<script>window.__CHANNEL_FINDER__ = {"channels": [{"frequency": 12188}]};</script>"#;
        let rows = embedded_rows(html).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(embedded_rows("<html></html>").is_none());
    }
}
