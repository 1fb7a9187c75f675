use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::LazyLock;

use chrono::NaiveDate;
use e2n_core::text::fold_umlauts;
use e2n_core::{Profile, TransponderScanEntry, slugify};
use regex::Regex;
use serde_json::Value;

use crate::error::AdapterError;
use crate::util::{column, date_iso, now_iso, pdf_texts, two_digit_numbers, uhf_channel_to_hz};
use crate::{Adapter, AdapterBundle, SourceConfig};

/// simpliTV antenna channel list for Austria (official PDF).
pub struct SimpliTvAtAdapter;

static STAND_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Stand:\s*([A-Za-zÄÖÜäöü]+)\s+(\d{4})").expect("static pattern"));

const MUXES: [&str; 6] = ["A", "B", "C", "D", "E", "F"];
const MUX_COLUMNS: [(usize, Option<usize>); 6] = [
    (75, Some(90)),
    (90, Some(105)),
    (105, Some(120)),
    (120, Some(135)),
    (135, Some(150)),
    (150, None),
];

fn month_number(name: &str) -> Option<u32> {
    let month = match fold_umlauts(&name.to_lowercase()).as_str() {
        "januar" => 1,
        "februar" => 2,
        "maerz" => 3,
        "april" => 4,
        "mai" => 5,
        "juni" => 6,
        "juli" => 7,
        "august" => 8,
        "september" => 9,
        "oktober" => 10,
        "november" => 11,
        "dezember" => 12,
        _ => return None,
    };
    Some(month)
}

/// `Stand: März 2025` as the first of that month.
fn extract_last_seen(text: &str) -> Option<String> {
    let caps = STAND_MONTH.captures(text)?;
    let month = month_number(&caps[1])?;
    let year = caps[2].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1).map(date_iso)
}

#[derive(Debug, Clone, PartialEq)]
struct SiteRecord {
    state: String,
    site: String,
    programme: String,
    /// Channels per multiplex, in `MUXES` order.
    mux_channels: [Vec<u32>; 6],
}

fn is_header(line: &str) -> bool {
    line.starts_with("simpliTV Kanalliste")
        || line.starts_with("Bundesland-")
        || (line.contains("MUX A") && line.contains("MUX F"))
        || line.trim().strip_prefix("MUX ").is_some_and(|m| MUXES.contains(&m))
}

/// Fixed-width rows: state 0-6, site 6-45, programme 45-75, then one
/// 15-character column per MUX. A line holding only a state code sets the
/// state for the rows below it.
fn parse_records(text: &str) -> Vec<SiteRecord> {
    let mut records = Vec::new();
    let mut current_state = String::new();
    for raw in text.lines() {
        let line = raw.trim_end();
        if line.is_empty() || is_header(line) {
            continue;
        }
        let state = column(line, 0, Some(6));
        let site = column(line, 6, Some(45));
        if !state.is_empty() && state.chars().count() <= 4 && site.is_empty() {
            current_state = state;
            continue;
        }
        if site.is_empty() {
            continue;
        }

        let mut record = SiteRecord {
            state: if state.is_empty() { current_state.clone() } else { state },
            site,
            programme: column(line, 45, Some(75)),
            mux_channels: Default::default(),
        };
        for (slot, (start, end)) in record.mux_channels.iter_mut().zip(MUX_COLUMNS) {
            let field = column(line, start, end);
            if field != "-" {
                slot.extend(two_digit_numbers(&field));
            }
        }
        if record.mux_channels.iter().any(|c| !c.is_empty()) {
            records.push(record);
        }
    }
    records
}

fn region_code(state: &str, site: &str) -> String {
    let state = if state.is_empty() { "AT" } else { state };
    let state = slugify(&fold_umlauts(state), '-');
    match slugify(&fold_umlauts(site), '-') {
        site if site.is_empty() => format!("AT-{state}"),
        site => format!("AT-{state}-{site}"),
    }
}

fn record_entries(
    record: &SiteRecord,
    pdf_name: &str,
    provenance: &str,
    last_seen: &str,
) -> Vec<TransponderScanEntry> {
    let region = region_code(&record.state, &record.site);
    let mut entries = Vec::new();
    for (mux, channels) in MUXES.iter().zip(&record.mux_channels) {
        for &channel in channels {
            let Some(frequency) = uhf_channel_to_hz(channel) else {
                continue;
            };
            let mut entry = TransponderScanEntry::new("DVB-T2", frequency);
            entry.system = Some("DVB-T2".into());
            entry.bandwidth_hz = Some(8_000_000);
            entry.modulation = Some("COFDM".into());
            entry.country = Some("AT".into());
            entry.provider = Some("simpliTV".into());
            entry.region = Some(region.clone());
            entry.last_seen = last_seen.to_string();
            entry.source_provenance = provenance.to_string();
            entry.extras.insert("mux".into(), mux.to_string());
            entry.extras.insert("channel".into(), channel.to_string());
            entry.extras.insert("bundesland_programme".into(), record.programme.clone());
            entry.extras.insert("site".into(), record.site.clone());
            entry.extras.insert("source_pdf".into(), pdf_name.to_string());
            entries.push(entry);
        }
    }
    entries
}

impl Adapter for SimpliTvAtAdapter {
    fn name(&self) -> &'static str {
        "provider_simplitv_at"
    }

    fn description(&self) -> &'static str {
        "simpliTV Austria channel list (PDF, scan entries only)"
    }

    fn scan_only(&self) -> bool {
        true
    }

    fn ingest(&self, _source: &Path, _config: &SourceConfig) -> Result<Vec<Profile>, AdapterError> {
        log::info!("provider_simplitv_at emits scan entries only; no Enigma2 profile is produced");
        Ok(Vec::new())
    }

    fn ingest_bundle(
        &self,
        source: &Path,
        _config: &SourceConfig,
    ) -> Result<AdapterBundle, AdapterError> {
        let documents = pdf_texts(source)?;
        if documents.is_empty() {
            return Err(AdapterError::not_found(format!(
                "no PDF payloads found in {}",
                source.display()
            )));
        }

        let fallback_seen = now_iso();
        let mut entries = Vec::new();
        let mut sources = Vec::new();
        for (name, path, text) in &documents {
            let last_seen = extract_last_seen(text).unwrap_or_else(|| fallback_seen.clone());
            let provenance = path.display().to_string();
            for record in parse_records(text) {
                entries.extend(record_entries(&record, name, &provenance, &last_seen));
            }
            sources.push(Value::from(name.as_str()));
        }

        let regions: BTreeSet<&str> = entries.iter().filter_map(|e| e.region.as_deref()).collect();
        let extra_metadata = BTreeMap::from([
            ("regions".to_string(), Value::from(regions.len().to_string())),
            ("entry_count".to_string(), Value::from(entries.len().to_string())),
            ("sources".to_string(), Value::Array(sources)),
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

    fn row(state: &str, site: &str, programme: &str, muxes: [&str; 6]) -> String {
        let mut line = format!("{state:<6}{site:<39}{programme:<30}");
        for mux in muxes {
            line.push_str(&format!("{mux:<15}"));
        }
        line
    }

    #[test]
    fn test_parse_records() {
        let text = [
            "simpliTV Kanalliste".to_string(),
            "Stand: März 2025".to_string(),
            "W".to_string(),
            row("", "Wien Kahlenberg", "ORF 2 W", ["34", "24", "-", "41", "", "29"]),
            row("", "Wien Liesing", "", ["-", "-", "-", "-", "-", "-"]),
            row("NÖ", "St. Pölten", "ORF 2 N", ["27", "", "", "", "", ""]),
        ]
        .join("\n");

        let records = parse_records(&text);
        // the Stand line and the all-dash row carry no channels
        assert_eq!(records.len(), 2, "{records:?}");

        let wien = &records[0];
        assert_eq!(wien.state, "W");
        assert_eq!(wien.mux_channels[0], vec![34]);
        assert!(wien.mux_channels[2].is_empty());

        let entries = record_entries(wien, "simplitv.pdf", "/tmp/simplitv.pdf", "x");
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].extras["mux"], "A");
        assert_eq!(entries[0].frequency_hz, 578_000_000);
        assert_eq!(entries[0].region.as_deref(), Some("AT-w-wien-kahlenberg"));
        assert_eq!(entries[3].extras["mux"], "F");

        let noe = record_entries(&records[1], "simplitv.pdf", "", "x");
        assert_eq!(noe[0].region.as_deref(), Some("AT-noe-st-poelten"));
    }

    #[test]
    fn test_stand_month() {
        assert_eq!(
            extract_last_seen("Stand: März 2025").as_deref(),
            Some("2025-03-01T00:00:00+00:00")
        );
        assert_eq!(
            extract_last_seen("Stand: Oktober 2024").as_deref(),
            Some("2024-10-01T00:00:00+00:00")
        );
        assert_eq!(extract_last_seen("Stand: Brumaire 2024"), None);
    }
}
