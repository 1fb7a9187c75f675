use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::LazyLock;

use chrono::NaiveDate;
use e2n_core::{Profile, TransponderScanEntry, slugify};
use regex::Regex;
use serde_json::Value;

use crate::error::AdapterError;
use crate::util::{column, date_iso, now_iso, pdf_texts, two_digit_numbers, uhf_channel_to_hz};
use crate::{Adapter, AdapterBundle, SourceConfig};

/// German DVB-T2 HD site list (official PDF).
pub struct DvbT2DeAdapter;

static STAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Stand:\s*(\d{2}\.\d{2}\.\d{4})").expect("static pattern"));

/// One transmitter site row, possibly spread over several lines.
#[derive(Debug, Clone, PartialEq)]
struct SiteRecord {
    index: usize,
    state: String,
    network: String,
    site: String,
    polarisation: Option<String>,
    channels: Vec<u32>,
}

fn extract_last_seen(text: &str) -> Option<String> {
    let caps = STAND.captures(text)?;
    NaiveDate::parse_from_str(&caps[1], "%d.%m.%Y").ok().map(date_iso)
}

/// Fixed-width rows: state 0-12, network 12-24, site 24-60, polarisation
/// 60-68, channels from 68. Lines without a state continue the previous row.
fn parse_records(text: &str) -> Vec<SiteRecord> {
    let mut records: Vec<SiteRecord> = Vec::new();
    for raw in text.lines() {
        let line = raw.trim_end();
        if line.trim_matches(|c: char| c.is_whitespace() || c == '\x0c').is_empty()
            || line.starts_with("DVB-T2")
            || line.starts_with("Kanal-/Multiplexbelegung")
        {
            continue;
        }
        let state = column(line, 0, Some(12));
        let network = column(line, 12, Some(24));
        let site = column(line, 24, Some(60));
        let polarisation = column(line, 60, Some(68));
        let channels = column(line, 68, None);

        if !state.is_empty() {
            records.push(SiteRecord {
                index: records.len(),
                state,
                network,
                site,
                polarisation: None,
                channels: Vec::new(),
            });
        } else if !site.is_empty() && !matches!(site.as_str(), "H" | "V" | "H/V") {
            if let Some(current) = records.last_mut() {
                current.site = format!("{} {site}", current.site).trim().to_string();
            }
        }

        let Some(current) = records.last_mut() else {
            continue;
        };
        if !polarisation.is_empty() {
            current.polarisation = Some(polarisation);
        }
        for channel in two_digit_numbers(&channels) {
            if !current.channels.contains(&channel) {
                current.channels.push(channel);
            }
        }
    }
    records
}

fn region_code(state: &str, site: &str) -> String {
    let state = slugify(state, '-');
    match slugify(site, '-') {
        site if site.is_empty() => format!("DE-{state}"),
        site => format!("DE-{state}-{site}"),
    }
}

fn record_entries(
    record: &SiteRecord,
    pdf_name: &str,
    provenance: &str,
    last_seen: &str,
) -> Vec<TransponderScanEntry> {
    let region = region_code(&record.state, &record.site);
    record
        .channels
        .iter()
        .filter_map(|&channel| {
            let frequency = uhf_channel_to_hz(channel)?;
            let mut entry = TransponderScanEntry::new("DVB-T2", frequency);
            entry.system = Some("DVB-T2".into());
            entry.bandwidth_hz = Some(8_000_000);
            entry.modulation = Some("COFDM".into());
            entry.country = Some("DE".into());
            entry.provider = Some(if record.network.is_empty() {
                "DVB-T2".into()
            } else {
                record.network.clone()
            });
            entry.region = Some(region.clone());
            entry.last_seen = last_seen.to_string();
            entry.source_provenance = provenance.to_string();
            entry.extras.insert("channel".into(), channel.to_string());
            entry.extras.insert("network".into(), record.network.clone());
            entry.extras.insert("site".into(), record.site.clone());
            entry.extras.insert("row_index".into(), record.index.to_string());
            entry.extras.insert("source_pdf".into(), pdf_name.to_string());
            if let Some(pol) = &record.polarisation {
                entry.extras.insert("polarisation_hint".into(), pol.clone());
            }
            Some(entry)
        })
        .collect()
}

impl Adapter for DvbT2DeAdapter {
    fn name(&self) -> &'static str {
        "provider_dvb_t2_de"
    }

    fn description(&self) -> &'static str {
        "DVB-T2 HD Germany site list (PDF, scan entries only)"
    }

    fn scan_only(&self) -> bool {
        true
    }

    fn ingest(&self, _source: &Path, _config: &SourceConfig) -> Result<Vec<Profile>, AdapterError> {
        log::info!("provider_dvb_t2_de emits scan entries only; no Enigma2 profile is produced");
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

    fn row(state: &str, network: &str, site: &str, pol: &str, channels: &str) -> String {
        format!("{state:<12}{network:<12}{site:<36}{pol:<8}{channels}")
    }

    #[test]
    fn test_parse_records_with_continuation() {
        let text = [
            "DVB-T2 HD Senderstandorte".to_string(),
            row("BW", "ARD", "Stuttgart", "H", "23, 27 / 35"),
            row("", "", "Frauenkopf", "", "27 41"),
            row("", "", "H/V", "", ""),
            row("BY", "", "München", "V", "19 22"),
        ]
        .join("\n");

        let records = parse_records(&text);
        assert_eq!(records.len(), 2, "{records:?}");
        let bw = &records[0];
        assert_eq!(bw.site, "Stuttgart Frauenkopf");
        assert_eq!(bw.channels, vec![23, 27, 35, 41]);
        assert_eq!(bw.polarisation.as_deref(), Some("H"));

        let entries = record_entries(bw, "dvbt2.pdf", "/tmp/dvbt2.pdf", "x");
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].frequency_hz, 490_000_000);
        assert_eq!(entries[0].region.as_deref(), Some("DE-bw-stuttgart-frauenkopf"));
        assert_eq!(entries[0].provider.as_deref(), Some("ARD"));
        assert_eq!(entries[0].bandwidth_hz, Some(8_000_000));

        // channel 19 is below the UHF range
        let by = record_entries(&records[1], "dvbt2.pdf", "/tmp/dvbt2.pdf", "x");
        assert_eq!(by.len(), 1);
        assert_eq!(by[0].provider.as_deref(), Some("DVB-T2"));
        assert_eq!(by[0].region.as_deref(), Some("DE-by-m-nchen"));
    }

    #[test]
    fn test_stand_date() {
        assert_eq!(
            extract_last_seen("foo\nStand: 15.01.2025\n").as_deref(),
            Some("2025-01-15T00:00:00+00:00")
        );
        assert_eq!(extract_last_seen("Stand: 45.01.2025"), None);
        assert_eq!(extract_last_seen("no date"), None);
    }
}
