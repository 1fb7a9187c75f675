use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use e2n_core::{Profile, TransponderScanEntry};
use regex::{Regex, RegexBuilder};
use scraper::{Html, Selector};
use serde_json::Value;

use crate::error::AdapterError;
use crate::util::{glob_files, now_iso, read_lossy};
use crate::{Adapter, AdapterBundle, SourceConfig};

/// ARD reception parameter page (HD transponders on Astra 19.2E).
pub struct ArdAdapter;

fn pattern(p: &str) -> Regex {
    RegexBuilder::new(p)
        .case_insensitive(true)
        .build()
        .expect("static pattern")
}

static TRANSPONDER: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"Transponder\s*(?P<tp>\d+)\s*/\s*Downlink-Frequenz\s*\(GHz\)\s*:\s*(?P<freq>[\d,\.]+)")
});
static POLARISATION: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"Polarisation\s*:\s*(?P<pol>[a-z]+)"));
static SYMBOL_RATE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"Symbolrate\s*\(MSym/s\)\s*:\s*(?P<sr>[\d,\.]+)"));
static FEC: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"Fehlerschutz\s*\(FEC\)\s*:\s*(?P<fec>[0-9/]+)"));
static MODULATION: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"Modulation\s*:\s*(?P<mod>[\w\- ]+)"));

/// Page-level settings applied to every parsed paragraph.
struct PageContext<'a> {
    provider: &'a str,
    region: &'a str,
    delivery_system: &'a str,
    last_seen: &'a str,
    source_url: &'a str,
}

fn decimal_comma(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}

fn coerce_polarisation(raw: &str) -> String {
    let value = raw.trim().to_uppercase();
    match value.chars().next() {
        Some(c @ ('H' | 'V' | 'L' | 'R')) => c.to_string(),
        _ => value,
    }
}

fn parse_paragraph(text: &str, ctx: &PageContext) -> Option<TransponderScanEntry> {
    if !text.contains("Transponder") {
        return None;
    }
    let tp = TRANSPONDER.captures(text)?;
    let Some(ghz) = decimal_comma(&tp["freq"]) else {
        log::debug!("provider_ard: invalid frequency in paragraph {text}");
        return None;
    };

    let mut entry = TransponderScanEntry::new(ctx.delivery_system, (ghz * 1_000_000_000.0) as u64);
    entry.symbol_rate = SYMBOL_RATE
        .captures(text)
        .and_then(|c| decimal_comma(&c["sr"]))
        .map(|msym| (msym * 1_000_000.0) as u64);
    entry.fec = FEC.captures(text).map(|c| c["fec"].to_string());
    entry.polarization = POLARISATION.captures(text).map(|c| coerce_polarisation(&c["pol"]));

    entry.system = Some(ctx.delivery_system.to_string());
    if let Some(raw) = MODULATION.captures(text).map(|c| c["mod"].to_uppercase()) {
        let parts: Vec<&str> = raw.split_whitespace().collect();
        match parts.first() {
            Some(first) if first.starts_with("DVB-") => {
                entry.system = Some(first.to_string());
                entry.modulation = (parts.len() > 1).then(|| parts[1..].join(" "));
            }
            _ => entry.modulation = Some(raw.trim().to_string()),
        }
    }

    entry.country = Some("DE".into());
    entry.provider = Some(ctx.provider.to_string());
    entry.region = Some(ctx.region.to_string());
    entry.last_seen = ctx.last_seen.to_string();
    entry.source_provenance = ctx.source_url.to_string();
    entry.extras.insert("transponder_number".into(), tp["tp"].to_string());
    Some(entry)
}

/// Scan entries from every `<p>` of an HTML page.
fn parse_page(html: &str, ctx: &PageContext) -> Result<Vec<TransponderScanEntry>, AdapterError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("p").map_err(|e| AdapterError::parse(format!("selector: {e}")))?;
    Ok(document
        .select(&selector)
        .filter_map(|p| {
            let text = p
                .text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            parse_paragraph(&text, ctx)
        })
        .collect())
}

impl Adapter for ArdAdapter {
    fn name(&self) -> &'static str {
        "provider_ard"
    }

    fn description(&self) -> &'static str {
        "ARD HD reception parameters (HTML, scan entries only)"
    }

    fn scan_only(&self) -> bool {
        true
    }

    fn ingest(&self, _source: &Path, _config: &SourceConfig) -> Result<Vec<Profile>, AdapterError> {
        log::info!("provider_ard emits scan entries only; no Enigma2 profile is produced");
        Ok(Vec::new())
    }

    fn ingest_bundle(
        &self,
        source: &Path,
        config: &SourceConfig,
    ) -> Result<AdapterBundle, AdapterError> {
        let pages = glob_files(source, "*.html")?;
        if pages.is_empty() {
            return Err(AdapterError::not_found(format!(
                "no HTML payloads found in {}",
                source.display()
            )));
        }

        let provider = config.str_or("provider_name", "ARD HD (Astra 19.2E)");
        let delivery_system = config.str_or("delivery_system", "DVB-S");
        let region = config.str_or("region", "DE-ARD-HD");
        let source_url = config.str("url").unwrap_or_default();
        let last_seen = now_iso();

        let mut entries = Vec::new();
        for page in pages {
            let provenance = if source_url.is_empty() {
                format!("file://{}", page.display())
            } else {
                source_url.clone()
            };
            let ctx = PageContext {
                provider: &provider,
                region: &region,
                delivery_system: &delivery_system,
                last_seen: &last_seen,
                source_url: &provenance,
            };
            entries.extend(parse_page(&read_lossy(&page)?, &ctx)?);
        }

        let extra_metadata = BTreeMap::from([
            ("provider".to_string(), Value::from(provider)),
            ("region".to_string(), Value::from(region)),
            ("entry_count".to_string(), Value::from(entries.len().to_string())),
            ("source_url".to_string(), Value::from(source_url)),
        ]);
        Ok(AdapterBundle {
            profiles: Vec::new(),
            scan_entries: entries,
            extra_metadata,
        })
    }
}
