use std::collections::{BTreeMap, BTreeSet};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use e2n_core::{
    Bouquet, BouquetCategory, BouquetEntry, Delivery, Profile, Service, Transponder, clean_text,
    slugify,
};
use regex::Regex;
use url::{Host, Url};

use crate::error::AdapterError;
use crate::util::{glob_files, read_lossy};
use crate::{Adapter, SourceConfig};

/// Namespace base for the synthetic per-group transponders.
pub const M3U_NAMESPACE_BASE: u32 = 0xEEEE_0000;

/// Official M3U playlists, restricted to an allow-list of stream hosts.
pub struct M3uAdapter;

static EXTINF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#EXTINF:-?1 ?(.*?),(.*)$").expect("static pattern"));
static EXTINF_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([a-zA-Z0-9\-]+)="([^"]+)""#).expect("static pattern"));

/// Metadata keys that are consumed rather than copied into service extras.
const CONSUMED_KEYS: &[&str] = &["name", "tvg-name", "group-title", "provider"];

impl M3uAdapter {
    fn playlist_files(source: &Path, config: &SourceConfig) -> Result<Vec<PathBuf>, AdapterError> {
        let mut files = Vec::new();
        match config.list("include") {
            Some(patterns) => {
                for pattern in patterns {
                    files.extend(glob_files(source, &pattern)?);
                }
            }
            None => {
                files.extend(glob_files(source, "*.m3u")?);
                files.extend(glob_files(source, "*.m3u8")?);
            }
        }
        Ok(files)
    }
}

/// `allowed_domains`, falling back to `official_domains`, lowercased.
fn allowed_domains(config: &SourceConfig) -> BTreeSet<String> {
    config
        .list("allowed_domains")
        .filter(|l| !l.is_empty())
        .or_else(|| config.list("official_domains"))
        .unwrap_or_default()
        .into_iter()
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .collect()
}

fn is_forbidden_v4(ip: Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
}

fn is_forbidden_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_forbidden_v4(v4);
    }
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        || (first & 0xfe00) == 0xfc00 // unique local
        || (first & 0xffc0) == 0xfe80 // link local
}

/// Check a stream URL against the security boundary.
pub fn validate_stream_url(raw: &str, allowed: &BTreeSet<String>) -> Result<Url, AdapterError> {
    let url = Url::parse(raw)
        .map_err(|e| AdapterError::security(format!("m3u entry '{raw}' is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AdapterError::security(format!(
            "m3u entry '{raw}' uses unsupported scheme {}",
            url.scheme()
        )));
    }

    let private = match url.host() {
        Some(Host::Ipv4(ip)) => is_forbidden_v4(ip),
        Some(Host::Ipv6(ip)) => is_forbidden_v6(ip),
        Some(Host::Domain(domain)) => {
            domain.eq_ignore_ascii_case("localhost") || domain.parse::<IpAddr>().is_ok()
        }
        None => true,
    };
    if private {
        return Err(AdapterError::security(format!(
            "m3u entry '{raw}' points to private or loopback address"
        )));
    }

    let host = url.host_str().unwrap_or_default().to_lowercase();
    if !allowed.contains(&host) {
        return Err(AdapterError::security(format!(
            "m3u entry host {host} not in allowed_domains {:?}",
            allowed.iter().collect::<Vec<_>>()
        )));
    }
    if url.path().to_lowercase().contains("get.php") {
        return Err(AdapterError::security(format!(
            "m3u entry '{raw}' matches blocked pattern get.php"
        )));
    }
    Ok(url)
}

fn parse_extinf(line: &str) -> BTreeMap<String, String> {
    let mut meta = BTreeMap::new();
    if let Some(caps) = EXTINF.captures(line) {
        meta.insert("name".to_string(), clean_text(&caps[2]));
        for attr in EXTINF_ATTR.captures_iter(&caps[1]) {
            meta.insert(attr[1].to_lowercase(), clean_text(&attr[2]));
        }
    }
    meta
}

/// Parse one playlist. Every stream URL must pass [`validate_stream_url`].
pub fn parse_playlist(
    text: &str,
    allowed: &BTreeSet<String>,
    default_provider: &str,
) -> Result<Profile, AdapterError> {
    if allowed.is_empty() {
        return Err(AdapterError::security(
            "m3u adapter requires 'allowed_domains' list for official validation",
        ));
    }

    let mut profile = Profile::new();
    let mut groups: Vec<(String, Transponder, Bouquet)> = Vec::new();
    let mut meta: BTreeMap<String, String> = BTreeMap::new();
    let mut counter: u32 = 1;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with("#EXTINF") {
            meta = parse_extinf(line);
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let url = validate_stream_url(line, allowed)?;
        let name = meta
            .get("tvg-name")
            .or_else(|| meta.get("name"))
            .filter(|n| !n.is_empty())
            .cloned()
            .unwrap_or_else(|| clean_text(line));
        let group_title = meta
            .get("group-title")
            .filter(|g| !g.is_empty())
            .cloned()
            .unwrap_or_else(|| "M3U".to_string());

        let idx = match groups.iter().position(|(title, _, _)| *title == group_title) {
            Some(idx) => idx,
            None => {
                let n = groups.len() as u32 + 1;
                let mut t = Transponder::with_ids(
                    Delivery::Cable,
                    u64::from(n),
                    M3U_NAMESPACE_BASE + n,
                    n,
                    n,
                );
                let slug = slugify(&group_title, '_');
                let slug = if slug.is_empty() { "group".to_string() } else { slug };
                t.extra.insert("group_key".into(), format!("m3u:{slug}"));
                let bouquet = Bouquet::new(group_title.clone(), BouquetCategory::Tv);
                groups.push((group_title.clone(), t, bouquet));
                groups.len() - 1
            }
        };
        let (_, transponder, bouquet) = &mut groups[idx];

        let service_type = meta
            .get("service-type")
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);
        let mut service = Service::new(transponder, counter, service_type, name);
        service.provider = Some(
            meta.get("provider")
                .filter(|p| !p.is_empty())
                .cloned()
                .unwrap_or_else(|| default_provider.to_string()),
        );
        if meta.contains_key("radio") {
            service.is_radio = meta.get("radio").is_some_and(|r| r == "1");
        }
        service.extra = meta
            .iter()
            .filter(|(k, _)| !CONSUMED_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        service
            .extra
            .insert("stream_host".into(), url.host_str().unwrap_or_default().to_string());
        service.extra.insert("stream_scheme".into(), url.scheme().to_string());

        bouquet.entries.push(BouquetEntry::for_service(&service));
        profile.add_service(service);
        counter += 1;
        meta.clear();
    }

    for (_, transponder, bouquet) in groups {
        profile.add_transponder(transponder);
        profile.bouquets.push(bouquet);
    }
    Ok(profile)
}

impl Adapter for M3uAdapter {
    fn name(&self) -> &'static str {
        "m3u"
    }

    fn description(&self) -> &'static str {
        "official M3U playlists (allow-listed hosts only)"
    }

    fn ingest(&self, source: &Path, config: &SourceConfig) -> Result<Vec<Profile>, AdapterError> {
        let allowed = allowed_domains(config);
        let default_provider = config.str_or("provider", "M3U");
        let mut profiles = Vec::new();
        for file in Self::playlist_files(source, config)? {
            let mut profile = parse_playlist(&read_lossy(&file)?, &allowed, &default_provider)?;
            profile.set_meta(
                "profile_id",
                file.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default(),
            );
            profile.set_meta("source_path", file.display().to_string());
            profile.set_meta("format", "m3u");
            profile.refresh_counts();
            profiles.push(profile);
        }
        Ok(profiles)
    }
}
