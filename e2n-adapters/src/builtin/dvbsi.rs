use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use e2n_core::keys::parse_hex;
use e2n_core::{
    Bouquet, BouquetCategory, BouquetEntry, Delivery, Profile, Service, Transponder, clean_text,
};
use regex::{Captures, Regex};

use crate::error::AdapterError;
use crate::util::{glob_files, read_lossy};
use crate::{Adapter, SourceConfig};

/// Simplified DVB-SI scan dumps, one `#SERVICE key=value ...` line per service.
pub struct DvbSiAdapter;

static SERVICE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"^#SERVICE\s+sid=(?P<sid>[0-9a-fA-Fx]+)\s+onid=(?P<onid>[0-9a-fA-Fx]+)\s+tsid=(?P<tsid>[0-9a-fA-Fx]+)"#,
        r#"\s+namespace=(?P<namespace>[0-9a-fA-Fx]+)\s+name="(?P<name>[^"]+)"\s+type=(?P<type>\d+)"#,
        r#"(?:\s+delivery=(?P<delivery>\w+))?"#,
        r#"(?:\s+frequency=(?P<frequency>\d+))?"#,
        r#"(?:\s+symbol_rate=(?P<symbol_rate>\d+))?"#,
        r#"(?:\s+orbital=(?P<orbital>[0-9.\-]+))?"#,
        r#"(?:\s+provider="(?P<provider>[^"]+)")?"#,
    ))
    .expect("static pattern")
});

impl DvbSiAdapter {
    fn find_dump(source: &Path, config: &SourceConfig) -> Result<PathBuf, AdapterError> {
        if let Some(explicit) = config.str("path") {
            let candidate = PathBuf::from(&explicit);
            let candidate = if candidate.is_absolute() {
                candidate
            } else {
                source.join(candidate)
            };
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        glob_files(source, "*.dump")?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AdapterError::not_found(format!("no DVB dump found in {}", source.display()))
            })
    }
}

/// Hex when the value carries an `x`, decimal otherwise.
fn id_value(caps: &Captures, group: &str, origin: &Path) -> Result<u32, AdapterError> {
    let raw = &caps[group];
    let parsed = if raw.contains('x') {
        parse_hex(raw)
    } else {
        raw.parse().ok()
    };
    parsed.ok_or_else(|| {
        AdapterError::parse(format!("invalid {group} value '{raw}' in {}", origin.display()))
    })
}

/// Whether a `#SERVICE` line names both `onid=` and `tsid=`.
fn has_joining_ids(line: &str) -> bool {
    let has = |key: &str| line.split_whitespace().any(|t| t.starts_with(key));
    has("onid=") && has("tsid=")
}

/// Parse the dump text into a profile with one `DVB Scan` bouquet.
pub(crate) fn parse_dump(text: &str, origin: &Path) -> Result<Profile, AdapterError> {
    let mut profile = Profile::new();
    let mut bouquet = Bouquet::new("DVB Scan", BouquetCategory::Tv);

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        let Some(caps) = SERVICE_LINE.captures(line) else {
            if line.starts_with("#SERVICE") && !has_joining_ids(line) {
                return Err(AdapterError::parse(format!(
                    "line {} missing network or transport id in {}: {line}",
                    index + 1,
                    origin.display()
                )));
            }
            continue;
        };
        let name = clean_text(&caps["name"]);
        let namespace = id_value(&caps, "namespace", origin)?;
        let tsid = id_value(&caps, "tsid", origin)?;
        let onid = id_value(&caps, "onid", origin)?;
        let sid = id_value(&caps, "sid", origin)?;
        if onid == 0 || tsid == 0 {
            return Err(AdapterError::parse(format!(
                "service {name} missing network or transport id in {}",
                origin.display()
            )));
        }

        let delivery = caps
            .name("delivery")
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(Delivery::Sat);
        let mut t = Transponder::with_ids(
            delivery,
            caps.name("frequency").and_then(|m| m.as_str().parse().ok()).unwrap_or(0),
            namespace,
            tsid,
            onid,
        );
        if !profile.transponders.contains_key(&t.key) {
            t.symbol_rate = caps
                .name("symbol_rate")
                .and_then(|m| m.as_str().parse().ok())
                .filter(|sr| *sr != 0);
            t.orbital_position = caps
                .name("orbital")
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .filter(|p| *p != 0.0 && p.is_finite());
            t.extra.insert("source".into(), "dvbsi".into());
            profile.add_transponder(t.clone());
        }

        let service_type = caps["type"].parse().unwrap_or(1);
        let mut service = Service::new(&t, sid, service_type, name);
        service.provider = Some(
            caps.name("provider")
                .map(|m| clean_text(m.as_str()))
                .unwrap_or_else(|| "DVB".into()),
        );
        bouquet.entries.push(BouquetEntry::for_service(&service));
        profile.add_service(service);
    }

    profile.bouquets.push(bouquet);
    Ok(profile)
}

impl Adapter for DvbSiAdapter {
    fn name(&self) -> &'static str {
        "dvbsi"
    }

    fn description(&self) -> &'static str {
        "raw DVB-SI scan dumps (#SERVICE lines)"
    }

    fn ingest(&self, source: &Path, config: &SourceConfig) -> Result<Vec<Profile>, AdapterError> {
        let dump = Self::find_dump(source, config)?;
        let mut profile = parse_dump(&read_lossy(&dump)?, &dump)?;
        profile.set_meta("format", "dvbsi");
        profile.set_meta(
            "profile_id",
            dump.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default(),
        );
        profile.set_meta("source_path", dump.display().to_string());
        profile.refresh_counts();
        Ok(vec![profile])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dump_line() {
        let text = "# header\n\
            #SERVICE sid=0x6dca onid=0x1 tsid=0x421 namespace=0xc00000 name=\"Das Erste HD\" type=25 delivery=sat frequency=11494 symbol_rate=22000 orbital=19.2 provider=\"ARD\"\n\
            #SERVICE sid=28107 onid=1 tsid=1057 namespace=12582912 name=\"arte HD\" type=25\n";
        let profile = parse_dump(text, Path::new("scan.dump")).unwrap();
        assert_eq!(profile.transponders.len(), 1);
        assert_eq!(profile.services.len(), 2);

        let t = &profile.transponders["00c00000:0421:0001"];
        assert_eq!(t.symbol_rate, Some(22000));
        assert_eq!(t.orbital_position, Some(19.2));

        let das_erste = &profile.services["00c00000:0421:0001:6dca"];
        assert_eq!(das_erste.provider.as_deref(), Some("ARD"));
        let arte = &profile.services["00c00000:0421:0001:6dcb"];
        assert_eq!(arte.provider.as_deref(), Some("DVB"));
        assert_eq!(profile.bouquets[0].entries.len(), 2);
    }

    #[test]
    fn test_zero_ids_are_fatal() {
        let text = "#SERVICE sid=0x1 onid=0x0 tsid=0x0 namespace=0x1 name=\"Broken\" type=1\n";
        let err = parse_dump(text, Path::new("scan.dump")).unwrap_err();
        assert!(matches!(err, AdapterError::Parse(_)));
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn test_missing_ids_are_fatal() {
        let text = "# header\n\
            #SERVICE sid=0x1 tsid=0x2 namespace=0xc00000 name=\"NoOnid\" type=1\n";
        let err = parse_dump(text, Path::new("scan.dump")).unwrap_err();
        assert!(matches!(err, AdapterError::Parse(_)));
        assert!(err.to_string().contains("line 2"));
        assert!(err.to_string().contains("NoOnid"));

        let text = "#SERVICE sid=0x1 onid=0x1 namespace=0xc00000 name=\"NoTsid\" type=1\n";
        assert!(matches!(
            parse_dump(text, Path::new("scan.dump")),
            Err(AdapterError::Parse(_))
        ));
    }
}
