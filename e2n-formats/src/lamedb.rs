//! Reader and writer for the Enigma2 `lamedb`/`lamedb5` service database.
//!
//! Both files share the `eDVB services` header. Version 4 is a sectioned,
//! multi-line format (`transponders` ... `end`, `services` ... `end`);
//! version 5 puts each record on one `t:`/`s:` prefixed line. Output is
//! always written as version 4.

use std::collections::BTreeMap;
use std::path::Path;

use e2n_core::codes::{polarization_from_lamedb, polarization_to_code};
use e2n_core::keys::{parse_hex, parse_int_auto};
use e2n_core::{Delivery, Profile, Service, Transponder, TransponderKey, clean_text};

use crate::error::FormatError;

/// Parsed contents of a lamedb file.
#[derive(Debug, Clone, Default)]
pub struct Lamedb {
    /// `4` or `5`, from the header line.
    pub version: u8,
    pub transponders: BTreeMap<String, Transponder>,
    pub services: BTreeMap<String, Service>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Transponders,
    Services,
}

/// Parse lamedb text. `origin` names the source in error messages.
pub fn parse_lamedb(text: &str, origin: &str) -> Result<Lamedb, FormatError> {
    let lines: Vec<&str> = text.lines().map(|l| l.trim_end_matches('\r')).collect();
    let header = lines.first().map(|l| l.trim_start()).unwrap_or_default();
    if !header.starts_with("eDVB services") {
        return Err(FormatError::invalid_lamedb(format!(
            "{origin} does not look like a lamedb file"
        )));
    }
    let version = if header.contains("/5/") { 5 } else { 4 };

    let mut db = Lamedb {
        version,
        ..Lamedb::default()
    };

    if lines.iter().skip(1).any(|l| l.starts_with("t:")) {
        parse_single_line_records(&lines[1..], origin, &mut db)?;
    } else {
        parse_sectioned_records(&lines[1..], origin, &mut db)?;
    }
    Ok(db)
}

/// Read and parse a lamedb file from disk. Invalid UTF-8 is replaced.
pub fn parse_lamedb_file(path: &Path) -> Result<Lamedb, FormatError> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    parse_lamedb(&text, &path.display().to_string())
}

// ---------------------------------------------------------------------------
// Version 4 (sectioned)
// ---------------------------------------------------------------------------

fn parse_sectioned_records(
    lines: &[&str],
    origin: &str,
    db: &mut Lamedb,
) -> Result<(), FormatError> {
    let mut section: Option<Section> = None;
    let mut idx = 0;

    while idx < lines.len() {
        let raw = lines[idx].trim();
        match raw {
            "transponders" => {
                section = Some(Section::Transponders);
                idx += 1;
                continue;
            }
            "services" => {
                section = Some(Section::Services);
                idx += 1;
                continue;
            }
            "end" => {
                section = None;
                idx += 1;
                continue;
            }
            "" | "/" => {
                idx += 1;
                continue;
            }
            _ => {}
        }

        match section {
            Some(Section::Transponders) => {
                idx += 1;
                let Some(data_line) = lines.get(idx) else {
                    break;
                };
                idx += 1;
                let transponder = parse_transponder_entry(raw, data_line.trim(), origin)?;
                db.transponders.insert(transponder.key.clone(), transponder);
            }
            Some(Section::Services) => {
                idx += 1;
                let Some(name_line) = lines.get(idx) else {
                    break;
                };
                idx += 1;

                let mut properties = Vec::new();
                while let Some(next) = lines.get(idx) {
                    let next = next.trim();
                    if matches!(next, "" | "/" | "end") || is_service_descriptor(next) {
                        break;
                    }
                    properties.extend(split_properties(next));
                    idx += 1;
                }

                let service = parse_service_entry(raw, name_line, &properties, origin)?;
                db.services.insert(service.key.clone(), service);
            }
            None => idx += 1,
        }
    }
    Ok(())
}

/// A service descriptor line: at least six colon-separated hex fields.
fn is_service_descriptor(line: &str) -> bool {
    let fields: Vec<&str> = line.trim_end_matches(':').split(':').collect();
    fields.len() >= 6
        && fields
            .iter()
            .all(|f| !f.is_empty() && f.chars().all(|c| c.is_ascii_hexdigit()))
}

fn split_properties(line: &str) -> Vec<String> {
    line.split(',')
        .map(clean_text)
        .filter(|p| !p.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Version 5 (one record per line)
// ---------------------------------------------------------------------------

fn parse_single_line_records(
    lines: &[&str],
    origin: &str,
    db: &mut Lamedb,
) -> Result<(), FormatError> {
    for line in lines {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("t:") {
            let (key, data) = rest.split_once(',').ok_or_else(|| {
                FormatError::invalid_lamedb(format!(
                    "invalid transponder record '{line}' in {origin}"
                ))
            })?;
            let transponder = parse_transponder_entry(key, data, origin)?;
            db.transponders.insert(transponder.key.clone(), transponder);
        } else if let Some(rest) = line.strip_prefix("s:") {
            let (descriptor, tail) = rest.split_once(',').unwrap_or((rest, ""));
            let (name, props) = split_quoted_name(tail);
            let properties = split_properties(props);
            let service = parse_service_entry(descriptor, name, &properties, origin)?;
            db.services.insert(service.key.clone(), service);
        }
    }
    Ok(())
}

/// Split `"Name",p:X,c:Y` into the unquoted name and the property tail.
fn split_quoted_name(tail: &str) -> (&str, &str) {
    let Some(body) = tail.strip_prefix('"') else {
        return tail.split_once(',').unwrap_or((tail, ""));
    };
    match body.find('"') {
        Some(end) => (&body[..end], body[end + 1..].trim_start_matches(',')),
        None => (body, ""),
    }
}

// ---------------------------------------------------------------------------
// Record decoding
// ---------------------------------------------------------------------------

fn parse_transponder_entry(
    key_line: &str,
    data_line: &str,
    origin: &str,
) -> Result<Transponder, FormatError> {
    let key_line = key_line.trim();
    if key_line.eq_ignore_ascii_case("end") {
        return Err(FormatError::invalid_lamedb(format!(
            "unexpected end marker while parsing transponders in {origin}"
        )));
    }
    let key: TransponderKey = key_line.parse().map_err(|_| {
        FormatError::invalid_lamedb(format!("invalid transponder key '{key_line}' in {origin}"))
    })?;

    let data_line = data_line.trim();
    let mut chars = data_line.chars();
    let Some(delivery_char) = chars.next() else {
        return Err(FormatError::invalid_lamedb(format!(
            "empty transponder payload for {key_line} in {origin}"
        )));
    };
    let delivery = Delivery::from_lamedb_char(delivery_char).unwrap_or(Delivery::Sat);
    let payload = chars.as_str().trim_start_matches([' ', ':']).replace(' ', ":");
    let parts: Vec<&str> = payload.split(':').filter(|p| !p.is_empty()).collect();

    let mut t = Transponder::with_ids(
        delivery,
        parts.first().map(|p| safe_int(p)).unwrap_or(0),
        key.namespace,
        key.transport_stream_id,
        key.original_network_id,
    );
    t.symbol_rate = parts.get(1).map(|p| safe_int(p));
    t.polarization = parts
        .get(2)
        .map(|p| polarization_from_lamedb(p).map_or_else(|| p.to_string(), str::to_string));
    t.fec = parts.get(3).map(|p| p.to_string());
    if delivery == Delivery::Sat {
        t.orbital_position = parts
            .get(4)
            .map(|p| p.parse::<i64>().map(|v| v as f64 / 10.0).unwrap_or(0.0));
    }
    // frequency:symbol_rate:polarization:fec:orbital:inversion:flags:system:modulation
    t.system = parts.get(7).map(|p| p.to_string());
    t.modulation = parts.get(8).map(|p| p.to_string());
    if parts.len() > 4 {
        t.extra.insert("raw_fields".into(), parts.join(","));
    }
    Ok(t)
}

fn parse_service_entry(
    descriptor: &str,
    name_line: &str,
    properties: &[String],
    origin: &str,
) -> Result<Service, FormatError> {
    let invalid = || {
        FormatError::invalid_lamedb(format!(
            "invalid service descriptor '{descriptor}' in {origin}"
        ))
    };

    let parts: Vec<&str> = descriptor.trim().split(':').collect();
    if parts.len() < 6 {
        return Err(invalid());
    }
    let sid = parse_hex(parts[0]).ok_or_else(invalid)?;
    let namespace = parse_hex(parts[1]).ok_or_else(invalid)?;
    let tsid = parse_hex(parts[2]).ok_or_else(invalid)?;
    let onid = parse_hex(parts[3]).ok_or_else(invalid)?;
    let service_type = safe_int(parts[4]) as u32;

    let transponder_key = TransponderKey::new(namespace, tsid, onid).to_string();
    let mut service = Service {
        key: Service::key_for(&transponder_key, sid),
        name: clean_text(name_line),
        service_type,
        service_id: sid,
        transponder_key,
        original_network_id: onid,
        transport_stream_id: tsid,
        namespace,
        provider: None,
        caids: Vec::new(),
        is_radio: e2n_core::is_radio_type(service_type),
        extra: Default::default(),
    };

    let mut cas: Vec<&str> = Vec::new();
    for prop in properties {
        if let Some(provider) = prop.strip_prefix("p:") {
            service.provider = Some(clean_text(provider)).filter(|p| !p.is_empty());
        } else if let Some(ca) = prop.strip_prefix("c:") {
            cas.push(ca);
            if let Some(caid) = parse_hex(ca) {
                service.add_caid(caid);
            }
        } else if let Some(flags) = prop.strip_prefix("f:") {
            service.extra.insert("flags".into(), clean_text(flags));
        } else if let Some((key, value)) = prop.split_once(':') {
            if !key.is_empty() && key.chars().all(char::is_alphabetic) {
                service.extra.insert(key.to_string(), clean_text(value));
            }
        }
    }
    if !cas.is_empty() {
        service.extra.insert("cas".into(), cas.join(","));
    }
    Ok(service)
}

fn safe_int(value: &str) -> u64 {
    parse_int_auto(value).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Render a profile's transponders and services as a version 4 lamedb.
pub fn render_lamedb(profile: &Profile) -> String {
    let mut out = String::from("eDVB services /4/\ntransponders\n");

    let mut transponders: Vec<&Transponder> = profile.transponders.values().collect();
    transponders.sort_by_key(|t| (t.delivery.as_str(), t.namespace, t.transport_stream_id));
    for t in transponders {
        out.push_str(&format!(
            "{}\n\t{}\n/\n",
            TransponderKey::new(t.namespace, t.transport_stream_id, t.network_id),
            transponder_payload(t)
        ));
    }

    out.push_str("services\n");
    let mut services: Vec<&Service> = profile.services.values().collect();
    services.sort_by_key(|s| (s.namespace, s.transport_stream_id, s.service_id));
    for s in services {
        out.push_str(&format!(
            "{:04x}:{:08x}:{:04x}:{:04x}:{}:0\n",
            s.service_id, s.namespace, s.transport_stream_id, s.original_network_id, s.service_type
        ));
        out.push_str(&s.name);
        out.push('\n');
        if let Some(provider) = s.provider.as_deref().filter(|p| !p.is_empty()) {
            out.push_str(&format!("p:{provider}\n"));
        }
        for caid in &s.caids {
            out.push_str(&format!("c:{caid:06x}\n"));
        }
        out.push_str("/\n");
    }
    out.push_str("end\n");
    out
}

fn transponder_payload(t: &Transponder) -> String {
    let orbital = (t.orbital_position.unwrap_or(0.0) * 10.0).round() as i64;
    format!(
        "{} {}:{}:{}:{}:{}:2:0:{}:{}:0:0",
        t.delivery.lamedb_char(),
        t.frequency,
        t.symbol_rate.unwrap_or(0),
        polarization_to_code(t.polarization.as_deref()),
        t.fec.as_deref().unwrap_or("0"),
        orbital,
        t.system.as_deref().unwrap_or("0"),
        t.modulation.as_deref().unwrap_or("0"),
    )
}

#[cfg(test)]
#[path = "tests/lamedb_tests.rs"]
mod tests;
