//! Typed accessors for the string-encoded composite keys.
//!
//! Keys stay opaque `String`s inside the model so they survive round-trips
//! through every file format unchanged. Code that needs the individual ids
//! goes through [`TransponderKey`] and [`ServiceRef`] instead of splitting
//! strings by hand.

use std::fmt;
use std::str::FromStr;

use crate::error::KeyError;

/// The `(namespace, tsid, onid)` triple identifying a transponder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransponderKey {
    pub namespace: u32,
    pub transport_stream_id: u32,
    pub original_network_id: u32,
}

impl TransponderKey {
    pub fn new(namespace: u32, transport_stream_id: u32, original_network_id: u32) -> Self {
        Self {
            namespace,
            transport_stream_id,
            original_network_id,
        }
    }
}

impl fmt::Display for TransponderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x}:{:04x}:{:04x}",
            self.namespace, self.transport_stream_id, self.original_network_id
        )
    }
}

impl FromStr for TransponderKey {
    type Err = KeyError;

    /// Parses `ns:tsid:onid` in hex, as found on lamedb key lines.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() < 3 {
            return Err(KeyError::transponder(s));
        }
        let namespace = parse_hex(parts[0]).ok_or_else(|| KeyError::transponder(s))?;
        let tsid = parse_hex(parts[1]).ok_or_else(|| KeyError::transponder(s))?;
        let onid = parse_hex(parts[2]).ok_or_else(|| KeyError::transponder(s))?;
        Ok(Self::new(namespace, tsid, onid))
    }
}

/// Positional service reference used in bouquet files.
///
/// Layout: `1:0:{type}:{sid}:{tsid}:{onid}:{namespace}:0:0:0:` with every id
/// in hex. The service type is written in decimal and read back with
/// [`parse_int_auto`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceRef {
    pub service_type: u32,
    pub service_id: u32,
    pub transport_stream_id: u32,
    pub original_network_id: u32,
    pub namespace: u32,
}

impl ServiceRef {
    /// Service key (`ns:tsid:onid:sid`) this reference resolves to.
    pub fn service_key(&self) -> String {
        format!(
            "{}:{:04x}",
            TransponderKey::new(self.namespace, self.transport_stream_id, self.original_network_id),
            self.service_id
        )
    }
}

impl fmt::Display for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "1:0:{}:{:04x}:{:04x}:{:04x}:{:08x}:0:0:0:",
            self.service_type,
            self.service_id,
            self.transport_stream_id,
            self.original_network_id,
            self.namespace
        )
    }
}

impl FromStr for ServiceRef {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() < 7 {
            return Err(KeyError::service_ref(s));
        }
        let service_type = parse_int_auto(parts[2])
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| KeyError::service_ref(s))?;
        let service_id = parse_hex(parts[3]).ok_or_else(|| KeyError::service_ref(s))?;
        let tsid = parse_hex(parts[4]).ok_or_else(|| KeyError::service_ref(s))?;
        let onid = parse_hex(parts[5]).ok_or_else(|| KeyError::service_ref(s))?;
        let namespace = parse_hex(parts[6]).ok_or_else(|| KeyError::service_ref(s))?;
        Ok(Self {
            service_type,
            service_id,
            transport_stream_id: tsid,
            original_network_id: onid,
            namespace,
        })
    }
}

/// Map a bouquet service reference back to the service key it names.
///
/// References with fewer than seven fields are returned unchanged. Hex
/// fields are re-padded so `C00000` and `00c00000` resolve to the same key;
/// non-hex fields are kept lowercase as written.
pub fn service_ref_to_key(service_ref: &str) -> String {
    let parts: Vec<&str> = service_ref.split(':').collect();
    if parts.len() < 7 {
        return service_ref.to_string();
    }
    let sid = parse_hex(parts[3]).unwrap_or(0);
    match (parse_hex(parts[6]), parse_hex(parts[4]), parse_hex(parts[5])) {
        (Some(ns), Some(tsid), Some(onid)) => {
            format!("{}:{:04x}", TransponderKey::new(ns, tsid, onid), sid)
        }
        _ => format!(
            "{}:{}:{}:{:04x}",
            parts[6].to_lowercase(),
            parts[4].to_lowercase(),
            parts[5].to_lowercase(),
            sid
        ),
    }
}

/// Parse a bare hex field (optional `0x` prefix).
pub fn parse_hex(value: &str) -> Option<u32> {
    let v = value.trim();
    let v = v
        .strip_prefix("0x")
        .or_else(|| v.strip_prefix("0X"))
        .unwrap_or(v);
    if v.is_empty() {
        return None;
    }
    u32::from_str_radix(v, 16).ok()
}

/// Parse an integer the way loosely formatted sources write them.
///
/// Values carrying `0x` or any hex letter are read as hex, everything else as
/// decimal. Unparseable input yields `None`.
pub fn parse_int_auto(value: &str) -> Option<u64> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    let lower = v.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        return u64::from_str_radix(hex, 16).ok();
    }
    if lower.chars().any(|c| ('a'..='f').contains(&c)) {
        return u64::from_str_radix(&lower, 16).ok();
    }
    lower.parse().ok()
}
