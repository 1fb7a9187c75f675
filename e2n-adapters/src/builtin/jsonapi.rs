use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use e2n_core::keys::parse_int_auto;
use e2n_core::{
    Bouquet, BouquetCategory, BouquetEntry, Delivery, Profile, Service, Transponder, clean_text,
};
use serde_json::Value;

use crate::error::AdapterError;
use crate::util::{glob_files, read_lossy};
use crate::{Adapter, SourceConfig};

/// Generic JSON channel listings.
pub struct JsonApiAdapter;

const REQUIRED_FIELDS: &[&str] = &["name", "sid", "onid", "tsid", "namespace", "service_type"];

/// Resolve a `/a/0/b` pointer. An empty pointer is the payload itself.
pub fn apply_pointer<'a>(
    data: &'a Value,
    pointer: Option<&str>,
) -> Result<&'a Value, AdapterError> {
    let Some(pointer) = pointer.filter(|p| !p.is_empty()) else {
        return Ok(data);
    };
    if !pointer.starts_with('/') {
        return Err(AdapterError::parse("json_pointer must start with '/'"));
    }
    let mut current = data;
    for part in pointer.split('/').filter(|p| !p.is_empty()) {
        current = match current {
            Value::Object(map) => map.get(part),
            Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
        .ok_or_else(|| AdapterError::parse(format!("json pointer segment {part} not resolvable")))?;
    }
    Ok(current)
}

fn int_field(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => parse_int_auto(s),
        _ => None,
    }?;
    u32::try_from(n).ok()
}

/// Build a profile from the list the pointer resolves to.
pub fn parse_items(items: &[Value], config: &SourceConfig) -> Result<Profile, AdapterError> {
    let mapping = config.map("mapping");
    let field = |logical: &str| -> String {
        mapping.get(logical).cloned().unwrap_or_else(|| logical.to_string())
    };
    let delivery = config
        .str("delivery")
        .and_then(|d| d.parse().ok())
        .unwrap_or(Delivery::Cable);
    let config_provider = config.str("provider");

    let mut profile = Profile::new();
    let mut bouquet = Bouquet::new("All Channels", BouquetCategory::Tv);
    let mut seen: HashSet<String> = HashSet::new();

    for (idx, item) in items.iter().enumerate() {
        let index = idx + 1;
        let Value::Object(obj) = item else {
            log::debug!("jsonapi: item {index} is not an object, skipped");
            continue;
        };

        let mut ids: BTreeMap<&str, u32> = BTreeMap::new();
        for &logical in REQUIRED_FIELDS {
            let key = field(logical);
            let value = obj.get(&key).filter(|v| !v.is_null()).ok_or_else(|| {
                AdapterError::parse(format!("item {index}: missing required field '{key}'"))
            })?;
            if logical == "name" {
                continue;
            }
            let parsed = int_field(value).ok_or_else(|| {
                AdapterError::parse(format!("item {index}: field '{key}' is not an integer"))
            })?;
            ids.insert(logical, parsed);
        }
        let name = match obj.get(&field("name")) {
            Some(Value::String(s)) => clean_text(s),
            Some(other) => other.to_string(),
            None => format!("Channel {index}"),
        };

        let (sid, onid, tsid, namespace, service_type) = (
            ids["sid"],
            ids["onid"],
            ids["tsid"],
            ids["namespace"],
            ids["service_type"],
        );
        let mut t = Transponder::with_ids(delivery, index as u64, namespace, tsid, onid);
        t.extra.insert("source".into(), "jsonapi".into());

        let mut service = Service::new(&t, sid, service_type, name);
        if !seen.insert(service.identity()) {
            log::debug!("jsonapi: duplicate identity for item {index} ({}), skipped", service.name);
            continue;
        }
        service.provider = Some(
            obj.get("provider")
                .and_then(Value::as_str)
                .map(clean_text)
                .filter(|p| !p.is_empty())
                .or_else(|| config_provider.clone())
                .unwrap_or_else(|| "JSON API".to_string()),
        );

        if !profile.transponders.contains_key(&t.key) {
            profile.add_transponder(t);
        }
        bouquet.entries.push(BouquetEntry::for_service(&service));
        profile.add_service(service);
    }

    profile.bouquets.push(bouquet);
    Ok(profile)
}

impl Adapter for JsonApiAdapter {
    fn name(&self) -> &'static str {
        "jsonapi"
    }

    fn description(&self) -> &'static str {
        "JSON channel listings with configurable pointer and field mapping"
    }

    fn ingest(&self, source: &Path, config: &SourceConfig) -> Result<Vec<Profile>, AdapterError> {
        let payload_path = glob_files(source, "*.json")?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AdapterError::not_found(format!("no JSON payload found in {}", source.display()))
            })?;
        let payload: Value = serde_json::from_str(&read_lossy(&payload_path)?)?;

        let pointer = config.str("json_pointer");
        let items = apply_pointer(&payload, pointer.as_deref())?
            .as_array()
            .ok_or_else(|| {
                AdapterError::parse("jsonapi adapter expects list after pointer resolution")
            })?;

        let mut profile = parse_items(items, config)?;
        profile.set_meta("format", "jsonapi");
        profile.set_meta("profile_id", config.str_or("id", "jsonapi"));
        profile.set_meta("source_path", payload_path.display().to_string());
        profile.refresh_counts();
        Ok(vec![profile])
    }
}
