use std::collections::BTreeMap;
use std::path::Path;

use e2n_core::keys::{parse_hex, parse_int_auto};
use e2n_core::{
    Bouquet, BouquetCategory, BouquetEntry, Delivery, Profile, Service, ServiceRef, Transponder,
    TransponderKey, clean_opt, clean_text,
};
use e2n_formats::XmlNode;
use e2n_formats::zapit::read_zapit_file;

use crate::error::AdapterError;
use crate::{Adapter, SourceConfig};

/// Existing Neutrino `services.xml` + `bouquets.xml` pairs.
pub struct NeutrinoAdapter;

impl Adapter for NeutrinoAdapter {
    fn name(&self) -> &'static str {
        "neutrino"
    }

    fn description(&self) -> &'static str {
        "legacy Neutrino services.xml/bouquets.xml"
    }

    fn ingest(&self, source: &Path, _config: &SourceConfig) -> Result<Vec<Profile>, AdapterError> {
        let services_path = source.join("services.xml");
        let bouquets_path = source.join("bouquets.xml");
        if !services_path.is_file() || !bouquets_path.is_file() {
            return Err(AdapterError::not_found(format!(
                "neutrino adapter expects services.xml and bouquets.xml in {}",
                source.display()
            )));
        }

        let mut profile = parse_services(&read_zapit_file(&services_path)?);
        profile.bouquets = parse_bouquets(&read_zapit_file(&bouquets_path)?, &profile.transponders);
        profile.set_meta("format", "neutrino");
        profile.set_meta("profile_id", self.default_profile_id(source));
        profile.set_meta("source_path", source.display().to_string());
        profile.refresh_counts();
        Ok(vec![profile])
    }
}

fn decimal(node: &XmlNode, key: &str) -> Option<u32> {
    node.get_non_empty(key).and_then(|v| v.trim().parse().ok())
}

/// `0x`-prefixed values are hex, bare values decimal.
fn prefixed_int(value: &str) -> Option<u32> {
    let v = value.trim();
    if v.starts_with("0x") || v.starts_with("0X") {
        parse_hex(v)
    } else {
        v.parse().ok()
    }
}

/// Key from the `key` attribute, else derived from namespace/tsid/onid.
fn transponder_key(node: &XmlNode, group: &XmlNode) -> String {
    if let Some(key) = node.get_non_empty("key") {
        return key.to_string();
    }
    let namespace = node
        .get_non_empty("namespace")
        .or_else(|| group.get_non_empty("namespace"))
        .and_then(prefixed_int)
        .unwrap_or(0);
    TransponderKey::new(
        namespace,
        decimal(node, "tsid").unwrap_or(0),
        decimal(node, "onid").unwrap_or(0),
    )
    .to_string()
}

fn parse_transponder(node: &XmlNode, group: &XmlNode, delivery: Delivery) -> Transponder {
    let key = transponder_key(node, group);
    let typed = key.parse::<TransponderKey>().ok();

    let mut t = Transponder::new(
        key,
        delivery,
        node.get("frequency").and_then(|v| v.trim().parse().ok()).unwrap_or(0),
    );
    t.symbol_rate = node.get_non_empty("symbol_rate").and_then(|v| v.trim().parse().ok());
    t.polarization = node.get_non_empty("polarization").map(str::to_string);
    t.fec = node.get_non_empty("fec").map(str::to_string);
    t.system = node.get_non_empty("system").map(str::to_string);
    t.modulation = node.get_non_empty("modulation").map(str::to_string);
    t.orbital_position = group
        .get_non_empty("position")
        .or_else(|| node.get_non_empty("position"))
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|p| p.is_finite());
    t.network_id = decimal(node, "onid")
        .or(typed.map(|k| k.original_network_id))
        .unwrap_or(0);
    t.transport_stream_id = decimal(node, "tsid")
        .or(typed.map(|k| k.transport_stream_id))
        .unwrap_or(0);
    t.namespace = node
        .get_non_empty("namespace")
        .or_else(|| group.get_non_empty("namespace"))
        .and_then(parse_hex)
        .or(typed.map(|k| k.namespace))
        .unwrap_or(0);
    t.extra.insert(
        "display_name".into(),
        group.get("name").map(clean_text).unwrap_or_default(),
    );
    t
}

fn parse_service(node: &XmlNode, t: &Transponder) -> Service {
    let sid = decimal(node, "sid")
        .or_else(|| node.get_non_empty("id").and_then(parse_int_auto).map(|v| v as u32))
        .unwrap_or(0);
    let service_type = decimal(node, "type").unwrap_or(1);
    let name = clean_opt(node.get("name")).unwrap_or_else(|| format!("Service {sid}"));

    let mut s = Service::new(t, sid, service_type, name);
    s.original_network_id = decimal(node, "onid").unwrap_or(t.network_id);
    s.transport_stream_id = decimal(node, "tsid").unwrap_or(t.transport_stream_id);
    s.namespace = node.get_non_empty("namespace").and_then(parse_hex).unwrap_or(t.namespace);
    s.provider = clean_opt(node.get("provider"));
    s.is_radio = node.get("radio") == Some("1");
    s
}

fn parse_services(root: &XmlNode) -> Profile {
    let mut profile = Profile::new();
    for container in &root.children {
        let delivery = Delivery::from_container_tag(&container.name).unwrap_or(Delivery::Sat);
        for group in &container.children {
            for node in group.children_named("transponder") {
                let t = parse_transponder(node, group, delivery);
                for svc in node.children_named("service") {
                    profile.add_service(parse_service(svc, &t));
                }
                profile.add_transponder(t);
            }
        }
    }
    profile
}

fn parse_bouquets(root: &XmlNode, transponders: &BTreeMap<String, Transponder>) -> Vec<Bouquet> {
    // Channels without a reference are rebuilt against the first transponder's namespace.
    let fallback_namespace = transponders.values().next().map(|t| t.namespace).unwrap_or(0);

    root.children_named("bouquet")
        .map(|node| {
            let mut bouquet = Bouquet::new(
                node.get_non_empty("name").map(clean_text).unwrap_or_else(|| "Bouquet".into()),
                BouquetCategory::parse_lenient(node.get("category").unwrap_or("tv")),
            );
            for chan in node.children_named("channel") {
                let service_ref = match chan.get_non_empty("service_ref") {
                    Some(r) => r.to_string(),
                    None => ServiceRef {
                        service_type: 1,
                        service_id: decimal(chan, "sid").unwrap_or(0),
                        transport_stream_id: decimal(chan, "tsid").unwrap_or(0),
                        original_network_id: decimal(chan, "onid").unwrap_or(0),
                        namespace: fallback_namespace,
                    }
                    .to_string(),
                };
                bouquet.entries.push(BouquetEntry {
                    service_ref,
                    name: clean_opt(chan.get("name")),
                });
            }
            bouquet
        })
        .collect()
}
