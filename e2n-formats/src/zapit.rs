//! Neutrino zapit `services.xml` and `bouquets.xml`.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use e2n_core::{Bouquet, Delivery, Service, Transponder};

use crate::error::FormatError;
use crate::xml::{XmlNode, parse_xml_file};

/// Render `services.xml`.
///
/// Services are emitted in the given order. Containers and groups appear in
/// order of first use; each transponder gets its own group element named by
/// `display_names` (falling back to the transponder key).
pub fn render_services_xml(
    api_version: u8,
    services: &[&Service],
    transponders: &BTreeMap<String, Transponder>,
    display_names: &HashMap<String, String>,
) -> String {
    let mut root = XmlNode::new("zapit").attr("api", api_version.to_string());
    let mut containers: Vec<Delivery> = Vec::new();

    for service in services {
        let Some(t) = transponders.get(&service.transponder_key) else {
            log::warn!(
                "service {} has no transponder {}, skipped",
                service.key,
                service.transponder_key
            );
            continue;
        };

        let c_idx = match containers.iter().position(|d| *d == t.delivery) {
            Some(idx) => idx,
            None => {
                containers.push(t.delivery);
                root.push(XmlNode::new(t.delivery.container_tag()));
                containers.len() - 1
            }
        };
        let container = &mut root.children[c_idx];

        let g_idx = match container
            .children
            .iter()
            .position(|g| g.get("key") == Some(t.key.as_str()))
        {
            Some(idx) => idx,
            None => {
                container.push(group_node(t, display_names));
                container.children.len() - 1
            }
        };
        let group = &mut container.children[g_idx];
        if group.children.is_empty() {
            group.push(transponder_node(t));
        }
        group.children[0].push(service_node(service));
    }
    root.to_document()
}

fn group_node(t: &Transponder, display_names: &HashMap<String, String>) -> XmlNode {
    let name = display_names.get(&t.key).map(String::as_str).unwrap_or(&t.key);
    let mut node = XmlNode::new(t.delivery.group_tag())
        .attr("key", &t.key)
        .attr("name", name)
        .attr("namespace", format!("0x{:08x}", t.namespace));
    if t.delivery == Delivery::Sat {
        if let Some(pos) = t.orbital_position {
            node.set_attr("position", format_position(pos));
        }
    }
    node
}

fn transponder_node(t: &Transponder) -> XmlNode {
    XmlNode::new("transponder")
        .attr("key", &t.key)
        .attr("frequency", t.frequency.to_string())
        .attr("symbol_rate", t.symbol_rate.unwrap_or(0).to_string())
        .attr("polarization", t.polarization.as_deref().unwrap_or_default())
        .attr("fec", t.fec.as_deref().unwrap_or_default())
        .attr("system", t.system.as_deref().unwrap_or_default())
        .attr("modulation", t.modulation.as_deref().unwrap_or_default())
}

fn service_node(s: &Service) -> XmlNode {
    let mut node = XmlNode::new("service")
        .attr("id", format!("0x{:04x}", s.service_id))
        .attr("sid", s.service_id.to_string())
        .attr("name", &s.name)
        .attr("type", s.service_type.to_string())
        .attr("provider", s.provider.as_deref().unwrap_or_default())
        .attr("onid", s.original_network_id.to_string())
        .attr("tsid", s.transport_stream_id.to_string())
        .attr("namespace", format!("0x{:08x}", s.namespace));
    if s.is_radio {
        node.set_attr("radio", "1");
    }
    node
}

/// Orbital position with one decimal, trailing zeros and dot removed.
pub fn format_position(position: f64) -> String {
    let text = format!("{position:.1}");
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Render `bouquets.xml`. Entries that do not resolve to one of `services`
/// are left out.
pub fn render_bouquets_xml(bouquets: &[Bouquet], services: &[&Service]) -> String {
    let index: HashMap<&str, &Service> = services.iter().map(|s| (s.key.as_str(), *s)).collect();
    let mut root = XmlNode::new("zapit");
    for bouquet in bouquets {
        let node = root.push(
            XmlNode::new("bouquet")
                .attr("name", &bouquet.name)
                .attr("category", bouquet.category.as_str()),
        );
        for entry in &bouquet.entries {
            let Some(svc) = index.get(entry.service_key().as_str()) else {
                continue;
            };
            node.push(
                XmlNode::new("channel")
                    .attr("service_ref", &entry.service_ref)
                    .attr("name", entry.name.as_deref().unwrap_or(&svc.name))
                    .attr("service_name", &svc.name)
                    .attr("provider", svc.provider.as_deref().unwrap_or_default())
                    .attr("sid", svc.service_id.to_string())
                    .attr("onid", svc.original_network_id.to_string())
                    .attr("tsid", svc.transport_stream_id.to_string()),
            );
        }
    }
    root.to_document()
}

/// Read a zapit document and check its root element.
pub fn read_zapit_file(path: &Path) -> Result<XmlNode, FormatError> {
    let root = parse_xml_file(path)?;
    if root.name != "zapit" {
        return Err(FormatError::invalid_xml(format!(
            "{}: expected <zapit> root, found <{}>",
            path.display(),
            root.name
        )));
    }
    Ok(root)
}

/// Service elements of a parsed `services.xml`, with their delivery medium.
pub fn service_elements(root: &XmlNode) -> Vec<(Delivery, &XmlNode)> {
    let mut out = Vec::new();
    for container in &root.children {
        let delivery = Delivery::from_container_tag(&container.name).unwrap_or(Delivery::Sat);
        for group in &container.children {
            for transponder in group.children_named("transponder") {
                out.extend(transponder.children_named("service").map(|s| (delivery, s)));
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "tests/zapit_tests.rs"]
mod tests;
