//! Scanfile tables (`satellites.xml`, `cable.xml`, `terrestrial.xml`).
//!
//! Every DVB parameter is written as the integer code from
//! [`e2n_core::codes`]; frequencies are written in kHz.

use std::collections::BTreeMap;

use e2n_core::codes::{
    bandwidth_to_code, fec_to_code, guard_interval_to_code, hierarchy_to_code,
    modulation_to_code, polarization_to_code, system_to_code, transmission_mode_to_code,
};
use e2n_core::{Delivery, TransponderScanEntry};

use crate::xml::XmlNode;

/// File name of the table for a delivery medium.
pub fn file_name(delivery: Delivery) -> &'static str {
    match delivery {
        Delivery::Sat => "satellites.xml",
        Delivery::Cable => "cable.xml",
        Delivery::Terrestrial => "terrestrial.xml",
    }
}

/// Root element of the table.
pub fn root_tag(delivery: Delivery) -> &'static str {
    match delivery {
        Delivery::Sat => "satellites",
        Delivery::Cable => "cable",
        Delivery::Terrestrial => "terrestrial",
    }
}

/// Per-provider/region group element.
pub fn group_tag(delivery: Delivery) -> &'static str {
    match delivery {
        Delivery::Sat => "sat",
        Delivery::Cable => "provider",
        Delivery::Terrestrial => "region",
    }
}

/// Extras consumed as coded terrestrial attributes rather than copied through.
const TERRESTRIAL_CODED_EXTRAS: &[&str] = &["transmission_mode", "guard_interval", "hierarchy"];

/// Extras holding a satellite's orbital position.
const POSITION_EXTRAS: &[&str] = &["orbital_position", "position"];

/// Render the table for one delivery medium. Groups are written in key order.
pub fn render_scanfile(
    delivery: Delivery,
    groups: &BTreeMap<String, Vec<TransponderScanEntry>>,
) -> String {
    let mut root = XmlNode::new(root_tag(delivery));
    for (name, entries) in groups {
        let group = root.push(group_node(delivery, name, entries));
        for entry in entries {
            group.push(match delivery {
                Delivery::Sat => satellite_transponder(entry),
                Delivery::Cable => cable_transponder(entry),
                Delivery::Terrestrial => terrestrial_transponder(entry),
            });
        }
    }
    root.to_document()
}

fn group_node(delivery: Delivery, name: &str, entries: &[TransponderScanEntry]) -> XmlNode {
    let mut node = XmlNode::new(group_tag(delivery)).attr("name", name);
    if delivery == Delivery::Sat {
        node.set_attr("position", satellite_position_tenths(name, entries).to_string());
        node.set_attr("diseqc", "0");
        return node;
    }
    if let Some(first) = entries.first() {
        if let Some(country) = first.country.as_deref().filter(|c| !c.is_empty()) {
            node.set_attr("country", country);
        }
        if !first.delivery_system.is_empty() {
            node.set_attr("delivery_system", &first.delivery_system);
        }
    }
    node
}

fn satellite_transponder(entry: &TransponderScanEntry) -> XmlNode {
    let node = XmlNode::new("transponder")
        .attr("frequency", format_frequency_khz(entry.frequency_hz))
        .attr("symbol_rate", entry.symbol_rate.unwrap_or(0).to_string())
        .attr("polarization", polarization_to_code(entry.polarization.as_deref()).to_string())
        .attr("fec_inner", fec_to_code(entry.fec.as_deref()).to_string())
        .attr("system", system_to_code(entry_system(entry)).to_string())
        .attr(
            "modulation",
            modulation_to_code(entry.modulation.as_deref(), Delivery::Sat).to_string(),
        );
    with_extras(node, entry, POSITION_EXTRAS)
}

fn cable_transponder(entry: &TransponderScanEntry) -> XmlNode {
    let node = XmlNode::new("transponder")
        .attr("frequency", format_frequency_khz(entry.frequency_hz))
        .attr("symbol_rate", entry.symbol_rate.unwrap_or(0).to_string())
        .attr(
            "modulation",
            modulation_to_code(entry.modulation.as_deref(), Delivery::Cable).to_string(),
        )
        .attr("fec_inner", fec_to_code(entry.fec.as_deref()).to_string())
        .attr("system", system_to_code(entry_system(entry)).to_string());
    with_extras(node, entry, &[])
}

fn terrestrial_transponder(entry: &TransponderScanEntry) -> XmlNode {
    let extra = |key: &str| entry.extras.get(key).map(String::as_str);
    let mut node = XmlNode::new("transponder")
        .attr("frequency", format_frequency_khz(entry.frequency_hz))
        .attr("bandwidth", bandwidth_to_code(entry.bandwidth_hz).to_string())
        .attr(
            "constellation",
            modulation_to_code(entry.modulation.as_deref(), Delivery::Terrestrial).to_string(),
        )
        .attr("code_rate_hp", fec_to_code(entry.fec.as_deref()).to_string())
        .attr(
            "transmission_mode",
            transmission_mode_to_code(extra("transmission_mode")).to_string(),
        )
        .attr("guard_interval", guard_interval_to_code(extra("guard_interval")).to_string())
        .attr("hierarchy", hierarchy_to_code(extra("hierarchy")).to_string())
        .attr("system", system_to_code(entry_system(entry)).to_string());
    if let Some(plp) = entry.plp_id {
        node.set_attr("plp_id", plp.to_string());
    }
    with_extras(node, entry, TERRESTRIAL_CODED_EXTRAS)
}

/// The finer system string, falling back to the delivery system.
fn entry_system(entry: &TransponderScanEntry) -> Option<&str> {
    entry.system.as_deref().or_else(|| {
        Some(entry.delivery_system.as_str()).filter(|d| d.to_ascii_uppercase().starts_with("DVB-"))
    })
}

/// Append extras in key order, never overriding a coded attribute.
fn with_extras(mut node: XmlNode, entry: &TransponderScanEntry, skip: &[&str]) -> XmlNode {
    for (key, value) in &entry.extras {
        if skip.contains(&key.as_str()) || node.get(key).is_some() {
            continue;
        }
        node.set_attr(key, value);
    }
    node
}

/// Hz to a kHz string: integral values plainly, otherwise up to three decimals.
pub fn format_frequency_khz(hz: u64) -> String {
    if hz == 0 {
        return "0".to_string();
    }
    if hz % 1_000 == 0 {
        return (hz / 1_000).to_string();
    }
    let text = format!("{:.3}", hz as f64 / 1_000.0);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Orbital position in tenths of a degree, east positive.
///
/// Read from an `orbital_position`/`position` extra (degrees) on the first
/// entry, else from a `19.2E`-style token in the group name, else 0.
pub fn satellite_position_tenths(name: &str, entries: &[TransponderScanEntry]) -> i64 {
    let from_extras = entries.first().and_then(|e| {
        POSITION_EXTRAS
            .iter()
            .find_map(|k| e.extras.get(*k))
            .and_then(|v| parse_position(v))
    });
    from_extras.or_else(|| parse_position(name)).unwrap_or(0)
}

fn parse_position(text: &str) -> Option<i64> {
    if let Ok(degrees) = text.trim().parse::<f64>() {
        return degrees.is_finite().then(|| (degrees * 10.0).round() as i64);
    }
    let separator = |c: char| c.is_whitespace() || matches!(c, '-' | '_' | '(' | ')');
    for token in text.split(separator) {
        let token = token.trim_matches('°');
        let upper = token.to_ascii_uppercase();
        let (number, west) = if let Some(n) = upper.strip_suffix('E') {
            (n.trim_end_matches('°'), false)
        } else if let Some(n) = upper.strip_suffix('W') {
            (n.trim_end_matches('°'), true)
        } else {
            (upper.as_str(), false)
        };
        if let Some(degrees) = number.parse::<f64>().ok().filter(|d| d.is_finite()) {
            let tenths = (degrees * 10.0).round() as i64;
            return Some(if west { -tenths } else { tenths });
        }
    }
    None
}

#[cfg(test)]
#[path = "tests/scanfile_tests.rs"]
mod tests;
