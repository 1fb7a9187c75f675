//! Profile consistency checks and post-write structural checks.
//!
//! Pre-write findings are warnings; the caller decides whether they escalate.
//! Post-write failures are always [`ConvertError::Schema`].

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use e2n_core::codes::max_code;
use e2n_core::{Delivery, Profile};
use e2n_formats::scanfile::{file_name, group_tag, root_tag};
use e2n_formats::{XmlNode, parse_xml_file};
use serde::Serialize;

use crate::error::ConvertError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProfileStats {
    pub total_services: usize,
    pub sat_services: usize,
    pub cable_services: usize,
    pub terrestrial_services: usize,
    pub radio_services: usize,
    pub bouquet_count: usize,
}

impl ProfileStats {
    pub fn of(profile: &Profile) -> Self {
        let mut stats = Self {
            total_services: profile.services.len(),
            bouquet_count: profile.bouquets.len(),
            ..Self::default()
        };
        for service in profile.services.values() {
            match profile.transponder_for(service).map(|t| t.delivery) {
                Some(Delivery::Sat) => stats.sat_services += 1,
                Some(Delivery::Cable) => stats.cable_services += 1,
                Some(Delivery::Terrestrial) => stats.terrestrial_services += 1,
                None => {}
            }
            if service.is_radio {
                stats.radio_services += 1;
            }
        }
        stats
    }

    pub fn for_delivery(&self, delivery: Delivery) -> usize {
        match delivery {
            Delivery::Sat => self.sat_services,
            Delivery::Cable => self.cable_services,
            Delivery::Terrestrial => self.terrestrial_services,
        }
    }
}

/// Minimum service counts per delivery; 0 disables a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Thresholds {
    pub sat: usize,
    pub cable: usize,
    pub terrestrial: usize,
}

impl Thresholds {
    pub fn get(&self, delivery: Delivery) -> usize {
        match delivery {
            Delivery::Sat => self.sat,
            Delivery::Cable => self.cable,
            Delivery::Terrestrial => self.terrestrial,
        }
    }
}

/// Two services sharing an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateRecord {
    pub identity: String,
    pub first: String,
    pub second: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub warnings: Vec<String>,
    pub stats: ProfileStats,
    pub duplicates: Vec<DuplicateRecord>,
}

pub fn validate_profile(profile: &Profile) -> ValidationReport {
    let mut warnings = Vec::new();
    if profile.services.is_empty() {
        warnings.push("profile contains no services".to_string());
    }
    if profile.transponders.is_empty() {
        warnings.push("profile contains no transponders".to_string());
    }
    for service in profile.services.values() {
        if !profile.transponders.contains_key(&service.transponder_key) {
            warnings.push(format!(
                "service {} references unknown transponder {}",
                service.name, service.transponder_key
            ));
        }
    }

    let mut seen: HashMap<String, &str> = HashMap::new();
    let mut duplicates = Vec::new();
    for service in profile.services.values() {
        let identity = service.identity();
        match seen.get(&identity) {
            Some(first) => duplicates.push(DuplicateRecord {
                identity,
                first: first.to_string(),
                second: service.name.clone(),
            }),
            None => {
                seen.insert(identity, &service.name);
            }
        }
    }
    if !duplicates.is_empty() {
        warnings.push(format!("detected {} duplicate service identities", duplicates.len()));
    }

    for warning in &warnings {
        log::warn!("validation: {warning}");
    }
    ValidationReport {
        warnings,
        stats: ProfileStats::of(profile),
        duplicates,
    }
}

/// Fail when an active delivery has fewer services than its threshold.
pub fn assert_minimums(
    stats: &ProfileStats,
    thresholds: &Thresholds,
    active: &BTreeSet<Delivery>,
) -> Result<(), ConvertError> {
    let errors: Vec<String> = Delivery::all()
        .iter()
        .filter(|d| active.contains(*d))
        .filter_map(|&d| {
            let minimum = thresholds.get(d);
            let count = stats.for_delivery(d);
            (minimum > 0 && count < minimum)
                .then(|| format!("{d} services {count} below minimum {minimum}"))
        })
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConvertError::validation(errors.join("; ")))
    }
}

pub fn assert_no_dupes(duplicates: &[DuplicateRecord]) -> Result<(), ConvertError> {
    if duplicates.is_empty() {
        return Ok(());
    }
    let details: Vec<&str> = duplicates.iter().take(5).map(|d| d.identity.as_str()).collect();
    Err(ConvertError::validation(format!(
        "duplicate service identities remain: {}",
        details.join(", ")
    )))
}

fn read_table(path: &Path, label: &str) -> Result<XmlNode, ConvertError> {
    if !path.is_file() {
        return Err(ConvertError::schema(format!("missing {label} at {}", path.display())));
    }
    parse_xml_file(path).map_err(|e| ConvertError::schema(format!("{label}: {e}")))
}

/// Re-read the root tables and every scanfile present under `dir`.
pub fn assert_output_schema(dir: &Path, expected_services: usize) -> Result<(), ConvertError> {
    let services = read_table(&dir.join("services.xml"), "services.xml")?;
    if services.name != "zapit" {
        return Err(ConvertError::schema("services.xml root element must be <zapit>"));
    }
    let found = services.count_descendants("service");
    if found != expected_services {
        return Err(ConvertError::schema(format!(
            "services.xml contains {found} services, expected {expected_services}"
        )));
    }

    let bouquets = read_table(&dir.join("bouquets.xml"), "bouquets.xml")?;
    if bouquets.name != "zapit" {
        return Err(ConvertError::schema("bouquets.xml root element must be <zapit>"));
    }
    if bouquets.children_named("bouquet").next().is_none() {
        return Err(ConvertError::schema("bouquets.xml contains no <bouquet> entries"));
    }
    let unreferenced = bouquets
        .children_named("bouquet")
        .flat_map(|b| b.children_named("channel"))
        .any(|c| c.get_non_empty("service_ref").is_none());
    if unreferenced {
        return Err(ConvertError::schema("bouquets.xml contains channel without service_ref"));
    }

    validate_scanfiles(dir)
}

/// Coded attributes each table carries, checked against their code tables.
fn coded_attributes(delivery: Delivery) -> &'static [&'static str] {
    match delivery {
        Delivery::Sat => &["polarization", "fec_inner", "system", "modulation"],
        Delivery::Cable => &["modulation", "fec_inner", "system"],
        Delivery::Terrestrial => &[
            "bandwidth",
            "constellation",
            "code_rate_hp",
            "transmission_mode",
            "guard_interval",
            "hierarchy",
            "system",
        ],
    }
}

/// Structural check of every scanfile table present under `dir`.
pub fn validate_scanfiles(dir: &Path) -> Result<(), ConvertError> {
    for &delivery in Delivery::all() {
        let path = dir.join(file_name(delivery));
        if path.exists() {
            let root = read_table(&path, file_name(delivery))?;
            check_scanfile(delivery, &root).map_err(|msg| {
                ConvertError::schema(format!(
                    "{} failed schema validation: {msg}",
                    file_name(delivery)
                ))
            })?;
        }
    }
    Ok(())
}

fn check_scanfile(delivery: Delivery, root: &XmlNode) -> Result<(), String> {
    if root.name != root_tag(delivery) {
        return Err(format!("root element must be <{}>", root_tag(delivery)));
    }
    let groups: Vec<&XmlNode> = root.children_named(group_tag(delivery)).collect();
    if groups.is_empty() {
        return Err(format!("no <{}> entries", group_tag(delivery)));
    }
    for (g, group) in groups.iter().enumerate() {
        let name = group
            .get_non_empty("name")
            .ok_or_else(|| format!("{}[{g}] has no name", group_tag(delivery)))?;
        let transponders: Vec<&XmlNode> = group.children_named("transponder").collect();
        if transponders.is_empty() {
            return Err(format!("{name} has no transponders"));
        }
        for (t, transponder) in transponders.iter().enumerate() {
            let at = format!("{name}.transponder[{t}]");
            let frequency = transponder
                .get("frequency")
                .and_then(|f| f.parse::<f64>().ok())
                .ok_or_else(|| format!("{at}.frequency is missing or not a number"))?;
            if frequency <= 0.0 {
                return Err(format!("{at}.frequency must be positive"));
            }
            for attribute in coded_attributes(delivery) {
                let Some(raw) = transponder.get(attribute) else {
                    return Err(format!("{at}.{attribute} is missing"));
                };
                let code: u8 = raw
                    .parse()
                    .map_err(|_| format!("{at}.{attribute} is not a small integer: {raw}"))?;
                if let Some(max) = max_code(attribute, delivery) {
                    if code > max {
                        return Err(format!("{at}.{attribute} {code} exceeds {max}"));
                    }
                }
            }
            if let Some(raw) = transponder.get("plp_id") {
                match raw.parse::<i64>() {
                    Ok(plp) if plp >= 0 => {}
                    _ => return Err(format!("{at}.plp_id must be a non-negative integer")),
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/validate_tests.rs"]
mod tests;
