//! Neutrino output tree: the master bundle at the root, one folder per
//! delivery group and one per satellite combination.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use e2n_catalog::NameMap;
use e2n_core::{Delivery, Profile};
use e2n_formats::zapit::{render_bouquets_xml, render_services_xml};
use regex::Regex;
use serde_json::Value;

use crate::error::WriterError;
use crate::groups::{
    OutputGroup, build_groups, filter_bouquets, filter_services, merge_bouquets, sort_services,
};
use crate::names::NameResolver;
use crate::options::WriterOptions;

/// One folder written by [`write_outputs`].
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenGroup {
    pub path: PathBuf,
    pub display_name: String,
    pub category: String,
    pub service_count: usize,
    pub bouquet_count: usize,
}

/// Everything [`write_outputs`] produced, master bundle first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteReport {
    pub groups: Vec<WrittenGroup>,
}

impl WriteReport {
    pub fn master(&self) -> Option<&WrittenGroup> {
        self.groups.iter().find(|g| g.category == "all")
    }
}

/// Render `profile` into `out_dir`.
pub fn write_outputs(
    profile: &Profile,
    out_dir: &Path,
    options: &WriterOptions,
    name_map: &NameMap,
) -> Result<WriteReport, WriterError> {
    if !matches!(options.api_version, 3 | 4) {
        return Err(WriterError::ApiVersion(options.api_version));
    }
    fs::create_dir_all(out_dir)?;

    let filter = options
        .filter_bouquets
        .as_deref()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| WriterError::InvalidFilter {
                pattern: pattern.to_string(),
                source,
            })
        })
        .transpose()?;
    let resolver = NameResolver::new(options.name_scheme, name_map.clone());

    let selected = filter_services(profile, options);
    let groups = build_groups(profile, &selected, &resolver, options, filter.as_ref());

    let mut master_services = selected.clone();
    sort_services(&mut master_services);
    let master = OutputGroup {
        key: "all".into(),
        display_name: "All".into(),
        delivery: None,
        transponders: selected
            .iter()
            .filter_map(|s| profile.transponder_for(s))
            .map(|t| (t.key.clone(), t.clone()))
            .collect(),
        bouquets: filter_bouquets(&profile.bouquets, &master_services, filter.as_ref()),
        services: master_services,
        metadata: BTreeMap::from([("display_name".to_string(), "All".to_string())]),
    };

    let mut report = WriteReport::default();
    report
        .groups
        .push(write_group(&master, out_dir, options.api_version, &profile.metadata)?);

    for group in &groups {
        let Some(delivery) = group.delivery else {
            continue;
        };
        if !options.includes(delivery) {
            log::debug!("skipping {} (delivery disabled)", group.key);
            continue;
        }
        let path = out_dir.join(delivery.as_str()).join(&group.display_name);
        report
            .groups
            .push(write_group(group, &path, options.api_version, &profile.metadata)?);
    }

    for combined in combination_groups(&options.combinations, &groups) {
        let path = out_dir.join(Delivery::Sat.as_str()).join(&combined.display_name);
        report
            .groups
            .push(write_group(&combined, &path, options.api_version, &profile.metadata)?);
    }

    log::info!("wrote {} output folders under {}", report.groups.len(), out_dir.display());
    Ok(report)
}

/// Union satellite groups named by `A+B` combinations (display name or code).
fn combination_groups<'a>(
    combinations: &[String],
    groups: &[OutputGroup<'a>],
) -> Vec<OutputGroup<'a>> {
    let satellites: Vec<&OutputGroup<'a>> = groups
        .iter()
        .filter(|g| g.delivery == Some(Delivery::Sat))
        .collect();
    if combinations.is_empty() || satellites.is_empty() {
        return Vec::new();
    }

    let mut by_name: BTreeMap<&str, &OutputGroup<'a>> = BTreeMap::new();
    for &group in &satellites {
        by_name.insert(group.display_name.as_str(), group);
        if let Some(code) = group.metadata.get("satellite_code") {
            by_name.insert(code.as_str(), group);
        }
    }

    let mut sorted: Vec<&String> = combinations.iter().collect();
    sorted.sort();

    let mut out = Vec::new();
    for combo in sorted {
        let selected: Vec<&OutputGroup<'a>> = combo
            .split('+')
            .filter_map(|part| by_name.get(part.trim()).copied())
            .collect();
        if selected.is_empty() {
            log::warn!("combo '{combo}' matches no satellite group");
            continue;
        }

        let mut services = Vec::new();
        let mut transponders = BTreeMap::new();
        let mut bouquets = Vec::new();
        for group in selected {
            services.extend(group.services.iter().copied());
            transponders.extend(group.transponders.clone());
            bouquets.extend(group.bouquets.iter().cloned());
        }
        sort_services(&mut services);

        out.push(OutputGroup {
            key: format!("combo:{combo}"),
            display_name: combo.replace(' ', ""),
            delivery: Some(Delivery::Sat),
            services,
            transponders,
            bouquets: merge_bouquets(bouquets),
            metadata: BTreeMap::from([("display_name".to_string(), combo.clone())]),
        });
    }
    out
}

/// Write `services.xml`, `bouquets.xml` and `BUILDINFO.json` for one group.
pub fn write_group(
    group: &OutputGroup<'_>,
    path: &Path,
    api_version: u8,
    profile_metadata: &BTreeMap<String, String>,
) -> Result<WrittenGroup, WriterError> {
    fs::create_dir_all(path)?;

    let services_xml = render_services_xml(
        api_version,
        &group.services,
        &group.transponders,
        &group.display_names(),
    );
    fs::write(path.join("services.xml"), services_xml)?;
    fs::write(
        path.join("bouquets.xml"),
        render_bouquets_xml(&group.bouquets, &group.services),
    )?;

    let display_name = group
        .metadata
        .get("display_name")
        .cloned()
        .unwrap_or_else(|| group.display_name.clone());
    let mut buildinfo: BTreeMap<String, Value> = profile_metadata
        .iter()
        .chain(&group.metadata)
        .map(|(key, value)| (key.clone(), Value::from(value.as_str())))
        .collect();
    // group figures take precedence over profile-wide metadata of the same name
    buildinfo.insert("display_name".into(), Value::from(display_name.clone()));
    buildinfo.insert("category".into(), Value::from(group.category()));
    buildinfo.insert("api_version".into(), Value::from(api_version));
    buildinfo.insert("service_count".into(), Value::from(group.services.len()));
    buildinfo.insert("bouquet_count".into(), Value::from(group.bouquets.len()));
    fs::write(path.join("BUILDINFO.json"), serde_json::to_string_pretty(&buildinfo)?)?;

    log::debug!(
        "{}: {} services, {} bouquets -> {}",
        group.key,
        group.services.len(),
        group.bouquets.len(),
        path.display()
    );
    Ok(WrittenGroup {
        path: path.to_path_buf(),
        display_name,
        category: group.category().to_string(),
        service_count: group.services.len(),
        bouquet_count: group.bouquets.len(),
    })
}
