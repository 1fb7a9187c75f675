//! Scanfile tables written from a normalized [`ScanfileBundle`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use e2n_core::{Delivery, ScanfileBundle};
use e2n_formats::scanfile::{file_name, render_scanfile};

use crate::error::WriterError;
use crate::options::ScanfilePolicy;

/// What [`write_scanfiles`] wrote, with per-group entry counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanfileWriteReport {
    pub cable_counts: BTreeMap<String, usize>,
    pub terrestrial_counts: BTreeMap<String, usize>,
    pub satellite_counts: BTreeMap<String, usize>,
    /// Keyed by `cable`, `terrestrial` or `satellite`.
    pub output_paths: BTreeMap<String, PathBuf>,
    pub warnings: Vec<String>,
}

impl ScanfileWriteReport {
    fn warn(&mut self, message: String) {
        log::warn!("scanfiles: {message}");
        self.warnings.push(message);
    }
}

fn class_name(delivery: Delivery) -> &'static str {
    match delivery {
        Delivery::Sat => "satellite",
        Delivery::Cable => "cable",
        Delivery::Terrestrial => "terrestrial",
    }
}

fn group_noun(delivery: Delivery) -> &'static str {
    match delivery {
        Delivery::Sat => "satellite",
        Delivery::Cable => "provider",
        Delivery::Terrestrial => "region",
    }
}

/// Write `cable.xml`, `terrestrial.xml` and (when satellite groups exist)
/// `satellites.xml` into `target_dir`.
///
/// Empty cable or terrestrial tables and groups below their minimum are
/// warnings, or errors under [`ScanfilePolicy::strict`].
pub fn write_scanfiles(
    bundle: &ScanfileBundle,
    target_dir: &Path,
    policy: &ScanfilePolicy,
) -> Result<ScanfileWriteReport, WriterError> {
    let mut report = ScanfileWriteReport {
        cable_counts: bundle.counts(Delivery::Cable),
        terrestrial_counts: bundle.counts(Delivery::Terrestrial),
        satellite_counts: bundle.counts(Delivery::Sat),
        ..Default::default()
    };

    if !policy.emit {
        report.warn("scanfile emission disabled by CLI option".into());
        return Ok(report);
    }
    fs::create_dir_all(target_dir)?;

    for delivery in [Delivery::Cable, Delivery::Terrestrial, Delivery::Sat] {
        let groups = bundle.groups(delivery);
        if groups.is_empty() {
            if delivery == Delivery::Sat {
                continue;
            }
            let file = file_name(delivery);
            report.warn(format!("no {} available for {file}", match delivery {
                Delivery::Cable => "cable providers",
                _ => "terrestrial regions",
            }));
            if policy.strict {
                return Err(WriterError::scanfile(format!(
                    "strict scanfile mode: {file} would be empty"
                )));
            }
            continue;
        }
        let path = target_dir.join(file_name(delivery));
        fs::write(&path, render_scanfile(delivery, groups))?;
        log::info!("scanfiles: wrote {} ({} groups)", path.display(), groups.len());
        report.output_paths.insert(class_name(delivery).into(), path);
    }

    enforce_minimums(bundle, policy, &mut report)?;
    Ok(report)
}

fn enforce_minimums(
    bundle: &ScanfileBundle,
    policy: &ScanfilePolicy,
    report: &mut ScanfileWriteReport,
) -> Result<(), WriterError> {
    for delivery in [Delivery::Cable, Delivery::Terrestrial, Delivery::Sat] {
        let minimum = policy.minimum(delivery);
        for (name, entries) in bundle.groups(delivery) {
            if entries.len() >= minimum {
                continue;
            }
            let message = format!(
                "{} {name} has {} {} entries, below {}minimum {minimum}",
                group_noun(delivery),
                entries.len(),
                class_name(delivery),
                if policy.strict { "strict " } else { "" },
            );
            if policy.strict {
                return Err(WriterError::Scanfile(message));
            }
            report.warn(message);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/scanfiles_tests.rs"]
mod tests;
