//! The conversion driver: native profile in, Neutrino tree out.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use e2n_catalog::{NameMap, load_catalog, load_name_map};
use e2n_core::{Delivery, Profile};
use e2n_formats::load_profile;
use e2n_zapit::{ScanfileWriteReport, WriteReport, write_outputs, write_scanfiles};

use crate::classify::apply_category_bouquets;
use crate::dedup::deduplicate_profile;
use crate::error::ConvertError;
use crate::freshness::ensure_fresh;
use crate::normalize::{ScanNormalization, normalize_scan_entries};
use crate::options::ConversionOptions;
use crate::progress::{ConvertProgress, SilentProgress};
use crate::qa::{QaReport, write_qa_reports};
use crate::scan_load::load_scan_entries;
use crate::validate::{
    ProfileStats, assert_minimums, assert_no_dupes, assert_output_schema, validate_profile,
};

pub const STRICT_MESSAGE: &str = "validation produced warnings; aborting due to strict mode";

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub profile: Profile,
    /// Every non-fatal finding, in the order it was raised.
    pub warnings: Vec<String>,
    pub output_path: PathBuf,
    pub written: WriteReport,
    pub scanfiles: Option<ScanfileWriteReport>,
}

pub fn convert(
    input: &Path,
    output: &Path,
    options: &ConversionOptions,
) -> Result<ConversionResult, ConvertError> {
    convert_with_progress(input, output, options, &SilentProgress)
}

/// Run the full pipeline, reporting stages to `progress`.
///
/// A failed run may leave a partially written `output`.
pub fn convert_with_progress(
    input: &Path,
    output: &Path,
    options: &ConversionOptions,
    progress: &dyn ConvertProgress,
) -> Result<ConversionResult, ConvertError> {
    progress.on_stage(&format!("Loading {}", input.display()));
    let mut profile = load_profile(input)?;
    adopt_buildinfo(input, &mut profile)?;
    if profile.meta("profile_id").is_none() {
        let id = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".into());
        profile.set_meta("profile_id", id);
    }

    ensure_fresh(&mut profile, options.stale_after_days, options.include_stale)?;

    progress.on_stage("Deduplicating services");
    let dedup = deduplicate_profile(&mut profile);

    progress.on_stage("Classifying services");
    let catalog = load_catalog(options.catalog_dir.as_deref())?;
    apply_category_bouquets(&mut profile, &catalog);

    let report = validate_profile(&profile);
    let mut warnings = report.warnings.clone();
    if options.escalates_warnings() && !warnings.is_empty() {
        return Err(ConvertError::validation(STRICT_MESSAGE));
    }
    assert_no_dupes(&report.duplicates)?;

    let thresholds = options.thresholds();
    if options.abort_on_empty {
        let active: BTreeSet<Delivery> =
            profile.transponders.values().map(|t| t.delivery).collect();
        assert_minimums(&report.stats, &thresholds, &active)?;
    }

    profile.set_meta("stats", serde_json::to_string(&report.stats)?);
    profile.set_meta("thresholds", serde_json::to_string(&thresholds)?);

    let name_map = match &options.name_map_path {
        Some(path) => load_name_map(path)?,
        None => NameMap::default(),
    };

    progress.on_stage(&format!("Writing {}", output.display()));
    fs::create_dir_all(output)?;
    let written = write_outputs(&profile, output, &options.writer_options(), &name_map)?;
    for (i, group) in written.groups.iter().enumerate() {
        progress.on_group(i + 1, written.groups.len(), &group.display_name);
    }

    let scanfiles = if options.emit_scanfiles {
        progress.on_stage("Writing scanfiles");
        emit_scanfiles(input, output, options, &mut profile, &mut warnings)?
    } else {
        profile.set_meta("scanfiles", serde_json::json!({"enabled": false}).to_string());
        None
    };

    progress.on_stage("Validating output");
    let expected = written.master().map_or(0, |m| m.service_count);
    assert_output_schema(output, expected)?;

    let stats = ProfileStats::of(&profile);
    let qa = QaReport::new(&profile, stats, thresholds, &dedup, &warnings);
    write_qa_reports(output, &qa, &dedup)?;

    progress.on_complete(&format!(
        "conversion completed with {} warnings -> {}",
        warnings.len(),
        output.display()
    ));
    Ok(ConversionResult {
        profile,
        warnings,
        output_path: output.to_path_buf(),
        written,
        scanfiles,
    })
}

/// Take the stamped source metadata of an ingested profile from the
/// `BUILDINFO.json` beside its `enigma2/` directory.
fn adopt_buildinfo(input: &Path, profile: &mut Profile) -> Result<(), ConvertError> {
    let Some(path) = input.parent().map(|p| p.join("BUILDINFO.json")) else {
        return Ok(());
    };
    if !path.is_file() {
        return Ok(());
    }
    let info: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    for key in INGEST_KEYS {
        if let Some(value) = info.get(*key).and_then(serde_json::Value::as_str) {
            profile.metadata.entry(key.to_string()).or_insert_with(|| value.to_string());
        }
    }
    log::debug!("adopted ingest metadata from {}", path.display());
    Ok(())
}

const INGEST_KEYS: &[&str] = &[
    "source_id",
    "profile_id",
    "source_priority",
    "source_provenance",
    "fetched_at",
];

/// Load, normalize and write scanfiles. Writer errors are fatal only under
/// `strict_scanfiles`.
fn emit_scanfiles(
    input: &Path,
    output: &Path,
    options: &ConversionOptions,
    profile: &mut Profile,
    warnings: &mut Vec<String>,
) -> Result<Option<ScanfileWriteReport>, ConvertError> {
    let load = load_scan_entries(input);
    warnings.extend(load.warnings);
    let normalization = normalize_scan_entries(load.entries, &options.normalize_options());
    warnings.extend(normalization.warnings.iter().cloned());

    let report = match write_scanfiles(&normalization.bundle, output, &options.scanfile_policy()) {
        Ok(report) => {
            warnings.extend(report.warnings.iter().cloned());
            Some(report)
        }
        Err(e) if options.strict_scanfiles => return Err(e.into()),
        Err(e) => {
            log::warn!("scanfiles: {e}");
            warnings.push(format!("scanfiles: {e}"));
            None
        }
    };
    record_scan_metadata(profile, &normalization, report.as_ref());
    Ok(report)
}

fn record_scan_metadata(
    profile: &mut Profile,
    normalization: &ScanNormalization,
    report: Option<&ScanfileWriteReport>,
) {
    let bundle = &normalization.bundle;
    let mut meta = serde_json::json!({
        "counts": {
            "cable": bundle.counts(Delivery::Cable),
            "terrestrial": bundle.counts(Delivery::Terrestrial),
            "satellite": bundle.counts(Delivery::Sat),
        },
        "warnings": normalization.warnings,
        "deduplicated": normalization
            .deduplicated
            .iter()
            .map(|d| serde_json::json!({"identity": d.identity, "reason": d.reason.as_str()}))
            .collect::<Vec<_>>(),
    });
    if let (Some(report), Some(map)) = (report, meta.as_object_mut()) {
        let outputs: serde_json::Map<String, serde_json::Value> = report
            .output_paths
            .iter()
            .map(|(k, p)| (k.clone(), p.display().to_string().into()))
            .collect();
        map.insert("outputs".into(), outputs.into());
        map.insert("cable_counts".into(), serde_json::json!(report.cable_counts));
        map.insert("terrestrial_counts".into(), serde_json::json!(report.terrestrial_counts));
        map.insert("writer_warnings".into(), serde_json::json!(report.warnings));
    }
    profile.set_meta("scanfiles", meta.to_string());
}
