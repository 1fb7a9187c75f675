//! Conversion options and the TOML settings file they can be stored in.

use std::fs;
use std::path::{Path, PathBuf};

use e2n_zapit::{NameScheme, ScanfilePolicy, WriterOptions};
use serde::{Deserialize, Serialize};

use crate::error::ConvertError;
use crate::normalize::NormalizeOptions;
use crate::validate::Thresholds;

/// Every knob of a conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    pub api_version: u8,
    pub filter_bouquets: Option<String>,
    pub include_types: Vec<String>,
    pub satellites: Vec<String>,
    pub combinations: Vec<String>,
    pub name_scheme: NameScheme,
    pub name_map_path: Option<PathBuf>,
    pub include_sat: bool,
    pub include_cable: bool,
    pub include_terrestrial: bool,
    pub fail_on_warn: bool,
    /// Implies `fail_on_warn`.
    pub strict: bool,
    pub abort_on_empty: bool,
    pub min_services_sat: usize,
    pub min_services_cable: usize,
    pub min_services_terrestrial: usize,
    pub include_stale: bool,
    pub stale_after_days: i64,
    pub emit_scanfiles: bool,
    pub scanfile_providers: Vec<String>,
    pub scanfile_regions: Vec<String>,
    pub expected_providers: Vec<String>,
    pub expected_regions: Vec<String>,
    pub strict_scanfiles: bool,
    pub min_scanfile_entries_cable: usize,
    pub min_scanfile_entries_terrestrial: usize,
    pub min_scanfile_entries_satellite: usize,
    /// Directory holding category override files.
    pub catalog_dir: Option<PathBuf>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            api_version: 4,
            filter_bouquets: None,
            include_types: Vec::new(),
            satellites: Vec::new(),
            combinations: Vec::new(),
            name_scheme: NameScheme::Human,
            name_map_path: None,
            include_sat: true,
            include_cable: true,
            include_terrestrial: true,
            fail_on_warn: false,
            strict: false,
            abort_on_empty: false,
            min_services_sat: 50,
            min_services_cable: 20,
            min_services_terrestrial: 20,
            include_stale: false,
            stale_after_days: 120,
            emit_scanfiles: true,
            scanfile_providers: Vec::new(),
            scanfile_regions: Vec::new(),
            expected_providers: Vec::new(),
            expected_regions: Vec::new(),
            strict_scanfiles: false,
            min_scanfile_entries_cable: 10,
            min_scanfile_entries_terrestrial: 3,
            min_scanfile_entries_satellite: 1,
            catalog_dir: None,
        }
    }
}

impl ConversionOptions {
    /// Whether validation warnings abort the run.
    pub fn escalates_warnings(&self) -> bool {
        self.strict || self.fail_on_warn
    }

    pub fn writer_options(&self) -> WriterOptions {
        WriterOptions {
            api_version: self.api_version,
            filter_bouquets: self.filter_bouquets.clone(),
            include_types: self.include_types.clone(),
            satellites: self.satellites.clone(),
            combinations: self.combinations.clone(),
            name_scheme: self.name_scheme,
            include_sat: self.include_sat,
            include_cable: self.include_cable,
            include_terrestrial: self.include_terrestrial,
        }
    }

    pub fn scanfile_policy(&self) -> ScanfilePolicy {
        ScanfilePolicy {
            emit: self.emit_scanfiles,
            strict: self.strict_scanfiles,
            min_entries_cable: self.min_scanfile_entries_cable,
            min_entries_terrestrial: self.min_scanfile_entries_terrestrial,
            min_entries_satellite: self.min_scanfile_entries_satellite,
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            sat: self.min_services_sat,
            cable: self.min_services_cable,
            terrestrial: self.min_services_terrestrial,
        }
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            providers: self.scanfile_providers.clone(),
            regions: self.scanfile_regions.clone(),
            expected_providers: self.expected_providers.clone(),
            expected_regions: self.expected_regions.clone(),
        }
    }
}

/// Default settings file: `~/.config/e2n/settings.toml`.
pub fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("e2n").join("settings.toml")
}

/// Load options from `path`, or from [`settings_path`] when `None`.
///
/// A missing default file yields the built-in defaults; a missing explicit
/// file is an error.
pub fn load_settings(path: Option<&Path>) -> Result<ConversionOptions, ConvertError> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (settings_path(), false),
    };
    if !path.is_file() {
        if explicit {
            return Err(ConvertError::config(format!("settings file {} not found", path.display())));
        }
        return Ok(ConversionOptions::default());
    }
    let contents = fs::read_to_string(&path)?;
    let options: ConversionOptions = toml::from_str(&contents)
        .map_err(|e| ConvertError::config(format!("{}: {e}", path.display())))?;
    log::debug!("loaded settings from {}", path.display());
    Ok(options)
}

/// Split comma-separated list arguments and drop blanks.
pub fn split_list<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.as_ref().split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_settings_keep_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.toml");
        fs::write(
            &path,
            "api_version = 3\nname_scheme = \"code\"\ncombinations = [\"S19.2E+S13E\"]\n",
        )
        .unwrap();

        let options = load_settings(Some(&path)).unwrap();
        assert_eq!(options.api_version, 3);
        assert_eq!(options.name_scheme, NameScheme::Code);
        assert_eq!(options.combinations, vec!["S19.2E+S13E"]);
        assert_eq!(options.stale_after_days, 120);
        assert!(options.emit_scanfiles);
        assert_eq!(options.writer_options().api_version, 3);
    }

    #[test]
    fn test_missing_explicit_settings() {
        let tmp = TempDir::new().unwrap();
        let err = load_settings(Some(&tmp.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConvertError::Config(_)));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(&["S, C", "", "T"]), vec!["S", "C", "T"]);
    }

    #[test]
    fn test_strict_implies_fail_on_warn() {
        let options = ConversionOptions {
            strict: true,
            ..Default::default()
        };
        assert!(options.escalates_warnings());
        assert_eq!(options.scanfile_policy().min_entries_cable, 10);
    }

    #[test]
    fn test_thresholds_follow_options() {
        let options = ConversionOptions {
            min_services_cable: 5,
            ..Default::default()
        };
        let t = options.thresholds();
        assert_eq!((t.sat, t.cable, t.terrestrial), (50, 5, 20));
    }
}
