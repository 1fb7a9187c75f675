//! Settings consumed by the writers.

use std::fmt;
use std::str::FromStr;

use e2n_core::Delivery;
use serde::{Deserialize, Serialize};

/// How group folders and display names are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameScheme {
    /// `Astra-19.2E`, provider names as published.
    #[default]
    Human,
    /// `S19.2E`, upper-case slugs.
    Code,
}

impl NameScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Code => "code",
        }
    }
}

impl fmt::Display for NameScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NameScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "code" => Ok(Self::Code),
            other => Err(format!("unknown name scheme '{other}' (expected human or code)")),
        }
    }
}

/// Output tree settings.
#[derive(Debug, Clone, PartialEq)]
pub struct WriterOptions {
    /// Zapit API version, 3 or 4.
    pub api_version: u8,
    /// Only bouquets whose name matches this regex are written.
    pub filter_bouquets: Option<String>,
    /// Delivery selectors (`S`, `C`, `T` or names). Empty selects all.
    pub include_types: Vec<String>,
    /// Satellite codes or folder names to keep. Empty keeps all.
    pub satellites: Vec<String>,
    /// `A+B` unions of satellite groups.
    pub combinations: Vec<String>,
    pub name_scheme: NameScheme,
    pub include_sat: bool,
    pub include_cable: bool,
    pub include_terrestrial: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            api_version: 4,
            filter_bouquets: None,
            include_types: Vec::new(),
            satellites: Vec::new(),
            combinations: Vec::new(),
            name_scheme: NameScheme::Human,
            include_sat: true,
            include_cable: true,
            include_terrestrial: true,
        }
    }
}

impl WriterOptions {
    /// Deliveries selected by `include_types`, or `None` when unrestricted.
    pub fn delivery_filter(&self) -> Option<Vec<Delivery>> {
        let selected: Vec<Delivery> = self
            .include_types
            .iter()
            .filter_map(|item| match item.parse() {
                Ok(d) => Some(d),
                Err(e) => {
                    log::warn!("ignoring include type: {e}");
                    None
                }
            })
            .collect();
        (!selected.is_empty()).then_some(selected)
    }

    /// Whether per-group folders of this delivery are written.
    pub fn includes(&self, delivery: Delivery) -> bool {
        match delivery {
            Delivery::Sat => self.include_sat,
            Delivery::Cable => self.include_cable,
            Delivery::Terrestrial => self.include_terrestrial,
        }
    }
}

/// Scanfile emission policy.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanfilePolicy {
    pub emit: bool,
    /// Empty or under-populated tables become errors instead of warnings.
    pub strict: bool,
    pub min_entries_cable: usize,
    pub min_entries_terrestrial: usize,
    pub min_entries_satellite: usize,
}

impl Default for ScanfilePolicy {
    fn default() -> Self {
        Self {
            emit: true,
            strict: false,
            min_entries_cable: 10,
            min_entries_terrestrial: 3,
            min_entries_satellite: 1,
        }
    }
}

impl ScanfilePolicy {
    pub fn minimum(&self, delivery: Delivery) -> usize {
        match delivery {
            Delivery::Sat => self.min_entries_satellite,
            Delivery::Cable => self.min_entries_cable,
            Delivery::Terrestrial => self.min_entries_terrestrial,
        }
    }
}
