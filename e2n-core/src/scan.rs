//! Transponder scan records and the grouped bundle the scanfile writers consume.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::delivery::Delivery;
use crate::model::Extra;

/// A provider/region-scoped raw transponder record.
///
/// Independent of [`Profile`](crate::Profile); produced by scan-only adapters
/// and by the scan JSON loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransponderScanEntry {
    /// `DVB-C`, `DVB-T2`, `CABLE`, ...
    pub delivery_system: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub frequency_hz: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol_rate: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth_hz: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modulation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polarization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plp_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default)]
    pub last_seen: String,
    #[serde(default)]
    pub source_provenance: String,
    #[serde(default)]
    pub extras: Extra,
}

impl TransponderScanEntry {
    pub fn new(delivery_system: impl Into<String>, frequency_hz: u64) -> Self {
        Self {
            delivery_system: delivery_system.into(),
            system: None,
            frequency_hz,
            symbol_rate: None,
            bandwidth_hz: None,
            modulation: None,
            fec: None,
            polarization: None,
            plp_id: None,
            country: None,
            provider: None,
            region: None,
            last_seen: String::new(),
            source_provenance: String::new(),
            extras: Extra::new(),
        }
    }

    /// Delivery class derived from the delivery system string.
    pub fn delivery_class(&self) -> Option<Delivery> {
        delivery_class(&self.delivery_system)
    }

    /// Symbol rate for cable/satellite, bandwidth for terrestrial, 0 if neither.
    pub fn rate_or_bandwidth(&self) -> u64 {
        self.symbol_rate.or(self.bandwidth_hz).unwrap_or(0)
    }
}

/// Classify a delivery system string.
///
/// `DVB-C*`/`CABLE` are cable, `DVB-T*`/`TERRESTRIAL` terrestrial and
/// `DVB-S*`/`SAT`/`SATELLITE` satellite. Anything else is unsupported.
pub fn delivery_class(delivery_system: &str) -> Option<Delivery> {
    let upper = delivery_system.trim().to_ascii_uppercase();
    if upper.starts_with("DVB-C") || upper == "CABLE" {
        Some(Delivery::Cable)
    } else if upper.starts_with("DVB-T") || upper == "TERRESTRIAL" {
        Some(Delivery::Terrestrial)
    } else if upper.starts_with("DVB-S") || upper == "SAT" || upper == "SATELLITE" {
        Some(Delivery::Sat)
    } else {
        None
    }
}

/// Why one scan entry replaced another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DedupReason {
    NewerLastSeen,
    OlderLastSeen,
    MoreMetadata,
    StableOrder,
}

impl DedupReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewerLastSeen => "newer-last-seen",
            Self::OlderLastSeen => "older-last-seen",
            Self::MoreMetadata => "more-metadata",
            Self::StableOrder => "stable-order",
        }
    }
}

/// A resolved scan-identity collision.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanDedupDecision {
    pub identity: String,
    pub kept: TransponderScanEntry,
    pub dropped: TransponderScanEntry,
    pub reason: DedupReason,
}

/// Normalized scan entries, grouped for the three scanfile tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanfileBundle {
    /// Keyed by provider.
    pub cable: BTreeMap<String, Vec<TransponderScanEntry>>,
    /// Keyed by region.
    pub terrestrial: BTreeMap<String, Vec<TransponderScanEntry>>,
    /// Keyed by region, falling back to provider.
    pub satellite: BTreeMap<String, Vec<TransponderScanEntry>>,
    /// Source provenance per class (`cable`, `terrestrial`, `satellite`,
    /// `ignored`) and group.
    pub provenance: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl ScanfileBundle {
    pub fn groups(&self, delivery: Delivery) -> &BTreeMap<String, Vec<TransponderScanEntry>> {
        match delivery {
            Delivery::Sat => &self.satellite,
            Delivery::Cable => &self.cable,
            Delivery::Terrestrial => &self.terrestrial,
        }
    }

    pub fn counts(&self, delivery: Delivery) -> BTreeMap<String, usize> {
        self.groups(delivery)
            .iter()
            .map(|(name, entries)| (name.clone(), entries.len()))
            .collect()
    }

    pub fn total(&self, delivery: Delivery) -> usize {
        self.groups(delivery).values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        Delivery::all().iter().all(|d| self.total(*d) == 0)
    }
}
