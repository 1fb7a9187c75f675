//! Canonical channel-list model shared by every reader and writer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::delivery::Delivery;
use crate::keys::{ServiceRef, TransponderKey};

/// Free-form string attributes carried alongside the typed fields.
pub type Extra = BTreeMap<String, String>;

/// One physical multiplex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transponder {
    /// Opaque key, normally `ns:tsid:onid` in lowercase hex.
    pub key: String,
    pub delivery: Delivery,
    /// Frequency as carried by the source (kHz for lamedb).
    pub frequency: u64,
    pub symbol_rate: Option<u64>,
    pub polarization: Option<String>,
    pub fec: Option<String>,
    pub system: Option<String>,
    pub modulation: Option<String>,
    /// Orbital position in degrees, negative for west. Satellite only.
    pub orbital_position: Option<f64>,
    pub network_id: u32,
    pub transport_stream_id: u32,
    pub namespace: u32,
    pub extra: Extra,
}

impl Transponder {
    /// Create a transponder with only the identifying fields set.
    pub fn new(key: impl Into<String>, delivery: Delivery, frequency: u64) -> Self {
        Self {
            key: key.into(),
            delivery,
            frequency,
            symbol_rate: None,
            polarization: None,
            fec: None,
            system: None,
            modulation: None,
            orbital_position: None,
            network_id: 0,
            transport_stream_id: 0,
            namespace: 0,
            extra: Extra::new(),
        }
    }

    /// Create a transponder keyed by its `(namespace, tsid, onid)` triple.
    pub fn with_ids(
        delivery: Delivery,
        frequency: u64,
        namespace: u32,
        tsid: u32,
        onid: u32,
    ) -> Self {
        let key = TransponderKey::new(namespace, tsid, onid).to_string();
        let mut t = Self::new(key, delivery, frequency);
        t.namespace = namespace;
        t.transport_stream_id = tsid;
        t.network_id = onid;
        t
    }

    /// Parsed form of the key, when it follows the hex triple layout.
    pub fn typed_key(&self) -> Option<TransponderKey> {
        self.key.parse().ok()
    }
}

/// One channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// `{transponder_key}:{sid:04x}`
    pub key: String,
    pub name: String,
    pub service_type: u32,
    pub service_id: u32,
    pub transponder_key: String,
    pub original_network_id: u32,
    pub transport_stream_id: u32,
    pub namespace: u32,
    pub provider: Option<String>,
    /// Conditional-access system ids, in source order without repeats.
    pub caids: Vec<u32>,
    pub is_radio: bool,
    pub extra: Extra,
}

impl Service {
    pub fn new(
        transponder: &Transponder,
        service_id: u32,
        service_type: u32,
        name: impl Into<String>,
    ) -> Self {
        Self {
            key: Self::key_for(&transponder.key, service_id),
            name: name.into(),
            service_type,
            service_id,
            transponder_key: transponder.key.clone(),
            original_network_id: transponder.network_id,
            transport_stream_id: transponder.transport_stream_id,
            namespace: transponder.namespace,
            provider: None,
            caids: Vec::new(),
            is_radio: is_radio_type(service_type),
            extra: Extra::new(),
        }
    }

    pub fn key_for(transponder_key: &str, service_id: u32) -> String {
        format!("{}:{:04x}", transponder_key, service_id)
    }

    /// Add a conditional-access id unless already present.
    pub fn add_caid(&mut self, caid: u32) {
        if !self.caids.contains(&caid) {
            self.caids.push(caid);
        }
    }

    pub fn is_encrypted(&self) -> bool {
        !self.caids.is_empty()
    }

    /// Provider with surrounding whitespace removed, `None` when blank.
    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    /// Positional reference used by bouquet files.
    pub fn service_ref(&self) -> ServiceRef {
        ServiceRef {
            service_type: self.service_type,
            service_id: self.service_id,
            transport_stream_id: self.transport_stream_id,
            original_network_id: self.original_network_id,
            namespace: self.namespace,
        }
    }

    /// Cross-source dedup identity: SHA-1 over `onid:tsid:sid:namespace:type`.
    pub fn identity(&self) -> String {
        service_identity(
            self.original_network_id,
            self.transport_stream_id,
            self.service_id,
            self.namespace,
            self.service_type,
        )
    }
}

/// Radio services use DVB service types 2 (digital radio) and 10 (advanced codec radio).
pub fn is_radio_type(service_type: u32) -> bool {
    matches!(service_type, 2 | 10)
}

pub fn service_identity(
    onid: u32,
    tsid: u32,
    sid: u32,
    namespace: u32,
    service_type: u32,
) -> String {
    let raw = format!("{onid}:{tsid}:{sid}:{namespace}:{service_type}");
    let digest = Sha1::digest(raw.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// One line of a bouquet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BouquetEntry {
    pub service_ref: String,
    /// Display-name override (`#DESCRIPTION`).
    pub name: Option<String>,
}

impl BouquetEntry {
    pub fn new(service_ref: impl Into<String>) -> Self {
        Self {
            service_ref: service_ref.into(),
            name: None,
        }
    }

    pub fn for_service(service: &Service) -> Self {
        Self {
            service_ref: service.service_ref().to_string(),
            name: Some(service.name.clone()),
        }
    }

    /// Service key this entry points at, if the reference is well formed.
    pub fn service_key(&self) -> String {
        crate::keys::service_ref_to_key(&self.service_ref)
    }
}

/// TV or radio bouquet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BouquetCategory {
    #[default]
    Tv,
    Radio,
}

impl BouquetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tv => "tv",
            Self::Radio => "radio",
        }
    }

    /// Anything other than `radio` is treated as TV.
    pub fn parse_lenient(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("radio") {
            Self::Radio
        } else {
            Self::Tv
        }
    }
}

impl std::fmt::Display for BouquetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, ordered list of channel references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bouquet {
    pub name: String,
    pub entries: Vec<BouquetEntry>,
    pub category: BouquetCategory,
    /// File name the bouquet was read from, kept for round-tripping.
    pub source_path: Option<String>,
}

impl Bouquet {
    pub fn new(name: impl Into<String>, category: BouquetCategory) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            category,
            source_path: None,
        }
    }

    pub fn from_services<'a>(
        name: impl Into<String>,
        category: BouquetCategory,
        services: impl IntoIterator<Item = &'a Service>,
    ) -> Self {
        let mut bouquet = Self::new(name, category);
        bouquet.entries = services.into_iter().map(BouquetEntry::for_service).collect();
        bouquet
    }
}

/// The aggregate handed between pipeline stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub services: BTreeMap<String, Service>,
    pub transponders: BTreeMap<String, Transponder>,
    pub bouquets: Vec<Bouquet>,
    pub metadata: BTreeMap<String, String>,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_transponder(&mut self, transponder: Transponder) {
        self.transponders.insert(transponder.key.clone(), transponder);
    }

    pub fn add_service(&mut self, service: Service) {
        self.services.insert(service.key.clone(), service);
    }

    pub fn transponder_for(&self, service: &Service) -> Option<&Transponder> {
        self.transponders.get(&service.transponder_key)
    }

    /// Services whose transponder uses the given delivery medium.
    pub fn services_by_delivery(&self, delivery: Delivery) -> Vec<&Service> {
        self.services
            .values()
            .filter(|s| self.transponder_for(s).is_some_and(|t| t.delivery == delivery))
            .collect()
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Refresh the `service_count`/`transponder_count`/`bouquet_count` metadata.
    pub fn refresh_counts(&mut self) {
        self.set_meta("service_count", self.services.len().to_string());
        self.set_meta("transponder_count", self.transponders.len().to_string());
        self.set_meta("bouquet_count", self.bouquets.len().to_string());
    }
}
