//! Source adapters: turn fetched raw material into canonical profiles or
//! transponder scan entries.

use std::collections::BTreeMap;
use std::path::Path;

use e2n_core::{Profile, TransponderScanEntry};

pub mod builtin;
pub mod config;
pub mod error;
pub mod registry;
pub(crate) mod util;

pub use config::SourceConfig;
pub use error::AdapterError;
pub use registry::AdapterRegistry;

/// Everything one ingest run of a source produced.
#[derive(Debug, Clone, Default)]
pub struct AdapterBundle {
    pub profiles: Vec<Profile>,
    pub scan_entries: Vec<TransponderScanEntry>,
    pub extra_metadata: BTreeMap<String, serde_json::Value>,
}

impl AdapterBundle {
    pub fn from_profiles(profiles: Vec<Profile>) -> Self {
        Self {
            profiles,
            ..Self::default()
        }
    }
}

/// Trait for ingesting one kind of source.
///
/// Profile-producing adapters implement [`Adapter::ingest`]; scan-only
/// adapters return no profiles from it and override
/// [`Adapter::ingest_bundle`] instead.
pub trait Adapter: Send + Sync {
    /// Name used in source configs.
    fn name(&self) -> &'static str;

    /// One-line description for listings.
    fn description(&self) -> &'static str;

    /// Parse the material under `source` into profiles.
    fn ingest(&self, source: &Path, config: &SourceConfig) -> Result<Vec<Profile>, AdapterError>;

    /// Profiles plus scan entries and adapter metadata.
    fn ingest_bundle(
        &self,
        source: &Path,
        config: &SourceConfig,
    ) -> Result<AdapterBundle, AdapterError> {
        Ok(AdapterBundle::from_profiles(self.ingest(source, config)?))
    }

    /// Whether the adapter only ever emits scan entries.
    fn scan_only(&self) -> bool {
        false
    }

    /// Profile id used when the source does not name one.
    fn default_profile_id(&self, source: &Path) -> String {
        source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name().to_string())
    }
}
