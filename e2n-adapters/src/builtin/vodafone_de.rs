use std::path::Path;

use e2n_core::Profile;

use crate::error::AdapterError;
use crate::{Adapter, AdapterBundle, SourceConfig};

pub const VODAFONE_BLOCKED_MESSAGE: &str = "provider_vodafone_de is blocked: Vodafone publishes no \
    official DVB-C frequency table with MHz/Symbolrate/Modulation. Provide an authorised frequency \
    source before enabling.";

/// Placeholder for Vodafone Germany cable. Always refuses to run.
pub struct VodafoneDeAdapter;

impl Adapter for VodafoneDeAdapter {
    fn name(&self) -> &'static str {
        "provider_vodafone_de"
    }

    fn description(&self) -> &'static str {
        "Vodafone DE cable (blocked: no official frequency table)"
    }

    fn scan_only(&self) -> bool {
        true
    }

    fn ingest(&self, _source: &Path, _config: &SourceConfig) -> Result<Vec<Profile>, AdapterError> {
        Err(AdapterError::Blocked(VODAFONE_BLOCKED_MESSAGE.to_string()))
    }

    fn ingest_bundle(
        &self,
        _source: &Path,
        _config: &SourceConfig,
    ) -> Result<AdapterBundle, AdapterError> {
        Err(AdapterError::Blocked(VODAFONE_BLOCKED_MESSAGE.to_string()))
    }
}
