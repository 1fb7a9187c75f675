//! The conversion pipeline: Enigma2 profile directories in, Neutrino zapit
//! trees out.
//!
//! This crate owns the freshness gate, service deduplication and profile
//! merging, category classification, scan entry loading and normalization,
//! validation, QA reports and file-source ingest.

pub mod classify;
pub mod convert;
pub mod dedup;
pub mod error;
pub mod freshness;
pub mod ingest;
pub mod normalize;
pub mod options;
pub mod progress;
pub mod qa;
pub mod scan_load;
pub mod validate;

pub use classify::apply_category_bouquets;
pub use convert::{ConversionResult, STRICT_MESSAGE, convert, convert_with_progress};
pub use dedup::{DedupRecord, deduplicate_profile, deduplicate_services, merge_profiles};
pub use error::{ConvertError, ErrorKind};
pub use freshness::{Freshness, ensure_fresh, parse_timestamp};
pub use ingest::{IngestConfig, IngestResult, ingest, ingest_file};
pub use normalize::{NormalizeOptions, ScanNormalization, normalize_scan_entries};
pub use options::{ConversionOptions, load_settings, settings_path, split_list};
pub use progress::{ConvertProgress, LogProgress, SilentProgress};
pub use qa::{QaReport, write_qa_reports};
pub use scan_load::{ScanLoad, load_scan_entries};
pub use validate::{ProfileStats, Thresholds, ValidationReport, validate_profile};
