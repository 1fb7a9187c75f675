//! Canonical channel-list model and the static tables shared by every
//! reader, writer, and pipeline stage.

pub mod codes;
pub mod delivery;
pub mod error;
pub mod keys;
pub mod model;
pub mod scan;
pub mod text;

pub use delivery::{Delivery, DeliveryParseError};
pub use error::KeyError;
pub use keys::{ServiceRef, TransponderKey, service_ref_to_key};
pub use model::{
    Bouquet, BouquetCategory, BouquetEntry, Extra, Profile, Service, Transponder, is_radio_type,
    service_identity,
};
pub use scan::{
    DedupReason, ScanDedupDecision, ScanfileBundle, TransponderScanEntry, delivery_class,
};
pub use text::{clean_opt, clean_text, slugify};
