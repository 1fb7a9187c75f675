//! Neutrino (zapit) writers: per-delivery output trees and scanfile tables.

pub mod auto_bouquets;
pub mod error;
pub mod groups;
pub mod names;
pub mod options;
pub mod scanfiles;
pub mod writer;

pub use auto_bouquets::generate_auto_bouquets;
pub use error::WriterError;
pub use groups::OutputGroup;
pub use names::{GroupName, NameResolver};
pub use options::{NameScheme, ScanfilePolicy, WriterOptions};
pub use scanfiles::{ScanfileWriteReport, write_scanfiles};
pub use writer::{WriteReport, WrittenGroup, write_outputs};
