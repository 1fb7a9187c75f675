//! File codecs for Enigma2 and Neutrino channel lists.

pub mod bouquets;
pub mod enigma;
pub mod error;
pub mod lamedb;
pub mod scanfile;
pub mod xml;
pub mod zapit;

pub use enigma::{load_profile, write_profile};
pub use error::FormatError;
pub use lamedb::{Lamedb, parse_lamedb, render_lamedb};
pub use xml::{XmlNode, escape_xml, parse_xml, parse_xml_file};
