//! Category catalog for channel classification.
//!
//! The built-in tables are compiled into an immutable [`Catalog`] once per
//! process; override files and display-name maps are read by [`load`].

pub mod catalog;
pub mod load;
pub mod types;

pub use catalog::{
    Catalog, CatalogError, CatalogSpec, OTHERS, RESOLUTION_HD, RESOLUTION_SD, RESOLUTION_UHD,
};
pub use load::{LoadError, load_catalog, load_name_map, load_overrides};
pub use types::*;
