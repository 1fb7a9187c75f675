//! Loading of category override files and display-name maps.
//!
//! An override directory may contain any of the four JSON files below; a
//! missing directory or file simply contributes nothing.

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::catalog::{Catalog, CatalogError};
use crate::types::{CatalogOverrides, NameMap, PayTvNetwork, ProviderCategory};

pub const CATEGORY_PATTERNS_FILE: &str = "bouquet_category_patterns.json";
pub const PAYTV_FILE: &str = "paytv_networks.json";
pub const PROVIDERS_FILE: &str = "provider_categories.json";
pub const RADIO_PATTERNS_FILE: &str = "radio_category_patterns.json";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("JSON parse error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("YAML parse error in {path}: {source}")]
    Yaml {
        path: String,
        source: serde_yml::Error,
    },
    #[error("Not a directory: {0}")]
    NotADirectory(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Read every override file present in `dir`.
pub fn load_overrides(dir: &Path) -> Result<CatalogOverrides, LoadError> {
    if !dir.exists() {
        return Ok(CatalogOverrides::default());
    }
    if !dir.is_dir() {
        return Err(LoadError::NotADirectory(dir.display().to_string()));
    }

    let overrides = CatalogOverrides {
        category_patterns: load_json_or_default::<BTreeMap<String, Vec<String>>>(
            &dir.join(CATEGORY_PATTERNS_FILE),
        )?,
        paytv: load_json_or_default::<Vec<PayTvNetwork>>(&dir.join(PAYTV_FILE))?,
        providers: load_json_or_default::<Vec<ProviderCategory>>(&dir.join(PROVIDERS_FILE))?,
        radio_patterns: load_json_or_default::<BTreeMap<String, Vec<String>>>(
            &dir.join(RADIO_PATTERNS_FILE),
        )?,
    };
    if !overrides.is_empty() {
        log::info!(
            "catalog overrides from {}: {} categories, {} pay-TV, {} providers, {} radio",
            dir.display(),
            overrides.category_patterns.len(),
            overrides.paytv.len(),
            overrides.providers.len(),
            overrides.radio_patterns.len()
        );
    }
    Ok(overrides)
}

/// Build the catalog: built-in tables, plus overrides from `dir` when given.
pub fn load_catalog(dir: Option<&Path>) -> Result<Catalog, LoadError> {
    let overrides = match dir {
        Some(dir) => load_overrides(dir)?,
        None => CatalogOverrides::default(),
    };
    Ok(Catalog::with_overrides(overrides)?)
}

/// Load a display-name map. `.json` files are read as JSON, anything else as YAML.
pub fn load_name_map(path: &Path) -> Result<NameMap, LoadError> {
    let contents = read(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&contents).map_err(|source| LoadError::Json {
            path: path.display().to_string(),
            source,
        })
    } else {
        serde_yml::from_str(&contents).map_err(|source| LoadError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }
}

fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T, LoadError> {
    if !path.is_file() {
        return Ok(T::default());
    }
    let contents = read(path)?;
    serde_json::from_str(&contents).map_err(|source| LoadError::Json {
        path: path.display().to_string(),
        source,
    })
}

fn read(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}
