//! Data types for the category catalog and its override files.
//!
//! These are plain serde records as they appear on disk; [`crate::Catalog`]
//! compiles them into matchers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── Override files ──────────────────────────────────────────────────────────

/// One entry of `paytv_networks.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayTvNetwork {
    pub brand: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl PayTvNetwork {
    /// Bouquet name: `PayTV - {brand}[ - {country}][ - {resolution}]`.
    pub fn category_name(&self) -> String {
        let mut parts = vec!["PayTV", self.brand.trim()];
        for part in [self.country.as_deref(), self.resolution.as_deref()]
            .into_iter()
            .flatten()
        {
            let part = part.trim();
            if !part.is_empty() {
                parts.push(part);
            }
        }
        parts.join(" - ")
    }
}

/// One entry of `provider_categories.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCategory {
    pub provider: String,
    pub category: String,
}

/// Everything an override directory can contribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogOverrides {
    /// `bouquet_category_patterns.json`: category to extra regex patterns.
    pub category_patterns: BTreeMap<String, Vec<String>>,
    /// `paytv_networks.json`
    pub paytv: Vec<PayTvNetwork>,
    /// `provider_categories.json`
    pub providers: Vec<ProviderCategory>,
    /// `radio_category_patterns.json`: replaces the built-in patterns per category.
    pub radio_patterns: BTreeMap<String, Vec<String>>,
}

impl CatalogOverrides {
    pub fn is_empty(&self) -> bool {
        self.category_patterns.is_empty()
            && self.paytv.is_empty()
            && self.providers.is_empty()
            && self.radio_patterns.is_empty()
    }
}

// ── Name map ────────────────────────────────────────────────────────────────

/// Display-name overrides: `{"sat"|"cable"|"terrestrial": {code-or-human: display}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameMap(pub BTreeMap<String, BTreeMap<String, String>>);

impl NameMap {
    pub fn lookup(&self, category: &str, key: &str) -> Option<&str> {
        self.0
            .get(category)
            .and_then(|m| m.get(key))
            .map(String::as_str)
    }

    pub fn insert(&mut self, category: &str, key: &str, value: &str) {
        self.0
            .entry(category.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }
}
