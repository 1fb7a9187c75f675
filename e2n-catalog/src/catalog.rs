//! The compiled category catalog used by the classifier.
//!
//! A [`CatalogSpec`] is plain data: the built-in tables plus whatever an
//! override directory adds. [`CatalogSpec::compile`] turns it into an
//! immutable [`Catalog`] that can be shared across conversion runs.

use std::collections::BTreeMap;

use e2n_core::Service;
use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::types::{CatalogOverrides, PayTvNetwork, ProviderCategory};

pub const OTHERS: &str = "Others";
pub const RESOLUTION_UHD: &str = "Resolution - UHD";
pub const RESOLUTION_HD: &str = "Resolution - HD";
pub const RESOLUTION_SD: &str = "Resolution - SD";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid pattern '{pattern}' for category '{category}': {source}")]
    InvalidPattern {
        category: String,
        pattern: String,
        source: regex::Error,
    },
}

/// Built-in category order. Categories added by overrides are appended.
const BASE_ORDER: &[&str] = &[
    "Movies",
    "Series",
    "News",
    "Sports",
    "Kids",
    "Music",
    "Documentary",
    "Sky",
    "RTL",
    "ProSiebenSat.1",
    "ARD/ZDF",
    "ServusTV",
    "ORF",
    "BBC",
    "RAI",
    "TF1",
    "Nederland",
    "Austria",
    "Switzerland",
    "Spain",
    "Italy",
    "Poland",
    "PyTV",
    RESOLUTION_UHD,
    RESOLUTION_HD,
    RESOLUTION_SD,
    "Shopping",
    "Religion",
    "Adult",
    "International",
    "Regional",
    "UHD/4K",
    OTHERS,
];

/// Built-in primary patterns, matched case-insensitively against
/// `"{name} {provider}"`.
const BASE_PATTERNS: &[(&str, &[&str])] = &[
    ("Movies", &["film", "cine", "movie", "cinema"]),
    ("Series", &["serie", "series", "drama"]),
    ("News", &["news", "nachrichten", "journal", "tagesschau"]),
    ("Sports", &["sport", "bundesliga", "uefa", "espn", "sky sport"]),
    ("Kids", &["kinder", "kids", "cartoon", "disney", "junior"]),
    ("Music", &["music", "musik", "mtv", "viva"]),
    ("Documentary", &["doku", "documentary", "history", "geo", "planet", "nat.?geo"]),
    ("Sky", &["sky", "sky sport", "sky cinema", "sky one", "sky showcase"]),
    ("RTL", &["rtl", "nitro", "vox", "ntv", "rtlup"]),
    ("ProSiebenSat.1", &["prosieben", r"sat\.1", "kabel ?1", "sixx", "maxx", "puls ?4"]),
    (
        "ARD/ZDF",
        &["ard", "zdf", "wdr", "ndr", "mdr", "hr", "swr", "br", "phoenix", "tagesschau"],
    ),
    ("ServusTV", &["servustv", "servus tv"]),
    ("ORF", &["orf", "oe24", "oe1", "oe2", "oe3"]),
    ("BBC", &["bbc", "cbbc", "cbeebies", "bbc world"]),
    ("RAI", &["rai", "italia", "rai sport", "rai movie"]),
    ("TF1", &["tf1", "france", r"canal\+", "m6"]),
    ("Nederland", &["npo", "rtl ?[45]", "sbs ?6", "veronica", "net ?5", "ziggo"]),
    ("Austria", &["servus", "orf", "atv", "oe24", "krone tv", "puls ?4"]),
    ("Switzerland", &["srf", "schweiz", "swiss", "tele ?z?uri", "3sat ch"]),
    ("Spain", &["espan", "movistar", "antena", "rtve", "tve", "vamos"]),
    ("Italy", &["italia", "mediaset", "tivusat", "canale", "la7", "rai"]),
    ("Poland", &["polonia", "polsat", "tvp", "onet", r"canal\+ pol"]),
    ("PyTV", &["pytv", "py-tv"]),
    ("Shopping", &["shop", "shopping", "kauf", "qvc", "teleshop", "hse"]),
    (
        "Religion",
        &["kirche", "church", "gottes", "hope", "bibel", "faith", "islam", "evangel"],
    ),
    (
        "Adult",
        &["xxl", "erotik", "adult", "playboy", "hustler", "dorcel", "redlight"],
    ),
    (
        "International",
        &["france", "turk", "arab", "ital", "espan", "globe", "world", "bbc", "rai", "bein"],
    ),
    (
        "Regional",
        &["regional", "bayern", "berlin", "hamburg", "ndr", "mdr", "rbb", "swr", "hr", "wdr"],
    ),
    ("UHD/4K", &["uhd", "4k", "ultra"]),
];

/// Built-in radio sub-categories. An override file replaces a category's
/// patterns wholesale.
const BASE_RADIO_PATTERNS: &[(&str, &[&str])] = &[
    (
        "Radio - Music",
        &["musik", "music", "hits", "rock", "pop", "jazz", "klassik", "classic"],
    ),
    ("Radio - News", &["news", "info", "nachrichten", "deutschlandfunk", r"\bdlf\b"]),
    (
        "Radio - Regional",
        &["bayern", "ndr", "wdr", "swr", "mdr", "rbb", "antenne", r"\bhr ?[1-4]\b"],
    ),
];

const UHD_PATTERNS: &[&str] = &[r"\buhd\b", r"\b4k\b", r"ultra\s*hd", r"hdr\b"];
/// A match directly preceded by `u` is rejected (`uhd` is not HD).
const HD_PATTERNS: &[&str] = &[r"hd\+?\b", r"full\s*hd", r"high\s*definition"];
const SD_PATTERNS: &[&str] = &[r"\bsd\b", r"standard\s*definition"];

/// Uncompiled catalog contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSpec {
    pub order: Vec<String>,
    pub patterns: BTreeMap<String, Vec<String>>,
    pub paytv: Vec<PayTvNetwork>,
    pub providers: Vec<ProviderCategory>,
    pub radio_patterns: BTreeMap<String, Vec<String>>,
}

impl CatalogSpec {
    pub fn builtin() -> Self {
        Self {
            order: BASE_ORDER.iter().map(|s| s.to_string()).collect(),
            patterns: to_owned_table(BASE_PATTERNS),
            paytv: Vec::new(),
            providers: Vec::new(),
            radio_patterns: to_owned_table(BASE_RADIO_PATTERNS),
        }
    }

    /// Layer override files on top. Categories the order does not know yet
    /// are appended, in the order the overrides list them.
    pub fn merge(&mut self, overrides: CatalogOverrides) {
        for (category, keywords) in overrides.category_patterns {
            let category = category.trim().to_string();
            if category.is_empty() {
                continue;
            }
            self.ensure_category(&category);
            self.patterns
                .entry(category)
                .or_default()
                .extend(keywords.into_iter().filter(|k| !k.is_empty()));
        }

        for mut network in overrides.paytv {
            network.brand = network.brand.trim().to_string();
            network.keywords = network
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
            if network.brand.is_empty() || network.keywords.is_empty() {
                continue;
            }
            self.ensure_category(&network.category_name());
            self.paytv.push(network);
        }

        for entry in overrides.providers {
            let provider = entry.provider.trim().to_lowercase();
            let category = entry.category.trim().to_string();
            if provider.is_empty() || category.is_empty() {
                continue;
            }
            self.ensure_category(&category);
            self.providers.push(ProviderCategory { provider, category });
        }

        self.radio_patterns.extend(overrides.radio_patterns);
    }

    fn ensure_category(&mut self, category: &str) {
        if !self.order.iter().any(|c| c == category) {
            self.order.push(category.to_string());
        }
    }

    pub fn compile(&self) -> Result<Catalog, CatalogError> {
        let primary = self
            .order
            .iter()
            .map(|category| {
                let patterns = self.patterns.get(category).map(Vec::as_slice).unwrap_or(&[]);
                Ok((category.clone(), compile_all(category, patterns)?))
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        let radio = self
            .radio_patterns
            .iter()
            .map(|(category, patterns)| Ok((category.clone(), compile_all(category, patterns)?)))
            .collect::<Result<Vec<_>, CatalogError>>()?;

        let paytv = self
            .paytv
            .iter()
            .map(|n| (n.category_name(), n.keywords.clone()))
            .collect();

        let providers = self
            .providers
            .iter()
            .map(|p| (p.provider.clone(), p.category.clone()))
            .collect();

        Ok(Catalog {
            primary,
            paytv,
            providers,
            radio,
            uhd: compile_all(RESOLUTION_UHD, UHD_PATTERNS)?,
            hd: compile_all(RESOLUTION_HD, HD_PATTERNS)?,
            sd: compile_all(RESOLUTION_SD, SD_PATTERNS)?,
        })
    }
}

fn to_owned_table(table: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    table
        .iter()
        .map(|(category, patterns)| {
            (
                category.to_string(),
                patterns.iter().map(|p| p.to_string()).collect(),
            )
        })
        .collect()
}

fn compile_all<S: AsRef<str>>(category: &str, patterns: &[S]) -> Result<Vec<Regex>, CatalogError> {
    patterns
        .iter()
        .map(|p| {
            RegexBuilder::new(p.as_ref())
                .case_insensitive(true)
                .build()
                .map_err(|source| CatalogError::InvalidPattern {
                    category: category.to_string(),
                    pattern: p.as_ref().to_string(),
                    source,
                })
        })
        .collect()
}

/// Immutable, compiled classification tables.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Every category in bouquet order, with its primary patterns (possibly none).
    primary: Vec<(String, Vec<Regex>)>,
    /// Category name and lowercase keywords.
    paytv: Vec<(String, Vec<String>)>,
    /// Lowercase provider substring and target category.
    providers: Vec<(String, String)>,
    /// Radio sub-categories in name order.
    radio: Vec<(String, Vec<Regex>)>,
    uhd: Vec<Regex>,
    hd: Vec<Regex>,
    sd: Vec<Regex>,
}

impl Catalog {
    /// The built-in catalog with no overrides.
    pub fn builtin() -> Result<Self, CatalogError> {
        CatalogSpec::builtin().compile()
    }

    /// Built-in catalog with override files layered on top.
    pub fn with_overrides(overrides: CatalogOverrides) -> Result<Self, CatalogError> {
        let mut spec = CatalogSpec::builtin();
        spec.merge(overrides);
        spec.compile()
    }

    /// Category names in bouquet order, ending with the appended ones.
    pub fn category_order(&self) -> impl Iterator<Item = &str> {
        self.primary.iter().map(|(c, _)| c.as_str())
    }

    /// First category in order whose patterns match, else [`OTHERS`].
    pub fn infer_category(&self, service: &Service) -> &str {
        let haystack = haystack(service);
        self.primary
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|p| p.is_match(&haystack)))
            .map(|(category, _)| category.as_str())
            .unwrap_or(OTHERS)
    }

    /// Every pay-TV brand with a keyword contained in the name or provider.
    pub fn paytv_categories(&self, service: &Service) -> Vec<&str> {
        let name = service.name.to_lowercase();
        let provider = service.provider.as_deref().unwrap_or_default().to_lowercase();
        self.paytv
            .iter()
            .filter(|(_, keywords)| {
                keywords
                    .iter()
                    .any(|k| name.contains(k.as_str()) || provider.contains(k.as_str()))
            })
            .map(|(category, _)| category.as_str())
            .collect()
    }

    /// First provider bucket whose key is a substring of the provider.
    pub fn provider_category(&self, service: &Service) -> Option<&str> {
        let provider = service.provider_name()?.to_lowercase();
        self.providers
            .iter()
            .find(|(key, _)| provider.contains(key.as_str()))
            .map(|(_, category)| category.as_str())
    }

    /// At most one resolution bucket: UHD before HD before SD, falling back
    /// to the service's `resolution` extra when no pattern matches.
    pub fn resolution_categories(&self, service: &Service) -> Vec<&'static str> {
        let haystack = haystack(service).to_lowercase();
        if self.uhd.iter().any(|p| p.is_match(&haystack)) {
            return vec![RESOLUTION_UHD];
        }
        if self.hd.iter().any(|p| matches_not_after_u(p, &haystack)) {
            return vec![RESOLUTION_HD];
        }
        if self.sd.iter().any(|p| p.is_match(&haystack)) {
            return vec![RESOLUTION_SD];
        }
        let hint = service.extra.get("resolution").map(|v| v.trim().to_uppercase());
        match hint.as_deref() {
            Some("UHD" | "4K") => vec![RESOLUTION_UHD],
            Some("HD" | "FHD") => vec![RESOLUTION_HD],
            Some("SD") => vec![RESOLUTION_SD],
            _ => Vec::new(),
        }
    }

    /// Every radio sub-category whose patterns match.
    pub fn radio_categories(&self, service: &Service) -> Vec<&str> {
        let haystack = haystack(service).to_lowercase();
        self.radio
            .iter()
            .filter(|(_, patterns)| patterns.iter().any(|p| p.is_match(&haystack)))
            .map(|(category, _)| category.as_str())
            .collect()
    }
}

fn haystack(service: &Service) -> String {
    format!("{} {}", service.name, service.provider.as_deref().unwrap_or_default())
}

fn matches_not_after_u(pattern: &Regex, haystack: &str) -> bool {
    pattern.find_iter(haystack).any(|m| {
        !haystack[..m.start()]
            .chars()
            .next_back()
            .is_some_and(|c| c.eq_ignore_ascii_case(&'u'))
    })
}
