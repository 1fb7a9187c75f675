//! Enigma2 bouquet files: `bouquets.tv`/`bouquets.radio` masters and the
//! `userbouquet.*` files they reference.

use std::collections::HashSet;

use e2n_core::{Bouquet, BouquetCategory, BouquetEntry, clean_text, slugify};

pub const MASTER_TV_TITLE: &str = "User - Bouquets (TV)";
pub const MASTER_RADIO_TITLE: &str = "User - Bouquets (Radio)";

/// Parse a `userbouquet.*` file.
///
/// The bouquet is named after the file stem until a `#NAME` line says
/// otherwise. `.tv` files are TV bouquets, every other suffix is radio.
pub fn parse_userbouquet(text: &str, file_name: &str) -> Bouquet {
    let (stem, suffix) = match file_name.rfind('.') {
        Some(pos) => (&file_name[..pos], &file_name[pos..]),
        None => (file_name, ""),
    };
    let category = if suffix == ".tv" {
        BouquetCategory::Tv
    } else {
        BouquetCategory::Radio
    };

    let mut bouquet = Bouquet::new(stem, category);
    bouquet.source_path = Some(file_name.to_string());

    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("#NAME") {
            let name = clean_text(rest);
            if !name.is_empty() {
                bouquet.name = name;
            }
        } else if let Some(rest) = line.strip_prefix("#SERVICE") {
            let reference = rest.trim_start_matches(':').trim();
            if !reference.is_empty() {
                bouquet.entries.push(BouquetEntry::new(reference));
            }
        } else if let Some(rest) = line.strip_prefix("#DESCRIPTION") {
            if let Some(last) = bouquet.entries.last_mut() {
                last.name = Some(clean_text(rest)).filter(|n| !n.is_empty());
            }
        }
    }
    bouquet
}

/// File names referenced by a master bouquet file, in order, without repeats.
pub fn collect_referenced(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut refs = Vec::new();
    for line in text.lines() {
        let candidate = if line.contains("FROM BOUQUET") {
            line.split('"').nth(1).filter(|v| !v.is_empty())
        } else if line.starts_with("userbouquet") {
            Some(line.trim())
        } else {
            None
        };
        if let Some(name) = candidate {
            if seen.insert(name.to_string()) {
                refs.push(name.to_string());
            }
        }
    }
    refs
}

pub fn render_userbouquet(bouquet: &Bouquet) -> String {
    let mut out = format!("#NAME {}\n", bouquet.name);
    for entry in &bouquet.entries {
        out.push_str(&format!("#SERVICE {}\n", entry.service_ref));
        if let Some(name) = entry.name.as_deref().filter(|n| !n.is_empty()) {
            out.push_str(&format!("#DESCRIPTION {name}\n"));
        }
    }
    out
}

/// Render a master bouquet listing the given user bouquet files.
pub fn render_master(title: &str, files: &[String]) -> String {
    let mut out = format!("#NAME {title}\n");
    for file in files {
        out.push_str(&format!(
            "#SERVICE: 1:7:1:0:0:0:0:0:0:0:FROM BOUQUET \"{file}\" ORDER BY bouquet\n{file}\n"
        ));
    }
    out
}

/// Assigns stable, collision-free `userbouquet.*` file names.
#[derive(Debug, Default)]
pub struct BouquetFileNamer {
    used: HashSet<String>,
}

impl BouquetFileNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The original file name when known, otherwise `userbouquet.{slug}.tv`
    /// (or `.radio`), suffixed `_1`, `_2`, ... on collision.
    pub fn file_name(&mut self, bouquet: &Bouquet) -> String {
        let name = match bouquet.source_path.as_deref() {
            Some(path) => path.rsplit(['/', '\\']).next().unwrap_or(path).to_string(),
            None => {
                let suffix = suffix_for(bouquet.category);
                let mut slug = slugify(&bouquet.name, '_');
                if slug.is_empty() {
                    slug = "bouquet".to_string();
                }
                let mut candidate = format!("userbouquet.{slug}{suffix}");
                let mut idx = 1;
                while self.used.contains(&candidate) {
                    candidate = format!("userbouquet.{slug}_{idx}{suffix}");
                    idx += 1;
                }
                candidate
            }
        };
        self.used.insert(name.clone());
        name
    }
}

pub fn suffix_for(category: BouquetCategory) -> &'static str {
    match category {
        BouquetCategory::Tv => ".tv",
        BouquetCategory::Radio => ".radio",
    }
}
