//! Native Enigma2 profile directories (lamedb plus bouquet files).

use std::path::{Path, PathBuf};

use e2n_core::{Bouquet, BouquetCategory, Profile};

use crate::bouquets::{
    BouquetFileNamer, MASTER_RADIO_TITLE, MASTER_TV_TITLE, collect_referenced, parse_userbouquet,
    render_master, render_userbouquet,
};
use crate::error::FormatError;
use crate::lamedb::{parse_lamedb_file, render_lamedb};

/// Locate the service database in a profile directory, preferring `lamedb5`.
pub fn find_lamedb(dir: &Path) -> Result<PathBuf, FormatError> {
    ["lamedb5", "lamedb"]
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
        .ok_or_else(|| {
            FormatError::not_found(format!("lamedb/lamedb5 missing in {}", dir.display()))
        })
}

/// Load a native profile directory into the canonical model.
pub fn load_profile(dir: &Path) -> Result<Profile, FormatError> {
    if !dir.exists() {
        return Err(FormatError::not_found(format!("input path {} not found", dir.display())));
    }
    let lamedb_path = find_lamedb(dir)?;
    let db = parse_lamedb_file(&lamedb_path)?;

    let mut profile = Profile {
        services: db.services,
        transponders: db.transponders,
        bouquets: load_bouquets(dir)?,
        ..Profile::default()
    };

    let is_v5 = lamedb_path.file_name().is_some_and(|n| n == "lamedb5");
    profile.set_meta("source", dir.display().to_string());
    profile.set_meta("lamedb_version", if is_v5 { "5" } else { "4" });
    profile.refresh_counts();

    log::info!(
        "parsed enigma2 profile {} -> {} services, {} transponders, {} bouquets",
        dir.display(),
        profile.services.len(),
        profile.transponders.len(),
        profile.bouquets.len()
    );
    Ok(profile)
}

/// Bouquets referenced from `bouquets.*` masters in reference order, then any
/// `userbouquet.*` file no master mentions.
pub fn load_bouquets(dir: &Path) -> Result<Vec<Bouquet>, FormatError> {
    let files = sorted_file_names(dir)?;
    let mut bouquets: Vec<Bouquet> = Vec::new();

    for master in files.iter().filter(|n| n.starts_with("bouquets.")) {
        let text = read_lossy(&dir.join(master))?;
        for name in collect_referenced(&text) {
            let path = dir.join(&name);
            if path.is_file() {
                if bouquets.iter().any(|b| b.source_path.as_deref() == Some(name.as_str())) {
                    continue;
                }
                bouquets.push(parse_userbouquet(&read_lossy(&path)?, &name));
            } else {
                log::warn!("referenced userbouquet {} not found in {}", name, dir.display());
            }
        }
    }

    for name in files.iter().filter(|n| n.starts_with("userbouquet.")) {
        if bouquets.iter().any(|b| b.source_path.as_deref() == Some(name.as_str())) {
            continue;
        }
        bouquets.push(parse_userbouquet(&read_lossy(&dir.join(name))?, name));
    }
    Ok(bouquets)
}

/// Write a profile as a native directory: `lamedb`, one `userbouquet.*` per
/// bouquet and the two master files.
pub fn write_profile(profile: &Profile, dir: &Path) -> Result<PathBuf, FormatError> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join("lamedb"), render_lamedb(profile))?;

    let mut namer = BouquetFileNamer::new();
    let mut tv_files = Vec::new();
    let mut radio_files = Vec::new();
    for bouquet in &profile.bouquets {
        let file_name = namer.file_name(bouquet);
        std::fs::write(dir.join(&file_name), render_userbouquet(bouquet))?;
        match bouquet.category {
            BouquetCategory::Tv => tv_files.push(file_name),
            BouquetCategory::Radio => radio_files.push(file_name),
        }
    }
    tv_files.sort();
    radio_files.sort();

    std::fs::write(dir.join("bouquets.tv"), render_master(MASTER_TV_TITLE, &tv_files))?;
    std::fs::write(dir.join("bouquets.radio"), render_master(MASTER_RADIO_TITLE, &radio_files))?;
    Ok(dir.to_path_buf())
}

fn sorted_file_names(dir: &Path) -> Result<Vec<String>, FormatError> {
    let mut names: Vec<String> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .collect();
    names.sort();
    Ok(names)
}

fn read_lossy(path: &Path) -> Result<String, FormatError> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
