use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use e2n_core::Profile;
use walkdir::WalkDir;

use crate::error::AdapterError;
use crate::{Adapter, SourceConfig};

/// Native Enigma2 profile directories.
pub struct Enigma2Adapter;

fn has_lamedb(dir: &Path) -> bool {
    dir.join("lamedb").is_file() || dir.join("lamedb5").is_file()
}

impl Enigma2Adapter {
    /// Profile directories under `source`: the `include` globs if configured,
    /// else `source` itself, else every nested directory holding a lamedb.
    fn profile_dirs(
        source: &Path,
        config: &SourceConfig,
    ) -> Result<BTreeSet<PathBuf>, AdapterError> {
        let mut dirs = BTreeSet::new();
        if let Some(patterns) = config.list("include") {
            for pattern in patterns {
                let full = source.join(&pattern);
                let matches = glob::glob(&full.to_string_lossy()).map_err(|e| {
                    AdapterError::parse(format!("invalid include pattern {pattern}: {e}"))
                })?;
                dirs.extend(matches.filter_map(Result::ok).filter(|p| has_lamedb(p)));
            }
        } else if has_lamedb(source) {
            dirs.insert(source.to_path_buf());
        } else {
            dirs.extend(
                WalkDir::new(source)
                    .into_iter()
                    .filter_map(Result::ok)
                    .filter(|e| e.file_type().is_file() && e.file_name() == "lamedb")
                    .filter_map(|e| e.path().parent().map(Path::to_path_buf)),
            );
        }
        Ok(dirs)
    }
}

impl Adapter for Enigma2Adapter {
    fn name(&self) -> &'static str {
        "enigma2"
    }

    fn description(&self) -> &'static str {
        "native Enigma2 directories (lamedb/lamedb5 + bouquets)"
    }

    fn ingest(&self, source: &Path, config: &SourceConfig) -> Result<Vec<Profile>, AdapterError> {
        let mut profiles = Vec::new();
        for dir in Self::profile_dirs(source, config)? {
            let mut profile = e2n_formats::load_profile(&dir)?;
            let id = self.default_profile_id(&dir);
            profile.metadata.entry("profile_id".into()).or_insert(id);
            profile
                .metadata
                .entry("source_path".into())
                .or_insert_with(|| dir.display().to_string());
            profiles.push(profile);
        }
        if profiles.is_empty() {
            log::warn!("enigma2: no lamedb found under {}", source.display());
        }
        Ok(profiles)
    }
}

