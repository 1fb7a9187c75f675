use std::path::Path;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use e2n_convert::{ingest_file, split_list};

use crate::error::CliError;

pub(crate) fn run_ingest(sources: &Path, out: &Path, only: &[String]) -> Result<(), CliError> {
    if !sources.is_file() {
        return Err(CliError::config(format!(
            "sources file {} not found",
            sources.display()
        )));
    }
    let results = ingest_file(sources, out, &split_list(only))?;
    log::info!("ingested {} profiles", results.len());
    for item in &results {
        log::info!(
            "  {}/{} -> {}",
            item.source_id.if_supports_color(Stdout, |t| t.bold()),
            item.profile_id,
            item.output_path.display().if_supports_color(Stdout, |t| t.cyan()),
        );
    }
    Ok(())
}
