use std::path::Path;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use e2n_convert::{ConversionOptions, LogProgress, convert_with_progress, load_settings, split_list};

use crate::cli_types::ConvertArgs;
use crate::error::CliError;

/// Overlay explicitly given flags on settings-file values.
pub(crate) fn apply_flags(args: &ConvertArgs, options: &mut ConversionOptions) {
    let list = |values: &Option<Vec<String>>| values.as_deref().map(split_list);

    if let Some(v) = args.api_version {
        options.api_version = v;
    }
    if let Some(v) = &args.filter_bouquets {
        options.filter_bouquets = Some(v.clone()).filter(|f| !f.is_empty());
    }
    if let Some(v) = list(&args.include_types) {
        options.include_types = v;
    }
    if let Some(v) = list(&args.satellites) {
        options.satellites = v;
    }
    if let Some(v) = list(&args.combinations) {
        options.combinations = v;
    }
    if let Some(v) = args.name_scheme {
        options.name_scheme = v;
    }
    if let Some(v) = &args.name_map {
        options.name_map_path = Some(v.clone());
    }
    if let Some(v) = &args.catalog_dir {
        options.catalog_dir = Some(v.clone());
    }

    options.include_sat &= !args.no_sat;
    options.include_cable &= !args.no_cable;
    options.include_terrestrial &= !args.no_terrestrial;
    options.fail_on_warn |= args.fail_on_warn;
    options.strict |= args.strict;
    options.include_stale |= args.include_stale;
    options.strict_scanfiles |= args.strict_scanfiles;
    if args.abort_on_empty {
        options.abort_on_empty = true;
    } else if args.allow_empty {
        options.abort_on_empty = false;
    }
    if args.emit_scanfiles {
        options.emit_scanfiles = true;
    } else if args.no_emit_scanfiles {
        options.emit_scanfiles = false;
    }

    if let Some(v) = args.min_services_sat {
        options.min_services_sat = v;
    }
    if let Some(v) = args.min_services_cable {
        options.min_services_cable = v;
    }
    if let Some(v) = args.min_services_terrestrial {
        options.min_services_terrestrial = v;
    }
    if let Some(v) = args.stale_after_days {
        options.stale_after_days = v;
    }
    if let Some(v) = list(&args.providers) {
        options.scanfile_providers = v;
    }
    if let Some(v) = list(&args.regions) {
        options.scanfile_regions = v;
    }
    if let Some(v) = list(&args.expected_providers) {
        options.expected_providers = v;
    }
    if let Some(v) = list(&args.expected_regions) {
        options.expected_regions = v;
    }
    if let Some(v) = args.min_scanfile_entries_cable {
        options.min_scanfile_entries_cable = v;
    }
    if let Some(v) = args.min_scanfile_entries_terrestrial {
        options.min_scanfile_entries_terrestrial = v;
    }
    if let Some(v) = args.min_scanfile_entries_satellite {
        options.min_scanfile_entries_satellite = v;
    }
}

/// Convert a profile directory using settings plus flags.
pub(crate) fn run_convert(args: &ConvertArgs, settings: Option<&Path>) -> Result<(), CliError> {
    if !args.input.is_dir() {
        return Err(CliError::config(format!(
            "input {} is not a directory",
            args.input.display()
        )));
    }
    let mut options = load_settings(settings)?;
    apply_flags(args, &mut options);

    let result = convert_with_progress(&args.input, &args.output, &options, &LogProgress)?;

    for group in &result.written.groups {
        log::info!(
            "  {} {} ({} services, {} bouquets)",
            group.category.if_supports_color(Stdout, |t| t.dimmed()),
            group.display_name.if_supports_color(Stdout, |t| t.bold()),
            group.service_count,
            group.bouquet_count,
        );
    }
    for warning in &result.warnings {
        log::warn!("{}", warning.if_supports_color(Stdout, |t| t.yellow()));
    }
    Ok(())
}
