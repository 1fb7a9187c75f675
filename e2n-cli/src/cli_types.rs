//! CLI type definitions: command enums and argument structs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use e2n_zapit::NameScheme;

#[derive(Parser)]
#[command(name = "e2n", version)]
#[command(about = "Convert Enigma2 channel lists into Neutrino zapit trees", long_about = None)]
pub(crate) struct Cli {
    /// Only show warnings and errors
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable debug logging with timestamps
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (defaults to <config dir>/e2n/settings.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Convert a native Enigma2 profile directory into a Neutrino tree
    Convert(ConvertArgs),

    /// Run source adapters over local material and write native profiles
    Ingest {
        /// Sources file (YAML)
        #[arg(short, long)]
        sources: PathBuf,

        /// Output directory
        #[arg(long)]
        out: PathBuf,

        /// Comma separated source ids to process
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,
    },

    /// List registered source adapters
    Adapters,
}

/// Flags for `convert`. Unset flags keep the settings-file value.
#[derive(Args, Clone, Default)]
pub(crate) struct ConvertArgs {
    /// Profile directory holding lamedb or lamedb5
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory
    #[arg(short, long)]
    pub output: PathBuf,

    /// Target zapit API version (3 or 4)
    #[arg(long, value_parser = clap::value_parser!(u8).range(3..=4))]
    pub api_version: Option<u8>,

    /// Regex selecting bouquets by name
    #[arg(long)]
    pub filter_bouquets: Option<String>,

    /// Delivery types to write (S,C,T)
    #[arg(long, value_delimiter = ',')]
    pub include_types: Option<Vec<String>>,

    /// Satellite identifiers to keep
    #[arg(long, value_delimiter = ',')]
    pub satellites: Option<Vec<String>>,

    /// Satellite unions (NameA+NameB)
    #[arg(long, value_delimiter = ',')]
    pub combinations: Option<Vec<String>>,

    /// Folder naming: human or code
    #[arg(long)]
    pub name_scheme: Option<NameScheme>,

    /// Display-name overrides (JSON or YAML)
    #[arg(long)]
    pub name_map: Option<PathBuf>,

    /// Directory with category override files
    #[arg(long)]
    pub catalog_dir: Option<PathBuf>,

    /// Skip satellite outputs
    #[arg(long)]
    pub no_sat: bool,

    /// Skip cable outputs
    #[arg(long)]
    pub no_cable: bool,

    /// Skip terrestrial outputs
    #[arg(long)]
    pub no_terrestrial: bool,

    /// Treat validation warnings as fatal
    #[arg(long)]
    pub fail_on_warn: bool,

    /// Strict mode (implies --fail-on-warn)
    #[arg(long)]
    pub strict: bool,

    /// Abort when a delivery falls below its minimum service count
    #[arg(long, conflicts_with = "allow_empty")]
    pub abort_on_empty: bool,

    /// Never abort on low service counts
    #[arg(long)]
    pub allow_empty: bool,

    #[arg(long)]
    pub min_services_sat: Option<usize>,

    #[arg(long)]
    pub min_services_cable: Option<usize>,

    #[arg(long)]
    pub min_services_terrestrial: Option<usize>,

    /// Convert stale sources instead of aborting
    #[arg(long)]
    pub include_stale: bool,

    /// Staleness threshold in days
    #[arg(long)]
    pub stale_after_days: Option<i64>,

    /// Write cable.xml, terrestrial.xml and satellites.xml
    #[arg(long, conflicts_with = "no_emit_scanfiles")]
    pub emit_scanfiles: bool,

    #[arg(long)]
    pub no_emit_scanfiles: bool,

    /// Cable providers to keep in scanfiles
    #[arg(long, value_delimiter = ',')]
    pub providers: Option<Vec<String>>,

    /// Terrestrial regions to keep in scanfiles
    #[arg(long, value_delimiter = ',')]
    pub regions: Option<Vec<String>>,

    /// Cable providers that must be present
    #[arg(long, value_delimiter = ',')]
    pub expected_providers: Option<Vec<String>>,

    /// Terrestrial regions that must be present
    #[arg(long, value_delimiter = ',')]
    pub expected_regions: Option<Vec<String>>,

    /// Fail when scanfile tables are empty or below their minimums
    #[arg(long)]
    pub strict_scanfiles: bool,

    #[arg(long)]
    pub min_scanfile_entries_cable: Option<usize>,

    #[arg(long)]
    pub min_scanfile_entries_terrestrial: Option<usize>,

    #[arg(long)]
    pub min_scanfile_entries_satellite: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert() {
        let cli = Cli::parse_from([
            "e2n",
            "--verbose",
            "convert",
            "--input",
            "in",
            "--output",
            "out",
            "--name-scheme",
            "code",
            "--providers",
            "Vodafone,PYUR",
            "--no-emit-scanfiles",
        ]);
        assert!(cli.verbose);
        let Commands::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.name_scheme, Some(NameScheme::Code));
        assert_eq!(args.providers, Some(vec!["Vodafone".to_string(), "PYUR".to_string()]));
        assert!(args.no_emit_scanfiles);

        let rejected = Cli::try_parse_from(["e2n", "convert", "-i", "a", "-o", "b", "--api-version", "5"]);
        assert!(rejected.is_err());
    }
}
