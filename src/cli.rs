use clap::{Args, Parser, Subcommand};

use crate::types::{VALID_GENDERS, VALID_STATUSES};

#[derive(Parser)]
#[command(name = "rickdash")]
#[command(about = "Browse and search Rick and Morty characters")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format shared by every command
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct OutputOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Facet filters shared by listing commands
#[derive(Debug, Clone, Default, Args)]
pub struct FacetArgs {
    /// Status: all, alive, dead, unknown
    #[arg(long, value_parser = parse_status)]
    pub status: Option<String>,

    /// Gender: all, female, male, genderless, unknown
    #[arg(long, value_parser = parse_gender)]
    pub gender: Option<String>,

    /// Number of pages to fetch (default: 1)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List characters page by page
    #[command(visible_alias = "ls")]
    List {
        #[command(flatten)]
        facets: FacetArgs,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Search characters by name
    #[command(visible_alias = "s")]
    Search {
        /// Name or part of a name
        name: String,

        #[command(flatten)]
        facets: FacetArgs,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Show how loaded characters spread over locations
    Locations {
        /// Only count characters matching this name
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        facets: FacetArgs,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Show one character with episodes
    Show {
        /// Character ID
        id: String,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Display the effective configuration
    Show {
        #[command(flatten)]
        output: OutputOptions,
    },
    /// Print the config file path
    Path,
}

fn parse_facet(value: &str, valid: &[&str], name: &str) -> Result<String, String> {
    let lowered = value.to_lowercase();
    if valid.contains(&lowered.as_str()) {
        Ok(lowered)
    } else {
        Err(format!(
            "invalid {name} '{value}'. Must be one of: {}",
            valid.join(", ")
        ))
    }
}

pub fn parse_status(value: &str) -> Result<String, String> {
    parse_facet(value, VALID_STATUSES, "status")
}

pub fn parse_gender(value: &str) -> Result<String, String> {
    parse_facet(value, VALID_GENDERS, "gender")
}
