//! Command implementations for the `rickdash` binary.

mod config;
mod list;
mod locations;
mod show;

pub use config::{cmd_config_path, cmd_config_show};
pub use list::{cmd_list, cmd_search};
pub use locations::cmd_locations;
pub use show::cmd_show;

use std::time::Duration;

use serde::Serialize;

use crate::cli::{FacetArgs, OutputOptions};
use crate::config::Config;
use crate::error::{Result, RickdashError};
use crate::search::{SearchCoordinator, SearchMode, SearchSnapshot};
use crate::source::GraphQlSource;
use crate::types::Character;

/// Print a value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Output of a command, printed as JSON or text depending on options
pub struct CommandOutput {
    json: serde_json::Value,
    text: Option<String>,
}

impl CommandOutput {
    pub fn new(json: serde_json::Value) -> Self {
        Self { json, text: None }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn print(self, output: OutputOptions) -> Result<()> {
        match self.text {
            Some(text) if !output.json => {
                println!("{text}");
                Ok(())
            }
            _ => print_json(&self.json),
        }
    }
}

/// Drive a coordinator the way a scrolling UI would and return what it
/// ended up showing: settle the query, enable fetching, then load further
/// pages one at a time.
pub(crate) async fn load_characters(
    config: &Config,
    name: Option<&str>,
    facets: &FacetArgs,
) -> Result<SearchSnapshot<Character>> {
    let source = GraphQlSource::from_config(config)?;
    let mut options = config
        .search_options()
        .with_debounce_delay(Duration::ZERO)
        .with_enabled(false);
    options.status = facets.status.clone();
    options.gender = facets.gender.clone();

    let name = name.map(str::trim).filter(|n| !n.is_empty());
    if let Some(name) = name
        && SearchMode::for_query(name, options.min_search_length) == SearchMode::Browse
    {
        return Err(RickdashError::Other(format!(
            "search term must be at least {} characters",
            options.min_search_length
        )));
    }

    let coordinator = SearchCoordinator::new(source, options);
    if let Some(name) = name {
        coordinator.set_query(name);
        coordinator.wait_for(|s| !s.is_debouncing).await;
    }

    coordinator.set_enabled(true);
    let mut snapshot = coordinator.wait_for(|s| !s.is_loading).await;
    if let Some(err) = snapshot.error.clone() {
        return Err(RickdashError::Shared(err));
    }

    for _ in 1..facets.pages {
        if !snapshot.has_next_page {
            break;
        }
        coordinator.load_more().await;
        snapshot = coordinator.snapshot();
        if let Some(err) = snapshot.load_more_error.clone() {
            return Err(RickdashError::Shared(err));
        }
    }

    Ok(snapshot)
}
