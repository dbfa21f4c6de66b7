use serde_json::json;

use super::{CommandOutput, load_characters};
use crate::cli::{FacetArgs, OutputOptions};
use crate::config::Config;
use crate::display::{character_table, format_page_summary};
use crate::error::Result;
use crate::search::SearchSnapshot;
use crate::types::Character;

/// List characters, optionally narrowed by facets
pub async fn cmd_list(facets: FacetArgs, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let snapshot = load_characters(&config, None, &facets).await?;
    print_listing(&snapshot, output)
}

/// Search characters by name
pub async fn cmd_search(name: &str, facets: FacetArgs, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let snapshot = load_characters(&config, Some(name), &facets).await?;
    print_listing(&snapshot, output)
}

fn print_listing(snapshot: &SearchSnapshot<Character>, output: OutputOptions) -> Result<()> {
    let info = snapshot.page_info.unwrap_or_default();

    let json_output = json!({
        "mode": snapshot.mode,
        "query": snapshot.debounced_query,
        "info": info,
        "characters": snapshot.characters,
    });

    let text_output = if snapshot.characters.is_empty() {
        "No characters found".to_string()
    } else {
        format!(
            "{}\n{}",
            character_table(&snapshot.characters),
            format_page_summary(snapshot.characters.len(), info.count, info.pages, info.next)
        )
    };

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)
}
