use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, load_characters};
use crate::analytics::{self, group_by_location};
use crate::cli::{FacetArgs, OutputOptions};
use crate::config::Config;
use crate::display::location_table;
use crate::error::Result;

/// Break the loaded characters down by current location
pub async fn cmd_locations(
    name: Option<&str>,
    facets: FacetArgs,
    output: OutputOptions,
) -> Result<()> {
    let config = Config::load()?;
    let snapshot = load_characters(&config, name, &facets).await?;

    let counts = group_by_location(&snapshot.characters);
    let total = analytics::total(&counts);

    let json_output = json!({
        "characters": snapshot.characters.len(),
        "located": total,
        "locations": counts,
    });

    let text_output = if counts.is_empty() {
        "No known locations among the loaded characters".to_string()
    } else {
        format!(
            "{}\n{}",
            location_table(&counts),
            format!(
                "{} of {} loaded characters have a known location",
                total,
                snapshot.characters.len()
            )
            .dimmed()
        )
    };

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)
}
