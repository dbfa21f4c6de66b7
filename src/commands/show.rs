use super::CommandOutput;
use crate::cli::OutputOptions;
use crate::config::Config;
use crate::display::format_character_detail;
use crate::error::{Result, RickdashError};
use crate::source::GraphQlSource;

/// Display one character with origin, location and episodes
pub async fn cmd_show(id: &str, output: OutputOptions) -> Result<()> {
    let id = id.trim();
    if id.is_empty() {
        return Err(RickdashError::Other("character ID cannot be empty".to_string()));
    }

    let config = Config::load()?;
    let source = GraphQlSource::from_config(&config)?;
    let detail = source.fetch_character(id).await?;

    CommandOutput::new(serde_json::to_value(&detail)?)
        .with_text(format_character_detail(&detail))
        .print(output)
}
