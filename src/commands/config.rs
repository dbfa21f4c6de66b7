//! Configuration commands.
//!
//! - `config show`: Display the effective configuration
//! - `config path`: Print where the config file lives

use owo_colors::OwoColorize;
use serde_json::json;

use super::CommandOutput;
use crate::cli::OutputOptions;
use crate::config::Config;
use crate::error::Result;

/// Show current configuration, with environment overrides applied
pub fn cmd_config_show(output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let path = Config::config_path()?;
    let endpoint = config.endpoint();
    let overridden = endpoint != config.endpoint;

    let json_output = json!({
        "endpoint": endpoint,
        "endpoint_overridden": overridden,
        "request_timeout": config.request_timeout,
        "search": {
            "debounce_delay_ms": config.search.debounce_delay_ms,
            "min_search_length": config.search.min_search_length,
        },
        "config_file": path.to_string_lossy(),
        "config_file_exists": path.exists(),
    });

    let mut text_output = String::new();
    text_output.push_str(&format!("{}\n\n", "Configuration:".cyan().bold()));

    let endpoint_note = if overridden {
        format!(" {}", "(from RICKDASH_ENDPOINT)".dimmed())
    } else {
        String::new()
    };
    text_output.push_str(&format!("{}: {endpoint}{endpoint_note}\n", "endpoint".cyan()));
    text_output.push_str(&format!(
        "{}: {}s\n\n",
        "request_timeout".cyan(),
        config.request_timeout
    ));

    text_output.push_str(&format!("{}:\n", "search".cyan()));
    text_output.push_str(&format!(
        "  debounce_delay_ms: {}\n",
        config.search.debounce_delay_ms
    ));
    text_output.push_str(&format!(
        "  min_search_length: {}\n\n",
        config.search.min_search_length
    ));

    let file_note = if path.exists() { "" } else { " (not created, using defaults)" };
    text_output.push_str(&format!(
        "{}",
        format!("Config file: {}{file_note}", path.display()).dimmed()
    ));

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)
}

/// Print the config file path
pub fn cmd_config_path() -> Result<()> {
    println!("{}", Config::config_path()?.display());
    Ok(())
}
