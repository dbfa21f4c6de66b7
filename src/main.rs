use clap::Parser;
use std::process::ExitCode;

use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use rickdash::cli::{Cli, Commands, ConfigAction};
use rickdash::commands::{
    cmd_config_path, cmd_config_show, cmd_list, cmd_locations, cmd_search, cmd_show,
};

const LOG_ENV: &str = "RICKDASH_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List { facets, output } => cmd_list(facets, output).await,
        Commands::Search {
            name,
            facets,
            output,
        } => cmd_search(&name, facets, output).await,
        Commands::Locations {
            name,
            facets,
            output,
        } => cmd_locations(name.as_deref(), facets, output).await,
        Commands::Show { id, output } => cmd_show(&id, output).await,
        Commands::Config { action } => match action {
            ConfigAction::Show { output } => cmd_config_show(output),
            ConfigAction::Path => cmd_config_path(),
        },
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            if let Some(wait) = e.retry_after().filter(|_| e.is_rate_limited()) {
                let wait = wait.as_secs();
                eprintln!(
                    "{}",
                    format!("Rate limited by the API, try again in {wait}s").yellow()
                );
            }
            ExitCode::FAILURE
        }
    }
}
