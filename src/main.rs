pub mod types;
pub mod category;
pub mod config;
pub mod data;
pub mod geocode;
pub mod map;
pub mod inspect;
pub mod search;
pub mod export;
pub mod server;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the risk map and the search/export API
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Write the facilities matching a search to a file
    Export {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        county: Option<String>,
        #[arg(long)]
        zip: Option<String>,
        #[arg(short, long, value_enum, default_value = "csv")]
        format: export::ExportFormat,
        /// Defaults to the download file name for the format
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            let app_config = config::AppConfig::load_from_file(&config)?;

            // Fail at startup, not on first request, if the CSV is unusable.
            let dataset = data::load_data(&app_config)?;

            server::start_server(app_config, dataset).await?;
        }
        Commands::Export {
            config,
            city,
            county,
            zip,
            format,
            output,
        } => {
            let app_config = config::AppConfig::load_from_file(&config)?;
            let dataset = data::load_data(&app_config)?;

            let filter = search::SearchFilter::new(city, county, zip);
            if filter.is_empty() {
                info!("No search filter given, exporting every facility");
            }
            let rows = filter.apply(&dataset);
            let bytes = export::export(&rows, format)?;

            let output = output.unwrap_or_else(|| PathBuf::from(format.file_name()));
            fs::write(&output, bytes)
                .with_context(|| format!("Failed to write export file: {:?}", output))?;
            info!(rows = rows.len(), path = ?output, "Export complete");
        }
    }

    Ok(())
}
