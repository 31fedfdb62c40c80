pub mod types;
pub mod config;
pub mod error;
pub mod data;
pub mod schema;
pub mod processing;
pub mod projection;
pub mod render;
pub mod pipeline;
pub mod lookup;
pub mod export;
pub mod server;

#[cfg(test)]
mod test_support;

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use pipeline::{DashboardRequest, PipelineState};
use projection::HoverField;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use types::{FilterSelection, Nativity};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SelectionArgs {
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,
    /// Industry name, or "All"
    #[arg(short, long, default_value = "All")]
    industry: String,
    /// All, 1 (Domestic) or 0 (Foreign-Born)
    #[arg(short, long, default_value = "All")]
    nativity: Nativity,
    /// Write here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard API
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Run the pipeline once and print the dashboard JSON
    Render {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Hover field key (repeatable); defaults to the configured set
        #[arg(long = "hover", value_name = "KEY")]
        hover: Vec<HoverField>,
        /// Selected table row index (repeatable)
        #[arg(long = "selected", value_name = "INDEX", allow_negative_numbers = true)]
        selected: Vec<i64>,
    },
    /// Export the data table as CSV
    Export {
        #[command(flatten)]
        selection: SelectionArgs,
    },
}

fn output_writer(output: &Option<PathBuf>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create output file: {:?}", path))?,
        ),
        None => Box::new(io::stdout().lock()),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            info!("Serving dashboard with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(&config)?;
            server::start_server(app_config).await?;
        }
        Commands::Render { selection, hover, selected } => {
            let app_config = config::AppConfig::load_from_file(&selection.config)?;
            let hover_fields = if hover.is_empty() {
                app_config.display.default_hover_fields.clone()
            } else {
                hover
            };
            let request = DashboardRequest::new(
                FilterSelection::new(selection.industry, selection.nativity),
                hover_fields,
            )
            .with_selected_rows(selected);

            let update = pipeline::run(&app_config, &request)?;
            info!(state = ?update.state, rows = update.table.len(), "Rendered dashboard");

            let mut writer = output_writer(&selection.output)?;
            serde_json::to_writer_pretty(&mut writer, &update).context("Failed to write dashboard JSON")?;
            writeln!(writer)?;
        }
        Commands::Export { selection } => {
            let app_config = config::AppConfig::load_from_file(&selection.config)?;
            let request = DashboardRequest::new(
                FilterSelection::new(selection.industry, selection.nativity),
                Vec::new(),
            );

            let update = pipeline::run(&app_config, &request)?;
            if update.state != PipelineState::Ready {
                let title = update.figure.title().unwrap_or("No data").to_string();
                return Err(anyhow!(title));
            }

            let writer = output_writer(&selection.output)?;
            export::write_table(writer, &update.table)?;
            info!(rows = update.table.len(), "Exported table");
        }
    }

    Ok(())
}
