pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "weather")]
#[command(about = "Weather API maintenance: schema setup and bulk reading import/delete")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create the users, weather and logs tables")]
    Migrate,

    #[command(about = "Import weather readings from a JSON array file")]
    Import {
        #[arg(help = "Path to a JSON file holding an array of readings")]
        file: String,
    },

    #[command(about = "Delete every stored weather reading")]
    Delete,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = AppConfig::from_env()?;

    match cli.command {
        Commands::Migrate => commands::migrate::handle(&config, output_format).await,
        Commands::Import { file } => commands::readings::import(&config, &file, output_format).await,
        Commands::Delete => commands::readings::delete_all(&config, output_format).await,
    }
}
