//! CementAI optimizer CLI
//!
//! A command-line tool for running predictions, checking model deployment,
//! refreshing the knowledge corpus and asking the plant assistant.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{chat, knowledge, models, predict, settings, status};
use std::path::PathBuf;

/// CementAI plant optimizer CLI
#[derive(Parser)]
#[command(name = "cementctl")]
#[command(author, version, about = "CLI for the CementAI plant optimizer", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via CEMENTCTL_API_URL env var)
    #[arg(long, env = "CEMENTCTL_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show service status and component health
    Status,

    /// Show 24-hour plant aggregates
    Plant,

    /// Run all eight models and list recommendations
    Predict {
        /// JSON file with plant metrics (missing metrics use nominal values)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Override one metric, e.g. --set tsr_pct=52 (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        assignments: Vec<String>,
    },

    /// Show deployment status of the warehouse models
    Models,

    /// Knowledge corpus management
    #[command(subcommand)]
    Knowledge(KnowledgeCommands),

    /// Ask the plant assistant a question
    Chat {
        /// The question
        message: String,

        /// Saved prediction JSON to use as context (e.g. output of `predict -f json`)
        #[arg(long)]
        context: Option<PathBuf>,

        /// Replace the assistant persona
        #[arg(long)]
        system_prompt: Option<String>,
    },

    /// Local CLI configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum KnowledgeCommands {
    /// Merge the knowledge catalog into the warehouse
    Refresh {
        /// Target table (server default if not specified)
        #[arg(long)]
        table: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the saved configuration
    Show,

    /// Save defaults for later invocations
    Set {
        /// Default API endpoint URL
        #[arg(long)]
        api_url: Option<String>,

        /// Default output format
        #[arg(long)]
        format: Option<output::OutputFormat>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let saved = config::Config::load()?;
    let format = saved.resolve_format(cli.format);

    // Config commands never reach the API
    if let Commands::Config(config_cmd) = cli.command {
        return match config_cmd {
            ConfigCommands::Show => settings::show(&saved, format),
            ConfigCommands::Set { api_url, format } => settings::set(saved, api_url, format),
        };
    }

    // Initialize client
    let client = client::ApiClient::new(&saved.resolve_api_url(cli.api_url.as_deref()))?;

    // Execute command
    match cli.command {
        Commands::Status => status::show_status(&client, format).await?,
        Commands::Plant => status::show_plant(&client, format).await?,
        Commands::Predict { file, assignments } => {
            predict::predict(&client, file.as_deref(), &assignments, format).await?;
        }
        Commands::Models => models::show_models(&client, format).await?,
        Commands::Knowledge(knowledge_cmd) => match knowledge_cmd {
            KnowledgeCommands::Refresh { table } => {
                knowledge::refresh(&client, table, format).await?;
            }
        },
        Commands::Chat {
            message,
            context,
            system_prompt,
        } => {
            chat::ask(&client, &message, context.as_deref(), system_prompt, format).await?;
        }
        Commands::Config(_) => {}
    }

    Ok(())
}
