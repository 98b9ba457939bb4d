use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use shoplist_core::tracing_setup::init_tracing_with_service;
use shoplist_core::CoreConfig;

mod commands;

use commands::{run_command, CliCommand};

#[derive(Parser)]
#[command(name = "shoplist")]
#[command(about = "Offline-first shopping list synced with the list backend")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, short)]
    pretty: bool,

    /// Path to JSON config file (dataDir, apiKey, clientId, endpoints)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Start-up flags as JSON ({"apiKey", "clientId", "userAgent"}), applied over the config file
    #[arg(long)]
    flags: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync and print the visible items
    List,

    /// Add an item
    Add {
        title: String,
        /// Tag to attach (can be specified multiple times)
        #[arg(long, short = 't')]
        tag: Vec<String>,
    },

    /// Change the title or tags of an item
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        /// Replacement tags (can be specified multiple times)
        #[arg(long, short = 't')]
        tag: Vec<String>,
    },

    /// Cross an item off, or restore it
    Toggle { id: String },

    /// Delete an item
    Delete { id: String },

    /// Delete every crossed-off item
    DeleteDone,

    /// Push the full list and merge the server's view
    Sync,

    /// Toggle the ranking from the sort service
    Sort,

    /// Toggle a tag filter
    Filter {
        tag: Option<String>,
        /// Toggle the "items without tags" filter instead
        #[arg(long)]
        untagged: bool,
    },

    /// Apply live messages read from stdin as "<subject> <json>" lines
    Listen,
}

#[tokio::main]
async fn main() {
    init_tracing_with_service("shoplist-cli");
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref(), cli.flags.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    let command = match cli.command {
        Some(Commands::List) => CliCommand::List,
        Some(Commands::Add { title, tag }) => CliCommand::Add { title, tags: tag },
        Some(Commands::Edit { id, title, tag }) => CliCommand::Edit {
            id,
            title,
            tags: tag,
        },
        Some(Commands::Toggle { id }) => CliCommand::Toggle { id },
        Some(Commands::Delete { id }) => CliCommand::Delete { id },
        Some(Commands::DeleteDone) => CliCommand::DeleteDone,
        Some(Commands::Sync) => CliCommand::Sync,
        Some(Commands::Sort) => CliCommand::Sort,
        Some(Commands::Filter { tag, untagged }) => CliCommand::Filter { tag, untagged },
        Some(Commands::Listen) => CliCommand::Listen,
        None => {
            eprintln!("No command specified. Use --help for usage.");
            std::process::exit(1);
        }
    };

    match run_command(config, command).await {
        Ok(output) => {
            let rendered = if cli.pretty {
                serde_json::to_string_pretty(&output)
            } else {
                serde_json::to_string(&output)
            };
            match rendered {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Config file if given, defaults otherwise; start-up flags and then the environment override it.
fn load_config(path: Option<&PathBuf>, flags: Option<&str>) -> anyhow::Result<CoreConfig> {
    let mut config = match path {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };
    if let Some(flags) = flags {
        let flags: serde_json::Value =
            serde_json::from_str(flags).context("Failed to parse --flags JSON")?;
        config = config.with_flags(&flags);
    }
    Ok(config.apply_env())
}
