//! Fincoach CLI - Local financial insight pipeline
//!
//! Usage:
//!   fincoach analyze -t transactions.csv           Print the spending snapshot
//!   fincoach classify "What is a SIP?"             Show question classification
//!   fincoach rules -t tx.json -p profile.json      Alerts and health score
//!   fincoach ask "How can I save more?" -t tx.csv  Full pipeline

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Analyze { inputs } => commands::cmd_analyze(&inputs),
        Commands::Classify { question } => commands::cmd_classify(&question),
        Commands::Rules { inputs, json } => commands::cmd_rules(&inputs, json),
        Commands::Ask {
            question,
            inputs,
            offline,
            json,
        } => commands::cmd_ask(&question, &inputs, offline, json).await,
        Commands::Prompts { action } => match action {
            None | Some(PromptsAction::List) => commands::cmd_prompts_list(),
            Some(PromptsAction::Show { prompt_id }) => commands::cmd_prompts_show(&prompt_id),
            Some(PromptsAction::Path) => commands::cmd_prompts_path(),
        },
    }
}
