//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Fincoach - Understand your spending and get grounded advice
#[derive(Parser)]
#[command(name = "fincoach")]
#[command(about = "Local financial insight pipeline", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Input files shared by the analysis commands
#[derive(Args, Clone, Debug)]
pub struct InputArgs {
    /// Transactions file (.json array or .csv with date,description,category,amount)
    #[arg(short, long)]
    pub transactions: PathBuf,

    /// Profile JSON (income, savings, goals, currency)
    #[arg(short, long)]
    pub profile: Option<PathBuf>,

    /// Budget status JSON array
    #[arg(short, long)]
    pub budgets: Option<PathBuf>,

    /// Analysis date (YYYY-MM-DD, defaults to now)
    #[arg(long)]
    pub as_of: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the spending snapshot as JSON
    Analyze {
        #[command(flatten)]
        inputs: InputArgs,
    },

    /// Show how a question is interpreted
    Classify {
        /// The question to classify
        question: String,
    },

    /// Evaluate the rule set (alerts, insights, recommendations, health score)
    Rules {
        #[command(flatten)]
        inputs: InputArgs,

        /// Output JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Ask a question about your finances
    Ask {
        /// The question
        question: String,

        #[command(flatten)]
        inputs: InputArgs,

        /// Never call a generation backend; use the offline answer
        #[arg(long)]
        offline: bool,

        /// Output the full response record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage prompt templates
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all available prompts and their override status
    List,

    /// Show the content of a specific prompt
    Show {
        /// Prompt ID (e.g., finance_advisor, general_assistant)
        prompt_id: String,
    },

    /// Show the path where prompt overrides should be placed
    Path,
}
