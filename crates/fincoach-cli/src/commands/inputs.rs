//! Input loading shared by the analysis commands

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use fincoach_core::import::{load_budgets_json, load_profile_json, load_transactions};
use fincoach_core::{BudgetStatus, Transaction, UserProfile};

use crate::cli::InputArgs;

/// Everything read from the command line's input files
#[derive(Debug)]
pub struct LoadedInputs {
    pub transactions: Vec<Transaction>,
    pub profile: UserProfile,
    pub budgets: Option<Vec<BudgetStatus>>,
    pub now: DateTime<Utc>,
}

pub fn load_inputs(args: &InputArgs) -> Result<LoadedInputs> {
    let transactions = load_transactions(&args.transactions).with_context(|| {
        format!(
            "Failed to load transactions from {}",
            args.transactions.display()
        )
    })?;

    let profile = match &args.profile {
        Some(path) => load_profile_json(path)
            .with_context(|| format!("Failed to load profile from {}", path.display()))?,
        None => UserProfile::default(),
    };

    let budgets = match &args.budgets {
        Some(path) => Some(
            load_budgets_json(path)
                .with_context(|| format!("Failed to load budgets from {}", path.display()))?,
        ),
        None => None,
    };

    let now = match args.as_of.as_deref() {
        Some(date) => resolve_as_of(date)?,
        None => Utc::now(),
    };

    tracing::debug!(
        transactions = transactions.len(),
        has_budgets = budgets.is_some(),
        "Loaded inputs"
    );

    Ok(LoadedInputs {
        transactions,
        profile,
        budgets,
        now,
    })
}

/// End of the given day, so transactions dated that day fall inside every window
pub fn resolve_as_of(date: &str) -> Result<DateTime<Utc>> {
    let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .context("Invalid --as-of date format (use YYYY-MM-DD)")?;
    let end = day
        .and_hms_opt(23, 59, 59)
        .context("Invalid --as-of date")?;
    Ok(end.and_utc())
}
