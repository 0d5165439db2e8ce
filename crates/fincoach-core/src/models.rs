//! Data models for fincoach
//!
//! Transactions, profiles and budget statuses are owned by the persistence
//! layer; the pipeline only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Spending category (fixed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Food,
    Transport,
    Shopping,
    Entertainment,
    Bills,
    Healthcare,
    Education,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Transport => "transport",
            Category::Shopping => "shopping",
            Category::Entertainment => "entertainment",
            Category::Bills => "bills",
            Category::Healthcare => "healthcare",
            Category::Education => "education",
            Category::Other => "other",
        }
    }

    /// Human-readable label for messages
    pub fn label(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Shopping => "Shopping",
            Category::Entertainment => "Entertainment",
            Category::Bills => "Bills",
            Category::Healthcare => "Healthcare",
            Category::Education => "Education",
            Category::Other => "Other",
        }
    }

    pub fn all() -> &'static [Category] {
        &[
            Category::Food,
            Category::Transport,
            Category::Shopping,
            Category::Entertainment,
            Category::Bills,
            Category::Healthcare,
            Category::Education,
            Category::Other,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "food" | "dining" | "groceries" => Ok(Category::Food),
            "transport" | "transportation" | "travel" => Ok(Category::Transport),
            "shopping" => Ok(Category::Shopping),
            "entertainment" => Ok(Category::Entertainment),
            "bills" | "utilities" => Ok(Category::Bills),
            "healthcare" | "health" | "medical" => Ok(Category::Healthcare),
            "education" => Ok(Category::Education),
            "other" => Ok(Category::Other),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// A single spending record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Positive spend amount
    pub amount: f64,
    pub category: Category,
    #[serde(default)]
    pub description: String,
    pub date: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        amount: f64,
        category: Category,
        description: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            amount,
            category,
            description: description.into(),
            date,
        }
    }
}

/// The user's profile as stored by the persistence layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Annual income
    #[serde(default)]
    pub income: Option<f64>,
    #[serde(default)]
    pub savings: Option<f64>,
    #[serde(default)]
    pub goals: Vec<String>,
    /// Currency symbol or code used when rendering amounts
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub age: Option<u32>,
}

fn default_currency() -> String {
    "$".to_string()
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            income: None,
            savings: None,
            goals: Vec::new(),
            currency: default_currency(),
            age: None,
        }
    }
}

impl UserProfile {
    /// Monthly income, if a positive annual income is on file
    pub fn monthly_income(&self) -> Option<f64> {
        self.income.filter(|i| *i > 0.0).map(|i| i / 12.0)
    }

    pub fn has_income(&self) -> bool {
        self.monthly_income().is_some()
    }
}

/// Budget state computed by the budgeting subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetState {
    OnTrack,
    /// Near the limit
    Warning,
    Exceeded,
}

impl BudgetState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetState::OnTrack => "on_track",
            BudgetState::Warning => "warning",
            BudgetState::Exceeded => "exceeded",
        }
    }
}

impl fmt::Display for BudgetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-category budget status supplied alongside the transaction list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub category: Category,
    pub limit: f64,
    pub spent: f64,
    pub state: BudgetState,
}

impl BudgetStatus {
    /// Percentage of the limit used, undefined for non-positive limits
    pub fn utilization(&self) -> Option<f64> {
        if self.limit <= 0.0 {
            return None;
        }
        Some(self.spent / self.limit * 100.0)
    }

    pub fn overage(&self) -> f64 {
        (self.spent - self.limit).max(0.0)
    }
}

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One prior turn of conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Round a currency figure to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Render an amount with a currency symbol and thousands separators
pub fn format_money(amount: f64, currency: &str) -> String {
    let rounded = format!("{:.2}", amount.abs());
    let (whole, cents) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && rounded != "0.00" { "-" } else { "" };
    format!("{}{}{}.{}", sign, currency, grouped, cents)
}
