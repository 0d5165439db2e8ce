//! Core types for the Rule Engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::Category;

/// Identifiers for the built-in rules, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    Trend,
    BudgetHealth,
    CategoryDominance,
    Spike,
    EmergencyFund,
    Goals,
    Frequency,
    BudgetStatus,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::Trend => "trend",
            RuleId::BudgetHealth => "budget_health",
            RuleId::CategoryDominance => "category_dominance",
            RuleId::Spike => "spike",
            RuleId::EmergencyFund => "emergency_fund",
            RuleId::Goals => "goals",
            RuleId::Frequency => "frequency",
            RuleId::BudgetStatus => "budget_status",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity level of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    /// Sort rank (lower = more urgent)
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
        }
    }

    /// Points deducted from the health score per alert
    pub fn penalty(&self) -> i32 {
        match self {
            Severity::Critical => 20,
            Severity::High => 15,
            Severity::Medium => 10,
            Severity::Low => 5,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// Machine-readable alert tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    SpendingIncrease,
    Overspending,
    HighSpendingRatio,
    CategoryDominance,
    SpendingSpike,
    LowEmergencyFund,
    BudgetExceeded,
    BudgetWarning,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::SpendingIncrease => "SPENDING_INCREASE",
            AlertKind::Overspending => "OVERSPENDING",
            AlertKind::HighSpendingRatio => "HIGH_SPENDING_RATIO",
            AlertKind::CategoryDominance => "CATEGORY_DOMINANCE",
            AlertKind::SpendingSpike => "SPENDING_SPIKE",
            AlertKind::LowEmergencyFund => "LOW_EMERGENCY_FUND",
            AlertKind::BudgetExceeded => "BUDGET_EXCEEDED",
            AlertKind::BudgetWarning => "BUDGET_WARNING",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A severity-tagged warning about the user's financial state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Amount the alert refers to (overage, monthly spend, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

impl Alert {
    pub fn new(kind: AlertKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            category: None,
            amount: None,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }
}

/// Advisory priority attached to a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Sort rank (lower = more important)
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A suggested action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    /// Short action title
    pub action: String,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl Recommendation {
    pub fn new(priority: Priority, action: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            priority,
            action: action.into(),
            detail: detail.into(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }
}

/// How recommendations are ordered before truncation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationOrder {
    /// Keep the order the rules appended them in
    #[default]
    AsEmitted,
    /// Stable sort by priority (high first)
    ByPriority,
}

impl FromStr for RecommendationOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "as_emitted" => Ok(RecommendationOrder::AsEmitted),
            "by_priority" => Ok(RecommendationOrder::ByPriority),
            _ => Err(format!("Unknown recommendation order: {}", s)),
        }
    }
}

/// Everything the rules emitted for one snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleOutput {
    /// Ordered by severity (critical first)
    pub alerts: Vec<Alert>,
    /// Deduplicated, first-seen order
    pub insights: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    /// 0-100
    pub health_score: u8,
}

impl RuleOutput {
    pub fn has_critical(&self) -> bool {
        self.alerts.iter().any(|a| a.severity == Severity::Critical)
    }

    pub fn alerts_of(&self, kind: AlertKind) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(move |a| a.kind == kind)
    }
}

/// Numeric thresholds used by the built-in rules
#[derive(Debug, Clone)]
pub struct RuleThresholds {
    /// Month-over-month increase (%) that raises an alert
    pub trend_increase_percent: f64,
    /// Month-over-month change (%) counted as a meaningful decrease
    pub trend_decrease_percent: f64,
    pub critical_spending_ratio: f64,
    pub warning_spending_ratio: f64,
    pub healthy_spending_ratio: f64,
    /// Share (%) of total spend for the largest category to dominate
    pub dominance_share_percent: f64,
    /// Multiple of the mean per-category spend that earns a review
    pub category_outlier_multiplier: f64,
    pub spike_multiplier: f64,
    pub emergency_min_months: f64,
    pub emergency_target_months: f64,
    pub frequency_min_total: usize,
    pub frequency_min_last_24h: usize,
    /// Utilization (%) below which a budget is called out as comfortable
    pub budget_low_utilization: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            trend_increase_percent: 20.0,
            trend_decrease_percent: -15.0,
            critical_spending_ratio: 0.9,
            warning_spending_ratio: 0.75,
            healthy_spending_ratio: 0.6,
            dominance_share_percent: 40.0,
            category_outlier_multiplier: 2.0,
            spike_multiplier: 1.3,
            emergency_min_months: 3.0,
            emergency_target_months: 6.0,
            frequency_min_total: 10,
            frequency_min_last_24h: 5,
            budget_low_utilization: 50.0,
        }
    }
}
