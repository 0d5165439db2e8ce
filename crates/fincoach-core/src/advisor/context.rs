//! Financial context block injected into personal-finance prompts
//!
//! Every figure comes from the snapshot, the rule output or the profile on
//! file. Missing values render as "not provided".

use serde::Serialize;
use std::fmt;

use crate::models::{format_money, Category};
use crate::rules::RuleOutput;

use super::AdviceContext;

pub const NOT_PROVIDED: &str = "not provided";

/// Risk descriptor derived from the health score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    Elevated,
    High,
}

impl RiskLevel {
    pub fn from_health_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => RiskLevel::Low,
            60..=79 => RiskLevel::Moderate,
            40..=59 => RiskLevel::Elevated,
            _ => RiskLevel::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::Elevated => "elevated",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Figures describing the user's situation
#[derive(Debug, Clone, Serialize)]
pub struct FinancialContext {
    pub monthly_income: Option<f64>,
    pub monthly_expenses: f64,
    pub monthly_surplus: Option<f64>,
    pub savings: Option<f64>,
    pub health_score: u8,
    pub risk: RiskLevel,
    pub top_categories: Vec<(Category, f64)>,
    pub goals: Vec<String>,
    pub currency: String,
}

impl FinancialContext {
    pub fn build(ctx: &AdviceContext<'_>, top_n: usize) -> Self {
        let monthly_income = ctx.profile.monthly_income();
        let monthly_expenses = ctx.snapshot.averages.monthly;

        Self {
            monthly_income,
            monthly_expenses,
            monthly_surplus: monthly_income.map(|income| income - monthly_expenses),
            savings: ctx.profile.savings,
            health_score: ctx.rules.health_score,
            risk: RiskLevel::from_health_score(ctx.rules.health_score),
            top_categories: ctx.snapshot.top_categories(top_n),
            goals: ctx.profile.goals.clone(),
            currency: ctx.snapshot.currency.clone(),
        }
    }

    /// Months of expenses covered by savings, if both are known
    pub fn emergency_months(&self) -> Option<f64> {
        match self.savings {
            Some(savings) if self.monthly_expenses > 0.0 => Some(savings / self.monthly_expenses),
            _ => None,
        }
    }

    fn money(&self, amount: f64) -> String {
        format_money(amount, &self.currency)
    }

    fn money_or_missing(&self, amount: Option<f64>) -> String {
        amount
            .map(|a| self.money(a))
            .unwrap_or_else(|| NOT_PROVIDED.to_string())
    }

    /// Render the bullet-list block used in prompts
    pub fn render(&self) -> String {
        let categories = if self.top_categories.is_empty() {
            "none recorded".to_string()
        } else {
            self.top_categories
                .iter()
                .map(|(cat, amount)| format!("{} {}", cat.label(), self.money(*amount)))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let goals = if self.goals.is_empty() {
            NOT_PROVIDED.to_string()
        } else {
            self.goals.join(", ")
        };

        [
            format!("- Monthly income: {}", self.money_or_missing(self.monthly_income)),
            format!("- Monthly expenses: {}", self.money(self.monthly_expenses)),
            format!("- Monthly surplus: {}", self.money_or_missing(self.monthly_surplus)),
            format!("- Savings: {}", self.money_or_missing(self.savings)),
            format!(
                "- Financial health: {}/100 ({} risk)",
                self.health_score, self.risk
            ),
            format!("- Top spending categories: {}", categories),
            format!("- Goals: {}", goals),
        ]
        .join("\n")
    }
}

/// Alert messages as a bullet list (empty string when there are none)
pub fn render_alerts(rules: &RuleOutput) -> String {
    rules
        .alerts
        .iter()
        .map(|a| format!("- [{}] {}", a.severity, a.message))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{AnalysisSnapshot, Averages};
    use crate::models::UserProfile;
    use std::collections::BTreeMap;

    fn snapshot() -> AnalysisSnapshot {
        let mut breakdown = BTreeMap::new();
        breakdown.insert(Category::Food, 500.0);
        breakdown.insert(Category::Transport, 300.0);
        breakdown.insert(Category::Bills, 900.0);
        breakdown.insert(Category::Other, 50.0);
        AnalysisSnapshot {
            total_spent: 1750.0,
            category_breakdown: breakdown,
            averages: Averages {
                daily: 100.0,
                weekly: 700.0,
                monthly: 3000.0,
            },
            currency: "$".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_risk_levels() {
        assert_eq!(RiskLevel::from_health_score(100), RiskLevel::Low);
        assert_eq!(RiskLevel::from_health_score(80), RiskLevel::Low);
        assert_eq!(RiskLevel::from_health_score(79), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_health_score(40), RiskLevel::Elevated);
        assert_eq!(RiskLevel::from_health_score(0), RiskLevel::High);
    }

    #[test]
    fn test_render_full_profile() {
        let snap = snapshot();
        let rules = RuleOutput {
            health_score: 72,
            ..Default::default()
        };
        let profile = UserProfile {
            income: Some(60_000.0),
            savings: Some(12_000.0),
            goals: vec!["Car".to_string()],
            ..Default::default()
        };
        let ctx = AdviceContext::new(&snap, &rules, &profile);
        let fc = FinancialContext::build(&ctx, 3);
        let block = fc.render();

        assert!(block.contains("- Monthly income: $5,000.00"));
        assert!(block.contains("- Monthly surplus: $2,000.00"));
        assert!(block.contains("- Savings: $12,000.00"));
        assert!(block.contains("72/100 (moderate risk)"));
        assert!(block.contains("Bills $900.00, Food $500.00, Transport $300.00"));
        assert!(!block.contains("Other"));
        assert!(block.contains("- Goals: Car"));
        assert_eq!(fc.emergency_months(), Some(4.0));
    }

    #[test]
    fn test_render_missing_profile() {
        let snap = AnalysisSnapshot::default();
        let rules = RuleOutput::default();
        let profile = UserProfile::default();
        let ctx = AdviceContext::new(&snap, &rules, &profile);
        let block = FinancialContext::build(&ctx, 3).render();

        assert!(block.contains("- Monthly income: not provided"));
        assert!(block.contains("- Monthly surplus: not provided"));
        assert!(block.contains("- Savings: not provided"));
        assert!(block.contains("- Top spending categories: none recorded"));
        assert!(block.contains("- Goals: not provided"));
    }
}
