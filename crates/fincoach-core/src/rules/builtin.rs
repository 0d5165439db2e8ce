//! Built-in heuristic rules
//!
//! Each rule reads the shared snapshot and appends to the findings. Rules never
//! read each other's output.

use crate::models::{format_money, BudgetState};

use super::engine::{Findings, Rule, RuleContext};
use super::types::{Alert, AlertKind, Priority, Recommendation, RuleId, Severity};

/// Month-over-month spending change
pub struct TrendRule;

impl Rule for TrendRule {
    fn id(&self) -> RuleId {
        RuleId::Trend
    }

    fn name(&self) -> &'static str {
        "Spending Trend"
    }

    fn apply(&self, ctx: &RuleContext<'_>, out: &mut Findings) {
        let Some(latest) = ctx.snapshot.latest_change() else {
            return;
        };
        let Some(change) = latest.change_percent else {
            return;
        };
        let currency = &ctx.snapshot.currency;

        if change > ctx.thresholds.trend_increase_percent {
            out.alert(
                Alert::new(
                    AlertKind::SpendingIncrease,
                    Severity::High,
                    format!("Spending increased by {:.1}% compared to last month", change),
                )
                .with_amount(latest.amount),
            );
            out.insight(format!(
                "Spending in {} rose to {} from {} the month before",
                latest.month,
                format_money(latest.amount, currency),
                format_money(latest.previous_amount, currency)
            ));
        } else if change < ctx.thresholds.trend_decrease_percent {
            out.insight(format!(
                "Great job! Spending decreased by {:.1}% compared to last month",
                change.abs()
            ));
            out.recommend(Recommendation::new(
                Priority::Low,
                "Maintain momentum",
                format!(
                    "You spent {} less in {}. Move the difference into savings to lock it in.",
                    format_money(latest.previous_amount - latest.amount, currency),
                    latest.month
                ),
            ));
        }
    }
}

/// Spending relative to monthly income
pub struct BudgetHealthRule;

impl Rule for BudgetHealthRule {
    fn id(&self) -> RuleId {
        RuleId::BudgetHealth
    }

    fn name(&self) -> &'static str {
        "Budget Health"
    }

    fn apply(&self, ctx: &RuleContext<'_>, out: &mut Findings) {
        let Some(monthly_income) = ctx.profile.monthly_income() else {
            return;
        };
        let monthly_expense = ctx.snapshot.averages.monthly;
        let ratio = monthly_expense / monthly_income;
        let th = ctx.thresholds;
        let currency = &ctx.snapshot.currency;

        // Bands are disjoint: the first matching threshold wins
        if ratio > th.critical_spending_ratio {
            out.alert(
                Alert::new(
                    AlertKind::Overspending,
                    Severity::Critical,
                    format!(
                        "You are spending {:.0}% of your monthly income",
                        ratio * 100.0
                    ),
                )
                .with_amount(monthly_expense),
            );
        } else if ratio > th.warning_spending_ratio {
            out.alert(
                Alert::new(
                    AlertKind::HighSpendingRatio,
                    Severity::Medium,
                    format!(
                        "Spending is {:.0}% of your monthly income, leaving little room to save",
                        ratio * 100.0
                    ),
                )
                .with_amount(monthly_expense),
            );
            out.insight(format!(
                "Your current savings rate is {:.1}% of income",
                (1.0 - ratio) * 100.0
            ));
        } else if ratio < th.healthy_spending_ratio {
            out.insight(format!(
                "Healthy spending ratio: you spend only {:.0}% of your income",
                ratio * 100.0
            ));
            out.recommend(Recommendation::new(
                Priority::Medium,
                "Invest your surplus",
                format!(
                    "You have about {} left each month. Put part of it to work in a diversified investment.",
                    format_money(monthly_income - monthly_expense, currency)
                ),
            ));
        }
    }
}

/// Concentration of spend in one or a few categories
pub struct CategoryDominanceRule;

impl Rule for CategoryDominanceRule {
    fn id(&self) -> RuleId {
        RuleId::CategoryDominance
    }

    fn name(&self) -> &'static str {
        "Category Dominance"
    }

    fn apply(&self, ctx: &RuleContext<'_>, out: &mut Findings) {
        let snapshot = ctx.snapshot;
        if snapshot.total_spent <= 0.0 || snapshot.category_breakdown.is_empty() {
            return;
        }
        let currency = &snapshot.currency;

        if let Some((category, amount)) = snapshot.largest_category() {
            let share = amount / snapshot.total_spent * 100.0;
            if share > ctx.thresholds.dominance_share_percent {
                out.alert(
                    Alert::new(
                        AlertKind::CategoryDominance,
                        Severity::Medium,
                        format!(
                            "{} accounts for {:.1}% of your total spending",
                            category.label(),
                            share
                        ),
                    )
                    .with_category(category)
                    .with_amount(amount),
                );
            }
        }

        let mean = snapshot.total_spent / snapshot.category_breakdown.len() as f64;
        let limit = mean * ctx.thresholds.category_outlier_multiplier;
        for (category, amount) in &snapshot.category_breakdown {
            if *amount > limit {
                out.recommend(
                    Recommendation::new(
                        Priority::Medium,
                        format!("Review {} spending", category.label()),
                        format!(
                            "{} spent on {} is more than twice your average category. Look for recurring costs to trim.",
                            format_money(*amount, currency),
                            category.label().to_lowercase()
                        ),
                    )
                    .with_category(*category),
                );
            }
        }
    }
}

/// Short-term spike against the 30-day baseline
pub struct SpikeRule;

impl Rule for SpikeRule {
    fn id(&self) -> RuleId {
        RuleId::Spike
    }

    fn name(&self) -> &'static str {
        "Spending Spike"
    }

    fn apply(&self, ctx: &RuleContext<'_>, out: &mut Findings) {
        let tf = &ctx.snapshot.timeframes;
        let week_avg = tf.last_7_days / 7.0;
        let month_avg = tf.last_30_days / 30.0;
        if month_avg <= 0.0 {
            return;
        }

        if week_avg > ctx.thresholds.spike_multiplier * month_avg {
            let over = (week_avg / month_avg - 1.0) * 100.0;
            out.alert(
                Alert::new(
                    AlertKind::SpendingSpike,
                    Severity::Medium,
                    format!(
                        "Spending spike detected: the last 7 days are {:.0}% above your 30-day average",
                        over
                    ),
                )
                .with_amount(tf.last_7_days),
            );
        }
    }
}

/// Months of expenses covered by savings
pub struct EmergencyFundRule;

impl Rule for EmergencyFundRule {
    fn id(&self) -> RuleId {
        RuleId::EmergencyFund
    }

    fn name(&self) -> &'static str {
        "Emergency Fund"
    }

    fn apply(&self, ctx: &RuleContext<'_>, out: &mut Findings) {
        let Some(savings) = ctx.profile.savings else {
            return;
        };
        if !ctx.profile.has_income() {
            return;
        }
        let monthly_expense = ctx.snapshot.averages.monthly;
        if monthly_expense <= 0.0 {
            return;
        }
        let th = ctx.thresholds;
        let currency = &ctx.snapshot.currency;
        let months = savings / monthly_expense;

        if months < th.emergency_min_months {
            let target = monthly_expense * th.emergency_target_months;
            out.alert(
                Alert::new(
                    AlertKind::LowEmergencyFund,
                    Severity::High,
                    format!(
                        "Your savings cover only {:.1} months of expenses",
                        months
                    ),
                )
                .with_amount(savings),
            );
            out.recommend(Recommendation::new(
                Priority::High,
                "Build an emergency fund",
                format!(
                    "Aim for {:.0} months of expenses ({}). You need about {} more.",
                    th.emergency_target_months,
                    format_money(target, currency),
                    format_money((target - savings).max(0.0), currency)
                ),
            ));
        } else if months >= th.emergency_target_months {
            out.insight(format!(
                "Strong emergency fund: savings cover {:.1} months of expenses",
                months
            ));
        }
    }
}

/// Stated financial goals
pub struct GoalsRule;

impl Rule for GoalsRule {
    fn id(&self) -> RuleId {
        RuleId::Goals
    }

    fn name(&self) -> &'static str {
        "Goals"
    }

    fn apply(&self, ctx: &RuleContext<'_>, out: &mut Findings) {
        let goals = &ctx.profile.goals;
        let Some(first) = goals.first() else {
            return;
        };

        out.insight(format!("You're working towards: {}", goals.join(", ")));
        out.recommend(Recommendation::new(
            Priority::Medium,
            format!("Track progress on {}", first),
            "Set a monthly amount for this goal and review it alongside your spending.",
        ));
    }
}

/// Many purchases in a short time
pub struct FrequencyRule;

impl Rule for FrequencyRule {
    fn id(&self) -> RuleId {
        RuleId::Frequency
    }

    fn name(&self) -> &'static str {
        "Purchase Frequency"
    }

    fn apply(&self, ctx: &RuleContext<'_>, out: &mut Findings) {
        let snapshot = ctx.snapshot;
        if snapshot.transaction_count > ctx.thresholds.frequency_min_total
            && snapshot.last_24h_count > ctx.thresholds.frequency_min_last_24h
        {
            out.insight(format!(
                "You made {} purchases in the last 24 hours. Frequent small purchases add up quickly.",
                snapshot.last_24h_count
            ));
        }
    }
}

/// Per-category budget limits from the budgeting subsystem
pub struct BudgetStatusRule;

impl Rule for BudgetStatusRule {
    fn id(&self) -> RuleId {
        RuleId::BudgetStatus
    }

    fn name(&self) -> &'static str {
        "Budget Status"
    }

    fn apply(&self, ctx: &RuleContext<'_>, out: &mut Findings) {
        let currency = &ctx.snapshot.currency;
        let budgets = match ctx.budgets {
            Some(b) if !b.is_empty() => b,
            _ => {
                out.recommend(Recommendation::new(
                    Priority::High,
                    "Set up budgets",
                    "Create monthly limits for your main spending categories so you can track them.",
                ));
                return;
            }
        };

        for budget in budgets {
            let label = budget.category.label();
            match budget.state {
                BudgetState::Exceeded => {
                    let overage = budget.overage();
                    out.alert(
                        Alert::new(
                            AlertKind::BudgetExceeded,
                            Severity::High,
                            format!(
                                "{} budget exceeded by {}",
                                label,
                                format_money(overage, currency)
                            ),
                        )
                        .with_category(budget.category)
                        .with_amount(overage),
                    );
                }
                BudgetState::Warning => {
                    let used = budget
                        .utilization()
                        .map(|u| format!(" ({:.0}% used)", u))
                        .unwrap_or_default();
                    out.alert(
                        Alert::new(
                            AlertKind::BudgetWarning,
                            Severity::Medium,
                            format!("{} budget is close to its limit{}", label, used),
                        )
                        .with_category(budget.category)
                        .with_amount(budget.spent),
                    );
                }
                BudgetState::OnTrack => {}
            }

            if let Some(utilization) = budget.utilization() {
                if utilization < ctx.thresholds.budget_low_utilization {
                    out.insight(format!(
                        "{} budget is only {:.0}% used",
                        label, utilization
                    ));
                }
            }
        }
    }
}
