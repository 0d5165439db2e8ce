//! Rule Engine - heuristic evaluation of a spending snapshot
//!
//! Applies a fixed, ordered set of rules to an [`AnalysisSnapshot`] and
//! produces severity-ranked alerts, deduplicated insights, capped
//! recommendations and a 0-100 health score. Pure: no rule touches I/O.
//!
//! ## Built-in Rules (evaluation order)
//!
//! 1. **Trend** - month-over-month change
//! 2. **Budget Health** - spending as a share of income
//! 3. **Category Dominance** - concentration in one category
//! 4. **Spike** - last 7 days against the 30-day baseline
//! 5. **Emergency Fund** - months of expenses covered by savings
//! 6. **Goals** - stated goals
//! 7. **Frequency** - many purchases in the last 24 hours
//! 8. **Budget Status** - per-category budget limits
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fincoach_core::rules::apply_rules;
//!
//! let output = apply_rules(&snapshot, &profile, Some(&budgets));
//! println!("health: {}", output.health_score);
//! ```
//!
//! [`AnalysisSnapshot`]: crate::analyzer::AnalysisSnapshot

pub mod builtin;
pub mod engine;
pub mod types;

pub use engine::{apply_rules, health_score, Findings, Rule, RuleContext, RuleEngine};
pub use types::{
    Alert, AlertKind, Priority, Recommendation, RecommendationOrder, RuleId, RuleOutput,
    RuleThresholds, Severity,
};
