//! Rule Engine - runs the ordered rule set and post-processes the findings

use std::collections::HashSet;

use crate::analyzer::AnalysisSnapshot;
use crate::models::{BudgetStatus, UserProfile};

use super::builtin::{
    BudgetHealthRule, BudgetStatusRule, CategoryDominanceRule, EmergencyFundRule, FrequencyRule,
    GoalsRule, SpikeRule, TrendRule,
};
use super::types::{
    Alert, Recommendation, RecommendationOrder, RuleId, RuleOutput, RuleThresholds,
};

/// Starting point of the health score before penalties and bonuses
const BASE_SCORE: i32 = 80;
const INSIGHT_BONUS_CAP: i32 = 15;
const PROFILE_BONUS: i32 = 5;

/// Context provided to every rule
pub struct RuleContext<'a> {
    pub snapshot: &'a AnalysisSnapshot,
    pub profile: &'a UserProfile,
    /// Per-category budgets, if the budgeting subsystem supplied any
    pub budgets: Option<&'a [BudgetStatus]>,
    pub thresholds: &'a RuleThresholds,
}

/// Accumulator the rules append to
#[derive(Debug, Default)]
pub struct Findings {
    pub alerts: Vec<Alert>,
    pub insights: Vec<String>,
    pub recommendations: Vec<Recommendation>,
}

impl Findings {
    pub fn alert(&mut self, alert: Alert) {
        self.alerts.push(alert);
    }

    pub fn insight(&mut self, insight: impl Into<String>) {
        self.insights.push(insight.into());
    }

    pub fn recommend(&mut self, recommendation: Recommendation) {
        self.recommendations.push(recommendation);
    }

    fn counts(&self) -> (usize, usize, usize) {
        (
            self.alerts.len(),
            self.insights.len(),
            self.recommendations.len(),
        )
    }
}

/// A single heuristic rule
pub trait Rule: Send + Sync {
    fn id(&self) -> RuleId;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Evaluate against the snapshot and append findings
    fn apply(&self, ctx: &RuleContext<'_>, out: &mut Findings);
}

/// Runs registered rules in order and produces a [`RuleOutput`]
pub struct RuleEngine {
    rules: Vec<Box<dyn Rule>>,
    thresholds: RuleThresholds,
    max_recommendations: usize,
    recommendation_order: RecommendationOrder,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleEngine {
    /// Create an engine with the built-in rules in their fixed order
    pub fn new() -> Self {
        let mut engine = Self {
            rules: vec![],
            thresholds: RuleThresholds::default(),
            max_recommendations: 5,
            recommendation_order: RecommendationOrder::AsEmitted,
        };

        engine.register(Box::new(TrendRule));
        engine.register(Box::new(BudgetHealthRule));
        engine.register(Box::new(CategoryDominanceRule));
        engine.register(Box::new(SpikeRule));
        engine.register(Box::new(EmergencyFundRule));
        engine.register(Box::new(GoalsRule));
        engine.register(Box::new(FrequencyRule));
        engine.register(Box::new(BudgetStatusRule));

        engine
    }

    pub fn with_max_recommendations(mut self, max: usize) -> Self {
        self.max_recommendations = max;
        self
    }

    pub fn with_recommendation_order(mut self, order: RecommendationOrder) -> Self {
        self.recommendation_order = order;
        self
    }

    pub fn with_thresholds(mut self, thresholds: RuleThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Register a rule; it runs after the ones already registered
    pub fn register(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn rule_ids(&self) -> Vec<RuleId> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    /// Evaluate every rule against the snapshot
    pub fn apply(
        &self,
        snapshot: &AnalysisSnapshot,
        profile: &UserProfile,
        budgets: Option<&[BudgetStatus]>,
    ) -> RuleOutput {
        let ctx = RuleContext {
            snapshot,
            profile,
            budgets,
            thresholds: &self.thresholds,
        };
        let mut findings = Findings::default();

        for rule in &self.rules {
            let before = findings.counts();
            rule.apply(&ctx, &mut findings);
            let after = findings.counts();
            tracing::debug!(
                rule = rule.id().as_str(),
                alerts = after.0 - before.0,
                insights = after.1 - before.1,
                recommendations = after.2 - before.2,
                "Rule evaluated"
            );
        }

        self.finish(findings, profile)
    }

    fn finish(&self, findings: Findings, profile: &UserProfile) -> RuleOutput {
        let Findings {
            mut alerts,
            insights,
            mut recommendations,
        } = findings;

        let insights = dedupe(insights);

        // Stable: alerts of equal severity keep rule order
        alerts.sort_by_key(|a| a.severity.rank());

        if self.recommendation_order == RecommendationOrder::ByPriority {
            recommendations.sort_by_key(|r| r.priority.rank());
        }
        recommendations.truncate(self.max_recommendations);

        let health_score = health_score(&alerts, insights.len(), profile);

        RuleOutput {
            alerts,
            insights,
            recommendations,
            health_score,
        }
    }
}

/// Apply the default rule set
pub fn apply_rules(
    snapshot: &AnalysisSnapshot,
    profile: &UserProfile,
    budgets: Option<&[BudgetStatus]>,
) -> RuleOutput {
    RuleEngine::new().apply(snapshot, profile, budgets)
}

/// Derive the 0-100 health score.
///
/// Starts at 80, subtracts a per-severity penalty for each alert, adds 2 points
/// per insight (capped at 15) and 5 each for having income and goals on file.
pub fn health_score(alerts: &[Alert], insight_count: usize, profile: &UserProfile) -> u8 {
    let penalties: i32 = alerts.iter().map(|a| a.severity.penalty()).sum();
    let insight_bonus = (insight_count.min(INSIGHT_BONUS_CAP as usize) as i32 * 2)
        .min(INSIGHT_BONUS_CAP);

    let mut score = BASE_SCORE - penalties + insight_bonus;
    if profile.has_income() {
        score += PROFILE_BONUS;
    }
    if !profile.goals.is_empty() {
        score += PROFILE_BONUS;
    }

    score.clamp(0, 100) as u8
}

fn dedupe(insights: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    insights
        .into_iter()
        .filter(|i| seen.insert(i.clone()))
        .collect()
}
