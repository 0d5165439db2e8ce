//! Insight pipeline - classify, analyze, evaluate rules, then answer
//!
//! One request, one pass. Classification and analysis are independent and run
//! concurrently; the rule engine only sees the snapshot; the dispatcher sees
//! everything. `ask` always produces a response.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::advisor::{AdviceContext, Advisor, ResponseSource, Strategy};
use crate::ai::AIClient;
use crate::analyzer::{analyze, AnalysisSnapshot};
use crate::cache::{data_version, SnapshotCache};
use crate::classifier::{ClassificationBundle, QuestionClassifier};
use crate::config::AdvisorConfig;
use crate::models::{BudgetStatus, ChatTurn, Transaction, UserProfile};
use crate::rules::{RuleEngine, RuleOutput};

/// Everything one question needs
#[derive(Debug, Clone)]
pub struct AskRequest {
    pub question: String,
    pub transactions: Vec<Transaction>,
    pub profile: UserProfile,
    pub budgets: Option<Vec<BudgetStatus>>,
    pub history: Vec<ChatTurn>,
    pub conversation_id: Option<String>,
    /// Cache key; snapshots are only cached for identified users
    pub user_id: Option<String>,
    pub now: DateTime<Utc>,
}

impl AskRequest {
    pub fn new(question: impl Into<String>, transactions: Vec<Transaction>, now: DateTime<Utc>) -> Self {
        Self {
            question: question.into(),
            transactions,
            profile: UserProfile::default(),
            budgets: None,
            history: Vec::new(),
            conversation_id: None,
            user_id: None,
            now,
        }
    }

    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_budgets(mut self, budgets: Vec<BudgetStatus>) -> Self {
        self.budgets = Some(budgets);
        self
    }

    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    pub fn with_user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }
}

/// Response-layer record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceResponse {
    pub response: String,
    pub model: String,
    pub confidence: f64,
    pub fallback: bool,
    pub source: ResponseSource,
    pub needs_realtime: bool,
    pub strategy: Strategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// Intermediate results, exposed for callers that want more than the answer
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub classification: ClassificationBundle,
    pub snapshot: Arc<AnalysisSnapshot>,
    pub rules: RuleOutput,
    pub response: AdviceResponse,
}

/// Wires the classifier, analyzer, rule engine and dispatcher
pub struct InsightPipeline {
    classifier: QuestionClassifier,
    rules: RuleEngine,
    advisor: Advisor,
    cache: Option<SnapshotCache>,
}

impl InsightPipeline {
    pub fn new(client: Option<AIClient>, config: AdvisorConfig) -> Self {
        let rules = config.rule_engine();
        Self::from_parts(Advisor::new(client, config), rules)
    }

    /// Pipeline with no generation backend
    pub fn offline(config: AdvisorConfig) -> Self {
        Self::new(None, config)
    }

    pub fn from_parts(advisor: Advisor, rules: RuleEngine) -> Self {
        Self {
            classifier: QuestionClassifier::new(),
            rules,
            advisor,
            cache: None,
        }
    }

    /// Memoize snapshots per user id
    pub fn with_cache(mut self) -> Self {
        self.cache = Some(SnapshotCache::new());
        self
    }

    pub fn cache(&self) -> Option<&SnapshotCache> {
        self.cache.as_ref()
    }

    pub fn advisor(&self) -> &Advisor {
        &self.advisor
    }

    /// Answer a question
    pub async fn ask(&self, request: AskRequest) -> AdviceResponse {
        self.run(request).await.response
    }

    /// Answer a question and keep the intermediate results
    pub async fn run(&self, request: AskRequest) -> PipelineOutput {
        let (classification, (snapshot, rules)) = tokio::join!(
            async { self.classifier.classify(&request.question) },
            async {
                let snapshot = self.snapshot(&request);
                let rules = self
                    .rules
                    .apply(&snapshot, &request.profile, request.budgets.as_deref());
                (snapshot, rules)
            }
        );

        debug!(
            question_type = classification.question_type.as_str(),
            alerts = rules.alerts.len(),
            health_score = rules.health_score,
            "Pipeline stages complete"
        );

        let ctx = AdviceContext::new(&snapshot, &rules, &request.profile);
        let advice = self
            .advisor
            .respond(&request.question, &ctx, &classification, &request.history)
            .await;

        let response = AdviceResponse {
            fallback: advice.is_fallback(),
            response: advice.text,
            model: advice.model,
            confidence: advice.confidence,
            source: advice.source,
            needs_realtime: advice.needs_realtime,
            strategy: advice.strategy,
            conversation_id: request.conversation_id.clone(),
        };

        PipelineOutput {
            classification,
            snapshot,
            rules,
            response,
        }
    }

    fn snapshot(&self, request: &AskRequest) -> Arc<AnalysisSnapshot> {
        match (&self.cache, &request.user_id) {
            (Some(cache), Some(user)) => {
                let version =
                    data_version(&request.transactions, &request.profile, request.now);
                cache.get_or_compute(user, version, || {
                    analyze(&request.transactions, &request.profile, request.now)
                })
            }
            _ => Arc::new(analyze(&request.transactions, &request.profile, request.now)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::FALLBACK_MODEL;
    use crate::ai::MockBackend;
    use crate::models::Category;
    use crate::prompts::PromptLibrary;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn transactions() -> Vec<Transaction> {
        vec![
            Transaction::new(500.0, Category::Food, "groceries", now() - Duration::days(2)),
            Transaction::new(300.0, Category::Transport, "fuel", now() - Duration::days(5)),
        ]
    }

    fn mock_pipeline(mock: &MockBackend) -> InsightPipeline {
        let config = AdvisorConfig::default();
        let advisor = Advisor::new(Some(AIClient::Mock(mock.clone())), config.clone())
            .with_prompts(PromptLibrary::embedded_only());
        InsightPipeline::from_parts(advisor, config.rule_engine())
    }

    #[tokio::test]
    async fn test_ask_generated() {
        let mock = MockBackend::replying("Cut back on groceries.");
        let pipeline = mock_pipeline(&mock);
        let request = AskRequest::new("How can I reduce my spending?", transactions(), now())
            .with_conversation_id("conv-1");

        let response = pipeline.ask(request).await;
        assert_eq!(response.response, "Cut back on groceries.");
        assert!(!response.fallback);
        assert_eq!(response.source, ResponseSource::Generated);
        assert_eq!(response.conversation_id.as_deref(), Some("conv-1"));
    }

    #[tokio::test]
    async fn test_ask_offline() {
        let pipeline = InsightPipeline::offline(AdvisorConfig::default());
        let request = AskRequest::new("How can I reduce my spending?", transactions(), now());

        let output = pipeline.run(request).await;
        assert!(output.response.fallback);
        assert_eq!(output.response.model, FALLBACK_MODEL);
        assert!(output.response.response.contains("$800.00"));
        assert_eq!(output.snapshot.total_spent, 800.0);
        assert!(output.rules.health_score <= 100);
    }

    #[tokio::test]
    async fn test_cache_reuses_snapshot() {
        let pipeline = InsightPipeline::offline(AdvisorConfig::default()).with_cache();
        let request = AskRequest::new("hello", transactions(), now()).with_user_id("u1");

        let first = pipeline.run(request.clone()).await;
        let second = pipeline.run(request.clone()).await;
        assert!(Arc::ptr_eq(&first.snapshot, &second.snapshot));

        let mut changed = request;
        changed.transactions.pop();
        let third = pipeline.run(changed).await;
        assert_eq!(third.snapshot.total_spent, 500.0);
    }

    #[tokio::test]
    async fn test_cache_follows_rolling_window_within_a_day() {
        let pipeline = InsightPipeline::offline(AdvisorConfig::default()).with_cache();
        let late_evening = Utc.with_ymd_and_hms(2024, 6, 14, 22, 50, 0).unwrap();
        let mut txs: Vec<Transaction> = (0..12)
            .map(|i| Transaction::new(10.0, Category::Food, format!("snack {}", i), late_evening))
            .collect();
        txs.push(Transaction::new(
            25.0,
            Category::Food,
            "dinner",
            Utc.with_ymd_and_hms(2024, 6, 15, 22, 0, 0).unwrap(),
        ));

        let early = Utc.with_ymd_and_hms(2024, 6, 15, 1, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 6, 15, 23, 0, 0).unwrap();

        // the dinner is still in the future at 01:00
        let first = pipeline
            .run(AskRequest::new("hello", txs.clone(), early).with_user_id("u1"))
            .await;
        assert_eq!(first.snapshot.last_24h_count, 12);

        let second = pipeline
            .run(AskRequest::new("hello", txs, late).with_user_id("u1"))
            .await;
        assert_eq!(second.snapshot.last_24h_count, 1);
        assert!(!Arc::ptr_eq(&first.snapshot, &second.snapshot));
    }

    #[tokio::test]
    async fn test_cache_follows_currency_change() {
        let pipeline = InsightPipeline::offline(AdvisorConfig::default()).with_cache();
        let request = AskRequest::new("hello", transactions(), now()).with_user_id("u1");

        let first = pipeline.run(request.clone()).await;
        assert_eq!(first.snapshot.currency, "$");

        let rupees = UserProfile {
            currency: "₹".to_string(),
            ..UserProfile::default()
        };
        let second = pipeline.run(request.with_profile(rupees)).await;
        assert_eq!(second.snapshot.currency, "₹");
    }

    #[test]
    fn test_response_serialization() {
        let response = AdviceResponse {
            response: "ok".to_string(),
            model: FALLBACK_MODEL.to_string(),
            confidence: 0.5,
            fallback: true,
            source: ResponseSource::Fallback,
            needs_realtime: false,
            strategy: Strategy::General,
            conversation_id: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["source"], "fallback");
        assert_eq!(json["strategy"], "general");
        assert!(json.get("conversation_id").is_none());
    }
}
