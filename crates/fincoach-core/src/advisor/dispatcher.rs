//! Dispatcher - strategy selection, prompt construction and the failure boundary

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::ai::{AIClient, GenerationBackend, GenerationRequest};
use crate::classifier::ClassificationBundle;
use crate::config::AdvisorConfig;
use crate::error::{Error, Result};
use crate::models::ChatTurn;
use crate::prompts::PromptLibrary;

use super::context::{render_alerts, FinancialContext};
use super::fallback;
use super::{Advice, AdviceContext, ResponseSource, Strategy};

/// Model id reported when the fallback generator produced the answer
pub const FALLBACK_MODEL: &str = "local-fallback";

/// Upper bound on confidence for templated answers
const FALLBACK_CONFIDENCE_CAP: f64 = 0.7;

static REALTIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(current|currently|today'?s?|latest|live|now|right\s+now|this\s+week|real[-\s]?time)\b.*\b(price|prices|rate|rates|nav|market|markets|news|index|sensex|nifty|share\s+price|stock\s+price|trading)\b|\b(price|prices|rate|rates|nav|market|news)\b.*\b(today|now|currently|right\s+now|this\s+week)\b",
    )
    .expect("valid regex")
});

/// Whether the question asks for live external facts (prices, rates, news)
pub fn needs_realtime(question: &str) -> bool {
    REALTIME.is_match(question)
}

/// Routes a question to the generation backend or the fallback generator
pub struct Advisor {
    client: Option<AIClient>,
    prompts: Mutex<PromptLibrary>,
    config: AdvisorConfig,
}

impl Advisor {
    /// Create an advisor; `None` means every answer comes from the fallback
    pub fn new(client: Option<AIClient>, config: AdvisorConfig) -> Self {
        Self {
            client,
            prompts: Mutex::new(PromptLibrary::new()),
            config,
        }
    }

    /// Advisor with no backend
    pub fn offline(config: AdvisorConfig) -> Self {
        Self::new(None, config)
    }

    /// Use a specific prompt library (e.g. embedded only)
    pub fn with_prompts(mut self, prompts: PromptLibrary) -> Self {
        self.prompts = Mutex::new(prompts);
        self
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    pub fn client(&self) -> Option<&AIClient> {
        self.client.as_ref()
    }

    /// Pick the prompt strategy for a classified question
    pub fn select_strategy(classification: &ClassificationBundle, realtime: bool) -> Strategy {
        if realtime {
            Strategy::Realtime
        } else if classification.is_personal_finance {
            Strategy::PersonalFinance
        } else {
            Strategy::General
        }
    }

    /// Build the backend request for a strategy.
    ///
    /// The financial context block is only included for personal questions.
    pub fn build_request(
        &self,
        question: &str,
        ctx: &AdviceContext<'_>,
        classification: &ClassificationBundle,
        history: &[ChatTurn],
        strategy: Strategy,
    ) -> Result<GenerationRequest> {
        let context_block = if classification.is_personal_finance {
            FinancialContext::build(ctx, self.config.top_categories).render()
        } else {
            String::new()
        };
        let alerts = if classification.is_personal_finance {
            render_alerts(ctx.rules)
        } else {
            String::new()
        };
        let concepts = classification
            .concepts
            .iter()
            .map(|c| c.label())
            .collect::<Vec<_>>()
            .join(", ");

        let mut vars: HashMap<&str, &str> = HashMap::new();
        vars.insert("question", question.trim());
        vars.insert("context", &context_block);
        vars.insert("alerts", &alerts);
        vars.insert("concepts", &concepts);

        let (system, prompt) = {
            let mut prompts = self
                .prompts
                .lock()
                .map_err(|_| Error::Config("Failed to acquire prompt library lock".into()))?;
            let template = prompts.get(strategy.prompt_id())?;
            (template.render_system(&vars), template.render_user(&vars))
        };

        let start = history.len().saturating_sub(self.config.history_window);

        Ok(GenerationRequest::new(system, prompt)
            .with_history(history[start..].to_vec())
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens))
    }

    /// Answer a question. Never fails: backend errors become fallback answers.
    pub async fn respond(
        &self,
        question: &str,
        ctx: &AdviceContext<'_>,
        classification: &ClassificationBundle,
        history: &[ChatTurn],
    ) -> Advice {
        let realtime = needs_realtime(question);
        let strategy = Self::select_strategy(classification, realtime);
        debug!(
            strategy = strategy.as_str(),
            question_type = classification.question_type.as_str(),
            personal = classification.is_personal_finance,
            realtime,
            "Selected advice strategy"
        );

        let Some(client) = self.client.as_ref() else {
            info!(strategy = strategy.as_str(), "No generation backend configured, using fallback");
            return self.fallback(question, ctx, classification, strategy, realtime);
        };

        let request = match self.build_request(question, ctx, classification, history, strategy) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Failed to build prompt");
                info!(strategy = strategy.as_str(), "Using fallback answer");
                return self.fallback(question, ctx, classification, strategy, realtime);
            }
        };

        match self.generate(client, &request, strategy).await {
            Ok(text) => Advice {
                text,
                source: ResponseSource::Generated,
                model: client.model().to_string(),
                confidence: classification.confidence,
                strategy,
                needs_realtime: realtime,
            },
            Err(_) => {
                info!(strategy = strategy.as_str(), "Using fallback answer");
                self.fallback(question, ctx, classification, strategy, realtime)
            }
        }
    }

    /// Call the backend with a bounded timeout and at most `max_retries` extra attempts
    async fn generate(
        &self,
        client: &AIClient,
        request: &GenerationRequest,
        strategy: Strategy,
    ) -> Result<String> {
        let attempts = self.config.max_retries + 1;
        let mut last_error = Error::EmptyResponse;

        for attempt in 1..=attempts {
            info!(
                model = %client.model(),
                strategy = strategy.as_str(),
                attempt,
                "Calling generation backend"
            );

            let outcome = tokio::time::timeout(self.config.timeout, client.generate(request)).await;
            let error = match outcome {
                Ok(Ok(text)) if !text.trim().is_empty() => return Ok(text.trim().to_string()),
                Ok(Ok(_)) => Error::EmptyResponse,
                Ok(Err(e)) => e,
                Err(_) => Error::Timeout(self.config.timeout.as_secs()),
            };

            warn!(
                model = %client.model(),
                attempt,
                error = %error,
                "Generation backend failed"
            );
            last_error = error;
        }

        Err(last_error)
    }

    fn fallback(
        &self,
        question: &str,
        ctx: &AdviceContext<'_>,
        classification: &ClassificationBundle,
        strategy: Strategy,
        realtime: bool,
    ) -> Advice {
        let mut text =
            fallback::generate(question, ctx, classification, self.config.top_categories);
        if realtime {
            text = format!(
                "I can't access live market data right now, so check a trusted market source for current figures.\n\n{}",
                text
            );
        }

        Advice {
            text,
            source: ResponseSource::Fallback,
            model: FALLBACK_MODEL.to_string(),
            confidence: classification.confidence.min(FALLBACK_CONFIDENCE_CAP),
            strategy,
            needs_realtime: realtime,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use crate::analyzer::AnalysisSnapshot;
    use crate::classifier::classify;
    use crate::models::{Category, UserProfile};
    use crate::rules::{apply_rules, RuleOutput};
    use std::collections::BTreeMap;
    use std::time::Duration;

    struct Fixture {
        snapshot: AnalysisSnapshot,
        rules: RuleOutput,
        profile: UserProfile,
    }

    impl Fixture {
        fn new() -> Self {
            let mut breakdown = BTreeMap::new();
            breakdown.insert(Category::Food, 500.0);
            breakdown.insert(Category::Transport, 300.0);
            let snapshot = AnalysisSnapshot {
                total_spent: 800.0,
                transaction_count: 2,
                category_breakdown: breakdown,
                currency: "$".to_string(),
                ..Default::default()
            };
            let profile = UserProfile {
                income: Some(60_000.0),
                savings: Some(9_000.0),
                goals: vec!["Emergency fund".to_string()],
                ..Default::default()
            };
            let rules = apply_rules(&snapshot, &profile, None);
            Self {
                snapshot,
                rules,
                profile,
            }
        }

        fn ctx(&self) -> AdviceContext<'_> {
            AdviceContext::new(&self.snapshot, &self.rules, &self.profile)
        }
    }

    fn advisor(mock: &MockBackend) -> Advisor {
        Advisor::new(Some(AIClient::Mock(mock.clone())), AdvisorConfig::default())
            .with_prompts(PromptLibrary::embedded_only())
    }

    #[test]
    fn test_needs_realtime() {
        assert!(needs_realtime("What is the current price of gold?"));
        assert!(needs_realtime("Latest Nifty news"));
        assert!(needs_realtime("What's the FD rate today?"));
        assert!(!needs_realtime("How can I reduce my spending?"));
        assert!(!needs_realtime("What is a mutual fund?"));
    }

    #[test]
    fn test_select_strategy() {
        let personal = classify("How can I reduce my spending?");
        let general = classify("What is the difference between mutual fund and FD?");
        assert_eq!(
            Advisor::select_strategy(&personal, false),
            Strategy::PersonalFinance
        );
        assert_eq!(Advisor::select_strategy(&general, false), Strategy::General);
        assert_eq!(Advisor::select_strategy(&general, true), Strategy::Realtime);
    }

    #[tokio::test]
    async fn test_personal_question_injects_context() {
        let fx = Fixture::new();
        let mock = MockBackend::replying("Trim food spending.");
        let question = "How can I reduce my spending?";

        let advice = advisor(&mock)
            .respond(question, &fx.ctx(), &classify(question), &[])
            .await;

        assert_eq!(advice.source, ResponseSource::Generated);
        assert_eq!(advice.text, "Trim food spending.");
        assert_eq!(advice.model, "mock");
        assert_eq!(advice.strategy, Strategy::PersonalFinance);

        let request = mock.last_request().unwrap();
        assert!(request.system.contains("Monthly income: $5,000.00"));
        assert!(request.system.contains("Food $500.00"));
        assert_eq!(request.prompt, question);
    }

    #[tokio::test]
    async fn test_general_question_has_no_context() {
        let fx = Fixture::new();
        let mock = MockBackend::replying("An FD is fixed; a fund floats.");
        let question = "What is the difference between mutual fund and FD?";

        let advice = advisor(&mock)
            .respond(question, &fx.ctx(), &classify(question), &[])
            .await;

        assert_eq!(advice.strategy, Strategy::General);
        let request = mock.last_request().unwrap();
        assert!(!request.system.contains("Monthly income"));
        assert!(!request.system.contains("$"));
        assert!(request.system.contains("Mutual Fund, Fixed Deposit (FD)"));
    }

    #[tokio::test]
    async fn test_history_window() {
        let fx = Fixture::new();
        let mock = MockBackend::new();
        let history: Vec<ChatTurn> = (0..10)
            .map(|i| ChatTurn::user(format!("turn {}", i)))
            .collect();

        advisor(&mock)
            .respond("hello", &fx.ctx(), &classify("hello"), &history)
            .await;

        let request = mock.last_request().unwrap();
        assert_eq!(request.history.len(), 6);
        assert_eq!(request.history[0].content, "turn 4");
    }

    #[tokio::test]
    async fn test_backend_failure_falls_back() {
        let fx = Fixture::new();
        let question = "How can I reduce my spending?";
        let classification = classify(question);

        for mock in [MockBackend::failing("401 Unauthorized"), MockBackend::empty()] {
            let advice = advisor(&mock)
                .respond(question, &fx.ctx(), &classification, &[])
                .await;
            assert!(advice.is_fallback());
            assert_eq!(advice.model, FALLBACK_MODEL);
            assert!(advice.text.contains("$800.00"));
            assert!(advice.confidence <= FALLBACK_CONFIDENCE_CAP);
            assert_eq!(mock.call_count(), 1);
        }
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let fx = Fixture::new();
        let mock = MockBackend::slow(Duration::from_secs(5), "too late");
        let config = AdvisorConfig {
            timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let advisor = Advisor::new(Some(AIClient::Mock(mock)), config)
            .with_prompts(PromptLibrary::embedded_only());

        let advice = advisor
            .respond("hello", &fx.ctx(), &classify("hello"), &[])
            .await;
        assert!(advice.is_fallback());
        assert!(advice.text.starts_with("I can still help based on your data."));
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let fx = Fixture::new();
        let mock = MockBackend::failing("rate limited");
        let config = AdvisorConfig {
            max_retries: 2,
            ..Default::default()
        };
        let advisor = Advisor::new(Some(AIClient::Mock(mock.clone())), config)
            .with_prompts(PromptLibrary::embedded_only());

        let advice = advisor
            .respond("hello", &fx.ctx(), &classify("hello"), &[])
            .await;
        assert!(advice.is_fallback());
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fallback_uses_configured_top_categories() {
        let fx = Fixture::new();
        let config = AdvisorConfig {
            top_categories: 1,
            ..Default::default()
        };
        let advisor = Advisor::offline(config);

        let advice = advisor.respond("hi", &fx.ctx(), &classify("hi"), &[]).await;
        assert!(advice.is_fallback());
        assert!(advice.text.contains("Food ($500.00)"));
        assert!(!advice.text.contains("Transport"));
    }

    #[tokio::test]
    async fn test_offline_and_realtime() {
        let fx = Fixture::new();
        let advisor = Advisor::offline(AdvisorConfig::default());
        let question = "What is the current price of gold?";

        let advice = advisor
            .respond(question, &fx.ctx(), &classify(question), &[])
            .await;
        assert!(advice.is_fallback());
        assert!(advice.needs_realtime);
        assert_eq!(advice.strategy, Strategy::Realtime);
        assert!(advice.text.starts_with("I can't access live market data"));
    }
}
