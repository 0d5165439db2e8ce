//! Fincoach Core Library
//!
//! The financial-insight pipeline behind the fincoach assistant:
//! - Spending analyzer (timeframes, averages, month-over-month trends)
//! - Question classifier (type, intents, topics, concepts, confidence)
//! - Rule engine (alerts, insights, recommendations, health score)
//! - Advice dispatcher with an offline fallback generator
//! - Pluggable generation backends (any OpenAI-compatible server, mock)
//! - Prompt library for customizable system prompts
//! - Per-user snapshot cache
//! - Input readers for transaction, profile and budget files

pub mod advisor;
pub mod ai;
pub mod analyzer;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod error;
pub mod import;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod rules;

/// Test utilities including a mock chat-completions server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use advisor::{
    needs_realtime, Advice, AdviceContext, Advisor, FinancialContext, ResponseSource, RiskLevel,
    Strategy, FALLBACK_MODEL,
};
pub use ai::{
    AIClient, GenerationBackend, GenerationRequest, MockBackend, MockBehavior,
    OpenAICompatibleBackend,
};
pub use analyzer::{analyze, AnalysisSnapshot};
pub use cache::{data_version, SnapshotCache};
pub use classifier::{
    classify, ClassificationBundle, Concept, Intent, QuestionClassifier, QuestionType, Topic,
};
pub use config::AdvisorConfig;
pub use error::{Error, Result};
pub use models::{
    format_money, BudgetState, BudgetStatus, Category, ChatTurn, Role, Transaction, UserProfile,
};
pub use pipeline::{AdviceResponse, AskRequest, InsightPipeline, PipelineOutput};
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary};
pub use rules::{
    apply_rules, Alert, AlertKind, Priority, Recommendation, RecommendationOrder, RuleEngine,
    RuleOutput, Severity,
};
