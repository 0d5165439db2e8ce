//! Advice Dispatcher - turns a classified question into an answer
//!
//! The dispatcher decides which prompt strategy applies, whether the user's
//! financial context may be shared with the generation backend, and owns the
//! failure boundary: any backend error or timeout becomes a deterministic
//! fallback answer built from the snapshot and rule output.
//!
//! ## Strategies
//!
//! - **Personal finance** - question about the user's own money; the context
//!   block (income, expenses, savings, risk, top categories, goals) is injected
//! - **General** - educational or market question; no personal data is sent
//! - **Realtime** - asks for live prices/rates/news the backend cannot see
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fincoach_core::advisor::{AdviceContext, Advisor};
//!
//! let advisor = Advisor::new(AIClient::from_env(), AdvisorConfig::load()?);
//! let ctx = AdviceContext::new(&snapshot, &rules, &profile);
//! let advice = advisor.respond(question, &ctx, &classification, &history).await;
//! ```

pub mod context;
pub mod dispatcher;
pub mod fallback;

pub use context::{FinancialContext, RiskLevel};
pub use dispatcher::{needs_realtime, Advisor, FALLBACK_MODEL};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analyzer::AnalysisSnapshot;
use crate::models::{format_money, UserProfile};
use crate::prompts::PromptId;
use crate::rules::RuleOutput;

/// Everything locally computed that an answer may draw on
#[derive(Debug, Clone, Copy)]
pub struct AdviceContext<'a> {
    pub snapshot: &'a AnalysisSnapshot,
    pub rules: &'a RuleOutput,
    pub profile: &'a UserProfile,
}

impl<'a> AdviceContext<'a> {
    pub fn new(
        snapshot: &'a AnalysisSnapshot,
        rules: &'a RuleOutput,
        profile: &'a UserProfile,
    ) -> Self {
        Self {
            snapshot,
            rules,
            profile,
        }
    }

    /// Render an amount in the user's currency
    pub fn money(&self, amount: f64) -> String {
        format_money(amount, &self.snapshot.currency)
    }
}

/// Prompt strategy chosen for a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    PersonalFinance,
    General,
    Realtime,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::PersonalFinance => "personal_finance",
            Strategy::General => "general",
            Strategy::Realtime => "realtime",
        }
    }

    pub fn prompt_id(&self) -> PromptId {
        match self {
            Strategy::PersonalFinance => PromptId::FinanceAdvisor,
            Strategy::General => PromptId::GeneralAssistant,
            Strategy::Realtime => PromptId::RealtimeAdvisor,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who produced the answer text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    /// The generation backend
    Generated,
    /// The deterministic fallback generator
    Fallback,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Generated => "generated",
            ResponseSource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The dispatcher's answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub text: String,
    pub source: ResponseSource,
    /// Backend model id, or the fallback marker
    pub model: String,
    pub confidence: f64,
    pub strategy: Strategy,
    pub needs_realtime: bool,
}

impl Advice {
    pub fn is_fallback(&self) -> bool {
        self.source == ResponseSource::Fallback
    }
}
