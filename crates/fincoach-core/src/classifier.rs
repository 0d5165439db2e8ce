//! Question Classifier
//!
//! Deterministic text analysis of a free-text finance question. Produces a
//! [`ClassificationBundle`] with:
//! - a single question type (first matching group wins, in priority order)
//! - every matching intent and topic (defaulting to `general`)
//! - recognized financial-product concepts
//! - a heuristic confidence in `[0.5, 0.9]`
//! - whether the question is about the user's own money
//!
//! Matching is case-insensitive; the input is lowercased before any pattern
//! is applied.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Educational,
    Comparative,
    Advisory,
    Calculative,
    Planning,
    General,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Educational => "educational",
            QuestionType::Comparative => "comparative",
            QuestionType::Advisory => "advisory",
            QuestionType::Calculative => "calculative",
            QuestionType::Planning => "planning",
            QuestionType::General => "general",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Growth,
    Preservation,
    RiskManagement,
    Education,
    Comparison,
    General,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Growth => "growth",
            Intent::Preservation => "preservation",
            Intent::RiskManagement => "risk_management",
            Intent::Education => "education",
            Intent::Comparison => "comparison",
            Intent::General => "general",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Investment,
    Savings,
    Debt,
    Risk,
    Planning,
    Income,
    Spending,
    General,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Investment => "investment",
            Topic::Savings => "savings",
            Topic::Debt => "debt",
            Topic::Risk => "risk",
            Topic::Planning => "planning",
            Topic::Income => "income",
            Topic::Spending => "spending",
            Topic::General => "general",
        }
    }
}

/// Financial products the classifier recognizes by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Concept {
    MutualFund,
    FixedDeposit,
    Sip,
    Stock,
    Bond,
    Etf,
    Ppf,
    Gold,
    Insurance,
    Crypto,
}

impl Concept {
    pub fn as_str(&self) -> &'static str {
        match self {
            Concept::MutualFund => "mutual_fund",
            Concept::FixedDeposit => "fixed_deposit",
            Concept::Sip => "sip",
            Concept::Stock => "stock",
            Concept::Bond => "bond",
            Concept::Etf => "etf",
            Concept::Ppf => "ppf",
            Concept::Gold => "gold",
            Concept::Insurance => "insurance",
            Concept::Crypto => "crypto",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Concept::MutualFund => "Mutual Fund",
            Concept::FixedDeposit => "Fixed Deposit (FD)",
            Concept::Sip => "SIP",
            Concept::Stock => "Stocks",
            Concept::Bond => "Bonds",
            Concept::Etf => "ETF / Index Fund",
            Concept::Ppf => "PPF",
            Concept::Gold => "Gold",
            Concept::Insurance => "Insurance",
            Concept::Crypto => "Cryptocurrency",
        }
    }
}

/// Structured interpretation of one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationBundle {
    pub question_type: QuestionType,
    /// Never empty
    pub intents: BTreeSet<Intent>,
    /// Never empty
    pub topics: BTreeSet<Topic>,
    pub concepts: BTreeSet<Concept>,
    /// Always within `[0.5, 0.9]`
    pub confidence: f64,
    pub is_personal_finance: bool,
}

impl ClassificationBundle {
    pub fn has_topic(&self, topic: Topic) -> bool {
        self.topics.contains(&topic)
    }

    pub fn has_intent(&self, intent: Intent) -> bool {
        self.intents.contains(&intent)
    }

    pub fn has_concept(&self, concept: Concept) -> bool {
        self.concepts.contains(&concept)
    }
}

const BASE_CONFIDENCE: f64 = 0.5;
const MAX_CONFIDENCE: f64 = 0.9;
/// Added for every topic beyond the first two
const EXTRA_TOPIC_BONUS: f64 = 0.1;
/// Added once when any concept is recognized
const CONCEPT_BONUS: f64 = 0.2;

/// One question-type group: any pattern matches unless the guard does
struct TypeRule {
    kind: QuestionType,
    patterns: Vec<Regex>,
    unless: Option<Regex>,
}

impl TypeRule {
    fn matches(&self, text: &str) -> bool {
        if let Some(ref guard) = self.unless {
            if guard.is_match(text) {
                return false;
            }
        }
        self.patterns.iter().any(|p| p.is_match(text))
    }
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

/// Compiled pattern tables for question classification
pub struct QuestionClassifier {
    type_rules: Vec<TypeRule>,
    intents: Vec<(Intent, Regex)>,
    topics: Vec<(Topic, Regex)>,
    concepts: Vec<(Concept, Regex)>,
    first_person: Regex,
}

impl Default for QuestionClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionClassifier {
    pub fn new() -> Self {
        let type_rules = vec![
            TypeRule {
                kind: QuestionType::Educational,
                patterns: vec![
                    re(r"^\s*(what\s+(is|are)|what's|whats)\b"),
                    re(r"\b(explain|define|definition\s+of|meaning\s+of|tell\s+me\s+about)\b"),
                    re(r"\bhow\s+does\b.*\bwork"),
                ],
                unless: Some(re(
                    r"\b(difference|differences|differ|differs|compare|comparison|vs|versus|better|should\s+i|can\s+i|for\s+me)\b",
                )),
            },
            TypeRule {
                kind: QuestionType::Comparative,
                patterns: vec![
                    re(r"\b(difference|differences|differ|differs|compare|compared|comparing|comparison|versus|vs)\b"),
                    re(r"\b(better|worse)\s+(than|option|choice)\b"),
                    re(r"\bwhich\s+(is|one\s+is)\s+(better|best|safer)\b"),
                ],
                unless: None,
            },
            TypeRule {
                kind: QuestionType::Advisory,
                patterns: vec![
                    re(r"\b(should\s+i|can\s+i|could\s+i|what\s+should)\b"),
                    re(r"\bhow\s+(can|do|should)\s+i\b"),
                    re(r"\b(recommend|suggest|advice|advise|tips?)\b"),
                    re(r"\b(is\s+it\s+(wise|good|worth|smart)|best\s+way)\b"),
                ],
                unless: None,
            },
            TypeRule {
                kind: QuestionType::Calculative,
                patterns: vec![
                    re(r"\bhow\s+much\b"),
                    re(r"\b(calculate|compute|estimate|emi|percentage|interest\s+on|returns?\s+on)\b"),
                    re(r"\d+\s*(%|percent)"),
                ],
                unless: None,
            },
            TypeRule {
                kind: QuestionType::Planning,
                patterns: vec![
                    re(r"\b(plan|planning|retire|retirement|goal|goals|future|roadmap)\b"),
                    re(r"\blong[-\s]term\b"),
                    re(r"\bsave\s+(for|up)\b"),
                ],
                unless: None,
            },
        ];

        let intents = vec![
            (
                Intent::Growth,
                re(r"\b(grow|growth|invest|investing|investment|investments|returns?|wealth|compound\w*|maximi[sz]e|multiply)\b"),
            ),
            (
                Intent::Preservation,
                re(r"\b(save|saving|savings|preserve|protect|safe|safety|secure|emergency|reduce|cut|lower)\b"),
            ),
            (
                Intent::RiskManagement,
                re(r"\b(risk|risks|risky|insurance|insure|hedge|diversif\w*|volatil\w*|loss|losses)\b"),
            ),
            (
                Intent::Education,
                re(r"\b(what\s+(is|are)|explain|define|meaning|learn|understand|how\s+does)\b"),
            ),
            (
                Intent::Comparison,
                re(r"\b(difference|differences|differ\w*|compare\w*|comparison|vs|versus|better)\b"),
            ),
        ];

        let topics = vec![
            (
                Topic::Investment,
                re(r"\b(invest\w*|stocks?|shares?|mutual\s+funds?|sips?|etfs?|portfolio|equity|equities|bonds?|crypto\w*|gold)\b"),
            ),
            (
                Topic::Savings,
                re(r"\b(save|saving|savings|fds?|fixed\s+deposits?|emergency\s+fund|deposits?|ppf)\b"),
            ),
            (
                Topic::Debt,
                re(r"\b(debt|debts|loans?|emis?|credit\s+cards?|mortgage|borrow\w*|repay\w*)\b"),
            ),
            (
                Topic::Risk,
                re(r"\b(risk\w*|insurance|volatil\w*|safe|safer|safety)\b"),
            ),
            (
                Topic::Planning,
                re(r"\b(plan|planning|retire\w*|goals?|future|budget\w*|long[-\s]term)\b"),
            ),
            (
                Topic::Income,
                re(r"\b(income|salary|salaries|earn\w*|wages?|paycheck|raise|bonus)\b"),
            ),
            (
                Topic::Spending,
                re(r"\b(spend\w*|spent|expenses?|expenditure|purchases?|bought|buying|shopping|costs?)\b"),
            ),
        ];

        let concepts = vec![
            (Concept::MutualFund, re(r"\bmutual\s+funds?\b")),
            (Concept::FixedDeposit, re(r"\b(fixed\s+deposits?|fds?)\b")),
            (Concept::Sip, re(r"\b(sips?|systematic\s+investment\s+plans?)\b")),
            (Concept::Stock, re(r"\b(stocks?|shares?|equity|equities)\b")),
            (Concept::Bond, re(r"\b(bonds?|debentures?)\b")),
            (Concept::Etf, re(r"\b(etfs?|exchange[-\s]traded\s+funds?|index\s+funds?)\b")),
            (Concept::Ppf, re(r"\b(ppf|public\s+provident\s+fund)\b")),
            (Concept::Gold, re(r"\b(gold|sovereign\s+gold)\b")),
            (Concept::Insurance, re(r"\b(insurance|term\s+plan|term\s+life)\b")),
            (Concept::Crypto, re(r"\b(crypto\w*|bitcoin|ethereum)\b")),
        ];

        Self {
            type_rules,
            intents,
            topics,
            concepts,
            first_person: re(r"\b(i|me|my|mine|myself|we|our|ours)\b"),
        }
    }

    /// Classify a question
    pub fn classify(&self, question: &str) -> ClassificationBundle {
        let text = question.trim().to_lowercase();

        let question_type = self
            .type_rules
            .iter()
            .find(|rule| rule.matches(&text))
            .map(|rule| rule.kind)
            .unwrap_or(QuestionType::General);

        let mut intents: BTreeSet<Intent> = self
            .intents
            .iter()
            .filter(|(_, pattern)| pattern.is_match(&text))
            .map(|(intent, _)| *intent)
            .collect();
        if intents.is_empty() {
            intents.insert(Intent::General);
        }

        let mut topics: BTreeSet<Topic> = self
            .topics
            .iter()
            .filter(|(_, pattern)| pattern.is_match(&text))
            .map(|(topic, _)| *topic)
            .collect();
        if topics.is_empty() {
            topics.insert(Topic::General);
        }

        let concepts: BTreeSet<Concept> = self
            .concepts
            .iter()
            .filter(|(_, pattern)| pattern.is_match(&text))
            .map(|(concept, _)| *concept)
            .collect();

        let confidence = confidence(topics.len(), concepts.len());
        let is_personal_finance = self.is_personal_finance(&text);

        ClassificationBundle {
            question_type,
            intents,
            topics,
            concepts,
            confidence,
            is_personal_finance,
        }
    }

    /// Whether a lowercased question is about the asker's own finances.
    ///
    /// Only first-person language counts. Words like "salary" or "net worth"
    /// on their own can just as well be about someone else.
    fn is_personal_finance(&self, text: &str) -> bool {
        self.first_person.is_match(text)
    }
}

fn confidence(topic_count: usize, concept_count: usize) -> f64 {
    let mut confidence = BASE_CONFIDENCE;
    confidence += EXTRA_TOPIC_BONUS * topic_count.saturating_sub(2) as f64;
    if concept_count > 0 {
        confidence += CONCEPT_BONUS;
    }
    (confidence.min(MAX_CONFIDENCE) * 100.0).round() / 100.0
}

static DEFAULT_CLASSIFIER: LazyLock<QuestionClassifier> = LazyLock::new(QuestionClassifier::new);

/// Classify a question with the built-in pattern tables
pub fn classify(question: &str) -> ClassificationBundle {
    DEFAULT_CLASSIFIER.classify(question)
}
