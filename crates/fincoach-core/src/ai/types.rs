//! Generation request types
//!
//! Backend-agnostic; every backend receives the same request shape.

use serde::Serialize;

use crate::models::ChatTurn;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 800;

/// A single generation call: system role, prior turns, and the user prompt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    /// System-role instructions (may be empty)
    pub system: String,
    /// The user message for this turn
    pub prompt: String,
    /// Prior conversation turns, oldest first
    pub history: Vec<ChatTurn>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            history: Vec::new(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let req = GenerationRequest::new("sys", "hello");
        assert_eq!(req.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(req.max_tokens, DEFAULT_MAX_TOKENS);
        assert!(req.history.is_empty());

        let req = req
            .with_history(vec![ChatTurn::user("hi")])
            .with_max_tokens(100);
        assert_eq!(req.history.len(), 1);
        assert_eq!(req.max_tokens, 100);
    }
}
