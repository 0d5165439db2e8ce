//! Pluggable generation backend abstraction
//!
//! The Advice Dispatcher is the only caller. Backends turn a
//! [`GenerationRequest`] into text; any failure is reported as an `Err` and
//! the dispatcher decides what to do with it.
//!
//! # Architecture
//!
//! - `GenerationBackend` trait: the interface every backend implements
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Usage
//!
//! ```rust,ignore
//! let ai = AIClient::from_env();
//!
//! if let Some(ref client) = ai {
//!     let text = client.generate(&GenerationRequest::new(system, prompt)).await?;
//! }
//! ```
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (openai_compatible, mock, none). Default: openai_compatible
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required for openai_compatible backend)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-4o-mini)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)

mod mock;
mod openai_compatible;
pub mod types;

pub use mock::{MockBackend, MockBehavior};
pub use openai_compatible::OpenAICompatibleBackend;
pub use types::*;

use async_trait::async_trait;

use crate::error::Result;

/// Trait defining the interface for all generation backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Produce a completion for the request
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Get the model name (reported on every response)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Any OpenAI-compatible chat completions server
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Checks `AI_BACKEND` to determine which backend to use:
    /// - `openai_compatible` (default, aliases `openai`, `groq`, `openrouter`):
    ///   uses OPENAI_COMPATIBLE_HOST and OPENAI_COMPATIBLE_MODEL
    /// - `mock`: creates a mock backend
    /// - `none`: no backend; every answer comes from the fallback generator
    ///
    /// Returns None if no backend is configured.
    pub fn from_env() -> Option<Self> {
        let backend =
            std::env::var("AI_BACKEND").unwrap_or_else(|_| "openai_compatible".to_string());
        Self::from_backend_name(&backend)
    }

    fn from_backend_name(backend: &str) -> Option<Self> {
        match backend.trim().to_lowercase().as_str() {
            "openai_compatible" | "openai" | "groq" | "openrouter" => {
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            "none" | "off" | "" => None,
            other => {
                tracing::warn!(backend = %other, "Unknown AI_BACKEND, trying openai_compatible");
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
        }
    }

    /// Create an OpenAI-compatible backend directly
    pub fn openai_compatible(host: &str, model: &str) -> Self {
        AIClient::OpenAICompatible(OpenAICompatibleBackend::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        match self {
            AIClient::OpenAICompatible(b) => AIClient::OpenAICompatible(b.with_model(model)),
            AIClient::Mock(b) => AIClient::Mock(b.with_model(model)),
        }
    }
}

// Implement GenerationBackend for AIClient by delegating to the inner backend
#[async_trait]
impl GenerationBackend for AIClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        match self {
            AIClient::OpenAICompatible(b) => b.generate(request).await,
            AIClient::Mock(b) => b.generate(request).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_name_none() {
        assert!(AIClient::from_backend_name("none").is_none());
        assert!(AIClient::from_backend_name("OFF").is_none());
    }

    #[test]
    fn test_backend_name_mock() {
        let client = AIClient::from_backend_name("mock").unwrap();
        assert!(matches!(client, AIClient::Mock(_)));
        assert_eq!(client.model(), "mock");
    }

    #[test]
    fn test_with_model() {
        let client = AIClient::openai_compatible("http://localhost:8000/", "gpt-4o-mini");
        let other = client.with_model("llama-3.1-8b");
        assert_eq!(other.model(), "llama-3.1-8b");
        assert_eq!(other.host(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_client_delegates_to_mock() {
        let client = AIClient::Mock(MockBackend::replying("Spend less on coffee."));
        let text = client
            .generate(&GenerationRequest::new("", "How do I save?"))
            .await
            .unwrap();
        assert_eq!(text, "Spend less on coffee.");
        assert!(client.health_check().await);
    }
}
