//! # LLM Provider Interface
//!
//! A trait-based abstraction for communicating with the generative-language
//! backend.
//!
//! ## Design
//! - `LlmProvider` trait defines the core interface
//! - `GeminiProvider` implements it over the Gemini REST API
//! - Streaming via async iterators
//! - Usage tracking

pub mod gemini;

pub use gemini::GeminiProvider;

use serde::{Deserialize, Serialize};
use std::pin::Pin;

// ============================================================================
// Core Types
// ============================================================================

/// A chat message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Model,
}

/// Request parameters for a completion
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = Some(max);
        self
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub model: String,
    pub content: Option<String>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    Safety,
    Unknown,
}

/// Token usage information
#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

/// A streaming chunk from the model
#[derive(Debug, Clone)]
pub enum StreamChunk {
    /// Text content delta
    Text(String),
    /// Stream finished
    Done {
        finish_reason: FinishReason,
        usage: Option<Usage>,
    },
    /// Error occurred
    Error(String),
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Error type for provider operations
#[derive(Debug)]
pub enum ProviderError {
    /// Network/connection error
    Network(String),
    /// API returned an error
    Api { status: u16, message: String },
    /// Failed to parse response
    Parse(String),
    /// Rate limited
    RateLimited { retry_after: Option<u64> },
    /// Authentication failed
    AuthenticationFailed,
    /// Other error
    Other(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(e) => write!(f, "Network error: {}", e),
            Self::Api { status, message } => write!(f, "API error ({}): {}", status, message),
            Self::Parse(e) => write!(f, "Parse error: {}", e),
            Self::RateLimited { retry_after } => {
                write!(f, "Rate limited")?;
                if let Some(secs) = retry_after {
                    write!(f, " (retry after {}s)", secs)?;
                }
                Ok(())
            }
            Self::AuthenticationFailed => write!(f, "Authentication failed"),
            Self::Other(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ProviderError {}

/// The main LLM provider trait
#[allow(async_fn_in_trait)]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "gemini")
    fn name(&self) -> &str;

    /// Get the default model
    fn default_model(&self) -> &str;

    /// Send a completion request and get a full response
    async fn complete(&self, request: CompletionRequest)
        -> Result<CompletionResponse, ProviderError>;

    /// Send a completion request and stream the response
    async fn stream(&self, request: CompletionRequest) -> Result<StreamReceiver, ProviderError>;

    /// Chat with message history
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, ProviderError> {
        let request = CompletionRequest::new(messages);
        let response = self.complete(request).await?;
        response
            .content
            .ok_or_else(|| ProviderError::Other("No content in response".into()))
    }
}

/// Receiver for streaming responses
pub struct StreamReceiver {
    inner: Pin<Box<dyn futures_core::Stream<Item = StreamChunk> + Send>>,
}

impl StreamReceiver {
    pub fn new<S>(stream: S) -> Self
    where
        S: futures_core::Stream<Item = StreamChunk> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    /// Get the next chunk, or `None` when the stream is exhausted
    pub async fn next(&mut self) -> Option<StreamChunk> {
        use futures_util::StreamExt;
        self.inner.next().await
    }

    /// Collect all text chunks into a single string
    pub async fn collect_text(mut self) -> Result<String, ProviderError> {
        let mut text = String::new();
        while let Some(chunk) = self.next().await {
            match chunk {
                StreamChunk::Text(t) => text.push_str(&t),
                StreamChunk::Done { .. } => break,
                StreamChunk::Error(e) => return Err(ProviderError::Other(e)),
            }
        }
        Ok(text)
    }
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for creating providers
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub default_model: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ProviderConfig {
    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            base_url: Some("https://generativelanguage.googleapis.com/v1beta".into()),
            default_model: Some("gemini-2.0-flash".into()),
            timeout_secs: Some(120),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

// ============================================================================
// Usage Tracking
// ============================================================================

/// Tracks token usage across multiple calls
#[derive(Debug, Clone, Default)]
pub struct UsageTracker {
    pub total_calls: usize,
    pub total_prompt_tokens: usize,
    pub total_completion_tokens: usize,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, usage: &Usage) {
        self.total_calls += 1;
        self.total_prompt_tokens += usage.prompt_tokens;
        self.total_completion_tokens += usage.completion_tokens;
    }

    pub fn total_tokens(&self) -> usize {
        self.total_prompt_tokens + self.total_completion_tokens
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_constructors() {
        let sys = ChatMessage::system("You are a code generator");
        assert_eq!(sys.role, Role::System);
        assert_eq!(sys.content, "You are a code generator");

        let user = ChatMessage::user("Write a sort function");
        assert_eq!(user.role, Role::User);

        let model = ChatMessage::model("```python\nprint('hi')\n```");
        assert_eq!(model.role, Role::Model);
    }

    #[test]
    fn test_completion_request_builder() {
        let request = CompletionRequest::new(vec![ChatMessage::user("Hello")])
            .with_model("gemini-2.0-flash")
            .with_temperature(0.7)
            .with_max_tokens(1000);

        assert_eq!(request.model, Some("gemini-2.0-flash".into()));
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(1000));
    }

    #[test]
    fn test_provider_config() {
        let config = ProviderConfig::gemini("test-key");
        assert_eq!(config.default_model, Some("gemini-2.0-flash".into()));
        assert!(config
            .base_url
            .as_deref()
            .unwrap()
            .contains("generativelanguage"));

        let config = config.with_model("gemini-2.5-pro").with_timeout(30);
        assert_eq!(config.default_model, Some("gemini-2.5-pro".into()));
        assert_eq!(config.timeout_secs, Some(30));
    }

    #[test]
    fn test_usage_tracker() {
        let mut tracker = UsageTracker::new();

        tracker.track(&Usage {
            prompt_tokens: 100,
            completion_tokens: 50,
            total_tokens: 150,
        });

        tracker.track(&Usage {
            prompt_tokens: 200,
            completion_tokens: 100,
            total_tokens: 300,
        });

        assert_eq!(tracker.total_calls, 2);
        assert_eq!(tracker.total_prompt_tokens, 300);
        assert_eq!(tracker.total_completion_tokens, 150);
        assert_eq!(tracker.total_tokens(), 450);
    }

    #[tokio::test]
    async fn test_stream_receiver_collect_text() {
        let receiver = StreamReceiver::new(futures_util::stream::iter(vec![
            StreamChunk::Text("hello ".into()),
            StreamChunk::Text("world".into()),
            StreamChunk::Done {
                finish_reason: FinishReason::Stop,
                usage: None,
            },
        ]));

        let text = receiver.collect_text().await.unwrap();
        assert_eq!(text, "hello world");
    }

    #[tokio::test]
    async fn test_stream_receiver_error() {
        let receiver = StreamReceiver::new(futures_util::stream::iter(vec![
            StreamChunk::Text("partial".into()),
            StreamChunk::Error("connection reset".into()),
        ]));

        assert!(receiver.collect_text().await.is_err());
    }
}
