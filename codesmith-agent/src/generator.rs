//! Code generator - dispatches prompts and owns the conversation transcript

use crate::prompts;
use codesmith_core::error::{Error, Result};
use codesmith_core::provider::{
    ChatMessage, CompletionRequest, LlmProvider, StreamChunk, UsageTracker,
};
use std::io::Write;

/// Configuration for the generator
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Model override for every request (provider default when None)
    pub model: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Completion length cap
    pub max_tokens: Option<usize>,
    /// Print response text to stdout as it streams in
    pub stream_output: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: None,
            max_tokens: None,
            stream_output: true,
        }
    }
}

/// Dispatches generation and improvement prompts to the provider.
///
/// The transcript records exactly the messages exchanged with the provider:
/// `generate` resets it to one request/response pair, each `improve` appends
/// another pair. A failed call leaves the transcript untouched, so it always
/// reflects the last completed exchange.
pub struct CodeGenerator<P: LlmProvider> {
    provider: P,
    config: GeneratorConfig,
    transcript: Vec<ChatMessage>,
    usage: UsageTracker,
}

impl<P: LlmProvider> CodeGenerator<P> {
    /// Create a generator with default configuration
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, GeneratorConfig::default())
    }

    /// Create a generator with custom configuration
    pub fn with_config(provider: P, config: GeneratorConfig) -> Self {
        Self {
            provider,
            config,
            transcript: Vec::new(),
            usage: UsageTracker::new(),
        }
    }

    /// The conversation so far
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Token usage accumulated across all calls
    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    /// Generate code for a fresh request.
    ///
    /// Starts a new conversation: the transcript is reset to exactly this
    /// request/response pair.
    pub async fn generate(&mut self, request: &str) -> Result<String> {
        let prompt = prompts::generation_prompt(request);
        let reply = self.send(vec![ChatMessage::user(&prompt)]).await?;

        self.transcript = vec![ChatMessage::user(prompt), ChatMessage::model(&reply)];
        Ok(reply)
    }

    /// Improve `code` according to `feedback`, with the full conversation as
    /// context. Appends the new request/response pair to the transcript.
    pub async fn improve(&mut self, code: &str, feedback: &str) -> Result<String> {
        let prompt = prompts::improvement_prompt(code, feedback);

        let mut messages = self.transcript.clone();
        messages.push(ChatMessage::user(&prompt));
        let reply = self.send(messages).await?;

        self.transcript.push(ChatMessage::user(prompt));
        self.transcript.push(ChatMessage::model(&reply));
        Ok(reply)
    }

    /// Send a turn list (system instruction prepended) and return the reply
    async fn send(&mut self, messages: Vec<ChatMessage>) -> Result<String> {
        let mut all = Vec::with_capacity(messages.len() + 1);
        all.push(ChatMessage::system(prompts::SYSTEM_INSTRUCTION));
        all.extend(messages);

        let mut request = CompletionRequest::new(all);
        request.model = self.config.model.clone();
        request.temperature = self.config.temperature;
        request.max_tokens = self.config.max_tokens;

        if self.config.stream_output {
            self.send_streaming(request).await
        } else {
            let response = self.provider.complete(request).await.map_err(Error::from)?;
            self.usage.track(&response.usage);
            response.content.ok_or_else(Error::empty_response)
        }
    }

    /// Streamed variant of `send`: prints text chunks as they arrive
    async fn send_streaming(&mut self, request: CompletionRequest) -> Result<String> {
        let mut stream = self.provider.stream(request).await.map_err(Error::from)?;
        let mut text = String::new();

        while let Some(chunk) = stream.next().await {
            match chunk {
                StreamChunk::Text(t) => {
                    print!("{}", t);
                    let _ = std::io::stdout().flush();
                    text.push_str(&t);
                }
                StreamChunk::Done { usage, .. } => {
                    if let Some(u) = usage {
                        self.usage.track(&u);
                    }
                    break;
                }
                StreamChunk::Error(e) => {
                    println!();
                    return Err(Error::network_failed(e));
                }
            }
        }
        println!();

        if text.is_empty() {
            return Err(Error::empty_response());
        }
        Ok(text)
    }
}
