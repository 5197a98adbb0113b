//! # Codesmith Core
//!
//! The engine behind the codesmith REPL.
//!
//! ## Core Concepts
//! - **Provider**: Trait-based communication with the generative-language API
//! - **Extract**: Fenced code-block extraction from model responses
//! - **Exec**: Guarded subprocess execution of generated code

pub mod error;
pub mod exec;
pub mod extract;
pub mod provider;

pub use error::{Error, ErrorKind, ErrorStatus, Result};
pub use exec::{ExecOutcome, Executor};
pub use extract::{extract_code_block, CodeBlock};
pub use provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, GeminiProvider, LlmProvider,
    ProviderConfig, ProviderError, Role, StreamChunk, StreamReceiver, Usage, UsageTracker,
};
