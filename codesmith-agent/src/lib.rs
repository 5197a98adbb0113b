//! # Codesmith Agent
//!
//! Prompt dispatch for the code-generation REPL: wraps user requests in
//! instruction templates, sends them to the provider, and keeps the
//! conversation transcript for follow-up improvement rounds.

pub mod generator;
pub mod prompts;

pub use generator::{CodeGenerator, GeneratorConfig};
