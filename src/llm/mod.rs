//! LLM provider implementations
//!
//! - `openai`: OpenAI-compatible chat completions over HTTP
//! - `sim`: scripted provider used by tests

mod error;
mod openai;
pub mod sim;
mod types;

pub use error::LlmError;
pub use openai::OpenAiProvider;
pub use sim::ScriptedProvider;
pub use types::*;

use async_trait::async_trait;

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Send a chat completion request (non-streaming)
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<LlmResponse, LlmError>;
}
