//! Domain error types
//!
//! Tool-level failures (`ToolError`) are recoverable: a worker agent folds them
//! into its answer. Session and orchestration failures are not, and travel up
//! to the invocation boundary where they become a single failure message.

use thiserror::Error;

/// Errors raised by a tool registry or by a single tool invocation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    /// A tool with this name is already registered
    #[error("Tool already registered: {0}")]
    DuplicateName(String),

    /// No tool with this name exists
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments do not satisfy the tool's input schema
    #[error("Invalid arguments for '{tool}': {message}")]
    Validation { tool: String, message: String },

    /// The tool ran and failed
    #[error("Tool '{tool}' failed: {message}")]
    Execution { tool: String, message: String },
}

impl ToolError {
    pub fn validation(tool: impl Into<String>, message: impl Into<String>) -> Self {
        ToolError::Validation {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn execution(tool: impl Into<String>, message: impl Into<String>) -> Self {
        ToolError::Execution {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Errors related to a capability provider's session lifecycle
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// `open_session` called while the session is already open
    #[error("Session already open for provider '{0}'")]
    AlreadyOpen(String),

    /// Tool access attempted while the session is not open
    #[error("Session not open for provider '{0}'")]
    NotOpen(String),

    /// The provider's connection could not be established
    #[error("Provider '{provider}' unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },
}

/// Failure of `CapabilityProvider::invoke`
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvokeError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl InvokeError {
    /// Session failures abort the invocation; everything else is absorbed by the worker
    pub fn is_fatal(&self) -> bool {
        matches!(self, InvokeError::Session(_))
    }
}

/// Errors that abort a supervisor invocation
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Decomposition asked for more rounds than allowed
    #[error("Recursion limit of {limit} delegation rounds exceeded")]
    RecursionLimitExceeded { limit: usize },

    /// The reasoning collaborator assigned a sub-task to an agent that does not exist
    #[error("Sub-task assigned to unknown agent '{agent}' (available: {available})")]
    UnknownAgent { agent: String, available: String },

    /// The first decomposition produced no sub-tasks
    #[error("Query could not be split into any sub-task")]
    EmptyDecomposition,

    /// The reasoning collaborator failed or returned something unusable
    #[error("Reasoning failed: {0}")]
    Reasoning(String),

    /// The caller interrupted the invocation between rounds
    #[error("Invocation cancelled after round {after_round}")]
    Cancelled { after_round: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<crate::llm::LlmError> for OrchestrationError {
    fn from(err: crate::llm::LlmError) -> Self {
        OrchestrationError::Reasoning(err.to_string())
    }
}
