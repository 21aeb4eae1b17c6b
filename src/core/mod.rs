//! Core domain types shared by every layer

pub mod errors;

pub use errors::{InvokeError, OrchestrationError, SessionError, ToolError};
