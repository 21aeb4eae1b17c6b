//! conductor: a supervisor agent that answers questions by delegating to
//! tool-backed worker agents.
//!
//! This library provides:
//! - Static capability catalogs exposed as tools
//! - Capability providers reached in-process or over MCP stdio
//! - Worker agents and a supervisor that decomposes, dispatches, and composes
//! - Reasoners backed by an OpenAI-compatible model or by offline keyword matching
//! - CLI and HTTP front-ends

pub mod config;
pub mod core;
pub mod llm;
pub mod mcp;
pub mod orchestration;
pub mod provider;
pub mod services;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use orchestration::{AggregateResult, Supervisor};
pub use services::OrchestratorService;

/// Version string including the git suffix for non-release builds
pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    env!("CONDUCTOR_VERSION_SUFFIX")
);
