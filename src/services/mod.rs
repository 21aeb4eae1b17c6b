//! Service layer for conductor
//!
//! Services sit between the front-ends and the orchestration core, wiring
//! configuration into running components.

pub mod orchestrator_service;

pub use orchestrator_service::{
    empty_query_json, list_provider_tools, OrchestratorService, EMPTY_QUERY_REPLY,
};
