//! The reasoning collaborator
//!
//! Every decision that needs judgement (which tools a worker calls, how a
//! query is split between workers, how answers are merged) goes through a
//! [`Reasoner`]. The supervisor and workers only enforce the state machine and
//! ordering rules around those decisions. Reasoner output is trusted as-is
//! and never retried.

use super::types::{AggregateEntry, DelegationRound, ToolCallRecord};
use crate::core::OrchestrationError;
use crate::tools::ToolDescriptor;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// What the supervisor knows about a worker
#[derive(Debug, Clone, Serialize)]
pub struct WorkerProfile {
    pub name: String,
    pub objective: String,
    pub tools: Vec<ToolDescriptor>,
}

/// A tool call a worker should make
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    pub tool: String,
    pub arguments: Value,
}

/// Next move of a worker on its sub-task
#[derive(Debug, Clone, PartialEq)]
pub enum AgentStep {
    CallTools(Vec<ToolRequest>),
    Answer(String),
}

/// A sub-task as proposed by the reasoner, before the agent name is checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub agent: String,
    pub task: String,
}

/// Supervisor decision after each round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delegation {
    Dispatch(Vec<Assignment>),
    Finish,
}

#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Decide a worker's next move given the calls it already made
    async fn next_step(
        &self,
        objective: &str,
        tools: &[ToolDescriptor],
        sub_task: &str,
        prior_calls: &[ToolCallRecord],
    ) -> Result<AgentStep, OrchestrationError>;

    /// Split the query into sub-tasks, or finish once enough rounds are in
    async fn decompose(
        &self,
        query: &str,
        workers: &[WorkerProfile],
        completed_rounds: &[DelegationRound],
    ) -> Result<Delegation, OrchestrationError>;

    /// Merge every collected answer into one final text
    async fn synthesize(
        &self,
        query: &str,
        entries: &[AggregateEntry],
    ) -> Result<String, OrchestrationError>;
}
