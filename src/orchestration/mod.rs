//! Multi-agent orchestration
//!
//! A [`Supervisor`] splits a query into sub-tasks for [`WorkerAgent`]s, each
//! bound to one capability provider, and composes their answers. Decisions
//! (how to split, which tool to call, how to merge) come from a [`Reasoner`].

pub mod keyword;
pub mod llm_reasoner;
pub mod reasoner;
pub mod supervisor;
pub mod types;
pub mod worker;

pub use keyword::KeywordReasoner;
pub use llm_reasoner::LlmReasoner;
pub use reasoner::{AgentStep, Assignment, Delegation, Reasoner, ToolRequest, WorkerProfile};
pub use supervisor::{AgentSpec, Supervisor, SupervisorConfig, DEFAULT_MAX_ROUNDS};
pub use types::{
    AggregateEntry, AggregateResult, DelegationRound, RoundEntry, SubTask, SupervisorState,
    ToolCallRecord, ToolOutcome, WorkerAnswer, SUPERVISOR_NAME,
};
pub use worker::WorkerAgent;
