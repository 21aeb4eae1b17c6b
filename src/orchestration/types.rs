//! Values produced by one supervisor invocation

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Supervisor state over one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "outstanding", rename_all = "snake_case")]
pub enum SupervisorState {
    Idle,
    Decomposing,
    Dispatching,
    /// Sub-task results still outstanding in the current round
    Awaiting(usize),
    Composing,
    Done,
}

/// One unit of delegated work
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubTask {
    /// Submission position within its round
    pub seq: usize,
    pub agent: String,
    pub text: String,
}

/// Outcome of one tool call made by a worker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallRecord {
    pub tool: String,
    pub arguments: Value,
    #[serde(flatten)]
    pub outcome: ToolOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolOutcome {
    Result(Value),
    Error(String),
}

impl ToolCallRecord {
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Error(_))
    }

    /// One-line rendering used in answers and prompts
    pub fn render(&self) -> String {
        let args = if self.arguments.as_object().map_or(true, |a| a.is_empty()) {
            String::new()
        } else {
            self.arguments.to_string()
        };
        match &self.outcome {
            ToolOutcome::Result(value) => format!("{}({}) -> {}", self.tool, args, value),
            ToolOutcome::Error(message) => format!("{}({}) failed: {}", self.tool, args, message),
        }
    }
}

/// A worker's answer to one sub-task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerAnswer {
    pub agent: String,
    pub text: String,
    pub calls: Vec<ToolCallRecord>,
}

/// A dispatched sub-task with its result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundEntry {
    pub task: SubTask,
    pub answer: WorkerAnswer,
}

/// Sub-tasks dispatched together, in submission order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelegationRound {
    pub index: usize,
    pub entries: Vec<RoundEntry>,
}

/// One (producer, text) pair of the aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateEntry {
    pub producer: String,
    pub text: String,
}

/// Everything one invocation produced
#[derive(Debug, Clone, Serialize)]
pub struct AggregateResult {
    pub invocation_id: Uuid,
    pub query: String,
    /// Worker answers, rounds in order and sub-tasks in submission order
    pub entries: Vec<AggregateEntry>,
    pub final_text: String,
    pub rounds: Vec<DelegationRound>,
    pub states: Vec<SupervisorState>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Producer label of the synthesized answer
pub const SUPERVISOR_NAME: &str = "Supervisor";

impl AggregateResult {
    /// Names of agents that contributed, first appearance order
    pub fn producers(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.producer.as_str()) {
                seen.push(&entry.producer);
            }
        }
        seen
    }

    /// `[Producer]: text` blocks separated by blank lines, supervisor last
    pub fn format(&self) -> String {
        self.entries
            .iter()
            .map(|e| (e.producer.as_str(), e.text.as_str()))
            .chain(std::iter::once((SUPERVISOR_NAME, self.final_text.as_str())))
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(producer, text)| format!("[{}]: {}", producer, text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
