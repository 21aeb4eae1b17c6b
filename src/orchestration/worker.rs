//! Worker agents
//!
//! A worker pairs one capability provider with an objective. It owns the
//! provider's open session for as long as it lives and answers sub-tasks by
//! letting the reasoner pick tool calls until it produces an answer.

use super::reasoner::{AgentStep, Reasoner, WorkerProfile};
use super::types::{ToolCallRecord, ToolOutcome, WorkerAnswer};
use crate::core::{InvokeError, OrchestrationError, SessionError};
use crate::provider::{CapabilityProvider, SessionGuard};
use crate::tools::ToolDescriptor;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct WorkerAgent {
    name: String,
    objective: String,
    /// Tool list as seen when the session was opened
    tools: Vec<ToolDescriptor>,
    session: SessionGuard,
    reasoner: Arc<dyn Reasoner>,
    max_steps: usize,
    /// One sub-task at a time
    busy: Mutex<()>,
}

impl WorkerAgent {
    /// Open the provider's session and snapshot its tools
    pub async fn construct(
        name: impl Into<String>,
        provider: Arc<dyn CapabilityProvider>,
        objective: impl Into<String>,
        reasoner: Arc<dyn Reasoner>,
        max_steps: usize,
    ) -> Result<Self, SessionError> {
        let name = name.into();
        let session = SessionGuard::open(provider).await?;
        // The guard closes the session again if listing fails
        let tools = session.provider().list_tools().await?;
        tracing::debug!(
            agent = %name,
            provider = %session.provider().name(),
            tools = tools.len(),
            "Worker ready"
        );

        Ok(Self {
            name,
            objective: objective.into(),
            tools,
            session,
            reasoner,
            max_steps: max_steps.max(1),
            busy: Mutex::new(()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn provider(&self) -> &Arc<dyn CapabilityProvider> {
        self.session.provider()
    }

    pub fn profile(&self) -> WorkerProfile {
        WorkerProfile {
            name: self.name.clone(),
            objective: self.objective.clone(),
            tools: self.tools.clone(),
        }
    }

    /// Close the provider session early. The tool snapshot stays readable,
    /// but further tool calls fail with a session error.
    pub fn end_session(&self) {
        self.provider().close_session();
    }

    /// Answer one sub-task.
    ///
    /// Tool failures are folded into the answer text. Only session failures
    /// and reasoner failures are returned as errors.
    pub async fn answer(&self, sub_task: &str) -> Result<WorkerAnswer, OrchestrationError> {
        let _busy = self.busy.lock().await;
        tracing::info!(agent = %self.name, task = %sub_task, "Worker started");

        let mut calls: Vec<ToolCallRecord> = Vec::new();
        for _ in 0..self.max_steps {
            let step = self
                .reasoner
                .next_step(&self.objective, &self.tools, sub_task, &calls)
                .await?;

            let requests = match step {
                AgentStep::Answer(text) => return Ok(self.finish(text, calls)),
                AgentStep::CallTools(requests) => requests,
            };

            for request in requests {
                let outcome = match self
                    .provider()
                    .invoke(&request.tool, request.arguments.clone())
                    .await
                {
                    Ok(value) => ToolOutcome::Result(value),
                    Err(InvokeError::Session(e)) => return Err(e.into()),
                    Err(InvokeError::Tool(e)) => {
                        tracing::warn!(
                            agent = %self.name,
                            tool = %request.tool,
                            error = %e,
                            "Tool call failed"
                        );
                        ToolOutcome::Error(e.to_string())
                    }
                };
                calls.push(ToolCallRecord {
                    tool: request.tool,
                    arguments: request.arguments,
                    outcome,
                });
            }
        }

        tracing::warn!(agent = %self.name, steps = self.max_steps, "Worker step limit reached");
        let text = format!(
            "Stopped after {} steps without reaching a final answer.",
            self.max_steps
        );
        Ok(self.finish(text, calls))
    }

    /// Attach every tool result to the answer
    fn finish(&self, text: String, calls: Vec<ToolCallRecord>) -> WorkerAnswer {
        let mut text = text.trim().to_string();
        if !calls.is_empty() {
            if !text.is_empty() {
                text.push_str("\n\n");
            }
            text.push_str("Tool results:");
            for call in &calls {
                text.push_str("\n- ");
                text.push_str(&call.render());
            }
        }
        tracing::info!(agent = %self.name, calls = calls.len(), "Worker finished");

        WorkerAnswer {
            agent: self.name.clone(),
            text,
            calls,
        }
    }
}

impl std::fmt::Debug for WorkerAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerAgent")
            .field("name", &self.name)
            .field("tools", &self.tools.len())
            .field("session", &self.session)
            .finish()
    }
}
