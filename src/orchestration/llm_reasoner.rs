//! Reasoner backed by a chat model

use super::reasoner::{AgentStep, Assignment, Delegation, Reasoner, ToolRequest, WorkerProfile};
use super::types::{AggregateEntry, DelegationRound, ToolCallRecord, ToolOutcome};
use crate::core::OrchestrationError;
use crate::llm::{LlmProvider, LlmResponse, Message, ToolCall, ToolDefinition};
use crate::tools::ToolDescriptor;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct DecisionPayload {
    #[serde(default)]
    done: bool,
    #[serde(default)]
    subtasks: Vec<SubtaskPayload>,
}

#[derive(Debug, Deserialize)]
struct SubtaskPayload {
    agent: String,
    task: String,
}

pub struct LlmReasoner {
    llm: Arc<dyn LlmProvider>,
    supervisor_prompt: String,
}

impl LlmReasoner {
    pub fn new(llm: Arc<dyn LlmProvider>, supervisor_prompt: impl Into<String>) -> Self {
        Self {
            llm,
            supervisor_prompt: supervisor_prompt.into(),
        }
    }

    async fn chat(
        &self,
        stage: &'static str,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<LlmResponse, OrchestrationError> {
        let response = self.llm.chat(messages, tools).await?;
        if let Some(usage) = response.usage() {
            tracing::debug!(
                stage,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                total_tokens = usage.total_tokens,
                "Model usage"
            );
        }
        Ok(response)
    }

    fn decomposition_prompt(&self, workers: &[WorkerProfile]) -> String {
        let mut prompt = self.supervisor_prompt.clone();

        prompt.push_str("\n\nAvailable agents:\n");
        for worker in workers {
            let tools: Vec<&str> = worker.tools.iter().map(|t| t.name.as_str()).collect();
            prompt.push_str(&format!(
                "- {}: {} (tools: {})\n",
                worker.name,
                first_line(&worker.objective),
                tools.join(", ")
            ));
        }

        prompt.push_str(
            "\nRespond with a JSON object only, no other text. To delegate, use:\n\
             {\"done\": false, \"subtasks\": [{\"agent\": \"<agent name>\", \"task\": \"<sub-task>\"}]}\n\n\
             When the collected answers cover every part of the query, use:\n\
             {\"done\": true}",
        );
        prompt
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default().trim()
}

/// Parse a delegation decision, tolerating a fenced code block around it
fn parse_decision(text: &str) -> Result<Delegation, OrchestrationError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let payload: DecisionPayload = serde_json::from_str(body).map_err(|e| {
        OrchestrationError::Reasoning(format!("supervisor returned invalid JSON: {}", e))
    })?;

    if payload.done {
        return Ok(Delegation::Finish);
    }
    Ok(Delegation::Dispatch(
        payload
            .subtasks
            .into_iter()
            .map(|s| Assignment {
                agent: s.agent,
                task: s.task,
            })
            .collect(),
    ))
}

fn outcome_text(record: &ToolCallRecord) -> String {
    match &record.outcome {
        ToolOutcome::Result(value) => value.to_string(),
        ToolOutcome::Error(message) => format!("Error: {}", message),
    }
}

fn render_rounds(rounds: &[DelegationRound]) -> String {
    let mut out = String::new();
    for round in rounds {
        out.push_str(&format!("Round {}:\n", round.index + 1));
        for entry in &round.entries {
            out.push_str(&format!(
                "- {} was asked \"{}\" and answered:\n{}\n",
                entry.task.agent, entry.task.text, entry.answer.text
            ));
        }
    }
    out
}

#[async_trait]
impl Reasoner for LlmReasoner {
    async fn next_step(
        &self,
        objective: &str,
        tools: &[ToolDescriptor],
        sub_task: &str,
        prior_calls: &[ToolCallRecord],
    ) -> Result<AgentStep, OrchestrationError> {
        let mut messages = vec![Message::system(objective), Message::user(sub_task)];
        for (i, record) in prior_calls.iter().enumerate() {
            let id = format!("call_{}", i + 1);
            messages.push(Message::assistant_tool_calls(vec![ToolCall {
                id: id.clone(),
                name: record.tool.clone(),
                arguments: record.arguments.clone(),
            }]));
            messages.push(Message::tool_result(id, outcome_text(record)));
        }

        let definitions: Vec<ToolDefinition> = tools.iter().map(|t| t.to_definition()).collect();
        let response = self.chat("worker", &messages, Some(&definitions)).await?;

        let calls = response.tool_calls();
        if calls.is_empty() {
            return Ok(AgentStep::Answer(response.text().unwrap_or_default().to_string()));
        }
        Ok(AgentStep::CallTools(
            calls
                .iter()
                .map(|c| ToolRequest {
                    tool: c.name.clone(),
                    arguments: match &c.arguments {
                        Value::Null => Value::Object(Default::default()),
                        other => other.clone(),
                    },
                })
                .collect(),
        ))
    }

    async fn decompose(
        &self,
        query: &str,
        workers: &[WorkerProfile],
        completed_rounds: &[DelegationRound],
    ) -> Result<Delegation, OrchestrationError> {
        let mut user = format!("Query: {}", query);
        if !completed_rounds.is_empty() {
            user.push_str("\n\nAnswers collected so far:\n");
            user.push_str(&render_rounds(completed_rounds));
        }

        let messages = [
            Message::system(self.decomposition_prompt(workers)),
            Message::user(user),
        ];
        let response = self.chat("decompose", &messages, None).await?;
        let text = response.text().ok_or_else(|| {
            OrchestrationError::Reasoning("supervisor returned no decision text".to_string())
        })?;
        tracing::debug!(decision = %text, "Supervisor decision");
        parse_decision(text)
    }

    async fn synthesize(
        &self,
        query: &str,
        entries: &[AggregateEntry],
    ) -> Result<String, OrchestrationError> {
        let mut user = format!("Query: {}\n\nAgent answers:\n", query);
        for entry in entries {
            user.push_str(&format!("[{}]: {}\n\n", entry.producer, entry.text));
        }
        user.push_str(
            "Integrate these answers into one final response that addresses every part of the query.",
        );

        let messages = [Message::system(&self.supervisor_prompt), Message::user(user)];
        let response = self.chat("synthesize", &messages, None).await?;
        Ok(response.text().unwrap_or_default().to_string())
    }
}
