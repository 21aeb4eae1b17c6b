//! Orchestrator service
//!
//! Builds providers, the reasoner, and the supervisor from configuration and
//! owns the rules every front-end shares: blank queries are rejected without
//! touching the supervisor, and failures become a single readable message.

use crate::config::{Config, LlmBackend};
use crate::core::OrchestrationError;
use crate::llm::OpenAiProvider;
use crate::orchestration::{
    AgentSpec, AggregateResult, KeywordReasoner, LlmReasoner, Reasoner, Supervisor,
    SupervisorConfig,
};
use crate::provider::{self, SessionGuard};
use crate::tools::ToolDescriptor;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::sync::Arc;

pub const EMPTY_QUERY_REPLY: &str = "Please enter a query.";

pub struct OrchestratorService {
    supervisor: Supervisor,
}

impl OrchestratorService {
    /// Build everything the configuration describes. `offline` forces the
    /// keyword reasoner regardless of `[llm].provider`.
    pub fn from_config(config: &Config, offline: bool) -> Result<Self> {
        config.validate()?;

        let reasoner: Arc<dyn Reasoner> = if offline || config.llm.provider == LlmBackend::Offline {
            tracing::info!("Using offline keyword reasoner");
            Arc::new(KeywordReasoner::new())
        } else {
            let llm = OpenAiProvider::from_config(&config.llm)
                .context("Failed to set up the language model (use --offline to run without one)")?;
            tracing::info!(model = %llm.model(), "Using language model reasoner");
            Arc::new(LlmReasoner::new(
                Arc::new(llm),
                config.supervisor.system_prompt.clone(),
            ))
        };

        let mut agents = Vec::with_capacity(config.agents.len());
        for agent in &config.agents {
            let provider_config = config
                .provider_for(agent)
                .with_context(|| format!("No provider configured for agent '{}'", agent.name))?;
            agents.push(AgentSpec {
                name: agent.name.clone(),
                objective: agent.objective.clone(),
                provider: provider::from_config(&agent.provider, provider_config)?,
            });
        }

        let settings = &config.supervisor;
        let supervisor = Supervisor::new(
            agents,
            reasoner,
            SupervisorConfig {
                max_rounds: settings.max_rounds,
                parallel_dispatch: settings.parallel_dispatch,
                max_worker_steps: settings.max_worker_steps,
            },
        )?;
        Ok(Self::new(supervisor))
    }

    pub fn new(supervisor: Supervisor) -> Self {
        Self { supervisor }
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    /// Run a query and keep the structured result
    pub async fn invoke(&self, query: &str) -> Result<AggregateResult, OrchestrationError> {
        self.supervisor.run(query.trim()).await
    }

    /// Run a query and render the reply as text
    pub async fn process_query(&self, query: &str) -> String {
        if query.trim().is_empty() {
            return EMPTY_QUERY_REPLY.to_string();
        }

        match self.invoke(query).await {
            Ok(result) => result.format(),
            Err(e) => {
                tracing::error!(error = %e, "Query failed");
                error_reply(&e)
            }
        }
    }

    /// Run a query and render the reply as JSON, including rounds and states
    pub async fn process_query_json(&self, query: &str) -> Value {
        if query.trim().is_empty() {
            return empty_query_json(query);
        }

        match self.invoke(query).await {
            Ok(result) => {
                let response = result.format();
                let mut value = json!(result);
                if let Value::Object(map) = &mut value {
                    map.insert("response".to_string(), Value::String(response));
                }
                value
            }
            Err(e) => {
                tracing::error!(error = %e, "Query failed");
                json!({ "query": query, "error": error_reply(&e) })
            }
        }
    }
}

/// JSON reply for a blank query
pub fn empty_query_json(query: &str) -> Value {
    json!({ "query": query, "error": EMPTY_QUERY_REPLY })
}

pub fn error_reply(err: &OrchestrationError) -> String {
    format!("An error occurred: {}", err)
}

/// Open one configured provider, snapshot its tools, and close it again
pub async fn list_provider_tools(config: &Config, name: &str) -> Result<Vec<ToolDescriptor>> {
    let provider_config = config.providers.get(name).with_context(|| {
        let known: Vec<&str> = config.providers.keys().map(String::as_str).collect();
        format!("Unknown provider '{}' (configured: {})", name, known.join(", "))
    })?;
    let provider = provider::from_config(name, provider_config)?;

    let session = SessionGuard::open(provider).await?;
    let tools = session.provider().list_tools().await?;
    session.release();
    Ok(tools)
}
