//! Supervisor: decompose, dispatch, await, compose.
//!
//! One invocation walks `Idle -> Decomposing -> Dispatching -> Awaiting(k)`,
//! loops back to `Dispatching` while the reasoner asks for more rounds, then
//! `Composing -> Done`. Every agent's provider session is opened when the
//! invocation starts and released when it ends, whichever way it ends.

use super::reasoner::{Assignment, Delegation, Reasoner, WorkerProfile};
use super::types::{
    AggregateEntry, AggregateResult, DelegationRound, RoundEntry, SubTask, SupervisorState,
    WorkerAnswer,
};
use super::worker::WorkerAgent;
use crate::core::OrchestrationError;
use crate::provider::CapabilityProvider;
use chrono::Utc;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Default bound on delegation rounds per invocation
pub const DEFAULT_MAX_ROUNDS: usize = 50;

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub max_rounds: usize,
    /// Run different agents of one round concurrently
    pub parallel_dispatch: bool,
    pub max_worker_steps: usize,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            parallel_dispatch: true,
            max_worker_steps: 8,
        }
    }
}

/// Static description of one worker agent
#[derive(Clone)]
pub struct AgentSpec {
    pub name: String,
    pub objective: String,
    pub provider: Arc<dyn CapabilityProvider>,
}

pub struct Supervisor {
    agents: Vec<AgentSpec>,
    reasoner: Arc<dyn Reasoner>,
    config: SupervisorConfig,
    /// Providers are never shared by two invocations
    invocation: Mutex<()>,
}

/// States visited by one invocation
struct StateTrace(Vec<SupervisorState>);

impl StateTrace {
    fn enter(&mut self, state: SupervisorState) {
        tracing::debug!(?state, "Supervisor state");
        self.0.push(state);
    }
}

impl Supervisor {
    pub fn new(
        agents: Vec<AgentSpec>,
        reasoner: Arc<dyn Reasoner>,
        config: SupervisorConfig,
    ) -> Result<Self, OrchestrationError> {
        if config.max_rounds == 0 {
            return Err(OrchestrationError::Config(
                "max_rounds must be at least 1".to_string(),
            ));
        }

        let mut names = HashSet::new();
        let mut providers = HashSet::new();
        for agent in &agents {
            if !names.insert(agent.name.as_str()) {
                return Err(OrchestrationError::Config(format!(
                    "duplicate agent name '{}'",
                    agent.name
                )));
            }
            if !providers.insert(agent.provider.name()) {
                return Err(OrchestrationError::Config(format!(
                    "provider '{}' is assigned to more than one agent",
                    agent.provider.name()
                )));
            }
        }

        Ok(Self {
            agents,
            reasoner,
            config,
            invocation: Mutex::new(()),
        })
    }

    pub fn agents(&self) -> &[AgentSpec] {
        &self.agents
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Run one query to completion
    pub async fn run(&self, query: &str) -> Result<AggregateResult, OrchestrationError> {
        self.run_with_interrupt(query, &|| false).await
    }

    /// Run one query, consulting `interrupt` after every completed round
    pub async fn run_with_interrupt(
        &self,
        query: &str,
        interrupt: &(dyn Fn() -> bool + Send + Sync),
    ) -> Result<AggregateResult, OrchestrationError> {
        let _invocation = self.invocation.lock().await;
        let started_at = Utc::now();
        let invocation_id = Uuid::new_v4();
        let mut trace = StateTrace(vec![SupervisorState::Idle]);
        tracing::info!(
            invocation = %invocation_id,
            query = %query,
            agents = self.agents.len(),
            "Supervisor invoked"
        );

        // Workers own the open sessions; dropping them on any exit path
        // below closes every session
        let mut workers = Vec::with_capacity(self.agents.len());
        for spec in &self.agents {
            let worker = WorkerAgent::construct(
                spec.name.clone(),
                spec.provider.clone(),
                spec.objective.clone(),
                self.reasoner.clone(),
                self.config.max_worker_steps,
            )
            .await?;
            workers.push(worker);
        }
        let profiles: Vec<WorkerProfile> = workers.iter().map(WorkerAgent::profile).collect();

        trace.enter(SupervisorState::Decomposing);
        let mut rounds: Vec<DelegationRound> = Vec::new();
        loop {
            let assignments = match self.reasoner.decompose(query, &profiles, &rounds).await? {
                Delegation::Dispatch(assignments) if !assignments.is_empty() => assignments,
                _ if rounds.is_empty() => return Err(OrchestrationError::EmptyDecomposition),
                _ => break,
            };

            if rounds.len() >= self.config.max_rounds {
                tracing::warn!(limit = self.config.max_rounds, "Recursion limit exceeded");
                return Err(OrchestrationError::RecursionLimitExceeded {
                    limit: self.config.max_rounds,
                });
            }

            let tasks = self.resolve(assignments, &workers)?;
            trace.enter(SupervisorState::Dispatching);
            trace.enter(SupervisorState::Awaiting(tasks.len()));

            let round_index = rounds.len();
            tracing::info!(round = round_index + 1, subtasks = tasks.len(), "Dispatching round");
            let answers = self.dispatch(&tasks, &workers).await?;

            rounds.push(DelegationRound {
                index: round_index,
                entries: tasks
                    .into_iter()
                    .zip(answers)
                    .map(|(task, answer)| RoundEntry { task, answer })
                    .collect(),
            });
            trace.enter(SupervisorState::Awaiting(0));

            if interrupt() {
                tracing::info!(round = round_index + 1, "Supervisor interrupted");
                return Err(OrchestrationError::Cancelled {
                    after_round: round_index + 1,
                });
            }
        }

        trace.enter(SupervisorState::Composing);
        let entries: Vec<AggregateEntry> = rounds
            .iter()
            .flat_map(|round| round.entries.iter())
            .map(|entry| AggregateEntry {
                producer: entry.answer.agent.clone(),
                text: entry.answer.text.clone(),
            })
            .collect();
        let final_text = self.reasoner.synthesize(query, &entries).await?;

        drop(workers);
        trace.enter(SupervisorState::Done);
        tracing::info!(rounds = rounds.len(), entries = entries.len(), "Supervisor done");

        Ok(AggregateResult {
            invocation_id,
            query: query.to_string(),
            entries,
            final_text,
            rounds,
            states: trace.0,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Turn assignments into sub-tasks, rejecting unknown agents
    fn resolve(
        &self,
        assignments: Vec<Assignment>,
        workers: &[WorkerAgent],
    ) -> Result<Vec<SubTask>, OrchestrationError> {
        assignments
            .into_iter()
            .enumerate()
            .map(|(seq, assignment)| {
                if !workers.iter().any(|w| w.name() == assignment.agent) {
                    let available: Vec<&str> = workers.iter().map(|w| w.name()).collect();
                    return Err(OrchestrationError::UnknownAgent {
                        agent: assignment.agent,
                        available: available.join(", "),
                    });
                }
                Ok(SubTask {
                    seq,
                    agent: assignment.agent,
                    text: assignment.task,
                })
            })
            .collect()
    }

    /// Run one round. Sub-tasks for the same agent run one after another in
    /// submission order; different agents may run concurrently. Answers come
    /// back in submission order regardless of completion order.
    async fn dispatch(
        &self,
        tasks: &[SubTask],
        workers: &[WorkerAgent],
    ) -> Result<Vec<WorkerAnswer>, OrchestrationError> {
        let mut groups: Vec<(&WorkerAgent, Vec<&SubTask>)> = Vec::new();
        for task in tasks {
            match groups.iter_mut().find(|(w, _)| w.name() == task.agent) {
                Some((_, group)) => group.push(task),
                None => {
                    if let Some(worker) = workers.iter().find(|w| w.name() == task.agent) {
                        groups.push((worker, vec![task]));
                    }
                }
            }
        }

        let results = if self.config.parallel_dispatch {
            join_all(groups.into_iter().map(|(w, g)| run_group(w, g))).await
        } else {
            let mut results = Vec::new();
            for (worker, group) in groups {
                results.push(run_group(worker, group).await);
            }
            results
        };

        let mut answers: Vec<(usize, WorkerAnswer)> = Vec::with_capacity(tasks.len());
        for result in results {
            answers.extend(result?);
        }
        answers.sort_by_key(|(seq, _)| *seq);
        Ok(answers.into_iter().map(|(_, answer)| answer).collect())
    }
}

/// Answer one agent's share of a round in submission order
async fn run_group(
    worker: &WorkerAgent,
    group: Vec<&SubTask>,
) -> Result<Vec<(usize, WorkerAnswer)>, OrchestrationError> {
    let mut out = Vec::with_capacity(group.len());
    for task in group {
        let answer = worker.answer(&task.text).await?;
        out.push((task.seq, answer));
    }
    Ok(out)
}
