//! Deterministic offline reasoner
//!
//! Routes by keyword overlap instead of a model, so the whole pipeline runs
//! without network access or an API key. Every decision is a pure function of
//! its inputs:
//! - a worker is assigned the query when its objective or tool text shares a
//!   keyword with it; exactly one round is delegated
//! - a worker calls each tool whose text shares a keyword with the sub-task
//! - parameters are filled from listed example values mentioned in the
//!   sub-task, then from quoted phrases for required strings

use super::reasoner::{AgentStep, Assignment, Delegation, Reasoner, ToolRequest, WorkerProfile};
use super::types::{AggregateEntry, DelegationRound, ToolCallRecord};
use crate::core::OrchestrationError;
use crate::tools::{ParamType, ToolDescriptor};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

const STOPWORDS: &[&str] = &[
    "about", "along", "and", "any", "are", "can", "could", "for", "from", "get", "give", "has",
    "have", "how", "its", "list", "me", "out", "please", "show", "tell", "that", "the", "their",
    "them", "then", "there", "this", "what", "when", "where", "which", "who", "why", "with",
    "you", "your",
];

static QUOTED: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r#"['"“‘]([^'"”’]+)['"”’]"#).ok());

/// Lowercase words of a text
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Content keywords: no stopwords, no short words, naive plural folding
fn keywords(text: &str) -> BTreeSet<String> {
    words(text)
        .into_iter()
        .filter(|w| w.len() >= 3 && !STOPWORDS.contains(&w.as_str()))
        .map(|w| match w.strip_suffix('s') {
            Some(stem) if stem.len() >= 3 => stem.to_string(),
            _ => w,
        })
        .collect()
}

/// Keywords a tool is known by. Example values are left out on purpose:
/// they describe accepted inputs, not what the tool is about.
fn tool_keywords(tool: &ToolDescriptor) -> BTreeSet<String> {
    let mut text = format!("{} {}", tool.name.replace('_', " "), tool.description);
    for param in tool.schema.params() {
        text.push(' ');
        text.push_str(&param.description);
    }
    keywords(&text)
}

fn overlap(a: &BTreeSet<String>, b: &BTreeSet<String>) -> usize {
    a.intersection(b).count()
}

/// Whether `phrase` appears in `haystack` as a whole-word sequence
fn mentions(haystack: &[String], phrase: &str) -> bool {
    let needle = words(phrase);
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle.as_slice())
}

fn quoted_phrases(text: &str) -> Vec<String> {
    let Some(re) = QUOTED.as_ref() else {
        return Vec::new();
    };
    re.captures_iter(text)
        .map(|c| c[1].trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Infer arguments for a tool, or `None` when a required value is unknown
fn infer_arguments(tool: &ToolDescriptor, sub_task: &str) -> Option<Value> {
    let task_words = words(sub_task);
    let mut quoted = quoted_phrases(sub_task).into_iter();
    let mut args = Map::new();

    for param in tool.schema.params() {
        let example = param
            .examples
            .iter()
            .find(|example| mentions(&task_words, example));

        if let Some(example) = example {
            args.insert(param.name.clone(), Value::String(example.clone()));
        } else if param.required {
            if param.kind != ParamType::String {
                return None;
            }
            args.insert(param.name.clone(), Value::String(quoted.next()?));
        }
    }
    Some(Value::Object(args))
}

const DIGEST_CHARS: usize = 80;

fn digest(line: &str) -> String {
    if line.chars().count() <= DIGEST_CHARS {
        return line.to_string();
    }
    let cut: String = line.chars().take(DIGEST_CHARS).collect();
    format!("{}...", cut.trim_end())
}

#[derive(Debug, Default, Clone)]
pub struct KeywordReasoner;

impl KeywordReasoner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Reasoner for KeywordReasoner {
    async fn next_step(
        &self,
        _objective: &str,
        tools: &[ToolDescriptor],
        sub_task: &str,
        prior_calls: &[ToolCallRecord],
    ) -> Result<AgentStep, OrchestrationError> {
        if !prior_calls.is_empty() {
            let failed = prior_calls.iter().filter(|c| c.is_error()).count();
            let mut text = format!(
                "Looked up {} tool result(s) for: {}",
                prior_calls.len(),
                sub_task
            );
            if failed > 0 {
                text.push_str(&format!(" ({} failed)", failed));
            }
            return Ok(AgentStep::Answer(text));
        }

        let task = keywords(sub_task);
        let requests: Vec<ToolRequest> = tools
            .iter()
            .filter(|tool| overlap(&task, &tool_keywords(tool)) > 0)
            .filter_map(|tool| {
                let arguments = infer_arguments(tool, sub_task);
                if arguments.is_none() {
                    tracing::debug!(tool = %tool.name, "Skipping tool, required arguments unknown");
                }
                Some(ToolRequest {
                    tool: tool.name.clone(),
                    arguments: arguments?,
                })
            })
            .collect();

        if requests.is_empty() {
            let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
            return Ok(AgentStep::Answer(format!(
                "None of my tools ({}) could be applied to: {}",
                names.join(", "),
                sub_task
            )));
        }
        Ok(AgentStep::CallTools(requests))
    }

    async fn decompose(
        &self,
        query: &str,
        workers: &[WorkerProfile],
        completed_rounds: &[DelegationRound],
    ) -> Result<Delegation, OrchestrationError> {
        if !completed_rounds.is_empty() {
            return Ok(Delegation::Finish);
        }

        let query_keywords = keywords(query);
        let assignments = workers
            .iter()
            .filter(|worker| {
                let mut known = keywords(&worker.objective);
                for tool in &worker.tools {
                    known.extend(tool_keywords(tool));
                }
                let score = overlap(&query_keywords, &known);
                tracing::debug!(agent = %worker.name, score, "Keyword score");
                score > 0
            })
            .map(|worker| Assignment {
                agent: worker.name.clone(),
                task: query.to_string(),
            })
            .collect();

        Ok(Delegation::Dispatch(assignments))
    }

    async fn synthesize(
        &self,
        query: &str,
        entries: &[AggregateEntry],
    ) -> Result<String, OrchestrationError> {
        let mut producers: Vec<&str> = Vec::new();
        for entry in entries {
            if !producers.contains(&entry.producer.as_str()) {
                producers.push(&entry.producer);
            }
        }

        // Full answers are already rendered per producer; only their headlines go here
        let mut text = format!(
            "Answer to \"{}\" compiled from {}.",
            query,
            producers.join(" and ")
        );
        for entry in entries {
            let headline = entry.text.lines().next().unwrap_or_default();
            text.push_str(&format!("\n- {}: {}", entry.producer, digest(headline)));
        }
        Ok(text)
    }
}
