//! CLI transport for direct terminal interaction

use crate::config::Config;
use crate::mcp::McpServer;
use crate::services::{
    empty_query_json, list_provider_tools, OrchestratorService, EMPTY_QUERY_REPLY,
};
use crate::tools::{catalog, ToolDescriptor};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};
use tokio::io::BufReader;

/// Run one query and print the reply
pub async fn run_ask(config: &Config, query: &str, offline: bool, json: bool) -> Result<()> {
    // Answered before any provider or model is set up
    if query.trim().is_empty() {
        if json {
            println!("{}", serde_json::to_string_pretty(&empty_query_json(query))?);
        } else {
            println!("{}", EMPTY_QUERY_REPLY);
        }
        return Ok(());
    }

    let service = OrchestratorService::from_config(config, offline)?;

    if json {
        let reply = service.process_query_json(query).await;
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else {
        println!("{}", service.process_query(query).await);
    }
    Ok(())
}

/// Serve one built-in catalog as an MCP server on stdin/stdout
pub async fn run_provider_server(catalog_name: &str) -> Result<()> {
    let registry = catalog::registry(catalog_name)
        .with_context(|| {
            format!(
                "Unknown catalog '{}' (expected one of: {})",
                catalog_name,
                catalog::CATALOG_NAMES.join(", ")
            )
        })?
        .with_context(|| format!("Failed to build catalog '{}'", catalog_name))?;

    let server = McpServer::new(catalog::server_name(catalog_name), registry);
    server
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
}

#[derive(Tabled)]
struct ToolRow {
    #[tabled(rename = "Tool")]
    name: String,
    #[tabled(rename = "Parameters")]
    params: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&ToolDescriptor> for ToolRow {
    fn from(tool: &ToolDescriptor) -> Self {
        let params: Vec<String> = tool
            .schema
            .params()
            .iter()
            .map(|p| {
                let marker = if p.required { "" } else { "?" };
                format!("{}{}: {}", p.name, marker, p.kind.as_str())
            })
            .collect();
        Self {
            name: tool.name.clone(),
            params: params.join(", "),
            description: tool.description.clone(),
        }
    }
}

/// Open a configured provider, print its tools, and close it
pub async fn run_list_tools(config: &Config, provider: &str, json: bool) -> Result<()> {
    let tools = list_provider_tools(config, provider).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    let transport = config
        .providers
        .get(provider)
        .map(|p| p.transport())
        .unwrap_or_default();
    println!("\n{} {} ({})", "Provider:".bold(), provider.green(), transport);
    let mut table = Table::new(tools.iter().map(ToolRow::from));
    table.with(Style::rounded());
    println!("{}", table);
    Ok(())
}

/// Print the effective configuration as TOML. `source` is the file it was
/// read from, if any.
pub fn run_show_config(config: &Config, source: Option<&Path>) -> Result<()> {
    match source {
        Some(path) => eprintln!("{} {}", "# Loaded from".dimmed(), path.display()),
        None => eprintln!("{}", "# Built-in defaults".dimmed()),
    }
    print!("{}", config.to_toml()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_row_marks_optional_params() {
        let registry = catalog::registry("it_staff").unwrap().unwrap();
        let rows: Vec<ToolRow> = registry.list_tools().iter().map(ToolRow::from).collect();
        assert_eq!(rows[0].params, "specialty?: string");
        assert_eq!(rows[1].params, "");
        assert_eq!(rows[2].params, "location: string");
    }
}
