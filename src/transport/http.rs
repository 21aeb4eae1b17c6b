//! HTTP front-end: a query form and a JSON query API

use crate::services::OrchestratorService;
use anyhow::{Context, Result};
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Agent Orchestration System</title>
<style>
  body { font-family: sans-serif; max-width: 52rem; margin: 2rem auto; padding: 0 1rem; }
  textarea { width: 100%; font: inherit; }
  pre { white-space: pre-wrap; background: #f4f4f4; padding: 1rem; min-height: 10rem; }
</style>
</head>
<body>
<h1>Agent Orchestration System</h1>
<p>Ask questions about engagements, team management, the service desk, and IT staff</p>
<form id="query-form">
  <label for="query">Your Query</label>
  <textarea id="query" rows="3" placeholder="e.g., List out the component engagements of a specific group 'office USA' along with the team members"></textarea>
  <button type="submit">Submit</button>
</form>
<h2>Response</h2>
<pre id="response"></pre>
<script>
document.getElementById("query-form").addEventListener("submit", async (event) => {
  event.preventDefault();
  const output = document.getElementById("response");
  output.textContent = "Working...";
  try {
    const reply = await fetch("/api/query", {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify({ query: document.getElementById("query").value }),
    });
    if (!reply.ok) {
      output.textContent = `Request failed (${reply.status}): ${await reply.text()}`;
      return;
    }
    output.textContent = (await reply.json()).response;
  } catch (err) {
    output.textContent = `Request failed: ${err}`;
  }
});
</script>
</body>
</html>
"#;

struct AppState {
    service: OrchestratorService,
}

#[derive(Debug, Deserialize)]
struct QueryRequest {
    #[serde(default)]
    query: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct QueryResponse {
    response: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct HealthResponse {
    status: String,
    version: String,
    agents: Vec<String>,
}

/// Build the router around a ready service
pub fn router(service: OrchestratorService) -> Router {
    let state = Arc::new(AppState { service });

    Router::new()
        .route("/", get(index))
        .route("/api/query", post(handle_query))
        .route("/health", get(health_check))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run_http_server(service: OrchestratorService, host: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, router(service)).await?;
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn handle_query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> impl IntoResponse {
    tracing::info!(query = %request.query, "HTTP query");
    let response = state.service.process_query(&request.query).await;
    Json(QueryResponse { response })
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        agents: state
            .service
            .supervisor()
            .agents()
            .iter()
            .map(|a| a.name.clone())
            .collect(),
    })
}
