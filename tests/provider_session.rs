//! Provider sessions against real `conductor provider` child processes

use conductor_cli::core::{InvokeError, SessionError, ToolError};
use conductor_cli::provider::{
    CapabilityProvider, LocalProvider, McpLaunch, McpProvider, SessionGuard, SessionState,
};
use conductor_cli::tools::catalog;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

fn child_provider(catalog_name: &str) -> Arc<McpProvider> {
    Arc::new(McpProvider::new(
        catalog_name,
        McpLaunch {
            command: env!("CARGO_BIN_EXE_conductor").to_string(),
            args: vec!["provider".to_string(), catalog_name.to_string()],
            env: HashMap::from([("RUST_LOG".to_string(), "warn".to_string())]),
        },
    ))
}

#[tokio::test]
async fn test_child_provider_lists_same_tools_as_local() {
    let remote = child_provider("it_staff");
    let session = SessionGuard::open(remote.clone()).await.unwrap();
    let remote_tools = session.provider().list_tools().await.unwrap();

    let local = catalog::registry("it_staff").unwrap().unwrap().list_tools();
    assert_eq!(remote_tools, local);

    session.release();
    assert_eq!(remote.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_child_provider_invocations() {
    let provider = child_provider("service_desk");
    let session = SessionGuard::open(provider.clone()).await.unwrap();
    let p = session.provider();

    let status = p
        .invoke("get_system_status", json!({"system_name": "email"}))
        .await
        .unwrap();
    assert_eq!(status["Email"]["status"], "Degraded");

    let tickets = p
        .invoke("get_active_tickets", json!({"priority": "high"}))
        .await
        .unwrap();
    assert_eq!(tickets[0]["id"], "INC-002");

    let err = p.invoke("get_weather", json!({})).await.unwrap_err();
    assert_eq!(
        err,
        InvokeError::Tool(ToolError::UnknownTool("get_weather".into()))
    );

    let err = p
        .invoke("get_system_status", json!({"system_name": 42}))
        .await
        .unwrap_err();
    assert!(matches!(err, InvokeError::Tool(ToolError::Validation { .. })));

    // Tool failures leave the session usable
    assert!(p.state().is_open());
    assert!(p.invoke("get_active_tickets", json!({})).await.is_ok());
}

#[tokio::test]
async fn test_dropped_guard_closes_child_session() {
    let provider = child_provider("engagement");
    {
        let guard = SessionGuard::open(provider.clone()).await.unwrap();
        let value = guard
            .provider()
            .invoke("get_component_engagements", json!({"group_engagement": "Office USA"}))
            .await
            .unwrap();
        assert_eq!(value["group"], "Office USA");
    }
    assert_eq!(provider.state(), SessionState::Closed);

    let err = provider
        .invoke("get_component_engagements", json!({"group_engagement": "x"}))
        .await
        .unwrap_err();
    assert_eq!(err, InvokeError::Session(SessionError::NotOpen("engagement".into())));
}

#[tokio::test]
async fn test_provider_reopens_after_close() {
    let provider = child_provider("team_management");
    for _ in 0..2 {
        let guard = SessionGuard::open(provider.clone()).await.unwrap();
        assert!(provider.state().is_open());
        drop(guard);
        assert_eq!(provider.state(), SessionState::Closed);
    }
}

#[tokio::test]
async fn test_unknown_catalog_child_is_unavailable() {
    let provider = child_provider("weather");
    let err = SessionGuard::open(provider.clone()).await.unwrap_err();
    assert!(matches!(err, SessionError::ProviderUnavailable { .. }));
    assert!(!provider.state().is_open());
}

#[tokio::test]
async fn test_double_open_is_rejected() {
    let provider: Arc<dyn CapabilityProvider> = Arc::new(LocalProvider::new(
        "engagement",
        catalog::registry("engagement").unwrap().unwrap(),
    ));
    let _guard = SessionGuard::open(provider.clone()).await.unwrap();
    assert_eq!(
        SessionGuard::open(provider.clone()).await.unwrap_err(),
        SessionError::AlreadyOpen("engagement".into())
    );
    assert!(provider.state().is_open());
}
