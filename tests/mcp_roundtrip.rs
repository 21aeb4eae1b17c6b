//! Wire-level tests against the `conductor provider` stdio server

use conductor_cli::mcp::{StdioTransport, TransportError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

/// Feed raw lines to a provider process and collect every reply line
async fn exchange(catalog: &str, lines: &[&str]) -> Vec<Value> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_conductor"))
        .args(["provider", catalog])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .unwrap();

    let mut stdin = child.stdin.take().unwrap();
    for line in lines {
        stdin.write_all(line.as_bytes()).await.unwrap();
        stdin.write_all(b"\n").await.unwrap();
    }
    // EOF ends the server loop
    drop(stdin);

    let mut replies = Vec::new();
    let mut stdout = BufReader::new(child.stdout.take().unwrap()).lines();
    while let Some(line) = stdout.next_line().await.unwrap() {
        replies.push(serde_json::from_str(&line).unwrap());
    }
    assert!(child.wait().await.unwrap().success());
    replies
}

#[tokio::test]
async fn test_handshake_and_listing() {
    let replies = exchange(
        "team_management",
        &[
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test","version":"0"}}}"#,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
        ],
    )
    .await;

    // The notification gets no reply
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0]["id"], 1);
    assert_eq!(replies[0]["result"]["serverInfo"]["name"], "Team Management MCP");

    let tools = replies[1]["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["name"], "get_team_members");
    assert_eq!(tools[0]["inputSchema"]["required"], json!(["group_engagement"]));
}

#[tokio::test]
async fn test_tool_call_and_errors() {
    let replies = exchange(
        "engagement",
        &[
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"get_component_engagements","arguments":{"group_engagement":"Office USA"}}}"#,
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"get_weather","arguments":{}}}"#,
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"get_component_engagements","arguments":{}}}"#,
            r#"{"jsonrpc":"2.0","id":4,"method":"resources/list"}"#,
            "not json",
        ],
    )
    .await;
    assert_eq!(replies.len(), 5);

    let text = replies[0]["result"]["content"][0]["text"].as_str().unwrap();
    let value: Value = serde_json::from_str(text).unwrap();
    assert_eq!(
        value,
        json!({"group": "Office USA", "engagements": ["India", "Kochi", "Chennai", "Mumbai"]})
    );
    assert_eq!(replies[0]["result"]["isError"], false);

    assert_eq!(replies[1]["error"]["code"], -32602);
    assert_eq!(replies[1]["error"]["data"]["kind"], "unknown_tool");
    assert_eq!(replies[2]["error"]["data"]["kind"], "validation");
    assert_eq!(replies[3]["error"]["code"], -32601);
    assert_eq!(replies[4]["id"], Value::Null);
    assert_eq!(replies[4]["error"]["code"], -32700);
}

#[tokio::test]
async fn test_stdio_transport_against_provider() {
    let transport = StdioTransport::spawn(
        env!("CARGO_BIN_EXE_conductor"),
        &["provider".to_string(), "it_staff".to_string()],
        &HashMap::new(),
    )
    .unwrap();

    let pong = transport.request("ping", None).await.unwrap();
    assert_eq!(pong, json!({}));

    let err = transport.request("prompts/list", None).await.unwrap_err();
    assert!(matches!(err, TransportError::Rpc(ref e) if e.code == -32601));

    assert!(transport.is_alive());
    transport.shutdown();
    transport.shutdown();
}
