//! End-to-end tests: prompt folder on disk -> registry -> line-delimited
//! JSON-RPC session.

use std::fs;

use prompt_mcp_server::core::config::PromptsConfig;
use prompt_mcp_server::core::transport::serve_lines;
use prompt_mcp_server::core::{Config, McpServer};
use prompt_mcp_server::domains::prompts::{ArgumentPolicy, FormatterKind, load_prompts};
use serde_json::{Value, json};
use tempfile::TempDir;

const GREETING: &str = "---
name: greeting
title: Greeting
arguments:
  - name: user
    description: Who to greet
  - name: project
    default: MyApp
---
Hello {user}! Welcome to {project}.
";

fn prompt_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("greeting.md"), GREETING).unwrap();
    fs::write(dir.path().join("simple.md"), "Just text.").unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(
        dir.path().join("nested/broken.md"),
        "---\narguments: nope\n---\nbody",
    )
    .unwrap();
    dir
}

fn server_for(dir: &TempDir, prompts: PromptsConfig) -> McpServer {
    let loaded = load_prompts(dir.path(), &prompts).unwrap();
    let config = Config {
        prompts,
        ..Config::default()
    };
    McpServer::new(config, loaded.registry)
}

/// Feed `requests` through a fresh session and collect the response lines.
async fn exchange(server: &McpServer, requests: &[Value]) -> Vec<Value> {
    let input: String = requests.iter().map(|r| format!("{r}\n")).collect();
    let mut output = Vec::new();

    serve_lines(server.session(), input.as_bytes(), &mut output)
        .await
        .unwrap();

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn initialize() -> Value {
    json!({"jsonrpc": "2.0", "id": 0, "method": "initialize", "params": {"protocolVersion": "2025-06-18"}})
}

fn initialized() -> Value {
    json!({"jsonrpc": "2.0", "method": "notifications/initialized"})
}

#[tokio::test]
async fn test_full_session_over_lines() {
    let dir = prompt_dir();
    let server = server_for(&dir, PromptsConfig::default());

    let responses = exchange(
        &server,
        &[
            initialize(),
            initialized(),
            json!({"jsonrpc": "2.0", "id": 1, "method": "prompts/list"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "prompts/get",
                   "params": {"name": "greeting", "arguments": {"user": "Ann"}}}),
            json!({"jsonrpc": "2.0", "id": 3, "method": "prompts/get",
                   "params": {"name": "simple"}}),
        ],
    )
    .await;

    // The notification is not answered.
    assert_eq!(responses.len(), 4);
    let ids: Vec<_> = responses.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!(0), json!(1), json!(2), json!(3)]);

    let prompts = responses[1]["result"]["prompts"].as_array().unwrap();
    let names: Vec<_> = prompts.iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["greeting", "simple"]);
    assert_eq!(prompts[0]["title"], "Greeting");
    assert_eq!(prompts[1]["description"], "simple.md");
    assert_eq!(prompts[1]["arguments"], json!([]));

    assert_eq!(
        responses[2]["result"]["messages"][0]["content"]["text"],
        "Hello Ann! Welcome to MyApp."
    );
    assert_eq!(
        responses[3]["result"]["messages"][0]["content"]["text"],
        "Just text."
    );
}

#[tokio::test]
async fn test_errors_do_not_stop_the_session() {
    let dir = prompt_dir();
    let server = server_for(&dir, PromptsConfig::default());

    let input = format!(
        "{}\n{}\nthis is not json\n{}\n{}\n",
        initialize(),
        json!({"jsonrpc": "2.0", "id": 1, "method": "prompts/get", "params": {"name": "missing"}}),
        json!({"jsonrpc": "2.0", "id": 2, "method": "prompts/get", "params": {"name": "greeting"}}),
        json!({"jsonrpc": "2.0", "id": 3, "method": "ping"}),
    );
    let mut output = Vec::new();
    serve_lines(server.session(), input.as_bytes(), &mut output)
        .await
        .unwrap();

    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(responses.len(), 5);
    assert_eq!(responses[1]["error"]["code"], -32002);
    assert_eq!(responses[2]["error"]["code"], -32700);
    assert!(responses[2]["id"].is_null());
    assert_eq!(responses[3]["error"]["code"], -32602);
    assert_eq!(responses[4]["result"], json!({}));
}

#[tokio::test]
async fn test_dollar_auto_discovery_and_lenient_arguments() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("deploy.md"),
        "Deploy ${service}s to $env for $$5",
    )
    .unwrap();

    let prompts = PromptsConfig {
        variable_format: FormatterKind::Dollar,
        auto_discover_args: true,
        argument_policy: ArgumentPolicy::Lenient,
        ..PromptsConfig::default()
    };
    let server = server_for(&dir, prompts);

    let responses = exchange(
        &server,
        &[
            initialize(),
            json!({"jsonrpc": "2.0", "id": 1, "method": "prompts/get",
                   "params": {"name": "deploy",
                              "arguments": {"service": "api", "env": "prod", "extra": "x"}}}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "prompts/get",
                   "params": {"name": "deploy", "arguments": {"service": "api"}}}),
        ],
    )
    .await;

    assert_eq!(
        responses[1]["result"]["messages"][0]["content"]["text"],
        "Deploy apis to prod for $5"
    );
    assert_eq!(responses[2]["error"]["code"], -32602);
}

#[tokio::test]
async fn test_skip_frontmatter_serves_raw_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("raw.md"), "---\nname: other\n---\nBody").unwrap();

    let prompts = PromptsConfig {
        skip_frontmatter: true,
        ..PromptsConfig::default()
    };
    let server = server_for(&dir, prompts);

    let responses = exchange(
        &server,
        &[
            initialize(),
            json!({"jsonrpc": "2.0", "id": 1, "method": "prompts/get", "params": {"name": "raw"}}),
        ],
    )
    .await;

    assert_eq!(
        responses[1]["result"]["messages"][0]["content"]["text"],
        "---\nname: other\n---\nBody"
    );
}
