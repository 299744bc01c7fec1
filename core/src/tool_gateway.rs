//! Client for the GitHub MCP Tool Server.
//!
//! The server speaks plain JSON over HTTP:
//! - `POST /mcp/github` takes a [`ToolQuery`] and answers with an arbitrary
//!   JSON object
//! - `GET /mcp/tools` answers with an array of [`ToolCatalogEntry`]
//!
//! [`McpClient`] never lets a Tool Server problem escape: query failures come
//! back as [`ToolResult::Failure`] and catalog failures as the fallback
//! catalog.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::catalog;
use crate::config::ToolServerSettings;
use crate::intent::OperationRouter;
use crate::model::{ToolCatalogEntry, ToolPayload, ToolQuery, ToolResult};

/// The seam between the orchestrator and the Tool Server.
///
/// `query` yields `Ok(None)` when there is nothing to report at all. An `Err`
/// from either method is reserved for implementations that cannot absorb
/// their own failures; [`McpClient`] never returns one.
#[async_trait]
pub trait ToolGateway: Send + Sync {
    async fn query(&self, text: &str, credential: Option<&str>) -> Result<Option<ToolResult>>;

    async fn list_tools(&self) -> Result<Vec<ToolCatalogEntry>>;
}

pub struct McpClient {
    http: reqwest::Client,
    base_url: String,
    query_timeout: Duration,
    catalog_timeout: Duration,
    router: OperationRouter,
}

impl McpClient {
    pub fn new(settings: &ToolServerSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .user_agent(concat!("promptbridge/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            query_timeout: settings.query_timeout,
            catalog_timeout: settings.catalog_timeout,
            router: OperationRouter::default(),
        })
    }

    pub fn with_router(mut self, router: OperationRouter) -> Self {
        self.router = router;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_query(&self, text: &str) -> ToolQuery {
        ToolQuery::new(text, self.router.route(text))
    }

    /// Runs a GitHub query. Always produces a result.
    pub async fn execute_query(&self, text: &str, credential: Option<&str>) -> ToolResult {
        info!("Executing GitHub MCP query: {}", text);

        match self.send_query(text, credential).await {
            Ok(Some(result)) => {
                info!("MCP query executed successfully");
                result
            }
            Ok(None) => {
                warn!("MCP server returned null response");
                ToolResult::failure("MCP server returned empty response")
            }
            Err(e) => {
                error!("Error executing GitHub MCP query: {:#}", e);
                ToolResult::failure(format!("Error communicating with MCP server: {:#}", e))
            }
        }
    }

    /// Lists the Tool Server's tools, or the fallback catalog.
    pub async fn available_tools(&self) -> Vec<ToolCatalogEntry> {
        info!("Fetching available GitHub MCP tools");

        match self.fetch_catalog().await {
            Ok(listing) => catalog::resolve(listing),
            Err(e) => {
                error!("Error fetching MCP tools: {:#}", e);
                catalog::fallback_catalog()
            }
        }
    }

    async fn send_query(&self, text: &str, credential: Option<&str>) -> Result<Option<ToolResult>> {
        let query = self.build_query(text);
        debug!("MCP operation: {:?}", query.parameters.operation);

        let mut request = self
            .http
            .post(format!("{}/mcp/github", self.base_url))
            .timeout(self.query_timeout)
            .json(&query);
        if let Some(token) = credential.map(str::trim).filter(|t| !t.is_empty()) {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| describe_transport_error(e, self.query_timeout))?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("MCP server responded with status {}", status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| describe_transport_error(e, self.query_timeout))?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        match serde_json::from_str::<Value>(&body).context("MCP server sent malformed JSON")? {
            Value::Null => Ok(None),
            Value::Object(map) => {
                let payload = ToolPayload::from(map);
                debug!("MCP payload shape: {:?}", payload.shape());
                Ok(Some(ToolResult::Payload(payload)))
            }
            other => Err(anyhow!(
                "MCP server sent a JSON {} where an object was expected",
                json_kind(&other)
            )),
        }
    }

    async fn fetch_catalog(&self) -> Result<Option<Vec<ToolCatalogEntry>>> {
        let response = self
            .http
            .get(format!("{}/mcp/tools", self.base_url))
            .timeout(self.catalog_timeout)
            .send()
            .await
            .map_err(|e| describe_transport_error(e, self.catalog_timeout))?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("MCP server responded with status {}", status));
        }

        let listing = response
            .json::<Option<Vec<Value>>>()
            .await
            .context("MCP server sent an unreadable tool listing")?;
        Ok(listing.map(|raw| raw.into_iter().filter_map(parse_catalog_entry).collect()))
    }
}

#[async_trait]
impl ToolGateway for McpClient {
    async fn query(&self, text: &str, credential: Option<&str>) -> Result<Option<ToolResult>> {
        Ok(Some(self.execute_query(text, credential).await))
    }

    async fn list_tools(&self) -> Result<Vec<ToolCatalogEntry>> {
        Ok(self.available_tools().await)
    }
}

// One malformed entry must not cost us the rest of the listing
fn parse_catalog_entry(raw: Value) -> Option<ToolCatalogEntry> {
    match serde_json::from_value::<ToolCatalogEntry>(raw.clone()) {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!("Skipping unreadable MCP tool entry {}: {}", raw, e);
            None
        }
    }
}

fn describe_transport_error(e: reqwest::Error, timeout: Duration) -> anyhow::Error {
    if e.is_timeout() {
        anyhow!("request timed out after {} ms", timeout.as_millis())
    } else {
        anyhow::Error::new(e)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap as AxumHeaders, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use crate::intent::{KeywordSet, Operation};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn closed_port_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    fn client_for(base_url: String) -> McpClient {
        McpClient::new(&ToolServerSettings {
            base_url,
            query_timeout: Duration::from_millis(500),
            catalog_timeout: Duration::from_millis(500),
        })
        .unwrap()
    }

    fn assert_failure(result: &ToolResult) -> String {
        match result {
            ToolResult::Failure(f) => {
                assert!(f.error);
                assert_eq!(f.status, "failed");
                f.message.clone()
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_build_query_picks_operation() {
        let client = client_for("http://localhost:3000/".to_string());
        assert_eq!(client.base_url(), "http://localhost:3000");

        let query = client.build_query("Show me the repo for tokio");
        assert_eq!(query.method, "query");
        assert_eq!(query.query, "Show me the repo for tokio");
        assert_eq!(query.parameters.operation, Operation::Repository);
        assert_eq!(query.parameters.max_results, 10);
        assert!(query.parameters.analyze_intent);
    }

    #[test]
    fn test_custom_router_drives_operation() {
        let client = client_for("http://localhost:3000".to_string()).with_router(
            OperationRouter::github(
                KeywordSet::new(["project"]),
                KeywordSet::new(["bug"]),
                KeywordSet::new(["merge request"]),
            ),
        );
        assert_eq!(client.build_query("open bugs").parameters.operation, Operation::Issues);
        assert_eq!(client.build_query("show the repo").parameters.operation, Operation::General);
    }

    #[tokio::test]
    async fn test_query_returns_server_payload() {
        let seen: Arc<Mutex<Vec<(Value, Option<String>)>>> = Arc::default();
        let recorder = seen.clone();
        let app = Router::new().route(
            "/mcp/github",
            post(move |headers: AxumHeaders, Json(body): Json<Value>| {
                let recorder = recorder.clone();
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    recorder.lock().unwrap().push((body, auth));
                    Json(json!({
                        "repositories": ["spring-projects/spring-boot"],
                        "status": "success"
                    }))
                }
            }),
        );
        let client = client_for(spawn_server(app).await);

        let result = client.execute_query("open issues", Some("ghp_abc")).await;
        let ToolResult::Payload(payload) = &result else {
            panic!("expected payload, got {:?}", result);
        };
        assert_eq!(payload.status(), Some(&json!("success")));

        let seen = seen.lock().unwrap();
        let (body, auth) = &seen[0];
        assert_eq!(body["method"], "query");
        assert_eq!(body["parameters"]["operation"], "issues");
        assert_eq!(auth.as_deref(), Some("Bearer ghp_abc"));
    }

    #[tokio::test]
    async fn test_query_without_credential_sends_no_auth() {
        let seen: Arc<Mutex<Option<bool>>> = Arc::default();
        let recorder = seen.clone();
        let app = Router::new().route(
            "/mcp/github",
            post(move |headers: AxumHeaders| {
                let recorder = recorder.clone();
                async move {
                    *recorder.lock().unwrap() = Some(headers.contains_key("authorization"));
                    Json(json!({}))
                }
            }),
        );
        let client = client_for(spawn_server(app).await);

        let result = client.execute_query("github stars", Some("  ")).await;
        assert!(result.is_empty());
        assert_eq!(*seen.lock().unwrap(), Some(false));
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_error_value() {
        let client = client_for(closed_port_url().await);

        let result = client.execute_query("github repos", None).await;
        let message = assert_failure(&result);
        assert!(message.starts_with("Error communicating with MCP server"));
        assert_eq!(result.get("error"), Some(json!(true)));
    }

    #[tokio::test]
    async fn test_null_body_becomes_error_value() {
        let app = Router::new().route("/mcp/github", post(|| async { Json(Value::Null) }));
        let client = client_for(spawn_server(app).await);

        let message = assert_failure(&client.execute_query("github", None).await);
        assert_eq!(message, "MCP server returned empty response");
    }

    #[tokio::test]
    async fn test_error_status_becomes_error_value() {
        let app = Router::new().route(
            "/mcp/github",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let client = client_for(spawn_server(app).await);

        let message = assert_failure(&client.execute_query("github", None).await);
        assert!(message.contains("502"));
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let app = Router::new().route(
            "/mcp/github",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!({"status": "late"}))
            }),
        );
        let client = client_for(spawn_server(app).await);

        let message = assert_failure(&client.execute_query("github", None).await);
        assert!(message.contains("timed out"), "{}", message);
    }

    #[tokio::test]
    async fn test_trait_query_never_errs() {
        let client = client_for(closed_port_url().await);
        let gateway: &dyn ToolGateway = &client;

        let result = gateway.query("repo", None).await.unwrap();
        assert!(result.unwrap().is_failure());
    }

    #[tokio::test]
    async fn test_catalog_from_server() {
        let app = Router::new().route(
            "/mcp/tools",
            get(|| async {
                Json(json!([
                    {"name": "search_repositories", "description": "Search GitHub repositories"},
                    {"name": "get_issues", "description": "Get repository issues"}
                ]))
            }),
        );
        let client = client_for(spawn_server(app).await);

        let tools = client.available_tools().await;
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].name, "search_repositories");
        assert!(tools.iter().all(|t| t.available));
    }

    #[tokio::test]
    async fn test_catalog_skips_malformed_entries() {
        let app = Router::new().route(
            "/mcp/tools",
            get(|| async {
                Json(json!([
                    {"description": "no name here"},
                    "not even an object",
                    {"name": "get_issues", "description": "Get repository issues"}
                ]))
            }),
        );
        let client = client_for(spawn_server(app).await);

        let tools = client.available_tools().await;
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "get_issues");
        assert!(tools[0].available);
    }

    #[tokio::test]
    async fn test_catalog_with_only_malformed_entries_falls_back() {
        let app = Router::new()
            .route("/mcp/tools", get(|| async { Json(json!([{"description": "nameless"}])) }));
        let client = client_for(spawn_server(app).await);
        assert_eq!(client.available_tools().await, catalog::fallback_catalog());
    }

    #[tokio::test]
    async fn test_catalog_falls_back_when_empty_or_null() {
        let app = Router::new()
            .route("/mcp/tools", get(|| async { Json(json!([])) }));
        let client = client_for(spawn_server(app).await);
        assert_eq!(client.available_tools().await, catalog::fallback_catalog());

        let app = Router::new()
            .route("/mcp/tools", get(|| async { Json(Value::Null) }));
        let client = client_for(spawn_server(app).await);
        assert_eq!(client.available_tools().await, catalog::fallback_catalog());
    }

    #[tokio::test]
    async fn test_catalog_falls_back_when_unreachable() {
        let client = client_for(closed_port_url().await);
        let tools = client.list_tools().await.unwrap();
        assert_eq!(tools, catalog::fallback_catalog());
    }
}
