use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::intent::{KeywordSet, OperationRouter};

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_MCP_SERVER_URL: &str = "http://localhost:3000";
pub const DEFAULT_GATEWAY_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl LlmSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToolServerSettings {
    pub base_url: String,
    pub query_timeout: Duration,
    pub catalog_timeout: Duration,
}

impl Default for ToolServerSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MCP_SERVER_URL.to_string(),
            query_timeout: Duration::from_secs(30),
            catalog_timeout: Duration::from_secs(10),
        }
    }
}

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub llm: LlmSettings,
    pub tool_server: ToolServerSettings,
    pub intent_keywords: KeywordSet,
    pub operation_router: OperationRouter,
    pub gateway_addr: String,
    pub startup_check: bool,
}

impl Settings {
    /// Loads `.env` (if any) and then reads the environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("OPENAI_API_KEY").context("OPENAI_API_KEY must be set in .env")?;
        let mut llm = LlmSettings::new(api_key);
        llm.base_url = get("OPENAI_BASE_URL");
        if let Some(model) = get("OPENAI_MODEL") {
            llm.model = model;
        }
        if let Some(secs) = parse_opt::<u64>(&get, "LLM_TIMEOUT_SECS")? {
            llm.timeout = Duration::from_secs(secs);
        }

        let mut tool_server = ToolServerSettings::default();
        if let Some(url) = get("MCP_SERVER_URL") {
            tool_server.base_url = url;
        }
        if let Some(secs) = parse_opt::<u64>(&get, "MCP_QUERY_TIMEOUT_SECS")? {
            tool_server.query_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_opt::<u64>(&get, "MCP_CATALOG_TIMEOUT_SECS")? {
            tool_server.catalog_timeout = Duration::from_secs(secs);
        }

        let intent_keywords =
            keywords_or(&get, "INTENT_KEYWORDS", KeywordSet::github_intent)?;
        let operation_router = OperationRouter::github(
            keywords_or(
                &get,
                "OPERATION_REPOSITORY_KEYWORDS",
                OperationRouter::repository_keywords,
            )?,
            keywords_or(&get, "OPERATION_ISSUE_KEYWORDS", OperationRouter::issue_keywords)?,
            keywords_or(
                &get,
                "OPERATION_PULL_REQUEST_KEYWORDS",
                OperationRouter::pull_request_keywords,
            )?,
        );

        Ok(Self {
            llm,
            tool_server,
            intent_keywords,
            operation_router,
            gateway_addr: get("GATEWAY_ADDR").unwrap_or_else(|| DEFAULT_GATEWAY_ADDR.to_string()),
            startup_check: parse_opt::<bool>(&get, "LLM_STARTUP_CHECK")?.unwrap_or(false),
        })
    }
}

fn keywords_or(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: fn() -> KeywordSet,
) -> Result<KeywordSet> {
    match get(key) {
        Some(list) => {
            let keywords = KeywordSet::parse(&list);
            anyhow::ensure!(!keywords.is_empty(), "{} lists no keywords", key);
            Ok(keywords)
        }
        None => Ok(default()),
    }
}

fn parse_opt<T>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    get(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{} has an invalid value: '{}'", key, raw))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(settings.llm.model, "gpt-4");
        assert_eq!(settings.llm.temperature, 0.7);
        assert_eq!(settings.llm.max_tokens, 1000);
        assert_eq!(settings.llm.timeout, Duration::from_secs(60));
        assert!(settings.llm.base_url.is_none());
        assert_eq!(settings.tool_server.base_url, "http://localhost:3000");
        assert_eq!(settings.tool_server.query_timeout, Duration::from_secs(30));
        assert_eq!(settings.tool_server.catalog_timeout, Duration::from_secs(10));
        assert_eq!(settings.intent_keywords, KeywordSet::github_intent());
        assert_eq!(settings.operation_router, OperationRouter::default());
        assert_eq!(settings.gateway_addr, "0.0.0.0:8080");
        assert!(!settings.startup_check);
    }

    #[test]
    fn test_missing_api_key_fails() {
        let err = Settings::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("OPENAI_BASE_URL", "http://localhost:1234/v1"),
            ("LLM_TIMEOUT_SECS", "5"),
            ("MCP_SERVER_URL", "http://mcp:9000"),
            ("MCP_QUERY_TIMEOUT_SECS", "3"),
            ("INTENT_KEYWORDS", "gitlab, merge request"),
            ("LLM_STARTUP_CHECK", "true"),
        ]))
        .unwrap();
        assert_eq!(settings.llm.model, "gpt-4o-mini");
        assert_eq!(settings.llm.base_url.as_deref(), Some("http://localhost:1234/v1"));
        assert_eq!(settings.llm.timeout, Duration::from_secs(5));
        assert_eq!(settings.tool_server.base_url, "http://mcp:9000");
        assert_eq!(settings.tool_server.query_timeout, Duration::from_secs(3));
        assert_eq!(settings.intent_keywords.keywords(), ["gitlab", "merge request"]);
        assert!(settings.startup_check);
    }

    #[test]
    fn test_operation_keyword_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPERATION_ISSUE_KEYWORDS", "bug, ticket"),
        ]))
        .unwrap();
        let expected = OperationRouter::github(
            OperationRouter::repository_keywords(),
            KeywordSet::new(["bug", "ticket"]),
            OperationRouter::pull_request_keywords(),
        );
        assert_eq!(settings.operation_router, expected);
        assert_eq!(
            settings.operation_router.route("open tickets"),
            crate::intent::Operation::Issues
        );
    }

    #[test]
    fn test_malformed_number_is_an_error() {
        let err = Settings::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("LLM_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("LLM_TIMEOUT_SECS"));
    }

    #[test]
    fn test_empty_keyword_override_is_rejected() {
        let result = Settings::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("INTENT_KEYWORDS", " , ,"),
        ]));
        assert!(result.is_err());
    }
}
