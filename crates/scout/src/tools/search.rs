use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use super::{describe_transport_error, ToolExecutor, ToolInput, ToolResult, DEFAULT_TIMEOUT};
use crate::models::tool::Tool;

pub const NAME: &str = "search";

/// Number of results requested from the search backend
pub const MAX_RESULTS: usize = 3;

const ACTION: &str = "Search request";

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub host: String,
    pub api_key: String,
}

/// Web search through a backend that accepts `{keywords, max_results}`
pub struct SearchTool {
    client: Client,
    config: SearchConfig,
    timeout: Duration,
}

impl SearchTool {
    pub fn new(config: SearchConfig) -> Result<Self> {
        Self::with_timeout(config, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(config: SearchConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            config,
            timeout,
        })
    }

    /// Run one search. Every failure comes back as an error result echoing the query.
    pub async fn search(&self, query: &str) -> ToolResult {
        match self.post(query).await {
            Ok(results) => ToolResult::success(results),
            Err(error) => {
                warn!(query, %error, "search failed");
                ToolResult::failure_with(error, "query", query)
            }
        }
    }

    async fn post(&self, query: &str) -> Result<Value, String> {
        let url = format!("{}/v1/search/", self.config.host.trim_end_matches('/'));
        let payload = json!({
            "keywords": [query],
            "max_results": MAX_RESULTS,
        });
        debug!(%url, query, "sending search request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| describe_transport_error(ACTION, &e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("{} failed with HTTP status {}", ACTION, status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| describe_transport_error(ACTION, &e, self.timeout))
    }
}

#[async_trait]
impl ToolExecutor for SearchTool {
    fn schema(&self) -> Tool {
        Tool::new(
            NAME,
            "Search the web for up to date information. Use this when the question needs facts \
            you are unsure of or that may have changed recently.",
            json!({
                "type": "object",
                "required": ["query"],
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search keywords."
                    }
                }
            }),
        )
    }

    async fn execute(&self, input: ToolInput) -> ToolResult {
        match input {
            ToolInput::Search(args) => self.search(&args.query).await,
            other => ToolResult::failure(format!("{} cannot run {}", NAME, other.tool_name())),
        }
    }
}
