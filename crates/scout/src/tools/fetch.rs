use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use scraper::{Html, Node};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use super::{describe_transport_error, ToolExecutor, ToolInput, ToolResult, DEFAULT_TIMEOUT};
use crate::models::tool::Tool;

pub const NAME: &str = "fetch_page";

/// Maximum number of characters of page text handed to the model
pub const MAX_TEXT_CHARS: usize = 5000;

pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// Bytes of page body read before the rest is dropped
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

const ACTION: &str = "Page request";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Elements whose text never reaches the model
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "nav", "header", "footer", "noscript"];

/// Downloads a page and reduces it to its readable text
pub struct PageFetcher {
    client: Client,
    timeout: Duration,
}

impl PageFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, timeout })
    }

    /// Fetch `url` and return `{url, text, length}`, or an error result echoing the url
    pub async fn fetch_page(&self, url: &str) -> ToolResult {
        match self.get(url).await {
            Ok(html) => {
                let text = extract_text(&html);
                let length = text.chars().count();
                ToolResult::success(json!({
                    "url": url,
                    "text": truncate(text, MAX_TEXT_CHARS),
                    "length": length,
                }))
            }
            Err(error) => {
                warn!(url, %error, "page fetch failed");
                ToolResult::failure_with(error, "url", url)
            }
        }
    }

    async fn get(&self, url: &str) -> Result<String, String> {
        debug!(url, "fetching page");
        let mut response = self
            .client
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await
            .map_err(|e| describe_transport_error(ACTION, &e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("{} failed with HTTP status {}", ACTION, status.as_u16()));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| describe_transport_error(ACTION, &e, self.timeout))?
        {
            let room = MAX_BODY_BYTES - body.len();
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                debug!(url, limit = MAX_BODY_BYTES, "page body capped");
                break;
            }
            body.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[async_trait]
impl ToolExecutor for PageFetcher {
    fn schema(&self) -> Tool {
        Tool::new(
            NAME,
            "Fetch a web page and return its readable text. Use this to read a result found by \
            search or a link given by the user.",
            json!({
                "type": "object",
                "required": ["url"],
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "Full address of the page, starting with http:// or https://"
                    }
                }
            }),
        )
    }

    async fn execute(&self, input: ToolInput) -> ToolResult {
        match input {
            ToolInput::FetchPage(args) => self.fetch_page(&args.url).await,
            other => ToolResult::failure(format!("{} cannot run {}", NAME, other.tool_name())),
        }
    }
}

/// Collect the visible text of an HTML document as a single whitespace normalized line
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut words: Vec<&str> = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let skipped = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| SKIPPED_ELEMENTS.contains(&element.name()))
        });
        if !skipped {
            words.extend(text.split_whitespace());
        }
    }

    words.join(" ")
}

/// Cut `text` to `max_chars` characters, appending the truncation marker when anything was cut
pub fn truncate(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => {
            let mut truncated = text[..byte_index].to_string();
            truncated.push_str(TRUNCATION_MARKER);
            truncated
        }
        None => text,
    }
}
