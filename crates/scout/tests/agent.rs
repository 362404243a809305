use anyhow::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use scout::agent::{Agent, AgentConfig, ChatReply};
use scout::providers::configs::OpenAiProviderConfig;
use scout::providers::openai::OpenAiProvider;
use scout::registry::ToolRegistry;
use scout::tools::{PageFetcher, SearchConfig, SearchTool};

fn completion(message: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{"index": 0, "message": message, "finish_reason": "stop"}],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    }))
}

fn tool_call(id: &str, name: &str, arguments: Value) -> ResponseTemplate {
    completion(json!({
        "role": "assistant",
        "content": null,
        "tool_calls": [{
            "id": id,
            "type": "function",
            "function": {"name": name, "arguments": arguments.to_string()}
        }]
    }))
}

/// Parsed content of the first tool message in a chat completion request, if any
fn first_tool_result(request: &Request) -> Option<Value> {
    let body: Value = serde_json::from_slice(&request.body).unwrap();
    body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["role"] == "tool")
        .map(|m| serde_json::from_str(m["content"].as_str().unwrap()).unwrap())
}

struct Harness {
    model: MockServer,
    search: MockServer,
    agent: Agent,
}

impl Harness {
    async fn start(search_timeout: Duration) -> Result<Self> {
        let model = MockServer::start().await;
        let search = MockServer::start().await;

        let provider = OpenAiProvider::new(OpenAiProviderConfig {
            host: model.uri(),
            ..OpenAiProviderConfig::new("test_api_key")
        })?;
        let search_tool = SearchTool::with_timeout(
            SearchConfig {
                host: search.uri(),
                api_key: "test_api_key".to_string(),
            },
            search_timeout,
        )?;
        let registry = ToolRegistry::standard(search_tool, PageFetcher::new()?)?;
        let agent = Agent::new(
            Box::new(provider),
            Arc::new(registry),
            AgentConfig::default(),
        );

        Ok(Self {
            model,
            search,
            agent,
        })
    }
}

#[tokio::test]
async fn test_direct_answer_takes_one_model_call() -> Result<()> {
    let harness = Harness::start(Duration::from_secs(30)).await?;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion(json!({"role": "assistant", "content": "4"})))
        .expect(1)
        .mount(&harness.model)
        .await;

    let reply = harness.agent.reply("What is 2+2?").await?;

    assert_eq!(reply, ChatReply::new("4"));
    Ok(())
}

#[tokio::test]
async fn test_search_round_trip() -> Result<()> {
    let harness = Harness::start(Duration::from_secs(30)).await?;
    Mock::given(method("POST"))
        .and(path("/v1/search/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"title": "Rust 1.85", "snippet": "Rust 2024 edition is stable"}]
        })))
        .expect(1)
        .mount(&harness.search)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(|request: &Request| {
            match first_tool_result(request) {
                None => tool_call("call_1", "search", json!({"query": "rust 2024 edition"})),
                Some(content) => {
                    let title = content["results"][0]["title"].as_str().unwrap();
                    let answer = format!("It shipped in {}.", title);
                    completion(json!({"role": "assistant", "content": answer}))
                }
            }
        })
        .expect(2)
        .mount(&harness.model)
        .await;

    let reply = harness.agent.reply("When did the 2024 edition ship?").await?;

    assert_eq!(reply.content, "It shipped in Rust 1.85.");
    assert_eq!(reply.tool_calls, None);
    Ok(())
}

#[tokio::test]
async fn test_fetch_page_round_trip() -> Result<()> {
    let harness = Harness::start(Duration::from_secs(30)).await?;
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body><nav>Menu</nav><p>Ferris is the unofficial mascot.</p></body></html>",
        ))
        .mount(&site)
        .await;

    let url = format!("{}/about", site.uri());
    let requested = url.clone();
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(move |request: &Request| {
            match first_tool_result(request) {
                None => tool_call("call_1", "fetch_page", json!({"url": requested})),
                Some(content) => {
                    completion(json!({"role": "assistant", "content": content["text"]}))
                }
            }
        })
        .expect(2)
        .mount(&harness.model)
        .await;

    let reply = harness.agent.reply(&format!("What does {} say?", url)).await?;

    assert_eq!(reply.content, "Ferris is the unofficial mascot.");
    Ok(())
}

#[tokio::test]
async fn test_search_timeout_is_reported_to_model() -> Result<()> {
    let harness = Harness::start(Duration::from_secs(1)).await?;
    Mock::given(method("POST"))
        .and(path("/v1/search/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"results": []}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&harness.search)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(|request: &Request| {
            match first_tool_result(request) {
                None => tool_call("call_1", "search", json!({"query": "slow"})),
                Some(content) => {
                    let error = content["error"].as_str().unwrap_or_default();
                    let answer = if error.contains("timed out") && content["query"] == "slow" {
                        "The search timed out."
                    } else {
                        "Unexpected tool result."
                    };
                    completion(json!({"role": "assistant", "content": answer}))
                }
            }
        })
        .expect(2)
        .mount(&harness.model)
        .await;

    let reply = harness.agent.reply("Search for something slow").await?;

    assert_eq!(reply.content, "The search timed out.");
    Ok(())
}

#[tokio::test]
async fn test_model_failure_surfaces_as_error() -> Result<()> {
    let harness = Harness::start(Duration::from_secs(30)).await?;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&harness.model)
        .await;

    let result = harness.agent.reply("Hi").await;

    assert!(result.is_err());
    Ok(())
}
