use async_trait::async_trait;
use serde_json::{Value, json};

use crate::tools::{ResearchSummary, SearchHit, ToolError, TopicSearcher, build_tool_http_client};

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";
const MAX_SNIPPET_CHARS: usize = 1_200;

/// Web research backed by the Tavily search API. The key is read per call so
/// the rest of the assistant works without one until research is requested.
pub struct TavilySearcher {
    http_client: reqwest::Client,
}

impl TavilySearcher {
    pub fn new(timeout_secs: u64) -> Result<Self, ToolError> {
        Ok(Self {
            http_client: build_tool_http_client(timeout_secs)?,
        })
    }

    fn api_key() -> Result<String, ToolError> {
        std::env::var("TAVILY_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                ToolError::new(
                    "auth_required",
                    "TAVILY_API_KEY is required for topic research",
                )
            })
    }
}

#[async_trait]
impl TopicSearcher for TavilySearcher {
    async fn search_topic(
        &self,
        query: &str,
        breadth: usize,
    ) -> Result<ResearchSummary, ToolError> {
        let body = build_search_body(&Self::api_key()?, query, breadth);

        let response = self
            .http_client
            .post(TAVILY_SEARCH_URL)
            .json(&body)
            .send()
            .await
            .map_err(|e| ToolError::new("network", format!("search request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ToolError::new(
                "auth_required",
                "search API rejected the API key. Check TAVILY_API_KEY.",
            ));
        }
        if !status.is_success() {
            return Err(ToolError::new(
                "http_status",
                format!("search API error {status}"),
            ));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ToolError::new("parse", format!("invalid search response: {e}")))?;

        Ok(parse_search_response(query, &payload))
    }
}

fn build_search_body(api_key: &str, query: &str, breadth: usize) -> Value {
    json!({
        "api_key": api_key,
        "query": query,
        "max_results": breadth.clamp(1, 10),
        "include_answer": true,
    })
}

fn parse_search_response(query: &str, payload: &Value) -> ResearchSummary {
    let answer = payload
        .get("answer")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string);

    let results = payload
        .get("results")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let url = item.get("url").and_then(Value::as_str)?;
                    let mut snippet = item
                        .get("content")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    if snippet.chars().count() > MAX_SNIPPET_CHARS {
                        snippet = snippet.chars().take(MAX_SNIPPET_CHARS).collect();
                    }
                    Some(SearchHit {
                        title: item
                            .get("title")
                            .and_then(Value::as_str)
                            .unwrap_or(url)
                            .to_string(),
                        url: url.to_string(),
                        snippet,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    ResearchSummary {
        query: query.to_string(),
        answer,
        results,
    }
}
