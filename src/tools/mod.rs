pub mod page_fetch;
pub mod repo_fetch;
pub mod topic_search;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cli::RepoDepth;

pub const REPO_FETCH_TOOL_NAME: &str = "fetch_repository";
pub const PAGE_FETCH_TOOL_NAME: &str = "fetch_page";
pub const TOPIC_SEARCH_TOOL_NAME: &str = "search_topic";
pub const DRAFT_WRITE_TOOL_NAME: &str = "write_draft";

/// Typed capability failure. Codes: `invalid_url`, `http_status`, `network`,
/// `parse`, `auth_required`, `io_error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolError {
    pub code: &'static str,
    pub message: String,
}

impl ToolError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ToolError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoSummary {
    pub owner: String,
    pub repo: String,
    pub description: Option<String>,
    pub default_branch: String,
    pub language: Option<String>,
    pub files: Vec<String>,
    pub readme: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSummary {
    pub url: String,
    pub title: Option<String>,
    pub markdown: String,
    pub content_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchSummary {
    pub query: String,
    pub answer: Option<String>,
    pub results: Vec<SearchHit>,
}

#[async_trait]
pub trait RepoFetcher: Send + Sync {
    async fn fetch_repository(&self, url: &str, depth: RepoDepth)
    -> Result<RepoSummary, ToolError>;
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<PageSummary, ToolError>;
}

#[async_trait]
pub trait TopicSearcher: Send + Sync {
    async fn search_topic(&self, query: &str, breadth: usize)
    -> Result<ResearchSummary, ToolError>;
}

pub(crate) fn build_tool_http_client(timeout_secs: u64) -> Result<reqwest::Client, ToolError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs.max(1)))
        .user_agent(concat!("knowflow-cli/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ToolError::new("network", format!("failed to build HTTP client: {e}")))
}
