use async_trait::async_trait;
use serde_json::Value;

use crate::cli::RepoDepth;
use crate::tools::{RepoFetcher, RepoSummary, ToolError, build_tool_http_client};

const GITHUB_API_BASE: &str = "https://api.github.com";
const MAX_LISTED_FILES: usize = 400;
const MAX_README_CHARS: usize = 12_000;

/// Fetches repository metadata, file listing, and README through the GitHub
/// REST API. Shallow depth lists top-level contents; full depth walks the
/// recursive git tree of the default branch.
pub struct GitHubRepoFetcher {
    http_client: reqwest::Client,
    token: Option<String>,
}

impl GitHubRepoFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self, ToolError> {
        let token = ["GH_TOKEN", "GITHUB_TOKEN"]
            .iter()
            .find_map(|key| std::env::var(key).ok())
            .filter(|value| !value.trim().is_empty());

        Ok(Self {
            http_client: build_tool_http_client(timeout_secs)?,
            token,
        })
    }

    async fn get_json(&self, path: &str) -> Result<Value, ToolError> {
        let url = format!("{GITHUB_API_BASE}{path}");
        let mut request = self
            .http_client
            .get(&url)
            .header("accept", "application/vnd.github+json");
        if let Some(token) = self.token.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ToolError::new("network", format!("GitHub request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ToolError::new(
                "http_status",
                format!("repository resource not found (404): {url}"),
            ));
        }
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(ToolError::new(
                "auth_required",
                "GitHub API rate limit or auth failure. Set GITHUB_TOKEN and retry.",
            ));
        }
        if !status.is_success() {
            return Err(ToolError::new(
                "http_status",
                format!("GitHub API error {status} for {url}"),
            ));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ToolError::new("parse", format!("invalid GitHub API response: {e}")))
    }

    async fn fetch_readme(&self, owner: &str, repo: &str) -> Option<String> {
        let url = format!("{GITHUB_API_BASE}/repos/{owner}/{repo}/readme");
        let mut request = self
            .http_client
            .get(&url)
            .header("accept", "application/vnd.github.raw+json");
        if let Some(token) = self.token.as_deref() {
            request = request.bearer_auth(token);
        }

        // README is best-effort; its absence is not a tool failure.
        let response = request.send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let mut text = response.text().await.ok()?;
        if text.len() > MAX_README_CHARS {
            text.truncate(MAX_README_CHARS);
            text.push_str("\n... [README truncated]");
        }
        Some(text)
    }
}

#[async_trait]
impl RepoFetcher for GitHubRepoFetcher {
    async fn fetch_repository(
        &self,
        url: &str,
        depth: RepoDepth,
    ) -> Result<RepoSummary, ToolError> {
        let (owner, repo) = parse_repo_url(url)?;

        let metadata = self.get_json(&format!("/repos/{owner}/{repo}")).await?;
        let default_branch = metadata
            .get("default_branch")
            .and_then(Value::as_str)
            .unwrap_or("main")
            .to_string();

        let files = match depth {
            RepoDepth::Shallow => {
                let contents = self
                    .get_json(&format!("/repos/{owner}/{repo}/contents"))
                    .await?;
                list_contents(&contents)
            }
            RepoDepth::Full => {
                let tree = self
                    .get_json(&format!(
                        "/repos/{owner}/{repo}/git/trees/{default_branch}?recursive=1"
                    ))
                    .await?;
                list_tree(&tree)
            }
        };

        let readme = self.fetch_readme(&owner, &repo).await;

        Ok(RepoSummary {
            owner,
            repo,
            description: metadata
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            default_branch,
            language: metadata
                .get("language")
                .and_then(Value::as_str)
                .map(str::to_string),
            files,
            readme,
        })
    }
}

/// Pull `owner/repo` out of a GitHub URL or a bare `github.com/owner/repo`
/// token. Trailing slashes and a `.git` suffix are tolerated.
pub fn parse_repo_url(url: &str) -> Result<(String, String), ToolError> {
    let trimmed = url
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.");

    let rest = trimmed.strip_prefix("github.com/").ok_or_else(|| {
        ToolError::new(
            "invalid_url",
            format!("'{url}' is not a GitHub repository URL"),
        )
    })?;

    let mut parts = rest.trim_end_matches('/').splitn(3, '/');
    let owner = parts.next().unwrap_or_default();
    let repo = parts
        .next()
        .unwrap_or_default()
        .trim_end_matches(".git");

    if owner.is_empty() || repo.is_empty() {
        return Err(ToolError::new(
            "invalid_url",
            format!("'{url}' is missing the owner or repository segment"),
        ));
    }

    Ok((owner.to_string(), repo.to_string()))
}

fn list_contents(contents: &Value) -> Vec<String> {
    contents
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let name = item.get("name").and_then(Value::as_str)?;
                    match item.get("type").and_then(Value::as_str) {
                        Some("dir") => Some(format!("{name}/")),
                        _ => Some(name.to_string()),
                    }
                })
                .take(MAX_LISTED_FILES)
                .collect()
        })
        .unwrap_or_default()
}

fn list_tree(tree: &Value) -> Vec<String> {
    tree.get("tree")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let path = item.get("path").and_then(Value::as_str)?;
                    match item.get("type").and_then(Value::as_str) {
                        Some("tree") => Some(format!("{path}/")),
                        _ => Some(path.to_string()),
                    }
                })
                .take(MAX_LISTED_FILES)
                .collect()
        })
        .unwrap_or_default()
}
