use async_trait::async_trait;

use crate::tools::{PageFetcher, PageSummary, ToolError, build_tool_http_client};

const MAX_MARKDOWN_CHARS: usize = 20_000;

/// Fetches a web page and converts its HTML to markdown for summarization.
pub struct HttpPageFetcher {
    http_client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self, ToolError> {
        Ok(Self {
            http_client: build_tool_http_client(timeout_secs)?,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<PageSummary, ToolError> {
        let parsed = url::Url::parse(url)
            .map_err(|e| ToolError::new("invalid_url", format!("'{url}' is not a URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ToolError::new(
                "invalid_url",
                format!("unsupported URL scheme '{}'", parsed.scheme()),
            ));
        }

        let response = self
            .http_client
            .get(parsed.clone())
            .send()
            .await
            .map_err(|e| ToolError::new("network", format!("page fetch failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::new(
                "http_status",
                format!("page fetch returned {status} for {url}"),
            ));
        }

        let html = response
            .text()
            .await
            .map_err(|e| ToolError::new("network", format!("failed to read page body: {e}")))?;

        let title = extract_title(&html);
        let markdown = htmd::convert(&html)
            .map_err(|e| ToolError::new("parse", format!("HTML conversion failed: {e}")))?;
        let content_chars = markdown.chars().count();

        Ok(PageSummary {
            url: parsed.to_string(),
            title,
            markdown: truncate_markdown(markdown, MAX_MARKDOWN_CHARS),
            content_chars,
        })
    }
}

/// Pull the `<title>` text out of raw HTML, if present.
pub fn extract_title(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let open = lower.find("<title")?;
    let open_end = lower[open..].find('>')? + open + 1;
    let close = lower[open_end..].find("</title>")? + open_end;
    let title = html[open_end..close].trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

fn truncate_markdown(markdown: String, max_chars: usize) -> String {
    if markdown.chars().count() <= max_chars {
        return markdown;
    }
    let mut out: String = markdown.chars().take(max_chars).collect();
    out.push_str("\n... [content truncated]");
    out
}
