use std::sync::Arc;

use crate::llm::LlmClient;
use crate::prompts::BLOG_ANALYST_INSTRUCTION;
use crate::scope::{ProposedAction, find_url};
use crate::tools::{PageFetcher, PageSummary};

use super::{AgentFailure, SubAgentResult, cap_payload, synthesize};

const MAX_PAYLOAD_CHARS: usize = 22_000;

/// Blog content analyst: fetches a page, converts it to markdown, and
/// synthesizes a structured summary.
pub struct BlogAgent {
    model: Arc<dyn LlmClient>,
    fetcher: Arc<dyn PageFetcher>,
}

impl BlogAgent {
    pub fn new(model: Arc<dyn LlmClient>, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { model, fetcher }
    }

    pub fn propose_scope(text: &str) -> Option<ProposedAction> {
        let url = find_url(text)?;
        Some(ProposedAction::BlogSummary {
            url: url.to_string(),
        })
    }

    pub async fn execute(&self, url: &str) -> Result<SubAgentResult, AgentFailure> {
        let page = self.fetcher.fetch_page(url).await?;
        let payload = cap_payload(render_page_payload(&page), MAX_PAYLOAD_CHARS);
        let summary = synthesize(&self.model, BLOG_ANALYST_INSTRUCTION, payload).await?;

        Ok(SubAgentResult {
            agent: "blog_summary",
            source: page.url,
            summary,
        })
    }
}

fn render_page_payload(page: &PageSummary) -> String {
    let mut out = format!("URL: {}\n", page.url);
    if let Some(title) = &page.title {
        out.push_str(&format!("Title: {title}\n"));
    }
    out.push_str(&format!(
        "Content length: {} characters\n\nContent:\n{}",
        page.content_chars, page.markdown
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposes_scope_for_any_url() {
        let action = BlogAgent::propose_scope("summarize https://example.com/post").unwrap();
        assert_eq!(
            action,
            ProposedAction::BlogSummary {
                url: "https://example.com/post".to_string()
            }
        );
        assert!(BlogAgent::propose_scope("no url").is_none());
    }

    #[test]
    fn payload_carries_title_and_content() {
        let page = PageSummary {
            url: "https://example.com/post".to_string(),
            title: Some("A Post".to_string()),
            markdown: "# A Post\nBody".to_string(),
            content_chars: 13,
        };
        let payload = render_page_payload(&page);
        assert!(payload.contains("Title: A Post"));
        assert!(payload.contains("# A Post"));
    }
}
