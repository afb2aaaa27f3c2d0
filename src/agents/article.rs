use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use crate::llm::LlmClient;
use crate::prompts::ARTICLE_WRITER_INSTRUCTION;
use crate::scope::ProposedAction;
use crate::tools::ToolError;

use super::{AgentFailure, SubAgentResult, synthesize};

/// Article writer: drafts markdown from the session's gathered material and
/// writes it to the local drafts directory. Writing a file is the one local
/// side effect in the system, so it goes through the same scope gate as the
/// network tools.
pub struct ArticleAgent {
    model: Arc<dyn LlmClient>,
}

impl ArticleAgent {
    pub fn new(model: Arc<dyn LlmClient>) -> Self {
        Self { model }
    }

    pub fn propose_scope(text: &str, drafts_dir: &str) -> Option<ProposedAction> {
        let topic = extract_topic(text);
        if topic.is_empty() {
            return None;
        }
        let filename = format!("{}-{}.md", Utc::now().format("%Y-%m-%d"), slugify(&topic));
        let path = Path::new(drafts_dir)
            .join(filename)
            .to_string_lossy()
            .into_owned();
        Some(ProposedAction::ArticleDraft { topic, path })
    }

    pub async fn execute(
        &self,
        topic: &str,
        path: &str,
        gathered_digest: &str,
    ) -> Result<SubAgentResult, AgentFailure> {
        let payload = format!("Topic: {topic}\n\nGathered material:\n{gathered_digest}");
        let draft = synthesize(&self.model, ARTICLE_WRITER_INSTRUCTION, payload).await?;

        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                ToolError::new("io_error", format!("cannot create drafts directory: {e}"))
            })?;
        }
        std::fs::write(path, &draft)
            .map_err(|e| ToolError::new("io_error", format!("cannot write draft to {path}: {e}")))?;

        Ok(SubAgentResult {
            agent: "article_draft",
            source: path.to_string(),
            summary: format!("Draft written to {path}.\n\n{draft}"),
        })
    }
}

/// Strip drafting verbiage so the topic is what remains.
pub fn extract_topic(text: &str) -> String {
    let trimmed = text.trim();
    let lower = trimmed.to_ascii_lowercase();
    for prefix in [
        "draft an article about",
        "draft an article on",
        "draft an article",
        "write an article about",
        "write an article on",
        "write an article",
        "draft a post about",
        "draft a post on",
        "draft a post",
        "write a post about",
        "write a post on",
        "write a post",
    ] {
        if lower.starts_with(prefix) {
            let rest = trimmed[prefix.len()..]
                .trim()
                .trim_end_matches(['?', '.', '!']);
            if rest.is_empty() {
                return "this session's findings".to_string();
            }
            return rest.to_string();
        }
    }
    trimmed.trim_end_matches(['?', '.', '!']).to_string()
}

pub fn slugify(topic: &str) -> String {
    let mut slug = String::new();
    for c in topic.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if (c.is_whitespace() || c == '-' || c == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "draft".to_string()
    } else {
        slug.chars().take(60).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_extraction_strips_drafting_verbiage() {
        assert_eq!(
            extract_topic("draft an article about async Rust"),
            "async Rust"
        );
        assert_eq!(extract_topic("write a post on io_uring."), "io_uring");
        assert_eq!(
            extract_topic("draft an article"),
            "this session's findings"
        );
    }

    #[test]
    fn slugs_are_filesystem_safe() {
        assert_eq!(slugify("Async Rust: a tour!"), "async-rust-a-tour");
        assert_eq!(slugify("   "), "draft");
        assert_eq!(slugify("a_b-c  d"), "a-b-c-d");
    }

    #[test]
    fn proposed_path_lands_in_drafts_dir() {
        let action =
            ArticleAgent::propose_scope("draft an article about tokio", ".knowflow/drafts")
                .unwrap();
        match action {
            ProposedAction::ArticleDraft { topic, path } => {
                assert_eq!(topic, "tokio");
                assert!(path.starts_with(".knowflow/drafts"));
                assert!(path.ends_with("-tokio.md"));
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }
}
