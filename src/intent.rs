//! Intent classification seam. The orchestrator works against the trait so
//! the routing layer can run on rules, an LLM, or a test stub.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::llm::{LlmClient, LlmRequest};
use crate::prompts::{CLASSIFIER_INSTRUCTION, ORCHESTRATOR_INSTRUCTION};
use crate::scope::find_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    RepoAnalysis,
    BlogSummary,
    TopicResearch,
    ArticleDraft,
    Unknown,
}

impl Intent {
    pub fn label(&self) -> &'static str {
        match self {
            Intent::RepoAnalysis => "repo_analysis",
            Intent::BlogSummary => "blog_summary",
            Intent::TopicResearch => "topic_research",
            Intent::ArticleDraft => "article_draft",
            Intent::Unknown => "unknown",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "repo_analysis" => Some(Intent::RepoAnalysis),
            "blog_summary" => Some(Intent::BlogSummary),
            "topic_research" => Some(Intent::TopicResearch),
            "article_draft" => Some(Intent::ArticleDraft),
            "unknown" => Some(Intent::Unknown),
            _ => None,
        }
    }
}

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Intent>;
}

/// Deterministic classifier. URLs dominate: a GitHub URL is always repo
/// analysis and any other URL is a page to summarize; keywords decide the
/// rest.
pub struct RuleClassifier;

#[async_trait]
impl IntentClassifier for RuleClassifier {
    async fn classify(&self, text: &str) -> Result<Intent> {
        if let Some(url) = find_url(text) {
            if url.host_str() == Some("github.com") || url.host_str() == Some("www.github.com") {
                return Ok(Intent::RepoAnalysis);
            }
            return Ok(Intent::BlogSummary);
        }

        let lower = text.to_ascii_lowercase();
        if ["draft an article", "write an article", "write a post", "draft a post"]
            .iter()
            .any(|kw| lower.contains(kw))
        {
            return Ok(Intent::ArticleDraft);
        }
        if ["research", "learn about", "find out about", "what is", "compare", "investigate"]
            .iter()
            .any(|kw| lower.contains(kw))
        {
            return Ok(Intent::TopicResearch);
        }

        Ok(Intent::Unknown)
    }
}

/// LLM-backed classifier. The routing system prompt is sent as context ahead
/// of the classification instruction. An unparseable label degrades to
/// `Unknown`; backend failures propagate so the caller can surface them.
pub struct LlmClassifier {
    model: Arc<dyn LlmClient>,
}

impl LlmClassifier {
    pub fn new(model: Arc<dyn LlmClient>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl IntentClassifier for LlmClassifier {
    async fn classify(&self, text: &str) -> Result<Intent> {
        let instruction = format!("{ORCHESTRATOR_INSTRUCTION}\n\n{CLASSIFIER_INSTRUCTION}");
        let response = self
            .model
            .complete(LlmRequest::single(instruction, text))
            .await?;
        Ok(Intent::from_label(&response.content).unwrap_or(Intent::Unknown))
    }
}
