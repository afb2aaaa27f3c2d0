use std::sync::Arc;

use crate::llm::LlmClient;
use crate::prompts::TOPIC_RESEARCHER_INSTRUCTION;
use crate::scope::ProposedAction;
use crate::tools::{ResearchSummary, TopicSearcher};

use super::{AgentFailure, SubAgentResult, cap_payload, synthesize};

const MAX_PAYLOAD_CHARS: usize = 22_000;

/// Topic researcher: runs a web search and synthesizes a sourced overview.
pub struct ResearchAgent {
    model: Arc<dyn LlmClient>,
    searcher: Arc<dyn TopicSearcher>,
}

impl ResearchAgent {
    pub fn new(model: Arc<dyn LlmClient>, searcher: Arc<dyn TopicSearcher>) -> Self {
        Self { model, searcher }
    }

    pub fn propose_scope(text: &str, default_breadth: usize) -> Option<ProposedAction> {
        let query = extract_query(text);
        if query.is_empty() {
            return None;
        }
        Some(ProposedAction::TopicResearch {
            query,
            breadth: default_breadth,
        })
    }

    pub async fn execute(
        &self,
        query: &str,
        breadth: usize,
    ) -> Result<SubAgentResult, AgentFailure> {
        let research = self.searcher.search_topic(query, breadth).await?;
        let payload = cap_payload(render_research_payload(&research), MAX_PAYLOAD_CHARS);
        let overview = synthesize(&self.model, TOPIC_RESEARCHER_INSTRUCTION, payload).await?;

        Ok(SubAgentResult {
            agent: "topic_research",
            source: format!("web search: {query}"),
            summary: overview,
        })
    }
}

/// Strip routing verbiage so the search query is the topic itself.
pub fn extract_query(text: &str) -> String {
    let trimmed = text.trim();
    let lower = trimmed.to_ascii_lowercase();
    for prefix in [
        "research the topic",
        "research about",
        "research",
        "learn about",
        "find out about",
        "investigate",
        "what is",
        "tell me about",
    ] {
        if lower.starts_with(prefix) {
            return trimmed[prefix.len()..]
                .trim()
                .trim_end_matches(['?', '.', '!'])
                .to_string();
        }
    }
    trimmed.trim_end_matches(['?', '.', '!']).to_string()
}

fn render_research_payload(research: &ResearchSummary) -> String {
    let mut out = format!("Query: {}\n", research.query);
    if let Some(answer) = &research.answer {
        out.push_str(&format!("\nSearch engine answer:\n{answer}\n"));
    }
    out.push_str(&format!("\nResults ({}):\n", research.results.len()));
    for (index, hit) in research.results.iter().enumerate() {
        out.push_str(&format!(
            "\n[{}] {}\n{}\n{}\n",
            index + 1,
            hit.title,
            hit.url,
            hit.snippet
        ));
    }
    out
}
