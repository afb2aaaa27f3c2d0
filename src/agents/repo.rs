use std::sync::Arc;

use crate::cli::RepoDepth;
use crate::llm::LlmClient;
use crate::prompts::REPO_ANALYST_INSTRUCTION;
use crate::scope::{ProposedAction, find_url};
use crate::tools::{RepoFetcher, RepoSummary};

use super::{AgentFailure, SubAgentResult, cap_payload, synthesize};

const MAX_PAYLOAD_CHARS: usize = 20_000;

/// GitHub repository analyst: fetches metadata, file listing, and README,
/// then synthesizes a structured analysis.
pub struct RepoAgent {
    model: Arc<dyn LlmClient>,
    fetcher: Arc<dyn RepoFetcher>,
}

impl RepoAgent {
    pub fn new(model: Arc<dyn LlmClient>, fetcher: Arc<dyn RepoFetcher>) -> Self {
        Self { model, fetcher }
    }

    /// Derive the scope from user text without touching the network. Returns
    /// `None` when no GitHub URL is present.
    pub fn propose_scope(text: &str, default_depth: RepoDepth) -> Option<ProposedAction> {
        let url = find_url(text)?;
        let host = url.host_str()?;
        if host != "github.com" && host != "www.github.com" {
            return None;
        }

        let lower = text.to_ascii_lowercase();
        let depth = if ["deep", "full", "thorough", "entire tree"]
            .iter()
            .any(|kw| lower.contains(kw))
        {
            RepoDepth::Full
        } else {
            default_depth
        };

        Some(ProposedAction::RepoAnalysis {
            url: url.to_string(),
            depth,
        })
    }

    pub async fn execute(
        &self,
        url: &str,
        depth: RepoDepth,
    ) -> Result<SubAgentResult, AgentFailure> {
        let summary = self.fetcher.fetch_repository(url, depth).await?;
        let source = format!("github.com/{}/{}", summary.owner, summary.repo);
        let payload = cap_payload(render_repo_payload(&summary), MAX_PAYLOAD_CHARS);
        let analysis = synthesize(&self.model, REPO_ANALYST_INSTRUCTION, payload).await?;

        Ok(SubAgentResult {
            agent: "repo_analysis",
            source,
            summary: analysis,
        })
    }
}

fn render_repo_payload(summary: &RepoSummary) -> String {
    let mut out = format!(
        "Repository: {}/{}\nDefault branch: {}\n",
        summary.owner, summary.repo, summary.default_branch
    );
    if let Some(description) = &summary.description {
        out.push_str(&format!("Description: {description}\n"));
    }
    if let Some(language) = &summary.language {
        out.push_str(&format!("Primary language: {language}\n"));
    }
    out.push_str("\nFiles:\n");
    for file in &summary.files {
        out.push_str("  ");
        out.push_str(file);
        out.push('\n');
    }
    if let Some(readme) = &summary.readme {
        out.push_str("\nREADME:\n");
        out.push_str(readme);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposes_scope_only_for_github_urls() {
        let action =
            RepoAgent::propose_scope("look at https://github.com/org/repo", RepoDepth::Shallow)
                .unwrap();
        assert!(matches!(
            action,
            ProposedAction::RepoAnalysis {
                depth: RepoDepth::Shallow,
                ..
            }
        ));

        assert!(
            RepoAgent::propose_scope("look at https://example.com/post", RepoDepth::Shallow)
                .is_none()
        );
        assert!(RepoAgent::propose_scope("no url here", RepoDepth::Shallow).is_none());
    }

    #[test]
    fn depth_hint_upgrades_to_full() {
        let action = RepoAgent::propose_scope(
            "do a deep analysis of github.com/org/repo",
            RepoDepth::Shallow,
        )
        .unwrap();
        assert!(matches!(
            action,
            ProposedAction::RepoAnalysis {
                depth: RepoDepth::Full,
                ..
            }
        ));
    }

    #[test]
    fn payload_includes_metadata_files_and_readme() {
        let summary = RepoSummary {
            owner: "org".to_string(),
            repo: "repo".to_string(),
            description: Some("A test repo".to_string()),
            default_branch: "main".to_string(),
            language: Some("Rust".to_string()),
            files: vec!["src/".to_string(), "Cargo.toml".to_string()],
            readme: Some("# Repo\nHello".to_string()),
        };
        let payload = render_repo_payload(&summary);
        assert!(payload.contains("Repository: org/repo"));
        assert!(payload.contains("A test repo"));
        assert!(payload.contains("  Cargo.toml"));
        assert!(payload.contains("# Repo"));
    }
}
