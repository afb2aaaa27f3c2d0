//! Routing core. Each user turn either answers a pending scope confirmation
//! or classifies a fresh request, proposes a bounded action, and waits. No
//! tool runs and no file is written before the user approves the proposal.

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use crate::agents::article::ArticleAgent;
use crate::agents::blog::BlogAgent;
use crate::agents::repo::RepoAgent;
use crate::agents::research::ResearchAgent;
use crate::agents::{AgentFailure, SubAgentResult};
use crate::cli::RepoDepth;
use crate::config::RuntimeConfig;
use crate::intent::{Intent, IntentClassifier, LlmClassifier};
use crate::llm::LlmClient;
use crate::scope::{ProposedAction, ScopeRequest, Verdict, parse_verdict};
use crate::session::{ScopeDecision, Session};
use crate::telemetry::TelemetrySink;
use crate::tools::{
    DRAFT_WRITE_TOOL_NAME, PAGE_FETCH_TOOL_NAME, REPO_FETCH_TOOL_NAME, TOPIC_SEARCH_TOOL_NAME,
};
use crate::tools::page_fetch::HttpPageFetcher;
use crate::tools::repo_fetch::GitHubRepoFetcher;
use crate::tools::topic_search::TavilySearcher;

const CLARIFICATION: &str = "\
I can help with a few things:
- analyze a GitHub repository (give me its URL)
- summarize a blog post or web page (give me its URL)
- research a technical topic on the web
- draft an article from what we've gathered this session

What would you like to do?";

pub struct Orchestrator {
    classifier: Arc<dyn IntentClassifier>,
    repo_agent: RepoAgent,
    blog_agent: BlogAgent,
    research_agent: ResearchAgent,
    article_agent: ArticleAgent,
    session: Session,
    telemetry: TelemetrySink,
    pending: Option<ScopeRequest>,
    default_depth: RepoDepth,
    default_breadth: usize,
    drafts_dir: String,
    max_prompt_chars: usize,
}

impl Orchestrator {
    /// Wire the production classifier, tools, and agents from the resolved
    /// configuration. Missing tool credentials surface when the matching
    /// action executes, not at startup.
    pub fn from_config(
        cfg: &RuntimeConfig,
        model: Arc<dyn LlmClient>,
        telemetry: TelemetrySink,
    ) -> Result<Self> {
        let repo_fetcher = Arc::new(GitHubRepoFetcher::new(cfg.tool_timeout_secs)?);
        let page_fetcher = Arc::new(HttpPageFetcher::new(cfg.tool_timeout_secs)?);
        let searcher = Arc::new(TavilySearcher::new(cfg.tool_timeout_secs)?);

        Ok(Self::new(
            Arc::new(LlmClassifier::new(model.clone())),
            RepoAgent::new(model.clone(), repo_fetcher),
            BlogAgent::new(model.clone(), page_fetcher),
            ResearchAgent::new(model.clone(), searcher),
            ArticleAgent::new(model),
            Session::new(&cfg.session_id),
            telemetry,
            cfg,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        repo_agent: RepoAgent,
        blog_agent: BlogAgent,
        research_agent: ResearchAgent,
        article_agent: ArticleAgent,
        session: Session,
        telemetry: TelemetrySink,
        cfg: &RuntimeConfig,
    ) -> Self {
        Self {
            classifier,
            repo_agent,
            blog_agent,
            research_agent,
            article_agent,
            session,
            telemetry,
            pending: None,
            default_depth: cfg.repo_depth,
            default_breadth: cfg.search_breadth,
            drafts_dir: cfg.drafts_dir.clone(),
            max_prompt_chars: cfg.max_prompt_chars,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn pending(&self) -> Option<&ScopeRequest> {
        self.pending.as_ref()
    }

    pub async fn handle_turn(&mut self, user_text: &str) -> Result<String> {
        let reply = if self.pending.is_some() {
            self.handle_verdict(user_text).await?
        } else {
            self.handle_new_request(user_text).await?
        };
        self.session.record_turn(user_text, &reply);
        Ok(reply)
    }

    async fn handle_new_request(&mut self, text: &str) -> Result<String> {
        let intent = self.classifier.classify(text).await?;
        tracing::debug!(intent = intent.label(), "classified request");

        let proposal = match intent {
            Intent::RepoAnalysis => RepoAgent::propose_scope(text, self.default_depth),
            Intent::BlogSummary => BlogAgent::propose_scope(text),
            Intent::TopicResearch => ResearchAgent::propose_scope(text, self.default_breadth),
            Intent::ArticleDraft => ArticleAgent::propose_scope(text, &self.drafts_dir),
            Intent::Unknown => None,
        };

        let Some(action) = proposal else {
            return Ok(match intent {
                Intent::RepoAnalysis => {
                    "I can analyze a GitHub repository, but I need its URL \
                     (for example https://github.com/owner/repo)."
                        .to_string()
                }
                Intent::BlogSummary => {
                    "I can summarize a page, but I need its URL.".to_string()
                }
                _ => CLARIFICATION.to_string(),
            });
        };

        self.propose(action)
    }

    /// Move a fresh action to `AwaitingConfirmation` and return the prompt.
    fn propose(&mut self, action: ProposedAction) -> Result<String> {
        let mut request = ScopeRequest::new(action);
        let prompt = request.emit()?;
        self.telemetry.emit(
            "scope.proposed",
            json!({
                "agent": request.action.agent_label(),
                "description": request.action.describe(),
            }),
        );
        self.pending = Some(request);
        Ok(prompt)
    }

    async fn handle_verdict(&mut self, text: &str) -> Result<String> {
        match parse_verdict(text) {
            Verdict::Approved => {
                let mut request = self.take_pending()?;
                request.approve()?;
                self.telemetry.emit(
                    "scope.approved",
                    json!({ "agent": request.action.agent_label() }),
                );
                self.session
                    .record_scope(request.action.describe(), ScopeDecision::Approved);
                self.execute(request).await
            }
            Verdict::Rejected => {
                let mut request = self.take_pending()?;
                request.reject()?;
                self.telemetry.emit(
                    "scope.rejected",
                    json!({ "agent": request.action.agent_label() }),
                );
                self.session
                    .record_scope(request.action.describe(), ScopeDecision::Rejected);
                Ok("Understood, I won't do that. What would you like instead?".to_string())
            }
            Verdict::Modified(new_text) => self.handle_modification(&new_text).await,
        }
    }

    /// The user answered a confirmation prompt with new text. Re-derive the
    /// scope from it; if nothing actionable can be derived, keep the original
    /// proposal pending and ask again.
    async fn handle_modification(&mut self, text: &str) -> Result<String> {
        let intent = self.classifier.classify(text).await?;
        let proposal = match intent {
            Intent::RepoAnalysis => RepoAgent::propose_scope(text, self.default_depth),
            Intent::BlogSummary => BlogAgent::propose_scope(text),
            Intent::TopicResearch => ResearchAgent::propose_scope(text, self.default_breadth),
            Intent::ArticleDraft => ArticleAgent::propose_scope(text, &self.drafts_dir),
            Intent::Unknown => None,
        };

        match proposal {
            Some(action) => {
                if let Some(mut superseded) = self.pending.take() {
                    superseded.reject()?;
                    self.telemetry.emit(
                        "scope.rejected",
                        json!({
                            "agent": superseded.action.agent_label(),
                            "superseded": true,
                        }),
                    );
                    self.session
                        .record_scope(superseded.action.describe(), ScopeDecision::Rejected);
                }
                self.propose(action)
            }
            None => {
                let pending = self
                    .pending
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("no scope request is pending"))?;
                Ok(format!(
                    "I couldn't turn that into a concrete action. The pending proposal is \
                     still: {}\nApprove? [y/n, or type an adjusted request]",
                    pending.action.describe()
                ))
            }
        }
    }

    /// Reject the pending proposal without a user turn, for when the input
    /// stream closes while a confirmation is outstanding. The scope lifecycle
    /// records it like an explicit rejection.
    pub fn abandon_pending(&mut self) -> Result<()> {
        if let Some(mut request) = self.pending.take() {
            request.reject()?;
            self.telemetry.emit(
                "scope.rejected",
                json!({
                    "agent": request.action.agent_label(),
                    "abandoned": true,
                }),
            );
            self.session
                .record_scope(request.action.describe(), ScopeDecision::Rejected);
        }
        Ok(())
    }

    fn take_pending(&mut self) -> Result<ScopeRequest> {
        self.pending
            .take()
            .ok_or_else(|| anyhow::anyhow!("no scope request is pending"))
    }

    async fn execute(&mut self, mut request: ScopeRequest) -> Result<String> {
        request.begin_execution()?;
        let tool = tool_name_for(&request.action);
        let agent = request.action.agent_label();
        self.telemetry
            .emit("tool.requested", json!({ "tool": tool, "agent": agent }));

        let outcome = self.dispatch(&request.action).await;
        match outcome {
            Ok(result) => {
                request.complete()?;
                self.telemetry
                    .emit("tool.succeeded", json!({ "tool": tool, "agent": agent }));
                self.session
                    .record_gathered(result.agent, &result.source, &result.summary);
                Ok(result.summary)
            }
            Err(failure) => {
                request.fail()?;
                self.telemetry.emit(
                    "tool.failed",
                    json!({ "tool": tool, "agent": agent, "error": failure.to_string() }),
                );
                tracing::warn!(tool = tool, agent = agent, error = %failure, "execution failed");
                Ok(format!(
                    "The {agent} step failed: {failure}. Adjust the request and try again."
                ))
            }
        }
    }

    async fn dispatch(&self, action: &ProposedAction) -> Result<SubAgentResult, AgentFailure> {
        match action {
            ProposedAction::RepoAnalysis { url, depth } => {
                self.repo_agent.execute(url, *depth).await
            }
            ProposedAction::BlogSummary { url } => self.blog_agent.execute(url).await,
            ProposedAction::TopicResearch { query, breadth } => {
                self.research_agent.execute(query, *breadth).await
            }
            ProposedAction::ArticleDraft { topic, path } => {
                let digest = self.session.gathered_digest(self.max_prompt_chars);
                self.article_agent.execute(topic, path, &digest).await
            }
        }
    }
}

fn tool_name_for(action: &ProposedAction) -> &'static str {
    match action {
        ProposedAction::RepoAnalysis { .. } => REPO_FETCH_TOOL_NAME,
        ProposedAction::BlogSummary { .. } => PAGE_FETCH_TOOL_NAME,
        ProposedAction::TopicResearch { .. } => TOPIC_SEARCH_TOOL_NAME,
        ProposedAction::ArticleDraft { .. } => DRAFT_WRITE_TOOL_NAME,
    }
}
