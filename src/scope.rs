//! Scope confirmation: every side-effecting action is proposed as a bounded,
//! human-readable request and executes only after an explicit approval turn.

use anyhow::Result;
use url::Url;

use crate::cli::RepoDepth;

#[derive(Debug, Clone, PartialEq)]
pub enum ProposedAction {
    RepoAnalysis { url: String, depth: RepoDepth },
    BlogSummary { url: String },
    TopicResearch { query: String, breadth: usize },
    ArticleDraft { topic: String, path: String },
}

impl ProposedAction {
    pub fn agent_label(&self) -> &'static str {
        match self {
            ProposedAction::RepoAnalysis { .. } => "repo_analysis",
            ProposedAction::BlogSummary { .. } => "blog_summary",
            ProposedAction::TopicResearch { .. } => "topic_research",
            ProposedAction::ArticleDraft { .. } => "article_draft",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ProposedAction::RepoAnalysis { url, depth } => format!(
                "Analyze GitHub repository {url} (depth: {}). This fetches repository \
                 metadata, the file listing, and the README.",
                depth.label()
            ),
            ProposedAction::BlogSummary { url } => {
                format!("Fetch and summarize the page at {url}.")
            }
            ProposedAction::TopicResearch { query, breadth } => format!(
                "Research the topic \"{query}\" via web search (up to {breadth} results)."
            ),
            ProposedAction::ArticleDraft { topic, path } => format!(
                "Draft an article on \"{topic}\" from this session's gathered material \
                 and write it to {path}."
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Proposed,
    AwaitingConfirmation,
    Approved,
    Executing,
    Completed,
    Failed,
    Rejected,
}

/// One proposed action moving through
/// `Proposed -> AwaitingConfirmation -> {Approved -> Executing -> {Completed |
/// Failed}, Rejected}`. Invalid transitions are programming errors and fail
/// loudly rather than silently skipping the confirmation gate.
#[derive(Debug, Clone)]
pub struct ScopeRequest {
    pub action: ProposedAction,
    pub state: RequestState,
}

impl ScopeRequest {
    pub fn new(action: ProposedAction) -> Self {
        Self {
            action,
            state: RequestState::Proposed,
        }
    }

    /// Move to `AwaitingConfirmation` and produce the confirmation prompt.
    pub fn emit(&mut self) -> Result<String> {
        self.transition(RequestState::Proposed, RequestState::AwaitingConfirmation)?;
        Ok(format!(
            "Proposed action: {}\nApprove? [y/n, or type an adjusted request]",
            self.action.describe()
        ))
    }

    pub fn approve(&mut self) -> Result<()> {
        self.transition(RequestState::AwaitingConfirmation, RequestState::Approved)
    }

    pub fn reject(&mut self) -> Result<()> {
        self.transition(RequestState::AwaitingConfirmation, RequestState::Rejected)
    }

    pub fn begin_execution(&mut self) -> Result<()> {
        self.transition(RequestState::Approved, RequestState::Executing)
    }

    pub fn complete(&mut self) -> Result<()> {
        self.transition(RequestState::Executing, RequestState::Completed)
    }

    pub fn fail(&mut self) -> Result<()> {
        self.transition(RequestState::Executing, RequestState::Failed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            RequestState::Completed | RequestState::Failed | RequestState::Rejected
        )
    }

    fn transition(&mut self, from: RequestState, to: RequestState) -> Result<()> {
        if self.state != from {
            return Err(anyhow::anyhow!(
                "invalid scope transition {:?} -> {:?} (current state {:?})",
                from,
                to,
                self.state
            ));
        }
        self.state = to;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Approved,
    Rejected,
    Modified(String),
}

/// Interpret a user turn while a scope request is pending. Anything that is
/// not a plain approval or rejection is treated as a scope modification.
pub fn parse_verdict(input: &str) -> Verdict {
    let normalized = input.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "y" | "yes" | "approve" | "approved" | "ok" | "go" => Verdict::Approved,
        "n" | "no" | "reject" | "rejected" | "cancel" | "stop" => Verdict::Rejected,
        _ => Verdict::Modified(input.trim().to_string()),
    }
}

/// Extract the first URL-looking token from free text. Accepts bare
/// `github.com/...` and `www....` tokens by assuming https.
pub fn find_url(text: &str) -> Option<Url> {
    for token in text.split_whitespace() {
        let token = token.trim_matches(|c: char| matches!(c, ',' | '.' | ';' | ':' | ')' | '(' | '"' | '\''));
        let candidate = if token.starts_with("http://") || token.starts_with("https://") {
            token.to_string()
        } else if token.starts_with("github.com/") || token.starts_with("www.") {
            format!("https://{token}")
        } else {
            continue;
        };

        if let Ok(url) = Url::parse(&candidate)
            && url.host_str().is_some()
        {
            return Some(url);
        }
    }
    None
}
