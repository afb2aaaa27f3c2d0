use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;

use crate::agents::article::ArticleAgent;
use crate::agents::blog::BlogAgent;
use crate::agents::repo::RepoAgent;
use crate::agents::research::ResearchAgent;
use crate::cli::{Cli, Provider, RepoDepth};
use crate::config::{RuntimeConfig, load_profiles, resolve_runtime_config};
use crate::error::{ErrorCategory, categorize_error};
use crate::intent::{LlmClassifier, RuleClassifier};
use crate::llm::{LlmClient, LlmRequest, LlmResponse};
use crate::orchestrator::Orchestrator;
use crate::provider::{parse_provider_name, validate_model_for_provider};
use crate::scope::{
    ProposedAction, RequestState, ScopeRequest, Verdict, find_url, parse_verdict,
};
use crate::session::{ScopeDecision, Session};
use crate::telemetry::{TelemetrySink, summarize_telemetry_lines};
use crate::tools::{
    PageFetcher, PageSummary, RepoFetcher, RepoSummary, ResearchSummary, ToolError, TopicSearcher,
};

fn base_cfg() -> RuntimeConfig {
    RuntimeConfig {
        profile: "default".to_string(),
        config_path: ".knowflow/config.toml".to_string(),
        provider: Provider::Auto,
        model: None,
        app_name: "knowflow-cli".to_string(),
        user_id: "local-user".to_string(),
        session_id: "test-session".to_string(),
        repo_depth: RepoDepth::Shallow,
        search_breadth: 5,
        tool_timeout_secs: 30,
        telemetry_enabled: false,
        telemetry_path: ".knowflow/telemetry/events.jsonl".to_string(),
        drafts_dir: ".knowflow/drafts".to_string(),
        max_prompt_chars: 24_000,
    }
}

// --- configuration ---

#[test]
fn profile_values_apply_and_cli_flags_win() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[profiles.work]
provider = "openai"
model = "gpt-4.1-mini"
search_breadth = 9
drafts_dir = "out/drafts"
"#,
    )
    .unwrap();

    let path_str = path.to_string_lossy().into_owned();
    let cli = Cli::parse_from([
        "knowflow-cli",
        "--profile",
        "work",
        "--config-path",
        &path_str,
        "--model",
        "gpt-4.1",
        "doctor",
    ]);
    let profiles = load_profiles(&path_str).unwrap();
    let cfg = resolve_runtime_config(&cli, &profiles).unwrap();

    assert_eq!(cfg.provider, Provider::Openai);
    // CLI flag beats the profile value.
    assert_eq!(cfg.model.as_deref(), Some("gpt-4.1"));
    assert_eq!(cfg.search_breadth, 9);
    assert_eq!(cfg.drafts_dir, "out/drafts");
    // Untouched fields keep defaults.
    assert_eq!(cfg.repo_depth, RepoDepth::Shallow);
    assert_eq!(cfg.tool_timeout_secs, 30);
}

#[test]
fn missing_profile_lists_available_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[profiles.work]\nsearch_breadth = 3\n").unwrap();

    let path_str = path.to_string_lossy().into_owned();
    let cli = Cli::parse_from([
        "knowflow-cli",
        "--profile",
        "nope",
        "--config-path",
        &path_str,
        "doctor",
    ]);
    let profiles = load_profiles(&path_str).unwrap();
    let err = resolve_runtime_config(&cli, &profiles).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("profile 'nope' not found"));
    assert!(msg.contains("work"));
}

#[test]
fn default_profile_needs_no_config_file() {
    let cli = Cli::parse_from(["knowflow-cli", "doctor"]);
    let profiles = load_profiles("does/not/exist.toml").unwrap();
    let cfg = resolve_runtime_config(&cli, &profiles).unwrap();
    assert_eq!(cfg.profile, "default");
    assert_eq!(cfg.search_breadth, 5);
}

#[test]
fn unknown_profile_fields_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[profiles.work]\nnot_a_field = 1\n").unwrap();
    let err = load_profiles(&path.to_string_lossy()).unwrap_err();
    assert!(err.to_string().contains("invalid profile configuration"));
}

#[test]
fn search_breadth_is_clamped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[profiles.wide]\nsearch_breadth = 50\n").unwrap();

    let path_str = path.to_string_lossy().into_owned();
    let cli = Cli::parse_from([
        "knowflow-cli",
        "--profile",
        "wide",
        "--config-path",
        &path_str,
        "doctor",
    ]);
    let profiles = load_profiles(&path_str).unwrap();
    let cfg = resolve_runtime_config(&cli, &profiles).unwrap();
    assert_eq!(cfg.search_breadth, 10);
}

// --- provider selection ---

#[test]
fn model_names_are_validated_per_provider() {
    assert!(validate_model_for_provider(Provider::Gemini, "gemini-2.5-flash").is_ok());
    assert!(validate_model_for_provider(Provider::Openai, "gpt-4.1-mini").is_ok());
    assert!(validate_model_for_provider(Provider::Openai, "o3-mini").is_ok());
    assert!(validate_model_for_provider(Provider::Anthropic, "claude-sonnet-4-20250514").is_ok());
    assert!(validate_model_for_provider(Provider::Gemini, "gpt-4.1").is_err());
    assert!(validate_model_for_provider(Provider::Anthropic, "gemini-2.5-flash").is_err());
    // Auto defers validation until a provider is detected.
    assert!(validate_model_for_provider(Provider::Auto, "anything").is_ok());
}

#[test]
fn provider_names_parse_case_insensitively() {
    assert_eq!(parse_provider_name("gemini").unwrap(), Provider::Gemini);
    assert_eq!(parse_provider_name("OpenAI").unwrap(), Provider::Openai);
    assert!(parse_provider_name("mistral").is_err());
}

// --- error categorization ---

#[test]
fn errors_map_to_categories() {
    let backend = anyhow::anyhow!("GOOGLE_API_KEY is required for Gemini provider");
    assert_eq!(categorize_error(&backend), ErrorCategory::Backend);

    let input = anyhow::anyhow!("profile 'x' not found in '.knowflow/config.toml'");
    assert_eq!(categorize_error(&input), ErrorCategory::Input);

    let scope = anyhow::anyhow!("the proposed action was rejected");
    assert_eq!(categorize_error(&scope), ErrorCategory::Scope);

    let tooling = anyhow::anyhow!("page fetch returned 404 Not Found");
    assert_eq!(categorize_error(&tooling), ErrorCategory::Tooling);

    let internal = anyhow::anyhow!("something else entirely");
    assert_eq!(categorize_error(&internal), ErrorCategory::Internal);
}

// --- scope state machine ---

#[test]
fn scope_request_walks_the_happy_path() {
    let mut request = ScopeRequest::new(ProposedAction::BlogSummary {
        url: "https://example.com/post".to_string(),
    });
    assert_eq!(request.state, RequestState::Proposed);

    let prompt = request.emit().unwrap();
    assert!(prompt.contains("Proposed action:"));
    assert!(prompt.contains("Approve?"));
    assert_eq!(request.state, RequestState::AwaitingConfirmation);

    request.approve().unwrap();
    request.begin_execution().unwrap();
    assert_eq!(request.state, RequestState::Executing);
    request.complete().unwrap();
    assert!(request.is_terminal());
}

#[test]
fn scope_request_rejection_is_terminal() {
    let mut request = ScopeRequest::new(ProposedAction::TopicResearch {
        query: "io_uring".to_string(),
        breadth: 5,
    });
    request.emit().unwrap();
    request.reject().unwrap();
    assert_eq!(request.state, RequestState::Rejected);
    assert!(request.is_terminal());
    // A rejected request cannot be revived.
    assert!(request.approve().is_err());
}

#[test]
fn invalid_transitions_are_errors() {
    let mut request = ScopeRequest::new(ProposedAction::BlogSummary {
        url: "https://example.com".to_string(),
    });
    // Cannot approve before the proposal was emitted.
    assert!(request.approve().is_err());
    request.emit().unwrap();
    // Cannot execute before approval.
    assert!(request.begin_execution().is_err());
    // Cannot re-emit.
    assert!(request.emit().is_err());
}

#[test]
fn verdicts_parse_from_short_answers() {
    assert_eq!(parse_verdict("y"), Verdict::Approved);
    assert_eq!(parse_verdict(" YES "), Verdict::Approved);
    assert_eq!(parse_verdict("ok"), Verdict::Approved);
    assert_eq!(parse_verdict("n"), Verdict::Rejected);
    assert_eq!(parse_verdict("cancel"), Verdict::Rejected);
    assert_eq!(
        parse_verdict("only the README please"),
        Verdict::Modified("only the README please".to_string())
    );
}

#[test]
fn urls_are_found_in_free_text() {
    let url = find_url("please analyze https://github.com/org/repo today").unwrap();
    assert_eq!(url.as_str(), "https://github.com/org/repo");

    // Bare github.com tokens get a scheme.
    let url = find_url("check github.com/org/repo.").unwrap();
    assert_eq!(url.host_str(), Some("github.com"));

    assert!(find_url("no links here").is_none());
}

// --- session ---

#[test]
fn session_digest_caps_and_orders_sources() {
    let mut session = Session::new("s");
    session.record_gathered("blog_summary", "https://a.example", "first summary");
    session.record_gathered("topic_research", "web search: q", "second summary");

    let digest = session.gathered_digest(10_000);
    assert!(digest.contains("[1] https://a.example"));
    assert!(digest.contains("[2] web search: q"));

    // A tiny cap keeps only what fits.
    let small = session.gathered_digest(60);
    assert!(small.contains("[1]"));
    assert!(!small.contains("[2]"));

    let empty = Session::new("e");
    assert!(empty.gathered_digest(100).contains("No material"));
}

#[test]
fn oversized_first_source_is_truncated_not_dropped() {
    let mut session = Session::new("s");
    session.record_gathered("blog_summary", "https://a.example", "x".repeat(500));

    let digest = session.gathered_digest(80);
    assert!(!digest.is_empty());
    assert!(digest.starts_with("[1] https://a.example"));
    assert!(digest.chars().count() <= 80);
}

#[test]
fn digest_cap_counts_chars_not_bytes() {
    let mut session = Session::new("s");
    // Four-byte chars: a byte-based cap would cut this entry short.
    session.record_gathered("topic_research", "web search: q", "🦀".repeat(20));

    let entry_chars = session.gathered_digest(usize::MAX).chars().count();
    let digest = session.gathered_digest(entry_chars + 2);
    assert!(digest.contains("🦀"));
    assert!(digest.contains("[1]"));
}

// --- telemetry ---

#[test]
fn telemetry_summary_counts_lifecycle_events() {
    let lines = vec![
        r#"{"ts_unix_ms":1,"event":"scope.proposed","run_id":"r1","command":"ask"}"#.to_string(),
        r#"{"ts_unix_ms":2,"event":"scope.approved","run_id":"r1","command":"ask"}"#.to_string(),
        r#"{"ts_unix_ms":3,"event":"tool.requested","run_id":"r1","command":"ask"}"#.to_string(),
        r#"{"ts_unix_ms":4,"event":"tool.failed","run_id":"r1","command":"ask"}"#.to_string(),
        r#"{"ts_unix_ms":5,"event":"command.completed","run_id":"r2","command":"chat"}"#
            .to_string(),
        "not json".to_string(),
    ];

    let summary = summarize_telemetry_lines(lines, 5000);
    assert_eq!(summary.total_lines, 6);
    assert_eq!(summary.parsed_events, 5);
    assert_eq!(summary.parse_errors, 1);
    assert_eq!(summary.unique_runs.len(), 2);
    assert_eq!(summary.scope_proposed, 1);
    assert_eq!(summary.scope_approved, 1);
    assert_eq!(summary.tool_requested, 1);
    assert_eq!(summary.tool_failed, 1);
    assert_eq!(summary.command_completed, 1);
    assert_eq!(summary.last_event_ts_unix_ms, Some(5));
    assert_eq!(summary.command_counts.get("ask"), Some(&4));
}

// --- orchestrator ---

struct StubLlm {
    reply: &'static str,
    fail: bool,
}

#[async_trait]
impl LlmClient for StubLlm {
    async fn complete(&self, _request: LlmRequest) -> Result<LlmResponse> {
        if self.fail {
            anyhow::bail!("backend unavailable: stub outage");
        }
        Ok(LlmResponse {
            content: self.reply.to_string(),
            model: "stub".to_string(),
            usage: None,
            finish_reason: None,
        })
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}

#[derive(Default)]
struct ToolCalls {
    repo: AtomicUsize,
    page: AtomicUsize,
    search: AtomicUsize,
}

struct StubRepoFetcher {
    calls: Arc<ToolCalls>,
}

#[async_trait]
impl RepoFetcher for StubRepoFetcher {
    async fn fetch_repository(
        &self,
        url: &str,
        _depth: RepoDepth,
    ) -> std::result::Result<RepoSummary, ToolError> {
        self.calls.repo.fetch_add(1, Ordering::SeqCst);
        let _ = url;
        Ok(RepoSummary {
            owner: "org".to_string(),
            repo: "repo".to_string(),
            description: None,
            default_branch: "main".to_string(),
            language: Some("Rust".to_string()),
            files: vec!["src/".to_string()],
            readme: None,
        })
    }
}

struct StubPageFetcher {
    calls: Arc<ToolCalls>,
    fail: bool,
}

#[async_trait]
impl PageFetcher for StubPageFetcher {
    async fn fetch_page(&self, url: &str) -> std::result::Result<PageSummary, ToolError> {
        self.calls.page.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ToolError::new(
                "http_status",
                format!("page fetch returned 404 Not Found for {url}"),
            ));
        }
        Ok(PageSummary {
            url: url.to_string(),
            title: Some("A Post".to_string()),
            markdown: "# A Post\nBody".to_string(),
            content_chars: 13,
        })
    }
}

struct StubSearcher {
    calls: Arc<ToolCalls>,
}

#[async_trait]
impl TopicSearcher for StubSearcher {
    async fn search_topic(
        &self,
        query: &str,
        _breadth: usize,
    ) -> std::result::Result<ResearchSummary, ToolError> {
        self.calls.search.fetch_add(1, Ordering::SeqCst);
        Ok(ResearchSummary {
            query: query.to_string(),
            answer: Some("stub answer".to_string()),
            results: vec![],
        })
    }
}

fn stub_orchestrator(page_fail: bool) -> (Orchestrator, Arc<ToolCalls>) {
    let calls = Arc::new(ToolCalls::default());
    let model: Arc<dyn LlmClient> = Arc::new(StubLlm {
        reply: "synthesized summary",
        fail: false,
    });
    let cfg = base_cfg();

    let orchestrator = Orchestrator::new(
        Arc::new(RuleClassifier),
        RepoAgent::new(
            model.clone(),
            Arc::new(StubRepoFetcher {
                calls: calls.clone(),
            }),
        ),
        BlogAgent::new(
            model.clone(),
            Arc::new(StubPageFetcher {
                calls: calls.clone(),
                fail: page_fail,
            }),
        ),
        ResearchAgent::new(
            model.clone(),
            Arc::new(StubSearcher {
                calls: calls.clone(),
            }),
        ),
        ArticleAgent::new(model),
        Session::new(&cfg.session_id),
        TelemetrySink::new(&cfg, "test".to_string()),
        &cfg,
    );
    (orchestrator, calls)
}

#[tokio::test]
async fn unknown_requests_get_clarification_and_no_tool_runs() {
    let (mut orchestrator, calls) = stub_orchestrator(false);
    let reply = orchestrator.handle_turn("hello there").await.unwrap();
    assert!(reply.contains("I can help"));
    assert!(orchestrator.pending().is_none());
    assert_eq!(calls.repo.load(Ordering::SeqCst), 0);
    assert_eq!(calls.page.load(Ordering::SeqCst), 0);
    assert_eq!(calls.search.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn nothing_executes_before_approval() {
    let (mut orchestrator, calls) = stub_orchestrator(false);
    let reply = orchestrator
        .handle_turn("summarize https://example.com/post")
        .await
        .unwrap();
    assert!(reply.contains("Proposed action:"));
    assert!(orchestrator.pending().is_some());
    assert_eq!(calls.page.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn approval_runs_the_tool_exactly_once() {
    let (mut orchestrator, calls) = stub_orchestrator(false);
    orchestrator
        .handle_turn("summarize https://example.com/post")
        .await
        .unwrap();
    let reply = orchestrator.handle_turn("y").await.unwrap();

    assert_eq!(calls.page.load(Ordering::SeqCst), 1);
    assert_eq!(reply, "synthesized summary");
    assert!(orchestrator.pending().is_none());

    let session = orchestrator.session();
    assert_eq!(session.gathered.len(), 1);
    assert_eq!(session.gathered[0].agent, "blog_summary");
    assert_eq!(session.scope_records.len(), 1);
    assert_eq!(session.scope_records[0].decision, ScopeDecision::Approved);
}

#[tokio::test]
async fn rejection_runs_nothing_and_is_recorded() {
    let (mut orchestrator, calls) = stub_orchestrator(false);
    let prompt = orchestrator
        .handle_turn("analyze github.com/org/repo")
        .await
        .unwrap();
    assert!(prompt.contains("shallow"));

    let reply = orchestrator.handle_turn("n").await.unwrap();
    assert!(reply.contains("won't"));
    assert_eq!(calls.repo.load(Ordering::SeqCst), 0);
    assert!(orchestrator.pending().is_none());

    let session = orchestrator.session();
    assert!(session.gathered.is_empty());
    assert_eq!(session.scope_records.len(), 1);
    assert_eq!(session.scope_records[0].decision, ScopeDecision::Rejected);
}

#[tokio::test]
async fn tool_failure_surfaces_without_retry() {
    let (mut orchestrator, calls) = stub_orchestrator(true);
    orchestrator
        .handle_turn("summarize https://example.com/missing")
        .await
        .unwrap();
    let reply = orchestrator.handle_turn("yes").await.unwrap();

    assert_eq!(calls.page.load(Ordering::SeqCst), 1);
    assert!(reply.contains("failed"));
    assert!(reply.contains("tool failure"));
    assert!(orchestrator.pending().is_none());
    assert!(orchestrator.session().gathered.is_empty());
}

#[tokio::test]
async fn abandoned_proposal_is_recorded_as_rejected() {
    let (mut orchestrator, calls) = stub_orchestrator(false);
    orchestrator
        .handle_turn("summarize https://example.com/post")
        .await
        .unwrap();
    assert!(orchestrator.pending().is_some());

    orchestrator.abandon_pending().unwrap();
    assert!(orchestrator.pending().is_none());
    assert_eq!(calls.page.load(Ordering::SeqCst), 0);

    let session = orchestrator.session();
    assert_eq!(session.scope_records.len(), 1);
    assert_eq!(session.scope_records[0].decision, ScopeDecision::Rejected);

    // With nothing pending, abandoning again is a no-op.
    orchestrator.abandon_pending().unwrap();
    assert_eq!(orchestrator.session().scope_records.len(), 1);
}

#[tokio::test]
async fn modification_rederives_the_scope() {
    let (mut orchestrator, calls) = stub_orchestrator(false);
    orchestrator
        .handle_turn("summarize https://example.com/post")
        .await
        .unwrap();

    let reply = orchestrator
        .handle_turn("research rust build caching instead")
        .await
        .unwrap();
    assert!(reply.contains("Research the topic"));
    assert!(orchestrator.pending().is_some());
    assert_eq!(calls.page.load(Ordering::SeqCst), 0);

    // The superseded proposal is recorded as rejected.
    assert_eq!(orchestrator.session().scope_records.len(), 1);
    assert_eq!(
        orchestrator.session().scope_records[0].decision,
        ScopeDecision::Rejected
    );

    let reply = orchestrator.handle_turn("y").await.unwrap();
    assert_eq!(reply, "synthesized summary");
    assert_eq!(calls.search.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unparseable_modification_keeps_the_proposal_pending() {
    let (mut orchestrator, calls) = stub_orchestrator(false);
    orchestrator
        .handle_turn("summarize https://example.com/post")
        .await
        .unwrap();

    let reply = orchestrator.handle_turn("hmm not sure").await.unwrap();
    assert!(reply.contains("still"));
    assert!(orchestrator.pending().is_some());
    assert_eq!(calls.page.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn classifier_backend_failure_propagates() {
    let calls = Arc::new(ToolCalls::default());
    let good_model: Arc<dyn LlmClient> = Arc::new(StubLlm {
        reply: "synthesized summary",
        fail: false,
    });
    let failing_model: Arc<dyn LlmClient> = Arc::new(StubLlm {
        reply: "",
        fail: true,
    });
    let cfg = base_cfg();

    let mut orchestrator = Orchestrator::new(
        Arc::new(LlmClassifier::new(failing_model)),
        RepoAgent::new(
            good_model.clone(),
            Arc::new(StubRepoFetcher {
                calls: calls.clone(),
            }),
        ),
        BlogAgent::new(
            good_model.clone(),
            Arc::new(StubPageFetcher {
                calls: calls.clone(),
                fail: false,
            }),
        ),
        ResearchAgent::new(
            good_model.clone(),
            Arc::new(StubSearcher {
                calls: calls.clone(),
            }),
        ),
        ArticleAgent::new(good_model),
        Session::new(&cfg.session_id),
        TelemetrySink::new(&cfg, "test".to_string()),
        &cfg,
    );

    let err = orchestrator.handle_turn("anything at all").await.unwrap_err();
    assert_eq!(categorize_error(&err), ErrorCategory::Backend);
    assert_eq!(calls.page.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn article_draft_writes_into_the_drafts_dir() {
    let dir = tempfile::tempdir().unwrap();
    let drafts_dir = dir.path().join("drafts").to_string_lossy().into_owned();

    let calls = Arc::new(ToolCalls::default());
    let model: Arc<dyn LlmClient> = Arc::new(StubLlm {
        reply: "# Draft\nBody",
        fail: false,
    });
    let mut cfg = base_cfg();
    cfg.drafts_dir = drafts_dir.clone();

    let mut orchestrator = Orchestrator::new(
        Arc::new(RuleClassifier),
        RepoAgent::new(
            model.clone(),
            Arc::new(StubRepoFetcher {
                calls: calls.clone(),
            }),
        ),
        BlogAgent::new(
            model.clone(),
            Arc::new(StubPageFetcher {
                calls: calls.clone(),
                fail: false,
            }),
        ),
        ResearchAgent::new(model.clone(), Arc::new(StubSearcher { calls })),
        ArticleAgent::new(model),
        Session::new(&cfg.session_id),
        TelemetrySink::new(&cfg, "test".to_string()),
        &cfg,
    );

    let prompt = orchestrator
        .handle_turn("draft an article about async Rust")
        .await
        .unwrap();
    assert!(prompt.contains("async Rust"));

    let reply = orchestrator.handle_turn("y").await.unwrap();
    assert!(reply.contains("Draft written to"));

    let entries = std::fs::read_dir(&drafts_dir).unwrap().count();
    assert_eq!(entries, 1);
}
