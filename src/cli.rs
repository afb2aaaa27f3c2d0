use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Auto,
    Gemini,
    Openai,
    Anthropic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoDepth {
    Shallow,
    Full,
}

impl RepoDepth {
    pub fn label(self) -> &'static str {
        match self {
            RepoDepth::Shallow => "shallow",
            RepoDepth::Full => "full",
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommands {
    #[command(about = "List configured profiles and highlight the active profile")]
    List,
    #[command(about = "Show the active profile's resolved runtime settings")]
    Show,
}

#[derive(Debug, Subcommand)]
pub enum TelemetryCommands {
    #[command(about = "Summarize telemetry events from a JSONL stream")]
    Report {
        #[arg(long)]
        path: Option<String>,
        #[arg(long, default_value_t = 5000)]
        limit: usize,
    },
}

const CLI_EXAMPLES: &str = "Examples:\n\
  knowflow-cli ask \"analyze https://github.com/tokio-rs/tokio\"\n\
  knowflow-cli ask \"summarize https://example.com/post\"\n\
  knowflow-cli --provider openai --model gpt-4.1-mini chat\n\
  knowflow-cli --search-breadth 8 ask \"research Kubernetes service mesh patterns\"\n\
  knowflow-cli doctor\n\
  knowflow-cli profiles list\n\
  knowflow-cli telemetry report --limit 2000\n\
\n\
Confirmation behavior:\n\
  - Every repo fetch, page scrape, or web search is proposed first and runs\n\
    only after you approve it (y/yes). Reject with n/no, or type an adjusted\n\
    request to modify the proposed scope.\n\
  - In chat, use /help, /status, /session, /exit.";

#[derive(Debug, Parser)]
#[command(name = "knowflow-cli")]
#[command(about = "Developer-advocate assistant routing repo/blog/topic requests through scope-confirmed sub-agents")]
#[command(after_long_help = CLI_EXAMPLES)]
pub struct Cli {
    #[arg(long, env = "KNOWFLOW_PROVIDER", value_enum, default_value_t = Provider::Auto)]
    pub provider: Provider,

    #[arg(long, env = "KNOWFLOW_MODEL")]
    pub model: Option<String>,

    #[arg(long, env = "KNOWFLOW_PROFILE", default_value = "default")]
    pub profile: String,

    #[arg(long, env = "KNOWFLOW_CONFIG", default_value = ".knowflow/config.toml")]
    pub config_path: String,

    #[arg(long, env = "KNOWFLOW_APP_NAME")]
    pub app_name: Option<String>,

    #[arg(long, env = "KNOWFLOW_USER_ID")]
    pub user_id: Option<String>,

    #[arg(long, env = "KNOWFLOW_SESSION_ID")]
    pub session_id: Option<String>,

    #[arg(long, env = "KNOWFLOW_REPO_DEPTH", value_enum)]
    pub repo_depth: Option<RepoDepth>,

    #[arg(long, env = "KNOWFLOW_SEARCH_BREADTH")]
    pub search_breadth: Option<usize>,

    #[arg(long, env = "KNOWFLOW_TOOL_TIMEOUT_SECS")]
    pub tool_timeout_secs: Option<u64>,

    #[arg(long, env = "KNOWFLOW_TELEMETRY_ENABLED", action = clap::ArgAction::Set)]
    pub telemetry_enabled: Option<bool>,

    #[arg(long, env = "KNOWFLOW_TELEMETRY_PATH")]
    pub telemetry_path: Option<String>,

    #[arg(long, env = "KNOWFLOW_DRAFTS_DIR")]
    pub drafts_dir: Option<String>,

    #[arg(long, env = "RUST_LOG", default_value = "error")]
    pub log_filter: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Run a one-shot request (confirmation is read from stdin)")]
    Ask {
        #[arg(required = true)]
        prompt: Vec<String>,
    },
    #[command(about = "Run interactive chat mode")]
    Chat,
    #[command(about = "Validate provider environment and capability tool configuration")]
    Doctor,
    #[command(about = "Inspect profile configuration and active resolved profile state")]
    Profiles {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    #[command(about = "Telemetry utilities and reporting")]
    Telemetry {
        #[command(subcommand)]
        command: TelemetryCommands,
    },
}

pub fn command_label(command: &Commands) -> String {
    match command {
        Commands::Ask { .. } => "ask".to_string(),
        Commands::Chat => "chat".to_string(),
        Commands::Doctor => "doctor".to_string(),
        Commands::Profiles { command } => match command {
            ProfileCommands::List => "profiles.list".to_string(),
            ProfileCommands::Show => "profiles.show".to_string(),
        },
        Commands::Telemetry { command } => match command {
            TelemetryCommands::Report { .. } => "telemetry.report".to_string(),
        },
    }
}
