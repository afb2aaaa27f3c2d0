#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Backend,
    Tooling,
    Scope,
    Input,
    Internal,
}

impl ErrorCategory {
    pub fn code(self) -> &'static str {
        match self {
            ErrorCategory::Backend => "BACKEND",
            ErrorCategory::Tooling => "TOOLING",
            ErrorCategory::Scope => "SCOPE",
            ErrorCategory::Input => "INPUT",
            ErrorCategory::Internal => "INTERNAL",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            ErrorCategory::Backend => {
                "Set provider credentials (for example GOOGLE_API_KEY) or pick one with --provider."
            }
            ErrorCategory::Tooling => {
                "Check the URL/query and tool credentials (TAVILY_API_KEY, GITHUB_TOKEN) and re-issue the request."
            }
            ErrorCategory::Scope => {
                "The proposed action was not approved. Re-issue the request or adjust its scope."
            }
            ErrorCategory::Input => "Run knowflow-cli --help and correct command arguments.",
            ErrorCategory::Internal => {
                "Retry with RUST_LOG=debug. If it persists, capture logs and open an issue."
            }
        }
    }
}

pub fn categorize_error(err: &anyhow::Error) -> ErrorCategory {
    let msg = format!("{err:#}").to_ascii_lowercase();

    if msg.contains("api_key")
        || msg.contains("api key")
        || msg.contains("no provider could be auto-detected")
        || msg.contains("provider")
        || msg.contains("backend")
    {
        return ErrorCategory::Backend;
    }

    if msg.contains("invalid value")
        || msg.contains("unknown argument")
        || msg.contains("failed to read input")
        || msg.contains("profile")
    {
        return ErrorCategory::Input;
    }

    if msg.contains("rejected") || msg.contains("confirmation") || msg.contains("scope") {
        return ErrorCategory::Scope;
    }

    if msg.contains("tool")
        || msg.contains("fetch")
        || msg.contains("search")
        || msg.contains("scrape")
    {
        return ErrorCategory::Tooling;
    }

    ErrorCategory::Internal
}

pub fn format_cli_error(err: &anyhow::Error) -> String {
    let category = categorize_error(err);
    format!("[{}] {}\nHint: {}", category.code(), err, category.hint())
}
