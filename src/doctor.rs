use anyhow::Result;

use crate::config::RuntimeConfig;
use crate::provider::{detect_provider, env_present};

fn check_env(name: &str, purpose: &str) -> bool {
    let present = env_present(name);
    let marker = if present { "ok " } else { "-- " };
    println!("  [{marker}] {name}: {purpose}");
    present
}

/// Environment checks for the provider keys and capability tool credentials.
/// Prints a readable report; only a fully absent provider is an error.
pub fn run_doctor(cfg: &RuntimeConfig) -> Result<()> {
    println!("knowflow-cli doctor");
    println!();
    println!("Provider keys (one required):");
    let google = check_env("GOOGLE_API_KEY", "Gemini backend");
    let openai = check_env("OPENAI_API_KEY", "OpenAI backend");
    let anthropic = check_env("ANTHROPIC_API_KEY", "Anthropic backend");

    println!();
    println!("Capability tools (optional):");
    check_env("TAVILY_API_KEY", "topic research via web search");
    check_env("GITHUB_TOKEN", "higher GitHub API rate limits");

    println!();
    match detect_provider() {
        Some(provider) => println!("Auto-detected provider: {provider:?}"),
        None => println!("Auto-detected provider: none"),
    }

    println!();
    println!("Resolved configuration:");
    println!("  profile:           {}", cfg.profile);
    println!("  config path:       {}", cfg.config_path);
    println!("  provider:          {:?}", cfg.provider);
    println!(
        "  model:             {}",
        cfg.model.as_deref().unwrap_or("(provider default)")
    );
    println!("  session id:        {}", cfg.session_id);
    println!("  repo depth:        {}", cfg.repo_depth.label());
    println!("  search breadth:    {}", cfg.search_breadth);
    println!("  tool timeout:      {}s", cfg.tool_timeout_secs);
    println!("  telemetry:         {}", cfg.telemetry_enabled);
    println!("  telemetry path:    {}", cfg.telemetry_path);
    println!("  drafts dir:        {}", cfg.drafts_dir);

    if !(google || openai || anthropic) {
        println!();
        return Err(anyhow::anyhow!(
            "no provider API key is set. Set GOOGLE_API_KEY, OPENAI_API_KEY, or \
             ANTHROPIC_API_KEY before running ask or chat."
        ));
    }

    println!();
    println!("Doctor checks passed.");
    Ok(())
}
