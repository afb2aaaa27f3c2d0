use anyhow::Result;

use crate::config::{ProfilesFile, RuntimeConfig};

pub fn run_profiles_list(cfg: &RuntimeConfig, profiles: &ProfilesFile) -> Result<()> {
    println!("Profiles in '{}':", cfg.config_path);

    let mut names = profiles.profiles.keys().cloned().collect::<Vec<String>>();
    names.sort();

    if names.is_empty() {
        println!("  (none configured)");
    } else {
        for name in &names {
            let marker = if *name == cfg.profile { "*" } else { " " };
            println!("  {marker} {name}");
        }
    }

    if !names.iter().any(|n| n == &cfg.profile) {
        println!("  * {} (implicit defaults)", cfg.profile);
    }

    Ok(())
}

pub fn run_profiles_show(cfg: &RuntimeConfig) -> Result<()> {
    println!("Active profile: {}", cfg.profile);
    println!("Config path:    {}", cfg.config_path);
    println!();
    println!("Resolved settings:");
    println!("  provider:          {:?}", cfg.provider);
    println!(
        "  model:             {}",
        cfg.model.as_deref().unwrap_or("(provider default)")
    );
    println!("  app name:          {}", cfg.app_name);
    println!("  user id:           {}", cfg.user_id);
    println!("  session id:        {}", cfg.session_id);
    println!("  repo depth:        {}", cfg.repo_depth.label());
    println!("  search breadth:    {}", cfg.search_breadth);
    println!("  tool timeout:      {}s", cfg.tool_timeout_secs);
    println!("  telemetry:         {}", cfg.telemetry_enabled);
    println!("  telemetry path:    {}", cfg.telemetry_path);
    println!("  drafts dir:        {}", cfg.drafts_dir);
    Ok(())
}
