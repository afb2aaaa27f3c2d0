use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use knowflow_cli::chat::{run_ask, run_chat};
use knowflow_cli::cli::{Cli, Commands, ProfileCommands, TelemetryCommands, command_label};
use knowflow_cli::config::{load_profiles, resolve_runtime_config};
use knowflow_cli::doctor::run_doctor;
use knowflow_cli::error::format_cli_error;
use knowflow_cli::orchestrator::Orchestrator;
use knowflow_cli::profiles::{run_profiles_list, run_profiles_show};
use knowflow_cli::provider::resolve_model;
use knowflow_cli::telemetry::{TelemetrySink, run_telemetry_report};

fn init_tracing(filter: &str) {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("error"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_filter);

    if let Err(err) = run_cli(cli).await {
        eprintln!("{}", format_cli_error(&err));
        tracing::error!(error = format!("{err:#}"), "command failed");
        std::process::exit(1);
    }
}

async fn run_cli(cli: Cli) -> Result<()> {
    let profiles = load_profiles(&cli.config_path)?;
    let cfg = resolve_runtime_config(&cli, &profiles)?;
    let telemetry = TelemetrySink::new(&cfg, command_label(&cli.command));

    let outcome = match &cli.command {
        Commands::Ask { prompt } => {
            let prompt = prompt.join(" ");
            let (model, provider, model_name) = resolve_model(&cfg)?;
            tracing::debug!(provider = ?provider, model = model_name, "resolved backend");
            let mut orchestrator = Orchestrator::from_config(&cfg, model, telemetry.clone())
                .context("failed to initialize the assistant")?;
            run_ask(&mut orchestrator, &prompt).await.map(|reply| {
                println!("{reply}");
            })
        }
        Commands::Chat => {
            let (model, provider, model_name) = resolve_model(&cfg)?;
            tracing::debug!(provider = ?provider, model = model_name, "resolved backend");
            let mut orchestrator = Orchestrator::from_config(&cfg, model, telemetry.clone())
                .context("failed to initialize the assistant")?;
            run_chat(&mut orchestrator).await
        }
        Commands::Doctor => run_doctor(&cfg),
        Commands::Profiles { command } => match command {
            ProfileCommands::List => run_profiles_list(&cfg, &profiles),
            ProfileCommands::Show => run_profiles_show(&cfg),
        },
        Commands::Telemetry { command } => match command {
            TelemetryCommands::Report { path, limit } => {
                run_telemetry_report(&cfg, path.clone(), *limit)
            }
        },
    };

    match outcome {
        Ok(()) => {
            telemetry.emit("command.completed", json!({}));
            Ok(())
        }
        Err(err) => {
            telemetry.emit("command.failed", json!({ "error": format!("{err:#}") }));
            Err(err)
        }
    }
}
