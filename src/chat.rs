use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::error::format_cli_error;
use crate::orchestrator::Orchestrator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Exit,
    Help,
    Status,
    Session,
    Unknown(String),
}

/// Parse a `/`-prefixed chat command. Returns `None` for regular input.
pub fn parse_chat_command(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let name = trimmed
        .split_whitespace()
        .next()
        .unwrap_or(trimmed)
        .to_ascii_lowercase();
    Some(match name.as_str() {
        "/exit" | "/quit" => ChatCommand::Exit,
        "/help" => ChatCommand::Help,
        "/status" => ChatCommand::Status,
        "/session" => ChatCommand::Session,
        _ => ChatCommand::Unknown(name),
    })
}

pub fn print_chat_help() {
    println!("Chat commands:");
    println!("  /help     show this help");
    println!("  /status   show the pending proposal, if any");
    println!("  /session  show this session's transcript");
    println!("  /exit     leave chat mode");
    println!();
    println!("Anything else is sent to the assistant. Proposed actions run only");
    println!("after you approve them (y/yes); reject with n/no or type an");
    println!("adjusted request.");
}

pub async fn run_chat(orchestrator: &mut Orchestrator) -> Result<()> {
    println!("Knowledge Flow assistant. /help for commands, /exit to leave.");

    let mut editor = DefaultEditor::new().context("failed to initialize line editor")?;
    loop {
        let line = match editor.readline("you> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("failed to read input"),
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(input);

        if let Some(command) = parse_chat_command(input) {
            match command {
                ChatCommand::Exit => break,
                ChatCommand::Help => print_chat_help(),
                ChatCommand::Status => match orchestrator.pending() {
                    Some(request) => {
                        println!("Pending proposal: {}", request.action.describe());
                        println!("Approve? [y/n, or type an adjusted request]");
                    }
                    None => println!("No proposal is pending."),
                },
                ChatCommand::Session => println!("{}", orchestrator.session().transcript()),
                ChatCommand::Unknown(name) => {
                    println!("Unknown command '{name}'. Try /help.");
                }
            }
            continue;
        }

        match orchestrator.handle_turn(input).await {
            Ok(reply) => println!("agent> {reply}"),
            Err(err) => eprintln!("{}", format_cli_error(&err)),
        }
    }

    Ok(())
}

/// One-shot mode. The request is handled once; while a proposal is pending,
/// confirmation turns are read from stdin so the scope gate still applies.
pub async fn run_ask(orchestrator: &mut Orchestrator, prompt: &str) -> Result<String> {
    let mut reply = orchestrator.handle_turn(prompt).await?;

    while orchestrator.pending().is_some() {
        println!("{reply}");
        print!("you> ");
        std::io::stdout().flush().context("failed to flush stdout")?;

        let mut line = String::new();
        let read = std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("failed to read input")?;
        if read == 0 {
            // stdin closed; an unanswerable proposal is a rejection.
            orchestrator.abandon_pending()?;
            return Ok("No confirmation received; the proposed action was not run.".to_string());
        }

        reply = orchestrator.handle_turn(line.trim()).await?;
    }

    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_commands_parse() {
        assert_eq!(parse_chat_command("/exit"), Some(ChatCommand::Exit));
        assert_eq!(parse_chat_command("  /quit  "), Some(ChatCommand::Exit));
        assert_eq!(parse_chat_command("/HELP"), Some(ChatCommand::Help));
        assert_eq!(parse_chat_command("/status now"), Some(ChatCommand::Status));
        assert_eq!(parse_chat_command("/session"), Some(ChatCommand::Session));
        assert_eq!(
            parse_chat_command("/nope"),
            Some(ChatCommand::Unknown("/nope".to_string()))
        );
    }

    #[test]
    fn regular_input_is_not_a_command() {
        assert_eq!(parse_chat_command("analyze github.com/org/repo"), None);
        assert_eq!(parse_chat_command(""), None);
        assert_eq!(parse_chat_command("y"), None);
    }
}
