use anyhow::Result;
use colored::Colorize;
use std::io::{self, BufRead, Write};

use super::assistant::Assistant;
use crate::models::MessageRole;

/// Interactive chat loop over stdin/stdout
pub async fn run_repl(assistant: &Assistant, session_id: &str) -> Result<()> {
    println!(
        "🦭 Selkie ready (model: {}, session: {})",
        assistant.model_name().green(),
        session_id.dimmed()
    );
    if assistant.is_degraded() {
        eprintln!(
            "{}",
            "⚠️  No writable storage found - this conversation will not survive a restart"
                .yellow()
        );
    }
    println!("Type a message, or /help for commands.\n");

    let stdin = io::stdin();
    loop {
        print!("{} ", "you ❯".cyan().bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/quit" | "/exit" => break,
            "/help" => {
                print_help();
                continue;
            }
            "/history" => {
                print_history(assistant, session_id);
                continue;
            }
            "/sessions" => {
                print_sessions(assistant);
                continue;
            }
            "/clear" => {
                if assistant.clear_history(session_id) {
                    println!("{}", "History cleared.".dimmed());
                } else {
                    eprintln!("{}", "⚠️  Could not clear history".yellow());
                }
                continue;
            }
            _ => {}
        }

        let report = assistant.post_turn(session_id, input).await;
        println!("{} {}\n", "selkie ❯".magenta().bold(), report.response);
        if !report.saved {
            eprintln!(
                "{}",
                "⚠️  This exchange could not be saved and may be lost on restart".yellow()
            );
        }
    }

    println!("👋 Bye");
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  /history   show this conversation");
    println!("  /sessions  list stored sessions");
    println!("  /clear     clear this conversation's history");
    println!("  /quit      exit");
}

fn print_history(assistant: &Assistant, session_id: &str) {
    let history = assistant.history(session_id);
    if history.is_empty() {
        println!("{}", "(no messages yet)".dimmed());
        return;
    }
    for message in history {
        match message.role {
            MessageRole::User => println!("{} {}", "you ❯".cyan(), message.content),
            MessageRole::Assistant => println!("{} {}", "selkie ❯".magenta(), message.content),
        }
    }
}

fn print_sessions(assistant: &Assistant) {
    let sessions = assistant.list_sessions();
    if sessions.is_empty() {
        println!("{}", "(no stored sessions)".dimmed());
        return;
    }
    for session_id in sessions {
        let info = assistant.session_info(&session_id);
        println!(
            "  {} {} ({} messages)",
            session_id.dimmed(),
            info.conversation_name,
            info.message_count
        );
    }
}
