use anyhow::Result;
use colored::Colorize;
use std::sync::Arc;

use crate::app::{init_config, Config};
use crate::memory::ConversationMemory;
use crate::store::SessionStore;

use super::Commands;

/// Handle CLI subcommands. Returns true when the command was fully
/// handled and the process should exit.
pub fn handle_command(command: &Commands, config: &Config) -> Result<bool> {
    match command {
        Commands::Init => {
            println!("Initializing Selkie configuration...");
            init_config()?;
            println!("Configuration initialized successfully!");
            Ok(true)
        }
        Commands::Sessions => {
            list_sessions(config);
            Ok(true)
        }
        Commands::Clear { session } => {
            let memory = open_memory(config);
            match memory.clear(session) {
                Ok(()) => println!("Cleared history for {}", session.green()),
                Err(e) => eprintln!("❌ Could not clear {}: {}", session, e),
            }
            Ok(true)
        }
        Commands::Delete { session } => {
            let store = SessionStore::open(&config.storage);
            match store.delete(session) {
                Ok(()) => println!("Deleted session {}", session.green()),
                Err(e) => eprintln!("❌ Could not delete {}: {}", session, e),
            }
            Ok(true)
        }
        Commands::Version => {
            show_version();
            Ok(true)
        }
        Commands::Chat => Ok(false), // Continue to chat interface
    }
}

fn open_memory(config: &Config) -> ConversationMemory {
    let store = Arc::new(SessionStore::open(&config.storage));
    ConversationMemory::new(store, config.storage.keep_name_on_clear)
}

/// List stored sessions with their names, most recent first
fn list_sessions(config: &Config) {
    let memory = open_memory(config);
    let sessions = memory.store().list();
    if sessions.is_empty() {
        println!("No stored sessions.");
        return;
    }
    println!("Stored sessions (most recent first):");
    for session_id in sessions {
        let document = memory.document(&session_id);
        println!(
            "  • {} {} ({} messages)",
            session_id.dimmed(),
            document.display_name(),
            document.messages.len()
        );
    }
}

/// Show version information
fn show_version() {
    println!("Selkie v{}", env!("CARGO_PKG_VERSION"));
    println!("   A conversational AI assistant with selective web search");
}
