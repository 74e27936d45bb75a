use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "selkie")]
#[command(version)]
#[command(about = "A conversational AI assistant with selective web search", long_about = None)]
pub struct Cli {
    /// Session id to resume (defaults to a new session)
    #[arg(short, long)]
    pub session: Option<String>,

    /// Model name override (e.g. gpt-4o-mini)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Non-interactive prompt: post one turn and print the reply
    #[arg(short, long)]
    pub prompt: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize configuration
    Init,
    /// Start a chat session (default)
    Chat,
    /// List stored sessions
    Sessions,
    /// Clear a session's history
    Clear {
        /// Session id to clear
        session: String,
    },
    /// Delete a session and its backup
    Delete {
        /// Session id to delete
        session: String,
    },
    /// Show version information
    Version,
}
