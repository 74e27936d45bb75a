use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use selkie::{
    app::load_config,
    cli::{handle_command, Cli},
    runtime::{run_repl, Assistant},
    utils::init_logger,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Set up logging (RUST_LOG wins; --verbose raises the default)
    if cli.verbose && std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "selkie=debug");
    }
    init_logger();

    // Load configuration
    let mut config = if let Some(config_path) = &cli.config {
        let toml_str = std::fs::read_to_string(config_path)?;
        toml::from_str(&toml_str)?
    } else {
        match load_config() {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("⚠️  Failed to load config: {}. Using defaults.", e);
                selkie::Config::default()
            }
        }
    };

    // CLI model override
    if let Some(model) = &cli.model {
        config.model.name = model.clone();
    }

    // Handle subcommands
    if let Some(command) = &cli.command {
        if handle_command(command, &config)? {
            return Ok(()); // Command handled, exit
        }
        // Continue to chat for Commands::Chat
    }

    let assistant = Assistant::new(&config)?;
    let session_id = cli
        .session
        .clone()
        .unwrap_or_else(|| assistant.create_session());

    // One-shot prompt mode
    if let Some(prompt) = &cli.prompt {
        let report = assistant.post_turn(&session_id, prompt).await;
        println!("{}", report.response);
        if !report.saved {
            eprintln!("{}", "⚠️  This exchange could not be saved".yellow());
        }
        return Ok(());
    }

    // Interactive chat
    run_repl(&assistant, &session_id).await
}
