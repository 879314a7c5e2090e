//! Mathtutor - ReAct Math Tutoring Agent
//!
//! Main entry point for the CLI application.

use clap::Parser;
use std::env;
use mathtutor::core::config::ModelConfig;
use mathtutor::core::ProviderType;
use mathtutor::{Agent, Config, Repl};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Mathtutor - an AI math tutor that reasons with tools
#[derive(Parser, Debug)]
#[command(name = "mathtutor")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model backend (ollama or openai)
    #[arg(long)]
    provider: Option<ProviderType>,

    /// Model used for reasoning
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Maximum reasoning steps per question
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Log prompts and completions
    #[arg(long, short = 'd')]
    debug: bool,

    /// Do not stream reasoning tokens
    #[arg(long)]
    no_stream: bool,

    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _ = dotenvy::dotenv();

    // Logs go to stderr, the chat owns stdout
    let debug = args.debug || env::var("MATHTUTOR_DEBUG").is_ok_and(|v| v == "true" || v == "1");
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("mathtutor={}", default_level).into()),
        )
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(provider) = args.provider {
        if provider != config.provider && args.model.is_none() {
            config.model.name = ModelConfig::default_for(provider).name;
        }
        config.provider = provider;
    }

    if let Some(ref model) = args.model {
        config.model.name = model.clone();
    }

    if let Some(max_iterations) = args.max_iterations {
        config.agent.max_iterations = max_iterations;
    }

    if args.debug {
        config.agent.debug = true;
    }

    if args.no_stream {
        config.streaming.enabled = false;
    }

    config.validate()?;

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        let mut agent = Agent::with_config(config);
        agent.initialize().await?;

        let answer = agent.process(&prompt).await?;
        println!("{}", answer);
        return Ok(());
    }

    // Interactive REPL mode
    let mut repl = Repl::with_config(config);
    repl.run().await?;

    Ok(())
}
