use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cortex_chat::config::{Engine, ModelConfig, ServerConfig};
use cortex_chat::prompt::TerminalPrompt;
use cortex_chat::session::ChatSession;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Message to send before reading from the terminal
    message: Option<String>,

    /// Inference server host (can also be set via CORTEX_HOST environment variable)
    #[arg(long)]
    host: Option<String>,

    /// Inference server port (can also be set via CORTEX_PORT environment variable)
    #[arg(long)]
    port: Option<u16>,

    /// Model YAML file with name, engine and stop strings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model to chat with, overrides the name in --config
    #[arg(short, long)]
    model: Option<String>,

    /// Inference engine, overrides the engine in --config
    #[arg(short, long)]
    engine: Option<String>,

    /// Stop string, may be repeated; replaces the stop strings in --config
    #[arg(long = "stop")]
    stop: Vec<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let server = ServerConfig::from_env().context("Invalid server settings")?;
    let host = cli.host.clone().unwrap_or(server.host);
    let port = cli.port.unwrap_or(server.port);

    let model = model_config(&cli)?;
    debug!(
        %host,
        port,
        model = %model.name,
        engine = model.engine.name(),
        engine_kind = ?model.engine.kind(),
        "starting chat"
    );

    let mut session = ChatSession::new(&host, port, model, TerminalPrompt::stdio())
        .context("Failed to create chat session")?;
    session
        .exec(cli.message.clone())
        .context("Chat session failed")?;

    Ok(())
}

fn init_logging(verbose: u8) {
    // RUST_LOG wins over -v when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn model_config(cli: &Cli) -> Result<ModelConfig> {
    let base = match &cli.config {
        Some(path) => ModelConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load model config from {}", path.display()))?,
        None => {
            let name = cli
                .model
                .clone()
                .context("A model must be provided via --model or --config")?;
            ModelConfig::new(name, Engine::default(), Vec::new())
        }
    };

    Ok(base.with_overrides(cli.model.clone(), cli.engine.clone(), cli.stop.clone()))
}
