//! FarmAgent CLI
//!
//! Answers one query and prints the `AgentResponse` as JSON on stdout.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use farmagent::cli::Cli;
use farmagent::config::Config;
use farmagent::{AgentResponse, AgentRuntime};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<PathBuf> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("farmagent")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_path = log_dir.join("farmagent.log");
    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(log_path)
}

/// One-line summary on stderr; stdout carries only the JSON
fn report(response: &AgentResponse) {
    let line = match response {
        AgentResponse::Success { recipe } => format!("{} {}", "grounded:".green(), recipe.name),
        AgentResponse::Salvaged { .. } => format!("{} output did not match the recipe schema", "salvaged:".yellow()),
        AgentResponse::Refusal { reason, .. } => format!("{} {:?}", "refused:".yellow(), reason),
        AgentResponse::ValidationFailure { error, .. } => format!("{} {:?}", "failed:".red(), error),
    };
    eprintln!("{}", line);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    let log_path =
        setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;
    debug!(log = %log_path.display(), "main: logging ready");

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(top_k) = cli.top_k {
        config.agent.top_k = top_k;
    }

    let mut agent = AgentRuntime::from_config(&config).context("Failed to initialize agent")?;
    if let Some(seed) = cli.seed {
        agent = agent.with_seed(seed);
    }

    let backends = agent.backends();
    if backends.is_empty() && !backends.remote_auth_missing {
        return Err(eyre!(
            "No inference backend configured: enable the remote backend or set {} to a local model file",
            farmagent::config::MODEL_PATH_ENV
        ));
    }

    let query = cli.query_text();
    let response = agent.execute(&query).await;

    let json = if cli.compact {
        serde_json::to_string(&response)?
    } else {
        serde_json::to_string_pretty(&response)?
    };
    println!("{}", json);
    report(&response);

    Ok(())
}
