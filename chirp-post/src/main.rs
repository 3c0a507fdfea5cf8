//! chirp-post - Compose a tweet with a language model and publish it

use anyhow::Context;
use clap::{Parser, ValueEnum};
use libchirpcast::error::PlatformError;
use libchirpcast::{AgentContext, ChirpcastError, Config, PostAction, PostOutcome, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "chirp-post")]
#[command(version)]
#[command(about = "Compose a tweet with a language model and publish it")]
#[command(long_about = "\
chirp-post - Compose a tweet with a language model and publish it

DESCRIPTION:
    chirp-post reads an agent context (JSON) from a file or stdin, asks the
    configured model for a tweet, trims it to the configured length and posts
    it to Twitter.

USAGE:
    # Context from a file
    chirp-post --context context.json

    # Context from stdin, print the result as JSON
    cat context.json | chirp-post --format json

    # Generate but do not post
    chirp-post --context context.json --dry-run

CONTEXT:
    {
      \"agent_name\": \"agent\",
      \"recent_messages\": \"...\",
      \"topics\": [\"rust\", \"compilers\"],
      \"post_directions\": \"...\",
      \"recent_post_interactions\": \"...\"
    }

CONFIGURATION:
    Configuration file: ~/.config/chirpcast/config.toml (or $CHIRPCAST_CONFIG)
    Environment: TWITTER_USERNAME, TWITTER_PASSWORD, TWITTER_EMAIL,
                 TWITTER_2FA_SECRET, MAX_TWEET_LENGTH, TWITTER_DRY_RUN,
                 OPENAI_API_KEY

EXIT CODES:
    0 - Posted (or dry run completed)
    1 - Generation or publishing failed
    2 - Missing or rejected credentials
    3 - Invalid input
")]
struct Cli {
    /// Context file (reads from stdin if not provided)
    #[arg(short, long, value_name = "FILE")]
    context: Option<PathBuf>,

    /// Configuration file (overrides the default location)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Generate the tweet but do not post it
    #[arg(long)]
    dry_run: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libchirpcast::logging::init_from_env("warn", cli.verbose);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => {
            eprintln!("Error: tweet was not posted (see log output for details)");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    let context = read_context(cli.context.as_deref())
        .map_err(|e| ChirpcastError::InvalidInput(format!("{:#}", e)))?;

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    let mut action = PostAction::from_config(&config)?;
    if cli.dry_run {
        action = action.dry_run();
    }

    let dry_run = action.settings().dry_run;
    debug!(dry_run, agent = %context.agent_name, "Running post action");
    if !dry_run && !PostAction::validate(action.settings()) {
        return Err(PlatformError::Authentication(
            "Twitter credentials not configured (username, password and email are required)"
                .to_string(),
        )
        .into());
    }

    let mut reported = None;
    let succeeded = action
        .handle(&context, |outcome| reported = Some(outcome))
        .await;
    let outcome = reported.unwrap_or_default();

    print_outcome(cli.format, succeeded, dry_run, &outcome);
    Ok(succeeded)
}

/// Read and parse the agent context from `path`, or stdin when absent
fn read_context(path: Option<&Path>) -> anyhow::Result<AgentContext> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read context file {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read context from stdin")?;
            buffer
        }
    };

    if raw.trim().is_empty() {
        anyhow::bail!("Context is empty");
    }

    serde_json::from_str(&raw).context("Context is not a valid agent context JSON object")
}

fn print_outcome(format: OutputFormat, succeeded: bool, dry_run: bool, outcome: &PostOutcome) {
    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "success": succeeded,
                "dry_run": dry_run,
                "result": outcome,
            });
            println!("{}", output);
        }
        OutputFormat::Text => {
            if let Some(line) = outcome_line(succeeded, dry_run, outcome) {
                println!("{}", line);
            }
        }
    }
}

/// Text-mode summary: the tweet URL, or `twitter:<id>` when no screen name came back
fn outcome_line(succeeded: bool, dry_run: bool, outcome: &PostOutcome) -> Option<String> {
    if dry_run {
        return succeeded.then(|| "dry-run: tweet generated, nothing posted".to_string());
    }
    if !outcome.is_posted() {
        return None;
    }
    outcome
        .url()
        .or_else(|| outcome.id.as_ref().map(|id| format!("twitter:{}", id)))
}
